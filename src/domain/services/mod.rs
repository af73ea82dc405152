mod resolution;
mod verification;

pub use resolution::*;
pub use verification::*;
