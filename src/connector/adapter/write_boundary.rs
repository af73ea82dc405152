use std::path::{Component, Path, PathBuf};

use crate::domain::DomainError;

/// Allowlist of directories that exports may be written under.
#[derive(Debug, Clone)]
pub struct WriteBoundary {
    roots: Vec<PathBuf>,
    block_symlinks: bool,
}

impl WriteBoundary {
    pub fn new(roots: Vec<PathBuf>, block_symlinks: bool) -> Self {
        Self {
            roots: roots.iter().map(|r| lexical_normalize(r)).collect(),
            block_symlinks,
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Checks that `dir` lies under an allowlisted root and, when configured,
    /// that no existing component of it is a symlink.
    pub fn check(&self, dir: &Path) -> Result<(), DomainError> {
        let display = dir.display().to_string();
        if !dir.is_absolute() {
            return Err(DomainError::boundary("Write denied for relative path", display));
        }

        let full = lexical_normalize(dir);
        if !self.roots.iter().any(|root| full.starts_with(root)) {
            let roots: Vec<String> = self.roots.iter().map(|r| r.display().to_string()).collect();
            return Err(DomainError::boundary(
                format!(
                    "Write denied outside allowlisted roots ({})",
                    roots.join(", ")
                ),
                full.display().to_string(),
            ));
        }

        if self.block_symlinks && has_symlink_component(&full) {
            return Err(DomainError::boundary(
                "Write denied due to symlink in path",
                full.display().to_string(),
            ));
        }

        Ok(())
    }
}

/// Resolves `.` and `..` without touching the filesystem.
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn has_symlink_component(path: &Path) -> bool {
    let mut current = PathBuf::new();
    for component in path.components() {
        current.push(component.as_os_str());
        match std::fs::symlink_metadata(&current) {
            Ok(meta) if meta.file_type().is_symlink() => return true,
            Ok(_) => {}
            // Components past the first missing one do not exist yet.
            Err(_) => return false,
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_paths_under_a_root() {
        let dir = tempfile::tempdir().unwrap();
        let boundary = WriteBoundary::new(vec![dir.path().to_path_buf()], true);
        assert!(boundary.check(&dir.path().join("2025-01-01")).is_ok());
        assert!(boundary.check(dir.path()).is_ok());
    }

    #[test]
    fn denies_escapes_and_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let boundary = WriteBoundary::new(vec![dir.path().join("exports")], false);

        let escape = dir.path().join("exports").join("..").join("elsewhere");
        let err = boundary.check(&escape).unwrap_err();
        assert_eq!(err.code(), "BOUNDARY_DENY");

        let sibling = dir.path().join("exports-evil");
        assert!(boundary.check(&sibling).is_err());

        assert!(boundary.check(Path::new("relative/dir")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn denies_symlinked_components_when_blocking() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real");
        std::fs::create_dir(&real).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let blocking = WriteBoundary::new(vec![dir.path().to_path_buf()], true);
        assert!(blocking.check(&link.join("2025-01-01")).is_err());

        let permissive = WriteBoundary::new(vec![dir.path().to_path_buf()], false);
        assert!(permissive.check(&link.join("2025-01-01")).is_ok());
    }
}
