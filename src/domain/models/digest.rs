use std::fmt;

use serde::Serialize;

const DIGEST_PREFIX: &str = "sha256:";
const DIGEST_LEN: usize = 64;

/// Canonical content address of a model build: 64 lower-case hex characters,
/// without any `sha256:` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Digest(String);

impl Digest {
    /// Canonicalize a raw digest string.
    ///
    /// Surrounding whitespace and quotes are stripped, the value is lower-cased and a
    /// leading `sha256:` prefix is removed. Anything that is not then exactly 64
    /// hex characters yields `None`.
    pub fn normalize(raw: &str) -> Option<Self> {
        let trimmed = raw.trim().trim_matches(|c| c == '"' || c == '\'').trim();
        let lowered = trimmed.to_ascii_lowercase();
        let hex = lowered.strip_prefix(DIGEST_PREFIX).unwrap_or(&lowered);

        if hex.len() == DIGEST_LEN && hex.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)) {
            Some(Self(hex.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Short form of a stored digest for log and terminal lines (first 12 chars).
pub fn short_digest(digest: &str) -> &str {
    digest.get(..12).unwrap_or(digest)
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEX: &str = "a80c4f17acd55265feec403c7aef86be0c25983ab279d83f3bcd3abbcb5b8b72";

    #[test]
    fn accepts_plain_hex() {
        assert_eq!(Digest::normalize(HEX).unwrap().as_str(), HEX);
    }

    #[test]
    fn strips_prefix_quotes_and_case() {
        let raw = format!("  \"SHA256:{}\" ", HEX.to_uppercase());
        assert_eq!(Digest::normalize(&raw).unwrap().as_str(), HEX);
    }

    #[test]
    fn rejects_wrong_length_and_non_hex() {
        assert!(Digest::normalize("").is_none());
        assert!(Digest::normalize("null").is_none());
        assert!(Digest::normalize(&HEX[..63]).is_none());
        assert!(Digest::normalize(&format!("{HEX}0")).is_none());
        assert!(Digest::normalize(&format!("{}g", &HEX[..63])).is_none());
        assert!(Digest::normalize(&format!("md5:{HEX}")).is_none());
    }

    #[test]
    fn normalization_is_idempotent() {
        let inputs = [
            HEX.to_string(),
            format!("sha256:{HEX}"),
            format!("'{}'", HEX.to_uppercase()),
            format!("\t{HEX}\n"),
        ];
        for raw in inputs {
            let once = Digest::normalize(&raw).expect("valid digest");
            let twice = Digest::normalize(once.as_str()).expect("still valid");
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn short_form_is_prefix() {
        let digest = Digest::normalize(HEX).unwrap();
        assert_eq!(short_digest(digest.as_str()), &HEX[..12]);
        assert_eq!(short_digest("abc"), "abc");
    }
}
