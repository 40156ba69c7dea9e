use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Compares SHA-256 digests so neither the content nor the length of the
/// expected secret leaks through timing.
pub(crate) fn secrets_match(provided: &str, expected: &str) -> bool {
    if provided.is_empty() || expected.is_empty() {
        return false;
    }
    let provided = Sha256::digest(provided.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    provided.ct_eq(&expected).into()
}

#[cfg(test)]
mod tests {
    use super::secrets_match;

    #[test]
    fn equal_secrets_match() {
        assert!(secrets_match("cron-secret", "cron-secret"));
    }

    #[test]
    fn different_secrets_do_not_match() {
        assert!(!secrets_match("cron-secret", "cron-secreT"));
        assert!(!secrets_match("short", "a-much-longer-secret"));
    }

    #[test]
    fn empty_values_never_match() {
        assert!(!secrets_match("", ""));
        assert!(!secrets_match("", "secret"));
    }
}
