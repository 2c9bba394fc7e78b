use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of migration content.
pub fn calculate_checksum(content: &str) -> String {
    format!("{:x}", Sha256::digest(content.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_for_equal_content() {
        let a = calculate_checksum(r#"{"up":[],"down":[]}"#);
        let b = calculate_checksum(r#"{"up":[],"down":[]}"#);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn whitespace_matters() {
        assert_ne!(calculate_checksum("test"), calculate_checksum("test "));
        assert_ne!(calculate_checksum("test "), calculate_checksum(" test"));
    }

    #[test]
    fn empty_content_has_known_digest() {
        assert_eq!(
            calculate_checksum(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
