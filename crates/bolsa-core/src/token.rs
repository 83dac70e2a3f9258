//! Apply-token generation.
//!
//! Apply tokens are single-use opaque credentials embedded in invitation
//! links. They must be unguessable: 32 bytes from the OS CSPRNG, encoded
//! URL-safe without padding (43 characters).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

/// Entropy of a freshly generated apply token, in bytes.
pub const APPLY_TOKEN_BYTES: usize = 32;

/// Generate a fresh apply token.
pub fn generate_apply_token() -> String {
    let mut buf = [0u8; APPLY_TOKEN_BYTES];
    OsRng.fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}

/// Build the public apply link distributed in invitation emails.
pub fn apply_link(frontend_base_url: &str, token: &str) -> String {
    format!(
        "{}/api/job/apply/{}",
        frontend_base_url.trim_end_matches('/'),
        token
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_token_length() {
        // 32 bytes → ceil(32 * 4 / 3) = 43 chars unpadded
        assert_eq!(generate_apply_token().len(), 43);
    }

    #[test]
    fn test_token_is_url_safe() {
        let token = generate_apply_token();
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_tokens_are_unique() {
        let tokens: HashSet<String> = (0..100).map(|_| generate_apply_token()).collect();
        assert_eq!(tokens.len(), 100);
    }

    #[test]
    fn test_apply_link_joins_cleanly() {
        assert_eq!(
            apply_link("https://bolsa.example.org", "abc"),
            "https://bolsa.example.org/api/job/apply/abc"
        );
        assert_eq!(
            apply_link("https://bolsa.example.org/", "abc"),
            "https://bolsa.example.org/api/job/apply/abc"
        );
    }
}
