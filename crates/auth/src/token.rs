use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Random bytes per session token (256 bits).
pub const TOKEN_BYTES: usize = 32;

/// Generate a bearer token from the operating system CSPRNG.
///
/// Rendered as lowercase hex, so it is safe in JSON bodies and headers.
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Hash a token for storage. Only the hash ever reaches the session table.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_token_is_64_hex_chars() {
        let token = generate_session_token();
        assert_eq!(token.len(), TOKEN_BYTES * 2);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_ten_thousand_tokens_are_distinct() {
        let tokens: HashSet<String> = (0..10_000).map(|_| generate_session_token()).collect();
        assert_eq!(tokens.len(), 10_000);
        assert!(tokens.iter().all(|t| hex::decode(t).map(|b| b.len()) == Ok(TOKEN_BYTES)));
    }

    #[test]
    fn test_hash_token() {
        let hash1 = hash_token("some-token");
        let hash2 = hash_token("some-token");

        // Same token should produce same hash
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);

        // Different token should produce different hash
        assert_ne!(hash1, hash_token("different-token"));
    }
}
