// src/utils/mod.rs

//! Utility functions and helpers.

pub mod http;
pub mod url;

use sha2::{Digest, Sha256};

/// Gravatar URL for an e-mail address.
///
/// Hashes the trimmed, lower-cased address with SHA-256; requests a
/// 2048px image of any rating, falling back to the mystery-person avatar.
pub fn gravatar_url(email: &str) -> String {
    let digest = Sha256::digest(email.trim().to_lowercase().as_bytes());
    format!(
        "https://www.gravatar.com/avatar/{}?s=2048&r=x&d=mp",
        hex::encode(digest)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gravatar_url_hash() {
        assert_eq!(
            gravatar_url("abc"),
            "https://www.gravatar.com/avatar/ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad?s=2048&r=x&d=mp"
        );
    }

    #[test]
    fn test_gravatar_url_normalizes_email() {
        assert_eq!(
            gravatar_url("  Ada@Example.COM "),
            gravatar_url("ada@example.com")
        );
    }
}
