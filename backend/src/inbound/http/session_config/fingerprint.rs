//! Short, non-reversible identifier for the active session key, logged at
//! startup so operators can tell which key a replica picked up.

use actix_web::cookie::Key;
use sha2::{Digest, Sha256};

const FINGERPRINT_BYTES: usize = 8;

/// First eight bytes of the SHA-256 of the signing half, lowercase hex.
///
/// ```rust
/// use actix_web::cookie::Key;
/// use retail_backend::inbound::http::session_config::fingerprint::key_fingerprint;
///
/// let fp = key_fingerprint(&Key::generate());
/// assert_eq!(fp.len(), 16);
/// ```
#[must_use]
pub fn key_fingerprint(key: &Key) -> String {
    let digest = Sha256::digest(key.signing());
    hex::encode(&digest[..FINGERPRINT_BYTES])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn same_material_gives_same_fingerprint() {
        let a = Key::derive_from(&[b'r'; 64]);
        let b = Key::derive_from(&[b'r'; 64]);
        assert_eq!(key_fingerprint(&a), key_fingerprint(&b));
    }

    #[rstest]
    fn fingerprints_are_lowercase_hex() {
        let fp = key_fingerprint(&Key::generate());
        assert_eq!(fp.len(), FINGERPRINT_BYTES * 2);
        assert!(fp.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[rstest]
    fn distinct_keys_are_distinguishable() {
        let a = Key::derive_from(&[b'a'; 64]);
        let b = Key::derive_from(&[b'b'; 64]);
        assert_ne!(key_fingerprint(&a), key_fingerprint(&b));
    }
}
