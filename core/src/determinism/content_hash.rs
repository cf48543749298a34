use sha2::{Digest, Sha256};

/// Returned for empty input so callers never key a cache on an empty string.
pub const EMPTY_CONTENT_HASH: &str = "0";

/// Cache fingerprint for a piece of text. Stable within and across sessions,
/// not meant as a security primitive.
pub fn content_hash(content: &str) -> String {
    if content.is_empty() {
        return EMPTY_CONTENT_HASH.to_string();
    }
    let mut h = Sha256::new();
    h.update(content.as_bytes());
    hex::encode(&h.finalize()[..16])
}

/// Full-length digest used to identify attached files.
pub fn sha256_hex(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}

