use sha2::{Digest, Sha256};

/// Computes the SHA-256 hash of a document body, hex encoded
///
/// Two bodies get the same hash exactly when their text is identical.
pub fn content_hash(body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    hex::encode(hasher.finalize())
}
