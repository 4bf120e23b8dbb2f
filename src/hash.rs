use sha2::{Digest, Sha256};

// Hash a client identifier into a short token that is safe to log.
// Truncated to 8 bytes: collisions are fine, this is only for correlating log lines.
pub fn hash_identifier(identifier: &str) -> String {
    let digest = Sha256::digest(identifier.as_bytes());
    format!("{:016x}", u64::from_be_bytes(digest[..8].try_into().unwrap_or([0; 8])))
}
