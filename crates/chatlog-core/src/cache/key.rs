use sha2::{Digest, Sha256};

pub fn sha256_hex(s: &str) -> String {
    let mut h = Sha256::new();
    h.update(s.as_bytes());
    hex::encode(h.finalize())
}

/// Cache key for a model score: the text is hashed so keys stay short and the
/// cache file never holds message bodies.
pub fn sentiment_cache_key(model_fingerprint: &str, text: &str) -> String {
    format!("sent|{}|{}", model_fingerprint, sha256_hex(text))
}
