use crate::config::Lang;

/// Cache key for translated chunks.
///
/// Keys are opaque MD5 hashes of all relevant inputs, ensuring:
/// - Same provider + languages + chunk text = same key
/// - Any change to inputs produces a different key
/// - Keys are fixed-length (32 hex chars) regardless of chunk size
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    hash: String,
}

impl CacheKey {
    pub fn new(translator: &str, source_lang: &Lang, target_lang: &Lang, chunk: &str) -> Self {
        // Null byte separators prevent collisions between inputs
        // like ("a", "bc") and ("ab", "c").
        let combined = format!(
            "{}\0{}\0{}\0{}",
            translator.to_lowercase(),
            source_lang.as_str(),
            target_lang.as_str(),
            chunk,
        );

        Self {
            hash: format!("{:x}", md5::compute(combined.as_bytes())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.hash
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hash)
    }
}
