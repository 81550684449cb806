mod key;
mod memory;

pub use key::CacheKey;
pub use memory::MemoryCache;

use crate::config::TranslationConfig;

/// Optional cache of translated chunks, shared by all jobs.
pub struct TranslationCache {
    memory: Option<MemoryCache>,
}

impl TranslationCache {
    /// Create a cache from configuration (`cache_entries = 0` disables it)
    pub fn new(config: &TranslationConfig) -> Self {
        let memory = (config.cache_entries > 0).then(|| MemoryCache::new(config.cache_entries));
        Self { memory }
    }

    pub const fn disabled() -> Self {
        Self { memory: None }
    }

    pub const fn is_enabled(&self) -> bool {
        self.memory.is_some()
    }

    pub async fn get(&self, key: &CacheKey) -> Option<String> {
        match self.memory {
            Some(ref memory) => memory.get(key.as_str()).await,
            None => None,
        }
    }

    pub async fn insert(&self, key: &CacheKey, value: String) {
        if let Some(ref memory) = self.memory {
            memory.insert(key.to_string(), value).await;
        }
    }
}
