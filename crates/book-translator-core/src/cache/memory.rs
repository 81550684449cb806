use moka::future::Cache;

/// In-memory chunk cache using moka with entry-count eviction.
pub struct MemoryCache {
    cache: Cache<String, String>,
}

impl MemoryCache {
    pub fn new(max_entries: u64) -> Self {
        Self {
            cache: Cache::builder().max_capacity(max_entries).build(),
        }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.cache.get(key).await
    }

    pub async fn insert(&self, key: String, value: String) {
        self.cache.insert(key, value).await;
    }
}
