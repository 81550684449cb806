use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::traits::Translator;
use crate::cache::{CacheKey, TranslationCache};
use crate::chunker::split_into_chunks;
use crate::config::{Lang, TranslationConfig};
use crate::error::Result;

/// Translates whole pages through a size-limited provider.
///
/// Text is split on paragraph boundaries, chunks are sent one at a time in
/// order, and every provider call is followed by a fixed pause. Provider
/// faults are returned as-is.
pub struct TranslationClient {
    provider: Arc<dyn Translator>,
    cache: TranslationCache,
    max_chunk_chars: usize,
    pacing: Duration,
}

impl TranslationClient {
    pub fn new(provider: Arc<dyn Translator>, config: &TranslationConfig) -> Self {
        let cache = TranslationCache::new(config);
        debug!(
            "Chunk cache {}",
            if cache.is_enabled() { "enabled" } else { "disabled" }
        );

        Self {
            provider,
            cache,
            max_chunk_chars: config.chunk_size,
            pacing: Duration::from_millis(config.pacing_ms),
        }
    }

    /// Client without chunk cache, with explicit limits
    pub fn uncached(
        provider: Arc<dyn Translator>,
        max_chunk_chars: usize,
        pacing: Duration,
    ) -> Self {
        Self {
            provider,
            cache: TranslationCache::disabled(),
            max_chunk_chars,
            pacing,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Translate `text`, returning the translated chunks joined with `'\n'`.
    ///
    /// Blank input returns an empty string without calling the provider; blank
    /// chunks inside a page are passed through untranslated.
    pub async fn translate(&self, text: &str, source: &Lang, target: &Lang) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        let chunks = split_into_chunks(text, self.max_chunk_chars);
        let mut translated = Vec::with_capacity(chunks.len());

        for (index, chunk) in chunks.iter().enumerate() {
            if chunk.trim().is_empty() {
                translated.push(chunk.clone());
                continue;
            }

            let key = CacheKey::new(self.provider.name(), source, target, chunk);

            if let Some(cached) = self.cache.get(&key).await {
                debug!("Chunk cache hit ({}/{})", index + 1, chunks.len());
                translated.push(cached);
                continue;
            }

            debug!(
                "Translating chunk {}/{} ({} chars) with {}",
                index + 1,
                chunks.len(),
                chunk.chars().count(),
                self.provider.name()
            );

            let result = self.provider.translate(chunk, source, target).await?;
            self.cache.insert(&key, result.clone()).await;
            translated.push(result);

            if !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }
        }

        Ok(translated.join("\n"))
    }
}
