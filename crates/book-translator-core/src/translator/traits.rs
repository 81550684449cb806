use async_trait::async_trait;

use crate::config::Lang;
use crate::error::Result;

/// Information about a translation provider
#[derive(Debug, Clone)]
pub struct TranslatorInfo {
    /// Human-readable name, also part of chunk cache keys
    pub name: &'static str,
}

/// A remote translation provider.
///
/// Implementations translate one request-sized piece of text. Chunking and
/// pacing live in [`super::TranslationClient`], so a provider never sees more
/// than the configured chunk size (except for a single oversized paragraph).
#[async_trait]
pub trait Translator: Send + Sync {
    /// Get information about this provider
    fn info(&self) -> TranslatorInfo;

    /// Get the provider name (convenience method)
    fn name(&self) -> &'static str {
        self.info().name
    }

    /// Translate text from source language to target language
    async fn translate(&self, text: &str, source: &Lang, target: &Lang) -> Result<String>;
}
