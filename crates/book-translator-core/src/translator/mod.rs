mod client;
mod google;
mod openai;
mod traits;

pub use client::TranslationClient;
pub use google::GoogleTranslator;
pub use openai::OpenAiTranslator;
pub use traits::{Translator, TranslatorInfo};

use crate::config::{ProviderKind, TranslatorConfig};
use crate::error::Result;
use std::sync::Arc;

/// Create the configured translation provider
pub fn create_translator(config: &TranslatorConfig) -> Result<Arc<dyn Translator>> {
    let translator: Arc<dyn Translator> = match config.provider {
        ProviderKind::Google => Arc::new(GoogleTranslator::new(config)?),
        ProviderKind::OpenAi => Arc::new(OpenAiTranslator::new(config)?),
    };

    Ok(translator)
}
