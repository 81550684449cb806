use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::traits::{Translator, TranslatorInfo};
use crate::config::{Lang, TranslatorConfig};
use crate::error::{Error, Result};

const DEFAULT_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// Google Translate through the keyless web endpoint (`client=gtx`).
///
/// The endpoint has no published quota, so callers are expected to pace
/// their requests.
pub struct GoogleTranslator {
    client: Client,
    endpoint: String,
}

impl GoogleTranslator {
    pub fn new(config: &TranslatorConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::TranslationRequest(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        })
    }

    /// Concatenate the translated segments of a `translate_a/single` response.
    ///
    /// The body looks like `[[["Merhaba ","Hello ",...],["Dünya","World",...]],null,"en",...]`.
    fn parse_response(body: &Value) -> Result<String> {
        let segments = body
            .get(0)
            .and_then(Value::as_array)
            .ok_or_else(|| {
                Error::TranslationInvalidResponse("missing translation segments".to_string())
            })?;

        let mut translated = String::new();
        for segment in segments {
            if let Some(text) = segment.get(0).and_then(Value::as_str) {
                translated.push_str(text);
            }
        }

        Ok(translated)
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    fn info(&self) -> TranslatorInfo {
        TranslatorInfo {
            name: "Google Translate",
        }
    }

    async fn translate(&self, text: &str, source: &Lang, target: &Lang) -> Result<String> {
        debug!("Google translate request ({} chars)", text.chars().count());

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", source.as_str()),
                ("tl", target.as_str()),
                ("dt", "t"),
            ])
            .form(&[("q", text)])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::TranslationTimeout
                } else {
                    Error::TranslationRequest(e.to_string())
                }
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            warn!("Google Translate rate limited the request");
            return Err(Error::TranslationRateLimited { retry_after: None });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::TranslationRequest(format!("HTTP {status}: {body}")));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::TranslationInvalidResponse(e.to_string()))?;

        Self::parse_response(&body)
    }
}
