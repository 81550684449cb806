use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};

use super::traits::{Translator, TranslatorInfo};
use crate::config::{Lang, TranslatorConfig};
use crate::error::{Error, Result};

/// OpenAI-compatible API translator
/// Works with: llama.cpp server, Ollama, DeepSeek, OpenAI, etc.
pub struct OpenAiTranslator {
    client: Client,
    /// Base URL for the API (e.g., "http://localhost:8080/v1")
    api_base: String,
    /// Optional API key for authentication
    api_key: Option<String>,
    /// Model identifier
    model: String,
    /// Number of attempts per chunk (1 = no retry)
    attempts: u32,
    /// Fixed delay between attempts in milliseconds
    retry_delay_ms: u64,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

impl OpenAiTranslator {
    pub fn new(config: &TranslatorConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::TranslationRequest(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            attempts: config.retry_count.max(1),
            retry_delay_ms: config.retry_delay_ms,
        })
    }

    fn create_prompt(text: &str, source: &Lang, target: &Lang) -> String {
        format!(
            "Translate the following book page from {} into {}. \
             Keep the line breaks. Output only the translation, no explanations.\n\n{}",
            language_name(source),
            language_name(target),
            text
        )
    }

    fn parse_response(response: ChatResponse) -> Result<String> {
        let choice = response.choices.into_iter().next().ok_or_else(|| {
            Error::TranslationInvalidResponse("No choices in response".to_string())
        })?;
        Ok(choice.message.content.trim().to_string())
    }

    async fn request_once(&self, url: &str, request: &ChatRequest<'_>) -> Result<String> {
        let mut req = self.client.post(url).json(request);

        if let Some(ref key) = self.api_key {
            req = req.header("Authorization", format!("Bearer {key}"));
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::TranslationTimeout
            } else {
                Error::TranslationRequest(e.to_string())
            }
        })?;

        let status = response.status();
        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(Error::TranslationRateLimited { retry_after });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::TranslationRequest(format!("HTTP {status}: {body}")));
        }

        let chat_response = response
            .json::<ChatResponse>()
            .await
            .map_err(|e| Error::TranslationInvalidResponse(e.to_string()))?;

        Self::parse_response(chat_response)
    }

    async fn request_with_retry(&self, text: &str, source: &Lang, target: &Lang) -> Result<String> {
        let url = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));
        let request = ChatRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: Self::create_prompt(text, source, target),
            }],
            temperature: Some(0.3),
        };

        let mut last_error = None;

        for attempt in 0..self.attempts {
            debug!(
                "Translation request attempt {}/{} to {}",
                attempt + 1,
                self.attempts,
                url
            );

            match self.request_once(&url, &request).await {
                Ok(translated) => return Ok(translated),
                Err(e) => {
                    warn!("Translation request failed: {}", e);
                    last_error = Some(e);
                }
            }

            if attempt + 1 < self.attempts {
                tokio::time::sleep(Duration::from_millis(self.retry_delay_ms)).await;
            }
        }

        error!("Translation failed after {} attempts", self.attempts);
        Err(last_error.unwrap_or(Error::TranslationMaxRetriesExceeded))
    }
}

#[async_trait]
impl Translator for OpenAiTranslator {
    fn info(&self) -> TranslatorInfo {
        TranslatorInfo {
            name: "OpenAI Compatible",
        }
    }

    async fn translate(&self, text: &str, source: &Lang, target: &Lang) -> Result<String> {
        self.request_with_retry(text, source, target).await
    }
}

/// Convert language code to human-readable name for prompts
fn language_name(lang: &Lang) -> &'static str {
    match lang.as_str() {
        "en" => "English",
        "tr" => "Turkish",
        "de" => "German",
        "fr" => "French",
        "es" => "Spanish",
        "it" => "Italian",
        "pt" => "Portuguese",
        "ru" => "Russian",
        "ar" => "Arabic",
        // The model still understands most ISO codes
        _ => "the specified language",
    }
}
