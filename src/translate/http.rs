//! LibreTranslate-backed translation provider.
//!
//! Speaks the `POST /translate` JSON protocol, which both the public
//! libretranslate.com service and self-hosted instances expose.

use crate::defaults;
use crate::error::{Result, SubfuseError};
use crate::translate::Translator;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Configuration for the LibreTranslate provider.
#[derive(Debug, Clone)]
pub struct LibreTranslateConfig {
    /// Service endpoint, e.g. `http://localhost:5000`
    pub base_url: String,
    /// API key, when the instance requires one
    pub api_key: Option<String>,
    /// Source language code, or `auto` to let the service detect it
    pub source: String,
}

impl Default for LibreTranslateConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::TRANSLATE_BASE_URL.to_string(),
            api_key: None,
            source: defaults::AUTO_LANGUAGE.to_string(),
        }
    }
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

/// Translation provider backed by a LibreTranslate endpoint.
#[derive(Debug)]
pub struct LibreTranslator {
    client: reqwest::Client,
    config: LibreTranslateConfig,
}

impl LibreTranslator {
    /// Create a provider for the configured endpoint.
    pub fn new(config: LibreTranslateConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &LibreTranslateConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/translate", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Translator for LibreTranslator {
    async fn translate(&self, text: &str, target: &str) -> Result<String> {
        let request = TranslateRequest {
            q: text,
            source: &self.config.source,
            target,
            format: "text",
            api_key: self.config.api_key.as_deref(),
        };

        let response = self
            .client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                SubfuseError::Other(format!("Failed to reach translation service: {e}"))
            })?;

        if !response.status().is_success() {
            return Err(SubfuseError::Other(format!(
                "Translation service returned status {}",
                response.status()
            )));
        }

        let body = response.text().await.map_err(|e| {
            SubfuseError::Other(format!("Failed to read translation response: {e}"))
        })?;

        let parsed: TranslateResponse = serde_json::from_str(&body).map_err(|e| {
            SubfuseError::Other(format!("Failed to parse translation response: {e}"))
        })?;

        Ok(parsed.translated_text)
    }

    fn name(&self) -> &str {
        "libretranslate"
    }
}
