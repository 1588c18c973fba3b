//! Duckling recognizer client (candidate)

use async_trait::async_trait;
use reqwest::Client;
use std::time::Instant;

use ser::normalize::DucklingResponse;
use ser::RawResponse;

use super::traits::{EntityRecognizer, RecognizerError, RecognizerKind, RecognizerResult};
use crate::config::RecognizerConfig;

const DEFAULT_ENDPOINT: &str = "http://0.0.0.0:8000/parse";

/// Duckling HTTP client. Queries are sent form-encoded.
pub struct DucklingClient {
    name: String,
    endpoint: String,
    locale: Option<String>,
    http_client: Client,
}

impl DucklingClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            name: RecognizerKind::Duckling.as_str().to_string(),
            endpoint: endpoint.into(),
            locale: None,
            http_client: Client::new(),
        }
    }

    pub fn from_config(config: &RecognizerConfig) -> Self {
        let mut client = Self::new(&config.endpoint).with_name(&config.name);
        if let Some(locale) = &config.locale {
            client = client.with_locale(locale);
        }
        client
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn form<'a>(&'a self, text: &'a str) -> Vec<(&'static str, &'a str)> {
        let mut form = vec![("text", text)];
        if let Some(locale) = &self.locale {
            form.push(("locale", locale.as_str()));
        }
        form
    }
}

impl Default for DucklingClient {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

#[async_trait]
impl EntityRecognizer for DucklingClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> RecognizerKind {
        RecognizerKind::Duckling
    }

    async fn parse(&self, text: &str) -> RecognizerResult<RawResponse> {
        let start = Instant::now();

        let response = self
            .http_client
            .post(&self.endpoint)
            .form(&self.form(text))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RecognizerError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: DucklingResponse = response
            .json()
            .await
            .map_err(|e| RecognizerError::Parse(e.to_string()))?;

        tracing::debug!(
            recognizer = %self.name,
            latency_ms = start.elapsed().as_millis() as u64,
            records = parsed.entities.len(),
            "parsed query"
        );

        Ok(RawResponse::Duckling(parsed))
    }
}
