//! Mallard recognizer client (baseline)

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Instant;

use ser::normalize::MallardResponse;
use ser::RawResponse;

use super::traits::{EntityRecognizer, RecognizerError, RecognizerKind, RecognizerResult};
use crate::config::RecognizerConfig;

const DEFAULT_ENDPOINT: &str = "http://localhost:2626/parse";
const DEFAULT_LANGUAGE: &str = "eng";

/// Mallard HTTP client
pub struct MallardClient {
    name: String,
    endpoint: String,
    language: String,
    http_client: Client,
}

impl MallardClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            name: RecognizerKind::Mallard.as_str().to_string(),
            endpoint: endpoint.into(),
            language: DEFAULT_LANGUAGE.to_string(),
            http_client: Client::new(),
        }
    }

    pub fn from_config(config: &RecognizerConfig) -> Self {
        let mut client = Self::new(&config.endpoint).with_name(&config.name);
        if let Some(language) = &config.language {
            client = client.with_language(language);
        }
        client
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Default for MallardClient {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

#[derive(Serialize)]
struct MallardRequest<'a> {
    text: &'a str,
    language: &'a str,
}

#[async_trait]
impl EntityRecognizer for MallardClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> RecognizerKind {
        RecognizerKind::Mallard
    }

    async fn parse(&self, text: &str) -> RecognizerResult<RawResponse> {
        let start = Instant::now();

        let body = MallardRequest {
            text,
            language: &self.language,
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&body)
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

        let parsed: MallardResponse = response
            .json()
            .await
            .map_err(|e| RecognizerError::Parse(e.to_string()))?;

        tracing::debug!(
            recognizer = %self.name,
            latency_ms = start.elapsed().as_millis() as u64,
            records = parsed.data.len(),
            "parsed query"
        );

        Ok(RawResponse::Mallard(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let config = RecognizerConfig {
            name: "mallard-staging".to_string(),
            endpoint: "http://mallard:2626/parse".to_string(),
            enabled: true,
            language: Some("deu".to_string()),
            locale: None,
        };
        let client = MallardClient::from_config(&config);
        assert_eq!(client.name(), "mallard-staging");
        assert_eq!(client.endpoint(), "http://mallard:2626/parse");
        assert_eq!(client.language, "deu");
        assert_eq!(client.kind(), RecognizerKind::Mallard);
    }

    #[test]
    fn test_request_body() {
        let body = MallardRequest {
            text: "in 2 days",
            language: "eng",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"text": "in 2 days", "language": "eng"}));
    }
}
