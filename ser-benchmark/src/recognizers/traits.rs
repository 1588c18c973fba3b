//! Recognizer trait definitions for entity recognizer HTTP clients

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use ser::RawResponse;

/// Which response shape a recognizer speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecognizerKind {
    Mallard,
    Duckling,
}

impl RecognizerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecognizerKind::Mallard => "mallard",
            RecognizerKind::Duckling => "duckling",
        }
    }
}

impl std::fmt::Display for RecognizerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error types for recognizer calls
#[derive(Debug, thiserror::Error)]
pub enum RecognizerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RecognizerError {
    /// Whether retrying the same request could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            RecognizerError::Http(_) | RecognizerError::Timeout { .. } => true,
            RecognizerError::Api { status, .. } => *status == 429 || *status >= 500,
            RecognizerError::Parse(_) | RecognizerError::Config(_) => false,
        }
    }
}

pub type RecognizerResult<T> = Result<T, RecognizerError>;

/// Trait for entity recognizers
#[async_trait]
pub trait EntityRecognizer: Send + Sync {
    /// Configured recognizer name (e.g., "mallard", "duckling")
    fn name(&self) -> &str;

    /// Response shape this recognizer returns
    fn kind(&self) -> RecognizerKind;

    /// Parse one query and return the raw response
    async fn parse(&self, text: &str) -> RecognizerResult<RawResponse>;
}
