//! Recognizer response normalization
//!
//! Each recognizer has its own raw response type. Normalizing converts it
//! into the shared [`NormalizedOutput`] shape right at the boundary. A record
//! that cannot be interpreted is logged and skipped; it never fails the
//! response it came from.

pub mod duckling;
pub mod mallard;

pub use duckling::{DucklingEntity, DucklingResponse, DucklingValue};
pub use mallard::{MallardEntity, MallardResponse, MallardSpan};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::types::NormalizedOutput;

/// A single raw record: either it matched the recognizer's schema or it is
/// kept verbatim for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Record<T> {
    Parsed(T),
    Malformed(serde_json::Value),
}

/// Why a single record was dropped during normalization.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NormalizeError {
    #[error("record does not match the response schema: {0}")]
    Schema(String),

    #[error("dimension {dimension}: empty value list")]
    EmptyValue { dimension: String },

    #[error("dimension {dimension}: missing `{field}`")]
    MissingField { dimension: String, field: &'static str },

    #[error("dimension {dimension}: unexpected value type {kind:?}")]
    UnknownValueType {
        dimension: String,
        kind: Option<String>,
    },

    #[error("dimension {dimension}: {source}")]
    InvalidSpan {
        dimension: String,
        source: crate::types::Error,
    },
}

/// Conversion of a raw recognizer response into the canonical output shape.
pub trait Normalize {
    /// Recognizer name used in log context.
    fn recognizer(&self) -> &'static str;

    fn normalize(&self) -> NormalizedOutput;
}

/// Raw response of either recognizer, tagged by origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "recognizer", content = "response", rename_all = "lowercase")]
pub enum RawResponse {
    Mallard(MallardResponse),
    Duckling(DucklingResponse),
}

impl Normalize for RawResponse {
    fn recognizer(&self) -> &'static str {
        match self {
            RawResponse::Mallard(r) => r.recognizer(),
            RawResponse::Duckling(r) => r.recognizer(),
        }
    }

    fn normalize(&self) -> NormalizedOutput {
        match self {
            RawResponse::Mallard(r) => r.normalize(),
            RawResponse::Duckling(r) => r.normalize(),
        }
    }
}

/// Normalize a possibly-missing response. A query the recognizer never
/// answered normalizes to an empty output.
pub fn normalize(response: Option<&RawResponse>) -> NormalizedOutput {
    response.map(Normalize::normalize).unwrap_or_default()
}

/// Explain why `raw` failed to deserialize as `T`.
pub(crate) fn schema_error<T: DeserializeOwned>(raw: &serde_json::Value) -> NormalizeError {
    match serde_json::from_value::<T>(raw.clone()) {
        Err(e) => NormalizeError::Schema(e.to_string()),
        Ok(_) => NormalizeError::Schema("ambiguous record".to_string()),
    }
}

/// Log a dropped record with enough context to find it again.
pub(crate) fn log_dropped<R: Serialize>(recognizer: &str, record: &R, err: &NormalizeError) {
    let raw = serde_json::to_string(record).unwrap_or_else(|_| "<unserializable>".to_string());
    tracing::warn!(recognizer, record = %raw, "skipping record: {}", err);
}
