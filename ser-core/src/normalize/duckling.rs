//! Duckling response shape
//!
//! ```json
//! [{"dim": "time", "start": 10, "end": 16, "body": "at 5pm",
//!   "value": {"type": "value", "value": "2024-01-01T17:00:00.000-08:00", "grain": "hour"}}]
//! ```
//!
//! `time`, `temperature` and `amount-of-money` carry a `type` discriminator:
//! `"value"` holds a scalar, `"interval"` holds optional `from`/`to` bounds.
//! Every other dimension holds its scalar in `value.value`.

use serde::{Deserialize, Serialize};

use super::{log_dropped, schema_error, Normalize, NormalizeError, Record};
use crate::types::{EntityValue, NormalizedOutput, Span};

/// Dimensions whose value object is discriminated by `type`.
pub const VALUE_TYPED_DIMENSIONS: &[&str] = &["time", "temperature", "amount-of-money"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DucklingResponse {
    pub entities: Vec<Record<DucklingEntity>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DucklingEntity {
    pub dim: String,
    pub start: usize,
    pub end: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub value: DucklingValue,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DucklingValue {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<serde_json::Value>,
}

impl DucklingResponse {
    pub fn new(entities: Vec<DucklingEntity>) -> Self {
        Self {
            entities: entities.into_iter().map(Record::Parsed).collect(),
        }
    }
}

impl DucklingValue {
    pub fn scalar(value: impl Into<serde_json::Value>) -> Self {
        Self {
            kind: Some("value".to_string()),
            value: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn interval(from: Option<serde_json::Value>, to: Option<serde_json::Value>) -> Self {
        Self {
            kind: Some("interval".to_string()),
            from,
            to,
            ..Default::default()
        }
    }
}

impl DucklingEntity {
    fn to_prediction(&self) -> Result<(Span, EntityValue), NormalizeError> {
        let span = Span::new(self.start, self.end).map_err(|source| NormalizeError::InvalidSpan {
            dimension: self.dim.clone(),
            source,
        })?;

        let value = if VALUE_TYPED_DIMENSIONS.contains(&self.dim.as_str()) {
            match self.value.kind.as_deref() {
                Some("value") => EntityValue::Scalar(self.scalar()?),
                Some("interval") => {
                    EntityValue::interval(self.value.from.clone(), self.value.to.clone())
                }
                other => {
                    return Err(NormalizeError::UnknownValueType {
                        dimension: self.dim.clone(),
                        kind: other.map(String::from),
                    })
                }
            }
        } else {
            EntityValue::Scalar(self.scalar()?)
        };

        Ok((span, value))
    }

    fn scalar(&self) -> Result<serde_json::Value, NormalizeError> {
        self.value.value.clone().ok_or_else(|| NormalizeError::MissingField {
            dimension: self.dim.clone(),
            field: "value.value",
        })
    }
}

impl Normalize for DucklingResponse {
    fn recognizer(&self) -> &'static str {
        "duckling"
    }

    fn normalize(&self) -> NormalizedOutput {
        let mut output = NormalizedOutput::new();

        for record in &self.entities {
            match record {
                Record::Parsed(entity) => match entity.to_prediction() {
                    Ok((span, value)) => {
                        output.insert(entity.dim.as_str(), span, value);
                    }
                    Err(e) => log_dropped(self.recognizer(), entity, &e),
                },
                Record::Malformed(raw) => {
                    log_dropped(self.recognizer(), raw, &schema_error::<DucklingEntity>(raw));
                }
            }
        }

        output
    }
}
