//! Mallard response shape
//!
//! ```json
//! {"data": [{"dimension": "number", "entity": {"start": 4, "end": 5, "text": "2"}, "value": [2]}]}
//! ```
//!
//! `value` is a ranked list of alternatives; only the top one is kept.

use serde::{Deserialize, Serialize};

use super::{log_dropped, schema_error, Normalize, NormalizeError, Record};
use crate::types::{EntityValue, NormalizedOutput, Span};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MallardResponse {
    #[serde(default)]
    pub data: Vec<Record<MallardEntity>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MallardEntity {
    pub dimension: String,
    pub entity: MallardSpan,
    pub value: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MallardSpan {
    pub start: usize,
    pub end: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl MallardResponse {
    pub fn new(data: Vec<MallardEntity>) -> Self {
        Self {
            data: data.into_iter().map(Record::Parsed).collect(),
        }
    }
}

impl MallardEntity {
    fn to_prediction(&self) -> Result<(Span, EntityValue), NormalizeError> {
        let span = Span::new(self.entity.start, self.entity.end).map_err(|source| {
            NormalizeError::InvalidSpan {
                dimension: self.dimension.clone(),
                source,
            }
        })?;

        let top = self.value.first().ok_or_else(|| NormalizeError::EmptyValue {
            dimension: self.dimension.clone(),
        })?;

        Ok((span, EntityValue::Scalar(top.clone())))
    }
}

impl Normalize for MallardResponse {
    fn recognizer(&self) -> &'static str {
        "mallard"
    }

    fn normalize(&self) -> NormalizedOutput {
        let mut output = NormalizedOutput::new();

        for record in &self.data {
            match record {
                Record::Parsed(entity) => match entity.to_prediction() {
                    Ok((span, value)) => {
                        output.insert(entity.dimension.as_str(), span, value);
                    }
                    Err(e) => log_dropped(self.recognizer(), entity, &e),
                },
                Record::Malformed(raw) => {
                    log_dropped(self.recognizer(), raw, &schema_error::<MallardEntity>(raw));
                }
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(body: serde_json::Value) -> MallardResponse {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_top_value_is_kept() {
        let response = parse(json!({"data": [
            {"dimension": "number", "entity": {"start": 4, "end": 5, "text": "2"}, "value": [2, 20]}
        ]}));
        let out = response.normalize();
        let span = Span::new(4, 5).unwrap();
        assert_eq!(out.value("number", &span), Some(&EntityValue::scalar(2)));
    }

    #[test]
    fn test_empty_response() {
        assert!(parse(json!({"data": []})).normalize().is_empty());
        assert!(parse(json!({})).normalize().is_empty());
    }

    #[test]
    fn test_malformed_records_are_isolated() {
        let response = parse(json!({"data": [
            {"dimension": "number", "value": [1]},
            {"dimension": "time", "entity": {"start": 0, "end": 4}, "value": []},
            {"dimension": "number", "entity": {"start": 3, "end": 3}, "value": [1]},
            {"dimension": "duration", "entity": {"start": 6, "end": 15}, "value": [{"unit": "minute", "value": 5}]}
        ]}));

        assert!(matches!(response.data[0], Record::Malformed(_)));
        let out = response.normalize();
        assert_eq!(out.dimensions().collect::<Vec<_>>(), vec!["duration"]);
        assert!(out.contains("duration", &Span::new(6, 15).unwrap()));
    }

    #[test]
    fn test_duplicate_span_last_write_wins() {
        let response = parse(json!({"data": [
            {"dimension": "number", "entity": {"start": 0, "end": 1}, "value": [1]},
            {"dimension": "number", "entity": {"start": 0, "end": 1}, "value": [7]}
        ]}));
        let out = response.normalize();
        assert_eq!(out.entity_count(), 1);
        assert_eq!(
            out.value("number", &Span::new(0, 1).unwrap()),
            Some(&EntityValue::scalar(7))
        );
    }
}
