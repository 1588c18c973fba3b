//! Core types for SER comparison

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// An annotated entity does not occur in the clean query at or after the cursor.
    #[error("corpus desync{}: entity {entity:?} not found at or after char {cursor}", fmt_query(.query))]
    CorpusDesync {
        query: Option<usize>,
        entity: String,
        cursor: usize,
    },

    #[error("invalid span [{start}, {end})")]
    InvalidSpan { start: usize, end: usize },

    #[error("misaligned inputs: {what} has {got} entries, expected {expected}")]
    Misaligned {
        what: String,
        expected: usize,
        got: usize,
    },
}

fn fmt_query(query: &Option<usize>) -> String {
    match query {
        Some(i) => format!(" in query {}", i),
        None => String::new(),
    }
}

impl Error {
    /// Attach the corpus index to a desync raised by the extractor.
    pub fn in_query(self, index: usize) -> Self {
        match self {
            Error::CorpusDesync { entity, cursor, .. } => Error::CorpusDesync {
                query: Some(index),
                entity,
                cursor,
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// Spans
// =============================================================================

/// Half-open `[start, end)` interval over character offsets of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Result<Self> {
        if start >= end {
            return Err(Error::InvalidSpan { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// A ground-truth entity: where it is and which dimension it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntitySpan {
    pub span: Span,
    pub label: String,
}

impl EntitySpan {
    pub fn new(span: Span, label: impl Into<String>) -> Self {
        Self {
            span,
            label: label.into(),
        }
    }

    pub fn start(&self) -> usize {
        self.span.start
    }

    pub fn end(&self) -> usize {
        self.span.end
    }
}

// =============================================================================
// Normalized recognizer output
// =============================================================================

/// A recognized value. Intervals keep absent sides as `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityValue {
    Scalar(serde_json::Value),
    Interval {
        from: Option<serde_json::Value>,
        to: Option<serde_json::Value>,
    },
}

impl EntityValue {
    pub fn scalar(value: impl Into<serde_json::Value>) -> Self {
        EntityValue::Scalar(value.into())
    }

    pub fn interval(from: Option<serde_json::Value>, to: Option<serde_json::Value>) -> Self {
        EntityValue::Interval { from, to }
    }
}

/// Canonical per-query output of a recognizer: `dimension -> {span -> value}`.
///
/// Dimensions and spans iterate in first-insertion order. Re-inserting a span
/// that already exists in a dimension replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedOutput {
    dimensions: IndexMap<String, IndexMap<Span, EntityValue>>,
}

impl NormalizedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a prediction. Returns the value it replaced, if any.
    pub fn insert(
        &mut self,
        dimension: impl Into<String>,
        span: Span,
        value: EntityValue,
    ) -> Option<EntityValue> {
        self.dimensions
            .entry(dimension.into())
            .or_default()
            .insert(span, value)
    }

    pub fn with(mut self, dimension: impl Into<String>, span: Span, value: EntityValue) -> Self {
        self.insert(dimension, span, value);
        self
    }

    /// Drop a whole dimension.
    pub fn remove_dimension(&mut self, dimension: &str) -> Option<IndexMap<Span, EntityValue>> {
        self.dimensions.shift_remove(dimension)
    }

    pub fn get(&self, dimension: &str) -> Option<&IndexMap<Span, EntityValue>> {
        self.dimensions.get(dimension)
    }

    pub fn has_dimension(&self, dimension: &str) -> bool {
        self.dimensions.contains_key(dimension)
    }

    pub fn contains(&self, dimension: &str, span: &Span) -> bool {
        self.dimensions
            .get(dimension)
            .map(|spans| spans.contains_key(span))
            .unwrap_or(false)
    }

    pub fn value(&self, dimension: &str, span: &Span) -> Option<&EntityValue> {
        self.dimensions.get(dimension)?.get(span)
    }

    /// Dimension labels in first-seen order.
    pub fn dimensions(&self) -> impl Iterator<Item = &str> {
        self.dimensions.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexMap<Span, EntityValue>)> {
        self.dimensions.iter().map(|(d, s)| (d.as_str(), s))
    }

    /// Every `(dimension, span)` pair, dimension-major.
    pub fn entities(&self) -> impl Iterator<Item = (&str, &Span)> {
        self.dimensions
            .iter()
            .flat_map(|(d, spans)| spans.keys().map(move |s| (d.as_str(), s)))
    }

    pub fn entity_count(&self) -> usize {
        self.dimensions.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }
}
