//! SER - span-based comparison of system entity recognizers
//!
//! Scores two numeric/temporal entity recognizers against an inline-annotated
//! corpus and against each other, using exact span matching only.
//!
//! # Example
//!
//! ```rust
//! use ser::{evaluate, extract, EntityValue, NormalizedOutput, Span};
//!
//! let truth = extract(
//!     "set a timer for 5 minutes",
//!     "set a timer for {5 minutes|sys_duration}",
//! ).unwrap();
//! assert_eq!(truth[0].span, Span::new(16, 25).unwrap());
//!
//! let output = NormalizedOutput::new()
//!     .with("duration", Span::new(16, 25).unwrap(), EntityValue::scalar("PT5M"));
//! assert!(evaluate(&truth, &output).correct);
//! ```

pub mod compare;
pub mod conflict;
pub mod corpus;
pub mod evaluate;
pub mod extract;
pub mod normalize;
pub mod report;
mod types;

pub use compare::{AgreementSets, Comparator, DEFAULT_EXEMPT_DIMENSIONS};
pub use conflict::{conflicting_spans, find_conflicts, has_conflict};
pub use corpus::{Corpus, CorpusQuery, QueryRecord};
pub use evaluate::{evaluate, evaluate_all, CorrectnessSets, Verdict};
pub use extract::extract;
pub use normalize::{normalize, Normalize, NormalizeError, RawResponse, Record};
pub use report::{
    Aggregator, ConfusionCounts, ConflictEntry, DiagnosticEntry, EvaluationReport,
    RecognizerReport, RegressionReport, Side, MISSING,
};
pub use types::{EntitySpan, EntityValue, Error, NormalizedOutput, Result, Span};
