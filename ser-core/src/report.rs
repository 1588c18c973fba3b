//! Report aggregation across both recognizers
//!
//! Combines correctness, agreement and conflict sets into regression
//! analyses, confusion counts and diagnostic listings.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::compare::{AgreementSets, Comparator};
use crate::conflict::{conflicting_spans, has_conflict};
use crate::corpus::QueryRecord;
use crate::evaluate::{evaluate, CorrectnessSets, Verdict};
use crate::types::{NormalizedOutput, Span};

/// Placeholder used when a recognizer produced fewer dimensions than expected.
pub const MISSING: &str = "MISSING";

/// Which recognizer of the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Baseline,
    Candidate,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Baseline => Side::Candidate,
            Side::Candidate => Side::Baseline,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Baseline => "baseline",
            Side::Candidate => "candidate",
        }
    }

    pub fn output(self, record: &QueryRecord) -> &NormalizedOutput {
        match self {
            Side::Baseline => &record.baseline,
            Side::Candidate => &record.candidate,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Expected dimension -> counts of what was observed instead.
///
/// Built by pairing the Kth expected label with the Kth dimension of the
/// recognizer output (in first-seen order). This ordinal pairing does not
/// match by span, so it can misattribute confusions when entity counts or
/// ordering differ. Treat the table as a best-effort hint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfusionCounts {
    counts: BTreeMap<String, BTreeMap<String, usize>>,
}

impl ConfusionCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, expected: &str, observed: &str) {
        *self
            .counts
            .entry(expected.to_string())
            .or_default()
            .entry(observed.to_string())
            .or_insert(0) += 1;
    }

    /// Add the ordinal-position confusions of one query.
    pub fn record_ordinal(&mut self, expected: &[&str], observed: &[&str]) {
        for (k, exp) in expected.iter().enumerate() {
            let got = observed.get(k).copied().unwrap_or(MISSING);
            if *exp != got {
                self.record(exp, got);
            }
        }
    }

    pub fn get(&self, expected: &str, observed: &str) -> usize {
        self.counts
            .get(expected)
            .and_then(|m| m.get(observed))
            .copied()
            .unwrap_or(0)
    }

    /// Total confusions per expected dimension.
    pub fn totals(&self) -> BTreeMap<String, usize> {
        self.counts
            .iter()
            .map(|(dim, observed)| (dim.clone(), observed.values().sum()))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, usize>)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// A flagged query, as shown in diagnostic listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticEntry {
    pub index: usize,
    /// The annotated query text.
    pub query: String,
    pub expected: Vec<String>,
    pub actual: Vec<String>,
}

impl DiagnosticEntry {
    fn from_record(record: &QueryRecord, output: &NormalizedOutput) -> Self {
        Self {
            index: record.id,
            query: record.annotated.clone(),
            expected: record.ground_truth.iter().map(|e| e.label.clone()).collect(),
            actual: output.dimensions().map(String::from).collect(),
        }
    }
}

/// A span claimed by several dimensions in one output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictEntry {
    pub index: usize,
    pub query: String,
    pub span: Span,
    pub dimensions: Vec<String>,
}

/// Queries one recognizer got wrong while the other got them right.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegressionReport {
    /// The recognizer that regressed.
    pub side: Option<Side>,
    pub regressions: BTreeSet<usize>,
    pub missed_entity: BTreeSet<usize>,
    pub incorrect_span: BTreeSet<usize>,
    pub confusion: ConfusionCounts,
    pub missed_entity_entries: Vec<DiagnosticEntry>,
    pub incorrect_span_entries: Vec<DiagnosticEntry>,
}

/// Per-recognizer correctness and conflict results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizerReport {
    pub name: String,
    pub correctness: CorrectnessSets,
    pub conflicts: BTreeSet<usize>,
    pub conflict_entries: Vec<ConflictEntry>,
}

impl RecognizerReport {
    pub fn correct(&self) -> usize {
        self.correctness.correct.len()
    }

    pub fn incorrect(&self) -> usize {
        self.correctness.incorrect.len()
    }
}

/// Full result of comparing two recognizers over one corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub total_queries: usize,
    pub total_entities: usize,
    pub baseline: RecognizerReport,
    pub candidate: RecognizerReport,
    /// Whether the baseline also found every candidate entity.
    pub agreement: AgreementSets,
    pub exempt_dimensions: Vec<String>,
    /// Candidate wrong, baseline right.
    pub candidate_regressions: RegressionReport,
    /// Baseline wrong, candidate right.
    pub baseline_regressions: RegressionReport,
}

impl EvaluationReport {
    pub fn recognizer(&self, side: Side) -> &RecognizerReport {
        match side {
            Side::Baseline => &self.baseline,
            Side::Candidate => &self.candidate,
        }
    }

    pub fn regressions(&self, side: Side) -> &RegressionReport {
        match side {
            Side::Baseline => &self.baseline_regressions,
            Side::Candidate => &self.candidate_regressions,
        }
    }
}

/// Builds an [`EvaluationReport`] from per-query records.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    comparator: Comparator,
    baseline_name: String,
    candidate_name: String,
}

impl Aggregator {
    pub fn new(baseline_name: impl Into<String>, candidate_name: impl Into<String>) -> Self {
        Self {
            comparator: Comparator::new(),
            baseline_name: baseline_name.into(),
            candidate_name: candidate_name.into(),
        }
    }

    pub fn with_comparator(mut self, comparator: Comparator) -> Self {
        self.comparator = comparator;
        self
    }

    pub fn aggregate(&self, records: &[QueryRecord]) -> EvaluationReport {
        let baseline = self.recognizer_report(&self.baseline_name, Side::Baseline, records);
        let candidate = self.recognizer_report(&self.candidate_name, Side::Candidate, records);

        let agreement = self
            .comparator
            .agree_all(records.iter().map(|r| (r.id, &r.baseline, &r.candidate)));

        let candidate_regressions = regressions(Side::Candidate, &candidate, &baseline, records);
        let baseline_regressions = regressions(Side::Baseline, &baseline, &candidate, records);

        tracing::debug!(
            candidate = candidate_regressions.regressions.len(),
            baseline = baseline_regressions.regressions.len(),
            "regressions computed"
        );

        EvaluationReport {
            total_queries: records.len(),
            total_entities: records.iter().map(|r| r.ground_truth.len()).sum(),
            baseline,
            candidate,
            agreement,
            exempt_dimensions: self.comparator.exempt_dimensions().map(String::from).collect(),
            candidate_regressions,
            baseline_regressions,
        }
    }

    fn recognizer_report(&self, name: &str, side: Side, records: &[QueryRecord]) -> RecognizerReport {
        let correctness: CorrectnessSets = records
            .iter()
            .map(|r| (r.id, evaluate(&r.ground_truth, side.output(r))))
            .collect();

        let conflict_entries: Vec<ConflictEntry> = records
            .iter()
            .flat_map(|r| {
                conflicting_spans(side.output(r))
                    .into_iter()
                    .map(move |(span, dimensions)| ConflictEntry {
                        index: r.id,
                        query: r.text.clone(),
                        span,
                        dimensions,
                    })
            })
            .collect();

        let conflicts = records
            .iter()
            .filter(|r| has_conflict(side.output(r)))
            .map(|r| r.id)
            .collect();

        RecognizerReport {
            name: name.to_string(),
            correctness,
            conflicts,
            conflict_entries,
        }
    }
}

/// Queries `regressed` got wrong that `reference` got right, split by cause.
pub fn regressions(
    side: Side,
    regressed: &RecognizerReport,
    reference: &RecognizerReport,
    records: &[QueryRecord],
) -> RegressionReport {
    let regression_set: BTreeSet<usize> = regressed
        .correctness
        .incorrect
        .intersection(&reference.correctness.correct)
        .copied()
        .collect();

    let mut report = RegressionReport {
        side: Some(side),
        ..Default::default()
    };

    for record in records.iter().filter(|r| regression_set.contains(&r.id)) {
        let output = side.output(record);
        let Verdict {
            missed_entity,
            incorrect_span,
            ..
        } = evaluate(&record.ground_truth, output);

        if missed_entity {
            report.missed_entity.insert(record.id);
            report.missed_entity_entries.push(DiagnosticEntry::from_record(record, output));

            let observed: Vec<&str> = output.dimensions().collect();
            report.confusion.record_ordinal(&record.expected_labels(), &observed);
        }
        if incorrect_span {
            report.incorrect_span.insert(record.id);
            report.incorrect_span_entries.push(DiagnosticEntry::from_record(record, output));
        }
    }

    report.regressions = regression_set;
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Corpus;
    use crate::types::EntityValue;

    fn span(s: usize, e: usize) -> Span {
        Span::new(s, e).unwrap()
    }

    fn records() -> Vec<QueryRecord> {
        let corpus = Corpus::from_lines(
            [
                "set a timer for 5 minutes",
                "wake me at 7",
                "2 days ago",
                "add 3 and 4",
            ],
            [
                "set a timer for {5 minutes|sys_duration}",
                "wake me {at 7|sys_time}",
                "{2 days ago|sys_time}",
                "add {3|sys_number} and {4|sys_number}",
            ],
        )
        .unwrap();

        let baseline = vec![
            NormalizedOutput::new().with("duration", span(16, 25), EntityValue::scalar("PT5M")),
            NormalizedOutput::new().with("time", span(8, 12), EntityValue::scalar("07:00")),
            NormalizedOutput::new().with("time", span(0, 10), EntityValue::scalar("-2d")),
            NormalizedOutput::new(),
        ];
        let candidate = vec![
            // Missed: predicts a number where a duration was expected.
            NormalizedOutput::new().with("number", span(16, 17), EntityValue::scalar(5)),
            // Wrong span.
            NormalizedOutput::new().with("time", span(11, 12), EntityValue::scalar("07:00")),
            // Correct, with a conflicting duration on the same span.
            NormalizedOutput::new()
                .with("time", span(0, 10), EntityValue::scalar("-2d"))
                .with("duration", span(0, 10), EntityValue::scalar("P2D")),
            NormalizedOutput::new()
                .with("number", span(4, 5), EntityValue::scalar(3))
                .with("number", span(10, 11), EntityValue::scalar(4)),
        ];

        corpus.into_records(baseline, candidate).unwrap()
    }

    #[test]
    fn test_aggregate() {
        let report = Aggregator::new("mallard", "duckling").aggregate(&records());

        assert_eq!(report.total_queries, 4);
        assert_eq!(report.total_entities, 5);
        assert_eq!(report.baseline.correctness.correct, BTreeSet::from([0, 1, 2]));
        assert_eq!(report.candidate.correctness.correct, BTreeSet::from([2, 3]));

        let reg = &report.candidate_regressions;
        assert_eq!(reg.side, Some(Side::Candidate));
        assert_eq!(reg.regressions, BTreeSet::from([0, 1]));
        assert_eq!(reg.missed_entity, BTreeSet::from([0]));
        assert_eq!(reg.incorrect_span, BTreeSet::from([1]));
        assert_eq!(reg.confusion.get("duration", "number"), 1);

        assert_eq!(report.baseline_regressions.regressions, BTreeSet::from([3]));
        assert_eq!(report.baseline_regressions.confusion.get("number", MISSING), 2);

        assert_eq!(report.candidate.conflicts, BTreeSet::from([2]));
        assert!(report.baseline.conflicts.is_empty());
        assert_eq!(report.candidate.conflict_entries[0].span, span(0, 10));
    }

    #[test]
    fn test_diagnostic_entries() {
        let report = Aggregator::new("mallard", "duckling").aggregate(&records());
        let entry = &report.candidate_regressions.missed_entity_entries[0];
        assert_eq!(entry.index, 0);
        assert_eq!(entry.query, "set a timer for {5 minutes|sys_duration}");
        assert_eq!(entry.expected, vec!["duration"]);
        assert_eq!(entry.actual, vec!["number"]);
    }

    #[test]
    fn test_agreement_checks_candidate_against_baseline() {
        let report = Aggregator::new("mallard", "duckling").aggregate(&records());
        // Query 3: baseline found nothing, candidate found numbers.
        assert!(report.agreement.disagreeing.contains(&3));
        assert!(report.agreement.disagreeing.contains(&0));
        assert_eq!(report.exempt_dimensions, vec!["amount-of-money"]);
    }

    #[test]
    fn test_ordinal_confusion() {
        let mut counts = ConfusionCounts::new();
        counts.record_ordinal(&["time", "number", "duration"], &["time", "ordinal"]);
        assert_eq!(counts.get("number", "ordinal"), 1);
        assert_eq!(counts.get("duration", MISSING), 1);
        assert_eq!(counts.get("time", "time"), 0);
        assert_eq!(counts.totals().values().sum::<usize>(), 2);
    }
}
