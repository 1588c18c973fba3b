//! Results reporting

pub mod diagnostics;

pub use diagnostics::{write_diagnostics, DiagnosticFiles};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use ser::{ConfusionCounts, EvaluationReport, RecognizerReport, RegressionReport, Side};

/// JSON summary export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSummary {
    pub run_id: String,
    pub timestamp: String,
    pub total_queries: usize,
    pub total_entities: usize,
    pub baseline: RecognizerSummary,
    pub candidate: RecognizerSummary,
    pub agreement: AgreementSummary,
    pub candidate_regressions: RegressionSummary,
    pub baseline_regressions: RegressionSummary,
}

/// Per-recognizer counts in summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizerSummary {
    pub name: String,
    pub correct: usize,
    pub incorrect: usize,
    pub accuracy: f64,
    pub missed_entity: usize,
    pub incorrect_span: usize,
    pub conflicts: Vec<usize>,
}

/// Cross-recognizer agreement in summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgreementSummary {
    pub exempt_dimensions: Vec<String>,
    pub agreeing: usize,
    pub disagreeing: Vec<usize>,
}

/// Regression breakdown in summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionSummary {
    pub regressions: Vec<usize>,
    pub missed_entity: Vec<usize>,
    pub incorrect_span: Vec<usize>,
    pub confusion: ConfusionCounts,
    /// Confusions per expected dimension, summed over predictions
    pub confusion_totals: BTreeMap<String, usize>,
}

impl From<&RecognizerReport> for RecognizerSummary {
    fn from(report: &RecognizerReport) -> Self {
        Self {
            name: report.name.clone(),
            correct: report.correct(),
            incorrect: report.incorrect(),
            accuracy: report.correctness.accuracy(),
            missed_entity: report.correctness.missed_entity.len(),
            incorrect_span: report.correctness.incorrect_span.len(),
            conflicts: report.conflicts.iter().copied().collect(),
        }
    }
}

impl From<&RegressionReport> for RegressionSummary {
    fn from(report: &RegressionReport) -> Self {
        Self {
            regressions: report.regressions.iter().copied().collect(),
            missed_entity: report.missed_entity.iter().copied().collect(),
            incorrect_span: report.incorrect_span.iter().copied().collect(),
            confusion: report.confusion.clone(),
            confusion_totals: report.confusion.totals(),
        }
    }
}

impl JsonSummary {
    /// Create from an evaluation report
    pub fn from_report(run_id: impl Into<String>, report: &EvaluationReport) -> Self {
        Self {
            run_id: run_id.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            total_queries: report.total_queries,
            total_entities: report.total_entities,
            baseline: (&report.baseline).into(),
            candidate: (&report.candidate).into(),
            agreement: AgreementSummary {
                exempt_dimensions: report.exempt_dimensions.clone(),
                agreeing: report.agreement.agreeing.len(),
                disagreeing: report.agreement.disagreeing.iter().copied().collect(),
            },
            candidate_regressions: (&report.candidate_regressions).into(),
            baseline_regressions: (&report.baseline_regressions).into(),
        }
    }

    /// Write to JSON file
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }
}

/// Generate a console report
pub fn print_console_report(report: &EvaluationReport) {
    print!("{}", render_console_report(report));
}

/// Render the console report as text
pub fn render_console_report(report: &EvaluationReport) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = write_report(&mut out, report);
    out
}

fn write_report(out: &mut String, report: &EvaluationReport) -> std::fmt::Result {
    writeln!(out, "\n=== SER Comparison Results ===\n")?;
    writeln!(out, "Total Queries: {}", report.total_queries)?;
    writeln!(out, "Total Entities: {}\n", report.total_entities)?;

    writeln!(out, "Correctness:")?;
    writeln!(out, "{:-<50}", "")?;
    for side in [Side::Baseline, Side::Candidate] {
        let r = report.recognizer(side);
        writeln!(
            out,
            "  {} ({}) - Correct: {}, Incorrect: {}, Accuracy: {:.3}",
            r.name,
            side,
            r.correct(),
            r.incorrect(),
            r.correctness.accuracy()
        )?;
        writeln!(
            out,
            "    Missed entity: {}, Incorrect span: {}, Conflicts: {}",
            r.correctness.missed_entity.len(),
            r.correctness.incorrect_span.len(),
            r.conflicts.len()
        )?;
    }

    writeln!(out, "\nAgreement ({} found by {}):", report.candidate.name, report.baseline.name)?;
    writeln!(out, "{:-<50}", "")?;
    writeln!(
        out,
        "  Agreeing: {}, Disagreeing: {}",
        report.agreement.agreeing.len(),
        report.agreement.disagreeing.len()
    )?;
    if !report.exempt_dimensions.is_empty() {
        writeln!(out, "  Exempt dimensions: {}", report.exempt_dimensions.join(", "))?;
    }

    for side in [Side::Candidate, Side::Baseline] {
        let regressed = report.recognizer(side);
        let reference = report.recognizer(side.other());
        let reg = report.regressions(side);

        writeln!(
            out,
            "\nRegressions ({} wrong, {} right):",
            regressed.name, reference.name
        )?;
        writeln!(out, "{:-<50}", "")?;
        writeln!(
            out,
            "  Total: {}, Missed entity: {}, Incorrect span: {}",
            reg.regressions.len(),
            reg.missed_entity.len(),
            reg.incorrect_span.len()
        )?;

        if !reg.confusion.is_empty() {
            writeln!(out, "  Missed dimensions (expected -> predicted, best effort):")?;
            for (expected, observed) in reg.confusion.iter() {
                let mut sorted: Vec<_> = observed.iter().collect();
                sorted.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
                let list: Vec<String> = sorted.iter().map(|(dim, n)| format!("{} x{}", dim, n)).collect();
                writeln!(out, "    {}: {}", expected, list.join(", "))?;
            }

            let mut totals: Vec<_> = reg.confusion.totals().into_iter().collect();
            totals.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            let list: Vec<String> = totals.iter().map(|(dim, n)| format!("{} x{}", dim, n)).collect();
            writeln!(out, "  Missed dimension totals: {}", list.join(", "))?;
        }
    }

    writeln!(out, "\n{:=<50}", "")
}
