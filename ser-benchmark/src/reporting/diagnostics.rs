//! Plain-text diagnostic listings for flagged queries

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ser::{ConflictEntry, DiagnosticEntry, EvaluationReport, Side};

/// Paths of the listings written for one run
#[derive(Debug, Clone, Default)]
pub struct DiagnosticFiles {
    pub missed_entities: PathBuf,
    pub incorrect_spans: PathBuf,
    pub baseline_missed_entities: PathBuf,
    pub baseline_incorrect_spans: PathBuf,
    pub conflicts: PathBuf,
}

/// Write every diagnostic listing into `dir`.
///
/// Unprefixed files list candidate regressions; `baseline_` files list the
/// reverse direction.
pub fn write_diagnostics(dir: &Path, report: &EvaluationReport) -> io::Result<DiagnosticFiles> {
    fs::create_dir_all(dir)?;

    let files = DiagnosticFiles {
        missed_entities: dir.join("missed_entities.txt"),
        incorrect_spans: dir.join("incorrect_spans.txt"),
        baseline_missed_entities: dir.join("baseline_missed_entities.txt"),
        baseline_incorrect_spans: dir.join("baseline_incorrect_spans.txt"),
        conflicts: dir.join("conflicts.txt"),
    };

    let candidate = report.regressions(Side::Candidate);
    let baseline = report.regressions(Side::Baseline);

    fs::write(&files.missed_entities, format_entries(&candidate.missed_entity_entries))?;
    fs::write(&files.incorrect_spans, format_entries(&candidate.incorrect_span_entries))?;
    fs::write(&files.baseline_missed_entities, format_entries(&baseline.missed_entity_entries))?;
    fs::write(&files.baseline_incorrect_spans, format_entries(&baseline.incorrect_span_entries))?;

    let mut conflicts = String::new();
    for side in [Side::Baseline, Side::Candidate] {
        let r = report.recognizer(side);
        conflicts.push_str(&format_conflicts(&r.name, &r.conflict_entries));
    }
    fs::write(&files.conflicts, conflicts)?;

    tracing::info!("Diagnostics written to {}", dir.display());
    Ok(files)
}

/// One block per entry, separated by a blank line
pub fn format_entries(entries: &[DiagnosticEntry]) -> String {
    entries
        .iter()
        .map(|e| {
            format!(
                "Index: {}\nQuery: {}\nExpected Sys Entities: {}\nActual Sys Entities: {}\n\n",
                e.index,
                e.query,
                e.expected.join(", "),
                e.actual.join(", ")
            )
        })
        .collect()
}

pub fn format_conflicts(recognizer: &str, entries: &[ConflictEntry]) -> String {
    entries
        .iter()
        .map(|e| {
            format!(
                "Recognizer: {}\nIndex: {}\nQuery: {}\nSpan: {}\nDimensions: {}\n\n",
                recognizer,
                e.index,
                e.query,
                e.span,
                e.dimensions.join(", ")
            )
        })
        .collect()
}
