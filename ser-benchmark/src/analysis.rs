//! Evaluation of collected responses
//!
//! Glue between raw recognizer responses and the comparison engine in `ser`.

use std::path::{Path, PathBuf};

use ser::{normalize, Aggregator, Corpus, EvaluationReport, NormalizedOutput, RawResponse};

use crate::config::Config;
use crate::reporting::{write_diagnostics, DiagnosticFiles, JsonSummary};

/// Normalize one recognizer's responses, keeping corpus order
pub fn normalize_all(responses: &[Option<RawResponse>]) -> Vec<NormalizedOutput> {
    responses.iter().map(|r| normalize(r.as_ref())).collect()
}

/// Score both recognizers over the corpus
pub fn evaluate_responses(
    corpus: Corpus,
    baseline: &[Option<RawResponse>],
    candidate: &[Option<RawResponse>],
    config: &Config,
) -> Result<EvaluationReport, ser::Error> {
    let records = corpus.into_records(normalize_all(baseline), normalize_all(candidate))?;
    tracing::info!("Evaluating {} queries", records.len());

    let aggregator = Aggregator::new(
        &config.recognizers.mallard.name,
        &config.recognizers.duckling.name,
    )
    .with_comparator(config.analysis.comparator());

    Ok(aggregator.aggregate(&records))
}

/// Files written for one run
#[derive(Debug, Clone, Default)]
pub struct RunOutputs {
    pub dir: PathBuf,
    pub summary: Option<PathBuf>,
    pub diagnostics: Option<DiagnosticFiles>,
}

/// Write the JSON summary and diagnostic listings under `<output_dir>/<run_id>/`
pub fn write_run_outputs(
    output_dir: &Path,
    run_id: &str,
    report: &EvaluationReport,
    config: &Config,
) -> std::io::Result<RunOutputs> {
    let dir = output_dir.join(run_id);
    std::fs::create_dir_all(&dir)?;

    let mut outputs = RunOutputs {
        dir: dir.clone(),
        ..Default::default()
    };

    if config.output.generate_json {
        let path = dir.join("summary.json");
        JsonSummary::from_report(run_id, report).write_to_file(&path)?;
        outputs.summary = Some(path);
    }

    if config.output.write_diagnostics {
        outputs.diagnostics = Some(write_diagnostics(&dir, report)?);
    }

    Ok(outputs)
}
