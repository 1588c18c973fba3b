//! SER Benchmark: compare two system entity recognizers over a labeled corpus
//!
//! This crate supplies everything around the `ser` comparison engine: corpus
//! files, HTTP clients for the Mallard (baseline) and Duckling (candidate)
//! recognizers, a concurrent batch executor, an on-disk response cache,
//! TOML configuration and console/JSON/text reports.
//!
//! # Example
//!
//! ```no_run
//! use ser_benchmark::{
//!     analysis::evaluate_responses,
//!     config::Config,
//!     corpus::load_corpus,
//!     recognizers::create_pair,
//!     reporting::print_console_report,
//!     runner::{Executor, ExecutorConfig},
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_or_default();
//!     let corpus = load_corpus("data/clean.txt", "data/annotated.txt")?;
//!     let texts: Vec<String> = corpus.iter().map(|q| q.text.clone()).collect();
//!
//!     let (baseline, candidate) = create_pair(&config)?;
//!     let exec = ExecutorConfig::from(&config.benchmark);
//!     let baseline = Executor::new(baseline, exec.clone()).execute_all(&texts).await;
//!     let candidate = Executor::new(candidate, exec).execute_all(&texts).await;
//!
//!     let report = evaluate_responses(corpus, &baseline, &candidate, &config)?;
//!     print_console_report(&report);
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod config;
pub mod corpus;
pub mod recognizers;
pub mod reporting;
pub mod runner;

pub use config::Config;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::analysis::{evaluate_responses, normalize_all, write_run_outputs, RunOutputs};
    pub use crate::config::{Config, ConfigError};
    pub use crate::corpus::{load_corpus, LoadError};
    pub use crate::recognizers::{
        create_pair, create_recognizer, DucklingClient, EntityRecognizer, MallardClient,
        RecognizerError, RecognizerKind, RecognizerResult,
    };
    pub use crate::reporting::{print_console_report, write_diagnostics, JsonSummary};
    pub use crate::runner::{CacheError, Executor, ExecutorConfig, LogProgress, ResponseCache};
}
