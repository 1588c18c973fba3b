//! Recognizer query execution

pub mod cache;
pub mod executor;

pub use cache::{read_responses, write_responses, CacheError, ResponseCache, StaleReason};
pub use executor::{Executor, ExecutorConfig, LogProgress, NoOpProgress, ProgressCallback};
