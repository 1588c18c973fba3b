//! Async batch executor for querying a recognizer over a corpus

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::sleep;

use ser::RawResponse;

use crate::config::BenchmarkConfig;
use crate::recognizers::{EntityRecognizer, RecognizerError};

/// Configuration for the executor
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum in-flight requests
    pub parallel_requests: usize,
    /// Number of retries on failure
    pub retry_count: u32,
    /// Initial retry delay in milliseconds
    pub retry_delay_ms: u64,
    /// Maximum retry delay in milliseconds
    pub max_retry_delay_ms: u64,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self::from(&BenchmarkConfig::default())
    }
}

impl From<&BenchmarkConfig> for ExecutorConfig {
    fn from(config: &BenchmarkConfig) -> Self {
        Self {
            parallel_requests: config.parallel_requests.max(1),
            retry_count: config.retry_count,
            retry_delay_ms: config.retry_delay_ms,
            max_retry_delay_ms: config.max_retry_delay_ms,
            timeout_ms: config.timeout_ms,
        }
    }
}

impl ExecutorConfig {
    /// Back-off delay following `delay`, doubled and capped at the maximum
    pub fn next_delay(&self, delay: u64) -> u64 {
        delay.saturating_mul(2).min(self.max_retry_delay_ms)
    }
}

/// Executor for querying one recognizer
pub struct Executor {
    config: ExecutorConfig,
    recognizer: Arc<dyn EntityRecognizer>,
    semaphore: Arc<Semaphore>,
    progress: Arc<dyn ProgressCallback>,
}

impl Executor {
    pub fn new(recognizer: Arc<dyn EntityRecognizer>, config: ExecutorConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.parallel_requests.max(1)));
        Self {
            config,
            recognizer,
            semaphore,
            progress: Arc::new(NoOpProgress),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    /// Query every text concurrently.
    ///
    /// The result is aligned with `texts`: entry `i` is the response for
    /// `texts[i]`, or `None` if every attempt failed.
    pub async fn execute_all(&self, texts: &[String]) -> Vec<Option<RawResponse>> {
        let total = texts.len();
        let completed = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::with_capacity(total);

        tracing::info!(
            "Querying {} for {} queries ({} in parallel)",
            self.recognizer.name(),
            total,
            self.config.parallel_requests
        );

        for (index, text) in texts.iter().enumerate() {
            let executor = self.clone_for_query();
            let text = text.clone();
            let completed = completed.clone();

            let handle = tokio::spawn(async move {
                let response = executor.execute_query(index, &text).await;
                executor
                    .progress
                    .on_query_complete(executor.recognizer.name(), index, response.is_some());
                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                executor.progress.on_progress(executor.recognizer.name(), done, total);
                response
            });

            handles.push(handle);
        }

        let mut results = Vec::with_capacity(total);
        for (index, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(response) => results.push(response),
                Err(e) => {
                    tracing::error!("Query {} on {} panicked: {}", index, self.recognizer.name(), e);
                    results.push(None);
                }
            }
        }

        let failed = results.iter().filter(|r| r.is_none()).count();
        if failed > 0 {
            tracing::warn!(
                "{} of {} queries failed on {}",
                failed,
                total,
                self.recognizer.name()
            );
        }

        results
    }

    /// Query one text with retries and exponential back-off
    pub async fn execute_query(&self, index: usize, text: &str) -> Option<RawResponse> {
        let _permit = match self.semaphore.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                tracing::error!("Executor closed before query {}: {}", index, e);
                return None;
            }
        };

        let mut delay = self.config.retry_delay_ms;

        for attempt in 0..=self.config.retry_count {
            if attempt > 0 {
                tracing::debug!(
                    "Retry {} for query {} on {}",
                    attempt,
                    index,
                    self.recognizer.name()
                );
                sleep(Duration::from_millis(delay)).await;
                delay = self.config.next_delay(delay);
            }

            match self.try_execute(text).await {
                Ok(response) => return Some(response),
                Err(e) if e.is_retryable() && attempt < self.config.retry_count => {
                    tracing::warn!(
                        "Error on {} for query {} (attempt {}): {}",
                        self.recognizer.name(),
                        index,
                        attempt + 1,
                        e
                    );
                }
                Err(e) => {
                    tracing::error!(
                        "Giving up on query {} for {}: {}",
                        index,
                        self.recognizer.name(),
                        e
                    );
                    return None;
                }
            }
        }

        None
    }

    /// Single attempt bounded by the request timeout
    async fn try_execute(&self, text: &str) -> Result<RawResponse, RecognizerError> {
        let timeout = Duration::from_millis(self.config.timeout_ms);

        match tokio::time::timeout(timeout, self.recognizer.parse(text)).await {
            Ok(result) => result,
            Err(_) => Err(RecognizerError::Timeout {
                timeout_ms: self.config.timeout_ms,
            }),
        }
    }

    fn clone_for_query(&self) -> Self {
        Self {
            config: self.config.clone(),
            recognizer: self.recognizer.clone(),
            semaphore: self.semaphore.clone(),
            progress: self.progress.clone(),
        }
    }
}

/// Progress callback for tracking execution
pub trait ProgressCallback: Send + Sync {
    fn on_query_complete(&self, recognizer: &str, index: usize, success: bool);
    fn on_progress(&self, recognizer: &str, completed: usize, total: usize);
}

/// Default no-op progress callback
pub struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_query_complete(&self, _recognizer: &str, _index: usize, _success: bool) {}
    fn on_progress(&self, _recognizer: &str, _completed: usize, _total: usize) {}
}

/// Logs progress every `every` completed queries
pub struct LogProgress {
    every: usize,
}

impl LogProgress {
    pub fn new(every: usize) -> Self {
        Self { every: every.max(1) }
    }
}

impl ProgressCallback for LogProgress {
    fn on_query_complete(&self, recognizer: &str, index: usize, success: bool) {
        if !success {
            tracing::debug!("{}: no response for query {}", recognizer, index);
        }
    }

    fn on_progress(&self, recognizer: &str, completed: usize, total: usize) {
        if completed % self.every == 0 || completed == total {
            tracing::info!("{}: {}/{} queries complete", recognizer, completed, total);
        }
    }
}
