//! Entity recognizer clients

pub mod duckling;
pub mod mallard;
pub mod traits;

pub use duckling::DucklingClient;
pub use mallard::MallardClient;
pub use traits::{EntityRecognizer, RecognizerError, RecognizerKind, RecognizerResult};

use crate::config::{Config, RecognizerConfig};
use std::sync::Arc;

/// Create a client for one configured recognizer
pub fn create_recognizer(
    kind: RecognizerKind,
    config: &RecognizerConfig,
) -> RecognizerResult<Arc<dyn EntityRecognizer>> {
    if !config.enabled {
        return Err(RecognizerError::Config(format!(
            "Recognizer {} is disabled",
            config.name
        )));
    }
    if config.endpoint.is_empty() {
        return Err(RecognizerError::Config(format!(
            "Recognizer {} has no endpoint",
            config.name
        )));
    }

    let recognizer: Arc<dyn EntityRecognizer> = match kind {
        RecognizerKind::Mallard => Arc::new(MallardClient::from_config(config)),
        RecognizerKind::Duckling => Arc::new(DucklingClient::from_config(config)),
    };
    Ok(recognizer)
}

/// Create the baseline and candidate clients from config
pub fn create_pair(
    config: &Config,
) -> RecognizerResult<(Arc<dyn EntityRecognizer>, Arc<dyn EntityRecognizer>)> {
    let baseline = create_recognizer(RecognizerKind::Mallard, &config.recognizers.mallard)?;
    let candidate = create_recognizer(RecognizerKind::Duckling, &config.recognizers.duckling)?;
    Ok((baseline, candidate))
}
