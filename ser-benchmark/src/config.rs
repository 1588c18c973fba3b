//! Configuration management for the SER benchmark
//!
//! Loads recognizer endpoints and run settings from TOML files and provides
//! runtime access.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use ser::{Comparator, DEFAULT_EXEMPT_DIMENSIONS};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub recognizers: RecognizersConfig,
    #[serde(default)]
    pub benchmark: BenchmarkConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// The two recognizers under comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizersConfig {
    /// Baseline recognizer
    #[serde(default = "default_mallard")]
    pub mallard: RecognizerConfig,
    /// Candidate recognizer
    #[serde(default = "default_duckling")]
    pub duckling: RecognizerConfig,
}

impl Default for RecognizersConfig {
    fn default() -> Self {
        Self {
            mallard: default_mallard(),
            duckling: default_duckling(),
        }
    }
}

/// Recognizer-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizerConfig {
    pub name: String,
    pub endpoint: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Language code sent with each request (Mallard)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Locale sent with each request (Duckling)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

/// Batch execution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    #[serde(default = "default_parallel_requests")]
    pub parallel_requests: usize,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Log progress every N completed queries
    #[serde(default = "default_progress_every")]
    pub progress_every: usize,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            parallel_requests: default_parallel_requests(),
            retry_count: default_retry_count(),
            retry_delay_ms: default_retry_delay_ms(),
            max_retry_delay_ms: default_max_retry_delay_ms(),
            timeout_ms: default_timeout_ms(),
            progress_every: default_progress_every(),
        }
    }
}

/// Comparison settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Dimensions ignored when checking cross-recognizer agreement
    #[serde(default = "default_exempt_dimensions")]
    pub exempt_dimensions: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            exempt_dimensions: default_exempt_dimensions(),
        }
    }
}

impl AnalysisConfig {
    pub fn comparator(&self) -> Comparator {
        Comparator::with_exempt(self.exempt_dimensions.iter().cloned())
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
    #[serde(default = "default_true")]
    pub write_diagnostics: bool,
    #[serde(default = "default_true")]
    pub generate_json: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            cache_dir: default_cache_dir(),
            write_diagnostics: true,
            generate_json: true,
        }
    }
}

// Default value functions
fn default_true() -> bool { true }
fn default_parallel_requests() -> usize { 4 }
fn default_retry_count() -> u32 { 3 }
fn default_retry_delay_ms() -> u64 { 500 }
fn default_max_retry_delay_ms() -> u64 { 10_000 }
fn default_timeout_ms() -> u64 { 30_000 }
fn default_progress_every() -> usize { 1000 }
fn default_output_dir() -> String { "results/runs".to_string() }
fn default_cache_dir() -> String { "results/cache".to_string() }

fn default_exempt_dimensions() -> Vec<String> {
    DEFAULT_EXEMPT_DIMENSIONS.iter().map(|d| d.to_string()).collect()
}

fn default_mallard() -> RecognizerConfig {
    RecognizerConfig {
        name: "mallard".to_string(),
        endpoint: "http://localhost:2626/parse".to_string(),
        enabled: true,
        language: Some("eng".to_string()),
        locale: None,
    }
}

fn default_duckling() -> RecognizerConfig {
    RecognizerConfig {
        name: "duckling".to_string(),
        endpoint: "http://0.0.0.0:8000/parse".to_string(),
        enabled: true,
        language: None,
        locale: None,
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from the default config location or return defaults
    pub fn load_or_default() -> Self {
        let config_paths = [
            "config/ser.toml",
            "../config/ser.toml",
            "ser-benchmark/config/ser.toml",
        ];

        for path in &config_paths {
            if Path::new(path).exists() {
                match Self::from_file(path) {
                    Ok(config) => {
                        tracing::info!("Loaded configuration from {}", path);
                        return config;
                    }
                    Err(e) => tracing::warn!("Ignoring {}: {}", path, e),
                }
            }
        }

        tracing::info!("Using default configuration");
        Self::default()
    }

    /// Save configuration to a TOML file
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn cache_dir(&self) -> PathBuf {
        PathBuf::from(&self.output.cache_dir)
    }

    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(&self.output.output_dir)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.recognizers.mallard.endpoint, "http://localhost:2626/parse");
        assert_eq!(config.recognizers.mallard.language.as_deref(), Some("eng"));
        assert_eq!(config.recognizers.duckling.endpoint, "http://0.0.0.0:8000/parse");
        assert_eq!(config.benchmark.parallel_requests, 4);
        assert_eq!(config.analysis.exempt_dimensions, vec!["amount-of-money"]);
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml = r#"
[recognizers.duckling]
name = "duckling"
endpoint = "http://duckling.internal:8000/parse"
locale = "en_US"

[benchmark]
parallel_requests = 16

[analysis]
exempt_dimensions = []
"#;
        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.recognizers.duckling.endpoint, "http://duckling.internal:8000/parse");
        assert_eq!(config.recognizers.duckling.locale.as_deref(), Some("en_US"));
        assert!(config.recognizers.duckling.enabled);
        assert_eq!(config.recognizers.mallard.name, "mallard");
        assert_eq!(config.benchmark.parallel_requests, 16);
        assert_eq!(config.benchmark.retry_count, 3);
        assert!(config.analysis.exempt_dimensions.is_empty());
        assert!(!config.analysis.comparator().is_exempt("amount-of-money"));
        assert_eq!(config.output.cache_dir, "results/cache");
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let config = Config::from_toml(include_str!("../config/ser.toml")).unwrap();
        let defaults = Config::default();
        assert_eq!(config.recognizers.mallard.endpoint, defaults.recognizers.mallard.endpoint);
        assert_eq!(config.recognizers.duckling.endpoint, defaults.recognizers.duckling.endpoint);
        assert_eq!(config.benchmark.timeout_ms, defaults.benchmark.timeout_ms);
        assert_eq!(config.analysis.exempt_dimensions, defaults.analysis.exempt_dimensions);
    }

    #[test]
    fn test_invalid_toml() {
        let err = Config::from_toml("[benchmark]\nparallel_requests = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ser.toml");

        let mut config = Config::default();
        config.benchmark.timeout_ms = 1234;
        config.save_toml(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.benchmark.timeout_ms, 1234);
        assert_eq!(loaded.recognizers.mallard.language.as_deref(), Some("eng"));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file("/nonexistent/ser.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
