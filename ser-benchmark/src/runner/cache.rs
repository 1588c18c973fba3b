//! On-disk cache of raw recognizer responses
//!
//! One pretty-printed JSON file per recognizer, holding the queries it was
//! built from next to a response slot per query (`null` for queries that got
//! no response). A cache only loads against the exact corpus it was built for.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use ser::{Normalize, RawResponse};

use crate::recognizers::RecognizerKind;

/// Cache errors
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid cache file {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Stale cache {path}: {reason}")]
    Stale { path: PathBuf, reason: StaleReason },
}

/// Why a cache file does not fit the current run
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StaleReason {
    #[error("{got} responses for {expected} queries")]
    Length { expected: usize, got: usize },

    #[error("query {index} differs from the current corpus")]
    QueryMismatch { index: usize },

    #[error("responses were recorded from {found}, expected {expected}")]
    Recognizer {
        expected: RecognizerKind,
        found: String,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    recognizer: RecognizerKind,
    queries: Vec<String>,
    responses: Vec<Option<RawResponse>>,
}

/// Directory of cached responses
#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
}

impl ResponseCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, kind: RecognizerKind, name: &str) -> PathBuf {
        self.dir.join(format!("{}_{}_responses.json", kind, name))
    }

    pub fn exists(&self, kind: RecognizerKind, name: &str) -> bool {
        self.path_for(kind, name).is_file()
    }

    /// Load cached responses, checking they were recorded from a `kind`
    /// recognizer for exactly `queries`
    pub fn load(
        &self,
        kind: RecognizerKind,
        name: &str,
        queries: &[String],
    ) -> Result<Vec<Option<RawResponse>>, CacheError> {
        let path = self.path_for(kind, name);
        let content = fs::read_to_string(&path).map_err(|source| CacheError::Io {
            path: path.clone(),
            source,
        })?;
        let file: CacheFile = serde_json::from_str(&content).map_err(|source| CacheError::Json {
            path: path.clone(),
            source,
        })?;

        if let Some(reason) = file.stale_for(kind, queries) {
            return Err(CacheError::Stale { path, reason });
        }

        tracing::info!(
            "Loaded {} cached responses for {} from {}",
            file.responses.len(),
            name,
            path.display()
        );
        Ok(file.responses)
    }

    /// Write responses for `queries`, replacing any previous cache for this
    /// recognizer
    pub fn store(
        &self,
        kind: RecognizerKind,
        name: &str,
        queries: &[String],
        responses: &[Option<RawResponse>],
    ) -> Result<PathBuf, CacheError> {
        fs::create_dir_all(&self.dir).map_err(|source| CacheError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.path_for(kind, name);
        let file = CacheFile {
            recognizer: kind,
            queries: queries.to_vec(),
            responses: responses.to_vec(),
        };
        let json = serde_json::to_string_pretty(&file).map_err(|source| CacheError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(|source| CacheError::Io {
            path: path.clone(),
            source,
        })?;

        tracing::debug!("Cached {} responses at {}", responses.len(), path.display());
        Ok(path)
    }
}

impl CacheFile {
    fn stale_for(&self, kind: RecognizerKind, queries: &[String]) -> Option<StaleReason> {
        if self.recognizer != kind {
            return Some(StaleReason::Recognizer {
                expected: kind,
                found: self.recognizer.to_string(),
            });
        }
        if self.responses.len() != queries.len() || self.queries.len() != queries.len() {
            return Some(StaleReason::Length {
                expected: queries.len(),
                got: self.responses.len(),
            });
        }
        if let Some(index) = self.queries.iter().zip(queries).position(|(a, b)| a != b) {
            return Some(StaleReason::QueryMismatch { index });
        }
        self.responses
            .iter()
            .flatten()
            .find(|raw| raw.recognizer() != kind.as_str())
            .map(|raw| StaleReason::Recognizer {
                expected: kind,
                found: raw.recognizer().to_string(),
            })
    }
}

/// Read a response file: a JSON array with one entry per query
pub fn read_responses(path: &Path) -> Result<Vec<Option<RawResponse>>, CacheError> {
    let content = fs::read_to_string(path).map_err(|source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| CacheError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_responses(path: &Path, responses: &[Option<RawResponse>]) -> Result<(), CacheError> {
    let json = serde_json::to_string_pretty(responses).map_err(|source| CacheError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ser::normalize::{MallardEntity, MallardResponse, MallardSpan};
    use ser::Corpus;
    use tempfile::TempDir;

    fn queries() -> Vec<String> {
        vec!["add 2 apples".to_string(), "hello".to_string()]
    }

    fn sample() -> Vec<Option<RawResponse>> {
        vec![
            Some(RawResponse::Mallard(MallardResponse::new(vec![MallardEntity {
                dimension: "number".to_string(),
                entity: MallardSpan {
                    start: 4,
                    end: 5,
                    text: Some("2".to_string()),
                },
                value: vec![serde_json::json!(2)],
            }]))),
            None,
        ]
    }

    fn stale_reason(err: CacheError) -> StaleReason {
        match err {
            CacheError::Stale { reason, .. } => reason,
            other => panic!("expected a stale cache, got {other}"),
        }
    }

    #[test]
    fn test_store_then_load() {
        let dir = TempDir::new().unwrap();
        let cache = ResponseCache::new(dir.path().join("cache"));
        assert!(!cache.exists(RecognizerKind::Mallard, "mallard"));

        let path = cache
            .store(RecognizerKind::Mallard, "mallard", &queries(), &sample())
            .unwrap();
        assert!(path.ends_with("mallard_mallard_responses.json"));
        assert!(cache.exists(RecognizerKind::Mallard, "mallard"));

        let loaded = cache.load(RecognizerKind::Mallard, "mallard", &queries()).unwrap();
        assert_eq!(loaded, sample());
        assert_eq!(loaded[0].as_ref().unwrap().normalize().entity_count(), 1);
    }

    #[test]
    fn test_length_mismatch_is_stale() {
        let dir = TempDir::new().unwrap();
        let cache = ResponseCache::new(dir.path());
        cache
            .store(RecognizerKind::Mallard, "mallard", &queries(), &sample())
            .unwrap();

        let mut longer = queries();
        longer.push("one more".to_string());
        let err = cache.load(RecognizerKind::Mallard, "mallard", &longer).unwrap_err();
        assert_eq!(stale_reason(err), StaleReason::Length { expected: 3, got: 2 });
    }

    #[test]
    fn test_same_length_different_corpus_is_stale() {
        let dir = TempDir::new().unwrap();
        let cache = ResponseCache::new(dir.path());
        cache
            .store(RecognizerKind::Mallard, "mallard", &queries(), &sample())
            .unwrap();

        let other = Corpus::from_lines(
            ["tomorrow at noon", "hello"],
            ["{tomorrow at noon|sys_time}", "hello"],
        )
        .unwrap();
        let texts: Vec<String> = other.iter().map(|q| q.text.clone()).collect();
        assert_eq!(texts.len(), queries().len());

        let err = cache.load(RecognizerKind::Mallard, "mallard", &texts).unwrap_err();
        assert_eq!(stale_reason(err), StaleReason::QueryMismatch { index: 0 });
    }

    #[test]
    fn test_shared_name_keeps_kinds_apart() {
        let dir = TempDir::new().unwrap();
        let cache = ResponseCache::new(dir.path());
        cache
            .store(RecognizerKind::Mallard, "ser", &queries(), &sample())
            .unwrap();

        assert!(!cache.exists(RecognizerKind::Duckling, "ser"));
        assert_ne!(
            cache.path_for(RecognizerKind::Mallard, "ser"),
            cache.path_for(RecognizerKind::Duckling, "ser")
        );
    }

    #[test]
    fn test_foreign_responses_are_stale() {
        let dir = TempDir::new().unwrap();
        let cache = ResponseCache::new(dir.path());
        // Mallard-shaped responses written under the duckling file name.
        cache
            .store(RecognizerKind::Mallard, "ser", &queries(), &sample())
            .unwrap();
        fs::rename(
            cache.path_for(RecognizerKind::Mallard, "ser"),
            cache.path_for(RecognizerKind::Duckling, "ser"),
        )
        .unwrap();

        let err = cache.load(RecognizerKind::Duckling, "ser", &queries()).unwrap_err();
        assert!(matches!(stale_reason(err), StaleReason::Recognizer { .. }));
    }

    #[test]
    fn test_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let cache = ResponseCache::new(dir.path());
        fs::write(cache.path_for(RecognizerKind::Duckling, "duckling"), "{not json").unwrap();

        let err = cache.load(RecognizerKind::Duckling, "duckling", &queries()).unwrap_err();
        assert!(matches!(err, CacheError::Json { .. }));
    }

    #[test]
    fn test_plain_response_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("baseline.json");
        write_responses(&path, &sample()).unwrap();
        assert_eq!(read_responses(&path).unwrap(), sample());
    }
}
