//! Corpus loading from aligned line files

use std::path::{Path, PathBuf};

use ser::Corpus;

/// Error type for corpus loading
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{clean} has {clean_lines} lines but {annotated} has {annotated_lines}")]
    Misaligned {
        clean: PathBuf,
        annotated: PathBuf,
        clean_lines: usize,
        annotated_lines: usize,
    },

    #[error("Corpus error: {0}")]
    Corpus(#[from] ser::Error),
}

/// Load a labeled corpus from a clean-query file and an annotated-query file.
///
/// Line `i` of each file describes query `i`. Lines are trimmed.
pub fn load_corpus(clean: impl AsRef<Path>, annotated: impl AsRef<Path>) -> Result<Corpus, LoadError> {
    let (clean, annotated) = (clean.as_ref(), annotated.as_ref());
    let clean_lines = read_lines(clean)?;
    let annotated_lines = read_lines(annotated)?;

    if clean_lines.len() != annotated_lines.len() {
        return Err(LoadError::Misaligned {
            clean: clean.to_path_buf(),
            annotated: annotated.to_path_buf(),
            clean_lines: clean_lines.len(),
            annotated_lines: annotated_lines.len(),
        });
    }

    let corpus = load_corpus_from_lines(clean_lines, annotated_lines)?;
    tracing::info!(
        "Loaded {} queries with {} entities from {}",
        corpus.len(),
        corpus.entity_count(),
        annotated.display()
    );
    Ok(corpus)
}

/// Build a corpus from in-memory lines
pub fn load_corpus_from_lines(clean: Vec<String>, annotated: Vec<String>) -> Result<Corpus, LoadError> {
    Ok(Corpus::from_lines(clean, annotated)?)
}

/// Read a file as trimmed lines
pub fn read_lines(path: &Path) -> Result<Vec<String>, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(split_lines(&content))
}

fn split_lines(content: &str) -> Vec<String> {
    content.lines().map(|l| l.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_corpus() {
        let dir = TempDir::new().unwrap();
        let clean = write(&dir, "clean.txt", "set a timer for 5 minutes\r\n  what time is it \nno entities here\n");
        let annotated = write(
            &dir,
            "annotated.txt",
            "set a timer for {5 minutes|sys_duration}\nwhat time is it\nno entities here\n",
        );

        let corpus = load_corpus(&clean, &annotated).unwrap();
        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus.entity_count(), 1);
        assert_eq!(corpus.get(1).unwrap().text, "what time is it");
        assert_eq!(corpus.get(0).unwrap().ground_truth[0].label, "duration");
    }

    #[test]
    fn test_misaligned_files() {
        let dir = TempDir::new().unwrap();
        let clean = write(&dir, "clean.txt", "one\ntwo\n");
        let annotated = write(&dir, "annotated.txt", "one\n");

        let err = load_corpus(&clean, &annotated).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Misaligned { clean_lines: 2, annotated_lines: 1, .. }
        ));
    }

    #[test]
    fn test_desync_surfaces_as_corpus_error() {
        let dir = TempDir::new().unwrap();
        let clean = write(&dir, "clean.txt", "call me at noon\n");
        let annotated = write(&dir, "annotated.txt", "call me {at midnight|sys_time}\n");

        let err = load_corpus(&clean, &annotated).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Corpus(ser::Error::CorpusDesync { query: Some(0), .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = load_corpus("/nonexistent/clean.txt", "/nonexistent/annotated.txt").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
