//! Corpus files

pub mod loader;

pub use loader::{load_corpus, load_corpus_from_lines, read_lines, LoadError};
