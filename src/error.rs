//! Fatal error surface for the harness and its I/O boundary.
//!
//! The three associative-array engines (`patricia`, `ternary`,
//! `hash_table`) are deliberately infallible: `insert`/`search_report`
//! never return a `Result`. Everything that *can* fail lives at the
//! edges — reading corpora, writing CSV rows, drawing a bounded sample —
//! and is collected here.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corpus file {path:?} produced no words after cleaning")]
    EmptyCorpus { path: PathBuf },

    #[error("rejection sampler could not draw {target} words (managed {drawn})")]
    SampleExhausted { target: usize, drawn: usize },

    #[error("bad configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, HarnessError>;
