//! Error handling utilities shared across the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Convenient result type used throughout the crate.
pub type Result<T, E = SeqTokError> = std::result::Result<T, E>;

/// Domain-specific error describing failures during configuration, IO, or persistence.
///
/// Lookup misses at encode/decode time are deliberately absent: an unmatched
/// input symbol or an unknown token id is an expected outcome, not a failure.
#[derive(Debug, Error)]
pub enum SeqTokError {
    /// Tokenizer configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Training was requested over a corpus with no usable lines.
    #[error("training requires a non-empty corpus")]
    EmptyCorpus,
    /// Filesystem IO error with optional context path.
    #[error("io error while processing {path:?}: {source}")]
    Io {
        /// Underlying IO error returned by the standard library.
        source: std::io::Error,
        /// Target path associated with the IO failure if available.
        path: Option<PathBuf>,
    },
    /// `load` was called on a location that was never saved to.
    #[error("no tokenizer artifact found at {0:?}")]
    ArtifactMissing(PathBuf),
    /// Persisted state is malformed: bad JSON, schema mismatch, or a broken mapping.
    #[error("artifact error: {0}")]
    Artifact(String),
}

impl From<serde_json::Error> for SeqTokError {
    fn from(err: serde_json::Error) -> Self {
        Self::Artifact(err.to_string())
    }
}

impl SeqTokError {
    /// Helper constructor that attaches an optional path when wrapping IO errors.
    pub fn io(source: std::io::Error, path: Option<PathBuf>) -> Self {
        Self::Io { source, path }
    }
}
