//! The operation contract shared by every tokenizer variant.

use std::path::Path;

use crate::corpus::Corpus;
use crate::encoding::{Encoding, TokenId};
use crate::error::Result;
use crate::metrics::TrainingMetrics;
use crate::vocab::Vocabulary;

/// Common contract implemented by all tokenizer variants.
///
/// `encode` and `decode` never fail for any input: unmatched symbols surface
/// as named outcomes on [`Encoding`] and unknown ids are skipped. Only
/// malformed configuration or persisted state produces hard errors.
pub trait Tokenizer {
    /// Trains over a restartable, finite corpus. Repeat calls overwrite any
    /// prior vocabulary state.
    fn train(&mut self, corpus: &Corpus) -> Result<TrainingMetrics>;

    /// Encodes a string into an outcome stream. Never fails.
    fn encode(&self, text: &str) -> Encoding;

    /// Returns the vocabulary owned by this instance.
    fn vocab(&self) -> &Vocabulary;

    /// Decodes ids back into text, silently skipping unknown ids.
    fn decode(&self, ids: &[TokenId]) -> String {
        ids.iter()
            .filter_map(|&id| self.vocab().token_of(id))
            .collect()
    }

    /// Persists the full vocabulary state under `dir`.
    fn save(&self, dir: &Path) -> Result<()>;

    /// Reconstructs an instance from a previously saved directory.
    fn load(dir: &Path) -> Result<Self>
    where
        Self: Sized;
}
