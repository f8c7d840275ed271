//! Configuration shared by the trainable tokenizer variants.

use crate::error::{Result, SeqTokError};
use serde::{Deserialize, Serialize};

/// Configuration for tokenizer training and encoding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenizerConfig {
    /// Target vocabulary size; trainers stop growing the vocabulary once reached.
    pub vocab_size: usize,
    /// Longest span (in symbols) considered by longest-match encoding and
    /// by unigram substring enumeration.
    pub max_token_len: usize,
    /// Hard cap on merge iterations; `None` trains until the vocabulary cap
    /// or pair exhaustion. The hybrid tokenizer substitutes its own default
    /// cap when unset.
    pub max_merge_iterations: Option<usize>,
    /// Enables per-iteration logging through the `log` facade.
    pub show_progress: bool,
}

impl TokenizerConfig {
    /// Returns a builder initialised with [`TokenizerConfig::default`].
    #[must_use]
    pub fn builder() -> TokenizerBuilder {
        TokenizerBuilder::default()
    }

    /// Validates the invariants required for training.
    pub fn validate(&self) -> Result<()> {
        if self.vocab_size == 0 {
            return Err(SeqTokError::InvalidConfig(
                "vocab_size must be greater than zero".into(),
            ));
        }
        if self.max_token_len == 0 {
            return Err(SeqTokError::InvalidConfig(
                "max_token_len must be greater than zero".into(),
            ));
        }
        if self.max_merge_iterations == Some(0) {
            return Err(SeqTokError::InvalidConfig(
                "max_merge_iterations must be greater than zero when set".into(),
            ));
        }
        Ok(())
    }
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            vocab_size: 1000,
            max_token_len: 10,
            max_merge_iterations: None,
            show_progress: true,
        }
    }
}

/// Builder for [`TokenizerConfig`].
#[derive(Debug, Default, Clone)]
pub struct TokenizerBuilder {
    cfg: TokenizerConfig,
}

impl TokenizerBuilder {
    /// Creates a builder with [`TokenizerConfig::default`] settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the target vocabulary size.
    #[must_use]
    pub fn vocab_size(mut self, value: usize) -> Self {
        self.cfg.vocab_size = value;
        self
    }

    /// Sets the longest matched span in symbols.
    #[must_use]
    pub fn max_token_len(mut self, value: usize) -> Self {
        self.cfg.max_token_len = value;
        self
    }

    /// Sets a hard merge iteration limit.
    #[must_use]
    pub fn max_merge_iterations(mut self, value: Option<usize>) -> Self {
        self.cfg.max_merge_iterations = value;
        self
    }

    /// Enables or disables per-iteration logging.
    #[must_use]
    pub fn show_progress(mut self, enabled: bool) -> Self {
        self.cfg.show_progress = enabled;
        self
    }

    /// Finalises the builder, returning a validated [`TokenizerConfig`].
    pub fn build(self) -> Result<TokenizerConfig> {
        self.cfg.validate()?;
        Ok(self.cfg)
    }
}
