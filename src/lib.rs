//! Subword tokenizer training and evaluation for short symbolic sequences.
//!
//! The crate implements four tokenizer variants sharing one contract
//! ([`Tokenizer`]): a fixed byte-level codec, a unigram-frequency tokenizer,
//! a merge-based (BPE) tokenizer, and a hybrid tokenizer that honors a list
//! of domain-known long tokens before merging. An evaluation harness
//! compares trained variants over a held-out test set. The design is
//! alphabet-agnostic; DNA-alphabet strings are simply the motivating corpus.
//!
//! ```
//! use seqtok::{BpeTokenizer, Corpus, Tokenizer, TokenizerConfig};
//!
//! # fn main() -> seqtok::Result<()> {
//! let corpus = Corpus::from_lines(["ACGTACGT", "GATTACA", "GATTACAGATTACA"]);
//! let cfg = TokenizerConfig::builder()
//!     .vocab_size(32)
//!     .show_progress(false)
//!     .build()?;
//! let mut tokenizer = BpeTokenizer::new(cfg);
//! tokenizer.train(&corpus)?;
//! let ids = tokenizer.encode("GATTACA").token_ids();
//! assert_eq!(tokenizer.decode(&ids), "GATTACA");
//! # Ok(())
//! # }
//! ```
//!
//! The CLI is enabled by default through the `cli` feature. Users targeting
//! the library portion only can disable default features to avoid the CLI
//! dependencies: `seqtok = { version = "...", default-features = false }`.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    clippy::all,
    rust_2018_idioms,
    future_incompatible,
    unused_lifetimes,
    unreachable_pub
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::doc_markdown,
    clippy::multiple_crate_versions
)]

pub mod artifact;
pub mod bpe;
pub mod byte_level;
pub mod config;
pub mod corpus;
pub mod encoding;
pub mod error;
pub mod eval;
pub mod hybrid;
mod merge;
pub mod metrics;
pub mod tokenizer;
pub mod unigram;
pub mod vocab;

pub use bpe::BpeTokenizer;
pub use byte_level::ByteTokenizer;
pub use config::{TokenizerBuilder, TokenizerConfig};
pub use corpus::Corpus;
pub use encoding::{EncodeOutcome, Encoding, TokenId};
pub use error::{Result, SeqTokError};
pub use eval::{EvalReport, EvalRow, TokenizerEvaluator};
pub use hybrid::HybridTokenizer;
pub use metrics::{IterationMetrics, StopReason, TrainingMetrics};
pub use tokenizer::Tokenizer;
pub use unigram::UnigramTokenizer;
pub use vocab::Vocabulary;
