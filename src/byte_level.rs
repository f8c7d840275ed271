//! The byte-level codec: a fixed, training-free 256-symbol vocabulary.

use std::path::Path;

use crate::artifact::{read_record, write_record, ByteRecord};
use crate::corpus::Corpus;
use crate::encoding::{Encoding, TokenId};
use crate::error::Result;
use crate::metrics::TrainingMetrics;
use crate::tokenizer::Tokenizer;
use crate::vocab::Vocabulary;

const ARTIFACT_FILE: &str = "byte_vocab.json";

/// Fixed-vocabulary codec over raw UTF-8 bytes: id = byte value.
///
/// Every possible byte stream is representable, so this is the baseline
/// tokenizer: coverage is always total and round-trip is exact for any
/// well-formed UTF-8 input. Decoding malformed byte sequences substitutes
/// U+FFFD rather than failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteTokenizer {
    vocab: Vocabulary,
}

impl ByteTokenizer {
    /// Creates the codec with its fixed 256-entry vocabulary.
    ///
    /// Tokens are the Latin-1 single-character strings, whose lexicographic
    /// order coincides with byte order, so each token's id equals its byte
    /// value.
    #[must_use]
    pub fn new() -> Self {
        let tokens = (0u8..=u8::MAX).map(|byte| char::from(byte).to_string());
        Self {
            vocab: Vocabulary::from_token_set(tokens),
        }
    }
}

impl Default for ByteTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer for ByteTokenizer {
    /// The vocabulary is fixed at construction; training is a no-op.
    fn train(&mut self, _corpus: &Corpus) -> Result<TrainingMetrics> {
        Ok(TrainingMetrics::new(0))
    }

    fn encode(&self, text: &str) -> Encoding {
        let mut encoding = Encoding::with_capacity(text.len());
        for byte in text.bytes() {
            encoding.push_matched(TokenId::from(byte));
        }
        encoding
    }

    fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Reassembles bytes and decodes as UTF-8, substituting U+FFFD for any
    /// malformed sequence. Ids outside the byte range are skipped.
    fn decode(&self, ids: &[TokenId]) -> String {
        let bytes: Vec<u8> = ids
            .iter()
            .filter_map(|&id| u8::try_from(id).ok())
            .collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    fn save(&self, dir: &Path) -> Result<()> {
        let record = ByteRecord::from_vocabulary(&self.vocab);
        write_record(dir, ARTIFACT_FILE, &record)
    }

    fn load(dir: &Path) -> Result<Self> {
        let record: ByteRecord = read_record(dir, ARTIFACT_FILE)?;
        let vocab = record.into_vocabulary()?;
        Ok(Self { vocab })
    }
}
