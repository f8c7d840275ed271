//! Persisted vocabulary records and their on-disk lifecycle.
//!
//! Each tokenizer instance persists one JSON record per directory. Writes go
//! through a temp-file-then-rename sequence so a crash mid-write never leaves
//! a corrupt record observable to a subsequent load. Loads validate the full
//! record before any tokenizer state is populated.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::encoding::TokenId;
use crate::error::{Result, SeqTokError};
use crate::vocab::Vocabulary;

/// Version stamp embedded in every persisted record.
pub const SCHEMA_VERSION: u32 = 1;

/// Persisted vocabulary state for the trainable tokenizer variants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VocabRecord {
    /// Record format version; loads reject mismatches.
    pub schema: u32,
    /// Configured vocabulary cap, not necessarily the achieved size.
    pub vocab_size: usize,
    /// Token strings in id order.
    pub vocab: Vec<String>,
    /// Token string to dense id.
    pub token2id: BTreeMap<String, TokenId>,
    /// Dense id (serialized as text) back to token string.
    pub id2token: BTreeMap<String, String>,
    /// Long-token list in length-descending order; hybrid tokenizers only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_tokens: Option<Vec<String>>,
}

impl VocabRecord {
    /// Builds a record from a finalised vocabulary.
    #[must_use]
    pub fn from_vocabulary(
        vocab_size: usize,
        vocab: &Vocabulary,
        long_tokens: Option<&[String]>,
    ) -> Self {
        let tokens: Vec<String> = vocab.iter().map(str::to_string).collect();
        let token2id = tokens
            .iter()
            .enumerate()
            .map(|(id, token)| (token.clone(), id as TokenId))
            .collect();
        let id2token = tokens
            .iter()
            .enumerate()
            .map(|(id, token)| (id.to_string(), token.clone()))
            .collect();
        Self {
            schema: SCHEMA_VERSION,
            vocab_size,
            vocab: tokens,
            token2id,
            id2token,
            long_tokens: long_tokens.map(<[String]>::to_vec),
        }
    }

    /// Validates schema version, id density, and the token/id bijection.
    pub fn validate(&self) -> Result<()> {
        if self.schema != SCHEMA_VERSION {
            return Err(SeqTokError::Artifact(format!(
                "unsupported schema version {} (expected {SCHEMA_VERSION})",
                self.schema
            )));
        }
        let count = self.vocab.len();
        if self.token2id.len() != count || self.id2token.len() != count {
            return Err(SeqTokError::Artifact(format!(
                "inconsistent mapping sizes: vocab {count}, token2id {}, id2token {}",
                self.token2id.len(),
                self.id2token.len()
            )));
        }
        for (token, &id) in &self.token2id {
            if token.is_empty() {
                return Err(SeqTokError::Artifact("empty token in mapping".into()));
            }
            if id as usize >= count {
                return Err(SeqTokError::Artifact(format!(
                    "token id {id} out of range for vocabulary of {count}"
                )));
            }
            match self.id2token.get(&id.to_string()) {
                Some(mapped) if mapped == token => {}
                _ => {
                    return Err(SeqTokError::Artifact(format!(
                        "token {token:?} and id {id} do not round-trip"
                    )));
                }
            }
        }
        for token in &self.vocab {
            if !self.token2id.contains_key(token) {
                return Err(SeqTokError::Artifact(format!(
                    "vocab token {token:?} is missing from token2id"
                )));
            }
        }
        Ok(())
    }

    /// Validates the record and reconstructs the vocabulary it describes.
    pub fn into_vocabulary(self) -> Result<Vocabulary> {
        self.validate()?;
        let mut tokens = vec![String::new(); self.vocab.len()];
        for (key, token) in self.id2token {
            let id: usize = key.parse().map_err(|_| {
                SeqTokError::Artifact(format!("id key {key:?} is not an integer"))
            })?;
            if id >= tokens.len() {
                return Err(SeqTokError::Artifact(format!(
                    "id key {id} out of range for vocabulary of {}",
                    tokens.len()
                )));
            }
            tokens[id] = token;
        }
        Ok(Vocabulary::from_id_ordered_tokens(tokens))
    }
}

/// Persisted state for the byte-level codec: its fixed 256-entry mapping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ByteRecord {
    /// Record format version; loads reject mismatches.
    pub schema: u32,
    /// Token string to byte-valued id.
    pub token2id: BTreeMap<String, TokenId>,
    /// Byte-valued id (serialized as text) back to token string.
    pub id2token: BTreeMap<String, String>,
}

impl ByteRecord {
    /// Builds the record from the codec's fixed vocabulary.
    #[must_use]
    pub fn from_vocabulary(vocab: &Vocabulary) -> Self {
        let token2id = vocab
            .iter()
            .enumerate()
            .map(|(id, token)| (token.to_string(), id as TokenId))
            .collect();
        let id2token = vocab
            .iter()
            .enumerate()
            .map(|(id, token)| (id.to_string(), token.to_string()))
            .collect();
        Self {
            schema: SCHEMA_VERSION,
            token2id,
            id2token,
        }
    }

    /// Validates the record against the fixed 256-entry contract.
    pub fn validate(&self) -> Result<()> {
        if self.schema != SCHEMA_VERSION {
            return Err(SeqTokError::Artifact(format!(
                "unsupported schema version {} (expected {SCHEMA_VERSION})",
                self.schema
            )));
        }
        if self.token2id.len() != 256 || self.id2token.len() != 256 {
            return Err(SeqTokError::Artifact(format!(
                "byte codec mapping must hold 256 entries, found {} and {}",
                self.token2id.len(),
                self.id2token.len()
            )));
        }
        for (token, &id) in &self.token2id {
            match self.id2token.get(&id.to_string()) {
                Some(mapped) if mapped == token => {}
                _ => {
                    return Err(SeqTokError::Artifact(format!(
                        "token {token:?} and id {id} do not round-trip"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Validates the record and reconstructs the codec vocabulary.
    pub fn into_vocabulary(self) -> Result<Vocabulary> {
        self.validate()?;
        let mut tokens = vec![String::new(); self.id2token.len()];
        for (key, token) in self.id2token {
            let id: usize = key.parse().map_err(|_| {
                SeqTokError::Artifact(format!("id key {key:?} is not an integer"))
            })?;
            if id >= tokens.len() {
                return Err(SeqTokError::Artifact(format!(
                    "id key {id} out of range for mapping of {}",
                    tokens.len()
                )));
            }
            tokens[id] = token;
        }
        Ok(Vocabulary::from_id_ordered_tokens(tokens))
    }
}

/// Serialises a record into `dir/file_name`, creating the directory first.
///
/// The record is written to a sibling temp file and renamed into place, so
/// readers observe either the previous complete record or the new one.
pub fn write_record<T: Serialize>(dir: &Path, file_name: &str, record: &T) -> Result<()> {
    fs::create_dir_all(dir).map_err(|err| SeqTokError::io(err, Some(dir.to_path_buf())))?;
    let path = dir.join(file_name);
    let tmp = dir.join(format!("{file_name}.tmp"));
    let json = serde_json::to_string_pretty(record)?;
    fs::write(&tmp, json).map_err(|err| SeqTokError::io(err, Some(tmp.clone())))?;
    fs::rename(&tmp, &path).map_err(|err| SeqTokError::io(err, Some(path)))?;
    Ok(())
}

/// Reads a record from `dir/file_name`, failing with a not-found condition
/// when the location was never saved to.
pub fn read_record<T: DeserializeOwned>(dir: &Path, file_name: &str) -> Result<T> {
    let path = dir.join(file_name);
    if !path.exists() {
        return Err(SeqTokError::ArtifactMissing(path));
    }
    let contents =
        fs::read_to_string(&path).map_err(|err| SeqTokError::io(err, Some(path.clone())))?;
    let record = serde_json::from_str(&contents)?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_vocab() -> Vocabulary {
        Vocabulary::from_token_set(["A", "C", "GA", "T"])
    }

    #[test]
    fn record_round_trips_through_disk() {
        let dir = tempdir().expect("tempdir");
        let record = VocabRecord::from_vocabulary(100, &sample_vocab(), None);
        write_record(dir.path(), "bpe_vocab.json", &record).expect("write");

        let loaded: VocabRecord = read_record(dir.path(), "bpe_vocab.json").expect("read");
        assert_eq!(loaded, record);
        let vocab = loaded.into_vocabulary().expect("reconstruct");
        assert_eq!(vocab, sample_vocab());
        assert!(!dir.path().join("bpe_vocab.json.tmp").exists());
    }

    #[test]
    fn read_missing_record_reports_not_found() {
        let dir = tempdir().expect("tempdir");
        let err = read_record::<VocabRecord>(dir.path(), "bpe_vocab.json")
            .expect_err("missing artifact");
        assert!(matches!(err, SeqTokError::ArtifactMissing(_)));
    }

    #[test]
    fn validate_rejects_schema_mismatch() {
        let mut record = VocabRecord::from_vocabulary(10, &sample_vocab(), None);
        record.schema = SCHEMA_VERSION + 1;
        let err = record.validate().expect_err("schema mismatch");
        assert!(matches!(err, SeqTokError::Artifact(message) if message.contains("schema")));
    }

    #[test]
    fn validate_rejects_broken_bijection() {
        let mut record = VocabRecord::from_vocabulary(10, &sample_vocab(), None);
        record
            .id2token
            .insert("0".to_string(), "WRONG".to_string());
        let err = record.validate().expect_err("broken bijection");
        assert!(matches!(err, SeqTokError::Artifact(_)));
    }

    #[test]
    fn validate_rejects_malformed_json_on_read() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("bpe_vocab.json"), "{ not json").expect("write garbage");
        let err = read_record::<VocabRecord>(dir.path(), "bpe_vocab.json")
            .expect_err("malformed artifact");
        assert!(matches!(err, SeqTokError::Artifact(_)));
    }

    #[test]
    fn long_tokens_survive_serialisation() {
        let dir = tempdir().expect("tempdir");
        let long_tokens = vec!["GATTACA".to_string(), "TATA".to_string()];
        let record = VocabRecord::from_vocabulary(50, &sample_vocab(), Some(&long_tokens));
        write_record(dir.path(), "hybrid_vocab.json", &record).expect("write");
        let loaded: VocabRecord = read_record(dir.path(), "hybrid_vocab.json").expect("read");
        assert_eq!(loaded.long_tokens.as_deref(), Some(long_tokens.as_slice()));
    }
}
