//! Hybrid tokenizer: domain-known long tokens layered over pair merging.

use std::cmp::Reverse;
use std::path::Path;
use std::time::Instant;

use ahash::AHashSet;
use log::{debug, info};

use crate::artifact::{read_record, write_record, VocabRecord};
use crate::config::TokenizerConfig;
use crate::corpus::Corpus;
use crate::encoding::Encoding;
use crate::error::{Result, SeqTokError};
use crate::merge::{apply_merge, count_pairs, select_best_pair, SymbolTable};
use crate::metrics::{sample_rss_kb, IterationMetrics, StopReason, TrainingMetrics};
use crate::tokenizer::Tokenizer;
use crate::vocab::Vocabulary;

const ARTIFACT_FILE: &str = "hybrid_vocab.json";
const DEFAULT_MERGE_ITERATION_CAP: usize = 5000;
const EXCISION_SEPARATOR: &str = " ";

/// One span produced by long-token segmentation.
enum Span<'a> {
    /// An occurrence of a configured long token; already resolved.
    Long(&'a str),
    /// Text between long-token occurrences, left for longest-match encoding.
    Residue(&'a str),
}

/// Tokenizer that guarantees a supplied list of long tokens is always
/// tokenized as single units, with merge-based training over the residue.
///
/// Long tokens are excised from every line before pair counting, so merges
/// never cross an excision boundary; the vocabulary is pre-seeded with the
/// long tokens and their constituent symbols. Encoding segments the input by
/// the long-token list first (longest token, leftmost occurrence), then runs
/// greedy longest-match over what remains. This is a deliberate bias toward
/// domain-known motifs regardless of what merge training would have learned.
#[derive(Debug, Clone)]
pub struct HybridTokenizer {
    cfg: TokenizerConfig,
    long_tokens: Vec<String>,
    vocab: Vocabulary,
}

impl HybridTokenizer {
    /// Creates an instance around the supplied long-token list.
    ///
    /// The list is deduplicated and re-sorted by descending symbol length;
    /// equal-length tokens keep the caller's relative order. Long tokens must
    /// be non-empty and must not contain whitespace (the excision separator).
    pub fn new(long_tokens: Vec<String>, cfg: TokenizerConfig) -> Result<Self> {
        for token in &long_tokens {
            if token.is_empty() {
                return Err(SeqTokError::InvalidConfig(
                    "long tokens must be non-empty".into(),
                ));
            }
            if token.chars().any(char::is_whitespace) {
                return Err(SeqTokError::InvalidConfig(format!(
                    "long token {token:?} must not contain whitespace"
                )));
            }
        }
        let mut seen = AHashSet::new();
        let mut long_tokens = long_tokens;
        long_tokens.retain(|token| seen.insert(token.clone()));
        long_tokens.sort_by_key(|token| Reverse(token.chars().count()));

        let vocab = seed_vocabulary(&long_tokens);
        Ok(Self {
            cfg,
            long_tokens,
            vocab,
        })
    }

    /// Returns the long-token list in its length-descending match order.
    #[must_use]
    pub fn long_tokens(&self) -> &[String] {
        &self.long_tokens
    }

    /// Returns the configuration this instance was built with.
    #[must_use]
    pub fn config(&self) -> &TokenizerConfig {
        &self.cfg
    }

    /// Replaces every long-token occurrence with the separator so that
    /// downstream pair counting never crosses an excision boundary.
    fn excise(&self, line: &str) -> String {
        let mut cleaned = line.to_string();
        for token in &self.long_tokens {
            cleaned = cleaned.replace(token.as_str(), EXCISION_SEPARATOR);
        }
        cleaned
    }

    /// Segments `text` by the long-token list: longest token first, leftmost
    /// occurrence first. A span claimed by an earlier token is never
    /// re-segmented, so overlapping candidates are not both honored.
    fn segment<'a>(&self, text: &'a str) -> Vec<Span<'a>> {
        let mut claimed: Vec<(usize, usize)> = Vec::new();
        for token in &self.long_tokens {
            for (start, matched) in text.match_indices(token.as_str()) {
                let end = start + matched.len();
                let overlaps = claimed
                    .iter()
                    .any(|&(other_start, other_end)| start < other_end && other_start < end);
                if !overlaps {
                    claimed.push((start, end));
                }
            }
        }
        claimed.sort_unstable();

        let mut spans = Vec::new();
        let mut cursor = 0;
        for (start, end) in claimed {
            if cursor < start {
                spans.push(Span::Residue(&text[cursor..start]));
            }
            spans.push(Span::Long(&text[start..end]));
            cursor = end;
        }
        if cursor < text.len() {
            spans.push(Span::Residue(&text[cursor..]));
        }
        spans
    }

    fn encode_residue(&self, residue: &str, encoding: &mut Encoding) {
        let symbols: Vec<char> = residue.chars().collect();
        let mut at = 0;
        while at < symbols.len() {
            match self
                .vocab
                .longest_match_at(&symbols, at, self.cfg.max_token_len)
            {
                Some((id, len)) => {
                    encoding.push_matched(id);
                    at += len;
                }
                None => {
                    encoding.push_unmatched();
                    at += 1;
                }
            }
        }
    }
}

/// Initial vocabulary: the long tokens plus their constituent symbols.
fn seed_vocabulary(long_tokens: &[String]) -> Vocabulary {
    let tokens = long_tokens.iter().cloned().chain(
        long_tokens
            .iter()
            .flat_map(|token| token.chars().map(|symbol| symbol.to_string())),
    );
    Vocabulary::from_token_set(tokens)
}

impl Tokenizer for HybridTokenizer {
    fn train(&mut self, corpus: &Corpus) -> Result<TrainingMetrics> {
        self.cfg.validate()?;
        if corpus.is_empty() {
            return Err(SeqTokError::EmptyCorpus);
        }
        let training_start = Instant::now();
        if self.cfg.show_progress {
            info!(
                "training hybrid tokenizer: {} lines, {} long tokens, vocab cap {}",
                corpus.len(),
                self.long_tokens.len(),
                self.cfg.vocab_size
            );
        }

        let mut symbols = SymbolTable::new();
        let mut sequences: Vec<Vec<_>> = Vec::new();
        for line in corpus.iter() {
            let cleaned = self.excise(line);
            for segment in cleaned.split_whitespace() {
                sequences.push(
                    segment
                        .chars()
                        .map(|symbol| symbols.intern(symbol.encode_utf8(&mut [0u8; 4])))
                        .collect(),
                );
            }
        }

        // Seed: long tokens, their symbols, and the residue's base symbols.
        let mut vocab_tokens: AHashSet<String> = self.long_tokens.iter().cloned().collect();
        vocab_tokens.extend(
            self.long_tokens
                .iter()
                .flat_map(|token| token.chars().map(|symbol| symbol.to_string())),
        );
        vocab_tokens.extend(symbols.strings().map(str::to_string));

        let cap = self
            .cfg
            .max_merge_iterations
            .unwrap_or(DEFAULT_MERGE_ITERATION_CAP);
        let mut metrics = TrainingMetrics::new(self.cfg.vocab_size.min(16_384));
        let mut iteration = 0usize;
        loop {
            if vocab_tokens.len() >= self.cfg.vocab_size {
                metrics.stop_reason = StopReason::TargetVocabReached;
                break;
            }
            if iteration >= cap {
                metrics.stop_reason = StopReason::MaxIterationsReached;
                break;
            }

            let iteration_start = Instant::now();
            let pair_counts = count_pairs(&sequences);
            let Some((best_pair, frequency)) = select_best_pair(&pair_counts, &symbols) else {
                metrics.stop_reason = StopReason::PairsExhausted;
                break;
            };

            let new_token = format!(
                "{}{}",
                symbols.text(best_pair.0),
                symbols.text(best_pair.1)
            );
            let replacement = symbols.intern(&new_token);
            let merges_applied = apply_merge(&mut sequences, best_pair, replacement);
            vocab_tokens.insert(new_token);
            iteration += 1;

            if self.cfg.show_progress {
                debug!(
                    "iter {iteration:>6} freq {frequency:>8} merges {merges_applied:>8} vocab {:>8}",
                    vocab_tokens.len()
                );
            }
            metrics.iterations.push(IterationMetrics {
                iteration,
                best_frequency: frequency,
                merges_applied,
                distinct_pairs: pair_counts.len(),
                vocab_size: vocab_tokens.len(),
                elapsed_iteration: iteration_start.elapsed(),
                elapsed_total: training_start.elapsed(),
                rss_kb: sample_rss_kb(),
            });
        }

        self.vocab = Vocabulary::from_token_set(vocab_tokens);
        metrics.total_duration = training_start.elapsed();
        if self.cfg.show_progress {
            info!(
                "hybrid training finished in {:.2?}; vocab size {}, stop reason {:?}",
                metrics.total_duration,
                self.vocab.len(),
                metrics.stop_reason
            );
        }
        Ok(metrics)
    }

    fn encode(&self, text: &str) -> Encoding {
        let mut encoding = Encoding::with_capacity(text.len());
        for span in self.segment(text) {
            match span {
                Span::Long(token) => match self.vocab.id_of(token) {
                    Some(id) => encoding.push_matched(id),
                    None => encoding.push_unmatched(),
                },
                Span::Residue(residue) => self.encode_residue(residue, &mut encoding),
            }
        }
        encoding
    }

    fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    fn save(&self, dir: &Path) -> Result<()> {
        let record = VocabRecord::from_vocabulary(
            self.cfg.vocab_size,
            &self.vocab,
            Some(&self.long_tokens),
        );
        write_record(dir, ARTIFACT_FILE, &record)
    }

    fn load(dir: &Path) -> Result<Self> {
        let record: VocabRecord = read_record(dir, ARTIFACT_FILE)?;
        let cfg = TokenizerConfig::builder()
            .vocab_size(record.vocab_size)
            .build()?;
        let long_tokens = record.long_tokens.clone().ok_or_else(|| {
            SeqTokError::Artifact("hybrid record is missing long_tokens".into())
        })?;
        let vocab = record.into_vocabulary()?;
        let mut long_tokens = long_tokens;
        long_tokens.sort_by_key(|token| Reverse(token.chars().count()));
        Ok(Self {
            cfg,
            long_tokens,
            vocab,
        })
    }
}
