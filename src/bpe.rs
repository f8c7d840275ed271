//! Merge-based (BPE) tokenizer: vocabulary grown by adjacent-pair merging.

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

const ARTIFACT_FILE: &str = "bpe_vocab.json";

/// Tokenizer trained by iteratively merging the most frequent adjacent
/// symbol pair until the vocabulary cap, pair exhaustion, or the optional
/// iteration cap.
///
/// Pair counts are recomputed from scratch after every merge; the cost is
/// O(merges x corpus size) by design. Encoding is greedy longest-match over
/// the merge-built vocabulary; an unmatched symbol emits an explicit
/// unmatched outcome and the scan advances one symbol.
#[derive(Debug, Clone)]
pub struct BpeTokenizer {
    cfg: TokenizerConfig,
    vocab: Vocabulary,
}

impl BpeTokenizer {
    /// Creates a fresh instance; training is required before encoding is useful.
    #[must_use]
    pub fn new(cfg: TokenizerConfig) -> Self {
        Self {
            cfg,
            vocab: Vocabulary::new(),
        }
    }

    /// Returns the configuration this instance was built with.
    #[must_use]
    pub fn config(&self) -> &TokenizerConfig {
        &self.cfg
    }
}

impl Tokenizer for BpeTokenizer {
    fn train(&mut self, corpus: &Corpus) -> Result<TrainingMetrics> {
        self.cfg.validate()?;
        if corpus.is_empty() {
            return Err(SeqTokError::EmptyCorpus);
        }
        let training_start = Instant::now();
        if self.cfg.show_progress {
            info!(
                "training bpe tokenizer: {} lines, vocab cap {}",
                corpus.len(),
                self.cfg.vocab_size
            );
        }

        let mut symbols = SymbolTable::new();
        let mut sequences: Vec<Vec<_>> = corpus
            .iter()
            .map(|line| {
                line.chars()
                    .map(|symbol| symbols.intern(symbol.encode_utf8(&mut [0u8; 4])))
                    .collect()
            })
            .collect();
        // Base character set: every atomic symbol is reachable before merges.
        let mut vocab_tokens: AHashSet<String> =
            symbols.strings().map(str::to_string).collect();

        let mut metrics = TrainingMetrics::new(self.cfg.vocab_size.min(16_384));
        let mut iteration = 0usize;
        loop {
            if vocab_tokens.len() >= self.cfg.vocab_size {
                metrics.stop_reason = StopReason::TargetVocabReached;
                break;
            }
            if let Some(cap) = self.cfg.max_merge_iterations {
                if iteration >= cap {
                    metrics.stop_reason = StopReason::MaxIterationsReached;
                    break;
                }
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
                "bpe training finished in {:.2?}; vocab size {}, stop reason {:?}",
                metrics.total_duration,
                self.vocab.len(),
                metrics.stop_reason
            );
        }
        Ok(metrics)
    }

    fn encode(&self, text: &str) -> Encoding {
        let symbols: Vec<char> = text.chars().collect();
        let mut encoding = Encoding::with_capacity(symbols.len());
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
        encoding
    }

    fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    fn save(&self, dir: &Path) -> Result<()> {
        let record = VocabRecord::from_vocabulary(self.cfg.vocab_size, &self.vocab, None);
        write_record(dir, ARTIFACT_FILE, &record)
    }

    fn load(dir: &Path) -> Result<Self> {
        let record: VocabRecord = read_record(dir, ARTIFACT_FILE)?;
        let cfg = TokenizerConfig::builder()
            .vocab_size(record.vocab_size)
            .build()?;
        let vocab = record.into_vocabulary()?;
        Ok(Self { cfg, vocab })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::EncodeOutcome;
    use std::fs;
    use tempfile::tempdir;

    fn demo_corpus() -> Corpus {
        Corpus::from_lines([
            "ACGTACGTGATTACAGGCT",
            "TATAAGCTAGACGT",
            "GATTACAGATTACAGATTACA",
        ])
    }

    fn trained(vocab_size: usize) -> BpeTokenizer {
        let cfg = TokenizerConfig::builder()
            .vocab_size(vocab_size)
            .show_progress(false)
            .build()
            .expect("valid config");
        let mut tokenizer = BpeTokenizer::new(cfg);
        tokenizer.train(&demo_corpus()).expect("training succeeds");
        tokenizer
    }

    #[test]
    fn merges_most_frequent_pair_first() {
        // "AC" and "CG" both occur twice; "AC" wins the tie, then "AC"+"G".
        let corpus = Corpus::from_lines(["ACGACG"]);
        let cfg = TokenizerConfig::builder()
            .vocab_size(5)
            .show_progress(false)
            .build()
            .expect("valid config");
        let mut tokenizer = BpeTokenizer::new(cfg);
        let metrics = tokenizer.train(&corpus).expect("training succeeds");
        assert!(tokenizer.vocab().contains("AC"));
        assert!(tokenizer.vocab().contains("ACG"));
        assert_eq!(metrics.stop_reason, StopReason::TargetVocabReached);

        let encoding = tokenizer.encode("ACGA");
        let tokens: Vec<&str> = encoding
            .token_ids()
            .iter()
            .filter_map(|&id| tokenizer.vocab().token_of(id))
            .collect();
        assert_eq!(tokens, vec!["ACG", "A"]);
    }

    #[test]
    fn training_terminates_by_pair_exhaustion_under_a_large_cap() {
        let cfg = TokenizerConfig::builder()
            .vocab_size(100)
            .show_progress(false)
            .build()
            .expect("valid config");
        let mut tokenizer = BpeTokenizer::new(cfg);
        let metrics = tokenizer.train(&demo_corpus()).expect("training succeeds");
        assert_eq!(metrics.stop_reason, StopReason::PairsExhausted);
        assert_eq!(tokenizer.vocab().len(), 29);
        assert_eq!(metrics.iterations.len(), 25);
        // Base character set survives into the final vocabulary.
        for symbol in ["A", "C", "G", "T"] {
            assert!(tokenizer.vocab().contains(symbol), "missing {symbol}");
        }
    }

    #[test]
    fn training_string_round_trips_exactly() {
        let tokenizer = trained(100);
        let text = "GATTACAGATTACAGATTACA";
        let encoding = tokenizer.encode(text);
        assert!(encoding.is_fully_matched());
        assert_eq!(tokenizer.decode(&encoding.token_ids()), text);
    }

    #[test]
    fn vocab_size_is_monotonic_and_capped() {
        let cfg = TokenizerConfig::builder()
            .vocab_size(10)
            .show_progress(false)
            .build()
            .expect("valid config");
        let mut tokenizer = BpeTokenizer::new(cfg);
        let metrics = tokenizer.train(&demo_corpus()).expect("training succeeds");
        let mut previous = 0;
        for iteration in &metrics.iterations {
            assert!(iteration.vocab_size >= previous);
            assert!(iteration.vocab_size <= 10);
            previous = iteration.vocab_size;
        }
        assert_eq!(metrics.stop_reason, StopReason::TargetVocabReached);
        assert_eq!(tokenizer.vocab().len(), 10);
    }

    #[test]
    fn iteration_cap_bounds_training() {
        let cfg = TokenizerConfig::builder()
            .vocab_size(100)
            .max_merge_iterations(Some(3))
            .show_progress(false)
            .build()
            .expect("valid config");
        let mut tokenizer = BpeTokenizer::new(cfg);
        let metrics = tokenizer.train(&demo_corpus()).expect("training succeeds");
        assert_eq!(metrics.stop_reason, StopReason::MaxIterationsReached);
        assert_eq!(metrics.iterations.len(), 3);
    }

    #[test]
    fn unmatched_symbols_emit_explicit_outcomes() {
        let tokenizer = trained(100);
        let encoding = tokenizer.encode("GAZ");
        assert_eq!(encoding.matched_count(), encoding.len() - 1);
        assert!(encoding
            .outcomes()
            .contains(&EncodeOutcome::Unmatched));
        assert_eq!(tokenizer.decode(&encoding.token_ids()), "GA");
    }

    #[test]
    fn double_training_produces_byte_identical_artifacts() {
        let dir = tempdir().expect("tempdir");
        let first_dir = dir.path().join("first");
        let second_dir = dir.path().join("second");
        trained(100).save(&first_dir).expect("save first");
        trained(100).save(&second_dir).expect("save second");

        let first = fs::read(first_dir.join("bpe_vocab.json")).expect("read first");
        let second = fs::read(second_dir.join("bpe_vocab.json")).expect("read second");
        assert_eq!(first, second);
    }

    #[test]
    fn retraining_discards_prior_state() {
        let mut tokenizer = trained(100);
        tokenizer
            .train(&Corpus::from_lines(["GGGG"]))
            .expect("retraining succeeds");
        assert!(tokenizer.vocab().contains("G"));
        assert!(!tokenizer.vocab().contains("GATTACA"));
    }

    #[test]
    fn empty_corpus_fails_fast() {
        let cfg = TokenizerConfig::builder()
            .show_progress(false)
            .build()
            .expect("valid config");
        let mut tokenizer = BpeTokenizer::new(cfg);
        let err = tokenizer
            .train(&Corpus::from_lines(Vec::<String>::new()))
            .expect_err("empty corpus");
        assert!(matches!(err, SeqTokError::EmptyCorpus));
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempdir().expect("tempdir");
        let tokenizer = trained(100);
        tokenizer.save(dir.path()).expect("save");
        let loaded = BpeTokenizer::load(dir.path()).expect("load");
        assert_eq!(loaded.vocab(), tokenizer.vocab());

        let text = "GATTACAGATTACAGATTACA";
        assert_eq!(
            loaded.encode(text).token_ids(),
            tokenizer.encode(text).token_ids()
        );
    }
}
