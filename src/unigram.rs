//! Unigram-frequency tokenizer: vocabulary from top-frequency substrings.

use std::path::Path;
use std::time::Instant;

use log::info;
use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::artifact::{read_record, write_record, VocabRecord};
use crate::config::TokenizerConfig;
use crate::corpus::Corpus;
use crate::encoding::Encoding;
use crate::error::{Result, SeqTokError};
use crate::metrics::TrainingMetrics;
use crate::tokenizer::Tokenizer;
use crate::vocab::Vocabulary;

const ARTIFACT_FILE: &str = "unigram_vocab.json";

/// Tokenizer whose vocabulary is the most frequent substrings of the corpus,
/// bounded in length by [`TokenizerConfig::max_token_len`].
///
/// The cheapest variant: frequency ranking approximates an entropy-coding
/// vocabulary without any merge dynamics. Encoding is greedy longest-match;
/// a symbol with no match is skipped without emitting an outcome.
#[derive(Debug, Clone)]
pub struct UnigramTokenizer {
    cfg: TokenizerConfig,
    vocab: Vocabulary,
}

impl UnigramTokenizer {
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

impl Tokenizer for UnigramTokenizer {
    fn train(&mut self, corpus: &Corpus) -> Result<TrainingMetrics> {
        self.cfg.validate()?;
        if corpus.is_empty() {
            return Err(SeqTokError::EmptyCorpus);
        }
        let start = Instant::now();
        if self.cfg.show_progress {
            info!(
                "training unigram tokenizer: {} lines, vocab cap {}",
                corpus.len(),
                self.cfg.vocab_size
            );
        }

        let counts = count_substrings(corpus.lines(), self.cfg.max_token_len);
        let selected = select_top_tokens(&counts, self.cfg.vocab_size);
        self.vocab = Vocabulary::from_token_set(selected);

        let mut metrics = TrainingMetrics::new(0);
        metrics.total_duration = start.elapsed();
        if self.cfg.show_progress {
            info!(
                "unigram training finished in {:.2?}; vocab size {}",
                metrics.total_duration,
                self.vocab.len()
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
                // Unknown symbol: skip without emitting.
                None => at += 1,
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

/// Counts every contiguous substring of length `1..=max_len` across all lines.
fn count_substrings(lines: &[String], max_len: usize) -> FxHashMap<String, usize> {
    lines
        .par_iter()
        .map(|line| {
            let symbols: Vec<char> = line.chars().collect();
            let mut local = FxHashMap::default();
            for start in 0..symbols.len() {
                let end = symbols.len().min(start + max_len);
                let mut substring = String::new();
                for symbol in &symbols[start..end] {
                    substring.push(*symbol);
                    *local.entry(substring.clone()).or_insert(0usize) += 1;
                }
            }
            local
        })
        .reduce(FxHashMap::default, |mut acc, local| {
            for (substring, count) in local {
                *acc.entry(substring).or_insert(0) += count;
            }
            acc
        })
}

/// Keeps the top `vocab_size` substrings by frequency, ties broken toward the
/// lexicographically smaller substring. Observed single symbols are always
/// selected so every seen symbol has a length-1 match.
fn select_top_tokens(counts: &FxHashMap<String, usize>, vocab_size: usize) -> Vec<String> {
    let is_single = |token: &str| token.chars().nth(1).is_none();

    let mut selected: Vec<String> = counts
        .keys()
        .filter(|token| is_single(token.as_str()))
        .cloned()
        .collect();

    let mut ranked: Vec<(&String, usize)> = counts
        .iter()
        .filter(|(token, _)| !is_single(token.as_str()))
        .map(|(token, &count)| (token, count))
        .collect();
    ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let budget = vocab_size.saturating_sub(selected.len());
    selected.extend(
        ranked
            .into_iter()
            .take(budget)
            .map(|(token, _)| token.clone()),
    );
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn demo_corpus() -> Corpus {
        Corpus::from_lines([
            "ACGTACGTGATTACAGGCT",
            "TATAAGCTAGACGT",
            "GATTACAGATTACAGATTACA",
        ])
    }

    fn trained(vocab_size: usize) -> UnigramTokenizer {
        let cfg = TokenizerConfig::builder()
            .vocab_size(vocab_size)
            .show_progress(false)
            .build()
            .expect("valid config");
        let mut tokenizer = UnigramTokenizer::new(cfg);
        tokenizer.train(&demo_corpus()).expect("training succeeds");
        tokenizer
    }

    #[test]
    fn every_observed_symbol_is_in_the_vocabulary() {
        // A cap below the alphabet size still keeps all observed symbols.
        let tokenizer = trained(2);
        for symbol in ["A", "C", "G", "T"] {
            assert!(tokenizer.vocab().contains(symbol), "missing {symbol}");
        }
    }

    #[test]
    fn frequent_substrings_rank_into_the_vocabulary() {
        let tokenizer = trained(100);
        assert!(tokenizer.vocab().contains("GATTACA"));
        assert_eq!(tokenizer.vocab().len(), 100);
    }

    #[test]
    fn encode_skips_unknown_symbols_silently() {
        let tokenizer = trained(100);
        let encoding = tokenizer.encode("AXA");
        // "X" never occurred in training: no outcome is emitted for it.
        assert!(encoding.is_fully_matched());
        assert_eq!(tokenizer.decode(&encoding.token_ids()), "AA");
    }

    #[test]
    fn round_trips_training_material() {
        let tokenizer = trained(100);
        let text = "GATTACAGATTACAGATTACA";
        let ids = tokenizer.encode(text).token_ids();
        assert_eq!(tokenizer.decode(&ids), text);
    }

    #[test]
    fn training_is_deterministic() {
        let first = trained(50);
        let second = trained(50);
        assert_eq!(first.vocab(), second.vocab());
    }

    #[test]
    fn tie_break_prefers_lexicographically_smaller() {
        // Every multi-symbol substring of "ABXBA" occurs exactly once; with
        // room for one beyond the singles, "AB" must win the tie.
        let corpus = Corpus::from_lines(["ABXBA"]);
        let cfg = TokenizerConfig::builder()
            .vocab_size(4)
            .show_progress(false)
            .build()
            .expect("valid config");
        let mut tokenizer = UnigramTokenizer::new(cfg);
        tokenizer.train(&corpus).expect("training succeeds");
        assert!(tokenizer.vocab().contains("AB"));
        assert!(!tokenizer.vocab().contains("BA"));
        assert_eq!(tokenizer.vocab().len(), 4);
    }

    #[test]
    fn empty_corpus_fails_fast() {
        let cfg = TokenizerConfig::builder()
            .show_progress(false)
            .build()
            .expect("valid config");
        let mut tokenizer = UnigramTokenizer::new(cfg);
        let err = tokenizer
            .train(&Corpus::from_lines(Vec::<String>::new()))
            .expect_err("empty corpus");
        assert!(matches!(err, SeqTokError::EmptyCorpus));
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempdir().expect("tempdir");
        let tokenizer = trained(60);
        tokenizer.save(dir.path()).expect("save");
        let loaded = UnigramTokenizer::load(dir.path()).expect("load");
        assert_eq!(loaded.vocab(), tokenizer.vocab());
        assert_eq!(loaded.config().vocab_size, 60);
    }
}
