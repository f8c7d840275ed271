//! Evaluation harness comparing tokenizers over a held-out test set.
//!
//! A pure read-only consumer of the `encode`/`decode` contract: nothing here
//! mutates tokenizer state.

use std::fmt;

use serde::Serialize;

use crate::tokenizer::Tokenizer;

/// Aggregate quality metrics for one tokenizer over the test set.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EvalRow {
    /// Name the tokenizer was registered under.
    pub tokenizer: String,
    /// Input symbols per emitted outcome (higher compresses better).
    pub compression_rate: f64,
    /// Fraction of emitted outcomes that matched a vocabulary token.
    pub coverage: f64,
    /// Fraction of test strings whose decode equals the original exactly.
    pub accuracy: f64,
    /// Mean outcomes emitted per test sequence, exact (unrounded).
    pub avg_tokens_per_seq: f64,
}

/// Evaluation results for every registered tokenizer, in registration order.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct EvalReport {
    /// One row per tokenizer.
    pub rows: Vec<EvalRow>,
}

impl fmt::Display for EvalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<12} {:>15} {:>9} {:>9} {:>15}",
            "Tokenizer", "CompressionRate", "Coverage", "Accuracy", "AvgTokenPerSeq"
        )?;
        for row in &self.rows {
            writeln!(
                f,
                "{:<12} {:>15.3} {:>9.3} {:>9.3} {:>15.2}",
                row.tokenizer,
                row.compression_rate,
                row.coverage,
                row.accuracy,
                row.avg_tokens_per_seq
            )?;
        }
        Ok(())
    }
}

/// Runs a fixed test set through a collection of named tokenizers.
#[derive(Default)]
pub struct TokenizerEvaluator<'a> {
    entries: Vec<(String, &'a dyn Tokenizer)>,
}

impl<'a> TokenizerEvaluator<'a> {
    /// Creates an evaluator with no registered tokenizers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tokenizer under a display name. Rows are reported in
    /// registration order.
    pub fn register(&mut self, name: impl Into<String>, tokenizer: &'a dyn Tokenizer) {
        self.entries.push((name.into(), tokenizer));
    }

    /// Evaluates every registered tokenizer over the test set.
    #[must_use]
    pub fn evaluate(&self, test_set: &[String]) -> EvalReport {
        let mut rows = Vec::with_capacity(self.entries.len());
        for (name, tokenizer) in &self.entries {
            let mut total_symbols = 0usize;
            let mut total_outcomes = 0usize;
            let mut matched_outcomes = 0usize;
            let mut exact_decodes = 0usize;
            for text in test_set {
                let encoding = tokenizer.encode(text);
                let decoded = tokenizer.decode(&encoding.token_ids());

                total_symbols += text.chars().count();
                total_outcomes += encoding.len();
                matched_outcomes += encoding.matched_count();
                if decoded == *text {
                    exact_decodes += 1;
                }
            }

            let ratio = |numerator: usize, denominator: usize| {
                if denominator == 0 {
                    0.0
                } else {
                    numerator as f64 / denominator as f64
                }
            };
            rows.push(EvalRow {
                tokenizer: name.clone(),
                compression_rate: ratio(total_symbols, total_outcomes),
                coverage: ratio(matched_outcomes, total_outcomes),
                accuracy: ratio(exact_decodes, test_set.len()),
                avg_tokens_per_seq: ratio(total_outcomes, test_set.len()),
            });
        }
        EvalReport { rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bpe::BpeTokenizer;
    use crate::byte_level::ByteTokenizer;
    use crate::config::TokenizerConfig;
    use crate::corpus::Corpus;

    fn test_set() -> Vec<String> {
        ["ACGTACGTGATTACAGGCT", "TATAAGCTAGACGT", "GATTACAGATTACAGATTACA"]
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    fn trained_bpe() -> BpeTokenizer {
        let cfg = TokenizerConfig::builder()
            .vocab_size(100)
            .show_progress(false)
            .build()
            .expect("valid config");
        let mut tokenizer = BpeTokenizer::new(cfg);
        tokenizer
            .train(&Corpus::from_lines(test_set()))
            .expect("training succeeds");
        tokenizer
    }

    #[test]
    fn byte_codec_baseline_is_exact() {
        let codec = ByteTokenizer::new();
        let mut evaluator = TokenizerEvaluator::new();
        evaluator.register("Byte", &codec);
        let report = evaluator.evaluate(&test_set());

        let row = &report.rows[0];
        assert_eq!(row.coverage, 1.0);
        assert_eq!(row.accuracy, 1.0);
        // ASCII input: one outcome per symbol, so no compression.
        assert_eq!(row.compression_rate, 1.0);
    }

    #[test]
    fn avg_tokens_per_seq_is_exact() {
        let tokenizer = trained_bpe();
        let set = test_set();
        let expected: usize = set.iter().map(|text| tokenizer.encode(text).len()).sum();

        let mut evaluator = TokenizerEvaluator::new();
        evaluator.register("BPE", &tokenizer);
        let report = evaluator.evaluate(&set);
        assert_eq!(
            report.rows[0].avg_tokens_per_seq,
            expected as f64 / set.len() as f64
        );
    }

    #[test]
    fn unmatched_outcomes_lower_coverage_and_accuracy() {
        let tokenizer = trained_bpe();
        let set = vec!["GATTACAZZZ".to_string()];
        let mut evaluator = TokenizerEvaluator::new();
        evaluator.register("BPE", &tokenizer);
        let report = evaluator.evaluate(&set);

        let row = &report.rows[0];
        assert!(row.coverage < 1.0);
        assert_eq!(row.accuracy, 0.0);
    }

    #[test]
    fn rows_follow_registration_order_and_render() {
        let codec = ByteTokenizer::new();
        let tokenizer = trained_bpe();
        let mut evaluator = TokenizerEvaluator::new();
        evaluator.register("BPE", &tokenizer);
        evaluator.register("Byte", &codec);
        let report = evaluator.evaluate(&test_set());

        assert_eq!(report.rows[0].tokenizer, "BPE");
        assert_eq!(report.rows[1].tokenizer, "Byte");
        let rendered = format!("{report}");
        assert!(rendered.contains("CompressionRate"));
        assert!(rendered.contains("Byte"));
    }

    #[test]
    fn empty_test_set_reports_zeroes() {
        let codec = ByteTokenizer::new();
        let mut evaluator = TokenizerEvaluator::new();
        evaluator.register("Byte", &codec);
        let report = evaluator.evaluate(&[]);
        let row = &report.rows[0];
        assert_eq!(row.accuracy, 0.0);
        assert_eq!(row.avg_tokens_per_seq, 0.0);
    }
}
