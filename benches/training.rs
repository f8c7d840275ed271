use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, SamplingMode, Throughput};
use seqtok::{BpeTokenizer, Corpus, Tokenizer, TokenizerConfig, UnigramTokenizer};

fn build_corpus() -> Corpus {
    // Deterministic synthetic DNA lines with repeated motifs so merges and
    // substring ranking both have real structure to find.
    let motifs = ["GATTACA", "ACGTACGT", "TATA", "GGCT", "AGCTAG"];
    let mut lines = Vec::with_capacity(512);
    for index in 0..512usize {
        let mut line = String::with_capacity(64);
        for offset in 0..8 {
            line.push_str(motifs[(index + offset) % motifs.len()]);
        }
        lines.push(line);
    }
    Corpus::from_lines(lines)
}

fn corpus_bytes(corpus: &Corpus) -> usize {
    corpus.iter().map(str::len).sum()
}

fn bench_training(c: &mut Criterion) {
    let corpus = build_corpus();
    let cfg = TokenizerConfig::builder()
        .vocab_size(256)
        .show_progress(false)
        .build()
        .expect("configuration");

    let mut group = c.benchmark_group("train_dna_corpus");
    group.throughput(Throughput::Bytes(corpus_bytes(&corpus) as u64));
    group.sampling_mode(SamplingMode::Flat);
    group.bench_function(BenchmarkId::from_parameter("bpe_256"), |b| {
        b.iter(|| {
            let mut tokenizer = BpeTokenizer::new(cfg.clone());
            let metrics = tokenizer.train(&corpus).expect("training");
            let _ = black_box(metrics);
        });
    });
    group.bench_function(BenchmarkId::from_parameter("unigram_256"), |b| {
        b.iter(|| {
            let mut tokenizer = UnigramTokenizer::new(cfg.clone());
            let metrics = tokenizer.train(&corpus).expect("training");
            let _ = black_box(metrics);
        });
    });
    group.finish();
}

criterion_group!(benches, bench_training);
criterion_main!(benches);
