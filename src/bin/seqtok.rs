use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

use seqtok::{
    BpeTokenizer, ByteTokenizer, Corpus, HybridTokenizer, TokenId, Tokenizer, TokenizerConfig,
    TokenizerEvaluator, UnigramTokenizer,
};

const DEFAULT_OUTPUT: &str = "tokenizer";

#[derive(Parser, Debug)]
#[command(author, version, about = "Subword tokenizer toolkit", long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (-q, -qq)
    #[arg(short = 'q', long, global = true, action = ArgAction::Count)]
    quiet: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Train a tokenizer from a line-oriented corpus
    Train(TrainArgs),
    /// Encode text with a trained tokenizer
    Encode(EncodeArgs),
    /// Decode token ids back into text
    Decode(DecodeArgs),
    /// Compare trained tokenizers over a held-out test set
    Eval(EvalArgs),
    /// Inspect tokenizer metadata
    Info(InfoArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Variant {
    /// Fixed 256-entry byte-level codec
    Byte,
    /// Top-frequency substring vocabulary
    Unigram,
    /// Merge-based (BPE) vocabulary
    Bpe,
    /// Long-token list layered over merges
    Hybrid,
}

#[derive(Args, Debug)]
struct TrainArgs {
    /// Tokenizer variant to train
    variant: Variant,

    /// Corpus file, one sequence per line
    corpus: PathBuf,

    /// Output directory for the tokenizer artifact
    #[arg(short, long, value_name = "DIR", default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Target vocabulary size
    #[arg(long, value_name = "SIZE")]
    vocab_size: Option<usize>,

    /// Longest matched span in symbols
    #[arg(long, value_name = "LEN")]
    max_token_len: Option<usize>,

    /// Maximum merge iterations
    #[arg(long, value_name = "COUNT")]
    max_merge_iterations: Option<usize>,

    /// Long token honored as a single unit (repeat flag; hybrid only)
    #[arg(long = "long-token", value_name = "TOKEN")]
    long_tokens: Vec<String>,

    /// Disable per-iteration logging
    #[arg(long)]
    no_progress: bool,
}

#[derive(Args, Debug)]
struct EncodeArgs {
    /// Tokenizer variant to load
    variant: Variant,

    /// Directory holding the tokenizer artifact
    #[arg(short = 'm', long, value_name = "DIR")]
    model: PathBuf,

    /// Text to encode; omit to encode --file instead
    text: Option<String>,

    /// Encode each line of this file
    #[arg(long, value_name = "PATH", conflicts_with = "text")]
    file: Option<PathBuf>,

    /// Emit JSON instead of space-separated ids
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// Tokenizer variant to load
    variant: Variant,

    /// Directory holding the tokenizer artifact
    #[arg(short = 'm', long, value_name = "DIR")]
    model: PathBuf,

    /// Token ids to decode
    #[arg(required = true)]
    ids: Vec<TokenId>,
}

#[derive(Args, Debug)]
struct EvalArgs {
    /// Held-out test set, one sequence per line
    #[arg(long, value_name = "PATH")]
    test_file: PathBuf,

    /// Byte codec artifact directory
    #[arg(long, value_name = "DIR")]
    byte: Option<PathBuf>,

    /// Unigram tokenizer artifact directory
    #[arg(long, value_name = "DIR")]
    unigram: Option<PathBuf>,

    /// BPE tokenizer artifact directory
    #[arg(long, value_name = "DIR")]
    bpe: Option<PathBuf>,

    /// Hybrid tokenizer artifact directory
    #[arg(long, value_name = "DIR")]
    hybrid: Option<PathBuf>,

    /// Emit the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct InfoArgs {
    /// Tokenizer variant to load
    variant: Variant,

    /// Directory holding the tokenizer artifact
    #[arg(short = 'm', long, value_name = "DIR")]
    model: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    match cli.command {
        Commands::Train(args) => run_train(&args),
        Commands::Encode(args) => run_encode(&args),
        Commands::Decode(args) => run_decode(&args),
        Commands::Eval(args) => run_eval(&args),
        Commands::Info(args) => run_info(&args),
    }
}

fn init_logging(verbose: u8, quiet: u8) {
    let level = match i16::from(verbose) - i16::from(quiet) {
        i16::MIN..=-2 => "off",
        -1 => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();
}

fn build_config(args: &TrainArgs) -> Result<TokenizerConfig> {
    let mut builder = TokenizerConfig::builder().show_progress(!args.no_progress);
    if let Some(vocab_size) = args.vocab_size {
        builder = builder.vocab_size(vocab_size);
    }
    if let Some(max_token_len) = args.max_token_len {
        builder = builder.max_token_len(max_token_len);
    }
    if let Some(cap) = args.max_merge_iterations {
        builder = builder.max_merge_iterations(Some(cap));
    }
    Ok(builder.build()?)
}

fn run_train(args: &TrainArgs) -> Result<()> {
    if args.variant != Variant::Hybrid && !args.long_tokens.is_empty() {
        bail!("--long-token is only meaningful for the hybrid variant");
    }
    let corpus = Corpus::from_path(&args.corpus)
        .with_context(|| format!("failed to load corpus from {:?}", args.corpus))?;
    let cfg = build_config(args)?;

    let mut tokenizer: Box<dyn Tokenizer> = match args.variant {
        Variant::Byte => Box::new(ByteTokenizer::new()),
        Variant::Unigram => Box::new(UnigramTokenizer::new(cfg)),
        Variant::Bpe => Box::new(BpeTokenizer::new(cfg)),
        Variant::Hybrid => Box::new(HybridTokenizer::new(args.long_tokens.clone(), cfg)?),
    };
    let metrics = tokenizer.train(&corpus)?;
    tokenizer.save(&args.output)?;

    println!(
        "trained {:?} tokenizer in {:.2?}; vocab size {}; artifact in {:?}",
        args.variant,
        metrics.total_duration,
        tokenizer.vocab().len(),
        args.output
    );
    if !metrics.iterations.is_empty() {
        println!(
            "merge iterations: {} (stop reason {:?})",
            metrics.iterations.len(),
            metrics.stop_reason
        );
    }
    Ok(())
}

fn load_tokenizer(variant: Variant, dir: &Path) -> Result<Box<dyn Tokenizer>> {
    let tokenizer: Box<dyn Tokenizer> = match variant {
        Variant::Byte => Box::new(ByteTokenizer::load(dir)?),
        Variant::Unigram => Box::new(UnigramTokenizer::load(dir)?),
        Variant::Bpe => Box::new(BpeTokenizer::load(dir)?),
        Variant::Hybrid => Box::new(HybridTokenizer::load(dir)?),
    };
    Ok(tokenizer)
}

fn print_encoding(tokenizer: &dyn Tokenizer, text: &str, as_json: bool) -> Result<()> {
    let encoding = tokenizer.encode(text);
    if as_json {
        let payload = json!({
            "text": text,
            "tokens": encoding.token_ids(),
            "emitted": encoding.len(),
            "unmatched": encoding.len() - encoding.matched_count(),
        });
        println!("{}", serde_json::to_string(&payload)?);
    } else {
        let ids: Vec<String> = encoding
            .token_ids()
            .iter()
            .map(ToString::to_string)
            .collect();
        println!("{}", ids.join(" "));
    }
    Ok(())
}

fn run_encode(args: &EncodeArgs) -> Result<()> {
    let tokenizer = load_tokenizer(args.variant, &args.model)?;
    match (&args.text, &args.file) {
        (Some(text), None) => print_encoding(tokenizer.as_ref(), text, args.json),
        (None, Some(file)) => {
            let corpus = Corpus::from_path(file)
                .with_context(|| format!("failed to load input from {file:?}"))?;
            let bar = ProgressBar::new(corpus.len() as u64).with_style(
                ProgressStyle::with_template("{bar:30} {pos}/{len} sequences")
                    .expect("static template is valid"),
            );
            for line in corpus.iter() {
                print_encoding(tokenizer.as_ref(), line, args.json)?;
                bar.inc(1);
            }
            bar.finish_and_clear();
            Ok(())
        }
        (None, None) => bail!("provide TEXT or --file"),
        (Some(_), Some(_)) => unreachable!("clap rejects text together with --file"),
    }
}

fn run_decode(args: &DecodeArgs) -> Result<()> {
    let tokenizer = load_tokenizer(args.variant, &args.model)?;
    println!("{}", tokenizer.decode(&args.ids));
    Ok(())
}

fn run_eval(args: &EvalArgs) -> Result<()> {
    let test_corpus = Corpus::from_path(&args.test_file)
        .with_context(|| format!("failed to load test set from {:?}", args.test_file))?;
    let test_set: Vec<String> = test_corpus.iter().map(str::to_string).collect();

    let mut loaded: Vec<(&str, Box<dyn Tokenizer>)> = Vec::new();
    if let Some(dir) = &args.byte {
        loaded.push(("Byte", load_tokenizer(Variant::Byte, dir)?));
    }
    if let Some(dir) = &args.unigram {
        loaded.push(("Unigram", load_tokenizer(Variant::Unigram, dir)?));
    }
    if let Some(dir) = &args.bpe {
        loaded.push(("BPE", load_tokenizer(Variant::Bpe, dir)?));
    }
    if let Some(dir) = &args.hybrid {
        loaded.push(("Hybrid", load_tokenizer(Variant::Hybrid, dir)?));
    }
    if loaded.is_empty() {
        bail!("provide at least one tokenizer artifact directory");
    }

    let mut evaluator = TokenizerEvaluator::new();
    for (name, tokenizer) in &loaded {
        evaluator.register(*name, tokenizer.as_ref());
    }
    let report = evaluator.evaluate(&test_set);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{report}");
    }
    Ok(())
}

fn run_info(args: &InfoArgs) -> Result<()> {
    let tokenizer = load_tokenizer(args.variant, &args.model)?;
    println!("Variant: {:?}", args.variant);
    println!("Vocab size: {}", tokenizer.vocab().len());
    let longest = tokenizer
        .vocab()
        .iter()
        .max_by_key(|token| token.chars().count())
        .unwrap_or_default();
    println!("Longest token: {longest:?}");
    Ok(())
}
