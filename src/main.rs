//! lexicrack CLI — dictionary-guided decoder for classical ciphers.
//!
//! Thin wrapper over the `lexicrack` library crate: loads the corpora,
//! builds the dictionary once, then runs one decoding task per ciphertext.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use lexicrack::{
    CipherKind, CorpusFiles, Dictionary, SearchConfig, Task, TaskOptions, WORD_SCORE_UNIT,
};

/// lexicrack — crack classical ciphers with a weighted word n-gram model.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Cipher type: playfair, chaotic, simple, pelling or bigram.
    #[arg(long)]
    cipher: String,

    /// Frequency-statistics file (repeatable).
    #[arg(long = "stats")]
    stats: Vec<PathBuf>,

    /// Protected common-word file (repeatable).
    #[arg(long = "common-words")]
    common_words: Vec<PathBuf>,

    /// Proper-name file (repeatable).
    #[arg(long = "proper-words")]
    proper_words: Vec<PathBuf>,

    /// Numeric-word file (repeatable).
    #[arg(long = "numeric-words")]
    numeric_words: Vec<PathBuf>,

    /// Strong-start region length in characters.
    #[arg(long, default_value_t = 16)]
    low_score_area: usize,

    /// Per-character score budget inside the strong-start region.
    #[arg(long, default_value_t = 0.0)]
    low_limit: f64,

    /// Per-character score budget beyond the strong-start region.
    #[arg(long, default_value_t = 0.0)]
    high_limit: f64,

    /// Number of times to repeat each task.
    #[arg(long, default_value_t = 1)]
    iterations: usize,

    /// Worker threads (0 = run inline).
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Fixed-prefix length enumerated by the work queue.
    #[arg(long, default_value_t = 2)]
    queue_depth: usize,

    /// Vocabulary cap per word bucket.
    #[arg(long, default_value_t = 100_000)]
    max_words: usize,

    /// Committed-plaintext length at which Playfair assembles the square.
    #[arg(long, default_value_t = 20)]
    matrix_point: usize,

    /// Period of the pelling cipher.
    #[arg(long, default_value_t = 5)]
    pelling_period: usize,

    /// Fixed plaintext beginning; underscore matches any character.
    #[arg(long, default_value = "")]
    clear_prefix: String,

    /// Enable the classical Playfair x-filler pattern.
    #[arg(long)]
    filler: bool,

    /// Skip one plaintext character at the very start.
    #[arg(long)]
    odd_mode: bool,

    /// Start the word sequence with an implied sentence break.
    #[arg(long)]
    comma_start: bool,

    /// Allow sentence breaks inside the text.
    #[arg(long)]
    comma_inside: bool,

    /// Print verbosity, 0 (final report only) to 3 (improvements).
    #[arg(long, default_value_t = 1)]
    print_level: usize,

    /// Ciphertexts; each becomes one task.
    #[arg(required = true)]
    ciphertexts: Vec<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let kind = CipherKind::parse(&args.cipher)?;

    let options = TaskOptions {
        low_score_area: args.low_score_area,
        low_score_limit: (args.low_limit * f64::from(WORD_SCORE_UNIT)) as i64,
        high_score_limit: (args.high_limit * f64::from(WORD_SCORE_UNIT)) as i64,
        iterations: args.iterations,
        threads: args.threads,
        queue_depth: args.queue_depth,
        matrix_creation_point: args.matrix_point,
        pelling_period: args.pelling_period,
        search: SearchConfig {
            odd_mode: args.odd_mode,
            use_comma_start: args.comma_start,
            use_comma_inside: args.comma_inside,
            filler: args.filler,
        },
        print_solutions: args.print_level,
        clear_fixed: args.clear_prefix.clone(),
    };

    let tasks: Vec<Task> = args
        .ciphertexts
        .iter()
        .map(|c| Task::new(options.clone(), c))
        .collect();

    println!("Cipher type: {}", kind.name());
    println!("Tasks: {}", tasks.len());
    println!("Score unit: {WORD_SCORE_UNIT}");
    println!("Max word count: {}", args.max_words);

    let files = CorpusFiles {
        stats: args.stats,
        common: args.common_words,
        proper: args.proper_words,
        numeric: args.numeric_words,
    };
    let dict = Dictionary::load(kind.converter(), &files, args.max_words)?;

    for task in &tasks {
        task.execute(kind, &dict);
    }

    Ok(())
}
