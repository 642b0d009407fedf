//! Dictionary-guided classical-cipher decoder.
//!
//! This is the facade crate wiring together the lower-level components:
//! - [`word_core`] / [`word_dict`]: word identifiers and the registry
//! - [`char_trie`]: scored character prefix trees
//! - [`ngram_model`]: the backoff n-gram trees
//! - [`lexicrack_corpus`]: corpus ingestion into a [`Dictionary`]
//! - [`lexicrack_ciphers`]: the five cipher matchers
//! - [`lexicrack_search`]: the coupled DFS search, results and work queue
//!
//! A [`Task`] is one ciphertext plus a snapshot of the search options; it
//! owns the whole decoding run: result aggregation, prefix queue, worker
//! pool, and the final report.

use std::thread;
use std::time::Instant;

use anyhow::{bail, Result};

pub use lexicrack_ciphers::{Bigram, Chaotic, Matcher, Pelling, Playfair, Simple};
pub use lexicrack_corpus::{Converter, CorpusFiles, Dictionary};
pub use lexicrack_search::{PrefixQueue, ResultSet, Search, SearchConfig, WILDCARD};
pub use word_core::{Score, WORD_SCORE_UNIT};

/// The supported cipher families.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CipherKind {
    Playfair,
    Chaotic,
    Simple,
    Pelling,
    Bigram,
}

impl CipherKind {
    pub fn parse(s: &str) -> Result<CipherKind> {
        Ok(match s {
            "playfair" => CipherKind::Playfair,
            "chaotic" => CipherKind::Chaotic,
            "simple" => CipherKind::Simple,
            "pelling" => CipherKind::Pelling,
            "bigram" => CipherKind::Bigram,
            _ => bail!("unknown cipher type: {s}"),
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            CipherKind::Playfair => "playfair",
            CipherKind::Chaotic => "chaotic",
            CipherKind::Simple => "simple",
            CipherKind::Pelling => "pelling",
            CipherKind::Bigram => "bigram",
        }
    }

    /// Playfair works on the merged i/j alphabet; everything else takes
    /// input as-is.
    pub fn converter(self) -> Converter {
        match self {
            CipherKind::Playfair => Converter::FoldJi,
            _ => Converter::Plain,
        }
    }
}

/// Search options snapshotted into a task.
#[derive(Clone, Debug)]
pub struct TaskOptions {
    pub low_score_area: usize,
    pub low_score_limit: Score,
    pub high_score_limit: Score,
    pub iterations: usize,
    pub threads: usize,
    pub queue_depth: usize,
    pub matrix_creation_point: usize,
    pub pelling_period: usize,
    pub search: SearchConfig,
    pub print_solutions: usize,
    pub clear_fixed: String,
}

impl Default for TaskOptions {
    fn default() -> Self {
        TaskOptions {
            low_score_area: 16,
            low_score_limit: 0,
            high_score_limit: 0,
            iterations: 1,
            threads: 0,
            queue_depth: 2,
            matrix_creation_point: 20,
            pelling_period: 5,
            search: SearchConfig::default(),
            print_solutions: 1,
            clear_fixed: String::new(),
        }
    }
}

/// One decoding task: a ciphertext plus an option snapshot.
pub struct Task {
    options: TaskOptions,
    cipher: String,
    clear_fixed: Vec<u8>,
}

impl Task {
    pub fn new(options: TaskOptions, cipher: &str) -> Self {
        // Underscores in the fixed prefix are wildcard positions.
        let clear_fixed = options
            .clear_fixed
            .to_ascii_lowercase()
            .bytes()
            .map(|b| if b == b'_' { WILDCARD } else { b })
            .collect();
        Task {
            options,
            cipher: cipher.to_ascii_lowercase(),
            clear_fixed,
        }
    }

    #[inline]
    pub fn cipher(&self) -> &str {
        &self.cipher
    }

    /// Run the task to completion and print the final report.
    pub fn execute(&self, kind: CipherKind, dict: &Dictionary) {
        let o = &self.options;
        println!();
        if o.threads > 0 {
            println!("Threads: {}", o.threads);
        }
        println!("Ciphertext: {} ({})", self.cipher, self.cipher.len());
        if !self.clear_fixed.is_empty() {
            println!(
                "Cleartext beginning: {} ({})",
                String::from_utf8_lossy(&self.clear_fixed),
                self.clear_fixed.len()
            );
        }
        println!("Low score area: {}", o.low_score_area);
        println!("Low score limit per char: {}", o.low_score_limit);
        println!("High score limit per char: {}", o.high_score_limit);
        println!("Matrix creation point: {}", o.matrix_creation_point);
        println!("Start comma: {}", if o.search.use_comma_start { "yes" } else { "no" });
        println!("Inside comma: {}", if o.search.use_comma_inside { "yes" } else { "no" });
        println!("Odd mode: {}", if o.search.odd_mode { "yes" } else { "no" });
        println!("Print detalization: {}", o.print_solutions);
        println!();

        let result = ResultSet::new(
            dict.word_id_map(),
            o.low_score_area,
            o.low_score_limit,
            o.high_score_limit,
            o.print_solutions,
        );

        let cipher = self.cipher.as_bytes();
        match kind {
            CipherKind::Playfair => {
                self.search(Playfair::new(cipher, o.matrix_creation_point), dict, &result)
            }
            CipherKind::Chaotic => self.search(Chaotic::new(cipher), dict, &result),
            CipherKind::Simple => self.search(Simple::new(cipher), dict, &result),
            CipherKind::Pelling => self.search(Pelling::new(cipher, o.pelling_period), dict, &result),
            CipherKind::Bigram => self.search(Bigram::new(cipher), dict, &result),
        }

        result.print_final();
        println!();
        println!("Task finished");
        println!();
    }

    fn search<M: Matcher>(&self, matcher: M, dict: &Dictionary, result: &ResultSet) {
        let o = &self.options;
        for i in 0..o.iterations {
            let start = Instant::now();
            if o.threads > 0 {
                self.search_threaded(&matcher, dict, result);
            } else {
                let mut m = matcher.clone();
                let mut search = Search::new(dict, result, self.cipher.as_bytes(), o.search);
                search.run(&mut m, &self.clear_fixed);
            }
            println!("i{}: {}", i, start.elapsed().as_millis());
        }
    }

    fn search_threaded<M: Matcher>(&self, matcher: &M, dict: &Dictionary, result: &ResultSet) {
        let o = &self.options;
        let queue = PrefixQueue::new(o.queue_depth);
        thread::scope(|scope| {
            for t in 0..o.threads {
                let queue = queue.clone();
                let mut m = matcher.clone();
                let clear_fixed = &self.clear_fixed;
                let cipher = self.cipher.as_bytes();
                let search_cfg = o.search;
                scope.spawn(move || {
                    let mut search = Search::new(dict, result, cipher, search_cfg);
                    while let Some((n, prefix)) = queue.pop() {
                        result.print_state(t, &prefix, n, queue.total());
                        let mut fixed = clear_fixed.clone();
                        fixed.extend_from_slice(prefix.as_bytes());
                        search.run(&mut m, &fixed);
                    }
                });
            }
        });
    }
}
