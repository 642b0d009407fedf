//! Corpus ingestion: builds the dictionary (word registry + the three
//! n-gram trees) from frequency-statistics files and word lists.
//!
//! Ingestion is a one-shot pipeline:
//!
//! 1. Load protected common-word, proper-name and numeric word lists.
//! 2. First pass over the statistics files decides the vocabulary: which
//!    words are common, which proper ([`build_vocabulary`]).
//! 3. Second pass populates the common, proper and numeric n-gram trees.
//! 4. Words from the proper-name files join the proper tree as unigrams.
//! 5. All trees are scored; the dictionary is immutable afterwards.
//!
//! Statistics files use a running-tail protocol, one token per line:
//! `+word count` pushes the word onto the tail and records the tail as an
//! n-gram, `=word count` does the same then pops, `-` just pops. The tail
//! must be empty at end of file.

mod stat_file;
mod vocabulary;

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use ngram_model::NgramTree;
use word_core::{is_plain_word, COMMA, NUMERIC, PROPER};
use word_dict::WordIdMap;

pub use stat_file::read_stat_file;
pub use vocabulary::build_vocabulary;

/// Input-normalisation applied to every corpus word and ciphertext.
///
/// Playfair merges i and j before anything else sees the text; the other
/// ciphers leave words untouched.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Converter {
    Plain,
    /// Fold `j` to `i` (Playfair's 25-letter alphabet).
    FoldJi,
}

impl Converter {
    pub fn apply(self, s: &str) -> String {
        match self {
            Converter::Plain => s.to_owned(),
            Converter::FoldJi => s.replace('j', "i").replace('J', "I"),
        }
    }
}

/// The corpus file sets fed to [`Dictionary::load`].
#[derive(Clone, Debug, Default)]
pub struct CorpusFiles {
    /// Frequency-statistics files (running-tail format).
    pub stats: Vec<PathBuf>,
    /// Protected common-word lists (one word per line).
    pub common: Vec<PathBuf>,
    /// Proper-name lists (tab-separated, `N` in the second field accepts).
    pub proper: Vec<PathBuf>,
    /// Numeric-word lists (one word per line).
    pub numeric: Vec<PathBuf>,
}

/// The immutable language model shared by all searches.
#[derive(Debug)]
pub struct Dictionary {
    word_id_map: WordIdMap,
    word_tree: NgramTree,
    proper_tree: NgramTree,
    numeric_tree: NgramTree,
}

impl Dictionary {
    /// Run the full ingestion pipeline.
    pub fn load(conv: Converter, files: &CorpusFiles, max_word_count: usize) -> Result<Dictionary> {
        let mut protected = HashSet::new();
        for path in &files.common {
            eprintln!("Loading protected common-word file {}...", path.display());
            load_word_list(path, conv, &mut protected)?;
        }

        let mut proper_names = HashSet::new();
        for path in &files.proper {
            eprintln!("Loading proper-name file {}...", path.display());
            load_proper_list(path, conv, &mut proper_names)?;
        }

        let mut numeric = HashSet::new();
        for path in &files.numeric {
            eprintln!("Loading numeric-word file {}...", path.display());
            load_word_list(path, conv, &mut numeric)?;
        }

        let mut word_id_map = WordIdMap::new();
        let vocab = build_vocabulary(&files.stats, max_word_count, conv, &protected, &numeric)?;
        word_id_map.set_vocabularies(vocab.common, vocab.proper, numeric);

        let mut word_tree = NgramTree::default();
        let mut proper_tree = NgramTree::default();
        let mut numeric_tree = NgramTree::default();

        for path in &files.stats {
            eprintln!("Loading stat file {}...", path.display());
            read_stat_file(
                path,
                |s| {
                    let w = conv.apply(&s.to_ascii_lowercase());
                    let id = word_id_map.add(&w);
                    (w, id)
                },
                |words, cnt| {
                    word_tree.add(words, cnt, false);
                    let tail = words[words.len() - 1].1;
                    if words.len() <= 2 && tail.category() == PROPER {
                        proper_tree.add(words, cnt, true);
                    }
                    if words.len() <= 2 && tail.category() == NUMERIC && tail != NUMERIC {
                        numeric_tree.add(words, cnt, true);
                    }
                },
            )?;
        }

        // Proper-name file words join the proper tree after stat ingestion,
        // so stats-derived ids are already settled.
        for w in &proper_names {
            let id = word_id_map.add_proper(w);
            proper_tree.add(&[(w.clone(), id)], 1, true);
        }

        word_tree.calc_scores(false);
        proper_tree.calc_scores(false);
        numeric_tree.calc_scores(false);

        Ok(Dictionary {
            word_id_map,
            word_tree,
            proper_tree,
            numeric_tree,
        })
    }

    /// The common-word n-gram tree (5-level backoff during search).
    #[inline]
    pub fn word_tree(&self) -> &NgramTree {
        &self.word_tree
    }

    /// Proper-noun continuations (1-level backoff).
    #[inline]
    pub fn proper_tree(&self) -> &NgramTree {
        &self.proper_tree
    }

    /// Numeric-word continuations (1-level backoff).
    #[inline]
    pub fn numeric_tree(&self) -> &NgramTree {
        &self.numeric_tree
    }

    #[inline]
    pub fn word_id_map(&self) -> &WordIdMap {
        &self.word_id_map
    }

    /// The sentence-initial context (words following a break).
    pub fn sentence_start_tree(&self) -> Option<&NgramTree> {
        self.word_tree.find(COMMA)
    }
}

/// Load a plain word list: one word per line, ASCII letters only,
/// lower-cased and converted before insertion.
pub fn load_word_list(path: &Path, conv: Converter, words: &mut HashSet<String>) -> Result<()> {
    let file = File::open(path).with_context(|| format!("opening word list {}", path.display()))?;
    for line in BufReader::new(file).lines() {
        let line = line.with_context(|| format!("reading {}", path.display()))?;
        if is_plain_word(&line) {
            words.insert(conv.apply(&line.to_ascii_lowercase()));
        }
    }
    Ok(())
}

/// Load a proper-name list: `word\tfields...`, accepted when the field
/// after the tab starts with `N`, then cleaned to a name-shaped word.
pub fn load_proper_list(path: &Path, conv: Converter, words: &mut HashSet<String>) -> Result<()> {
    let file = File::open(path).with_context(|| format!("opening proper list {}", path.display()))?;
    for line in BufReader::new(file).lines() {
        let line = line.with_context(|| format!("reading {}", path.display()))?;
        let Some(tab) = line.find('\t') else {
            bail!("malformed proper-name line (no tab) in {}", path.display());
        };
        if tab == 0 {
            bail!("malformed proper-name line (empty word) in {}", path.display());
        }
        if line.as_bytes().get(tab + 1) != Some(&b'N') {
            continue;
        }
        let mut s = line[..tab].to_owned();
        if let Some(space) = s.find(' ') {
            s.truncate(space);
        }
        if s.len() < 4 {
            continue;
        }

        // Fold camel-case interior capitals following a letter, hyphen or
        // apostrophe, then strip the separators.
        let mut bytes = s.into_bytes();
        for i in 1..bytes.len() {
            let prev = bytes[i - 1];
            if bytes[i].is_ascii_uppercase()
                && (prev == b'-' || prev == b'\'' || prev.is_ascii_lowercase())
            {
                bytes[i] = bytes[i].to_ascii_lowercase();
            }
        }
        bytes.retain(|&b| b != b'-' && b != b'\'');

        let good = bytes.first().is_some_and(u8::is_ascii_uppercase)
            && bytes[1..].iter().all(u8::is_ascii_lowercase);
        if !good {
            continue;
        }
        let w = String::from_utf8_lossy(&bytes).into_owned();
        if is_plain_word(&w) {
            words.insert(conv.apply(&w.to_ascii_lowercase()));
        }
    }
    Ok(())
}
