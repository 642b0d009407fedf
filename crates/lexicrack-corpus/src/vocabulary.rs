//! First ingestion pass: decide which words are common and which proper.
//!
//! Only 1- and 2-grams vote. A word observed in lowercase, or following an
//! article in a 2-gram, counts toward common; a titlecase observation counts
//! toward proper. Single letters other than "a" and "i" are always proper.
//! Words seen both ways are merged into whichever side dominates (common
//! wins at more than a quarter of the titlecase mass). Protected words are
//! forced common. Both buckets are then truncated to the most frequent
//! `limit` entries.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use anyhow::Result;
use word_core::{is_plain_word, Hits, WordId, NONE};

use crate::{read_stat_file, Converter};

/// Marker id tagging an article token during the vocabulary pass.
const ARTICLE: WordId = WordId(1);

/// The two stats-derived vocabulary sets.
#[derive(Debug, Default)]
pub struct Vocabulary {
    pub common: HashSet<String>,
    pub proper: HashSet<String>,
}

/// Scan the statistics files and partition the vocabulary.
pub fn build_vocabulary(
    stat_files: &[PathBuf],
    limit: usize,
    conv: Converter,
    protected_common: &HashSet<String>,
    numeric: &HashSet<String>,
) -> Result<Vocabulary> {
    let mut common: HashMap<String, Hits> = HashMap::new();
    let mut proper: HashMap<String, Hits> = HashMap::new();

    for path in stat_files {
        eprintln!("Loading vocabulary from stat file {}...", path.display());
        read_stat_file(
            path,
            |s| {
                // Case is preserved here; the marker flags articles.
                let w = conv.apply(s);
                let lw = w.to_ascii_lowercase();
                let tag = if lw == "the" || lw == "a" || lw == "an" {
                    ARTICLE
                } else {
                    NONE
                };
                (w, tag)
            },
            |words, cnt| {
                if words.is_empty() || words.len() > 2 {
                    return;
                }
                let s = &words[words.len() - 1].0;
                let ls = s.to_ascii_lowercase();
                if !is_plain_word(&ls) || numeric.contains(&ls) {
                    return;
                }
                // Single letters other than "a" and "i" are proper names.
                if ls.len() == 1 && ls != "a" && ls != "i" {
                    *proper.entry(ls).or_default() += cnt;
                    return;
                }
                let after_article = words.len() == 2 && words[0].1 == ARTICLE;
                if *s == ls || after_article {
                    *common.entry(ls).or_default() += cnt;
                } else {
                    *proper.entry(ls).or_default() += cnt;
                }
            },
        )?;
    }

    // Reconcile words seen on both sides.
    let proper_words: Vec<String> = proper.keys().cloned().collect();
    for w in proper_words {
        let Some(&pc) = proper.get(&w) else { continue };
        if protected_common.contains(&w) {
            *common.entry(w.clone()).or_default() += pc;
            proper.remove(&w);
        } else if let Some(&nc) = common.get(&w) {
            // More than a quarter in lowercase means common.
            if nc * 4 > pc {
                *common.entry(w.clone()).or_default() += pc;
                proper.remove(&w);
            } else {
                *proper.entry(w.clone()).or_default() += nc;
                common.remove(&w);
            }
        }
    }

    Ok(Vocabulary {
        common: top_words(common, limit),
        proper: top_words(proper, limit),
    })
}

/// Keep the `limit` most frequent words. Ties break alphabetically so the
/// cut is deterministic.
fn top_words(freq: HashMap<String, Hits>, limit: usize) -> HashSet<String> {
    let mut list: Vec<(String, Hits)> = freq.into_iter().collect();
    list.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    list.truncate(limit);
    list.into_iter().map(|(w, _)| w).collect()
}
