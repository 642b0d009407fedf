//! Backoff n-gram tree over word contexts.
//!
//! Each node represents one context (a suffix of previously seen words,
//! keyed by word *category* so all proper nouns share a context, as do all
//! numeric tokens and sentence breaks). A node holds:
//!
//! - a [`PrefixTree`] of the common-word continuations observed in this
//!   context,
//! - raw hit counters for the three pseudo-words (PROPER, NUMERIC, COMMA),
//! - derived scores for those counters plus `other`, the penalty paid by a
//!   word unseen in this context,
//! - lazily allocated child contexts keyed by word id.
//!
//! Context keys run newest-first: `find(category_of_previous_word)` narrows
//! the context by one word. N-grams containing the unknown-word sentinel are
//! skipped entirely.

use std::collections::HashMap;

use char_trie::PrefixTree;
use word_core::{calc_score, Hits, Score, SmallScore, WordId, COMMA, NONE, NUMERIC, PROPER};

/// One (surface, id) token of an n-gram, oldest first in slices.
pub type WordToken = (String, WordId);

/// A node of the backoff n-gram tree.
#[derive(Debug, Default)]
pub struct NgramTree {
    next: Option<Box<HashMap<WordId, NgramTree>>>,
    tree: PrefixTree,
    total: usize,
    proper_hits: Hits,
    numeric_hits: Hits,
    comma_hits: Hits,
    proper_score: SmallScore,
    numeric_score: SmallScore,
    comma_score: SmallScore,
    other: SmallScore,
}

impl NgramTree {
    /// Record an n-gram with `h` observations. `words` runs oldest first,
    /// newest last; the newest word is the continuation being counted, the
    /// rest select the context.
    ///
    /// With `tail_original` the newest word keeps its own id (used by the
    /// proper and numeric trees, which store actual surface forms); without
    /// it the id collapses to its category sentinel.
    pub fn add(&mut self, words: &[WordToken], h: Hits, tail_original: bool) {
        if words.is_empty() {
            return;
        }
        self.add_at(words, words.len() - 1, h, tail_original);
    }

    fn add_at(&mut self, words: &[WordToken], n: usize, h: Hits, tail_original: bool) {
        if n > 0 {
            let ctx = words[n - 1].1;
            if ctx != NONE {
                let key = ctx.category();
                self.next
                    .get_or_insert_with(Default::default)
                    .entry(key)
                    .or_default()
                    .add_at(words, n - 1, h, tail_original);
            }
        } else {
            let Some(&(ref surface, tail)) = words.last() else {
                return;
            };
            if tail == NONE {
                return;
            }
            self.total += h as usize;
            let id = if tail_original { tail } else { tail.category() };
            if id == PROPER {
                self.proper_hits += h;
            } else if id == NUMERIC {
                self.numeric_hits += h;
            } else if id == COMMA {
                self.comma_hits += h;
            } else {
                self.tree.add_hits(surface.as_bytes(), id, h);
            }
        }
    }

    /// Narrow the context by one word (newest first).
    pub fn find(&self, id: WordId) -> Option<&NgramTree> {
        self.next.as_ref()?.get(&id)
    }

    /// Resolve a chain of context keys, newest first.
    pub fn find_path(&self, ids: &[WordId]) -> Option<&NgramTree> {
        ids.iter().try_fold(self, |node, &id| node.find(id))
    }

    /// Score this context and every child context.
    ///
    /// The reference mass is the larger of the continuation mass (subtree
    /// max or total, per `use_max`) and the three pseudo-word counters.
    /// Returns the `(hits*score, hits*length)` calibration sums.
    pub fn calc_scores(&mut self, use_max: bool) -> (Score, usize) {
        let mut mh = if self.tree.is_empty() {
            0
        } else if use_max {
            self.tree.max_hits() as usize
        } else {
            self.total
        };
        mh = mh.max(self.proper_hits as usize);
        mh = mh.max(self.numeric_hits as usize);
        mh = mh.max(self.comma_hits as usize);

        self.other = calc_score(0, mh);
        self.proper_score = calc_score(self.proper_hits, mh);
        self.numeric_score = calc_score(self.numeric_hits, mh);
        self.comma_score = calc_score(self.comma_hits, mh);

        let mut result = self.tree.score_with(mh);
        if let Some(next) = &mut self.next {
            for t in next.values_mut() {
                let q = t.calc_scores(use_max);
                result.0 += q.0;
                result.1 += q.1;
            }
        }
        result
    }

    #[inline]
    pub fn tree(&self) -> &PrefixTree {
        &self.tree
    }

    #[inline]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Penalty for a word unseen in this context.
    #[inline]
    pub fn other(&self) -> SmallScore {
        self.other
    }

    #[inline]
    pub fn proper_hits(&self) -> Hits {
        self.proper_hits
    }

    #[inline]
    pub fn numeric_hits(&self) -> Hits {
        self.numeric_hits
    }

    #[inline]
    pub fn comma_hits(&self) -> Hits {
        self.comma_hits
    }

    #[inline]
    pub fn proper_score(&self) -> SmallScore {
        self.proper_score
    }

    #[inline]
    pub fn numeric_score(&self) -> SmallScore {
        self.numeric_score
    }

    #[inline]
    pub fn comma_score(&self) -> SmallScore {
        self.comma_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use word_dict::WordIdMap;

    fn test_map() -> WordIdMap {
        let mut map = WordIdMap::new();
        let common = ["the", "cat", "sat", "hello", "world"]
            .iter()
            .map(|w| w.to_string())
            .collect::<HashSet<_>>();
        let proper = ["london"].iter().map(|w| w.to_string()).collect();
        map.set_vocabularies(common, proper, HashSet::new());
        map
    }

    fn tok(map: &mut WordIdMap, w: &str) -> WordToken {
        let id = map.add(w);
        (w.to_string(), id)
    }

    #[test]
    fn unigram_populates_root_tree() {
        let mut map = test_map();
        let mut tree = NgramTree::default();
        let words = vec![tok(&mut map, "cat")];
        tree.add(&words, 5, false);
        assert_eq!(tree.total(), 5);
        let node = tree.tree().find(b"cat").unwrap();
        assert_eq!(node.hits(), 5);
    }

    #[test]
    fn bigram_keys_on_previous_word() {
        let mut map = test_map();
        let mut tree = NgramTree::default();
        let words = vec![tok(&mut map, "the"), tok(&mut map, "cat")];
        tree.add(&words, 3, false);

        let the_id = map.id_by_word("the").unwrap();
        let ctx = tree.find(the_id).unwrap();
        assert_eq!(ctx.tree().find(b"cat").unwrap().hits(), 3);
        // Root saw nothing (only the innermost context counts the tail).
        assert_eq!(tree.total(), 0);
    }

    #[test]
    fn trigram_contexts_run_newest_first() {
        let mut map = test_map();
        let mut tree = NgramTree::default();
        let words = vec![tok(&mut map, "the"), tok(&mut map, "cat"), tok(&mut map, "sat")];
        tree.add(&words, 1, false);

        let the_id = map.id_by_word("the").unwrap();
        let cat_id = map.id_by_word("cat").unwrap();
        // Outermost key is the most recent context word ("cat").
        let ctx = tree.find_path(&[cat_id, the_id]).unwrap();
        assert!(ctx.tree().find(b"sat").unwrap().is_word());
        assert!(tree.find(the_id).is_none());
    }

    #[test]
    fn ngram_with_unknown_word_is_skipped() {
        let mut map = test_map();
        let mut tree = NgramTree::default();
        let words = vec![tok(&mut map, "xyzzy"), tok(&mut map, "cat")];
        tree.add(&words, 1, false);
        assert!(tree.next.is_none());
        assert_eq!(tree.total(), 0);
    }

    #[test]
    fn proper_tail_counts_category() {
        let mut map = test_map();
        let mut tree = NgramTree::default();
        let words = vec![tok(&mut map, "london")];
        tree.add(&words, 4, false);
        assert_eq!(tree.proper_hits(), 4);
        assert!(tree.tree().is_empty());
    }

    #[test]
    fn proper_tail_original_keeps_surface() {
        let mut map = test_map();
        let mut tree = NgramTree::default();
        let words = vec![tok(&mut map, "london")];
        tree.add(&words, 4, true);
        assert_eq!(tree.proper_hits(), 0);
        assert!(tree.tree().find(b"london").unwrap().is_word());
    }

    #[test]
    fn comma_tail_counts_comma() {
        let mut map = test_map();
        let mut tree = NgramTree::default();
        let words = vec![tok(&mut map, "$")];
        tree.add(&words, 7, false);
        assert_eq!(tree.comma_hits(), 7);
    }

    #[test]
    fn scoring_uses_total_mass() {
        let mut map = test_map();
        let mut tree = NgramTree::default();
        tree.add(&[tok(&mut map, "cat")], 6, false);
        tree.add(&[tok(&mut map, "sat")], 2, false);
        tree.calc_scores(false);
        // total = 8; cat: -log2(6/8)*100 = 41 (truncated).
        assert_eq!(tree.tree().find(b"cat").unwrap().score(), 41);
        assert!(tree.other() > 0);
    }

    #[test]
    fn pseudo_word_counters_enter_reference_mass() {
        let mut map = test_map();
        let mut tree = NgramTree::default();
        tree.add(&[tok(&mut map, "cat")], 2, false);
        tree.add(&[tok(&mut map, "$")], 8, false);
        tree.calc_scores(false);
        // Mass is max(total=10, comma=8) = 10; comma score -log2(8/10)*100.
        assert_eq!(tree.comma_score(), 32);
        assert_eq!(tree.comma_hits(), 8);
    }

    #[test]
    fn child_contexts_are_scored_too() {
        let mut map = test_map();
        let mut tree = NgramTree::default();
        let words = vec![tok(&mut map, "the"), tok(&mut map, "cat")];
        tree.add(&words, 4, false);
        tree.calc_scores(false);
        let ctx = tree.find(map.id_by_word("the").unwrap()).unwrap();
        assert_eq!(ctx.tree().find(b"cat").unwrap().score(), 0);
    }
}
