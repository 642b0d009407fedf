//! Character prefix tree with per-node scores and subtree score lower bounds.
//!
//! Each node spells one ASCII character of a word; a node with a nonzero
//! word id is a terminal. The tree lives in two phases:
//!
//! 1. **Ingestion** — [`PrefixTree::add_hits`] extends paths and accumulates
//!    raw hit counts. Only `hits` is meaningful.
//! 2. **Scored** — [`PrefixTree::score_with`] converts hit counts to
//!    `-log2(hits/max)` scores, computes `min_score` (the minimum terminal
//!    score anywhere in the subtree, the search's admissibility lower
//!    bound), and sorts children by symbol. The tree is immutable afterwards.
//!
//! The original packed these phases into one 32-bit union; here both fields
//! exist and the phase discipline is by construction (the dictionary scores
//! every tree exactly once, before any search runs).
//!
//! Word ids are stored masked to 20 bits and fan-out never exceeds the
//! ASCII letter alphabet, mirroring the original's bitfield caps.

use word_core::{calc_score, Hits, Score, SmallScore, WordId, INF_SCORE, NONE};

/// Mask applied to word ids stored in terminals (20-bit cap, ~1M words).
const WORD_ID_MASK: u32 = (1 << 20) - 1;

/// Maximum children per node (5-bit cap in the original layout).
const MAX_CHILDREN: usize = 31;

/// Symbol of the root node.
pub const EMPTY: u8 = b' ';

/// One node of the prefix tree. The root carries the [`EMPTY`] symbol.
#[derive(Debug)]
pub struct PrefixTree {
    word: WordId,
    symbol: u8,
    hits: Hits,
    score: SmallScore,
    min_score: SmallScore,
    children: Vec<PrefixTree>,
}

impl Default for PrefixTree {
    fn default() -> Self {
        PrefixTree::new(EMPTY)
    }
}

impl PrefixTree {
    fn new(symbol: u8) -> Self {
        PrefixTree {
            word: NONE,
            symbol: symbol & 0x7f,
            hits: 0,
            score: 0,
            min_score: 0,
            children: Vec::new(),
        }
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.symbol == EMPTY
    }

    #[inline]
    pub fn is_word(&self) -> bool {
        self.word != NONE
    }

    /// True for a node that terminates no word and has no children.
    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.is_word() && self.children.is_empty()
    }

    #[inline]
    pub fn word(&self) -> WordId {
        self.word
    }

    #[inline]
    pub fn symbol(&self) -> u8 {
        self.symbol
    }

    #[inline]
    pub fn hits(&self) -> Hits {
        self.hits
    }

    /// Terminal score, or [`INF_SCORE`] for non-terminals. Scored phase only.
    #[inline]
    pub fn score(&self) -> SmallScore {
        self.score
    }

    /// Lower bound over all terminal scores in this subtree (inclusive).
    #[inline]
    pub fn min_score(&self) -> SmallScore {
        self.min_score
    }

    #[inline]
    pub fn children(&self) -> &[PrefixTree] {
        &self.children
    }

    /// Extend or create the path spelling `s`; mark the terminal with `id`
    /// and add `h` hits to it.
    pub fn add_hits(&mut self, s: &[u8], id: WordId, h: Hits) {
        match s.split_first() {
            None => {
                self.word = WordId(id.0 & WORD_ID_MASK);
                self.hits += h;
            }
            Some((&ch, rest)) => {
                if let Some(child) = self.children.iter_mut().find(|c| c.symbol == ch) {
                    child.add_hits(rest, id, h);
                    return;
                }
                debug_assert!(self.children.len() < MAX_CHILDREN);
                let mut child = PrefixTree::new(ch);
                child.add_hits(rest, id, h);
                self.children.push(child);
            }
        }
    }

    /// Single-child lookup by symbol. Linear scan; fan-out is tiny.
    pub fn find_sub_tree(&self, ch: u8) -> Option<&PrefixTree> {
        self.children.iter().find(|c| c.symbol == ch)
    }

    /// Descend the path spelling `s`, if it exists.
    pub fn find(&self, s: &[u8]) -> Option<&PrefixTree> {
        match s.split_first() {
            None => Some(self),
            Some((&ch, rest)) => self.find_sub_tree(ch)?.find(rest),
        }
    }

    /// Largest terminal hit count in the subtree.
    pub fn max_hits(&self) -> Hits {
        let own = if self.is_word() { self.hits } else { 0 };
        self.children
            .iter()
            .map(PrefixTree::max_hits)
            .fold(own, Hits::max)
    }

    /// Sum of terminal hit counts in the subtree.
    pub fn total_hits(&self) -> Hits {
        let own = if self.is_word() { self.hits } else { 0 };
        self.children
            .iter()
            .map(PrefixTree::total_hits)
            .fold(own, |a, b| a + b)
    }

    /// Score the whole tree against the reference mass `max_hits`, switch it
    /// to the scored phase, and sort children by symbol.
    ///
    /// Returns `(sum of hits*score, sum of hits*depth)` over all terminals,
    /// the calibration aggregates the dictionary accumulates per corpus.
    pub fn score_with(&mut self, max_hits: usize) -> (Score, usize) {
        self.calc_scores(0, max_hits)
    }

    fn calc_scores(&mut self, depth: usize, max_hits: usize) -> (Score, usize) {
        let mut result: (Score, usize) = (0, 0);
        if self.is_word() {
            self.score = calc_score(self.hits, max_hits);
            result.0 += Score::from(self.hits) * Score::from(self.score);
            result.1 += self.hits as usize * depth;
        } else {
            self.score = INF_SCORE;
        }
        self.min_score = self.score;
        for child in &mut self.children {
            let w = child.calc_scores(depth + 1, max_hits);
            result.0 += w.0;
            result.1 += w.1;
            self.min_score = self.min_score.min(child.min_score);
        }
        self.children.sort_by_key(|c| c.symbol);
        result
    }
}
