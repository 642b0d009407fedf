//! Thread-safe best-first result aggregator.
//!
//! Solutions are keyed by total score in an ordered map, deduplicated by
//! their word sequences. All mutation and printing happens under one mutex;
//! the admissibility limits are plain fields read lock-free by every
//! worker. Progress lines are tagged with milliseconds elapsed since the
//! aggregator was created.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;
use std::time::Instant;

use word_core::{Score, Word, NUMERIC, PROPER};
use word_dict::WordIdMap;

/// Size of the rolling top window printed while searching.
const MAX_CURRENT_PRINT: usize = 20;

/// Size of the final report window.
const MAX_FINAL_PRINT: usize = 5000;

type ResultList = BTreeMap<Score, BTreeSet<Vec<Word>>>;

#[derive(Default)]
struct Inner {
    best_size: usize,
    best_list: ResultList,
}

/// The shared result aggregator for one task.
pub struct ResultSet<'d> {
    start: Instant,
    word_id_map: &'d WordIdMap,
    low_score_area: usize,
    low_score_limit: Score,
    high_score_limit: Score,
    print_solutions: usize,
    inner: Mutex<Inner>,
}

impl<'d> ResultSet<'d> {
    pub fn new(
        word_id_map: &'d WordIdMap,
        low_score_area: usize,
        low_score_limit: Score,
        high_score_limit: Score,
        print_solutions: usize,
    ) -> Self {
        ResultSet {
            start: Instant::now(),
            word_id_map,
            low_score_area,
            low_score_limit,
            high_score_limit,
            print_solutions,
            inner: Mutex::new(Inner::default()),
        }
    }

    #[inline]
    pub fn low_score_area(&self) -> usize {
        self.low_score_area
    }

    #[inline]
    pub fn low_score_limit(&self) -> Score {
        self.low_score_limit
    }

    #[inline]
    pub fn high_score_limit(&self) -> Score {
        self.high_score_limit
    }

    /// Record a complete decryption. Prints the solution and the rolling
    /// top list when it lands inside the current window.
    pub fn test_best(&self, text: &[u8], score: Score, key: &str, words: &[Word]) {
        let mut inner = self.inner.lock().unwrap();
        if !inner.best_list.entry(score).or_default().insert(words.to_vec()) {
            return;
        }
        let list_updated = score <= last_printed(&inner.best_list, false);
        if self.print_solutions >= 2 || (self.print_solutions >= 1 && list_updated) {
            self.print_time();
            println!(
                "  Solution: {} ({}/{}/{})",
                text.len(),
                self.low_score_area,
                self.low_score_limit,
                self.high_score_limit
            );
            println!("  {}", String::from_utf8_lossy(text));
            print!("  ({score}): ");
            self.print_words(words);
            println!();
            println!("  ={key}=");
        }
        if list_updated {
            self.print_list("Solution", &inner.best_list, false);
        }
    }

    /// Report a strict improvement in reached plaintext length. Verbose
    /// diagnostics only; never affects the result list.
    pub fn test_better(&self, text: &[u8], score: Score, key: &str, words: &[Word]) {
        if self.print_solutions < 3 {
            return;
        }
        let mut inner = self.inner.lock().unwrap();
        if text.len() <= inner.best_size {
            return;
        }
        inner.best_size = text.len();
        self.print_time();
        println!(
            " Improvement: {} ({}/{}/{})",
            inner.best_size, self.low_score_area, self.low_score_limit, self.high_score_limit
        );
        println!("  {}", String::from_utf8_lossy(text));
        print!("  ({score}): ");
        self.print_words(words);
        println!();
        println!("  ={key}=");
    }

    /// Worker progress line.
    pub fn print_state(&self, worker: usize, prefix: &str, n: usize, total: usize) {
        let _inner = self.inner.lock().unwrap();
        self.print_time();
        println!(" t{worker}: {prefix} ({n}/{total})");
    }

    /// Print the final report window.
    pub fn print_final(&self) {
        let inner = self.inner.lock().unwrap();
        self.print_list("Best", &inner.best_list, true);
    }

    /// Snapshot of the best results, sorted by score: `(score, words)`.
    pub fn top_results(&self, max: usize) -> Vec<(Score, Vec<String>)> {
        let inner = self.inner.lock().unwrap();
        let mut out = Vec::new();
        for (&score, set) in &inner.best_list {
            for words in set {
                if out.len() >= max {
                    return out;
                }
                out.push((
                    score,
                    words.iter().map(|w| self.word_id_map.word_by_id(w.id())).collect(),
                ));
            }
        }
        out
    }

    fn print_time(&self) {
        print!("[{}]", self.start.elapsed().as_millis());
    }

    fn print_words(&self, words: &[Word]) {
        for w in words {
            print!("{}({}", self.word_id_map.word_by_id(w.id()), w.score());
            if w.category() > 0 {
                print!("+{}", w.category());
                if w.id().category() == PROPER {
                    print!("p");
                } else if w.id().category() == NUMERIC {
                    print!("u");
                }
            }
            if w.other() > w.score() {
                print!("|{}o", w.other());
            }
            print!(") ");
        }
    }

    fn print_list(&self, name: &str, list: &ResultList, fin: bool) {
        let max_print = if fin { MAX_FINAL_PRINT } else { MAX_CURRENT_PRINT };
        let mut printed = 0;
        let mut total = 0;
        for set in list.values() {
            if printed < max_print {
                printed += set.len();
            }
            total += set.len();
        }

        self.print_time();
        print!("  {name}");
        if fin {
            print!(" final ");
        } else {
            print!(" current top ");
        }
        print!("{printed} result(s)");
        if printed != total {
            print!(" of {total}");
        }
        println!(
            " ({}/{}/{}):",
            self.low_score_area, self.low_score_limit, self.high_score_limit
        );

        let mut p = 0;
        for (score, set) in list {
            if p >= printed {
                break;
            }
            for words in set {
                print!("  ({score}): ");
                for w in words {
                    print!("{} ", self.word_id_map.word_by_id(w.id()));
                }
                println!();
            }
            p += set.len();
        }
    }
}

/// Score of the last entry inside the print window, computed over the
/// ascending score order.
fn last_printed(list: &ResultList, fin: bool) -> Score {
    let max_print = if fin { MAX_FINAL_PRINT } else { MAX_CURRENT_PRINT };
    let mut printed = 0;
    let mut result = 0;
    for (&score, set) in list {
        if printed < max_print {
            printed += set.len();
            result = score;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use word_core::WordId;

    fn test_map() -> WordIdMap {
        let mut map = WordIdMap::new();
        map.set_vocabularies(
            ["hello", "world"].iter().map(|w| w.to_string()).collect::<HashSet<_>>(),
            HashSet::new(),
            HashSet::new(),
        );
        map
    }

    fn word(id: WordId, score: Score) -> Word {
        Word::new(id, score, 0, 0)
    }

    #[test]
    fn test_best_records_and_dedups() {
        let mut map = test_map();
        let hello = map.add("hello");
        let rs = ResultSet::new(&map, 16, 1000, 1000, 0);
        let words = vec![word(hello, 100)];
        rs.test_best(b"hello", 100, "", &words);
        rs.test_best(b"hello", 100, "", &words);
        let top = rs.top_results(10);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].0, 100);
        assert_eq!(top[0].1, vec!["hello".to_string()]);
    }

    #[test]
    fn results_sorted_by_score() {
        let mut map = test_map();
        let hello = map.add("hello");
        let world = map.add("world");
        let rs = ResultSet::new(&map, 16, 1000, 1000, 0);
        rs.test_best(b"world", 300, "", &[word(world, 300)]);
        rs.test_best(b"hello", 100, "", &[word(hello, 100)]);
        let top = rs.top_results(10);
        assert_eq!(top[0].0, 100);
        assert_eq!(top[1].0, 300);
    }

    #[test]
    fn same_score_different_words_both_kept() {
        let mut map = test_map();
        let hello = map.add("hello");
        let world = map.add("world");
        let rs = ResultSet::new(&map, 16, 1000, 1000, 0);
        rs.test_best(b"hello", 100, "", &[word(hello, 100)]);
        rs.test_best(b"world", 100, "", &[word(world, 100)]);
        assert_eq!(rs.top_results(10).len(), 2);
    }

    #[test]
    fn top_results_respects_limit() {
        let mut map = test_map();
        let hello = map.add("hello");
        let rs = ResultSet::new(&map, 16, 1000, 1000, 0);
        for s in 0..10 {
            rs.test_best(b"hello", s, "", &[word(hello, s)]);
        }
        assert_eq!(rs.top_results(3).len(), 3);
    }

    #[test]
    fn test_better_is_silent_below_verbosity() {
        let map = test_map();
        let rs = ResultSet::new(&map, 16, 1000, 1000, 0);
        // Must not record anything either.
        rs.test_better(b"hel", 50, "", &[]);
        assert!(rs.top_results(10).is_empty());
    }

    #[test]
    fn limits_are_exposed() {
        let map = test_map();
        let rs = ResultSet::new(&map, 16, 2000, 1500, 1);
        assert_eq!(rs.low_score_area(), 16);
        assert_eq!(rs.low_score_limit(), 2000);
        assert_eq!(rs.high_score_limit(), 1500);
    }
}
