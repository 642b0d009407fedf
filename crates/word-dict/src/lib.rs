//! Word identifier registry mapping words to compact [`WordId`] values
//! across three disjoint namespaces.
//!
//! The registry maintains one interning bimap per bucket (common, proper,
//! numeric) plus the vocabulary sets that decide which bucket a word belongs
//! to. Ids are stable once assigned and `add` is idempotent: re-adding a
//! word returns its existing id.
//!
//! The common bimap is pre-populated with the four sentinel entries, so
//! common word ids start at 4.

use std::collections::{HashMap, HashSet};

use word_core::{is_numeric_token, WordId, COMMA, NONE, NUMERIC, NUMERIC_START, PROPER, PROPER_START};

/// An interning bimap between strings and dense indices.
///
/// Insertion order defines the index; lookup is O(1) through the reverse
/// hash map. Indices are local to one bucket — the registry offsets them
/// into the global id space.
#[derive(Debug, Default)]
struct Bimap {
    index_to_word: Vec<String>,
    word_to_index: HashMap<String, u32>,
}

impl Bimap {
    fn add(&mut self, word: &str) -> u32 {
        if let Some(&n) = self.word_to_index.get(word) {
            return n;
        }
        let n = self.index_to_word.len() as u32;
        self.word_to_index.insert(word.to_owned(), n);
        self.index_to_word.push(word.to_owned());
        n
    }

    fn get(&self, word: &str) -> Option<u32> {
        self.word_to_index.get(word).copied()
    }

    fn word(&self, index: u32) -> &str {
        &self.index_to_word[index as usize]
    }

    fn len(&self) -> usize {
        self.index_to_word.len()
    }
}

/// The word identifier registry.
///
/// `add` classifies a word through the vocabulary sets installed by the
/// dictionary builder: the comma token and digit-leading tokens map to their
/// sentinels, words in the numeric/proper vocabularies get bucket-offset
/// ids, words in the common vocabulary get low ids, and anything else is
/// [`NONE`].
#[derive(Debug)]
pub struct WordIdMap {
    common_vocab: HashSet<String>,
    proper_vocab: HashSet<String>,
    numeric_vocab: HashSet<String>,
    common: Bimap,
    proper: Bimap,
    numeric: Bimap,
}

impl WordIdMap {
    /// Create a registry with the four sentinel entries pre-interned.
    pub fn new() -> Self {
        let mut map = WordIdMap {
            common_vocab: HashSet::new(),
            proper_vocab: HashSet::new(),
            numeric_vocab: HashSet::new(),
            common: Bimap::default(),
            proper: Bimap::default(),
            numeric: Bimap::default(),
        };
        let none = map.common.add("*");
        let proper = map.common.add("<proper>");
        let comma = map.common.add("$");
        let numeric = map.common.add("{numeric}");
        assert_eq!(WordId(none), NONE);
        assert_eq!(WordId(proper), PROPER);
        assert_eq!(WordId(comma), COMMA);
        assert_eq!(WordId(numeric), NUMERIC);
        map
    }

    /// Install the vocabulary sets that drive classification.
    ///
    /// Any overlap between the common and proper vocabularies is resolved in
    /// favour of common.
    pub fn set_vocabularies(
        &mut self,
        common: HashSet<String>,
        mut proper: HashSet<String>,
        numeric: HashSet<String>,
    ) {
        for w in &common {
            proper.remove(w);
        }
        self.common_vocab = common;
        self.proper_vocab = proper;
        self.numeric_vocab = numeric;
    }

    /// Classify and intern a word, returning its id.
    pub fn add(&mut self, word: &str) -> WordId {
        if word == "$" {
            COMMA
        } else if is_numeric_token(word) {
            NUMERIC
        } else if self.numeric_vocab.contains(word) {
            self.add_numeric(word)
        } else if self.proper_vocab.contains(word) {
            self.add_proper(word)
        } else if self.common_vocab.contains(word) {
            WordId(self.common.add(word))
        } else {
            NONE
        }
    }

    /// Intern a word directly into the proper bucket.
    pub fn add_proper(&mut self, word: &str) -> WordId {
        WordId(PROPER_START + self.proper.add(word))
    }

    /// Intern a word directly into the numeric bucket.
    pub fn add_numeric(&mut self, word: &str) -> WordId {
        WordId(NUMERIC_START + self.numeric.add(word))
    }

    /// The bucket sentinel of an id (see [`WordId::category`]).
    #[inline]
    pub fn category(&self, id: WordId) -> WordId {
        id.category()
    }

    /// Reconstruct a displayable form: proper nouns are decorated `<...>`,
    /// numeric words `{...}`, the unknown-word sentinel prints as `*`.
    pub fn word_by_id(&self, id: WordId) -> String {
        if id == NONE {
            "*".to_owned()
        } else if id.0 >= NUMERIC_START {
            format!("{{{}}}", self.numeric.word(id.0 - NUMERIC_START))
        } else if id.0 >= PROPER_START {
            format!("<{}>", self.proper.word(id.0 - PROPER_START))
        } else {
            self.common.word(id.0).to_owned()
        }
    }

    /// Look up a common word without interning.
    pub fn id_by_word(&self, word: &str) -> Option<WordId> {
        self.common.get(word).map(WordId)
    }

    /// Number of interned common words, sentinels included.
    pub fn common_len(&self) -> usize {
        self.common.len()
    }

    pub fn common_vocab(&self) -> &HashSet<String> {
        &self.common_vocab
    }

    pub fn proper_vocab(&self) -> &HashSet<String> {
        &self.proper_vocab
    }

    pub fn numeric_vocab(&self) -> &HashSet<String> {
        &self.numeric_vocab
    }
}

impl Default for WordIdMap {
    fn default() -> Self {
        Self::new()
    }
}
