//! Core word identifier and score types shared by the dictionary and search.
//!
//! This crate defines the foundational vocabulary of the decoder: compact
//! [`WordId`] identifiers partitioned into three disjoint namespaces
//! (common, proper, numeric), the pseudo-word sentinels, and the logarithmic
//! score formula every tree in the system is weighted with.
//!
//! Scores are negated log-likelihoods scaled by [`WORD_SCORE_UNIT`]: lower
//! is more probable, zero is "as frequent as the reference mass".

/// Wide score type used for running totals during search.
pub type Score = i64;

/// Narrow score type stored in tree nodes.
pub type SmallScore = i16;

/// Raw observation count.
pub type Hits = u32;

/// Compact identifier assigned to a word by the registry.
///
/// The id space is partitioned into three disjoint buckets:
/// - `4 ..` [`PROPER_START`]: common words,
/// - [`PROPER_START`] `..` [`NUMERIC_START`]: proper nouns,
/// - [`NUMERIC_START`] `..`: number-like words,
///
/// with ids 0-3 reserved for the [`NONE`], [`PROPER`], [`COMMA`] and
/// [`NUMERIC`] sentinels.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct WordId(pub u32);

impl WordId {
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// The bucket sentinel for this id: [`PROPER`] or [`NUMERIC`] for ids in
    /// those ranges, the id itself otherwise (common words and sentinels).
    #[inline]
    pub fn category(self) -> WordId {
        if self.0 >= NUMERIC_START {
            NUMERIC
        } else if self.0 >= PROPER_START {
            PROPER
        } else {
            self
        }
    }
}

/// Sentinel for an unknown word. N-grams containing it are skipped.
pub const NONE: WordId = WordId(0);

/// Sentinel representing the category "some proper noun".
pub const PROPER: WordId = WordId(1);

/// Sentinel representing a sentence break.
pub const COMMA: WordId = WordId(2);

/// Sentinel representing a number-like token.
pub const NUMERIC: WordId = WordId(3);

/// First id of the proper-noun bucket.
pub const PROPER_START: u32 = 500_000;

/// First id of the numeric bucket.
pub const NUMERIC_START: u32 = 900_000;

/// Scale factor between the float log2 domain and integer scores.
pub const WORD_SCORE_UNIT: SmallScore = 100;

/// Score of a node that is not a word terminal.
pub const INF_SCORE: SmallScore = SmallScore::MAX;

/// Hit mass substituted for a word never observed in a context.
pub const ANOTHER_WORD_HITS: f64 = 0.5;

/// One emitted word occurrence in a candidate decryption.
///
/// `score` is the word's score under the deepest context that knew it,
/// `category` the penalty for scoring it outside its natural namespace, and
/// `other` the largest unknown-word penalty dragged in from backoff
/// contexts that did not know the word.
///
/// The derived ordering (id, then score, category, other) is what the
/// result aggregator dedups word sequences by.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct Word {
    id: WordId,
    score: Score,
    category: Score,
    other: Score,
}

impl Word {
    pub fn new(id: WordId, score: Score, category: Score, other: Score) -> Self {
        Word {
            id,
            score,
            category,
            other,
        }
    }

    #[inline]
    pub fn id(&self) -> WordId {
        self.id
    }

    #[inline]
    pub fn score(&self) -> Score {
        self.score
    }

    #[inline]
    pub fn category(&self) -> Score {
        self.category
    }

    #[inline]
    pub fn other(&self) -> Score {
        self.other
    }
}

/// Compute the score of an observation: `-log2(hits/max) * WORD_SCORE_UNIT`.
///
/// `hits == 0` is given the [`ANOTHER_WORD_HITS`] floor, so even unseen
/// events get a finite penalty. `max == 0` (empty context) scores 0.
/// The result is clamped so it never collides with [`INF_SCORE`].
pub fn calc_score(hits: Hits, max: usize) -> SmallScore {
    if max == 0 {
        return 0;
    }
    let r = if hits == 0 {
        ANOTHER_WORD_HITS
    } else {
        f64::from(hits)
    };
    let s = -(r / max as f64).log2() * f64::from(WORD_SCORE_UNIT);
    s.clamp(f64::from(SmallScore::MIN), f64::from(SmallScore::MAX - 1)) as SmallScore
}

/// True if the token looks like a number (leading ASCII digit).
pub fn is_numeric_token(s: &str) -> bool {
    s.as_bytes().first().is_some_and(|b| b.is_ascii_digit())
}

/// True if the word consists solely of ASCII letters.
///
/// Words failing this check (apostrophes, digits, non-ASCII) are skipped
/// during corpus ingestion.
pub fn is_plain_word(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphabetic())
}
