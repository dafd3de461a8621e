//! Result record returned to callers (component E, spec §4.3/§6).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single hit from [`crate::Store::match_by_substring`] or
/// [`crate::Store::match_by_substring_fuzzy`].
///
/// Ranking/ordering is an external concern; this record only carries the
/// data a ranking layer would need.
#[derive(Debug, Clone, PartialEq, Eq, derive_new::new)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatchResult<V> {
    /// The full stored sequence (key) that was matched.
    pub sequence: String,
    /// The value stored at the terminal node.
    pub value: V,
    /// The substring of `sequence` that matched the query.
    pub matched_substring: String,
    /// The word (delimited by word separators) surrounding the match.
    pub matched_word: String,
    /// Number of query characters that were matched.
    pub number_of_matches: usize,
    /// Number of errors charged (substitutions, transpositions, missing
    /// characters, unmatched trailing query characters).
    pub number_of_errors: usize,
    /// Characters between the last word separator before the match and
    /// the match's start.
    pub prefix_distance: usize,
    /// Whether the match covers the entire stored sequence with zero
    /// effective errors.
    pub matched_whole_sequence: bool,
    /// Whether the match covers the entire surrounding word with zero
    /// effective errors.
    pub matched_whole_word: bool,
}
