//! Matching strategy configuration (spec §4.2).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Controls where in a stored sequence a fuzzy match may begin and what
/// kinds of errors are tolerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MatchingStrategy {
    /// Match the query anywhere in any stored sequence; no positional
    /// constraint.
    Liberal,
    /// The first matched character must be at start-of-word (root edge
    /// or immediately after a word separator).
    MatchPrefix,
    /// Like [`MatchPrefix`](Self::MatchPrefix), but permits up to
    /// `tolerance` leading characters of the word before the first
    /// match, counted as errors. Also known as `FUZZY_PREFIX`.
    AnchorToPrefix,
    /// Permits missing trailing characters in the query relative to the
    /// stored sequence; an error state only activates once the minimum
    /// required number of matches has been reached.
    FuzzyPostfix,
    /// Permits character substitutions, tracking the substituted pair so
    /// a later transposed reversal can be recognized.
    Typo,
    /// Like [`Typo`](Self::Typo), but specifically hunts for transposed
    /// adjacent characters.
    Swap,
    /// A `*` in the query matches any single character; no other errors
    /// are permitted unless combined with a nonzero tolerance.
    Wildcard,
}

impl MatchingStrategy {
    /// `FUZZY_PREFIX` is an alias for `ANCHOR_TO_PREFIX`.
    pub const FUZZY_PREFIX: MatchingStrategy = MatchingStrategy::AnchorToPrefix;

    pub(crate) fn allows_swap_tracking(self) -> bool {
        matches!(self, MatchingStrategy::Typo | MatchingStrategy::Swap)
    }

    /// `SWAP` hunts specifically for *adjacent* transposed characters: a
    /// pending swap must resolve on the very next position, unlike
    /// `TYPO`'s pending swap, which may survive intervening ordinary
    /// matches.
    pub(crate) fn requires_immediate_swap_resolution(self) -> bool {
        matches!(self, MatchingStrategy::Swap)
    }

    pub(crate) fn is_wildcard(self) -> bool {
        matches!(self, MatchingStrategy::Wildcard)
    }
}
