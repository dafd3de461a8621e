//! Word-boundary classification (component F).
//!
//! A character is a word separator when it is Unicode whitespace or
//! punctuation. The trie's root carries an empty label, which is also
//! treated as a separator so that a match starting at the very first
//! character of a stored sequence is recognized as start-of-word.

use once_cell::sync::Lazy;
use regex::Regex;

// `\p{P}` covers the Unicode punctuation general category; `\s` covers
// the whitespace classes `char::is_whitespace` also recognizes.
static SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\p{P}\s]$").expect("valid regex"));

/// Returns whether `c` is a word separator: Unicode whitespace or punctuation.
pub fn is_word_separator(c: char) -> bool {
    c.is_whitespace() || SEPARATOR.is_match(c.encode_utf8(&mut [0u8; 4]))
}

/// Returns the index of the nearest word separator in `seq` at or before
/// `end_exclusive`, or `None` if none exists (start-of-sequence counts as
/// a separator per the root's empty label).
pub fn index_of_last_word_separator(seq: &[char], end_exclusive: usize) -> Option<usize> {
    (0..end_exclusive).rev().find(|&i| is_word_separator(seq[i]))
}

/// Returns the index of the nearest word separator in `seq` at or after
/// `start_inclusive`, or `None` if none exists.
pub fn index_of_first_word_separator(seq: &[char], start_inclusive: usize) -> Option<usize> {
    (start_inclusive..seq.len()).find(|&i| is_word_separator(seq[i]))
}

/// Extends `[start, end)` outward in `seq` to the nearest surrounding
/// word separators, returning the bounding word as a range.
pub fn surrounding_word(seq: &[char], start: usize, end: usize) -> std::ops::Range<usize> {
    let word_start = match index_of_last_word_separator(seq, start) {
        Some(i) => i + 1,
        None => 0,
    };
    let word_end = match index_of_first_word_separator(seq, end) {
        Some(i) => i,
        None => seq.len(),
    };
    word_start..word_end
}
