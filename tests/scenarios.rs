//! End-to-end fuzzy-search scenarios from the matching-strategy design
//! notes, one per `MatchingStrategy` variant plus compaction-after-remove.

use strprox::{MatchingStrategy, Store};

#[test]
fn liberal_tolerates_trailing_typo() {
    let store = Store::new();
    store.put("google", 1).unwrap();
    store.put("googly", 2).unwrap();

    let mut results = store
        .match_by_substring_fuzzy("googly", 1, MatchingStrategy::Liberal)
        .unwrap();
    results.sort_by(|a, b| a.sequence.cmp(&b.sequence));

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].sequence, "google");
    assert_eq!(results[0].number_of_errors, 1);
    assert_eq!(results[1].sequence, "googly");
    assert_eq!(results[1].number_of_errors, 0);
}

#[test]
fn match_prefix_requires_word_boundary() {
    let store = Store::new();
    store.put("the quick brown fox", 1).unwrap();

    let hits = store
        .match_by_substring_fuzzy("brown", 0, MatchingStrategy::MatchPrefix)
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].matched_word, "brown");
    assert!(hits[0].matched_whole_word);

    let misses = store
        .match_by_substring_fuzzy("rown", 0, MatchingStrategy::MatchPrefix)
        .unwrap();
    assert!(misses.is_empty());
}

#[test]
fn liberal_tolerates_substitution_deep_in_a_word() {
    let store = Store::new();
    store.put("indestructible", 1).unwrap();

    let hits = store
        .match_by_substring_fuzzy("indestructable", 1, MatchingStrategy::Liberal)
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].sequence, "indestructible");
    assert_eq!(hits[0].number_of_errors, 1);
}

#[test]
fn typo_resolves_a_transposition_as_one_error() {
    let store = Store::new();
    store.put("abcdef", 1).unwrap();

    let hits = store
        .match_by_substring_fuzzy("acbdef", 2, MatchingStrategy::Typo)
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].sequence, "abcdef");
    assert_eq!(hits[0].number_of_errors, 1);
}

#[test]
fn swap_requires_the_transposition_to_resolve_immediately() {
    let store = Store::new();
    store.put("aBMZQ", 1).unwrap();

    // TYPO's pending swap can survive the ordinary match at 'M' in
    // between, then resolve against the trailing "ZQ"/"BQ" pair.
    let typo_hits = store
        .match_by_substring_fuzzy("aZMBQ", 2, MatchingStrategy::Typo)
        .unwrap();
    assert!(typo_hits.iter().any(|m| m.sequence == "aBMZQ" && m.number_of_errors == 1));

    // SWAP must resolve on the very next position instead: the
    // intervening ordinary match at 'M' is blocked while the swap is
    // still pending, so no transition reaches an accepting state.
    let swap_hits = store
        .match_by_substring_fuzzy("aZMBQ", 2, MatchingStrategy::Swap)
        .unwrap();
    assert!(swap_hits.is_empty());
}

#[test]
fn remove_compacts_so_siblings_still_resolve() {
    let store = Store::new();
    store.put("hello", 1).unwrap();
    store.put("help", 2).unwrap();
    store.put("helm", 3).unwrap();

    store.remove("help").unwrap();

    assert_eq!(store.get("hello").unwrap(), 1);
    assert_eq!(store.get("helm").unwrap(), 3);
    assert!(store.get("help").is_err());

    let hits = store
        .match_by_substring_fuzzy("hello", 0, MatchingStrategy::Liberal)
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].sequence, "hello");
}

#[test]
fn wildcard_matches_single_character() {
    let store = Store::new();
    store.put("cat", 1).unwrap();

    let hit = store
        .match_by_substring_fuzzy("c*t", 0, MatchingStrategy::Wildcard)
        .unwrap();
    assert_eq!(hit.len(), 1);
    assert_eq!(hit[0].sequence, "cat");

    let miss = store
        .match_by_substring_fuzzy("c*z", 0, MatchingStrategy::Wildcard)
        .unwrap();
    assert!(miss.is_empty());
}

#[test]
fn rejects_empty_query() {
    let store: Store<i32> = Store::new();
    store.put("cat", 1).unwrap();
    assert!(store.match_by_substring("").is_err());
}

#[test]
fn anchor_to_prefix_at_zero_tolerance_matches_match_prefix() {
    let store = Store::new();
    store.put("the quick brown fox", 1).unwrap();

    // With no error budget to spend, ANCHOR_TO_PREFIX degenerates to the
    // same word-boundary requirement as MATCH_PREFIX (and is its alias,
    // FUZZY_PREFIX).
    let hits = store
        .match_by_substring_fuzzy("brown", 0, MatchingStrategy::FUZZY_PREFIX)
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].matched_word, "brown");

    let misses = store
        .match_by_substring_fuzzy("rown", 0, MatchingStrategy::AnchorToPrefix)
        .unwrap();
    assert!(misses.is_empty());
}

#[test]
fn fuzzy_postfix_only_tolerates_errors_near_the_tail() {
    let store = Store::new();
    store.put("microscope", 1).unwrap();

    // A trailing substitution, once enough characters have already
    // matched to plausibly finish the query, is tolerated.
    let tail_typo = store
        .match_by_substring_fuzzy("microscopz", 1, MatchingStrategy::FuzzyPostfix)
        .unwrap();
    assert!(tail_typo.iter().any(|m| m.sequence == "microscope"));

    // The same substitution in the interior is not: FUZZY_POSTFIX only
    // activates its error budget once the match is nearly complete,
    // unlike LIBERAL which tolerates an error anywhere after the first
    // match.
    let interior_typo_postfix = store
        .match_by_substring_fuzzy("microscxpe", 1, MatchingStrategy::FuzzyPostfix)
        .unwrap();
    assert!(interior_typo_postfix.is_empty());

    let interior_typo_liberal = store
        .match_by_substring_fuzzy("microscxpe", 1, MatchingStrategy::Liberal)
        .unwrap();
    assert!(interior_typo_liberal.iter().any(|m| m.sequence == "microscope"));
}
