//! Worklist-driven traversal (component D, spec §4.3).
//!
//! Different paths through the state machine (an ongoing match and a
//! reset chain that happens to reconverge) can reach the very same
//! terminal with the same matched span, so *results* are deduplicated by
//! `(node, sequence, startMatchIndex, endMatchIndex)` before being
//! returned. States themselves are never deduplicated while expanding —
//! two states can share that key while differing in `search_index` or
//! `number_of_errors`, which would make them accept differently.

use std::collections::HashSet;

use super::result::MatchResult;
use super::state::SearchState;
use super::strategy::MatchingStrategy;
use crate::strprox::node::NodeId;
use crate::strprox::store::Store;
use crate::strprox::word;

type ResultKey = (NodeId, usize, String, Option<usize>, Option<usize>);

fn result_key(state: &SearchState) -> ResultKey {
    (
        state.node,
        state.consumed,
        state.sequence.iter().collect(),
        state.start_match_index,
        state.end_match_index,
    )
}

/// Every field that influences a state's future expansion and
/// acceptance. Two states sharing this full key are interchangeable, so
/// collapsing them (unlike collapsing on `ResultKey` alone) never drops a
/// reachable result — it only skips reprocessing literal duplicates,
/// which reset chains reconverging on the same node/sequence produce
/// often since a reset's fields are fully determined by its candidate and
/// the sequence so far.
type StateKey = (
    NodeId,
    usize,
    String,
    usize,
    usize,
    usize,
    Option<usize>,
    Option<usize>,
    Vec<(char, char)>,
    bool,
);

fn state_key(state: &SearchState) -> StateKey {
    (
        state.node,
        state.consumed,
        state.sequence.iter().collect(),
        state.search_index,
        state.number_of_matches,
        state.number_of_errors,
        state.start_match_index,
        state.end_match_index,
        state.pending_swaps.clone(),
        state.is_gather_state,
    )
}

/// Builds the result for a completing, accepting state, or `None` if a
/// racing `remove` has since cleared the node's value — a legal outcome
/// under the concurrent-search contract (spec §5), not an error.
fn build_result<V: Clone>(store: &Store<V>, state: &SearchState, query_len: usize) -> Option<MatchResult<V>> {
    let value = store.node_value(state.node)?;
    let start = state.start_match_index.expect("accepting state has a start index");
    let end = state.end_match_index.expect("accepting state has an end index");

    let sequence: String = state.sequence.iter().collect();
    let matched_substring: String = state.sequence[start..end].iter().collect();
    let word_range = word::surrounding_word(&state.sequence, start, end);
    let matched_word: String = state.sequence[word_range.clone()].iter().collect();

    debug_assert!(
        state.search_index <= query_len,
        "search_index ({}) must never exceed query_len ({query_len}): negative unmatched-characters count",
        state.search_index,
    );
    let unmatched = query_len - state.search_index;
    let effective_errors = state.number_of_errors + unmatched;

    let prefix_distance = start
        - word::index_of_last_word_separator(&state.sequence, start)
            .map(|i| i + 1)
            .unwrap_or(0);

    Some(MatchResult::new(
        sequence,
        value,
        matched_substring,
        matched_word,
        state.number_of_matches,
        effective_errors,
        prefix_distance,
        effective_errors == 0 && start == 0 && end == state.sequence.len(),
        effective_errors == 0 && start == word_range.start && end == word_range.end,
    ))
}

/// Runs the fuzzy substring search described in spec §4.3 to completion
/// and returns every accepted, deduplicated result.
pub(crate) fn search<V: Clone>(
    store: &Store<V>,
    query: &str,
    tolerance: usize,
    strategy: MatchingStrategy,
) -> crate::strprox::error::Result<Vec<MatchResult<V>>> {
    let query: Vec<char> = query.chars().collect();
    let mut worklist = vec![SearchState::initial(store.root_id())];
    let mut visited: HashSet<StateKey> = HashSet::new();
    let mut emitted: HashSet<ResultKey> = HashSet::new();
    let mut results = Vec::new();

    while let Some(state) = worklist.pop() {
        if !visited.insert(state_key(&state)) {
            continue;
        }
        if state.completes && state.accepts(query.len(), tolerance) && emitted.insert(result_key(&state)) {
            if let Some(result) = build_result(store, &state, query.len()) {
                results.push(result);
            }
        }
        worklist.extend(state.expand(store, &query, tolerance, strategy));
    }

    Ok(results)
}
