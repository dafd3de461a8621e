//! Fuzzy search state machine (component C, spec §4.3).
//!
//! A [`SearchState`] is an immutable snapshot of one point in a fuzzy
//! traversal. Because the trie is *compacted* (an edge label can hold
//! many characters), a state's position is `(node, consumed)`: the node
//! whose label we are walking, and how many of that label's characters
//! have already been folded into `sequence`. Matching, error, reset, and
//! gather transitions all operate one character at a time; `consumed`
//! reaching the node's full label length is what exposes that node's
//! real children (and terminal status) to the next expansion step.

use super::strategy::MatchingStrategy;
use crate::strprox::node::NodeId;
use crate::strprox::store::Store;
use crate::strprox::word;

/// One candidate next character reachable from a state: either the next
/// character still inside the current node's own label, or the first
/// character of one of the node's real children once its label is fully
/// consumed.
pub(crate) struct Candidate {
    pub ch: char,
    pub node: NodeId,
    pub consumed: usize,
    /// True iff this candidate lands exactly on a terminal node boundary.
    pub completes: bool,
    /// Maximum further characters reachable from this candidate onward;
    /// used for the pruning check in `expand`.
    pub depth: usize,
}

#[derive(Clone, Debug)]
pub(crate) struct SearchState {
    pub node: NodeId,
    pub consumed: usize,
    pub completes: bool,
    pub sequence: Vec<char>,
    pub search_index: usize,
    pub number_of_matches: usize,
    pub number_of_errors: usize,
    pub start_match_index: Option<usize>,
    pub end_match_index: Option<usize>,
    pub pending_swaps: Vec<(char, char)>,
    pub is_gather_state: bool,
}

impl SearchState {
    pub fn initial(root: NodeId) -> Self {
        SearchState {
            node: root,
            consumed: 0,
            completes: false,
            sequence: Vec::new(),
            search_index: 0,
            number_of_matches: 0,
            number_of_errors: 0,
            start_match_index: None,
            end_match_index: None,
            pending_swaps: Vec::new(),
            is_gather_state: false,
        }
    }

    /// `effectiveErrors = numberOfErrors + unmatchedQueryChars` (no
    /// `predeterminedErrors` term arises anywhere in this engine; see
    /// DESIGN.md for why that term is always zero here).
    fn effective_errors(&self, query_len: usize) -> usize {
        // `match_into`/`error_into` only ever advance `search_index` while
        // it is `< query_len` (see the guards in `expand`/`error_into`),
        // so it can never exceed `query_len` here.
        debug_assert!(
            self.search_index <= query_len,
            "search_index ({}) must never exceed query_len ({query_len}): negative unmatched-characters count",
            self.search_index,
        );
        let unmatched = query_len - self.search_index;
        self.number_of_errors + unmatched
    }

    /// The acceptance predicate (`matches` in spec §4.3).
    pub fn accepts(&self, query_len: usize, tolerance: usize) -> bool {
        self.start_match_index.is_some()
            && self.end_match_index.is_some()
            && self.number_of_matches + tolerance >= query_len
            && self.effective_errors(query_len) <= tolerance
            && self.pending_swaps.is_empty()
    }

    fn is_start_of_word(&self) -> bool {
        self.sequence.is_empty() || word::is_word_separator(*self.sequence.last().unwrap())
    }

    fn match_precondition_ok(&self, strategy: MatchingStrategy) -> bool {
        // SWAP must resolve a transposed pair on the very next position:
        // once a swap is pending, an ordinary match would let it survive
        // across an intervening character, which is exactly what
        // distinguishes SWAP from TYPO's looser pending-swap lifetime.
        if strategy.requires_immediate_swap_resolution() && !self.pending_swaps.is_empty() {
            return false;
        }
        match strategy {
            MatchingStrategy::MatchPrefix => self.number_of_matches > 0 || self.is_start_of_word(),
            MatchingStrategy::AnchorToPrefix => {
                if self.number_of_matches > 0 {
                    return true;
                }
                let pos = self.sequence.len();
                let word_start = word::index_of_last_word_separator(&self.sequence, pos)
                    .map(|i| i + 1)
                    .unwrap_or(0);
                (pos - word_start) <= self.number_of_errors
            }
            _ => true,
        }
    }

    /// `wasMatchingBefore`, plus the strategy-specific preconditions spec
    /// §9 asks us to pin down for `FUZZY_POSTFIX`: errors only activate
    /// once the minimum required matches have already been reached.
    fn error_precondition_ok(&self, strategy: MatchingStrategy, query_len: usize, tolerance: usize) -> bool {
        match strategy {
            MatchingStrategy::MatchPrefix => self.number_of_matches > 0,
            MatchingStrategy::AnchorToPrefix => true,
            MatchingStrategy::FuzzyPostfix => self.number_of_matches + tolerance >= query_len,
            _ => self.number_of_matches > 0,
        }
    }

    /// Candidates reachable from this state: the single next character of
    /// the current node's own label if it isn't fully consumed yet,
    /// otherwise one candidate per real child.
    fn candidates<V>(&self, store: &Store<V>) -> Vec<Candidate> {
        // A racing `remove`/compaction can free this state's node between
        // when it was produced and when it is expanded; that branch of
        // the worklist simply dies here rather than panicking.
        let Some(info) = store.node_info(self.node) else {
            return Vec::new();
        };
        if self.consumed < info.label_len {
            let ch = info
                .label
                .chars()
                .nth(self.consumed)
                .expect("consumed is within label bounds");
            let is_last = self.consumed + 1 == info.label_len;
            let (completes, depth) = if is_last {
                (info.completes, info.depth)
            } else {
                (false, (info.label_len - self.consumed - 1) + info.depth)
            };
            vec![Candidate {
                ch,
                node: self.node,
                consumed: self.consumed + 1,
                completes,
                depth,
            }]
        } else {
            store
                .children_summary(self.node)
                .into_iter()
                .map(|c| {
                    let is_last = c.label_len == 1;
                    let (completes, depth) = if is_last {
                        (c.completes, c.depth)
                    } else {
                        (false, (c.label_len - 1) + c.depth)
                    };
                    Candidate {
                        ch: c.first_char,
                        node: c.id,
                        consumed: 1,
                        completes,
                        depth,
                    }
                })
                .collect()
        }
    }

    fn match_into(&self, cand: &Candidate) -> SearchState {
        let mut next = self.clone();
        next.node = cand.node;
        next.consumed = cand.consumed;
        next.completes = cand.completes;
        next.sequence.push(cand.ch);
        next.search_index += 1;
        next.number_of_matches += 1;
        if next.start_match_index.is_none() {
            next.start_match_index = Some(next.sequence.len() - 1);
        }
        next.end_match_index = Some(next.sequence.len());
        next.is_gather_state = false;
        next
    }

    fn gather_into(&self, cand: &Candidate) -> SearchState {
        let mut next = self.clone();
        next.node = cand.node;
        next.consumed = cand.consumed;
        next.completes = cand.completes;
        next.sequence.push(cand.ch);
        next.is_gather_state = true;
        next
    }

    fn reset_into(&self, cand: &Candidate) -> SearchState {
        let mut sequence = self.sequence.clone();
        sequence.push(cand.ch);
        SearchState {
            node: cand.node,
            consumed: cand.consumed,
            completes: cand.completes,
            sequence,
            search_index: 0,
            number_of_matches: 0,
            number_of_errors: 0,
            start_match_index: None,
            end_match_index: None,
            pending_swaps: Vec::new(),
            is_gather_state: false,
        }
    }

    /// Error-state transitions (spec §4.3). Returns `None` when no error
    /// transition is eligible for this candidate at all.
    fn error_into(
        &self,
        cand: &Candidate,
        query: &[char],
        tolerance: usize,
        strategy: MatchingStrategy,
    ) -> Option<Vec<SearchState>> {
        if self.search_index >= query.len() {
            return None;
        }
        if self.number_of_errors >= tolerance {
            return None;
        }
        if !self.error_precondition_ok(strategy, query.len(), tolerance) {
            return None;
        }
        let qc = query[self.search_index];

        // Swap completion always takes priority: it resolves a pair
        // already charged, so it is tried even while a swap is pending.
        if let Some(pos) = self
            .pending_swaps
            .iter()
            .position(|&(src, tgt)| src == cand.ch && tgt == qc)
        {
            let mut next = self.clone();
            next.pending_swaps.remove(pos);
            next.node = cand.node;
            next.consumed = cand.consumed;
            next.completes = cand.completes;
            next.sequence.push(cand.ch);
            next.search_index += 1;
            next.number_of_matches += 1;
            if next.start_match_index.is_none() {
                next.start_match_index = Some(next.sequence.len() - 1);
            }
            next.end_match_index = Some(next.sequence.len());
            next.is_gather_state = false;
            return Some(vec![next]);
        }

        // TYPO/SWAP never open a second pair while one is outstanding.
        if strategy.allows_swap_tracking() && !self.pending_swaps.is_empty() {
            return None;
        }

        let mut out = Vec::new();
        if strategy.allows_swap_tracking() {
            let mut next = self.clone();
            next.node = cand.node;
            next.consumed = cand.consumed;
            next.completes = cand.completes;
            next.sequence.push(cand.ch);
            next.search_index += 1;
            next.number_of_errors += 1;
            next.pending_swaps.push((qc, cand.ch));
            next.is_gather_state = false;
            out.push(next);
        } else {
            // misspelling: advance both searchIndex and node.
            let mut misspelling = self.clone();
            misspelling.node = cand.node;
            misspelling.consumed = cand.consumed;
            misspelling.completes = cand.completes;
            misspelling.sequence.push(cand.ch);
            misspelling.search_index += 1;
            misspelling.number_of_errors += 1;
            misspelling.is_gather_state = false;
            out.push(misspelling);

            // missing-in-data: advance searchIndex, stay at the node.
            // Decided open question: forbidden on the final query
            // character, since there is then no stored character left
            // to blame for the skip and it would double-count the
            // trailing-unmatched-character term in `effective_errors`.
            if self.search_index + 1 < query.len() {
                let mut missing_in_data = self.clone();
                missing_in_data.search_index += 1;
                missing_in_data.number_of_errors += 1;
                missing_in_data.is_gather_state = false;
                out.push(missing_in_data);
            }

            // missing-in-query: hold searchIndex, advance to the node.
            let mut missing_in_query = self.clone();
            missing_in_query.node = cand.node;
            missing_in_query.consumed = cand.consumed;
            missing_in_query.completes = cand.completes;
            missing_in_query.sequence.push(cand.ch);
            missing_in_query.number_of_errors += 1;
            missing_in_query.is_gather_state = false;
            out.push(missing_in_query);
        }
        Some(out)
    }

    /// Expands this state by one character into every reachable
    /// candidate, producing the worklist's next generation (spec §4.3).
    pub fn expand<V>(
        &self,
        store: &Store<V>,
        query: &[char],
        tolerance: usize,
        strategy: MatchingStrategy,
    ) -> Vec<SearchState> {
        let mut out = Vec::new();
        let need = query.len() as i64 - self.number_of_matches as i64 - tolerance as i64;
        for cand in self.candidates(store) {
            if need > 0 && (cand.depth as i64) < need {
                continue;
            }
            if self.is_gather_state {
                out.push(self.gather_into(&cand));
                continue;
            }
            let mut produced = false;
            if self.search_index < query.len() {
                let qc = query[self.search_index];
                let char_matches = cand.ch == qc || (strategy.is_wildcard() && qc == '*');
                if char_matches && self.match_precondition_ok(strategy) {
                    out.push(self.match_into(&cand));
                    produced = true;
                }
            }
            if !produced {
                if let Some(mut states) = self.error_into(&cand, query, tolerance, strategy) {
                    out.append(&mut states);
                    produced = true;
                }
            }
            if !produced {
                if self.accepts(query.len(), tolerance) {
                    out.push(self.gather_into(&cand));
                    if self.number_of_matches < query.len() {
                        out.push(self.reset_into(&cand));
                    }
                } else {
                    out.push(self.reset_into(&cand));
                }
            }
        }
        out
    }
}
