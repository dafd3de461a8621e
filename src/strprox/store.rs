//! The trie itself (component B).
//!
//! Nodes live in a [`slab::Slab`] behind an [`RwLock`](parking_lot::RwLock):
//! structural operations that allocate or free a node take the arena lock
//! briefly, but a handle's own fields (`children`, `state`) are protected by
//! their own [`parking_lot::Mutex`]es so a long-running traversal never
//! holds the arena-wide lock. Every operation that touches a parent and a
//! child locks the parent first.
//!
//! Every slot also carries a generation counter (spec §5): a reader that
//! looks up a child id after dropping the parent's `children` lock can
//! race a concurrent `remove` that frees the slot and a concurrent `put`
//! that reuses it. [`Store::node`] checks the id's generation against the
//! slot's current one and returns `None` on a mismatch instead of handing
//! back the wrong node, so every call site below treats a lookup as
//! fallible and degrades (empty result, `NotFound`, early return) rather
//! than panicking or trusting a stale id.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use debug_print::debug_println;
use parking_lot::RwLock;
use slab::Slab;

use crate::strprox::error::{Error, Result};
use crate::strprox::node::{common_prefix_len, first_char, split_at_char, Node, NodeId, NodeRef};
use crate::strprox::search::driver;
use crate::strprox::search::result::MatchResult;
use crate::strprox::search::strategy::MatchingStrategy;

type Slot<V> = (u64, NodeRef<V>);

/// A thread-safe compacted trie mapping `String` keys to values of type `V`.
pub struct Store<V> {
    arena: RwLock<Slab<Slot<V>>>,
    root: NodeId,
    next_generation: AtomicU64,
}

/// Snapshot of a node's own label and cached metrics, taken under its
/// `state` lock and released before the caller does anything with it.
pub(crate) struct NodeInfo {
    pub label: String,
    pub label_len: usize,
    pub depth: usize,
    pub completes: bool,
}

/// Snapshot of one child, taken under the parent's `children` lock and the
/// child's own `state` lock, both released before the caller proceeds.
pub(crate) struct ChildSummary {
    pub id: NodeId,
    pub first_char: char,
    pub label_len: usize,
    pub depth: usize,
    pub completes: bool,
}

impl<V> Store<V> {
    /// Creates an empty trie with just a root node (empty label, no value).
    pub fn new() -> Self {
        let mut arena = Slab::new();
        let generation = 0;
        let index = arena.insert((generation, Arc::new(Node::new(Box::from(""), None, None))));
        Store {
            arena: RwLock::new(arena),
            root: NodeId { index, generation },
            next_generation: AtomicU64::new(generation + 1),
        }
    }

    pub(crate) fn root_id(&self) -> NodeId {
        self.root
    }

    /// Resolves `id` to its node handle, or `None` if the slot has since
    /// been freed and (possibly) reused by a different node.
    pub(crate) fn node(&self, id: NodeId) -> Option<NodeRef<V>> {
        let arena = self.arena.read();
        match arena.get(id.index) {
            Some((generation, node_ref)) if *generation == id.generation => Some(Arc::clone(node_ref)),
            _ => None,
        }
    }

    fn alloc_node(&self, label: Box<str>, parent: Option<NodeId>, value: Option<V>) -> NodeId {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let index = self
            .arena
            .write()
            .insert((generation, Arc::new(Node::new(label, parent, value))));
        NodeId { index, generation }
    }

    fn free_node(&self, id: NodeId) {
        self.arena.write().remove(id.index);
    }

    pub(crate) fn node_info(&self, id: NodeId) -> Option<NodeInfo> {
        let node = self.node(id)?;
        let state = node.state.lock();
        Some(NodeInfo {
            label: state.label.to_string(),
            label_len: state.label_len,
            depth: state.depth,
            completes: state.completes(),
        })
    }

    pub(crate) fn children_summary(&self, id: NodeId) -> Vec<ChildSummary> {
        let Some(node) = self.node(id) else {
            return Vec::new();
        };
        let child_ids: Vec<NodeId> = node.children.lock().values().copied().collect();
        child_ids
            .into_iter()
            .filter_map(|cid| {
                let child = self.node(cid)?;
                let state = child.state.lock();
                Some(ChildSummary {
                    id: cid,
                    first_char: first_char(&state.label),
                    label_len: state.label_len,
                    depth: state.depth,
                    completes: state.completes(),
                })
            })
            .collect()
    }

    /// Value stored at `id`, or `None` if the node is non-terminal or has
    /// since been removed out from under the caller.
    pub(crate) fn node_value(&self, id: NodeId) -> Option<V>
    where
        V: Clone,
    {
        self.node(id)?.state.lock().value.clone()
    }

    /// Recomputes `depth` from `node` up to the root. `node`'s own depth
    /// must already reflect its children before this is called (the
    /// caller recomputes bottom-up). Stops early if a racing `remove` has
    /// already freed an ancestor — its own compaction pass is responsible
    /// for that ancestor's depth.
    fn recompute_depth_to_root(&self, mut node: NodeId) {
        loop {
            let Some(handle) = self.node(node) else {
                return;
            };
            let child_ids: Vec<NodeId> = handle.children.lock().values().copied().collect();
            let max_child_depth = child_ids
                .iter()
                .filter_map(|&cid| {
                    let child = self.node(cid)?;
                    let state = child.state.lock();
                    Some(state.label_len + state.depth)
                })
                .max()
                .unwrap_or(0);
            let mut state = handle.state.lock();
            state.depth = max_child_depth;
            let parent = state.parent;
            drop(state);
            match parent {
                Some(p) => node = p,
                None => break,
            }
        }
    }

    /// Inserts `key` with `value`, returning the previous value if `key`
    /// was already terminal. Implements the four-way split described in
    /// spec §4.1.
    pub fn put(&self, key: &str, value: V) -> Result<Option<V>> {
        if key.is_empty() {
            return Err(Error::InvalidArgument("key must not be empty".into()));
        }
        if key.contains('*') {
            return Err(Error::InvalidArgument("'*' is reserved for WILDCARD queries and cannot appear in a stored key".into()));
        }
        debug_println!("put {key:?}");

        let mut parent = self.root;
        let mut remaining = key;
        let mut value = Some(value);

        loop {
            // `parent` may have been removed and freed by a racing
            // `remove` since it was last resolved (it is only guaranteed
            // live across a single iteration's continuously-held
            // `children` lock, not across the `drop(children)` below).
            // Restart the descent from the root with the same full key
            // rather than act on a stale id.
            let Some(parent_handle) = self.node(parent) else {
                parent = self.root;
                remaining = key;
                continue;
            };

            if remaining.is_empty() {
                let mut state = parent_handle.state.lock();
                let previous = state.value.replace(value.take().expect("value taken at most once"));
                drop(state);
                self.recompute_depth_to_root(parent);
                return Ok(previous);
            }

            let c = first_char(remaining);
            let mut children = parent_handle.children.lock();
            match children.get(&c).copied() {
                None => {
                    // Case 1: no matching child — attach a fresh leaf.
                    let new_id = self.alloc_node(Box::from(remaining), Some(parent), value.take());
                    children.insert(c, new_id);
                    drop(children);
                    self.recompute_depth_to_root(new_id);
                    return Ok(None);
                }
                Some(child_id) => {
                    // `children` has been held continuously since
                    // `child_id` was read out of it, and a node can only
                    // be unlinked-and-freed while its parent's
                    // `children` lock is held (see `compact_from`), so
                    // `child_id` is guaranteed live here.
                    let child_handle = self
                        .node(child_id)
                        .expect("child_id was just read under the still-held parent children lock");
                    let mut child_state = child_handle.state.lock();
                    let shared = common_prefix_len(&child_state.label, remaining);
                    let child_label_len = child_state.label_len;

                    if shared == child_label_len && shared == remaining.chars().count() {
                        // Case 2: exact match on an existing node.
                        let previous = child_state.value.replace(value.take().expect("value taken at most once"));
                        drop(child_state);
                        drop(children);
                        self.recompute_depth_to_root(child_id);
                        return Ok(previous);
                    } else if shared == child_label_len {
                        // Case 3: child's label is a strict prefix of what's
                        // left to insert — descend past it.
                        let (_, suffix) = split_at_char(remaining, shared);
                        drop(child_state);
                        drop(children);
                        parent = child_id;
                        remaining = suffix;
                        continue;
                    } else {
                        // Case 4: partial overlap — split the child's edge
                        // at the common prefix and insert a branch node.
                        let (child_prefix, child_suffix) = split_at_char(&child_state.label, shared);
                        let child_prefix = child_prefix.to_string();
                        let child_suffix_owned = child_suffix.to_string();
                        let (_, remaining_suffix) = split_at_char(remaining, shared);

                        let branch_id = self.alloc_node(child_prefix.into_boxed_str(), Some(parent), None);
                        child_state.label = child_suffix_owned.into_boxed_str();
                        child_state.label_len = child_state.label.chars().count();
                        child_state.parent = Some(branch_id);
                        drop(child_state);

                        let branch_handle = self
                            .node(branch_id)
                            .expect("branch_id was just allocated");
                        branch_handle
                            .children
                            .lock()
                            .insert(first_char(&child_handle.state.lock().label), child_id);

                        let value = value.take().expect("value taken at most once");
                        if remaining_suffix.is_empty() {
                            branch_handle.state.lock().value = Some(value);
                        } else {
                            let leaf_id = self.alloc_node(Box::from(remaining_suffix), Some(branch_id), Some(value));
                            branch_handle.children.lock().insert(first_char(remaining_suffix), leaf_id);
                        }

                        children.insert(c, branch_id);
                        drop(children);
                        self.recompute_depth_to_root(branch_id);
                        return Ok(None);
                    }
                }
            }
        }
    }

    /// Returns a clone of the value stored at `key`, or `Error::NotFound`.
    pub fn get(&self, key: &str) -> Result<V>
    where
        V: Clone,
    {
        let node = self.find_node(key)?;
        self.node(node)
            .and_then(|handle| handle.state.lock().value.clone())
            .ok_or(Error::NotFound)
    }

    fn find_node(&self, key: &str) -> Result<NodeId> {
        if key.is_empty() {
            return Err(Error::InvalidArgument("key must not be empty".into()));
        }
        let mut current = self.root;
        let mut remaining = key;
        while !remaining.is_empty() {
            let c = first_char(remaining);
            let Some(handle) = self.node(current) else {
                return Err(Error::NotFound);
            };
            let next = handle.children.lock().get(&c).copied();
            match next {
                None => return Err(Error::NotFound),
                Some(child_id) => {
                    // `child_id` is dereferenced after the `children`
                    // lock above was dropped, so it may have been freed
                    // (and its slot reused) by a racing `remove`/`put`
                    // pair in between. `self.node` catches that via the
                    // generation check; a miss here is indistinguishable
                    // from "not found", which is the spec-sanctioned
                    // degrade for a trie that changed between levels.
                    let Some(child_handle) = self.node(child_id) else {
                        return Err(Error::NotFound);
                    };
                    let state = child_handle.state.lock();
                    let shared = common_prefix_len(&state.label, remaining);
                    if shared != state.label_len {
                        return Err(Error::NotFound);
                    }
                    let (_, suffix) = split_at_char(remaining, shared);
                    drop(state);
                    current = child_id;
                    remaining = suffix;
                }
            }
        }
        Ok(current)
    }

    /// Removes `key`, returning its value. Non-branching ancestors left
    /// with a single child and no value of their own are fused back
    /// together, keeping the radix-uniqueness invariant intact.
    pub fn remove(&self, key: &str) -> Result<V> {
        let node = self.find_node(key)?;
        let previous = {
            let handle = self.node(node).ok_or(Error::NotFound)?;
            let mut state = handle.state.lock();
            state.value.take().ok_or(Error::NotFound)?
        };
        debug_println!("remove {key:?}, compacting from node {node:?}");
        self.compact_from(node);
        Ok(previous)
    }

    /// Walks upward from `node` (just emptied of its value), fusing any
    /// ancestor that is left non-terminal with exactly one child, and
    /// detaching any ancestor left with no children and no value. Bails
    /// out early if a racing structural change has already invalidated
    /// an id along the way — at worst this leaves a node uncompacted
    /// until the next operation through it, never a wrong-node read.
    fn compact_from(&self, node: NodeId) {
        let mut current = node;
        loop {
            if current == self.root {
                return;
            }
            let Some(handle) = self.node(current) else {
                return;
            };
            let (completes, child_count, only_child) = {
                let state = handle.state.lock();
                let children = handle.children.lock();
                (state.completes(), children.len(), children.values().next().copied())
            };
            let Some(parent) = handle.state.lock().parent else {
                return;
            };
            let Some(parent_handle) = self.node(parent) else {
                return;
            };

            if !completes && child_count == 0 {
                // Dead leaf: detach from parent and free.
                let mut parent_children = parent_handle.children.lock();
                parent_children.retain(|_, &mut v| v != current);
                drop(parent_children);
                self.free_node(current);
                current = parent;
                continue;
            }

            if !completes && child_count == 1 {
                // Fuse with the sole child: merge labels, reparent
                // grandchildren, and drop this node from the arena.
                let Some(child_id) = only_child else {
                    return;
                };
                let Some(child_handle) = self.node(child_id) else {
                    return;
                };
                let mut parent_children = parent_handle.children.lock();
                let mut own_state = handle.state.lock();
                let mut child_state = child_handle.state.lock();

                let mut fused_label = own_state.label.to_string();
                fused_label.push_str(&child_state.label);
                child_state.label = fused_label.into_boxed_str();
                child_state.label_len = child_state.label.chars().count();
                child_state.parent = own_state.parent;

                let key_char = first_char(&own_state.label);
                parent_children.insert(key_char, child_id);
                drop(child_state);
                drop(own_state);
                drop(parent_children);
                self.free_node(current);
                current = parent;
                continue;
            }

            // Terminal, or branching: nothing more to compact upward,
            // but depth caches above here are now stale.
            self.recompute_depth_to_root(current);
            return;
        }
    }

    /// Collects every terminal node in the subtree rooted at `node`,
    /// along with its full stored key, into `out`.
    fn collect_terminals(&self, node: NodeId, prefix: &mut String, out: &mut Vec<(String, V)>)
    where
        V: Clone,
    {
        let Some(handle) = self.node(node) else {
            return;
        };
        let (completes, value) = {
            let state = handle.state.lock();
            (state.completes(), state.value.clone())
        };
        if completes {
            out.push((prefix.clone(), value.expect("completes() implies a value")));
        }
        let child_ids: Vec<NodeId> = handle.children.lock().values().copied().collect();
        for child_id in child_ids {
            let Some(child_handle) = self.node(child_id) else {
                continue;
            };
            let label = child_handle.state.lock().label.to_string();
            let pushed = label.chars().count();
            prefix.push_str(&label);
            self.collect_terminals(child_id, prefix, out);
            for _ in 0..pushed {
                prefix.pop();
            }
        }
    }

    /// Enumerates every stored key beginning with `prefix`, each paired
    /// with its value.
    pub fn match_by_prefix(&self, prefix: &str) -> Result<Vec<(String, V)>>
    where
        V: Clone,
    {
        if prefix.is_empty() {
            return Err(Error::InvalidArgument("prefix must not be empty".into()));
        }
        let mut current = self.root;
        let mut remaining = prefix;
        let mut matched = String::new();
        while !remaining.is_empty() {
            let c = first_char(remaining);
            let Some(handle) = self.node(current) else {
                return Ok(Vec::new());
            };
            let next = handle.children.lock().get(&c).copied();
            match next {
                None => return Ok(Vec::new()),
                Some(child_id) => {
                    let Some(child_handle) = self.node(child_id) else {
                        // Raced away between reading the id and
                        // dereferencing it; treat as no match rather
                        // than trust a stale handle.
                        return Ok(Vec::new());
                    };
                    let label = child_handle.state.lock().label.to_string();
                    let shared = common_prefix_len(&label, remaining);
                    if shared < label.chars().count() && shared < remaining.chars().count() {
                        // Divergence before either string ends: no match.
                        return Ok(Vec::new());
                    }
                    if shared == remaining.chars().count() {
                        // `prefix` ends inside (or exactly at) this edge.
                        matched.push_str(&label[..label.char_indices().nth(shared).map(|(i, _)| i).unwrap_or(label.len())]);
                        let mut out = Vec::new();
                        self.collect_terminals(child_id, &mut matched, &mut out);
                        return Ok(out);
                    }
                    matched.push_str(&label);
                    let (_, suffix) = split_at_char(remaining, shared);
                    current = child_id;
                    remaining = suffix;
                }
            }
        }
        let mut out = Vec::new();
        self.collect_terminals(current, &mut matched, &mut out);
        Ok(out)
    }

    /// Convenience wrapper over [`Self::match_by_substring_fuzzy`] with
    /// zero tolerance and [`MatchingStrategy::Liberal`].
    pub fn match_by_substring(&self, query: &str) -> Result<Vec<MatchResult<V>>>
    where
        V: Clone,
    {
        self.match_by_substring_fuzzy(query, 0, MatchingStrategy::Liberal)
    }

    /// Runs the fuzzy substring search engine described in spec §4.3.
    pub fn match_by_substring_fuzzy(
        &self,
        query: &str,
        tolerance: usize,
        strategy: MatchingStrategy,
    ) -> Result<Vec<MatchResult<V>>>
    where
        V: Clone,
    {
        if query.is_empty() {
            return Err(Error::InvalidArgument("query must not be empty".into()));
        }
        if !strategy.is_wildcard() && query.contains('*') {
            log::debug!("'*' in query under a non-WILDCARD strategy is treated as a literal character");
        }
        driver::search(self, query, tolerance, strategy)
    }
}

impl<V> Default for Store<V> {
    fn default() -> Self {
        Self::new()
    }
}
