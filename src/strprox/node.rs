//! Trie node (component A).
//!
//! Nodes live in an arena ([`crate::strprox::store::Store`] owns a
//! [`slab::Slab`]) and are addressed by [`NodeId`] rather than by raw
//! pointer, which gives the strong-downward / index-upward split the
//! design notes ask for without `unsafe`. Each node is independently
//! wrapped in an `Arc` so that a reader can clone a handle to it out of
//! the arena and then lock its fields without holding the arena lock for
//! the duration (see [`crate::strprox::store::Store::node`]).
//!
//! Two lock groups exist per node, matching §5 of the spec:
//! - `children`: the child-set map, keyed by the first character of each
//!   child's label.
//! - `state`: everything else that belongs to this node alone — its own
//!   label, parent back-link, terminal value, and cached depth.
//!
//! Structural changes that touch a parent/child pair always lock the
//! parent's `children` (and/or `state`) before the child's, to match the
//! root-ward lock ordering the spec mandates.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Index into the arena's slab, paired with the generation the slot held
/// when this id was issued. `slab::Slab::remove` frees a slot for reuse
/// immediately; without the generation, an id read from a parent's
/// `children` map (dropping that lock) and dereferenced afterward could,
/// if a concurrent `remove` frees and a concurrent `put` reallocates that
/// exact slot in between, silently resolve to an unrelated node instead
/// of a clean "this node is gone." [`crate::strprox::store::Store::node`]
/// checks the generation on every lookup and returns `None` on a
/// mismatch rather than aliasing to the reused node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NodeId {
    pub(crate) index: usize,
    pub(crate) generation: u64,
}

/// The mutable, single-node-owned fields: label, parent link, value, depth.
pub(crate) struct NodeState<V> {
    /// Edge label leading into this node from its parent. Empty only at
    /// the root.
    pub label: Box<str>,
    /// Cached character length of `label`, avoiding repeated UTF-8 walks.
    pub label_len: usize,
    /// Back-reference to the parent, `None` only at the root.
    pub parent: Option<NodeId>,
    /// Present iff this node is terminal.
    pub value: Option<V>,
    /// Cached maximum number of characters reachable below this node.
    pub depth: usize,
}

impl<V> NodeState<V> {
    pub fn new(label: Box<str>, parent: Option<NodeId>, value: Option<V>) -> Self {
        let label_len = label.chars().count();
        NodeState {
            label,
            label_len,
            parent,
            value,
            depth: 0,
        }
    }

    pub fn completes(&self) -> bool {
        self.value.is_some()
    }
}

pub(crate) struct Node<V> {
    pub children: Mutex<HashMap<char, NodeId>>,
    pub state: Mutex<NodeState<V>>,
}

impl<V> Node<V> {
    pub fn new(label: Box<str>, parent: Option<NodeId>, value: Option<V>) -> Self {
        Node {
            children: Mutex::new(HashMap::new()),
            state: Mutex::new(NodeState::new(label, parent, value)),
        }
    }
}

/// Shared handle to a node, clonable out of the arena lock.
pub(crate) type NodeRef<V> = Arc<Node<V>>;

/// Returns the first character of a child's label, which is the key
/// every child is stored under in its parent's `children` map (radix
/// uniqueness invariant).
pub(crate) fn first_char(label: &str) -> char {
    label.chars().next().expect("non-root label is non-empty")
}

/// Length, in characters, of the common prefix shared by `a` and `b`.
pub(crate) fn common_prefix_len(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}

/// Splits `s` after `n` characters, returning `(prefix, suffix)`.
pub(crate) fn split_at_char(s: &str, n: usize) -> (&str, &str) {
    match s.char_indices().nth(n) {
        Some((byte_idx, _)) => (&s[..byte_idx], &s[byte_idx..]),
        None => (s, ""),
    }
}
