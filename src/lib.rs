//! Thread-safe compacted trie with exact lookup, prefix enumeration, and
//! configurable fuzzy substring search.
//!
//! The trie is a radix/PATRICIA structure: edges carry whole substrings
//! rather than single characters, so a chain of non-branching nodes is
//! always compacted into one. Nodes live in an arena and are addressed by
//! index rather than pointer, with per-node locking fine-grained enough
//! that concurrent readers and writers on unrelated subtrees don't
//! contend with each other. See [`Store`] for the main entry point.

pub mod strprox;

pub use strprox::error::{Error, Result};
pub use strprox::search::{MatchResult, MatchingStrategy};
pub use strprox::store::Store;
