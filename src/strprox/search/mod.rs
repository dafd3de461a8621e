//! Fuzzy substring search engine: strategy configuration, the per-state
//! transition machine, the worklist driver, and the result record.

pub(crate) mod driver;
pub mod result;
pub(crate) mod state;
pub mod strategy;

pub use result::MatchResult;
pub use strategy::MatchingStrategy;
