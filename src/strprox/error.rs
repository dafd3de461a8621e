//! Crate error type (ambient §7).
//!
//! `InvariantViolation` is deliberately not a variant here: per spec it is a
//! programmer error, surfaced via `debug_assert!`/`panic!` at the point the
//! broken invariant would otherwise corrupt the tree, never as a `Result`.

/// Errors returned by [`crate::Store`] operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An argument failed a precondition (empty key/query, wildcard in a
    /// stored key, etc.).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// `get`/`remove` found no node terminating at the requested key.
    #[error("key not found")]
    NotFound,
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
