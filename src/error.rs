//! Error types for the storage adapter

use crate::graph::GraphError;
use thiserror::Error;

/// Errors surfaced by the sail layer
///
/// Every failure is reported to the caller; nothing is retried internally.
#[derive(Error, Debug)]
pub enum SailError {
    /// A failure bubbled up from the backing graph
    #[error("store failure: {0}")]
    Store(#[from] GraphError),

    /// A corrupted canonical string in an edge or vertex property
    #[error("malformed encoding: {0}")]
    MalformedEncoding(String),

    /// A configured indexed pattern string does not match `s?p?o?c?`
    #[error("invalid indexed pattern: {0:?}")]
    InvalidPattern(String),

    /// A value of unexpected shape presented at the boundary
    #[error("illegal value: {0}")]
    IllegalValue(String),

    /// The backing graph was mutated while a result sequence was being
    /// consumed on a non-transactional backing (best-effort detection)
    #[error("graph mutated during statement iteration")]
    ConcurrentModification,
}

pub type SailResult<T> = Result<T, SailError>;
