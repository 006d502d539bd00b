//! Property graph abstraction backing the RDF store
//!
//! This module defines the contract an indexable property graph must
//! provide — vertices and edges carrying key-value properties, plus named
//! indexes with automatic reindexing — and an in-memory reference
//! implementation used for embedding and testing.

pub mod memory;
pub mod property;
pub mod types;

pub use memory::MemoryGraph;
pub use property::{PropertyMap, PropertyValue};
pub use types::{EdgeId, VertexId};

use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during graph operations
#[derive(Error, Debug, PartialEq)]
pub enum GraphError {
    #[error("vertex {0} not found")]
    VertexNotFound(VertexId),

    #[error("edge {0} not found")]
    EdgeNotFound(EdgeId),

    #[error("index {0:?} not found")]
    IndexNotFound(String),

    #[error("index {0:?} already exists")]
    IndexExists(String),

    #[error("index {0:?} does not apply to {1:?} elements")]
    IndexKindMismatch(String, ElementKind),

    #[error("backend failure: {0}")]
    Backend(String),
}

pub type GraphResult<T> = Result<T, GraphError>;

/// The kind of element an index covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Vertex,
    Edge,
}

/// Metadata describing a named index
#[derive(Debug, Clone)]
pub struct IndexInfo {
    pub name: String,
    pub kind: ElementKind,
    /// Property keys covered by the index; `None` means every key
    pub keys: Option<HashSet<String>>,
}

/// Transaction support reported by a backing graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionMode {
    /// No transaction support; every mutation is immediately visible
    None,
    /// Transactional with automatic per-operation commit
    Automatic,
    /// Transactional with explicit begin/commit/rollback
    Manual,
}

/// Contract for a property graph that the RDF store can sit on
///
/// Implementations provide directed, labeled edges between vertices, with
/// arbitrary key-value properties on both, and named indexes. Automatic
/// indexes must reindex whenever a covered property is set or removed.
///
/// All concurrency guarantees (isolation, atomicity, visibility) are the
/// implementation's own; the adapter layered on top holds no locks. Result
/// iterators release any underlying cursor when dropped.
pub trait IndexableGraph: Send + Sync {
    /// Create a new vertex with no properties
    fn add_vertex(&self) -> VertexId;

    /// Create a directed, labeled edge between two existing vertices
    fn add_edge(&self, source: VertexId, label: &str, target: VertexId) -> GraphResult<EdgeId>;

    /// Remove a vertex together with its incident edges
    fn remove_vertex(&self, vertex: VertexId) -> GraphResult<()>;

    /// Remove a single edge
    fn remove_edge(&self, edge: EdgeId) -> GraphResult<()>;

    /// Enumerate every vertex
    fn vertices(&self) -> Box<dyn Iterator<Item = VertexId> + '_>;

    /// Enumerate every edge
    fn edges(&self) -> Box<dyn Iterator<Item = EdgeId> + '_>;

    /// Source and target of an edge, in that order
    fn edge_ends(&self, edge: EdgeId) -> GraphResult<(VertexId, VertexId)>;

    /// The label an edge was created with
    fn edge_label(&self, edge: EdgeId) -> GraphResult<String>;

    /// Edges leaving a vertex
    fn out_edges(&self, vertex: VertexId) -> Box<dyn Iterator<Item = EdgeId> + '_>;

    /// Edges arriving at a vertex
    fn in_edges(&self, vertex: VertexId) -> Box<dyn Iterator<Item = EdgeId> + '_>;

    fn vertex_property(&self, vertex: VertexId, key: &str) -> Option<PropertyValue>;

    fn set_vertex_property(
        &self,
        vertex: VertexId,
        key: &str,
        value: PropertyValue,
    ) -> GraphResult<()>;

    fn remove_vertex_property(
        &self,
        vertex: VertexId,
        key: &str,
    ) -> GraphResult<Option<PropertyValue>>;

    fn vertex_property_keys(&self, vertex: VertexId) -> GraphResult<Vec<String>>;

    fn edge_property(&self, edge: EdgeId, key: &str) -> Option<PropertyValue>;

    fn set_edge_property(&self, edge: EdgeId, key: &str, value: PropertyValue) -> GraphResult<()>;

    fn remove_edge_property(&self, edge: EdgeId, key: &str)
        -> GraphResult<Option<PropertyValue>>;

    fn edge_property_keys(&self, edge: EdgeId) -> GraphResult<Vec<String>>;

    /// Look up a named index
    fn get_index(&self, name: &str) -> Option<IndexInfo>;

    /// Create an automatic index over the given element kind
    ///
    /// `keys = None` indexes every property key set on matching elements.
    fn create_automatic_index(
        &self,
        name: &str,
        kind: ElementKind,
        keys: Option<HashSet<String>>,
    ) -> GraphResult<()>;

    /// Enumerate all named indexes
    fn indices(&self) -> Vec<IndexInfo>;

    /// Point lookup in a vertex index
    fn vertex_index_lookup(
        &self,
        index: &str,
        key: &str,
        value: &PropertyValue,
    ) -> GraphResult<Box<dyn Iterator<Item = VertexId> + '_>>;

    /// Point lookup in an edge index
    fn edge_index_lookup(
        &self,
        index: &str,
        key: &str,
        value: &PropertyValue,
    ) -> GraphResult<Box<dyn Iterator<Item = EdgeId> + '_>>;

    /// Transaction support offered by this graph
    fn transaction_mode(&self) -> TransactionMode {
        TransactionMode::None
    }

    /// Begin a transaction; a no-op when one is already active or when the
    /// graph is not in manual mode
    fn begin_transaction(&self) {}

    /// Commit the active transaction, if any
    fn commit_transaction(&self) -> GraphResult<()> {
        Ok(())
    }

    /// Roll back the active transaction, if any
    fn rollback_transaction(&self) -> GraphResult<()> {
        Ok(())
    }

    /// Monotonic counter bumped on every mutation
    ///
    /// Non-transactional graphs should implement this so that consumers can
    /// detect concurrent modification during iteration, best-effort.
    fn mutation_stamp(&self) -> u64 {
        0
    }
}
