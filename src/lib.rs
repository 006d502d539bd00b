//! RDF quad store backed by any indexable property graph
//!
//! RDF resources (IRIs, blank nodes, literals) are stored as vertices; RDF
//! statements as directed, labeled edges whose properties carry the
//! predicate, the context, and composite keys for every configured indexed
//! pattern. The store models RDF data as an ordinary property graph that
//! graph tooling can traverse, while serving quad queries for all sixteen
//! bind-patterns over (subject, predicate, object, context).
//!
//! Retrieval is either *index-based* — one point lookup on a composite edge
//! property — or *graph-based* — pivot on a bound endpoint vertex and
//! filter its adjacent edges. Patterns `p` and `c` are always indexed;
//! additional patterns (default `pc`) trade storage for query speed.
//!
//! The store is exactly as transactional as its backing graph: with a graph
//! in manual transaction mode, connection `commit`/`rollback` delimit
//! operation groups.
//!
//! # Example
//!
//! ```rust
//! use sailgraph::graph::MemoryGraph;
//! use sailgraph::rdf::{Iri, Literal, Resource, Term};
//! use sailgraph::sail::SailStore;
//!
//! let store = SailStore::open(MemoryGraph::new()).unwrap();
//! let mut conn = store.connection();
//!
//! let alice = Resource::Iri(Iri::new("http://example.org/alice"));
//! let name = Iri::new("http://xmlns.com/foaf/0.1/name");
//! conn.add_statement(
//!     alice.clone(),
//!     name.clone(),
//!     Term::Literal(Literal::plain("Alice")),
//!     None,
//! )
//! .unwrap();
//!
//! let found: Vec<_> = conn
//!     .get_statements(Some(&alice), Some(&name), None, None, false)
//!     .unwrap()
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(found.len(), 1);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod graph;
pub mod rdf;
pub mod sail;

pub use error::{SailError, SailResult};
pub use graph::{
    EdgeId, ElementKind, GraphError, GraphResult, IndexableGraph, MemoryGraph, PropertyValue,
    TransactionMode, VertexId,
};
pub use rdf::{BlankNode, Iri, Literal, Resource, Statement, Term};
pub use sail::{ConnectionListener, SailConfig, SailConnection, SailStore, Statements};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
