//! Store open logic and the shared store context
//!
//! RDF values live as vertices keyed by the auto-maintained `values` index;
//! statements live as edges whose properties carry the canonical encodings
//! that sustain the enabled indexes. The context built at open is immutable
//! and shared by every connection.

use crate::error::{SailError, SailResult};
use crate::graph::{ElementKind, IndexableGraph, PropertyValue, TransactionMode, VertexId};
use crate::rdf::{BlankNode, Iri, Literal, Term};
use crate::sail::config::{parse_indexed_patterns, SailConfig};
use crate::sail::connection::SailConnection;
use crate::sail::matcher::{assign_matchers, Matcher};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Name of the automatic edge index sustaining index-based matching
pub(crate) const EDGES_INDEX: &str = "edges";

/// Name of the automatic vertex index over the `value` property
pub(crate) const VALUES_INDEX: &str = "values";

pub(crate) const KIND: &str = "kind";
pub(crate) const VALUE: &str = "value";
pub(crate) const TYPE: &str = "type";
pub(crate) const LANG: &str = "lang";

pub(crate) const KIND_IRI: &str = "uri";
pub(crate) const KIND_BNODE: &str = "bnode";
pub(crate) const KIND_LITERAL: &str = "literal";

/// Edge property holding the canonical encoding of the predicate
pub(crate) const PREDICATE_PROP: &str = "p";

/// Edge property holding the canonical encoding of the context
pub(crate) const CONTEXT_PROP: &str = "c";

/// Reserved `value` identifying the namespace vertex
pub(crate) const NAMESPACES_VERTEX_ID: &str = "urn:sailgraph:namespaces";

/// Shared, read-only state handed to every connection
pub(crate) struct StoreContext<G: IndexableGraph> {
    pub(crate) graph: G,
    pub(crate) matchers: [Matcher; 16],
    /// Enabled indexed patterns, `"p"` and `"c"` included
    pub(crate) indexed_patterns: Vec<String>,
    pub(crate) unique_statements: bool,
    pub(crate) volatile_statements: bool,
    pub(crate) manual_transactions: bool,
    pub(crate) namespaces: VertexId,
}

impl<G: IndexableGraph> StoreContext<G> {
    /// Find the vertex for a value, walking the `values` index candidates
    /// and applying the matching rule
    pub(crate) fn find_vertex(&self, term: &Term) -> SailResult<Option<VertexId>> {
        let key = PropertyValue::String(term.lexical_form().to_string());
        let candidates = self.graph.vertex_index_lookup(VALUES_INDEX, VALUE, &key)?;
        for vertex in candidates {
            if self.vertex_matches(vertex, term) {
                return Ok(Some(vertex));
            }
        }
        Ok(None)
    }

    /// Unconditionally create a vertex for a value and populate its
    /// attributes
    pub(crate) fn add_term_vertex(&self, term: &Term) -> SailResult<VertexId> {
        let vertex = self.graph.add_vertex();
        match term {
            Term::Iri(iri) => {
                self.graph.set_vertex_property(vertex, KIND, KIND_IRI.into())?;
                self.graph
                    .set_vertex_property(vertex, VALUE, iri.as_str().into())?;
            }
            Term::Blank(node) => {
                self.graph
                    .set_vertex_property(vertex, KIND, KIND_BNODE.into())?;
                self.graph
                    .set_vertex_property(vertex, VALUE, node.as_str().into())?;
            }
            Term::Literal(literal) => {
                self.graph
                    .set_vertex_property(vertex, KIND, KIND_LITERAL.into())?;
                self.graph
                    .set_vertex_property(vertex, VALUE, literal.label().into())?;
                if let Some(datatype) = literal.datatype() {
                    self.graph
                        .set_vertex_property(vertex, TYPE, datatype.as_str().into())?;
                }
                if let Some(language) = literal.language() {
                    self.graph
                        .set_vertex_property(vertex, LANG, language.into())?;
                }
            }
        }
        Ok(vertex)
    }

    /// Find the vertex for a value, creating it on a miss
    pub(crate) fn find_or_add(&self, term: &Term) -> SailResult<VertexId> {
        match self.find_vertex(term)? {
            Some(vertex) => Ok(vertex),
            None => self.add_term_vertex(term),
        }
    }

    /// The vertex matching rule
    ///
    /// `kind` must agree with the value's variant, the stored `value` with
    /// its lexical form, and for literals one of: both datatype and
    /// language absent on both sides, datatypes present and equal, or
    /// language tags present and equal. A vertex with no `kind` (the
    /// namespace vertex) never matches.
    pub(crate) fn vertex_matches(&self, vertex: VertexId, term: &Term) -> bool {
        let kind = match self.graph.vertex_property(vertex, KIND) {
            Some(PropertyValue::String(kind)) => kind,
            _ => return false,
        };
        let value = match self.graph.vertex_property(vertex, VALUE) {
            Some(PropertyValue::String(value)) => value,
            _ => return false,
        };
        match term {
            Term::Iri(iri) => kind == KIND_IRI && value == iri.as_str(),
            Term::Blank(node) => kind == KIND_BNODE && value == node.as_str(),
            Term::Literal(literal) => {
                if kind != KIND_LITERAL || value != literal.label() {
                    return false;
                }
                let stored_type = self
                    .graph
                    .vertex_property(vertex, TYPE)
                    .and_then(|v| v.as_string().map(str::to_string));
                let stored_lang = self
                    .graph
                    .vertex_property(vertex, LANG)
                    .and_then(|v| v.as_string().map(str::to_string));
                let term_type = literal.datatype().map(|d| d.as_str());
                let term_lang = literal.language();

                (stored_type.is_none()
                    && term_type.is_none()
                    && stored_lang.is_none()
                    && term_lang.is_none())
                    || (stored_type.is_some()
                        && term_type.is_some()
                        && stored_type.as_deref() == term_type)
                    || (stored_lang.is_some()
                        && term_lang.is_some()
                        && stored_lang.as_deref() == term_lang)
            }
        }
    }

    /// Read a statement vertex back into a value
    pub(crate) fn decode_vertex(&self, vertex: VertexId) -> SailResult<Term> {
        let kind = self
            .graph
            .vertex_property(vertex, KIND)
            .and_then(|v| v.as_string().map(str::to_string))
            .ok_or_else(|| SailError::IllegalValue(format!("{} has no kind", vertex)))?;
        let value = self
            .graph
            .vertex_property(vertex, VALUE)
            .and_then(|v| v.as_string().map(str::to_string))
            .ok_or_else(|| SailError::IllegalValue(format!("{} has no value", vertex)))?;
        match kind.as_str() {
            KIND_IRI => Ok(Term::Iri(Iri::new(value))),
            KIND_BNODE => Ok(Term::Blank(BlankNode::new(value))),
            KIND_LITERAL => {
                let datatype = self
                    .graph
                    .vertex_property(vertex, TYPE)
                    .and_then(|v| v.as_string().map(str::to_string));
                let language = self
                    .graph
                    .vertex_property(vertex, LANG)
                    .and_then(|v| v.as_string().map(str::to_string));
                let literal = if let Some(datatype) = datatype {
                    Literal::typed(value, Iri::new(datatype))
                } else if let Some(language) = language {
                    Literal::with_language(value, language)
                } else {
                    Literal::plain(value)
                };
                Ok(Term::Literal(literal))
            }
            other => Err(SailError::IllegalValue(format!(
                "unexpected vertex kind {:?}",
                other
            ))),
        }
    }

    /// Ensure a transaction is active when the graph is in manual mode
    pub(crate) fn begin(&self) {
        if self.manual_transactions {
            self.graph.begin_transaction();
        }
    }

    pub(crate) fn commit(&self) -> SailResult<()> {
        if self.manual_transactions {
            self.graph.commit_transaction()?;
        }
        Ok(())
    }

    pub(crate) fn rollback(&self) -> SailResult<()> {
        if self.manual_transactions {
            self.graph.rollback_transaction()?;
        }
        Ok(())
    }
}

/// An RDF quad store layered over an indexable property graph
///
/// Statements are retrieved either index-based (point lookup on a composite
/// edge property) or graph-based (pivot on a bound endpoint vertex and
/// filter its adjacent edges), per the configured indexed patterns.
pub struct SailStore<G: IndexableGraph> {
    ctx: Arc<StoreContext<G>>,
}

impl<G: IndexableGraph> SailStore<G> {
    /// Open a store over the given graph with default options
    pub fn open(graph: G) -> SailResult<Self> {
        Self::with_config(graph, SailConfig::default())
    }

    /// Open a store over the given graph
    ///
    /// Creates the `edges` and `values` automatic indexes when absent, finds
    /// or creates the namespace vertex, and builds the matcher table. If the
    /// graph reports manual transaction mode, mutations through connections
    /// are bracketed accordingly.
    pub fn with_config(graph: G, config: SailConfig) -> SailResult<Self> {
        let patterns = parse_indexed_patterns(&config.indexed_patterns)?;

        if graph.get_index(EDGES_INDEX).is_none() {
            let keys: HashSet<String> = patterns.iter().cloned().collect();
            graph.create_automatic_index(EDGES_INDEX, ElementKind::Edge, Some(keys))?;
            debug!(index = EDGES_INDEX, ?patterns, "created automatic edge index");
        }
        if graph.get_index(VALUES_INDEX).is_none() {
            let mut keys = HashSet::new();
            keys.insert(VALUE.to_string());
            graph.create_automatic_index(VALUES_INDEX, ElementKind::Vertex, Some(keys))?;
            debug!(index = VALUES_INDEX, "created automatic vertex index");
        }

        let manual_transactions = graph.transaction_mode() == TransactionMode::Manual;

        let namespaces = match find_reference_vertex(&graph)? {
            Some(vertex) => vertex,
            None => {
                if manual_transactions {
                    graph.begin_transaction();
                }
                let vertex = graph.add_vertex();
                let created =
                    graph.set_vertex_property(vertex, VALUE, NAMESPACES_VERTEX_ID.into());
                if manual_transactions {
                    graph.commit_transaction()?;
                }
                created?;
                vertex
            }
        };

        let matchers = assign_matchers(&patterns)?;
        debug!(?patterns, manual_transactions, "store opened");

        Ok(SailStore {
            ctx: Arc::new(StoreContext {
                graph,
                matchers,
                indexed_patterns: patterns,
                unique_statements: config.unique_statements,
                volatile_statements: config.volatile_statements,
                manual_transactions,
                namespaces,
            }),
        })
    }

    /// Open a new connection
    pub fn connection(&self) -> SailConnection<G> {
        SailConnection::new(Arc::clone(&self.ctx))
    }

    /// Access the backing graph
    pub fn graph(&self) -> &G {
        &self.ctx.graph
    }
}

fn find_reference_vertex<G: IndexableGraph>(graph: &G) -> SailResult<Option<VertexId>> {
    let key = PropertyValue::String(NAMESPACES_VERTEX_ID.to_string());
    let mut hits = graph.vertex_index_lookup(VALUES_INDEX, VALUE, &key)?;
    Ok(hits.next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MemoryGraph;
    use crate::rdf::Resource;

    fn open_default() -> SailStore<MemoryGraph> {
        SailStore::open(MemoryGraph::new()).unwrap()
    }

    #[test]
    fn test_open_creates_indexes_and_reference_vertex() {
        let store = open_default();
        assert!(store.graph().get_index(EDGES_INDEX).is_some());
        assert!(store.graph().get_index(VALUES_INDEX).is_some());
        assert_eq!(store.graph().vertex_count(), 1);
    }

    #[test]
    fn test_reopen_reuses_reference_vertex() {
        let store = open_default();
        let graph = store.ctx;
        // A second open over the same graph must not create another one.
        let graph = match Arc::try_unwrap(graph) {
            Ok(ctx) => ctx.graph,
            Err(_) => unreachable!("no other context holders"),
        };
        let store = SailStore::open(graph).unwrap();
        assert_eq!(store.graph().vertex_count(), 1);
    }

    #[test]
    fn test_find_or_add_is_idempotent() {
        let store = open_default();
        let corpus = [
            Term::Iri(Iri::new("http://example.org/a")),
            Term::Blank(BlankNode::new("b1")),
            Term::Literal(Literal::plain("hello")),
            Term::Literal(Literal::with_language("hello", "en")),
            Term::Literal(Literal::typed(
                "5",
                Iri::new("http://www.w3.org/2001/XMLSchema#int"),
            )),
        ];
        for term in &corpus {
            let first = store.ctx.find_or_add(term).unwrap();
            let second = store.ctx.find_or_add(term).unwrap();
            assert_eq!(first, second, "duplicate vertex for {}", term);
        }
        // One vertex per distinct value plus the namespace vertex.
        assert_eq!(store.graph().vertex_count(), corpus.len() + 1);
    }

    #[test]
    fn test_literal_vertices_are_distinct_per_tag() {
        let store = open_default();
        let plain = Term::Literal(Literal::plain("hello"));
        let tagged = Term::Literal(Literal::with_language("hello", "en"));
        let v1 = store.ctx.find_or_add(&plain).unwrap();
        let v2 = store.ctx.find_or_add(&tagged).unwrap();
        assert_ne!(v1, v2);

        assert_eq!(store.ctx.find_vertex(&plain).unwrap(), Some(v1));
        assert_eq!(store.ctx.find_vertex(&tagged).unwrap(), Some(v2));
    }

    #[test]
    fn test_reference_vertex_never_matches_a_value() {
        let store = open_default();
        let id = Term::Iri(Iri::new(NAMESPACES_VERTEX_ID));
        assert_eq!(store.ctx.find_vertex(&id).unwrap(), None);
    }

    #[test]
    fn test_decode_vertex_round_trip() {
        let store = open_default();
        let corpus = [
            Term::Iri(Iri::new("http://example.org/a")),
            Term::Blank(BlankNode::new("b1")),
            Term::Literal(Literal::plain("plain label")),
            Term::Literal(Literal::with_language("hallo", "de")),
            Term::Literal(Literal::typed("3.14", Iri::new("x:decimal"))),
        ];
        for term in &corpus {
            let vertex = store.ctx.find_or_add(term).unwrap();
            assert_eq!(&store.ctx.decode_vertex(vertex).unwrap(), term);
        }
    }

    #[test]
    fn test_invalid_pattern_rejected_at_open() {
        let result = SailStore::with_config(
            MemoryGraph::new(),
            SailConfig {
                indexed_patterns: "p,c,xy".to_string(),
                ..SailConfig::default()
            },
        );
        assert!(matches!(result, Err(SailError::InvalidPattern(_))));
    }

    #[test]
    fn test_resource_import() {
        // Resource converts into Term for vertex storage.
        let store = open_default();
        let resource = Resource::Iri(Iri::new("x:s"));
        let vertex = store.ctx.find_or_add(&Term::from(resource)).unwrap();
        assert!(store.ctx.decode_vertex(vertex).unwrap().is_iri());
    }
}
