//! Per-session connection: statement mutation, retrieval, transactions
//!
//! A connection is a thin session over the shared store context. Mutations
//! translate RDF values into vertices and edges; retrieval dispatches the
//! query's bind-pattern to the matcher table and decodes the resulting
//! edges back into statements. When the backing graph is in manual
//! transaction mode, every mutating operation ensures a transaction is
//! active, and `commit`/`rollback` delimit operation groups.

use crate::error::{SailError, SailResult};
use crate::graph::{EdgeId, IndexableGraph, TransactionMode};
use crate::rdf::codec;
use crate::rdf::{Iri, Resource, Statement, Term};
use crate::sail::matcher::{edge_matches, EncodedPattern};
use crate::sail::store::{StoreContext, CONTEXT_PROP, PREDICATE_PROP};
use std::sync::Arc;
use tracing::warn;

/// Callbacks fired when a connection mutates the statement set
///
/// Listeners receive the decoded statement. Registration is per-connection;
/// other connections' mutations are not observed.
pub trait ConnectionListener: Send + Sync {
    fn statement_added(&self, statement: &Statement);
    fn statement_removed(&self, statement: &Statement);
}

/// A session over the store
pub struct SailConnection<G: IndexableGraph> {
    ctx: Arc<StoreContext<G>>,
    listeners: Vec<Arc<dyn ConnectionListener>>,
    closed: bool,
}

impl<G: IndexableGraph> SailConnection<G> {
    pub(crate) fn new(ctx: Arc<StoreContext<G>>) -> Self {
        SailConnection {
            ctx,
            listeners: Vec::new(),
            closed: false,
        }
    }

    /// Register a listener for statement additions and removals
    pub fn add_listener(&mut self, listener: Arc<dyn ConnectionListener>) {
        self.listeners.push(listener);
    }

    /// Add a statement
    ///
    /// Vertices for all four values are created as needed. Under the
    /// unique-statements policy, any edge carrying the identical quad is
    /// removed first.
    pub fn add_statement(
        &mut self,
        subject: Resource,
        predicate: Iri,
        object: Term,
        context: Option<Resource>,
    ) -> SailResult<()> {
        self.ctx.begin();

        let subject_term = Term::from(subject.clone());
        let source = self.ctx.find_or_add(&subject_term)?;
        let target = self.ctx.find_or_add(&object)?;
        self.ctx.find_or_add(&Term::Iri(predicate.clone()))?;
        if let Some(context) = &context {
            self.ctx.find_or_add(&Term::from(context.clone()))?;
        }

        if self.ctx.unique_statements {
            self.remove_matching(
                Some(&subject),
                Some(&predicate),
                Some(&object),
                Some(context.as_ref()),
            )?;
        }

        let edge = self.ctx.graph.add_edge(source, predicate.as_str(), target)?;

        let s_enc = codec::encode_resource(&subject);
        let p_enc = codec::encode(&Term::Iri(predicate.clone()));
        let o_enc = codec::encode(&object);
        let c_enc = codec::encode_context(context.as_ref());

        self.ctx
            .graph
            .set_edge_property(edge, PREDICATE_PROP, p_enc.as_str().into())?;
        self.ctx
            .graph
            .set_edge_property(edge, CONTEXT_PROP, c_enc.as_str().into())?;

        for pattern in &self.ctx.indexed_patterns {
            if pattern == PREDICATE_PROP || pattern == CONTEXT_PROP {
                continue;
            }
            let mut parts: Vec<&str> = Vec::with_capacity(pattern.len());
            for position in pattern.chars() {
                parts.push(match position {
                    's' => &s_enc,
                    'p' => &p_enc,
                    'o' => &o_enc,
                    'c' => &c_enc,
                    _ => unreachable!("patterns are validated at open"),
                });
            }
            let key = parts.join(&codec::SEPARATOR.to_string());
            self.ctx
                .graph
                .set_edge_property(edge, pattern, key.into())?;
        }

        if !self.listeners.is_empty() {
            let statement = Statement::new(subject, predicate, object, context);
            for listener in &self.listeners {
                listener.statement_added(&statement);
            }
        }
        Ok(())
    }

    /// Remove every statement matching the given bind-pattern
    pub fn remove_statements(
        &mut self,
        subject: Option<&Resource>,
        predicate: Option<&Iri>,
        object: Option<&Term>,
        context: Option<Option<&Resource>>,
    ) -> SailResult<()> {
        self.ctx.begin();
        self.remove_matching(subject, predicate, object, context)
    }

    /// Remove all statements, or all statements in one context
    pub fn clear(&mut self, context: Option<Option<&Resource>>) -> SailResult<()> {
        self.remove_statements(None, None, None, context)
    }

    fn remove_matching(
        &mut self,
        subject: Option<&Resource>,
        predicate: Option<&Iri>,
        object: Option<&Term>,
        context: Option<Option<&Resource>>,
    ) -> SailResult<()> {
        let pattern =
            match EncodedPattern::resolve(&self.ctx, subject, predicate, object, context)? {
                Some(pattern) => pattern,
                None => return Ok(()),
            };
        let matcher = &self.ctx.matchers[pattern.mask as usize];

        // Materialize before deleting so the backing cursor is not
        // invalidated mid-iteration.
        let matching: Vec<EdgeId> = matcher
            .edges(&self.ctx, &pattern)?
            .filter(|edge| edge_matches(&self.ctx.graph, &pattern, pattern.mask, *edge))
            .collect();

        for edge in matching {
            let removed = if self.listeners.is_empty() {
                None
            } else {
                Some(decode_statement(&self.ctx, edge)?)
            };
            self.ctx.graph.remove_edge(edge)?;
            if let Some(statement) = removed {
                for listener in &self.listeners {
                    listener.statement_removed(&statement);
                }
            }
        }
        Ok(())
    }

    /// Retrieve the statements matching a bind-pattern
    ///
    /// `context` follows the store convention: `None` leaves the position
    /// unbound, `Some(None)` matches only the default graph.
    /// `include_inferred` is accepted for interface compatibility; the
    /// store performs no inference.
    pub fn get_statements(
        &self,
        subject: Option<&Resource>,
        predicate: Option<&Iri>,
        object: Option<&Term>,
        context: Option<Option<&Resource>>,
        include_inferred: bool,
    ) -> SailResult<Statements<'_, G>> {
        let _ = include_inferred;
        let ctx: &StoreContext<G> = self.ctx.as_ref();
        let stamp = if ctx.graph.transaction_mode() == TransactionMode::None {
            Some(ctx.graph.mutation_stamp())
        } else {
            None
        };

        let pattern = match EncodedPattern::resolve(ctx, subject, predicate, object, context)? {
            Some(pattern) => pattern,
            None => return Ok(Statements::empty(ctx)),
        };
        let matcher = &ctx.matchers[pattern.mask as usize];
        let edges = matcher.edges(ctx, &pattern)?;
        Ok(Statements {
            ctx,
            edges,
            pattern,
            stamp,
            volatile: ctx.volatile_statements,
            buffer: Statement::default(),
        })
    }

    /// Number of statements currently stored
    pub fn size(&self) -> usize {
        self.ctx.graph.edges().count()
    }

    /// Commit the current group of operations
    pub fn commit(&mut self) -> SailResult<()> {
        self.ctx.commit()
    }

    /// Discard the current group of operations
    pub fn rollback(&mut self) -> SailResult<()> {
        self.ctx.rollback()
    }

    /// Close the connection, discarding any uncommitted operations
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(error) = self.ctx.rollback() {
            warn!(%error, "rollback on close failed");
        }
    }

    /// Map a prefix to a namespace IRI
    pub fn set_namespace(&mut self, prefix: &str, name: &str) -> SailResult<()> {
        self.ctx.begin();
        self.ctx.set_namespace(prefix, name)
    }

    /// Look up the namespace IRI for a prefix
    pub fn get_namespace(&self, prefix: &str) -> Option<String> {
        self.ctx.get_namespace(prefix)
    }

    /// Drop a prefix mapping
    pub fn remove_namespace(&mut self, prefix: &str) -> SailResult<()> {
        self.ctx.begin();
        self.ctx.remove_namespace(prefix)
    }

    /// Enumerate all prefix mappings
    pub fn get_namespaces(&self) -> SailResult<Vec<(String, String)>> {
        self.ctx.get_namespaces()
    }

    /// Drop every prefix mapping
    pub fn clear_namespaces(&mut self) -> SailResult<()> {
        self.ctx.begin();
        self.ctx.clear_namespaces()
    }
}

impl<G: IndexableGraph> Drop for SailConnection<G> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Lazy sequence of statements produced by [`SailConnection::get_statements`]
///
/// Dropping the sequence releases the underlying graph cursor. With
/// `volatile_statements` enabled, [`Statements::next_ref`] reuses a single
/// statement buffer; that access path is single-consumer, and fields must
/// be copied out before advancing.
pub struct Statements<'a, G: IndexableGraph> {
    ctx: &'a StoreContext<G>,
    edges: Box<dyn Iterator<Item = EdgeId> + 'a>,
    pattern: EncodedPattern,
    stamp: Option<u64>,
    volatile: bool,
    buffer: Statement,
}

impl<'a, G: IndexableGraph> Statements<'a, G> {
    fn empty(ctx: &'a StoreContext<G>) -> Self {
        Statements {
            ctx,
            edges: Box::new(std::iter::empty()),
            pattern: EncodedPattern {
                mask: 0,
                s: None,
                p: None,
                o: None,
                c: None,
                s_vertex: None,
                o_vertex: None,
            },
            stamp: None,
            volatile: false,
            buffer: Statement::default(),
        }
    }

    fn advance(&mut self) -> Option<SailResult<Statement>> {
        loop {
            if let Some(stamp) = self.stamp {
                if self.ctx.graph.mutation_stamp() != stamp {
                    return Some(Err(SailError::ConcurrentModification));
                }
            }
            let edge = self.edges.next()?;
            if !edge_matches(&self.ctx.graph, &self.pattern, self.pattern.mask, edge) {
                continue;
            }
            return Some(decode_statement(self.ctx, edge));
        }
    }

    /// Streaming accessor reusing an internal statement buffer
    pub fn next_ref(&mut self) -> Option<SailResult<&Statement>> {
        match self.advance()? {
            Ok(statement) => {
                self.buffer = statement;
                Some(Ok(&self.buffer))
            }
            Err(error) => Some(Err(error)),
        }
    }
}

impl<G: IndexableGraph> Iterator for Statements<'_, G> {
    type Item = SailResult<Statement>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.volatile {
            match self.next_ref()? {
                Ok(statement) => Some(Ok(statement.clone())),
                Err(error) => Some(Err(error)),
            }
        } else {
            self.advance()
        }
    }
}

fn decode_statement<G: IndexableGraph>(
    ctx: &StoreContext<G>,
    edge: EdgeId,
) -> SailResult<Statement> {
    let (source, target) = ctx.graph.edge_ends(edge)?;

    let subject = Resource::try_from(ctx.decode_vertex(source)?).map_err(|literal| {
        SailError::IllegalValue(format!("literal {} in subject position", literal))
    })?;
    let object = ctx.decode_vertex(target)?;

    let p_enc = ctx
        .graph
        .edge_property(edge, PREDICATE_PROP)
        .and_then(|v| v.as_string().map(str::to_string))
        .ok_or_else(|| {
            SailError::MalformedEncoding(format!("{} has no predicate property", edge))
        })?;
    let predicate = match codec::decode(&p_enc)? {
        Term::Iri(iri) => iri,
        other => {
            return Err(SailError::MalformedEncoding(format!(
                "non-IRI predicate {} on {}",
                other, edge
            )))
        }
    };

    let c_enc = ctx
        .graph
        .edge_property(edge, CONTEXT_PROP)
        .and_then(|v| v.as_string().map(str::to_string))
        .ok_or_else(|| {
            SailError::MalformedEncoding(format!("{} has no context property", edge))
        })?;
    let context = codec::decode_context(&c_enc)?;

    Ok(Statement::new(subject, predicate, object, context))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MemoryGraph;
    use crate::rdf::Literal;
    use crate::sail::SailStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ex(local: &str) -> Iri {
        Iri::new(format!("http://example.org/{}", local))
    }

    struct CountingListener {
        added: AtomicUsize,
        removed: AtomicUsize,
    }

    impl ConnectionListener for CountingListener {
        fn statement_added(&self, _statement: &Statement) {
            self.added.fetch_add(1, Ordering::SeqCst);
        }

        fn statement_removed(&self, _statement: &Statement) {
            self.removed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_listeners_observe_mutations() {
        let store = SailStore::open(MemoryGraph::new()).unwrap();
        let mut conn = store.connection();
        let listener = Arc::new(CountingListener {
            added: AtomicUsize::new(0),
            removed: AtomicUsize::new(0),
        });
        conn.add_listener(listener.clone());

        conn.add_statement(
            Resource::Iri(ex("s")),
            ex("p"),
            Term::Literal(Literal::plain("o")),
            None,
        )
        .unwrap();
        assert_eq!(listener.added.load(Ordering::SeqCst), 1);

        conn.remove_statements(None, None, None, None).unwrap();
        assert_eq!(listener.removed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_edge_carries_pattern_properties() {
        let store = SailStore::open(MemoryGraph::new()).unwrap();
        let mut conn = store.connection();
        conn.add_statement(
            Resource::Iri(ex("s")),
            ex("p"),
            Term::Iri(ex("o")),
            Some(Resource::Iri(ex("g"))),
        )
        .unwrap();

        let graph = store.graph();
        let edge = graph.edges().next().unwrap();
        assert_eq!(
            graph.edge_property(edge, "p").unwrap().as_string(),
            Some("U http://example.org/p")
        );
        assert_eq!(
            graph.edge_property(edge, "c").unwrap().as_string(),
            Some("U http://example.org/g")
        );
        // Default configuration also maintains the "pc" composite.
        assert_eq!(
            graph.edge_property(edge, "pc").unwrap().as_string(),
            Some("U http://example.org/p U http://example.org/g")
        );
        assert_eq!(graph.edge_label(edge).unwrap(), "http://example.org/p");
    }

    #[test]
    fn test_null_context_sentinel_on_edge() {
        let store = SailStore::open(MemoryGraph::new()).unwrap();
        let mut conn = store.connection();
        conn.add_statement(Resource::Iri(ex("s")), ex("p"), Term::Iri(ex("o")), None)
            .unwrap();

        let graph = store.graph();
        let edge = graph.edges().next().unwrap();
        assert_eq!(graph.edge_property(edge, "c").unwrap().as_string(), Some("N"));
    }

    #[test]
    fn test_next_ref_streams_through_buffer() {
        let store = SailStore::open(MemoryGraph::new()).unwrap();
        let mut conn = store.connection();
        for i in 0..3 {
            conn.add_statement(
                Resource::Iri(ex("s")),
                ex("p"),
                Term::Literal(Literal::plain(format!("o{}", i))),
                None,
            )
            .unwrap();
        }

        let mut statements = conn
            .get_statements(None, None, None, None, false)
            .unwrap();
        let mut seen = 0;
        while let Some(statement) = statements.next_ref() {
            let statement = statement.unwrap();
            assert_eq!(statement.predicate, ex("p"));
            seen += 1;
        }
        assert_eq!(seen, 3);
    }
}
