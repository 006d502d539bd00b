//! Statement matchers and the 16-slot dispatch table
//!
//! A query binds some subset of (subject, predicate, object, context); the
//! subset is encoded as a 4-bit mask and used to pick a matcher out of a
//! fixed array built once at store open:
//!
//! - slot 0 (nothing bound) holds the trivial matcher, which scans every
//!   statement edge;
//! - slots whose pattern was configured for indexing hold an indexing
//!   matcher doing one point lookup on a composite edge property;
//! - slots with subject or object bound hold a graph-based matcher that
//!   pivots on the bound endpoint's adjacency;
//! - the remaining slots borrow the matcher of a sub-pattern from a fixed
//!   alternatives table. A borrowed matcher over-matches; the connection
//!   re-applies the full 4-tuple predicate to every yielded edge.

use crate::error::SailResult;
use crate::graph::{EdgeId, IndexableGraph, PropertyValue, VertexId};
use crate::rdf::codec::{self, SEPARATOR};
use crate::rdf::{Iri, Resource, Term};
use crate::sail::config::{mask_pattern, pattern_mask, C_BIT, O_BIT, P_BIT, S_BIT};
use crate::sail::store::{StoreContext, CONTEXT_PROP, EDGES_INDEX, PREDICATE_PROP};

/// Alternatives consulted, in order, for bind-patterns with no matcher of
/// their own. Each alternative is a sub-pattern whose matcher over-matches
/// the original pattern.
const ALTERNATIVES: &[(&str, &[&str])] = &[
    ("s", &[]),
    ("p", &[]),
    ("o", &[]),
    ("c", &[]),
    ("sp", &["s", "p"]),
    ("so", &["s", "o"]),
    ("sc", &["s", "c"]),
    ("po", &["o", "p"]),
    ("pc", &["p", "c"]),
    ("oc", &["o", "c"]),
    ("spo", &["so", "sp", "po"]),
    ("spc", &["sc", "sp", "pc"]),
    ("soc", &["so", "sc", "oc"]),
    ("poc", &["po", "oc", "pc"]),
    ("spoc", &["spo", "soc", "spc", "poc"]),
];

/// A statement matcher for one bind-pattern
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Matcher {
    /// Scan every statement edge (the unbound pattern)
    Trivial,
    /// Point lookup on the composite edge property named by the mask's
    /// pattern string
    Indexing { mask: u8 },
    /// Pivot on the subject or object vertex and filter adjacent edges
    GraphBased { mask: u8 },
}

/// A query pattern with its positions resolved against the store: canonical
/// encodings for every bound position, plus the endpoint vertices for bound
/// subject/object.
#[derive(Debug, Clone)]
pub(crate) struct EncodedPattern {
    pub mask: u8,
    pub s: Option<String>,
    pub p: Option<String>,
    pub o: Option<String>,
    pub c: Option<String>,
    pub s_vertex: Option<VertexId>,
    pub o_vertex: Option<VertexId>,
}

impl EncodedPattern {
    /// Resolve a query against the store. Returns `None` when a bound
    /// subject or object has no vertex, in which case nothing can match.
    pub(crate) fn resolve<G: IndexableGraph>(
        ctx: &StoreContext<G>,
        subject: Option<&Resource>,
        predicate: Option<&Iri>,
        object: Option<&Term>,
        context: Option<Option<&Resource>>,
    ) -> SailResult<Option<EncodedPattern>> {
        let mut mask = 0u8;

        let (s, s_vertex) = match subject {
            Some(subject) => {
                mask |= S_BIT;
                let term = Term::from(subject.clone());
                match ctx.find_vertex(&term)? {
                    Some(vertex) => (Some(codec::encode_resource(subject)), Some(vertex)),
                    None => return Ok(None),
                }
            }
            None => (None, None),
        };

        let p = predicate.map(|predicate| {
            mask |= P_BIT;
            codec::encode(&Term::Iri(predicate.clone()))
        });

        let (o, o_vertex) = match object {
            Some(object) => {
                mask |= O_BIT;
                match ctx.find_vertex(object)? {
                    Some(vertex) => (Some(codec::encode(object)), Some(vertex)),
                    None => return Ok(None),
                }
            }
            None => (None, None),
        };

        let c = context.map(|context| {
            mask |= C_BIT;
            codec::encode_context(context)
        });

        Ok(Some(EncodedPattern {
            mask,
            s,
            p,
            o,
            c,
            s_vertex,
            o_vertex,
        }))
    }

    fn encoding_for(&self, position: char) -> Option<&str> {
        match position {
            's' => self.s.as_deref(),
            'p' => self.p.as_deref(),
            'o' => self.o.as_deref(),
            'c' => self.c.as_deref(),
            _ => None,
        }
    }
}

impl Matcher {
    /// Produce the candidate edges for a resolved pattern
    ///
    /// Indexing and graph-based matchers assigned through the alternatives
    /// table cover a subset of the pattern's bound positions; candidates
    /// must still be run through [`edge_matches`] with the full mask.
    pub(crate) fn edges<'g, G: IndexableGraph>(
        &self,
        ctx: &'g StoreContext<G>,
        pattern: &EncodedPattern,
    ) -> SailResult<Box<dyn Iterator<Item = EdgeId> + 'g>> {
        match self {
            Matcher::Trivial => Ok(ctx.graph.edges()),
            Matcher::Indexing { mask } => {
                let key_pattern = mask_pattern(*mask);
                let mut parts: Vec<&str> = Vec::with_capacity(key_pattern.len());
                for position in key_pattern.chars() {
                    match pattern.encoding_for(position) {
                        Some(encoding) => parts.push(encoding),
                        // The dispatcher never routes a pattern to an
                        // indexing matcher for positions it does not bind.
                        None => return Ok(Box::new(std::iter::empty())),
                    }
                }
                let key = parts.join(&SEPARATOR.to_string());
                let edges = ctx.graph.edge_index_lookup(
                    EDGES_INDEX,
                    &key_pattern,
                    &PropertyValue::String(key),
                )?;
                Ok(edges)
            }
            Matcher::GraphBased { mask } => {
                let candidates = if mask & S_BIT != 0 {
                    match pattern.s_vertex {
                        Some(vertex) => ctx.graph.out_edges(vertex),
                        None => return Ok(Box::new(std::iter::empty())),
                    }
                } else {
                    match pattern.o_vertex {
                        Some(vertex) => ctx.graph.in_edges(vertex),
                        None => return Ok(Box::new(std::iter::empty())),
                    }
                };
                let graph = &ctx.graph;
                let filter_mask = *mask;
                let filter_pattern = pattern.clone();
                Ok(Box::new(candidates.filter(move |edge| {
                    edge_matches(graph, &filter_pattern, filter_mask, *edge)
                })))
            }
        }
    }
}

/// Test an edge against the positions of `pattern` selected by `mask`
///
/// Subject and object are compared by endpoint vertex identity; predicate
/// and context by their canonical encodings on the edge. An edge that has
/// disappeared since its id was produced does not match.
pub(crate) fn edge_matches<G: IndexableGraph>(
    graph: &G,
    pattern: &EncodedPattern,
    mask: u8,
    edge: EdgeId,
) -> bool {
    if mask & (S_BIT | O_BIT) != 0 {
        let (source, target) = match graph.edge_ends(edge) {
            Ok(ends) => ends,
            Err(_) => return false,
        };
        if mask & S_BIT != 0 && Some(source) != pattern.s_vertex {
            return false;
        }
        if mask & O_BIT != 0 && Some(target) != pattern.o_vertex {
            return false;
        }
    }
    if mask & P_BIT != 0 {
        let stored = graph.edge_property(edge, PREDICATE_PROP);
        if stored.as_ref().and_then(|v| v.as_string()) != pattern.p.as_deref() {
            return false;
        }
    }
    if mask & C_BIT != 0 {
        let stored = graph.edge_property(edge, CONTEXT_PROP);
        if stored.as_ref().and_then(|v| v.as_string()) != pattern.c.as_deref() {
            return false;
        }
    }
    true
}

/// Build the 16-slot matcher table for the enabled indexed patterns
pub(crate) fn assign_matchers(patterns: &[String]) -> SailResult<[Matcher; 16]> {
    let mut slots: [Option<Matcher>; 16] = Default::default();
    slots[0] = Some(Matcher::Trivial);

    // Seed indexing matchers from the configuration.
    for pattern in patterns {
        let mask = pattern_mask(pattern)?;
        slots[mask as usize] = Some(Matcher::Indexing { mask });
    }

    // Fill every remaining slot with subject or object bound.
    for mask in 1u8..16 {
        let slot = &mut slots[mask as usize];
        if slot.is_none() && mask & (S_BIT | O_BIT) != 0 {
            *slot = Some(Matcher::GraphBased { mask });
        }
    }

    // Resolve what is left through the alternatives table; the final
    // fallback is the subject-only graph matcher in slot 1.
    for (pattern, alternatives) in ALTERNATIVES {
        let mask = pattern_mask(pattern)? as usize;
        if slots[mask].is_some() {
            continue;
        }
        let chosen = alternatives
            .iter()
            .find_map(|alt| {
                let alt_mask = pattern_mask(alt).ok()? as usize;
                slots[alt_mask]
            })
            .or(slots[S_BIT as usize]);
        slots[mask] = chosen;
    }

    // Every slot is populated at this point.
    Ok(std::array::from_fn(|i| slots[i].unwrap_or(Matcher::Trivial)))
}
