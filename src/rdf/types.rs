//! RDF value and statement types
//!
//! The value space is the classic RDF one: IRIs, blank nodes, and literals
//! with an optional language tag or an optional datatype IRI (never both).
//! Subjects and contexts are restricted to resources; objects may be any
//! term.

use std::fmt;

/// An IRI identifying a resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Iri(String);

impl Iri {
    /// Create a new IRI from its string form
    pub fn new(iri: impl Into<String>) -> Self {
        Iri(iri.into())
    }

    /// Get the IRI string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

impl From<&str> for Iri {
    fn from(s: &str) -> Self {
        Iri::new(s)
    }
}

/// An anonymous resource with a store-local identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlankNode(String);

impl BlankNode {
    /// Create a blank node from a string identifier
    pub fn new(id: impl Into<String>) -> Self {
        BlankNode(id.into())
    }

    /// Get the blank node identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}", self.0)
    }
}

/// A literal: a lexical label with an optional language tag or datatype
///
/// A plain literal carries neither; a language-tagged literal carries only
/// `language`; a typed literal carries only `datatype`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal {
    label: String,
    language: Option<String>,
    datatype: Option<Iri>,
}

impl Literal {
    /// Create a plain literal
    pub fn plain(label: impl Into<String>) -> Self {
        Literal {
            label: label.into(),
            language: None,
            datatype: None,
        }
    }

    /// Create a language-tagged literal
    pub fn with_language(label: impl Into<String>, language: impl Into<String>) -> Self {
        Literal {
            label: label.into(),
            language: Some(language.into()),
            datatype: None,
        }
    }

    /// Create a typed literal
    pub fn typed(label: impl Into<String>, datatype: Iri) -> Self {
        Literal {
            label: label.into(),
            language: None,
            datatype: Some(datatype),
        }
    }

    /// Get the lexical label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Get the language tag if present
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Get the datatype IRI if present
    pub fn datatype(&self) -> Option<&Iri> {
        self.datatype.as_ref()
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.label)?;
        if let Some(lang) = &self.language {
            write!(f, "@{}", lang)?;
        } else if let Some(datatype) = &self.datatype {
            write!(f, "^^{}", datatype)?;
        }
        Ok(())
    }
}

/// A resource: the value space of subject and context positions
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Resource {
    Iri(Iri),
    Blank(BlankNode),
}

impl Resource {
    pub fn is_iri(&self) -> bool {
        matches!(self, Resource::Iri(_))
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Resource::Blank(_))
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Iri(v) => write!(f, "{}", v),
            Resource::Blank(v) => write!(f, "{}", v),
        }
    }
}

/// Any RDF value: the value space of the object position
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Iri(Iri),
    Blank(BlankNode),
    Literal(Literal),
}

impl Term {
    pub fn is_iri(&self) -> bool {
        matches!(self, Term::Iri(_))
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Term::Blank(_))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal(_))
    }

    /// The primary lexical form: the IRI string, the blank node identifier,
    /// or the literal label
    pub fn lexical_form(&self) -> &str {
        match self {
            Term::Iri(iri) => iri.as_str(),
            Term::Blank(b) => b.as_str(),
            Term::Literal(l) => l.label(),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(v) => write!(f, "{}", v),
            Term::Blank(v) => write!(f, "{}", v),
            Term::Literal(v) => write!(f, "{}", v),
        }
    }
}

impl From<Iri> for Resource {
    fn from(iri: Iri) -> Self {
        Resource::Iri(iri)
    }
}

impl From<BlankNode> for Resource {
    fn from(node: BlankNode) -> Self {
        Resource::Blank(node)
    }
}

impl From<Iri> for Term {
    fn from(iri: Iri) -> Self {
        Term::Iri(iri)
    }
}

impl From<BlankNode> for Term {
    fn from(node: BlankNode) -> Self {
        Term::Blank(node)
    }
}

impl From<Literal> for Term {
    fn from(literal: Literal) -> Self {
        Term::Literal(literal)
    }
}

impl From<Resource> for Term {
    fn from(resource: Resource) -> Self {
        match resource {
            Resource::Iri(iri) => Term::Iri(iri),
            Resource::Blank(b) => Term::Blank(b),
        }
    }
}

impl TryFrom<Term> for Resource {
    type Error = Literal;

    fn try_from(term: Term) -> Result<Self, Self::Error> {
        match term {
            Term::Iri(iri) => Ok(Resource::Iri(iri)),
            Term::Blank(b) => Ok(Resource::Blank(b)),
            Term::Literal(l) => Err(l),
        }
    }
}

/// An RDF statement: a quad of subject, predicate, object, and an optional
/// named-graph context (`None` = default graph)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Statement {
    pub subject: Resource,
    pub predicate: Iri,
    pub object: Term,
    pub context: Option<Resource>,
}

impl Statement {
    /// Create a new statement
    pub fn new(
        subject: Resource,
        predicate: Iri,
        object: Term,
        context: Option<Resource>,
    ) -> Self {
        Statement {
            subject,
            predicate,
            object,
            context,
        }
    }
}

impl Default for Statement {
    fn default() -> Self {
        Statement {
            subject: Resource::Blank(BlankNode::new("")),
            predicate: Iri::new(""),
            object: Term::Blank(BlankNode::new("")),
            context: None,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = &self.context {
            write!(
                f,
                "{} {} {} {} .",
                self.subject, self.predicate, self.object, context
            )
        } else {
            write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
        }
    }
}
