//! RDF value model and canonical encoding

pub mod codec;
mod types;

pub use types::{BlankNode, Iri, Literal, Resource, Statement, Term};
