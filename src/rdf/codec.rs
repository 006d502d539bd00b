//! Canonical string encoding of RDF values
//!
//! The wire form used in edge keys is a single prefix character, the space
//! separator, and the payload:
//!
//! ```text
//! U <iri>                IRI
//! B <id>                 blank node
//! P <label>              plain literal
//! L <lang> <label>       language-tagged literal
//! T <datatype> <label>   typed literal
//! N                      null context sentinel (context position only)
//! ```
//!
//! Encoding is injective: language tags contain no spaces (RFC 5646) and
//! datatype IRIs contain no spaces (RFC 3986), so splitting the payload at
//! its first space recovers the parts even when labels contain spaces.

use super::types::{BlankNode, Iri, Literal, Resource, Term};
use crate::error::{SailError, SailResult};

/// Separator between the prefix character and the payload, and between
/// payload parts
pub const SEPARATOR: char = ' ';

pub const IRI_PREFIX: char = 'U';
pub const BLANK_NODE_PREFIX: char = 'B';
pub const PLAIN_LITERAL_PREFIX: char = 'P';
pub const LANGUAGE_LITERAL_PREFIX: char = 'L';
pub const TYPED_LITERAL_PREFIX: char = 'T';
pub const NULL_CONTEXT_PREFIX: char = 'N';

/// The encoding of the null (default-graph) context
pub const NULL_CONTEXT: &str = "N";

/// Encode a term into its canonical string form
pub fn encode(term: &Term) -> String {
    match term {
        Term::Iri(iri) => format!("{}{}{}", IRI_PREFIX, SEPARATOR, iri.as_str()),
        Term::Blank(node) => format!("{}{}{}", BLANK_NODE_PREFIX, SEPARATOR, node.as_str()),
        Term::Literal(literal) => encode_literal(literal),
    }
}

fn encode_literal(literal: &Literal) -> String {
    if let Some(datatype) = literal.datatype() {
        format!(
            "{}{}{}{}{}",
            TYPED_LITERAL_PREFIX,
            SEPARATOR,
            datatype.as_str(),
            SEPARATOR,
            literal.label()
        )
    } else if let Some(language) = literal.language() {
        format!(
            "{}{}{}{}{}",
            LANGUAGE_LITERAL_PREFIX,
            SEPARATOR,
            language,
            SEPARATOR,
            literal.label()
        )
    } else {
        format!(
            "{}{}{}",
            PLAIN_LITERAL_PREFIX,
            SEPARATOR,
            literal.label()
        )
    }
}

/// Encode a resource into its canonical string form
pub fn encode_resource(resource: &Resource) -> String {
    match resource {
        Resource::Iri(iri) => format!("{}{}{}", IRI_PREFIX, SEPARATOR, iri.as_str()),
        Resource::Blank(node) => format!("{}{}{}", BLANK_NODE_PREFIX, SEPARATOR, node.as_str()),
    }
}

/// Encode an optional context, mapping the default graph to the sentinel
pub fn encode_context(context: Option<&Resource>) -> String {
    match context {
        Some(resource) => encode_resource(resource),
        None => NULL_CONTEXT.to_string(),
    }
}

/// Decode a canonical string back into a term
pub fn decode(encoded: &str) -> SailResult<Term> {
    let mut chars = encoded.chars();
    let prefix = chars
        .next()
        .ok_or_else(|| malformed(encoded, "empty string"))?;
    let rest = chars.as_str();

    let payload = match rest.strip_prefix(SEPARATOR) {
        Some(payload) => payload,
        None => return Err(malformed(encoded, "missing separator after prefix")),
    };

    match prefix {
        IRI_PREFIX => Ok(Term::Iri(Iri::new(payload))),
        BLANK_NODE_PREFIX => Ok(Term::Blank(BlankNode::new(payload))),
        PLAIN_LITERAL_PREFIX => Ok(Term::Literal(Literal::plain(payload))),
        LANGUAGE_LITERAL_PREFIX => {
            let (language, label) = split_payload(encoded, payload)?;
            Ok(Term::Literal(Literal::with_language(label, language)))
        }
        TYPED_LITERAL_PREFIX => {
            let (datatype, label) = split_payload(encoded, payload)?;
            Ok(Term::Literal(Literal::typed(label, Iri::new(datatype))))
        }
        _ => Err(malformed(encoded, "unknown prefix")),
    }
}

/// Decode a canonical string that must denote a resource
pub fn decode_resource(encoded: &str) -> SailResult<Resource> {
    match decode(encoded)? {
        Term::Iri(iri) => Ok(Resource::Iri(iri)),
        Term::Blank(node) => Ok(Resource::Blank(node)),
        Term::Literal(_) => Err(malformed(encoded, "literal in resource position")),
    }
}

/// Decode a context encoding, mapping the sentinel back to the default graph
pub fn decode_context(encoded: &str) -> SailResult<Option<Resource>> {
    if encoded == NULL_CONTEXT {
        Ok(None)
    } else {
        decode_resource(encoded).map(Some)
    }
}

fn split_payload<'a>(encoded: &str, payload: &'a str) -> SailResult<(&'a str, &'a str)> {
    payload
        .split_once(SEPARATOR)
        .ok_or_else(|| malformed(encoded, "missing separator in payload"))
}

fn malformed(encoded: &str, reason: &str) -> SailError {
    SailError::MalformedEncoding(format!("{} in {:?}", reason, encoded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_forms() {
        assert_eq!(
            encode(&Term::Iri(Iri::new("http://example.org/a"))),
            "U http://example.org/a"
        );
        assert_eq!(encode(&Term::Blank(BlankNode::new("b1"))), "B b1");
        assert_eq!(encode(&Term::Literal(Literal::plain("hi there"))), "P hi there");
        assert_eq!(
            encode(&Term::Literal(Literal::with_language("hello", "en"))),
            "L en hello"
        );
        assert_eq!(
            encode(&Term::Literal(Literal::typed(
                "5",
                Iri::new("http://www.w3.org/2001/XMLSchema#int")
            ))),
            "T http://www.w3.org/2001/XMLSchema#int 5"
        );
    }

    #[test]
    fn test_encode_context() {
        assert_eq!(encode_context(None), "N");
        assert_eq!(
            encode_context(Some(&Resource::Iri(Iri::new("x:g")))),
            "U x:g"
        );
    }

    // Round trip over a corpus of values, including labels with spaces and
    // empty labels.
    #[test]
    fn test_decode_round_trip() {
        let labels = ["", "x", "hello world", "a b c", " leading", "trailing "];
        let languages = ["en", "en-US", "de"];
        let datatypes = [
            "http://www.w3.org/2001/XMLSchema#int",
            "http://www.w3.org/2001/XMLSchema#string",
            "urn:custom:type",
        ];

        let mut corpus: Vec<Term> = Vec::new();
        for label in labels {
            corpus.push(Term::Iri(Iri::new(format!("http://example.org/{}", label))));
            corpus.push(Term::Blank(BlankNode::new(label)));
            corpus.push(Term::Literal(Literal::plain(label)));
            for language in languages {
                corpus.push(Term::Literal(Literal::with_language(label, language)));
            }
            for datatype in datatypes {
                corpus.push(Term::Literal(Literal::typed(label, Iri::new(datatype))));
            }
        }

        for term in corpus {
            let encoded = encode(&term);
            let decoded = decode(&encoded).unwrap();
            assert_eq!(decoded, term, "round trip failed for {}", encoded);
        }
    }

    #[test]
    fn test_decode_rejects_malformed() {
        for bad in ["", "X foo", "U", "Ufoo", "L en", "T x", "N"] {
            assert!(
                matches!(decode(bad), Err(SailError::MalformedEncoding(_))),
                "expected malformed for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_decode_context_sentinel() {
        assert_eq!(decode_context("N").unwrap(), None);
        assert_eq!(
            decode_context("U x:g").unwrap(),
            Some(Resource::Iri(Iri::new("x:g")))
        );
        assert!(decode_context("P literal").is_err());
    }

    #[test]
    fn test_language_literal_label_with_spaces() {
        let term = Term::Literal(Literal::with_language("good morning world", "en"));
        assert_eq!(encode(&term), "L en good morning world");
        assert_eq!(decode("L en good morning world").unwrap(), term);
    }
}
