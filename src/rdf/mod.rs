//! Minimal RDF model and codecs.
//!
//! The sync engine only needs a handful of graph operations: parse a
//! representation, look up objects by predicate, drop statements, and
//! write the remainder back out. This module provides exactly that:
//!
//! - [`Term`], [`Literal`], [`Triple`] and [`Graph`]
//! - [`RdfFormat`], selected from a media type, with N-Triples and
//!   JSON-LD codecs

mod jsonld;
mod ntriples;
pub mod vocab;

use std::collections::HashSet;
use std::fmt;

/// An RDF term.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    /// An IRI, stored without angle brackets.
    Iri(String),
    /// A blank node label, stored without the `_:` prefix.
    BlankNode(String),
    /// A literal value.
    Literal(Literal),
}

impl Term {
    /// Shorthand for an IRI term.
    pub fn iri(value: impl Into<String>) -> Self {
        Self::Iri(value.into())
    }

    /// The IRI, if this term is one.
    #[must_use]
    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Self::Iri(iri) => Some(iri),
            _ => None,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iri(iri) => write!(f, "<{iri}>"),
            Self::BlankNode(label) => write!(f, "_:{label}"),
            Self::Literal(lit) => write!(f, "{lit}"),
        }
    }
}

/// A literal with an optional datatype or language tag.
///
/// Plain strings carry neither: `xsd:string` is normalized away on parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal {
    pub value: String,
    pub datatype: Option<String>,
    pub language: Option<String>,
}

impl Literal {
    /// A plain string literal.
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: None,
            language: None,
        }
    }

    /// A typed literal. `xsd:string` collapses to a plain literal.
    pub fn typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        let datatype = datatype.into();
        Self {
            value: value.into(),
            datatype: (datatype != vocab::XSD_STRING).then_some(datatype),
            language: None,
        }
    }

    /// A language-tagged literal.
    pub fn tagged(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: None,
            language: Some(language.into()),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.value)?;
        if let Some(lang) = &self.language {
            write!(f, "@{lang}")
        } else if let Some(dt) = &self.datatype {
            write!(f, "^^<{dt}>")
        } else {
            Ok(())
        }
    }
}

/// A single statement. Predicates are always IRIs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Triple {
    pub subject: Term,
    pub predicate: String,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: Term, predicate: impl Into<String>, object: Term) -> Self {
        Self {
            subject,
            predicate: predicate.into(),
            object,
        }
    }
}

/// An insertion-ordered set of triples.
#[derive(Clone, Default)]
pub struct Graph {
    triples: Vec<Triple>,
    index: HashSet<Triple>,
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.triples).finish()
    }
}

impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        self.triples == other.triples
    }
}

impl Eq for Graph {}

impl Graph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a triple unless an identical one is already present.
    pub fn insert(&mut self, triple: Triple) -> bool {
        if self.index.contains(&triple) {
            return false;
        }
        self.index.insert(triple.clone());
        self.triples.push(triple);
        true
    }

    #[must_use]
    pub fn contains(&self, triple: &Triple) -> bool {
        self.index.contains(triple)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    /// Objects of every statement with the given predicate.
    pub fn objects_of<'a>(&'a self, predicate: &'a str) -> impl Iterator<Item = &'a Term> + 'a {
        self.triples
            .iter()
            .filter(move |t| t.predicate == predicate)
            .map(|t| &t.object)
    }

    /// Remove every statement matching `pred`, returning how many were removed.
    pub fn remove_where(&mut self, mut pred: impl FnMut(&Triple) -> bool) -> usize {
        let before = self.triples.len();
        let index = &mut self.index;
        self.triples.retain(|t| {
            let remove = pred(t);
            if remove {
                index.remove(t);
            }
            !remove
        });
        before - self.triples.len()
    }
}

impl FromIterator<Triple> for Graph {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        let mut graph = Self::new();
        for triple in iter {
            graph.insert(triple);
        }
        graph
    }
}

impl<'a> IntoIterator for &'a Graph {
    type Item = &'a Triple;
    type IntoIter = std::slice::Iter<'a, Triple>;

    fn into_iter(self) -> Self::IntoIter {
        self.triples.iter()
    }
}

/// RDF parse and serialization errors.
#[derive(Debug, thiserror::Error)]
pub enum RdfError {
    /// The media type has no codec.
    #[error("Unsupported RDF language: {0}")]
    UnsupportedMediaType(String),

    /// N-Triples syntax error.
    #[error("N-Triples syntax error at line {line}: {message}")]
    Syntax {
        /// Line number (1-indexed).
        line: usize,
        /// Error message.
        message: String,
    },

    /// The document is valid JSON but not JSON-LD this codec understands.
    #[error("Invalid JSON-LD: {0}")]
    JsonLd(String),

    /// Malformed JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Input is not UTF-8.
    #[error("RDF input is not valid UTF-8")]
    Utf8(#[from] std::str::Utf8Error),
}

/// RDF serializations with a codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdfFormat {
    /// `application/n-triples`
    NTriples,
    /// `application/ld+json`
    JsonLd,
}

impl RdfFormat {
    /// Resolve a media type, ignoring parameters and case.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedMediaType` for anything other than N-Triples or JSON-LD.
    pub fn from_media_type(media_type: &str) -> Result<Self, RdfError> {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "application/n-triples" => Ok(Self::NTriples),
            "application/ld+json" => Ok(Self::JsonLd),
            _ => Err(RdfError::UnsupportedMediaType(media_type.to_string())),
        }
    }

    /// Canonical media type, used for `Accept` and `Content-Type`.
    #[must_use]
    pub const fn media_type(self) -> &'static str {
        match self {
            Self::NTriples => "application/n-triples",
            Self::JsonLd => "application/ld+json",
        }
    }

    /// File extension used when no explicit one is configured.
    #[must_use]
    pub const fn default_extension(self) -> &'static str {
        match self {
            Self::NTriples => ".nt",
            Self::JsonLd => ".jsonld",
        }
    }

    /// Parse a serialized graph.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not valid in this format.
    pub fn parse(self, input: &[u8]) -> Result<Graph, RdfError> {
        match self {
            Self::NTriples => ntriples::parse(std::str::from_utf8(input)?),
            Self::JsonLd => jsonld::parse(input),
        }
    }

    /// Serialize a graph.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn serialize(self, graph: &Graph) -> Result<Vec<u8>, RdfError> {
        match self {
            Self::NTriples => Ok(ntriples::serialize(graph).into_bytes()),
            Self::JsonLd => jsonld::serialize(graph),
        }
    }
}

impl fmt::Display for RdfFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.media_type())
    }
}
