//! Removal of server-managed statements before replay.
//!
//! The repository rejects PUTs that try to set properties it manages
//! itself, so imported graphs are stripped of them first.

use reqwest::Url;
use tracing::debug;

use crate::rdf::vocab::{
    JCR_XML_EXPORT_SUFFIX, LDP_CONTAINS, PREMIS_HAS_MESSAGE_DIGEST, PREMIS_HAS_SIZE, RDF_TYPE,
    REPOSITORY_NAMESPACE,
};
use crate::rdf::{Graph, Term, Triple};

/// A named statement pattern that is never replayed.
pub struct ExclusionRule {
    pub name: &'static str,
    matches: fn(&Triple) -> bool,
}

impl ExclusionRule {
    #[must_use]
    pub fn matches(&self, triple: &Triple) -> bool {
        (self.matches)(triple)
    }
}

impl std::fmt::Debug for ExclusionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExclusionRule").field("name", &self.name).finish()
    }
}

/// Every rule applied by [`sanitize`].
pub const EXCLUSION_RULES: &[ExclusionRule] = &[
    ExclusionRule {
        name: "repository-predicate",
        matches: |t| t.predicate.starts_with(REPOSITORY_NAMESPACE),
    },
    ExclusionRule {
        name: "containment",
        matches: |t| t.predicate == LDP_CONTAINS,
    },
    ExclusionRule {
        name: "message-digest",
        matches: |t| t.predicate == PREMIS_HAS_MESSAGE_DIGEST,
    },
    ExclusionRule {
        name: "size",
        matches: |t| t.predicate == PREMIS_HAS_SIZE,
    },
    ExclusionRule {
        name: "jcr-export-subject",
        matches: |t| matches!(&t.subject, Term::Iri(s) if s.ends_with(JCR_XML_EXPORT_SUFFIX)),
    },
    ExclusionRule {
        name: "repository-type",
        matches: |t| {
            t.predicate == RDF_TYPE
                && t.object
                    .as_iri()
                    .is_some_and(|o| o.starts_with(REPOSITORY_NAMESPACE))
        },
    },
];

/// Strip server-managed statements from the graph of `resource`.
///
/// Returns the number of statements removed.
pub fn sanitize(graph: &mut Graph, resource: &Url) -> usize {
    let removed = graph.remove_where(|t| EXCLUSION_RULES.iter().any(|rule| rule.matches(t)));
    debug!(%resource, removed, remaining = graph.len(), "Sanitized graph");
    removed
}
