//! JSON-LD codec.
//!
//! Reads expanded documents and documents with an inline `@context`
//! (prefixes, terms, `@vocab`, `@type: @id` coercion). Remote contexts,
//! lists and reverse properties are rejected. Writes expanded form with
//! one node object per subject.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde_json::{Map, Value};

use super::{vocab, Graph, Literal, RdfError, Term, Triple};

pub(super) fn parse(input: &[u8]) -> Result<Graph, RdfError> {
    let document: Value = serde_json::from_slice(input)?;
    let mut reader = Reader::default();
    collect_blank_labels(&document, &mut reader.taken);
    let context = Context::default();

    match &document {
        Value::Array(nodes) => {
            for node in nodes {
                reader.top_level(node, &context)?;
            }
        }
        Value::Object(_) => reader.top_level(&document, &context)?,
        _ => return Err(RdfError::JsonLd("document must be an object or array".into())),
    }
    Ok(reader.graph)
}

pub(super) fn serialize(graph: &Graph) -> Result<Vec<u8>, RdfError> {
    let mut nodes: BTreeMap<String, Map<String, Value>> = BTreeMap::new();

    for triple in graph {
        let id = match &triple.subject {
            Term::Iri(iri) => iri.clone(),
            Term::BlankNode(label) => format!("_:{label}"),
            Term::Literal(_) => {
                return Err(RdfError::JsonLd("literal in subject position".into()));
            }
        };
        let node = nodes.entry(id.clone()).or_insert_with(|| {
            let mut node = Map::new();
            node.insert("@id".into(), Value::String(id));
            node
        });

        let (key, value) = match (&triple.object, triple.predicate == vocab::RDF_TYPE) {
            (Term::Iri(iri), true) => ("@type".to_string(), Value::String(iri.clone())),
            (object, _) => (triple.predicate.clone(), object_value(object)),
        };
        if let Value::Array(values) = node.entry(key).or_insert_with(|| Value::Array(Vec::new())) {
            values.push(value);
        }
    }

    let document = Value::Array(nodes.into_values().map(Value::Object).collect());
    Ok(serde_json::to_vec_pretty(&document)?)
}

fn object_value(term: &Term) -> Value {
    match term {
        Term::Iri(iri) => serde_json::json!({ "@id": iri }),
        Term::BlankNode(label) => serde_json::json!({ "@id": format!("_:{label}") }),
        Term::Literal(lit) => {
            let mut value = Map::new();
            value.insert("@value".into(), Value::String(lit.value.clone()));
            if let Some(lang) = &lit.language {
                value.insert("@language".into(), Value::String(lang.clone()));
            } else if let Some(dt) = &lit.datatype {
                value.insert("@type".into(), Value::String(dt.clone()));
            }
            Value::Object(value)
        }
    }
}

#[derive(Debug, Clone)]
struct TermDefinition {
    iri: String,
    /// `@id`, `@vocab` or a datatype IRI.
    coerce: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct Context {
    vocab: Option<String>,
    terms: HashMap<String, TermDefinition>,
}

impl Context {
    /// Apply a local `@context` value on top of this one.
    fn extend(&self, value: &Value) -> Result<Self, RdfError> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Array(items) => {
                let mut ctx = self.clone();
                for item in items {
                    ctx = ctx.extend(item)?;
                }
                Ok(ctx)
            }
            Value::Object(defs) => {
                let mut ctx = self.clone();
                if let Some(v) = defs.get("@vocab") {
                    ctx.vocab = v.as_str().map(str::to_string);
                }
                for (term, def) in defs {
                    if term.starts_with('@') {
                        continue;
                    }
                    let definition = match def {
                        Value::String(iri) => TermDefinition {
                            iri: ctx.expand(iri, true),
                            coerce: None,
                        },
                        Value::Object(obj) => {
                            let iri = obj
                                .get("@id")
                                .and_then(Value::as_str)
                                .map_or_else(|| ctx.expand(term, true), |id| ctx.expand(id, true));
                            let coerce = obj
                                .get("@type")
                                .and_then(Value::as_str)
                                .map(|t| if t.starts_with('@') { t.to_string() } else { ctx.expand(t, true) });
                            TermDefinition { iri, coerce }
                        }
                        Value::Null => {
                            ctx.terms.remove(term);
                            continue;
                        }
                        _ => {
                            return Err(RdfError::JsonLd(format!("invalid definition for term '{term}'")));
                        }
                    };
                    ctx.terms.insert(term.clone(), definition);
                }
                Ok(ctx)
            }
            Value::String(url) => Err(RdfError::JsonLd(format!(
                "remote context '{url}' is not supported"
            ))),
            _ => Err(RdfError::JsonLd("invalid @context".into())),
        }
    }

    /// Expand a term, compact IRI or IRI. `vocab` selects vocabulary-relative
    /// expansion (property names and types) over document-relative (`@id`).
    fn expand(&self, value: &str, vocab: bool) -> String {
        if value.starts_with('@') {
            return value.to_string();
        }
        if vocab {
            if let Some(def) = self.terms.get(value) {
                return def.iri.clone();
            }
        }
        if let Some((prefix, suffix)) = value.split_once(':') {
            if prefix == "_" || suffix.starts_with("//") {
                return value.to_string();
            }
            if let Some(def) = self.terms.get(prefix) {
                return format!("{}{suffix}", def.iri);
            }
            return value.to_string();
        }
        match (&self.vocab, vocab) {
            (Some(base), true) => format!("{base}{value}"),
            _ => value.to_string(),
        }
    }

    fn coercion(&self, property: &str) -> Option<&str> {
        self.terms.get(property).and_then(|d| d.coerce.as_deref())
    }
}

#[derive(Default)]
struct Reader {
    graph: Graph,
    next_blank: usize,
    /// Blank node labels written in the document; generated labels avoid them.
    taken: HashSet<String>,
}

impl Reader {
    fn top_level(&mut self, value: &Value, context: &Context) -> Result<(), RdfError> {
        let Value::Object(obj) = value else {
            return Err(RdfError::JsonLd("top-level items must be node objects".into()));
        };
        // A bare {"@context": ..., "@graph": [...]} wrapper is not itself a node.
        let is_wrapper = obj.contains_key("@graph")
            && obj.keys().all(|k| k == "@context" || k == "@graph");
        if is_wrapper {
            let ctx = match obj.get("@context") {
                Some(c) => context.extend(c)?,
                None => context.clone(),
            };
            for node in as_array(&obj["@graph"]) {
                self.top_level(node, &ctx)?;
            }
            return Ok(());
        }
        self.node(obj, context).map(|_| ())
    }

    fn fresh_blank(&mut self) -> Term {
        loop {
            let label = format!("b{}", self.next_blank);
            self.next_blank += 1;
            if !self.taken.contains(&label) {
                return Term::BlankNode(label);
            }
        }
    }

    fn subject_term(&mut self, id: Option<&str>, context: &Context) -> Term {
        match id {
            Some(id) if id.starts_with("_:") => Term::BlankNode(id[2..].to_string()),
            Some(id) => Term::Iri(context.expand(id, false)),
            None => self.fresh_blank(),
        }
    }

    /// Emit the triples of a node object and return its subject.
    fn node(&mut self, obj: &Map<String, Value>, parent: &Context) -> Result<Term, RdfError> {
        let context = match obj.get("@context") {
            Some(c) => parent.extend(c)?,
            None => parent.clone(),
        };
        let subject = self.subject_term(obj.get("@id").and_then(Value::as_str), &context);

        for (key, value) in obj {
            match key.as_str() {
                "@context" | "@id" | "@index" => {}
                "@type" => {
                    for t in as_array(value) {
                        let t = t
                            .as_str()
                            .ok_or_else(|| RdfError::JsonLd("@type values must be strings".into()))?;
                        let object = if t.starts_with("_:") {
                            Term::BlankNode(t[2..].to_string())
                        } else {
                            Term::Iri(context.expand(t, true))
                        };
                        self.graph.insert(Triple::new(subject.clone(), vocab::RDF_TYPE, object));
                    }
                }
                "@graph" => {
                    for nested in as_array(value) {
                        self.top_level(nested, &context)?;
                    }
                }
                "@reverse" | "@list" | "@set" => {
                    return Err(RdfError::JsonLd(format!("{key} is not supported")));
                }
                k if k.starts_with('@') => {}
                property => {
                    let predicate = context.expand(property, true);
                    // Terms that expand to neither an IRI nor a blank node are dropped.
                    if !predicate.contains(':') {
                        continue;
                    }
                    let coerce = context.coercion(property).map(str::to_string);
                    for item in as_array(value) {
                        if let Some(object) = self.value(item, coerce.as_deref(), &context)? {
                            self.graph.insert(Triple::new(subject.clone(), predicate.clone(), object));
                        }
                    }
                }
            }
        }
        Ok(subject)
    }

    fn value(
        &mut self,
        item: &Value,
        coerce: Option<&str>,
        context: &Context,
    ) -> Result<Option<Term>, RdfError> {
        let term = match item {
            Value::Null => return Ok(None),
            Value::String(s) => match coerce {
                Some("@id") => Some(self.subject_term(Some(s), context)),
                Some("@vocab") => Some(Term::Iri(context.expand(s, true))),
                Some(datatype) => Some(Term::Literal(Literal::typed(s.clone(), datatype))),
                None => Some(Term::Literal(Literal::plain(s.clone()))),
            },
            Value::Bool(b) => Some(Term::Literal(Literal::typed(b.to_string(), vocab::XSD_BOOLEAN))),
            Value::Number(n) => {
                let datatype = if n.is_f64() { vocab::XSD_DOUBLE } else { vocab::XSD_INTEGER };
                Some(Term::Literal(Literal::typed(n.to_string(), datatype)))
            }
            Value::Array(_) => return Err(RdfError::JsonLd("nested arrays are not supported".into())),
            Value::Object(obj) => {
                if let Some(v) = obj.get("@value") {
                    let lexical = match v {
                        Value::String(s) => s.clone(),
                        Value::Null => return Ok(None),
                        other => other.to_string(),
                    };
                    let literal = if let Some(lang) = obj.get("@language").and_then(Value::as_str) {
                        Literal::tagged(lexical, lang)
                    } else if let Some(dt) = obj.get("@type").and_then(Value::as_str) {
                        Literal::typed(lexical, context.expand(dt, true))
                    } else if let Some(datatype) = coerce.filter(|c| !c.starts_with('@')) {
                        Literal::typed(lexical, datatype)
                    } else {
                        Literal::plain(lexical)
                    };
                    Some(Term::Literal(literal))
                } else if obj.contains_key("@list") {
                    return Err(RdfError::JsonLd("@list is not supported".into()));
                } else if obj.len() == 1 && obj.contains_key("@id") {
                    let id = obj["@id"].as_str();
                    Some(self.subject_term(id, context))
                } else {
                    Some(self.node(obj, context)?)
                }
            }
        };
        Ok(term)
    }
}

/// Every `_:` label appearing as a string anywhere in the document.
fn collect_blank_labels(value: &Value, labels: &mut HashSet<String>) {
    match value {
        Value::String(s) => {
            if let Some(label) = s.strip_prefix("_:") {
                labels.insert(label.to_string());
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_blank_labels(item, labels);
            }
        }
        Value::Object(obj) => {
            for item in obj.values() {
                collect_blank_labels(item, labels);
            }
        }
        _ => {}
    }
}

fn as_array(value: &Value) -> &[Value] {
    match value {
        Value::Array(items) => items,
        other => std::slice::from_ref(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_expanded_fedora_output() {
        let input = br#"[{
            "@id": "http://localhost:8080/rest/foo",
            "@type": ["http://www.w3.org/ns/ldp#Container", "http://fedora.info/definitions/v4/repository#Resource"],
            "http://www.w3.org/ns/ldp#contains": [{"@id": "http://localhost:8080/rest/foo/bar"}],
            "http://purl.org/dc/terms/title": [{"@value": "Foo", "@language": "en"}],
            "http://fedora.info/definitions/v4/repository#created": [
                {"@value": "2016-08-29T00:00:00Z", "@type": "http://www.w3.org/2001/XMLSchema#dateTime"}
            ]
        }]"#;

        let graph = parse(input).unwrap();
        assert_eq!(graph.len(), 5);
        let children: Vec<_> = graph.objects_of(vocab::LDP_CONTAINS).collect();
        assert_eq!(children, vec![&Term::iri("http://localhost:8080/rest/foo/bar")]);
        let title: Vec<_> = graph.objects_of("http://purl.org/dc/terms/title").collect();
        assert_eq!(title, vec![&Term::Literal(Literal::tagged("Foo", "en"))]);
    }

    #[test]
    fn test_parse_inline_context() {
        let input = br#"{
            "@context": {
                "dc": "http://purl.org/dc/terms/",
                "contains": {"@id": "http://www.w3.org/ns/ldp#contains", "@type": "@id"}
            },
            "@id": "http://localhost:8080/rest/foo",
            "dc:title": "Foo",
            "contains": ["http://localhost:8080/rest/foo/a", "http://localhost:8080/rest/foo/b"],
            "unmapped": "dropped"
        }"#;

        let graph = parse(input).unwrap();
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.objects_of(vocab::LDP_CONTAINS).count(), 2);
        let title: Vec<_> = graph.objects_of("http://purl.org/dc/terms/title").collect();
        assert_eq!(title, vec![&Term::Literal(Literal::plain("Foo"))]);
    }

    #[test]
    fn test_remote_context_rejected() {
        let input = br#"{"@context": "http://schema.org/", "@id": "http://ex/a"}"#;
        assert!(matches!(parse(input), Err(RdfError::JsonLd(_))));
    }

    #[test]
    fn test_anonymous_node_does_not_merge_with_labelled_node() {
        let input = br#"[
            {"@id": "http://ex/a", "http://ex/p": [{"http://ex/q": [{"@value": "anonymous"}]}]},
            {"@id": "_:b0", "http://ex/q": [{"@value": "labelled"}]}
        ]"#;
        let graph = parse(input).unwrap();

        let subjects: Vec<&Term> = graph
            .iter()
            .filter(|t| t.predicate == "http://ex/q")
            .map(|t| &t.subject)
            .collect();
        assert_eq!(subjects.len(), 2);
        assert_ne!(subjects[0], subjects[1]);
        assert!(subjects.contains(&&Term::BlankNode("b0".to_string())));
    }

    #[test]
    fn test_serialize_then_parse_preserves_graph() {
        let graph: Graph = [
            Triple::new(Term::iri("http://ex/a"), vocab::RDF_TYPE, Term::iri("http://ex/Thing")),
            Triple::new(
                Term::iri("http://ex/a"),
                "http://ex/size",
                Term::Literal(Literal::typed("3", vocab::XSD_INTEGER)),
            ),
            Triple::new(Term::iri("http://ex/a"), "http://ex/part", Term::BlankNode("x".into())),
        ]
        .into_iter()
        .collect();

        let bytes = serialize(&graph).unwrap();
        let reparsed = parse(&bytes).unwrap();
        assert_eq!(reparsed.len(), graph.len());
        for triple in &graph {
            assert!(reparsed.contains(triple), "missing {triple:?}");
        }
    }
}
