//! N-Triples codec.

use std::fmt::Write as _;

use super::{Graph, Literal, RdfError, Term, Triple};

pub(super) fn parse(input: &str) -> Result<Graph, RdfError> {
    let mut graph = Graph::new();
    for (idx, line) in input.lines().enumerate() {
        let mut cursor = Cursor {
            line: idx + 1,
            rest: line,
        };
        cursor.skip_ws();
        if cursor.at_end_or_comment() {
            continue;
        }

        let subject = match cursor.peek() {
            Some('<') => Term::Iri(cursor.iri()?),
            Some('_') => Term::BlankNode(cursor.blank_node()?),
            _ => return Err(cursor.error("expected subject IRI or blank node")),
        };
        cursor.skip_ws();
        let predicate = match cursor.peek() {
            Some('<') => cursor.iri()?,
            _ => return Err(cursor.error("expected predicate IRI")),
        };
        cursor.skip_ws();
        let object = match cursor.peek() {
            Some('<') => Term::Iri(cursor.iri()?),
            Some('_') => Term::BlankNode(cursor.blank_node()?),
            Some('"') => Term::Literal(cursor.literal()?),
            _ => return Err(cursor.error("expected object")),
        };
        cursor.skip_ws();
        if !cursor.eat('.') {
            return Err(cursor.error("expected '.'"));
        }
        cursor.skip_ws();
        if !cursor.at_end_or_comment() {
            return Err(cursor.error("unexpected content after '.'"));
        }

        graph.insert(Triple::new(subject, predicate, object));
    }
    Ok(graph)
}

pub(super) fn serialize(graph: &Graph) -> String {
    let mut out = String::new();
    for triple in graph {
        write_term(&mut out, &triple.subject);
        out.push(' ');
        write_iri(&mut out, &triple.predicate);
        out.push(' ');
        write_term(&mut out, &triple.object);
        out.push_str(" .\n");
    }
    out
}

fn write_term(out: &mut String, term: &Term) {
    match term {
        Term::Iri(iri) => write_iri(out, iri),
        Term::BlankNode(label) => {
            out.push_str("_:");
            out.push_str(label);
        }
        Term::Literal(lit) => {
            out.push('"');
            for c in lit.value.chars() {
                match c {
                    '"' => out.push_str("\\\""),
                    '\\' => out.push_str("\\\\"),
                    '\n' => out.push_str("\\n"),
                    '\r' => out.push_str("\\r"),
                    '\t' => out.push_str("\\t"),
                    c if c.is_control() => {
                        let _ = write!(out, "\\u{:04X}", c as u32);
                    }
                    c => out.push(c),
                }
            }
            out.push('"');
            if let Some(lang) = &lit.language {
                out.push('@');
                out.push_str(lang);
            } else if let Some(dt) = &lit.datatype {
                out.push_str("^^");
                write_iri(out, dt);
            }
        }
    }
}

fn write_iri(out: &mut String, iri: &str) {
    out.push('<');
    for c in iri.chars() {
        match c {
            '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c if c <= ' ' => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('>');
}

struct Cursor<'a> {
    line: usize,
    rest: &'a str,
}

impl Cursor<'_> {
    fn error(&self, message: &str) -> RdfError {
        RdfError::Syntax {
            line: self.line,
            message: message.to_string(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.rest.chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.rest = &self.rest[c.len_utf8()..];
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start_matches([' ', '\t', '\r']);
    }

    fn at_end_or_comment(&self) -> bool {
        self.rest.is_empty() || self.rest.starts_with('#')
    }

    fn iri(&mut self) -> Result<String, RdfError> {
        self.bump();
        let mut iri = String::new();
        loop {
            match self.bump() {
                Some('>') => return Ok(iri),
                Some('\\') => iri.push(self.unicode_escape()?),
                Some(c) if c == ' ' || c == '<' || c == '"' => {
                    return Err(self.error("invalid character in IRI"));
                }
                Some(c) => iri.push(c),
                None => return Err(self.error("unterminated IRI")),
            }
        }
    }

    fn blank_node(&mut self) -> Result<String, RdfError> {
        if !self.rest.starts_with("_:") {
            return Err(self.error("expected '_:'"));
        }
        self.rest = &self.rest[2..];
        let mut label = String::new();
        while let Some(c) = self.peek() {
            let continues = c.is_alphanumeric()
                || matches!(c, '_' | '-' | ':')
                || (c == '.' && self.rest[1..].starts_with(|n: char| n.is_alphanumeric()));
            if !continues {
                break;
            }
            label.push(c);
            self.bump();
        }
        if label.is_empty() {
            return Err(self.error("empty blank node label"));
        }
        Ok(label)
    }

    fn literal(&mut self) -> Result<Literal, RdfError> {
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('"') => break,
                Some('\\') => {
                    let c = match self.peek() {
                        Some('t') => '\t',
                        Some('b') => '\u{8}',
                        Some('n') => '\n',
                        Some('r') => '\r',
                        Some('f') => '\u{c}',
                        Some('"') => '"',
                        Some('\'') => '\'',
                        Some('\\') => '\\',
                        Some('u' | 'U') => {
                            value.push(self.unicode_escape()?);
                            continue;
                        }
                        _ => return Err(self.error("invalid escape in literal")),
                    };
                    self.bump();
                    value.push(c);
                }
                Some(c) => value.push(c),
                None => return Err(self.error("unterminated literal")),
            }
        }

        if self.eat('@') {
            let mut lang = String::new();
            while let Some(c) = self.peek().filter(|c| c.is_ascii_alphanumeric() || *c == '-') {
                lang.push(c);
                self.bump();
            }
            if lang.is_empty() {
                return Err(self.error("empty language tag"));
            }
            return Ok(Literal::tagged(value, lang));
        }
        if self.rest.starts_with("^^") {
            self.rest = &self.rest[2..];
            if self.peek() != Some('<') {
                return Err(self.error("expected datatype IRI"));
            }
            let datatype = self.iri()?;
            return Ok(Literal::typed(value, datatype));
        }
        Ok(Literal::plain(value))
    }

    /// Decode `uXXXX` / `UXXXXXXXX` after a consumed backslash.
    fn unicode_escape(&mut self) -> Result<char, RdfError> {
        let width = match self.bump() {
            Some('u') => 4,
            Some('U') => 8,
            _ => return Err(self.error("invalid escape")),
        };
        if self.rest.len() < width || !self.rest.is_char_boundary(width) {
            return Err(self.error("truncated unicode escape"));
        }
        let (hex, rest) = self.rest.split_at(width);
        let code = u32::from_str_radix(hex, 16).map_err(|_| self.error("invalid unicode escape"))?;
        self.rest = rest;
        char::from_u32(code).ok_or_else(|| self.error("invalid code point"))
    }
}
