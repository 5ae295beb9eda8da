//! Repository client.
//!
//! The sync engine talks to the repository through [`RepositoryClient`],
//! a blocking GET/HEAD/PUT capability over URIs with content negotiation.
//! [`HttpClient`] is the production implementation.

mod http;

#[cfg(test)]
pub mod memory;

pub use http::{HttpClient, DEFAULT_TIMEOUT};

use std::io::{self, Cursor, Read};

use reqwest::Url;

/// Transport-level failures. Status codes are not errors here.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request could not be sent or the response could not be read.
    #[error("Request to {uri} failed: {message}")]
    Request { uri: String, message: String },

    /// The async runtime backing the blocking client could not start.
    #[error("Failed to start HTTP runtime: {0}")]
    Runtime(#[source] io::Error),

    /// The HTTP client could not be configured.
    #[error("Failed to build HTTP client: {0}")]
    Build(String),
}

impl ClientError {
    pub(crate) fn request(uri: &Url, err: impl std::fmt::Display) -> Self {
        Self::Request {
            uri: uri.to_string(),
            message: err.to_string(),
        }
    }
}

/// Result type for client operations.
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// A repository response. The body is consumed at most once.
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Box<dyn Read + Send>,
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

impl Response {
    /// Create a response with an in-memory body.
    #[must_use]
    pub fn from_bytes(status: u16, body: Vec<u8>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Box::new(Cursor::new(body)),
        }
    }

    /// Add a header.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Whether the status is 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// All values of a header, matched case-insensitively.
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Targets of every `Link` header entry with the given relation.
    #[must_use]
    pub fn links(&self, rel: &str) -> Vec<String> {
        self.header_values("link")
            .flat_map(parse_link_header)
            .filter(|(_, rels)| rels.split_whitespace().any(|r| r.eq_ignore_ascii_case(rel)))
            .map(|(target, _)| target)
            .collect()
    }

    /// Read the whole body.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be read.
    pub fn into_bytes(mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.body.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

/// Blocking access to an LDP repository.
pub trait RepositoryClient {
    /// GET a resource, optionally negotiating the representation.
    ///
    /// # Errors
    ///
    /// Returns an error only when no response was obtained.
    fn get(&self, uri: &Url, accept: Option<&str>) -> ClientResult<Response>;

    /// HEAD a resource.
    ///
    /// # Errors
    ///
    /// Returns an error only when no response was obtained.
    fn head(&self, uri: &Url) -> ClientResult<Response>;

    /// PUT a body with the given content type.
    ///
    /// # Errors
    ///
    /// Returns an error only when no response was obtained.
    fn put(&self, uri: &Url, body: Vec<u8>, content_type: &str) -> ClientResult<Response>;
}

/// Split a `Link` header into `(target, rel)` pairs.
///
/// Handles several comma-separated links per header and quoted or bare
/// `rel` parameters; entries without a `rel` are dropped.
fn parse_link_header(value: &str) -> Vec<(String, String)> {
    let mut links = Vec::new();
    let mut rest = value;

    while let Some(start) = rest.find('<') {
        let Some(end) = rest[start..].find('>') else {
            break;
        };
        let target = rest[start + 1..start + end].trim().to_string();
        rest = &rest[start + end + 1..];

        // Parameters run until the next link, i.e. a comma outside quotes.
        let mut in_quotes = false;
        let params_end = rest
            .char_indices()
            .find(|&(_, c)| {
                if c == '"' {
                    in_quotes = !in_quotes;
                }
                c == ',' && !in_quotes
            })
            .map_or(rest.len(), |(i, _)| i);
        let params = &rest[..params_end];
        rest = &rest[params_end..];

        let rel = params.split(';').find_map(|param| {
            let (key, val) = param.split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case("rel")
                .then(|| val.trim().trim_matches('"').to_string())
        });
        if let Some(rel) = rel {
            links.push((target, rel));
        }
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_links_multiple_per_header() {
        let response = Response::from_bytes(200, Vec::new()).with_header(
            "Link",
            "<http://www.w3.org/ns/ldp#NonRDFSource>;rel=\"type\", \
             <http://localhost:8080/rest/img/fcr:metadata>; rel=\"describedby\"",
        );

        assert_eq!(
            response.links("describedby"),
            vec!["http://localhost:8080/rest/img/fcr:metadata".to_string()]
        );
        assert_eq!(
            response.links("type"),
            vec!["http://www.w3.org/ns/ldp#NonRDFSource".to_string()]
        );
    }

    #[test]
    fn test_links_across_headers_and_bare_rel() {
        let response = Response::from_bytes(200, Vec::new())
            .with_header("link", "<http://ex/a>; rel=describedby")
            .with_header("LINK", "<http://ex/b>; rel=\"describedby alternate\"");

        assert_eq!(
            response.links("describedby"),
            vec!["http://ex/a".to_string(), "http://ex/b".to_string()]
        );
        assert!(response.links("next").is_empty());
    }

    #[test]
    fn test_is_success() {
        assert!(Response::from_bytes(204, Vec::new()).is_success());
        assert!(!Response::from_bytes(404, Vec::new()).is_success());
    }

    #[test]
    fn test_into_bytes() {
        let response = Response::from_bytes(200, b"hello".to_vec());
        assert_eq!(response.into_bytes().unwrap(), b"hello");
    }
}
