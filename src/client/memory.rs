//! In-memory repository for tests.

use std::cell::RefCell;
use std::collections::HashMap;

use reqwest::Url;

use super::{ClientError, ClientResult, RepositoryClient, Response};

#[derive(Debug, Clone, Default)]
struct Stored {
    /// Representations keyed by media type; `None` answers any Accept.
    bodies: HashMap<Option<String>, Vec<u8>>,
    headers: Vec<(String, String)>,
}

/// Serves canned representations and records PUTs.
#[derive(Default)]
pub struct MemoryClient {
    resources: HashMap<String, Stored>,
    failing: Vec<String>,
    put_status: Option<u16>,
    pub requests: RefCell<Vec<(String, String)>>,
    pub puts: RefCell<Vec<(String, String, Vec<u8>)>>,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for GETs of `uri` with the given Accept.
    pub fn with_representation(mut self, uri: &str, accept: Option<&str>, body: &[u8]) -> Self {
        self.resources
            .entry(uri.to_string())
            .or_default()
            .bodies
            .insert(accept.map(str::to_string), body.to_vec());
        self
    }

    /// Attach a header to every response for `uri`.
    pub fn with_header(mut self, uri: &str, name: &str, value: &str) -> Self {
        self.resources
            .entry(uri.to_string())
            .or_default()
            .headers
            .push((name.to_string(), value.to_string()));
        self
    }

    /// Fail every request to `uri` at the transport level.
    pub fn with_failure(mut self, uri: &str) -> Self {
        self.failing.push(uri.to_string());
        self
    }

    /// Answer PUTs with this status instead of 201.
    pub fn with_put_status(mut self, status: u16) -> Self {
        self.put_status = Some(status);
        self
    }

    pub fn request_count(&self, method: &str, uri: &str) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|(m, u)| m == method && u == uri)
            .count()
    }

    fn record(&self, method: &str, uri: &Url) -> ClientResult<()> {
        self.requests
            .borrow_mut()
            .push((method.to_string(), uri.to_string()));
        if self.failing.iter().any(|f| f == uri.as_str()) {
            return Err(ClientError::request(uri, "connection refused"));
        }
        Ok(())
    }

    fn respond(stored: &Stored, body: Vec<u8>) -> Response {
        stored
            .headers
            .iter()
            .fold(Response::from_bytes(200, body), |r, (k, v)| r.with_header(k, v))
    }
}

impl RepositoryClient for MemoryClient {
    fn get(&self, uri: &Url, accept: Option<&str>) -> ClientResult<Response> {
        self.record("GET", uri)?;
        let Some(stored) = self.resources.get(uri.as_str()) else {
            return Ok(Response::from_bytes(404, b"Not Found".to_vec()));
        };
        let body = stored
            .bodies
            .get(&accept.map(str::to_string))
            .or_else(|| stored.bodies.get(&None));
        match body {
            Some(body) => Ok(Self::respond(stored, body.clone())),
            None => Ok(Response::from_bytes(406, Vec::new())),
        }
    }

    fn head(&self, uri: &Url) -> ClientResult<Response> {
        self.record("HEAD", uri)?;
        match self.resources.get(uri.as_str()) {
            Some(stored) => Ok(Self::respond(stored, Vec::new())),
            None => Ok(Response::from_bytes(404, Vec::new())),
        }
    }

    fn put(&self, uri: &Url, body: Vec<u8>, content_type: &str) -> ClientResult<Response> {
        self.record("PUT", uri)?;
        self.puts
            .borrow_mut()
            .push((uri.to_string(), content_type.to_string(), body));
        let status = self.put_status.unwrap_or(201);
        Ok(Response::from_bytes(status, b"rejected by test".to_vec()))
    }
}
