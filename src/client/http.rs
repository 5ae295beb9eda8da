//! HTTP implementation of [`RepositoryClient`].
//!
//! Uses an async `reqwest` client driven by an owned tokio runtime, so
//! callers get a plain blocking API. Response bodies are streamed: each
//! `read` pulls the next chunk off the connection. The timeout bounds
//! connecting and each read, not the whole transfer, so large binaries
//! are not cut off. There are no retries.

use std::io::{self, Read};
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{RequestBuilder, Url};
use tokio::runtime::Handle;
use tracing::debug;

use super::{ClientError, ClientResult, RepositoryClient, Response};

/// Connect and read timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking HTTP repository client.
pub struct HttpClient {
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

impl HttpClient {
    /// Create a client that gives up when connecting, or waiting for the
    /// next piece of a response, takes longer than `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime or the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> ClientResult<Self> {
        let runtime = tokio::runtime::Runtime::new().map_err(ClientError::Runtime)?;
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;
        Ok(Self { client, runtime })
    }

    fn execute(&self, method: &str, uri: &Url, request: RequestBuilder) -> ClientResult<Response> {
        debug!(method, %uri, "Sending request");
        let response = self
            .runtime
            .block_on(request.send())
            .map_err(|e| ClientError::request(uri, e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        debug!(method, %uri, status, length = ?response.content_length(), "Received response");
        Ok(Response {
            status,
            headers,
            body: Box::new(StreamingBody {
                uri: uri.to_string(),
                response,
                handle: self.runtime.handle().clone(),
                pending: Bytes::new(),
            }),
        })
    }
}

/// Blocking reader over a response body, one chunk at a time.
struct StreamingBody {
    uri: String,
    response: reqwest::Response,
    handle: Handle,
    pending: Bytes,
}

impl Read for StreamingBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.pending.is_empty() {
            match self.handle.block_on(self.response.chunk()) {
                Ok(Some(chunk)) => self.pending = chunk,
                Ok(None) => return Ok(0),
                Err(e) => return Err(io::Error::other(format!("Reading {}: {e}", self.uri))),
            }
        }
        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending = self.pending.slice(n..);
        Ok(n)
    }
}

impl RepositoryClient for HttpClient {
    fn get(&self, uri: &Url, accept: Option<&str>) -> ClientResult<Response> {
        let mut request = self.client.get(uri.clone());
        if let Some(accept) = accept {
            request = request.header(ACCEPT, accept);
        }
        self.execute("GET", uri, request)
    }

    fn head(&self, uri: &Url) -> ClientResult<Response> {
        self.execute("HEAD", uri, self.client.head(uri.clone()))
    }

    fn put(&self, uri: &Url, body: Vec<u8>, content_type: &str) -> ClientResult<Response> {
        let request = self
            .client
            .put(uri.clone())
            .header(CONTENT_TYPE, content_type)
            .body(body);
        self.execute("PUT", uri, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn test_http_client_creation() {
        assert!(HttpClient::new(DEFAULT_TIMEOUT).is_ok());
    }

    /// Serve one raw HTTP response, writing the body in `parts` with
    /// `gap` between them.
    fn serve_once(parts: Vec<&'static [u8]>, gap: Duration) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = [0u8; 4096];
            let _ = stream.read(&mut request).unwrap();
            let length: usize = parts.iter().map(|p| p.len()).sum();
            write!(stream, "HTTP/1.1 200 OK\r\nContent-Length: {length}\r\n\r\n").unwrap();
            stream.flush().unwrap();
            for part in parts {
                thread::sleep(gap);
                stream.write_all(part).unwrap();
                stream.flush().unwrap();
            }
        });
        Url::parse(&format!("http://{addr}/rest/img")).unwrap()
    }

    #[test]
    fn test_body_is_streamed() {
        let uri = serve_once(vec![&b"first "[..], &b"second "[..], &b"third"[..]], Duration::ZERO);
        let client = HttpClient::new(DEFAULT_TIMEOUT).unwrap();
        let response = client.get(&uri, None).unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.into_bytes().unwrap(), b"first second third");
    }

    #[test]
    fn test_slow_transfer_within_read_timeout() {
        // Five gaps of 300ms: longer than the timeout overall, shorter per read.
        let uri = serve_once(vec![&b"a"[..], &b"b"[..], &b"c"[..], &b"d"[..], &b"e"[..]], Duration::from_millis(300));
        let client = HttpClient::new(Duration::from_secs(1)).unwrap();
        let response = client.get(&uri, None).unwrap();
        assert_eq!(response.into_bytes().unwrap(), b"abcde");
    }

    #[test]
    fn test_unreachable_host_is_transport_error() {
        let client = HttpClient::new(Duration::from_millis(500)).unwrap();
        let uri = Url::parse("http://127.0.0.1:1/rest").unwrap();
        let result = client.head(&uri);
        assert!(matches!(result, Err(ClientError::Request { .. })));
    }
}
