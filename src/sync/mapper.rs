//! URI ↔ bag path mapping.
//!
//! A resource `http://host/rest/a/b` exported under base `http://host/rest`
//! lands at `rest/a/b<ext>` below the output directory: the URI path,
//! segment-encoded, with the RDF or binary extension appended. Import
//! walks those files and maps them back. For every identifier under the
//! base, `uri_for_file(relative_path(u))` yields `u` again.
//!
//! # Rules
//!
//! Path segments are percent-encoded with [`SEGMENT_ENCODE_SET`] so that
//! every URI segment becomes a portable file name and decodes back exactly.
//! On top of that:
//!
//! - [`TRAILING_SEGMENT_RULES`]: the binary description marker
//!   `fcr:metadata` is written as `fcr_metadata`; a literal trailing
//!   `fcr_metadata` is escaped so it cannot be read back as the marker.
//! - **rdf-extension**: a trailing RDF extension is stripped on import.
//! - **base-path-prefix**: leading file segments must equal the base URI's
//!   path segments (`rest` for `.../rest`); they are stripped before the
//!   rest is composed with the base, so the base path is not doubled. A
//!   file without that prefix is a [`MappingError::UnexpectedPrefix`].

use std::path::{Component, Path, PathBuf};

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::Url;
/// Extension of binary payloads in the bag.
pub const BINARY_EXTENSION: &str = ".binary";

/// Characters escaped inside a path segment.
///
/// `%` is escaped so that decoding is an exact inverse; the rest are not
/// portable in file names.
pub const SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b'%')
    .add(b'/')
    .add(b':')
    .add(b'*')
    .add(b'?')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'|')
    .add(b'\\');

/// A named rewrite of the final path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentRule {
    pub name: &'static str,
    /// Segment as it appears in the URI.
    pub uri_segment: &'static str,
    /// Segment as it appears in the file name.
    pub file_segment: &'static str,
}

/// Rewrites applied to the final segment before generic encoding.
pub const TRAILING_SEGMENT_RULES: &[SegmentRule] = &[
    SegmentRule {
        name: "binary-description",
        uri_segment: "fcr:metadata",
        file_segment: "fcr_metadata",
    },
    SegmentRule {
        name: "literal-description-marker",
        uri_segment: "fcr_metadata",
        file_segment: "fcr%5Fmetadata",
    },
];

/// Whether a resource is recorded as RDF or as a binary payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Rdf,
    Binary,
}

/// Mapping failures. Paths that do not fit the expected shape are
/// reported instead of being turned into a wrong identifier.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    #[error("{uri} is not under base {base}")]
    OutsideBase { uri: String, base: String },

    #[error("{uri} has a query or fragment, which cannot be mapped to a path")]
    UnsupportedComponent { uri: String },

    #[error("{uri} has an empty path segment")]
    EmptySegment { uri: String },

    #[error("{} is not inside {}", path.display(), base_dir.display())]
    OutsideDirectory { path: PathBuf, base_dir: PathBuf },

    #[error("{} is not valid UTF-8", path.display())]
    NonUtf8 { path: PathBuf },

    #[error("{} has no path relative to the base directory", path.display())]
    EmptyPath { path: PathBuf },

    #[error("{} does not start with the base path of {base}", path.display())]
    UnexpectedPrefix { path: PathBuf, base: String },

    #[error("Invalid percent escape in segment '{segment}'")]
    InvalidEscape { segment: String },

    #[error("Cannot build a URI from '{value}': {message}")]
    InvalidUri { value: String, message: String },
}

/// A bag path relative to the output directory, `/`-separated, without a
/// leading slash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelativePath(String);

impl RelativePath {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key of this path in a bag manifest (the text after `data`).
    #[must_use]
    pub fn manifest_key(&self) -> String {
        format!("/{}", self.0)
    }

    /// Location of this path below `root`.
    #[must_use]
    pub fn under(&self, root: &Path) -> PathBuf {
        self.0.split('/').fold(root.to_path_buf(), |p, seg| p.join(seg))
    }
}

impl std::fmt::Display for RelativePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bidirectional mapping for one base URI and RDF extension.
#[derive(Debug, Clone)]
pub struct PathMapper {
    base: Url,
    base_segments: Vec<String>,
    rdf_extension: String,
}

impl PathMapper {
    /// Create a mapper.
    ///
    /// # Errors
    ///
    /// Returns an error if the base has a query or fragment, or empty
    /// interior path segments.
    pub fn new(base: Url, rdf_extension: impl Into<String>) -> Result<Self, MappingError> {
        if base.query().is_some() || base.fragment().is_some() {
            return Err(MappingError::UnsupportedComponent {
                uri: base.to_string(),
            });
        }
        let base_segments = uri_segments(&base)?;
        Ok(Self {
            base,
            base_segments,
            rdf_extension: rdf_extension.into(),
        })
    }

    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    #[must_use]
    pub fn rdf_extension(&self) -> &str {
        &self.rdf_extension
    }

    /// Extension appended for the given kind of bag entry.
    #[must_use]
    pub fn extension(&self, kind: ResourceKind) -> &str {
        match kind {
            ResourceKind::Rdf => &self.rdf_extension,
            ResourceKind::Binary => BINARY_EXTENSION,
        }
    }

    /// Whether `uri` lives under the base (same origin, base path prefix).
    #[must_use]
    pub fn is_under_base(&self, uri: &Url) -> bool {
        self.same_origin(uri)
            && uri_segments(uri).is_ok_and(|segs| segs.starts_with(&self.base_segments))
    }

    fn same_origin(&self, uri: &Url) -> bool {
        uri.scheme() == self.base.scheme()
            && uri.host_str() == self.base.host_str()
            && uri.port_or_known_default() == self.base.port_or_known_default()
    }

    /// Map a resource URI to its bag path.
    ///
    /// # Errors
    ///
    /// Returns an error if the URI is outside the base or has a shape that
    /// cannot be mapped back.
    pub fn relative_path(&self, uri: &Url, kind: ResourceKind) -> Result<RelativePath, MappingError> {
        if uri.query().is_some() || uri.fragment().is_some() {
            return Err(MappingError::UnsupportedComponent {
                uri: uri.to_string(),
            });
        }
        let segments = uri_segments(uri)?;
        if !self.same_origin(uri) || !segments.starts_with(&self.base_segments) {
            return Err(MappingError::OutsideBase {
                uri: uri.to_string(),
                base: self.base.to_string(),
            });
        }

        let last = segments.len().saturating_sub(1);
        let encoded: Vec<String> = segments
            .iter()
            .enumerate()
            .map(|(i, seg)| {
                if i == last {
                    encode_trailing_segment(seg)
                } else {
                    encode_segment(seg)
                }
            })
            .collect();

        Ok(RelativePath(format!("{}{}", encoded.join("/"), self.extension(kind))))
    }

    /// Map a file below `base_dir` back to its resource URI.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is not below `base_dir`, is not UTF-8,
    /// or contains malformed escapes or empty segments.
    pub fn uri_for_file(&self, file: &Path, base_dir: &Path) -> Result<Url, MappingError> {
        let relative = file
            .strip_prefix(base_dir)
            .map_err(|_| MappingError::OutsideDirectory {
                path: file.to_path_buf(),
                base_dir: base_dir.to_path_buf(),
            })?;

        let mut parts = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(os) => parts.push(os.to_str().ok_or_else(|| {
                    MappingError::NonUtf8 {
                        path: file.to_path_buf(),
                    }
                })?),
                Component::CurDir => {}
                _ => {
                    return Err(MappingError::OutsideDirectory {
                        path: file.to_path_buf(),
                        base_dir: base_dir.to_path_buf(),
                    });
                }
            }
        }
        if parts.is_empty() {
            return Err(MappingError::EmptyPath {
                path: file.to_path_buf(),
            });
        }

        // rdf-extension
        let joined = parts.join("/");
        let stripped = joined
            .strip_suffix(self.rdf_extension.as_str())
            .filter(|_| !self.rdf_extension.is_empty())
            .unwrap_or(&joined);

        let mut segments: Vec<&str> = if stripped.is_empty() {
            Vec::new()
        } else {
            stripped.split('/').collect()
        };

        // base-path-prefix
        let base_len = self.base_segments.len();
        let has_prefix = segments.len() >= base_len
            && segments[..base_len]
                .iter()
                .zip(&self.base_segments)
                .all(|(file_seg, base_seg)| decode_segment(file_seg).is_ok_and(|d| &d == base_seg));
        if !has_prefix {
            return Err(MappingError::UnexpectedPrefix {
                path: file.to_path_buf(),
                base: self.base.to_string(),
            });
        }
        segments = segments.split_off(base_len);

        if segments.is_empty() {
            return Ok(self.base.clone());
        }

        let last = segments.len() - 1;
        let mut decoded = Vec::with_capacity(segments.len());
        for (i, seg) in segments.iter().enumerate() {
            let seg = if i == last {
                decode_trailing_segment(seg)?
            } else {
                decode_segment(seg)?
            };
            if seg.is_empty() {
                return Err(MappingError::EmptySegment {
                    uri: format!("{}/{}", self.base, stripped),
                });
            }
            decoded.push(seg);
        }

        let path = self
            .base_segments
            .iter()
            .map(String::as_str)
            .chain(decoded.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join("/");

        let mut uri = self.base.clone();
        uri.set_path(&format!("/{path}"));
        if !self.is_under_base(&uri) {
            return Err(MappingError::InvalidUri {
                value: path,
                message: "resolved outside the base".to_string(),
            });
        }
        Ok(uri)
    }
}

/// Non-empty path segments of a URI, ignoring leading and trailing slashes.
fn uri_segments(uri: &Url) -> Result<Vec<String>, MappingError> {
    let path = uri.path().trim_start_matches('/').trim_end_matches('/');
    if path.is_empty() {
        return Ok(Vec::new());
    }
    let segments: Vec<String> = path.split('/').map(str::to_string).collect();
    if segments.iter().any(String::is_empty) {
        return Err(MappingError::EmptySegment {
            uri: uri.to_string(),
        });
    }
    Ok(segments)
}

fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT_ENCODE_SET).to_string()
}

fn encode_trailing_segment(segment: &str) -> String {
    TRAILING_SEGMENT_RULES
        .iter()
        .find(|rule| rule.uri_segment == segment)
        .map_or_else(|| encode_segment(segment), |rule| rule.file_segment.to_string())
}

fn decode_segment(segment: &str) -> Result<String, MappingError> {
    let invalid = || MappingError::InvalidEscape {
        segment: segment.to_string(),
    };

    let bytes = segment.as_bytes();
    let mut i = 0;
    while let Some(offset) = bytes[i..].iter().position(|&b| b == b'%') {
        let at = i + offset;
        let well_formed = bytes
            .get(at + 1..at + 3)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
        if !well_formed {
            return Err(invalid());
        }
        i = at + 3;
    }

    percent_decode_str(segment)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| invalid())
}

fn decode_trailing_segment(segment: &str) -> Result<String, MappingError> {
    match TRAILING_SEGMENT_RULES
        .iter()
        .find(|rule| rule.file_segment == segment)
    {
        Some(rule) => Ok(rule.uri_segment.to_string()),
        None => decode_segment(segment),
    }
}
