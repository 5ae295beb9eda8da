//! Content hashing for change detection.
//!
//! Resources are compared by the SHA-1 of their current representation:
//! the raw bytes of a binary, or the bytes of an RDF serialization as the
//! repository returns them. Every computation starts from a fresh hasher.

use std::fmt;
use std::io::{self, Read};

use sha1::{Digest, Sha1};

/// A hex-encoded SHA-1 digest.
///
/// Stored lowercase; compared case-insensitively since manifests and
/// repositories disagree on case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash(String);

impl ContentHash {
    /// Wrap a hex digest as reported elsewhere.
    pub fn new(hex: impl AsRef<str>) -> Self {
        Self(hex.as_ref().trim().to_ascii_lowercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive equality with another digest.
    #[must_use]
    pub fn matches(&self, other: &ContentHash) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hash a stream, consuming it to exhaustion.
///
/// # Errors
///
/// Returns an error if reading the stream fails.
pub fn hash_reader<R: Read>(mut reader: R) -> io::Result<ContentHash> {
    let mut hasher = Sha1::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(ContentHash(format!("{:x}", hasher.finalize())))
}

/// Hash an in-memory byte slice.
#[must_use]
pub fn content_hash(bytes: &[u8]) -> ContentHash {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    ContentHash(format!("{:x}", hasher.finalize()))
}

/// Check if a resource has changed since the prior bag.
///
/// Returns `true` if:
/// - There is no prior hash (unknown previous state)
/// - The current hash differs from the prior hash
///
/// Returns `false` if the hashes match, ignoring case.
#[must_use]
pub fn has_changed(current: &ContentHash, prior: Option<&ContentHash>) -> bool {
    prior.is_none_or(|p| !p.matches(current))
}
