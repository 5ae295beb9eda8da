//! Checksum manifest of a prior bag.
//!
//! Each line of a bag payload manifest reads `<hash><whitespace>data<path>`,
//! where `data` is the payload directory literal. The index maps `<path>`
//! to its hash. Loading is all-or-nothing: one malformed line rejects the
//! whole manifest.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::sync::hash::ContentHash;
use crate::sync::mapper::RelativePath;

static MANIFEST_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\S+)\s+data(\S.*)$").expect("manifest line pattern is valid")
});

/// Manifest loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// The manifest could not be read.
    #[error("Unable to read manifest {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line does not match the manifest format.
    #[error("Unable to parse line {line} from {source_name}: {content}")]
    Parse {
        /// Where the manifest came from.
        source_name: String,
        /// Line number (1-indexed).
        line: usize,
        /// The offending line.
        content: String,
    },
}

/// Path → hash lookup built from a prior bag's manifest.
#[derive(Debug, Clone, Default)]
pub struct ManifestIndex {
    entries: HashMap<String, ContentHash>,
}

impl ManifestIndex {
    /// Load a manifest file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or any line is malformed.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let file = File::open(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let index = Self::from_reader(BufReader::new(file), &path.display().to_string())
            .map_err(|e| match e {
                ManifestError::Io { source, .. } => ManifestError::Io {
                    path: path.to_path_buf(),
                    source,
                },
                parse => parse,
            })?;
        debug!(path = %path.display(), entries = index.len(), "Loaded prior manifest");
        Ok(index)
    }

    /// Parse manifest lines from any reader. Blank lines are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails or any non-blank line is malformed.
    pub fn from_reader<R: BufRead>(reader: R, source_name: &str) -> Result<Self, ManifestError> {
        let mut entries = HashMap::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result.map_err(|source| ManifestError::Io {
                path: PathBuf::from(source_name),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }

            let caps = MANIFEST_LINE
                .captures(&line)
                .ok_or_else(|| ManifestError::Parse {
                    source_name: source_name.to_string(),
                    line: line_num + 1,
                    content: line.clone(),
                })?;
            entries.insert(caps[2].trim().to_string(), ContentHash::new(&caps[1]));
        }

        Ok(Self { entries })
    }

    /// Prior hash of a bag entry, or `None` if the prior bag did not have it.
    #[must_use]
    pub fn get(&self, path: &RelativePath) -> Option<&ContentHash> {
        self.entries.get(&path.manifest_key())
    }

    /// Prior hash by raw manifest key (the text after `data`).
    #[must_use]
    pub fn get_key(&self, key: &str) -> Option<&ContentHash> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_entries() {
        let manifest = "\
a9993e364706816aba3e25717850c26c9cd0d89d  data/rest/foo.jsonld
DA39A3EE5E6B4B0D3255BFEF95601890AFD80709\tdata/rest/img.binary

";
        let index = ManifestIndex::from_reader(manifest.as_bytes(), "manifest-sha1.txt").unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(
            index.get_key("/rest/foo.jsonld").unwrap().as_str(),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        // Stored lowercase
        assert_eq!(
            index.get_key("/rest/img.binary").unwrap().as_str(),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
    }

    #[test]
    fn test_path_without_slash() {
        let index = ManifestIndex::from_reader("abc123  dataXYZ\n".as_bytes(), "m").unwrap();
        assert_eq!(index.get_key("XYZ").unwrap().as_str(), "abc123");
    }

    #[test]
    fn test_one_bad_line_rejects_manifest() {
        let manifest = "abc123  dataXYZ\nnot-a-valid-line\n";
        let result = ManifestIndex::from_reader(manifest.as_bytes(), "manifest-sha1.txt");
        match result {
            Err(ManifestError::Parse { line, content, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(content, "not-a-valid-line");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_data_token_rejected() {
        let result = ManifestIndex::from_reader("abc123  rest/foo.jsonld\n".as_bytes(), "m");
        assert!(matches!(result, Err(ManifestError::Parse { line: 1, .. })));
    }

    #[test]
    fn test_space_after_data_rejected() {
        let result = ManifestIndex::from_reader("abc123  data /foo\n".as_bytes(), "m");
        assert!(matches!(result, Err(ManifestError::Parse { .. })));
    }

    #[test]
    fn test_crlf_lines() {
        let index = ManifestIndex::from_reader("abc123  data/foo.jsonld\r\n".as_bytes(), "m").unwrap();
        assert!(index.get_key("/foo.jsonld").is_some());
    }

    #[test]
    fn test_load_missing_file() {
        let result = ManifestIndex::load(Path::new("/nonexistent/manifest-sha1.txt"));
        assert!(matches!(result, Err(ManifestError::Io { .. })));
    }

    #[test]
    fn test_load_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("manifest-sha1.txt");
        fs::write(&path, "abc123  data/foo.jsonld\n").unwrap();

        let index = ManifestIndex::load(&path).unwrap();
        assert_eq!(index.len(), 1);
    }
}
