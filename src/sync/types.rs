//! Sync types for export/import runs.
//!
//! Run statistics and the walk-level error type. Errors here describe a
//! single resource or file; the walks count them and keep going.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::client::ClientError;
use crate::rdf::RdfError;
use crate::sync::mapper::MappingError;

/// Statistics for an export run.
#[derive(Debug, Clone, Serialize)]
pub struct ExportStats {
    /// RDF resources written (or selected, in dry-run mode).
    pub included_rdf: usize,
    /// Binaries written (or selected, in dry-run mode).
    pub included_binaries: usize,
    /// Resources filtered out as unchanged since the prior bag.
    pub unchanged: usize,
    /// Resources that could not be exported.
    pub failed: usize,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: Option<DateTime<Utc>>,
}

impl ExportStats {
    /// Start counting a new run.
    #[must_use]
    pub fn begin() -> Self {
        Self {
            included_rdf: 0,
            included_binaries: 0,
            unchanged: 0,
            failed: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Stamp the end of the run.
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Total number of resources written.
    #[must_use]
    pub fn total_included(&self) -> usize {
        self.included_rdf + self.included_binaries
    }

    /// Total number of resources visited.
    #[must_use]
    pub fn total(&self) -> usize {
        self.total_included() + self.unchanged + self.failed
    }
}

/// Statistics for an import run.
#[derive(Debug, Clone, Serialize)]
pub struct ImportStats {
    /// Files replayed against the repository.
    pub imported: usize,
    /// Files that could not be imported.
    pub failed: usize,
    /// Files ignored (binary payloads).
    pub skipped: usize,
    /// Server-managed statements removed across all files.
    pub removed_triples: usize,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: Option<DateTime<Utc>>,
}

impl ImportStats {
    /// Start counting a new run.
    #[must_use]
    pub fn begin() -> Self {
        Self {
            imported: 0,
            failed: 0,
            skipped: 0,
            removed_triples: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Stamp the end of the run.
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Total number of files processed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.imported + self.failed + self.skipped
    }
}

/// Sync-specific errors.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A URI or file path could not be mapped.
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// A representation could not be parsed or serialized.
    #[error(transparent)]
    Rdf(#[from] RdfError),

    /// No response from the repository.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The repository answered with a non-success status.
    #[error("{method} {uri} returned {status}: {message}")]
    Status {
        method: &'static str,
        uri: String,
        status: u16,
        message: String,
    },

    /// The directory to walk does not exist.
    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),
}

/// Result type for sync operations.
pub type SyncResult<T> = std::result::Result<T, SyncError>;
