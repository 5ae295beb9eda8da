//! Error types for the bagsync CLI.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=manifest, 3=mapping, 4=argument, etc.)
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use std::path::PathBuf;
use thiserror::Error;

use crate::client::ClientError;
use crate::rdf::RdfError;
use crate::sync::{ManifestError, MappingError, SyncError};

/// Result type alias for bagsync operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based
/// exit code. Scripts match on the string or on the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Manifest (exit 2)
    ManifestParseError,
    ManifestUnreadable,

    // Mapping (exit 3)
    MappingError,

    // Validation (exit 4)
    InvalidArgument,

    // RDF (exit 5)
    RdfError,

    // Transport (exit 6)
    TransportError,
    RequestRejected,

    // Config (exit 7)
    ConfigError,
    DirectoryNotFound,

    // I/O (exit 8)
    IoError,
    JsonError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::ManifestParseError => "MANIFEST_PARSE_ERROR",
            Self::ManifestUnreadable => "MANIFEST_UNREADABLE",
            Self::MappingError => "MAPPING_ERROR",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::RdfError => "RDF_ERROR",
            Self::TransportError => "TRANSPORT_ERROR",
            Self::RequestRejected => "REQUEST_REJECTED",
            Self::ConfigError => "CONFIG_ERROR",
            Self::DirectoryNotFound => "DIRECTORY_NOT_FOUND",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
        }
    }

    /// Category-based exit code (2-8).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::ManifestParseError | Self::ManifestUnreadable => 2,
            Self::MappingError => 3,
            Self::InvalidArgument => 4,
            Self::RdfError => 5,
            Self::TransportError | Self::RequestRejected => 6,
            Self::ConfigError | Self::DirectoryNotFound => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether rerunning with corrected input is likely to succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument | Self::ConfigError | Self::TransportError
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can end a bagsync run.
///
/// Per-resource failures during export and import never surface here;
/// they are logged and counted in the run statistics.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Rdf(#[from] RdfError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("Directory not found: {}", path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Manifest(ManifestError::Parse { .. }) => ErrorCode::ManifestParseError,
            Self::Manifest(ManifestError::Io { .. }) => ErrorCode::ManifestUnreadable,
            Self::Mapping(_) | Self::Sync(SyncError::Mapping(_)) => ErrorCode::MappingError,
            Self::Rdf(_) | Self::Sync(SyncError::Rdf(_)) => ErrorCode::RdfError,
            Self::Client(_) | Self::Sync(SyncError::Client(_)) => ErrorCode::TransportError,
            Self::Sync(SyncError::Status { .. }) => ErrorCode::RequestRejected,
            Self::DirectoryNotFound { .. } | Self::Sync(SyncError::DirectoryNotFound(_)) => {
                ErrorCode::DirectoryNotFound
            }
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Io(_) | Self::Sync(SyncError::Io(_)) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::Manifest(ManifestError::Parse { .. }) => Some(
                "Every non-blank manifest line must read `<sha1>  data/<path>`. \
                 Fix or remove the line, or export without --prior-manifest."
                    .to_string(),
            ),
            Self::Manifest(ManifestError::Io { path, .. }) => Some(format!(
                "Check that {} exists and is readable (usually manifest-sha1.txt in the prior bag).",
                path.display()
            )),

            Self::Rdf(RdfError::UnsupportedMediaType(_)) => Some(
                "Supported RDF languages: application/ld+json, application/n-triples".to_string(),
            ),

            Self::Mapping(MappingError::OutsideBase { base, .. }) => Some(format!(
                "Only resources under {base} can be mapped. Check --resource."
            )),
            Self::Mapping(MappingError::UnexpectedPrefix { base, .. })
            | Self::Sync(SyncError::Mapping(MappingError::UnexpectedPrefix { base, .. })) => {
                Some(format!(
                    "Files must sit under the path of {base}. Was the bag exported from a different --resource?"
                ))
            }

            Self::DirectoryNotFound { path } | Self::Sync(SyncError::DirectoryNotFound(path)) => {
                Some(format!(
                    "Nothing to import from {}. Point --dir at the description directory of an export.",
                    path.display()
                ))
            }

            Self::Client(_) | Self::Sync(SyncError::Client(_)) => Some(
                "Check that the repository is reachable, or raise --timeout.".to_string(),
            ),

            Self::InvalidArgument(msg) if msg.contains("resource") => Some(
                "Pass an absolute http(s) URI, e.g. --resource http://localhost:8080/rest"
                    .to_string(),
            ),

            Self::Config(msg) if msg.contains("extension") => {
                Some("RDF extensions start with a dot, e.g. --rdf-ext .jsonld".to_string())
            }

            _ => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    ///
    /// Includes error code, message, retryability, exit code, and
    /// optional recovery hint.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}
