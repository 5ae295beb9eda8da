//! Bag export and import.
//!
//! This module moves resources between an LDP repository and a bag's
//! payload directories:
//!
//! - **Export**: crawl the repository, write RDF descriptions and binaries
//! - **Import**: walk RDF files, strip server-managed triples, PUT them back
//! - **Accretion**: with a prior bag's manifest, export only what changed
//! - **Mapping**: the reversible URI ↔ bag path scheme both directions share
//!
//! # Architecture
//!
//! Export and import both go through a [`RepositoryClient`] and a
//! [`PathMapper`]. The exporter consults an [`ExportFilter`] for every
//! candidate resource:
//! 1. [`IncludeAll`] takes everything
//! 2. [`AccretionFilter`] compares current SHA-1 digests against a
//!    [`ManifestIndex`] and includes only new or changed resources,
//!    failing open whenever it cannot decide
//!
//! # Example
//!
//! ```ignore
//! use bagsync::sync::{AccretionFilter, Exporter, Importer, PathMapper};
//!
//! let mapper = PathMapper::new(base, ".jsonld")?;
//! let filter = AccretionFilter::load(&manifest, &client, &mapper, format)?;
//! let stats = Exporter::new(&client, &filter, &mapper, format, out_dir).export()?;
//!
//! let stats = Importer::new(&client, &mapper, format).import_all(&bag_data)?;
//! ```
//!
//! [`RepositoryClient`]: crate::client::RepositoryClient

mod export;
mod file;
mod filter;
mod hash;
mod import;
mod manifest;
mod mapper;
mod sanitize;
mod types;

pub use export::Exporter;
pub use file::{atomic_write, atomic_write_from, walk_files};
pub use filter::{AccretionFilter, ExportFilter, IncludeAll};
pub use hash::{content_hash, has_changed, hash_reader, ContentHash};
pub use import::Importer;
pub use manifest::{ManifestError, ManifestIndex};
pub use mapper::{
    MappingError, PathMapper, RelativePath, ResourceKind, SegmentRule, BINARY_EXTENSION,
    SEGMENT_ENCODE_SET, TRAILING_SEGMENT_RULES,
};
pub use sanitize::{sanitize, ExclusionRule, EXCLUSION_RULES};
pub use types::{ExportStats, ImportStats, SyncError, SyncResult};
