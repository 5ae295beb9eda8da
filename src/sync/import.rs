//! Import of a bag's description directory into a repository.
//!
//! Each RDF file is mapped back to its resource URI, stripped of
//! server-managed statements, and replayed with a PUT. Binary payloads
//! are skipped. Files are processed parents first (`rest/a.jsonld` before
//! `rest/a/c.jsonld`) so containers exist before their children, and one
//! file's failure never stops the walk.

use std::ffi::OsString;
use std::fs;
use std::path::Path;

use reqwest::Url;
use tracing::{debug, info, warn};

use crate::client::RepositoryClient;
use crate::rdf::RdfFormat;
use crate::sync::file::walk_files;
use crate::sync::mapper::{PathMapper, BINARY_EXTENSION};
use crate::sync::sanitize::sanitize;
use crate::sync::types::{ImportStats, SyncError, SyncResult};

/// Importer for bag directories.
pub struct Importer<'a> {
    client: &'a dyn RepositoryClient,
    mapper: &'a PathMapper,
    format: RdfFormat,
    dry_run: bool,
}

impl<'a> Importer<'a> {
    #[must_use]
    pub fn new(client: &'a dyn RepositoryClient, mapper: &'a PathMapper, format: RdfFormat) -> Self {
        Self {
            client,
            mapper,
            format,
            dry_run: false,
        }
    }

    /// Do everything except the PUT.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Import every RDF file below `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` does not exist or cannot be listed.
    /// Per-file failures are counted in the returned stats.
    pub fn import_all(&self, dir: &Path) -> SyncResult<ImportStats> {
        let mut files = walk_files(dir)?;
        files.sort_by_cached_key(|file| self.resource_order(file));
        let mut stats = ImportStats::begin();

        for file in &files {
            if file
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(BINARY_EXTENSION))
            {
                debug!(file = %file.display(), "Skipping binary payload");
                stats.skipped += 1;
                continue;
            }

            match self.import_file(file, dir) {
                Ok(removed) => {
                    stats.imported += 1;
                    stats.removed_triples += removed;
                }
                Err(e) => {
                    warn!(file = %file.display(), error = %e, "Failed to import file");
                    stats.failed += 1;
                }
            }
        }

        stats.finish();
        info!(
            imported = stats.imported,
            failed = stats.failed,
            skipped = stats.skipped,
            dry_run = self.dry_run,
            "Import finished"
        );
        Ok(stats)
    }

    /// Replay one file, returning how many statements were stripped.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be mapped, read or parsed, or
    /// the repository rejects the PUT.
    pub fn import_file(&self, file: &Path, dir: &Path) -> SyncResult<usize> {
        let uri = self.mapper.uri_for_file(file, dir)?;
        let mut graph = self.format.parse(&fs::read(file)?)?;
        let removed = sanitize(&mut graph, &uri);
        let body = self.format.serialize(&graph)?;

        if self.dry_run {
            info!(%uri, file = %file.display(), triples = graph.len(), "Would import");
            return Ok(removed);
        }

        self.put(&uri, body)?;
        info!(%uri, file = %file.display(), "Imported");
        Ok(removed)
    }

    /// Sort key placing a resource's file before the files of its children:
    /// the path components with the RDF extension dropped from the last one.
    fn resource_order(&self, file: &Path) -> Vec<OsString> {
        let mut parts: Vec<OsString> = file.iter().map(OsString::from).collect();
        if let Some(last) = parts.last_mut() {
            if let Some(stem) = last
                .to_str()
                .and_then(|name| name.strip_suffix(self.mapper.rdf_extension()))
            {
                *last = OsString::from(stem);
            }
        }
        parts
    }

    fn put(&self, uri: &Url, body: Vec<u8>) -> SyncResult<()> {
        let response = self.client.put(uri, body, self.format.media_type())?;
        if response.is_success() {
            return Ok(());
        }
        let status = response.status;
        let message = response
            .into_bytes()
            .map(|b| String::from_utf8_lossy(&b).trim().to_string())
            .unwrap_or_default();
        Err(SyncError::Status {
            method: "PUT",
            uri: uri.to_string(),
            status,
            message,
        })
    }
}
