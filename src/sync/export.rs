//! Export of a repository subtree into bag directories.
//!
//! # Crawl
//!
//! The exporter walks the containment tree depth-first from the base URI,
//! using an explicit stack and a visited set:
//!
//! 1. HEAD the resource. A `Link: <ldp:NonRDFSource>; rel="type"` marks a
//!    binary; its `rel="describedby"` links name its descriptions.
//! 2. Binaries are written to `<binary dir>/<path>.binary`, then each
//!    description is exported as an RDF resource.
//! 3. RDF resources are written to `<description dir>/<path><ext>`, and
//!    every `ldp:contains` object under the base is queued.
//!
//! Every candidate goes through the [`ExportFilter`]. Unchanged containers
//! are still crawled, since their children may have changed.
//!
//! Failures are per resource: they are logged, counted, and the crawl
//! moves on.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use reqwest::Url;
use tracing::{debug, info, warn};

use crate::client::{RepositoryClient, Response};
use crate::rdf::vocab::{LDP_CONTAINS, LDP_NON_RDF_SOURCE};
use crate::rdf::RdfFormat;
use crate::sync::file::{atomic_write, atomic_write_from};
use crate::sync::filter::ExportFilter;
use crate::sync::mapper::{PathMapper, ResourceKind};
use crate::sync::types::{ExportStats, SyncError, SyncResult};

/// Crawl state: what is left to visit and what has been seen.
#[derive(Default)]
struct Crawl {
    stack: Vec<Url>,
    visited: HashSet<String>,
}

impl Crawl {
    /// Mark a URI as seen; false if it already was.
    fn visit(&mut self, uri: &Url) -> bool {
        self.visited.insert(uri.as_str().trim_end_matches('/').to_string())
    }
}

/// Exporter for bag directories.
pub struct Exporter<'a> {
    client: &'a dyn RepositoryClient,
    filter: &'a dyn ExportFilter,
    mapper: &'a PathMapper,
    format: RdfFormat,
    description_dir: PathBuf,
    binary_dir: PathBuf,
    dry_run: bool,
}

impl<'a> Exporter<'a> {
    /// Create an exporter writing both descriptions and binaries to
    /// `output_dir`.
    #[must_use]
    pub fn new(
        client: &'a dyn RepositoryClient,
        filter: &'a dyn ExportFilter,
        mapper: &'a PathMapper,
        format: RdfFormat,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            client,
            filter,
            mapper,
            format,
            binary_dir: output_dir.clone(),
            description_dir: output_dir,
            dry_run: false,
        }
    }

    /// Write binaries to a separate directory.
    #[must_use]
    pub fn with_binary_dir(mut self, binary_dir: PathBuf) -> Self {
        self.binary_dir = binary_dir;
        self
    }

    /// Decide what would be exported without writing any files.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Crawl the repository from the base URI.
    ///
    /// # Errors
    ///
    /// Returns an error only if the output directories cannot be created.
    /// Per-resource failures are counted in the returned stats.
    pub fn export(&self) -> SyncResult<ExportStats> {
        if !self.dry_run {
            fs::create_dir_all(&self.description_dir)?;
            fs::create_dir_all(&self.binary_dir)?;
        }

        let mut stats = ExportStats::begin();
        let mut crawl = Crawl::default();
        let base = self.mapper.base().clone();
        crawl.visit(&base);
        crawl.stack.push(base);

        while let Some(uri) = crawl.stack.pop() {
            if let Err(e) = self.export_resource(&uri, &mut crawl, &mut stats) {
                warn!(%uri, error = %e, "Failed to export resource");
                stats.failed += 1;
            }
        }

        stats.finish();
        info!(
            rdf = stats.included_rdf,
            binaries = stats.included_binaries,
            unchanged = stats.unchanged,
            failed = stats.failed,
            dry_run = self.dry_run,
            "Export finished"
        );
        Ok(stats)
    }

    fn export_resource(&self, uri: &Url, crawl: &mut Crawl, stats: &mut ExportStats) -> SyncResult<()> {
        let head = checked("HEAD", uri, self.client.head(uri)?)?;
        let is_binary = head.links("type").iter().any(|t| t == LDP_NON_RDF_SOURCE);
        if !is_binary {
            return self.export_rdf(uri, Some(crawl), stats);
        }

        let descriptions: Vec<Url> = head
            .links("describedby")
            .iter()
            .filter_map(|link| match uri.join(link) {
                Ok(desc) => Some(desc),
                Err(e) => {
                    warn!(%uri, link = %link, error = %e, "Ignoring unparseable description link");
                    None
                }
            })
            .collect();

        self.export_binary(uri, &descriptions, stats)?;

        for description in &descriptions {
            if !crawl.visit(description) {
                continue;
            }
            if let Err(e) = self.export_rdf(description, None, stats) {
                warn!(uri = %description, error = %e, "Failed to export description");
                stats.failed += 1;
            }
        }
        Ok(())
    }

    fn export_binary(&self, uri: &Url, descriptions: &[Url], stats: &mut ExportStats) -> SyncResult<()> {
        let path = self.mapper.relative_path(uri, ResourceKind::Binary)?;
        if !self.filter.include_binary_resource(descriptions, uri) {
            debug!(%uri, "Binary unchanged");
            stats.unchanged += 1;
            return Ok(());
        }

        if self.dry_run {
            info!(%uri, path = %path, "Would export binary");
        } else {
            let mut response = checked("GET", uri, self.client.get(uri, None)?)?;
            let target = path.under(&self.binary_dir);
            let bytes = atomic_write_from(&target, &mut response.body)?;
            debug!(%uri, file = %target.display(), bytes, "Exported binary");
        }
        stats.included_binaries += 1;
        Ok(())
    }

    /// Export one RDF resource; with a crawl, also queue its children.
    fn export_rdf(&self, uri: &Url, crawl: Option<&mut Crawl>, stats: &mut ExportStats) -> SyncResult<()> {
        let path = self.mapper.relative_path(uri, ResourceKind::Rdf)?;
        let include = self.filter.include_rdf_resource(uri);
        if !include && crawl.is_none() {
            debug!(%uri, "Description unchanged");
            stats.unchanged += 1;
            return Ok(());
        }

        let response = checked("GET", uri, self.client.get(uri, Some(self.format.media_type()))?)?;
        let body = response.into_bytes()?;

        if include {
            if self.dry_run {
                info!(%uri, path = %path, "Would export resource");
            } else {
                let target = path.under(&self.description_dir);
                atomic_write(&target, &body)?;
                debug!(%uri, file = %target.display(), "Exported resource");
            }
            stats.included_rdf += 1;
        } else {
            debug!(%uri, "Resource unchanged");
            stats.unchanged += 1;
        }

        if let Some(crawl) = crawl {
            self.queue_children(uri, &body, crawl)?;
        }
        Ok(())
    }

    fn queue_children(&self, uri: &Url, body: &[u8], crawl: &mut Crawl) -> SyncResult<()> {
        let graph = self.format.parse(body)?;
        let mut children: Vec<Url> = graph
            .objects_of(LDP_CONTAINS)
            .filter_map(|o| o.as_iri())
            .filter_map(|iri| Url::parse(iri).ok())
            .filter(|child| {
                let under = self.mapper.is_under_base(child);
                if !under {
                    debug!(parent = %uri, %child, "Skipping child outside the base");
                }
                under
            })
            .filter(|child| crawl.visit(child))
            .collect();

        debug!(%uri, children = children.len(), "Queued children");
        // Stack order: first child is visited first.
        children.reverse();
        crawl.stack.extend(children);
        Ok(())
    }
}

fn checked(method: &'static str, uri: &Url, response: Response) -> SyncResult<Response> {
    if response.is_success() {
        return Ok(response);
    }
    let status = response.status;
    let message = response
        .into_bytes()
        .map(|b| String::from_utf8_lossy(&b).trim().to_string())
        .unwrap_or_default();
    Err(SyncError::Status {
        method,
        uri: uri.to_string(),
        status,
        message,
    })
}
