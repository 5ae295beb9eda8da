//! Export filters.
//!
//! The exporter asks a filter whether each candidate resource should be
//! written. [`IncludeAll`] takes everything; [`AccretionFilter`] only takes
//! resources that are new or changed since a prior bag, comparing current
//! SHA-1 digests against the prior bag's manifest.
//!
//! Filters fail open: whenever a decision cannot be made (no prior entry,
//! unreachable repository, no digest in any description) the resource is
//! included. Over-inclusion is harmless; missing a changed resource is not.

use std::path::Path;

use reqwest::Url;
use tracing::{debug, info, warn};

use crate::client::RepositoryClient;
use crate::rdf::vocab::{PREMIS_HAS_MESSAGE_DIGEST, SHA1_URN_PREFIX};
use crate::rdf::RdfFormat;
use crate::sync::hash::{has_changed, hash_reader, ContentHash};
use crate::sync::manifest::{ManifestError, ManifestIndex};
use crate::sync::mapper::{PathMapper, ResourceKind};
use crate::sync::types::{SyncError, SyncResult};

/// Decides which resources an export writes.
pub trait ExportFilter {
    /// Whether to export a binary, given its description resources.
    fn include_binary_resource(&self, description_ids: &[Url], binary_id: &Url) -> bool;

    /// Whether to export an RDF resource.
    fn include_rdf_resource(&self, resource_id: &Url) -> bool;
}

/// Exports every resource.
#[derive(Debug, Clone, Copy, Default)]
pub struct IncludeAll;

impl ExportFilter for IncludeAll {
    fn include_binary_resource(&self, _description_ids: &[Url], _binary_id: &Url) -> bool {
        true
    }

    fn include_rdf_resource(&self, _resource_id: &Url) -> bool {
        true
    }
}

/// Exports only resources that changed since a prior bag.
pub struct AccretionFilter<'a> {
    manifest: ManifestIndex,
    client: &'a dyn RepositoryClient,
    mapper: &'a PathMapper,
    format: RdfFormat,
}

impl<'a> AccretionFilter<'a> {
    #[must_use]
    pub fn new(
        manifest: ManifestIndex,
        client: &'a dyn RepositoryClient,
        mapper: &'a PathMapper,
        format: RdfFormat,
    ) -> Self {
        Self {
            manifest,
            client,
            mapper,
            format,
        }
    }

    /// Load the prior manifest and build the filter.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be read or has a malformed line.
    pub fn load(
        manifest_path: &Path,
        client: &'a dyn RepositoryClient,
        mapper: &'a PathMapper,
        format: RdfFormat,
    ) -> Result<Self, ManifestError> {
        let manifest = ManifestIndex::load(manifest_path)?;
        info!(
            manifest = %manifest_path.display(),
            entries = manifest.len(),
            "Exporting only resources changed since the prior bag"
        );
        Ok(Self::new(manifest, client, mapper, format))
    }

    fn prior_hash(&self, uri: &Url, kind: ResourceKind) -> Option<&ContentHash> {
        match self.mapper.relative_path(uri, kind) {
            Ok(path) => {
                let prior = self.manifest.get(&path);
                debug!(%uri, path = %path, prior = ?prior.map(ContentHash::as_str), "Prior hash lookup");
                prior
            }
            Err(e) => {
                warn!(%uri, error = %e, "Cannot map resource to a bag path");
                None
            }
        }
    }

    /// SHA-1 a description reports for its binary, if any.
    fn reported_digest(&self, description: &Url) -> SyncResult<Option<ContentHash>> {
        let response = self
            .client
            .get(description, Some(RdfFormat::NTriples.media_type()))?;
        if !response.is_success() {
            return Err(SyncError::Status {
                method: "GET",
                uri: description.to_string(),
                status: response.status,
                message: "description unavailable".to_string(),
            });
        }
        let graph = RdfFormat::NTriples.parse(&response.into_bytes()?)?;
        let digest = graph
            .objects_of(PREMIS_HAS_MESSAGE_DIGEST)
            .filter_map(|o| o.as_iri())
            .find_map(|iri| iri.strip_prefix(SHA1_URN_PREFIX))
            .map(ContentHash::new);
        Ok(digest)
    }

    /// SHA-1 of the current RDF representation, streamed from the body.
    fn current_rdf_hash(&self, resource: &Url) -> SyncResult<ContentHash> {
        let response = self.client.get(resource, Some(self.format.media_type()))?;
        if !response.is_success() {
            return Err(SyncError::Status {
                method: "GET",
                uri: resource.to_string(),
                status: response.status,
                message: format!("not available as {}", self.format),
            });
        }
        Ok(hash_reader(response.body)?)
    }
}

impl ExportFilter for AccretionFilter<'_> {
    fn include_binary_resource(&self, description_ids: &[Url], binary_id: &Url) -> bool {
        let prior = self.prior_hash(binary_id, ResourceKind::Binary);
        let Some(prior) = prior else {
            info!(uri = %binary_id, "Including binary: not in prior bag");
            return true;
        };

        for description in description_ids {
            match self.reported_digest(description) {
                Ok(Some(current)) => {
                    let include = has_changed(&current, Some(prior));
                    info!(uri = %binary_id, %current, %prior, include, "Binary digest compared");
                    return include;
                }
                Ok(None) => {
                    debug!(uri = %binary_id, %description, "Description has no SHA-1 digest");
                }
                Err(e) => {
                    warn!(uri = %binary_id, %description, error = %e, "Digest unavailable");
                }
            }
        }

        info!(uri = %binary_id, "Including binary: no digest available");
        true
    }

    fn include_rdf_resource(&self, resource_id: &Url) -> bool {
        let Some(prior) = self.prior_hash(resource_id, ResourceKind::Rdf) else {
            info!(uri = %resource_id, "Including resource: not in prior bag");
            return true;
        };

        match self.current_rdf_hash(resource_id) {
            Ok(current) => {
                let include = has_changed(&current, Some(prior));
                info!(uri = %resource_id, %current, %prior, include, "Resource hash compared");
                include
            }
            Err(e) => {
                warn!(uri = %resource_id, error = %e, "Including resource: hash unavailable");
                true
            }
        }
    }
}
