//! Configuration management.
//!
//! Command-line flags (with `BAGSYNC_*` environment fallbacks, handled by
//! clap) are resolved here into a validated [`Config`]:
//!
//! - **Resource**: absolute http(s) URI, no query or fragment
//! - **RDF language**: a media type with a codec; the default is JSON-LD
//! - **RDF extension**: starts with `.`, defaults from the language
//! - **Binary directory**: defaults to the description directory
//! - **Timeout**: for connecting and for each read, defaults to 30 seconds

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;
use tracing::debug;

use crate::cli::{ExportArgs, TransferArgs};
use crate::error::{Error, Result};
use crate::rdf::RdfFormat;
use crate::sync::{PathMapper, BINARY_EXTENSION};

/// RDF language used when none is configured.
pub const DEFAULT_RDF_LANG: &str = "application/ld+json";

/// Resolved settings for one export or import run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URI of the repository subtree.
    pub resource: Url,
    /// Where RDF descriptions are written to or read from.
    pub description_dir: PathBuf,
    /// Where binaries are written.
    pub binary_dir: PathBuf,
    /// RDF language for GET, PUT and files.
    pub format: RdfFormat,
    /// Extension of RDF files, including the dot.
    pub rdf_extension: String,
    /// Manifest of a prior bag; selects incremental export.
    pub prior_manifest: Option<PathBuf>,
    /// Connect and read timeout.
    pub timeout: Duration,
    /// Decide but do not write files or PUT.
    pub dry_run: bool,
}

impl Config {
    /// Resolve settings for an export.
    ///
    /// # Errors
    ///
    /// Returns an error if any setting is invalid.
    pub fn for_export(args: &ExportArgs, dry_run: bool) -> Result<Self> {
        let mut config = Self::resolve(&args.transfer, dry_run)?;
        if let Some(binary_dir) = &args.binary_dir {
            config.binary_dir.clone_from(binary_dir);
        }
        config.prior_manifest.clone_from(&args.prior_manifest);
        debug!(?config, "Resolved export configuration");
        Ok(config)
    }

    /// Resolve settings for an import.
    ///
    /// # Errors
    ///
    /// Returns an error if any setting is invalid.
    pub fn for_import(args: &TransferArgs, dry_run: bool) -> Result<Self> {
        let config = Self::resolve(args, dry_run)?;
        debug!(?config, "Resolved import configuration");
        Ok(config)
    }

    fn resolve(args: &TransferArgs, dry_run: bool) -> Result<Self> {
        let resource = parse_resource(&args.resource)?;
        let format = RdfFormat::from_media_type(&args.rdf_lang)?;
        let rdf_extension = match &args.rdf_ext {
            Some(ext) => validate_extension(ext)?,
            None => format.default_extension().to_string(),
        };
        if args.timeout == 0 {
            return Err(Error::InvalidArgument(
                "timeout must be at least 1 second".to_string(),
            ));
        }

        Ok(Self {
            resource,
            description_dir: args.dir.clone(),
            binary_dir: args.dir.clone(),
            format,
            rdf_extension,
            prior_manifest: None,
            timeout: Duration::from_secs(args.timeout),
            dry_run,
        })
    }

    /// URI ↔ path mapping for this run.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource cannot serve as a mapping base.
    pub fn path_mapper(&self) -> Result<PathMapper> {
        Ok(PathMapper::new(self.resource.clone(), self.rdf_extension.clone())?)
    }
}

fn parse_resource(value: &str) -> Result<Url> {
    let url = Url::parse(value)
        .map_err(|e| Error::InvalidArgument(format!("Invalid resource URI '{value}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::InvalidArgument(format!(
            "Invalid resource URI '{value}': scheme must be http or https"
        )));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(Error::InvalidArgument(format!(
            "Invalid resource URI '{value}': query and fragment are not allowed"
        )));
    }
    Ok(url)
}

fn validate_extension(ext: &str) -> Result<String> {
    if ext.len() < 2 || !ext.starts_with('.') || ext.contains('/') {
        return Err(Error::Config(format!(
            "RDF extension '{ext}' must start with '.' and name a file suffix"
        )));
    }
    if ext == BINARY_EXTENSION {
        return Err(Error::Config(format!(
            "RDF extension '{ext}' is reserved for binaries"
        )));
    }
    Ok(ext.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn transfer(resource: &str) -> TransferArgs {
        TransferArgs {
            resource: resource.to_string(),
            dir: PathBuf::from("/tmp/bag/data"),
            rdf_lang: DEFAULT_RDF_LANG.to_string(),
            rdf_ext: None,
            timeout: 30,
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::for_import(&transfer("http://localhost:8080/rest"), false).unwrap();
        assert_eq!(config.format, RdfFormat::JsonLd);
        assert_eq!(config.rdf_extension, ".jsonld");
        assert_eq!(config.binary_dir, config.description_dir);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.prior_manifest.is_none());
    }

    #[test]
    fn test_ntriples_default_extension() {
        let mut args = transfer("http://localhost:8080/rest");
        args.rdf_lang = "application/n-triples".to_string();
        let config = Config::for_import(&args, false).unwrap();
        assert_eq!(config.rdf_extension, ".nt");
    }

    #[test]
    fn test_export_overrides() {
        let args = ExportArgs {
            transfer: transfer("http://localhost:8080/rest"),
            binary_dir: Some(PathBuf::from("/tmp/bag/binaries")),
            prior_manifest: Some(PathBuf::from("/tmp/old/manifest-sha1.txt")),
        };
        let config = Config::for_export(&args, true).unwrap();
        assert_eq!(config.binary_dir, PathBuf::from("/tmp/bag/binaries"));
        assert_eq!(config.description_dir, PathBuf::from("/tmp/bag/data"));
        assert!(config.prior_manifest.is_some());
        assert!(config.dry_run);
    }

    #[test]
    fn test_invalid_resource() {
        for resource in ["not a uri", "ftp://host/rest", "http://host/rest?x=1"] {
            let err = Config::for_import(&transfer(resource), false).unwrap_err();
            assert_eq!(err.error_code(), ErrorCode::InvalidArgument, "{resource}");
        }
    }

    #[test]
    fn test_turtle_unsupported() {
        let mut args = transfer("http://localhost:8080/rest");
        args.rdf_lang = "text/turtle".to_string();
        let err = Config::for_import(&args, false).unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::RdfError);
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn test_bad_extension() {
        for ext in ["jsonld", ".", ".binary", "./x"] {
            let mut args = transfer("http://localhost:8080/rest");
            args.rdf_ext = Some(ext.to_string());
            let err = Config::for_import(&args, false).unwrap_err();
            assert_eq!(err.error_code(), ErrorCode::ConfigError, "{ext}");
        }
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut args = transfer("http://localhost:8080/rest");
        args.timeout = 0;
        assert!(Config::for_import(&args, false).is_err());
    }

    #[test]
    fn test_path_mapper_uses_extension() {
        let mut args = transfer("http://localhost:8080/rest");
        args.rdf_ext = Some(".json".to_string());
        let mapper = Config::for_import(&args, false).unwrap().path_mapper().unwrap();
        assert_eq!(mapper.rdf_extension(), ".json");
    }
}
