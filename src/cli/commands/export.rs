//! Export command implementation.

use colored::Colorize;

use crate::cli::ExportArgs;
use crate::client::HttpClient;
use crate::config::Config;
use crate::error::Result;
use crate::sync::{AccretionFilter, ExportFilter, ExportStats, Exporter, IncludeAll};

/// Execute the export command.
///
/// The prior manifest, if any, is loaded before the repository is
/// contacted, so a malformed manifest fails the run up front.
///
/// # Errors
///
/// Returns an error if the configuration or prior manifest is invalid,
/// or the output directories cannot be created.
pub fn execute(args: &ExportArgs, dry_run: bool, json: bool) -> Result<()> {
    let config = Config::for_export(args, dry_run)?;
    let mapper = config.path_mapper()?;
    let client = HttpClient::new(config.timeout)?;

    let filter: Box<dyn ExportFilter + '_> = match &config.prior_manifest {
        Some(manifest) => Box::new(AccretionFilter::load(manifest, &client, &mapper, config.format)?),
        None => Box::new(IncludeAll),
    };

    let stats = Exporter::new(
        &client,
        filter.as_ref(),
        &mapper,
        config.format,
        config.description_dir.clone(),
    )
    .with_binary_dir(config.binary_dir.clone())
    .dry_run(config.dry_run)
    .export()?;

    if json {
        let output = serde_json::json!({
            "success": true,
            "resource": config.resource.as_str(),
            "description_dir": config.description_dir.display().to_string(),
            "binary_dir": config.binary_dir.display().to_string(),
            "incremental": config.prior_manifest.is_some(),
            "dry_run": config.dry_run,
            "stats": stats,
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        print_stats(&config, &stats);
    }
    Ok(())
}

fn print_stats(config: &Config, stats: &ExportStats) {
    let heading = if config.dry_run {
        "Export dry run for:"
    } else {
        "Export complete for:"
    };
    println!("{} {}", heading.green().bold(), config.resource);
    println!();
    println!("  RDF resources: {}", stats.included_rdf);
    println!("  Binaries:      {}", stats.included_binaries);
    if config.prior_manifest.is_some() {
        println!("  Unchanged:     {}", stats.unchanged.to_string().dimmed());
    }
    if stats.failed > 0 {
        println!("  Failed:        {}", stats.failed.to_string().red());
    }
    println!();
    println!("  Descriptions: {}", config.description_dir.display());
    if config.binary_dir != config.description_dir {
        println!("  Binaries:     {}", config.binary_dir.display());
    }
}
