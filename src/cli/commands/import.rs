//! Import command implementation.

use colored::Colorize;

use crate::cli::TransferArgs;
use crate::client::HttpClient;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::sync::Importer;

/// Execute the import command.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the description
/// directory does not exist.
pub fn execute(args: &TransferArgs, dry_run: bool, json: bool) -> Result<()> {
    let config = Config::for_import(args, dry_run)?;
    if !config.description_dir.is_dir() {
        return Err(Error::DirectoryNotFound {
            path: config.description_dir.clone(),
        });
    }

    let mapper = config.path_mapper()?;
    let client = HttpClient::new(config.timeout)?;
    let stats = Importer::new(&client, &mapper, config.format)
        .dry_run(config.dry_run)
        .import_all(&config.description_dir)?;

    if json {
        let output = serde_json::json!({
            "success": true,
            "resource": config.resource.as_str(),
            "import_dir": config.description_dir.display().to_string(),
            "dry_run": config.dry_run,
            "stats": stats,
        });
        println!("{}", serde_json::to_string(&output)?);
    } else if stats.total() == 0 {
        println!("No RDF files found in: {}", config.description_dir.display());
    } else {
        let heading = if config.dry_run {
            "Import dry run for:"
        } else {
            "Import complete for:"
        };
        println!("{} {}", heading.green().bold(), config.resource);
        println!();
        println!("  Imported: {}", stats.imported);
        println!("  Skipped:  {}", stats.skipped.to_string().dimmed());
        if stats.failed > 0 {
            println!("  Failed:   {}", stats.failed.to_string().red());
        }
        println!("  Server-managed triples removed: {}", stats.removed_triples);
    }
    Ok(())
}
