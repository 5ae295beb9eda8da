//! Version command implementation.

use crate::error::Result;
use crate::rdf::RdfFormat;
use serde::Serialize;

#[derive(Serialize)]
struct VersionOutput<'a> {
    version: &'a str,
    build: &'a str,
    rdf_languages: [&'a str; 2],
}

/// Execute the version command.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn execute(json: bool) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    let build = if cfg!(debug_assertions) {
        "dev"
    } else {
        "release"
    };
    let rdf_languages = [
        RdfFormat::JsonLd.media_type(),
        RdfFormat::NTriples.media_type(),
    ];

    if json {
        let output = VersionOutput {
            version,
            build,
            rdf_languages,
        };
        let payload = serde_json::to_string(&output)?;
        println!("{payload}");
        return Ok(());
    }

    println!("bagsync version {version} ({build})");
    println!("RDF languages: {}", rdf_languages.join(", "));
    Ok(())
}
