//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DEFAULT_RDF_LANG;

pub mod commands;

/// bagsync - Export repository resources into bags and import them back
#[derive(Parser, Debug)]
#[command(name = "bagsync", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Decide what would happen without writing files or sending PUTs
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export a repository subtree into bag directories
    Export(ExportArgs),

    /// Replay exported RDF descriptions into the repository
    Import(TransferArgs),

    /// Print version information
    Version,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Settings shared by export and import.
#[derive(Args, Debug, Clone)]
pub struct TransferArgs {
    /// Base URI of the repository subtree (e.g. http://localhost:8080/rest)
    #[arg(short, long, env = "BAGSYNC_RESOURCE")]
    pub resource: String,

    /// Description directory (export target, import source)
    #[arg(short, long, env = "BAGSYNC_DIR")]
    pub dir: PathBuf,

    /// RDF language used for requests and files
    #[arg(short = 'l', long, env = "BAGSYNC_RDF_LANG", default_value = DEFAULT_RDF_LANG)]
    pub rdf_lang: String,

    /// Extension of RDF files (default: from the RDF language)
    #[arg(short = 'x', long, env = "BAGSYNC_RDF_EXT")]
    pub rdf_ext: Option<String>,

    /// Connect and read timeout in seconds
    #[arg(long, env = "BAGSYNC_TIMEOUT", default_value_t = 30)]
    pub timeout: u64,
}

/// Export-only settings.
#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub transfer: TransferArgs,

    /// Binary directory (default: the description directory)
    #[arg(short, long, env = "BAGSYNC_BINARY_DIR")]
    pub binary_dir: Option<PathBuf>,

    /// Manifest of a prior bag; only new or changed resources are exported
    #[arg(long, env = "BAGSYNC_PRIOR_MANIFEST")]
    pub prior_manifest: Option<PathBuf>,
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}
