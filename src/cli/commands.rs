//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// bulkfile: record streams to sorted immutable store files
#[derive(Parser, Debug)]
#[command(name = "bulkfile")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Conversion config file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format for reports
    #[arg(short, long, global = true, default_value = "pretty")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert a JSON Lines record file into sorted store files
    Convert {
        /// Input records (JSON Lines, one object per line)
        #[arg(short, long)]
        input: PathBuf,

        /// Destination directory (overrides the config's base_folder)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Row key field(s), comma-separated (overrides the config)
        #[arg(short, long)]
        key_fields: Option<String>,

        /// Rows per output file (overrides the config)
        #[arg(long)]
        records_per_file: Option<usize>,
    },

    /// Dump the rows of a produced store file
    Inspect {
        /// The store file to read
        file: PathBuf,

        /// Maximum rows to print (0 = all)
        #[arg(long, default_value = "0")]
        limit: usize,
    },

    /// Validate a conversion config file
    Validate,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one object per line)
    Json,
    /// Human-readable output
    Pretty,
}
