//! CLI module
//!
//! Command-line interface for running conversions.
//!
//! # Commands
//!
//! - `convert` - Convert a JSON Lines record file into sorted store files
//! - `inspect` - Dump the rows of a produced store file
//! - `validate` - Validate a conversion config file

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
