//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::ConvertConfig;
use crate::convert::Converter;
use crate::error::{Error, Result};
use crate::hfile::HFileReader;
use crate::source::JsonLinesSource;
use serde_json::json;
use std::path::{Path, PathBuf};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Convert {
                input,
                output,
                key_fields,
                records_per_file,
            } => {
                self.convert(
                    input,
                    output.as_deref(),
                    key_fields.as_deref(),
                    *records_per_file,
                )
                .await
            }
            Commands::Inspect { file, limit } => self.inspect(file, *limit),
            Commands::Validate => self.validate(),
        }
    }

    /// Resolve the config from the --config file plus command-line overrides
    fn load_config(
        &self,
        output: Option<&Path>,
        key_fields: Option<&str>,
        records_per_file: Option<usize>,
    ) -> Result<ConvertConfig> {
        let mut config = match &self.cli.config {
            Some(path) => ConvertConfig::from_yaml_file(path)?,
            None => {
                // Without a config file both the destination and the key
                // derivation must come from flags
                let output = output.ok_or_else(|| {
                    Error::config("no config file given; --output is required")
                })?;
                let key_fields = key_fields.ok_or_else(|| {
                    Error::config("no config file given; --key-fields is required")
                })?;
                ConvertConfig::builder(output, key_fields.split(',')).build()?
            }
        };

        if let Some(output) = output {
            config.base_folder = PathBuf::from(output);
        }
        if let Some(fields) = key_fields {
            config.key_fields = fields.split(',').map(str::to_string).collect();
        }
        if let Some(n) = records_per_file {
            config.records_per_file = n;
        }
        config.validate()?;
        Ok(config)
    }

    async fn convert(
        &self,
        input: &Path,
        output: Option<&Path>,
        key_fields: Option<&str>,
        records_per_file: Option<usize>,
    ) -> Result<()> {
        let config = self.load_config(output, key_fields, records_per_file)?;
        let mut source = JsonLinesSource::open(input)?;

        let mut converter = Converter::new(config)?;
        let result = converter.convert(&mut source).await;

        match self.cli.format {
            OutputFormat::Json => {
                let report = json!({
                    "files": result
                        .output_files
                        .iter()
                        .map(|f| json!({
                            "path": f.path.display().to_string(),
                            "row_count": f.row_count,
                        }))
                        .collect::<Vec<_>>(),
                    "records_processed": result.records_processed,
                    "records_skipped": result.records_skipped,
                    "record_errors": result.record_errors,
                    "duration_ms": result.duration_ms,
                    "failure": result.failure.as_ref().map(ToString::to_string),
                });
                println!("{report}");
            }
            OutputFormat::Pretty => {
                for file in &result.output_files {
                    println!("{}  {} rows", file.path.display(), file.row_count);
                }
                println!(
                    "{} records in, {} skipped, {} errored, {} files out ({} ms)",
                    result.records_processed,
                    result.records_skipped,
                    result.record_errors,
                    result.output_files.len(),
                    result.duration_ms
                );
            }
        }

        match result.failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn inspect(&self, file: &Path, limit: usize) -> Result<()> {
        let reader = HFileReader::open(file)?;
        let rows = reader.rows()?;
        let shown = if limit == 0 { rows.len() } else { limit.min(rows.len()) };

        for row in &rows[..shown] {
            match self.cli.format {
                OutputFormat::Json => {
                    let cells: Vec<_> = row
                        .cells
                        .iter()
                        .map(|c| {
                            json!({
                                "family": c.family,
                                "qualifier": c.qualifier,
                                "value": String::from_utf8_lossy(&c.value),
                                "timestamp": c.timestamp,
                            })
                        })
                        .collect();
                    println!("{}", json!({ "key": row.key_display(), "cells": cells }));
                }
                OutputFormat::Pretty => {
                    println!("{}", row.key_display());
                    for cell in &row.cells {
                        println!(
                            "  {}:{} @{} = {}",
                            cell.family,
                            cell.qualifier,
                            cell.timestamp,
                            String::from_utf8_lossy(&cell.value)
                        );
                    }
                }
            }
        }
        if shown < rows.len() {
            eprintln!("... {} more rows", rows.len() - shown);
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let path = self
            .cli
            .config
            .as_ref()
            .ok_or_else(|| Error::config("Config file not specified (use -c flag)"))?;
        let config = ConvertConfig::from_yaml_file(path)?;
        println!(
            "valid: base_folder={}, key_fields={:?}, records_per_file={}",
            config.base_folder.display(),
            config.key_fields,
            config.records_per_file
        );
        Ok(())
    }
}
