//! Command-line argument parsing for Snowpane.
//!
//! Warehouse credentials always come from the environment; the flags only
//! choose between the terminal page and headless mode.

use crate::error::{Result, SnowpaneError};
use crate::tui::headless::OutputFormat;
use clap::Parser;
use std::path::PathBuf;

/// Run SQL against a Snowflake warehouse and view the result as a table or bar chart.
#[derive(Parser, Debug)]
#[command(name = "snowpane")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(long, value_name = "PATH", env = "SNOWPANE_CONFIG")]
    pub config: Option<PathBuf>,

    // === Headless mode options ===
    /// Run this SQL without the terminal UI and print the result
    #[arg(short = 'e', long, value_name = "SQL", conflicts_with = "file")]
    pub execute: Option<String>,

    /// Run the SQL in this file without the terminal UI ("-" for stdin)
    #[arg(short = 'f', long, value_name = "PATH")]
    pub file: Option<String>,

    /// Print the session context (role, warehouse, database, schema)
    #[arg(long)]
    pub context: bool,

    /// Submit the SQL as written, without the row cap
    #[arg(long)]
    pub no_limit: bool,

    /// Use the in-memory demo warehouse instead of Snowflake
    #[arg(long)]
    pub mock_db: bool,

    /// Output format for headless mode: text, json, or screen
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub output: String,

    /// Screen size for --output screen (WIDTHxHEIGHT, e.g., "120x40")
    #[arg(long, value_name = "SIZE", default_value = "120x40")]
    pub size: String,

    /// Write output to file instead of stdout
    #[arg(long, value_name = "PATH")]
    pub output_file: Option<PathBuf>,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::Config::default_path)
    }

    /// Returns true if any headless action was requested.
    pub fn is_headless(&self) -> bool {
        self.execute.is_some() || self.file.is_some() || self.context
    }

    /// Returns the SQL from --execute or --file, if given.
    pub fn sql_text(&self) -> Result<Option<String>> {
        if let Some(sql) = &self.execute {
            return Ok(Some(sql.clone()));
        }

        match self.file.as_deref() {
            None => Ok(None),
            Some("-") => {
                let mut sql = String::new();
                std::io::Read::read_to_string(&mut std::io::stdin(), &mut sql).map_err(|e| {
                    SnowpaneError::config(format!("Failed to read SQL from stdin: {e}"))
                })?;
                Ok(Some(sql))
            }
            Some(path) => std::fs::read_to_string(path)
                .map(Some)
                .map_err(|e| SnowpaneError::config(format!("Failed to read SQL file {path}: {e}"))),
        }
    }

    /// Parses the screen size from the --size argument.
    /// Returns (width, height) or an error.
    pub fn parse_screen_size(&self) -> std::result::Result<(u16, u16), String> {
        let invalid = || {
            format!(
                "Invalid size format: '{}'. Expected WIDTHxHEIGHT (e.g., 120x40)",
                self.size
            )
        };
        let (width, height) = self.size.split_once('x').ok_or_else(invalid)?;
        let width = width
            .parse::<u16>()
            .map_err(|_| format!("Invalid width: '{width}'"))?;
        let height = height
            .parse::<u16>()
            .map_err(|_| format!("Invalid height: '{height}'"))?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok((width, height))
    }

    /// Parses the output format from the --output argument.
    pub fn parse_output_format(&self) -> std::result::Result<OutputFormat, String> {
        self.output.parse()
    }

    /// Validates headless mode arguments.
    pub fn validate(&self) -> std::result::Result<(), String> {
        self.parse_output_format()?;
        self.parse_screen_size()?;

        if !self.is_headless() && self.output_file.is_some() {
            return Err("--output-file requires --execute, --file or --context".to_string());
        }

        Ok(())
    }
}
