//! Command-line configuration.
//!
//! Configuration comes from CLI arguments with environment variable
//! fallbacks for the logging options:
//! - `APAK_LOG` sets the log filter (`info`, `debug`, `apak_format=trace`, ...)
//! - `APAK_JSON_LOGS` switches log output to JSON lines
//!
//! # Example
//!
//! ```no_run
//! use apak_cli::CliConfig;
//!
//! let config = CliConfig::from_args();
//! config.validate().expect("Invalid configuration");
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::error::ConfigError;

/// Top-level configuration loaded from CLI args and environment variables.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "apak",
    about = "Pack, unpack and inspect APAK archives",
    version
)]
pub struct CliConfig {
    /// Log filter directive
    #[arg(long, global = true, env = "APAK_LOG", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "APAK_JSON_LOGS")]
    pub json_logs: bool,

    /// Operation to run
    #[command(subcommand)]
    pub command: Command,
}

/// Archive operations.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create an archive from files and directories
    Pack {
        /// Archive file to write
        output: PathBuf,
        /// Files or directories to add
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Archive directory to place entries under
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Extract every entry of an archive
    Unpack {
        /// Archive file to read
        archive: PathBuf,
        /// Directory to extract into
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Show the index of an archive without decoding payloads
    List {
        /// Archive file to read
        archive: PathBuf,
    },

    /// Fully decode an archive and report whether it is intact
    Verify {
        /// Archive file to read
        archive: PathBuf,
    },
}

impl CliConfig {
    /// Parse configuration from command-line arguments.
    #[must_use]
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Validate configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - an input or archive file doesn't exist
    /// - the pack output is an existing directory
    /// - the unpack output exists but is not a directory
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.command {
            Command::Pack { output, inputs, .. } => {
                if let Some(missing) = inputs.iter().find(|input| !input.exists()) {
                    return Err(ConfigError::MissingPath(missing.clone()));
                }
                if output.is_dir() {
                    return Err(ConfigError::InvalidOutput {
                        path: output.clone(),
                        reason: "is a directory".to_string(),
                    });
                }
            }
            Command::Unpack { archive, output } => {
                if !archive.is_file() {
                    return Err(ConfigError::MissingPath(archive.clone()));
                }
                if output.exists() && !output.is_dir() {
                    return Err(ConfigError::InvalidOutput {
                        path: output.clone(),
                        reason: "exists and is not a directory".to_string(),
                    });
                }
            }
            Command::List { archive } | Command::Verify { archive } => {
                if !archive.is_file() {
                    return Err(ConfigError::MissingPath(archive.clone()));
                }
            }
        }
        Ok(())
    }
}
