//! Command-line front end for APAK archives.
//!
//! The `apak` binary is a thin wrapper around this library:
//! - `config`: CLI arguments and environment fallbacks
//! - `logging`: tracing subscriber setup
//! - `commands`: pack, unpack, list and verify
//!
//! # Example
//!
//! ```no_run
//! use apak_cli::{CliConfig, commands};
//! use apak_format::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = CliConfig::from_args();
//!     config.validate()?;
//!     apak_cli::logging::init(&config.log_level, config.json_logs)?;
//!
//!     commands::run(config.command, CancellationToken::new()).await
//! }
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::panic))]

pub mod commands;
pub mod config;
pub mod error;
pub mod logging;

pub use config::{CliConfig, Command};
pub use error::ConfigError;
