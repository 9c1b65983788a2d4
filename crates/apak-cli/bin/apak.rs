//! APAK command-line tool entry point.
//!
//! This is a thin wrapper around the apak-cli library that:
//! 1. Parses command-line arguments
//! 2. Initializes logging
//! 3. Validates configuration
//! 4. Runs the requested command
//!
//! Ctrl-C before an archive save or load has started cancels it; once
//! started, the operation runs to completion.

use anyhow::Result;
use apak_cli::{CliConfig, commands, logging};
use apak_format::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    let config = CliConfig::from_args();
    logging::init(&config.log_level, config.json_logs)?;

    tracing::debug!("Configuration loaded: {:?}", config);
    config.validate()?;

    let token = CancellationToken::new();
    let signal_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling pending archive operations");
            signal_token.cancel();
        }
    });

    commands::run(config.command, token).await
}
