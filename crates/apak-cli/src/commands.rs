//! Command implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use apak_format::{Archive, ArchiveReader, CancellationToken, load_async, save_async};
use tracing::info;

use crate::config::Command;

/// One line of `apak list` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySummary {
    /// Archive path
    pub path: String,
    /// Raw size in bytes
    pub size: u64,
    /// Stored size in bytes
    pub stored: u64,
    /// Number of blocks
    pub blocks: usize,
}

/// Totals reported by `apak verify`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyReport {
    /// Number of chunks decoded
    pub chunks: usize,
    /// Raw bytes decoded
    pub bytes: u64,
}

/// Run a command to completion.
pub async fn run(command: Command, token: CancellationToken) -> Result<()> {
    match command {
        Command::Pack {
            output,
            inputs,
            prefix,
        } => {
            let count = pack(&output, &inputs, prefix.as_deref(), &token).await?;
            info!("Packed {} entries into {}", count, output.display());
        }
        Command::Unpack { archive, output } => {
            let written = unpack(&archive, &output, &token).await?;
            info!("Extracted {} entries to {}", written.len(), output.display());
        }
        Command::List { archive } => {
            for entry in list(&archive)? {
                println!(
                    "{:>12} {:>12} {:>6}  {}",
                    entry.size, entry.stored, entry.blocks, entry.path
                );
            }
        }
        Command::Verify { archive } => {
            let report = verify(&archive, &token).await?;
            println!(
                "OK: {} chunks, {} bytes in {}",
                report.chunks,
                report.bytes,
                archive.display()
            );
        }
    }
    Ok(())
}

/// Build an archive from files and directories and save it.
///
/// Returns the number of entries written.
pub async fn pack(
    output: &Path,
    inputs: &[PathBuf],
    prefix: Option<&str>,
    token: &CancellationToken,
) -> Result<usize> {
    let mut archive = Archive::new();
    for input in inputs {
        if input.is_dir() {
            archive
                .add_directory(input, prefix)
                .with_context(|| format!("Failed to add directory {}", input.display()))?;
        } else {
            let name = match (prefix, input.file_name().and_then(|n| n.to_str())) {
                (Some(prefix), Some(name)) => {
                    Some(format!("{}/{name}", prefix.trim_end_matches(['/', '\\'])))
                }
                _ => None,
            };
            archive
                .add_file_from_disk(input, name.as_deref())
                .with_context(|| format!("Failed to add file {}", input.display()))?;
        }
    }

    let count = archive.len();
    save_async(Arc::new(archive), output, token)
        .await
        .with_context(|| format!("Failed to save {}", output.display()))?;
    Ok(count)
}

/// Load an archive and extract every entry below `output`.
pub async fn unpack(
    archive_path: &Path,
    output: &Path,
    token: &CancellationToken,
) -> Result<Vec<PathBuf>> {
    let archive = load_async(archive_path, token)
        .await
        .with_context(|| format!("Failed to load {}", archive_path.display()))?;

    let output = output.to_path_buf();
    let written = tokio::task::spawn_blocking(move || archive.extract_to(&output))
        .await
        .context("Extraction task failed")??;
    Ok(written)
}

/// Read the index of an archive without decoding payloads.
pub fn list(archive_path: &Path) -> Result<Vec<EntrySummary>> {
    let reader = ArchiveReader::open(archive_path)
        .with_context(|| format!("Failed to open {}", archive_path.display()))?;

    Ok(reader
        .layouts()
        .iter()
        .map(|layout| EntrySummary {
            path: layout.path.clone(),
            size: layout.raw_len() as u64,
            stored: layout.stored_len(),
            blocks: layout.blocks.len(),
        })
        .collect())
}

/// Decode every chunk of an archive.
pub async fn verify(archive_path: &Path, token: &CancellationToken) -> Result<VerifyReport> {
    let archive = load_async(archive_path, token)
        .await
        .with_context(|| format!("Verification of {} failed", archive_path.display()))?;

    Ok(VerifyReport {
        chunks: archive.len(),
        bytes: archive.iter().map(|c| c.original_size() as u64).sum(),
    })
}
