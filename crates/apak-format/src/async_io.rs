//! Asynchronous save and load
//!
//! Both operations run the blocking implementation on tokio's blocking pool.
//! Cancellation is only honored before the worker starts; a save or load
//! that has begun runs to completion.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::archive::Archive;
use crate::error::{ApakError, ApakResult};
use crate::layout::ArchiveLayout;

/// Simple cancellation token shared between a caller and a worker task
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new cancellation token
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the operation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Check if the operation has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

async fn run_blocking<T, F>(token: &CancellationToken, operation: F) -> ApakResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> ApakResult<T> + Send + 'static,
{
    if token.is_cancelled() {
        return Err(ApakError::Cancelled);
    }

    let token = token.clone();
    tokio::task::spawn_blocking(move || {
        if token.is_cancelled() {
            debug!("Cancelled before the worker started");
            return Err(ApakError::Cancelled);
        }
        operation()
    })
    .await
    .map_err(|e| ApakError::Task(e.to_string()))?
}

/// Save `archive` to `path` on a worker task
pub async fn save_async(
    archive: Arc<Archive>,
    path: impl Into<PathBuf>,
    token: &CancellationToken,
) -> ApakResult<ArchiveLayout> {
    let path = path.into();
    run_blocking(token, move || archive.save(path)).await
}

/// Load the archive at `path` on a worker task
pub async fn load_async(path: impl Into<PathBuf>, token: &CancellationToken) -> ApakResult<Archive> {
    let path = path.into();
    run_blocking(token, move || Archive::load(path)).await
}
