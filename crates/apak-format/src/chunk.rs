//! In-memory archive entries

use crate::constants::MAX_PATH_LEN;
use crate::error::{ApakError, ApakResult};

/// Normalize an archive path to forward-slash separators
///
/// Rejects empty paths and paths that consist only of separators.
pub fn normalize_path(path: &str) -> ApakResult<String> {
    let normalized = path.replace('\\', "/");
    if normalized.trim_matches('/').is_empty() {
        return Err(ApakError::argument(format!(
            "archive path must not be empty (got {path:?})"
        )));
    }
    if normalized.len() > MAX_PATH_LEN {
        return Err(ApakError::argument(format!(
            "archive path is {} bytes, the limit is {MAX_PATH_LEN}",
            normalized.len()
        )));
    }
    Ok(normalized)
}

/// One named entry: a normalized path and the raw bytes it owns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    path: String,
    data: Vec<u8>,
}

impl Chunk {
    /// Create a chunk, normalizing its path
    pub fn new(path: &str, data: Vec<u8>) -> ApakResult<Self> {
        Ok(Self {
            path: normalize_path(path)?,
            data,
        })
    }

    /// Build from an already normalized path read out of an index
    pub(crate) fn from_parts(path: String, data: Vec<u8>) -> Self {
        Self { path, data }
    }

    /// Normalized archive path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw content
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Raw size in bytes
    pub fn original_size(&self) -> usize {
        self.data.len()
    }

    /// Decode the content as UTF-8
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }

    /// Split into path and content
    pub fn into_parts(self) -> (String, Vec<u8>) {
        (self.path, self.data)
    }
}
