//! Fixed-size header and footer records

use binrw::binrw;

use crate::constants::{FOOTER_MAGIC, FORMAT_VERSION, MAGIC};
use crate::error::{ApakError, ApakResult};

/// Archive file header (12 bytes)
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// Magic bytes (always "APAK")
    pub magic: [u8; 4],
    /// Format version
    pub version: i32,
    /// Number of chunks in the index
    pub chunk_count: i32,
}

impl FileHeader {
    /// Create a header for the current format version
    pub fn new(chunk_count: i32) -> Self {
        Self {
            magic: MAGIC,
            version: FORMAT_VERSION,
            chunk_count,
        }
    }

    /// Check magic, version and count
    pub fn validate(&self) -> ApakResult<()> {
        if self.magic != MAGIC {
            return Err(ApakError::InvalidSignature("header magic mismatch"));
        }
        if self.version != FORMAT_VERSION {
            return Err(ApakError::VersionMismatch {
                expected: FORMAT_VERSION,
                found: self.version,
            });
        }
        if self.chunk_count < 0 {
            return Err(ApakError::InvalidIndex {
                pos: 8,
                reason: format!("negative chunk count {}", self.chunk_count),
            });
        }
        Ok(())
    }

    /// Number of chunks as an unsigned count
    pub fn chunk_count(&self) -> usize {
        self.chunk_count.max(0) as usize
    }
}

/// Archive file footer (12 bytes)
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileFooter {
    /// Absolute offset of the index
    pub index_offset: i64,
    /// Footer magic (always 0x4B41504B)
    pub magic: u32,
}

impl FileFooter {
    /// Create a footer pointing at `index_offset`
    pub fn new(index_offset: i64) -> Self {
        Self {
            index_offset,
            magic: FOOTER_MAGIC,
        }
    }

    /// Check the magic and that the index lies between header and footer
    pub fn validate(&self, file_len: u64) -> ApakResult<()> {
        use crate::constants::{FOOTER_SIZE, HEADER_SIZE};

        if self.magic != FOOTER_MAGIC {
            return Err(ApakError::InvalidSignature("footer magic mismatch"));
        }

        let index_end = file_len.saturating_sub(FOOTER_SIZE);
        let in_range = u64::try_from(self.index_offset)
            .is_ok_and(|offset| (HEADER_SIZE..=index_end).contains(&offset));
        if !in_range {
            return Err(ApakError::InvalidIndexOffset {
                offset: self.index_offset,
                file_len,
            });
        }
        Ok(())
    }
}
