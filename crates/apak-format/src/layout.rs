//! Physical layout records stored in the archive index
//!
//! A [`ChunkLayout`] only exists once the writer has placed a chunk's blocks
//! in a file, or once the reader has parsed them back out of the index.
//! In-memory chunks never carry a layout.

use binrw::binrw;

use crate::constants::{BLOCK_SIZE, MAX_PATH_LEN};
use crate::error::{ApakError, ApakResult};

/// Number of blocks a chunk of `len` bytes is split into
pub fn block_count_for(len: usize) -> usize {
    len.div_ceil(BLOCK_SIZE)
}

/// One compressed and obfuscated segment of a chunk (16 bytes on disk)
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    /// Absolute file offset of the stored payload
    pub offset: i64,
    /// Stored payload length
    pub length: i32,
    /// Raw length of the slice before encoding
    pub size: i32,
}

impl Block {
    /// Check this block against the file it was read from
    pub fn validate(&self, file_len: u64) -> ApakResult<()> {
        let start = u64::try_from(self.offset)
            .ok()
            .filter(|&offset| offset < file_len)
            .ok_or(ApakError::InvalidBlockOffset {
                offset: self.offset,
                file_len,
            })?;

        let fits = u64::try_from(self.length)
            .ok()
            .and_then(|length| start.checked_add(length))
            .is_some_and(|end| end <= file_len);
        if !fits {
            return Err(ApakError::BlockOutOfBounds {
                offset: self.offset,
                length: self.length,
                file_len,
            });
        }

        if !(0..=BLOCK_SIZE as i64).contains(&i64::from(self.size)) {
            return Err(ApakError::InvalidBlockSize {
                offset: self.offset,
                size: self.size,
                max: BLOCK_SIZE,
            });
        }
        Ok(())
    }

    /// Offset as an unsigned file position (call [`Block::validate`] first)
    pub fn position(&self) -> u64 {
        self.offset.max(0) as u64
    }

    /// Stored payload length in bytes
    pub fn stored_len(&self) -> usize {
        self.length.max(0) as usize
    }

    /// Raw slice length in bytes
    pub fn raw_len(&self) -> usize {
        self.size.max(0) as usize
    }
}

/// Index record for one chunk: its path, raw size and ordered blocks
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkLayout {
    #[br(assert(
        (0..=MAX_PATH_LEN as i32).contains(&path_len),
        "invalid path length {}",
        path_len
    ))]
    #[bw(try_calc(i32::try_from(path.len())))]
    path_len: i32,

    /// Normalized archive path
    #[br(count = path_len as usize, try_map = |bytes: Vec<u8>| String::from_utf8(bytes))]
    #[bw(map = |path: &String| path.as_bytes().to_vec())]
    pub path: String,

    /// Raw length of the whole chunk
    #[br(assert(original_size >= 0, "negative original size {}", original_size))]
    pub original_size: i32,

    #[br(assert(
        block_count as i64 == block_count_for(original_size as usize) as i64,
        "chunk '{}' of {} bytes records {} blocks",
        path,
        original_size,
        block_count
    ))]
    #[bw(try_calc(i32::try_from(blocks.len())))]
    block_count: i32,

    /// Blocks in physical write order
    #[br(count = block_count as usize)]
    pub blocks: Vec<Block>,
}

impl ChunkLayout {
    /// Create a layout record
    pub fn new(path: String, original_size: i32, blocks: Vec<Block>) -> Self {
        Self {
            path,
            original_size,
            blocks,
        }
    }

    /// Raw size in bytes
    pub fn raw_len(&self) -> usize {
        self.original_size.max(0) as usize
    }

    /// Total stored bytes across all blocks
    pub fn stored_len(&self) -> u64 {
        self.blocks.iter().map(|b| b.stored_len() as u64).sum()
    }
}

/// Complete physical layout of an archive file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveLayout {
    /// Absolute offset where the index begins
    pub index_offset: u64,
    /// Per-chunk layouts in index order
    pub chunks: Vec<ChunkLayout>,
}

impl ArchiveLayout {
    /// Find a chunk layout by normalized path
    pub fn find(&self, path: &str) -> Option<(usize, &ChunkLayout)> {
        self.chunks
            .iter()
            .enumerate()
            .find(|(_, layout)| layout.path == path)
    }

    /// Total number of blocks in the archive
    pub fn block_count(&self) -> usize {
        self.chunks.iter().map(|c| c.blocks.len()).sum()
    }
}
