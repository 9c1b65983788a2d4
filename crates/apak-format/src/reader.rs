//! Archive file reader
//!
//! Opening a reader validates the header and footer and parses the whole
//! index. Chunk payloads are only read and decoded on request.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use binrw::BinReaderExt;
use tracing::{debug, trace};

use crate::chunk::{Chunk, normalize_path};
use crate::codec::decode_block;
use crate::constants::{FOOTER_SIZE, MIN_ARCHIVE_SIZE, MIN_INDEX_RECORD_SIZE};
use crate::error::{ApakError, ApakResult};
use crate::header::{FileFooter, FileHeader};
use crate::layout::{ArchiveLayout, ChunkLayout};

/// Random-access reader over an archive file
pub struct ArchiveReader<R: Read + Seek> {
    /// Underlying reader
    reader: R,
    /// Total length of the archive
    file_len: u64,
    /// Parsed header
    header: FileHeader,
    /// Parsed index
    layout: ArchiveLayout,
}

impl<R: Read + Seek> ArchiveReader<R> {
    /// Validate header and footer and parse the index
    pub fn new(mut reader: R) -> ApakResult<Self> {
        let file_len = reader.seek(SeekFrom::End(0))?;
        if file_len < MIN_ARCHIVE_SIZE {
            return Err(ApakError::Truncated {
                len: file_len,
                min: MIN_ARCHIVE_SIZE,
            });
        }

        reader.seek(SeekFrom::Start(0))?;
        let header: FileHeader = reader.read_le()?;
        header.validate()?;

        reader.seek(SeekFrom::Start(file_len - FOOTER_SIZE))?;
        let footer: FileFooter = reader.read_le()?;
        footer.validate(file_len)?;

        let index_offset = footer.index_offset as u64;
        let index_end = file_len - FOOTER_SIZE;
        let chunk_count = header.chunk_count();

        // Every record needs at least its fixed fields, which bounds the count
        if chunk_count as u64 > (index_end - index_offset) / MIN_INDEX_RECORD_SIZE {
            return Err(ApakError::InvalidIndex {
                pos: index_offset,
                reason: format!(
                    "{chunk_count} chunks cannot fit in {} index bytes",
                    index_end - index_offset
                ),
            });
        }

        reader.seek(SeekFrom::Start(index_offset))?;
        let mut chunks = Vec::with_capacity(chunk_count);
        for _ in 0..chunk_count {
            let layout: ChunkLayout = reader.read_le()?;
            normalize_path(&layout.path).map_err(|_| ApakError::InvalidIndex {
                pos: index_offset,
                reason: "empty chunk path".to_string(),
            })?;
            chunks.push(layout);
        }

        let end = reader.stream_position()?;
        if end > index_end {
            return Err(ApakError::InvalidIndex {
                pos: end,
                reason: format!("index runs into the footer at {index_end}"),
            });
        }

        debug!(
            "Opened archive: {} bytes, {} chunks, index at {}",
            file_len, chunk_count, index_offset
        );

        Ok(Self {
            reader,
            file_len,
            header,
            layout: ArchiveLayout {
                index_offset,
                chunks,
            },
        })
    }

    /// Parsed header
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Total archive length in bytes
    pub fn file_len(&self) -> u64 {
        self.file_len
    }

    /// Parsed index, without decoding any payload
    pub fn layout(&self) -> &ArchiveLayout {
        &self.layout
    }

    /// Per-chunk layouts in index order
    pub fn layouts(&self) -> &[ChunkLayout] {
        &self.layout.chunks
    }

    /// Number of chunks in the index
    pub fn len(&self) -> usize {
        self.layout.chunks.len()
    }

    /// Whether the archive holds no chunks
    pub fn is_empty(&self) -> bool {
        self.layout.chunks.is_empty()
    }

    /// Index position of the chunk stored under `path`
    pub fn find(&self, path: &str) -> Option<usize> {
        let path = normalize_path(path).ok()?;
        self.layout.find(&path).map(|(index, _)| index)
    }

    /// Reconstruct the chunk at index position `index`
    ///
    /// Every block of the chunk is read and decoded.
    pub fn read_chunk(&mut self, index: usize) -> ApakResult<Chunk> {
        let layout = self.layout.chunks.get(index).ok_or_else(|| {
            ApakError::argument(format!(
                "chunk index {index} out of range ({} chunks)",
                self.layout.chunks.len()
            ))
        })?;

        let expected = layout.raw_len();
        let mut data = Vec::new();
        for block in &layout.blocks {
            block.validate(self.file_len)?;

            self.reader.seek(SeekFrom::Start(block.position()))?;
            let mut payload = vec![0u8; block.stored_len()];
            self.reader.read_exact(&mut payload)?;

            let decoded = decode_block(payload, block.raw_len())?;
            if decoded.len() != block.raw_len() {
                return Err(ApakError::SizeMismatch {
                    path: layout.path.clone(),
                    expected: block.raw_len() as u64,
                    actual: decoded.len() as u64,
                });
            }

            trace!(
                "Decoded block of '{}' at {}: {} -> {} bytes",
                layout.path, block.offset, block.length, block.size
            );
            data.extend_from_slice(&decoded);
        }

        if data.len() != expected {
            return Err(ApakError::SizeMismatch {
                path: layout.path.clone(),
                expected: expected as u64,
                actual: data.len() as u64,
            });
        }

        Ok(Chunk::from_parts(layout.path.clone(), data))
    }

    /// Reconstruct the chunk stored under `path`
    pub fn read_path(&mut self, path: &str) -> ApakResult<Chunk> {
        let index = self
            .find(path)
            .ok_or_else(|| ApakError::argument(format!("no entry named '{path}'")))?;
        self.read_chunk(index)
    }

    /// Reconstruct every chunk in index order
    pub fn read_all(&mut self) -> ApakResult<Vec<Chunk>> {
        (0..self.layout.chunks.len())
            .map(|index| self.read_chunk(index))
            .collect()
    }

    /// Return the underlying reader
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl ArchiveReader<BufReader<File>> {
    /// Open an archive file from path
    pub fn open<P: AsRef<Path>>(path: P) -> ApakResult<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}
