//! Archive file writer
//!
//! Writes the header, then each chunk's encoded blocks back to back, then
//! the index and the footer:
//!
//! ```text
//! [header][block payloads...][index records...][footer]
//! ```
//!
//! Block offsets are absolute and the footer is found from the end of the
//! file, so the sink must be empty. The layout is computed here and nowhere
//! else.

use std::io::{Seek, SeekFrom, Write};

use binrw::BinWriterExt;
use tracing::{debug, trace};

use crate::chunk::Chunk;
use crate::codec::encode_block;
use crate::constants::{BLOCK_SIZE, HEADER_SIZE};
use crate::error::{ApakError, ApakResult};
use crate::header::{FileFooter, FileHeader};
use crate::layout::{ArchiveLayout, Block, ChunkLayout};

/// Streaming writer for archive files
pub struct ArchiveWriter<W: Write + Seek> {
    /// Underlying writer
    writer: W,
    /// Current write position
    position: u64,
    /// Chunk count announced in the header
    expected_chunks: usize,
    /// Layouts of the chunks written so far
    layouts: Vec<ChunkLayout>,
}

impl<W: Write + Seek> ArchiveWriter<W> {
    /// Start an archive holding exactly `chunk_count` chunks
    ///
    /// The header is written immediately. The sink must be empty.
    pub fn new(mut writer: W, chunk_count: usize) -> ApakResult<Self> {
        let count = i32::try_from(chunk_count).map_err(|_| {
            ApakError::argument(format!("too many chunks for one archive: {chunk_count}"))
        })?;

        let existing = writer.seek(SeekFrom::End(0))?;
        if existing != 0 {
            return Err(ApakError::argument(format!(
                "archive sink is not empty ({existing} bytes)"
            )));
        }
        writer.write_le(&FileHeader::new(count))?;

        Ok(Self {
            writer,
            position: HEADER_SIZE,
            expected_chunks: chunk_count,
            layouts: Vec::with_capacity(chunk_count),
        })
    }

    /// Encode a chunk's blocks and append them to the payload area
    pub fn add_chunk(&mut self, chunk: &Chunk) -> ApakResult<&ChunkLayout> {
        if self.layouts.len() == self.expected_chunks {
            return Err(ApakError::argument(format!(
                "archive header announced {} chunks, cannot add '{}'",
                self.expected_chunks,
                chunk.path()
            )));
        }

        let too_large = || ApakError::EntryTooLarge {
            path: chunk.path().to_string(),
            size: chunk.original_size() as u64,
        };
        let original_size = i32::try_from(chunk.original_size()).map_err(|_| too_large())?;

        let mut blocks = Vec::with_capacity(crate::layout::block_count_for(chunk.original_size()));
        for slice in chunk.data().chunks(BLOCK_SIZE) {
            let payload = encode_block(slice)?;
            let block = Block {
                offset: i64::try_from(self.position).map_err(|_| too_large())?,
                length: i32::try_from(payload.len()).map_err(|_| too_large())?,
                // Slices never exceed BLOCK_SIZE
                size: slice.len() as i32,
            };

            self.writer.write_all(&payload)?;
            self.position += payload.len() as u64;

            trace!(
                "Wrote block of '{}' at {}: {} -> {} bytes",
                chunk.path(),
                block.offset,
                block.size,
                block.length
            );
            blocks.push(block);
        }

        let layout = ChunkLayout::new(chunk.path().to_string(), original_size, blocks);
        debug!(
            "Added '{}' ({} bytes, {} blocks, {} stored bytes)",
            layout.path,
            layout.original_size,
            layout.blocks.len(),
            layout.stored_len()
        );

        self.layouts.push(layout);
        Ok(&self.layouts[self.layouts.len() - 1])
    }

    /// Current write position
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Write the index and footer, returning the sink and the final layout
    pub fn finish(mut self) -> ApakResult<(W, ArchiveLayout)> {
        if self.layouts.len() != self.expected_chunks {
            return Err(ApakError::argument(format!(
                "archive header announced {} chunks but {} were written",
                self.expected_chunks,
                self.layouts.len()
            )));
        }

        let index_offset = self.position;
        for layout in &self.layouts {
            self.writer.write_le(layout)?;
        }

        let footer_offset = i64::try_from(index_offset)
            .map_err(|_| ApakError::argument("archive exceeds the maximum file size"))?;
        self.writer.write_le(&FileFooter::new(footer_offset))?;
        self.writer.flush()?;

        debug!(
            "Finished archive: {} chunks, index at {}",
            self.layouts.len(),
            index_offset
        );

        Ok((
            self.writer,
            ArchiveLayout {
                index_offset,
                chunks: self.layouts,
            },
        ))
    }
}

/// Write `chunks` as a complete archive to `writer`
pub fn write_archive<W: Write + Seek>(writer: W, chunks: &[Chunk]) -> ApakResult<(W, ArchiveLayout)> {
    let mut archive = ArchiveWriter::new(writer, chunks.len())?;
    for chunk in chunks {
        archive.add_chunk(chunk)?;
    }
    archive.finish()
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::constants::{FOOTER_MAGIC, FOOTER_SIZE, MAGIC};
    use crate::reader::ArchiveReader;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn chunk(path: &str, data: &[u8]) -> Chunk {
        Chunk::new(path, data.to_vec()).expect("Test operation should succeed")
    }

    #[test]
    fn test_empty_archive() {
        let (cursor, layout) =
            write_archive(Cursor::new(Vec::new()), &[]).expect("Test operation should succeed");
        let bytes = cursor.into_inner();

        assert_eq!(bytes.len() as u64, HEADER_SIZE + FOOTER_SIZE);
        assert_eq!(&bytes[0..4], &MAGIC);
        assert_eq!(layout.index_offset, HEADER_SIZE);
        assert!(layout.chunks.is_empty());
        assert_eq!(&bytes[12..20], &12i64.to_le_bytes());
        assert_eq!(&bytes[20..24], &FOOTER_MAGIC.to_le_bytes());
    }

    #[test]
    fn test_blocks_are_contiguous() {
        let chunks = [
            chunk("textures/grass.txt", b"Hello World"),
            chunk("config/settings.json", b"{ \"ok\": true }"),
        ];
        let (cursor, layout) =
            write_archive(Cursor::new(Vec::new()), &chunks).expect("Test operation should succeed");
        let bytes = cursor.into_inner();

        let mut expected_offset = HEADER_SIZE as i64;
        for (chunk, chunk_layout) in chunks.iter().zip(&layout.chunks) {
            assert_eq!(chunk_layout.path, chunk.path());
            assert_eq!(chunk_layout.raw_len(), chunk.original_size());
            assert_eq!(chunk_layout.blocks.len(), 1);
            let block = chunk_layout.blocks[0];
            assert_eq!(block.offset, expected_offset);
            assert_eq!(block.raw_len(), chunk.original_size());
            expected_offset += i64::from(block.length);
        }
        assert_eq!(layout.index_offset, expected_offset as u64);

        let footer = &bytes[bytes.len() - 12..];
        assert_eq!(&footer[0..8], &expected_offset.to_le_bytes());
    }

    #[test]
    fn test_zero_length_chunk_has_no_blocks() {
        let (_, layout) = write_archive(Cursor::new(Vec::new()), &[chunk("empty.bin", b"")])
            .expect("Test operation should succeed");

        assert_eq!(layout.chunks[0].original_size, 0);
        assert!(layout.chunks[0].blocks.is_empty());
        assert_eq!(layout.index_offset, HEADER_SIZE);
    }

    #[test]
    fn test_multi_block_chunking() {
        let data = vec![0xA5u8; 2 * BLOCK_SIZE + 10];
        let (_, layout) = write_archive(Cursor::new(Vec::new()), &[chunk("big.bin", &data)])
            .expect("Test operation should succeed");

        let blocks = &layout.chunks[0].blocks;
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].raw_len(), BLOCK_SIZE);
        assert_eq!(blocks[1].raw_len(), BLOCK_SIZE);
        assert_eq!(blocks[2].raw_len(), 10);
        assert_eq!(
            blocks.iter().map(Block::raw_len).sum::<usize>(),
            data.len()
        );
    }

    #[test]
    fn test_chunk_count_enforced() {
        let mut writer =
            ArchiveWriter::new(Cursor::new(Vec::new()), 1).expect("Test operation should succeed");
        writer
            .add_chunk(&chunk("a", b"1"))
            .expect("Test operation should succeed");
        assert!(writer.add_chunk(&chunk("b", b"2")).is_err());

        let short =
            ArchiveWriter::new(Cursor::new(Vec::new()), 2).expect("Test operation should succeed");
        assert!(short.finish().is_err());
    }

    #[test]
    fn test_non_empty_sink_rejected() {
        let mut cursor = Cursor::new(vec![0xFFu8; 4096]);
        let err = write_archive(&mut cursor, &[chunk("a", b"abc")])
            .err()
            .expect("non-empty sink should be rejected");
        assert!(matches!(err, ApakError::InvalidArgument(_)));
        assert_eq!(cursor.get_ref(), &vec![0xFFu8; 4096]);
    }

    #[test]
    fn test_written_archive_reads_back() {
        let (mut cursor, layout) = write_archive(Cursor::new(Vec::new()), &[chunk("a", b"abc")])
            .expect("Test operation should succeed");
        cursor.set_position(0);

        let mut reader = ArchiveReader::new(cursor).expect("Test operation should succeed");
        assert_eq!(reader.layout(), &layout);
        let read = reader.read_chunk(0).expect("Test operation should succeed");
        assert_eq!(read.data(), b"abc");
    }
}
