//! Parser and builder for APAK single-file chunked archives
//!
#![allow(clippy::cast_possible_truncation)] // Intentional for binary format parsing
#![allow(clippy::cast_possible_wrap)] // Intentional for binary operations
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::uninlined_format_args)] // Backwards compatibility
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::missing_const_for_fn)] // Binary format structs
//! An APAK file stores any number of named byte blobs ("chunks"). Each chunk
//! is cut into blocks of at most [`constants::BLOCK_SIZE`] bytes, and every
//! block is compressed with raw DEFLATE and then XOR-obfuscated on its own.
//! A trailing index records where each block lives, so the whole archive
//! can be rebuilt from the file alone.
//!
//! # File Layout
//!
//! All integers are little-endian.
//!
//! ```text
//! Header:  [u8; 4] magic = "APAK", i32 version = 1, i32 chunk_count
//! Payload: encoded blocks, back to back in write order
//! Index:   per chunk: i32 path_len, path bytes (UTF-8), i32 original_size,
//!          i32 block_count, then per block: i64 offset, i32 length, i32 size
//! Footer:  i64 index_offset, u32 magic = 0x4B41504B
//! ```
//!
//! # Example
//!
//! ```rust
//! use apak_format::Archive;
//! use std::io::Cursor;
//!
//! let mut archive = Archive::new();
//! archive.add_file("textures/grass.txt", "Hello World")?;
//! archive.add_file("config\\settings.json", "{ \"ok\": true }")?;
//!
//! let mut file = Cursor::new(Vec::new());
//! archive.write_to(&mut file)?;
//! file.set_position(0);
//!
//! let loaded = Archive::read_from(file)?;
//! assert_eq!(loaded.chunks()[1].path(), "config/settings.json");
//! assert_eq!(loaded.chunks()[0].as_str(), Some("Hello World"));
//! # Ok::<(), apak_format::ApakError>(())
//! ```
//!
//! The obfuscation step is not encryption. It keeps payloads from showing up
//! in a hex dump and nothing more.

#![warn(missing_docs)]

mod archive;
#[cfg(feature = "async")]
mod async_io;
mod chunk;
pub mod codec;
mod error;
mod header;
mod layout;
mod reader;
mod writer;

pub use archive::Archive;
#[cfg(feature = "async")]
pub use async_io::{CancellationToken, load_async, save_async};
pub use chunk::{Chunk, normalize_path};
pub use error::{ApakError, ApakResult, ErrorKind};
pub use header::{FileFooter, FileHeader};
pub use layout::{ArchiveLayout, Block, ChunkLayout, block_count_for};
pub use reader::ArchiveReader;
pub use writer::{ArchiveWriter, write_archive};

/// Archive format constants
///
/// Changing any value here is a breaking format change and needs a
/// [`FORMAT_VERSION`](constants::FORMAT_VERSION) bump.
pub mod constants {
    /// Header magic bytes
    pub const MAGIC: [u8; 4] = *b"APAK";

    /// Current format version
    pub const FORMAT_VERSION: i32 = 1;

    /// Footer magic ("KPAK" when read as little-endian bytes)
    pub const FOOTER_MAGIC: u32 = 0x4B41504B;

    /// Maximum raw bytes per block (1 MiB)
    pub const BLOCK_SIZE: usize = 1024 * 1024;

    /// Key every stored byte is XORed with
    pub const OBFUSCATION_KEY: u8 = 0x5A;

    /// Header size in bytes: magic, version, chunk count
    pub const HEADER_SIZE: u64 = 12;

    /// Footer size in bytes: index offset, footer magic
    pub const FOOTER_SIZE: u64 = 12;

    /// Smallest valid archive (no chunks)
    pub const MIN_ARCHIVE_SIZE: u64 = HEADER_SIZE + FOOTER_SIZE;

    /// Smallest index record: path length, original size, block count
    pub const MIN_INDEX_RECORD_SIZE: u64 = 12;

    /// Longest accepted archive path in bytes
    pub const MAX_PATH_LEN: usize = u16::MAX as usize;
}
