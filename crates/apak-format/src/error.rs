//! Error types for archive operations

use thiserror::Error;

/// Archive operation result type
pub type ApakResult<T> = Result<T, ApakError>;

/// Broad category an [`ApakError`] belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad magic, footer, version or index contents
    Format,
    /// Offsets or lengths pointing outside the file
    Bounds,
    /// Underlying storage failure
    Io,
    /// Invalid input rejected before any I/O
    Argument,
    /// Operation cancelled or its worker task failed
    Aborted,
}

/// Comprehensive error types for archive operations
#[derive(Debug, Error)]
pub enum ApakError {
    /// Header or footer magic does not match
    #[error("invalid signature: {0}")]
    InvalidSignature(&'static str),

    /// Archive was written with a format version this crate cannot read
    #[error("version mismatch: expected {expected}, got {found}")]
    VersionMismatch {
        /// Supported format version
        expected: i32,
        /// Version stored in the header
        found: i32,
    },

    /// File is too short to hold a header and a footer
    #[error("truncated archive: {len} bytes is smaller than the minimum of {min}")]
    Truncated {
        /// Actual file length
        len: u64,
        /// Minimum valid archive length
        min: u64,
    },

    /// Index record could not be parsed or is inconsistent
    #[error("invalid index at 0x{pos:X}: {reason}")]
    InvalidIndex {
        /// Stream position where the problem was found
        pos: u64,
        /// Detailed description of the problem
        reason: String,
    },

    /// Index offset stored in the footer points outside the file body
    #[error("invalid index offset {offset} for file of {file_len} bytes")]
    InvalidIndexOffset {
        /// Offset read from the footer
        offset: i64,
        /// Length of the archive file
        file_len: u64,
    },

    /// Block offset is negative or beyond end of file
    #[error("invalid block offset {offset} for file of {file_len} bytes")]
    InvalidBlockOffset {
        /// Offset read from the index
        offset: i64,
        /// Length of the archive file
        file_len: u64,
    },

    /// Block payload runs past end of file
    #[error("block at {offset} with length {length} extends past end of file ({file_len} bytes)")]
    BlockOutOfBounds {
        /// Offset read from the index
        offset: i64,
        /// Payload length read from the index
        length: i32,
        /// Length of the archive file
        file_len: u64,
    },

    /// Block raw size is negative or larger than one block
    #[error("block at {offset} has raw size {size}, allowed range is 0..={max}")]
    InvalidBlockSize {
        /// Offset read from the index
        offset: i64,
        /// Raw size read from the index
        size: i32,
        /// Largest allowed raw size
        max: usize,
    },

    /// Decoded block or chunk did not have the recorded size
    #[error("size mismatch in '{path}': expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// Chunk path
        path: String,
        /// Size recorded in the index
        expected: u64,
        /// Size actually produced
        actual: u64,
    },

    /// Compression/decompression error
    #[error("compression error: {0}")]
    Compression(String),

    /// Caller supplied an unusable argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Entry or count does not fit the 32-bit fields of the format
    #[error("entry '{path}' is too large for the archive format: {size} bytes")]
    EntryTooLarge {
        /// Chunk path
        path: String,
        /// Size that overflowed
        size: u64,
    },

    /// Operation was cancelled before it started
    #[error("operation cancelled")]
    Cancelled,

    /// Background worker task failed
    #[error("worker task failed: {0}")]
    Task(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApakError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidSignature(_)
            | Self::VersionMismatch { .. }
            | Self::Truncated { .. }
            | Self::InvalidIndex { .. }
            | Self::InvalidBlockSize { .. }
            | Self::SizeMismatch { .. }
            | Self::Compression(_) => ErrorKind::Format,
            Self::InvalidIndexOffset { .. }
            | Self::InvalidBlockOffset { .. }
            | Self::BlockOutOfBounds { .. } => ErrorKind::Bounds,
            Self::Io(_) => ErrorKind::Io,
            Self::InvalidArgument(_) | Self::EntryTooLarge { .. } => ErrorKind::Argument,
            Self::Cancelled | Self::Task(_) => ErrorKind::Aborted,
        }
    }

    /// Shorthand for building an [`ApakError::InvalidArgument`]
    pub(crate) fn argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument(reason.into())
    }
}

impl From<binrw::Error> for ApakError {
    fn from(err: binrw::Error) -> Self {
        match err {
            binrw::Error::BadMagic { .. } => Self::InvalidSignature("magic mismatch"),
            binrw::Error::Io(io) => Self::Io(io),
            binrw::Error::AssertFail { pos, message } => Self::InvalidIndex {
                pos,
                reason: message,
            },
            other => Self::InvalidIndex {
                pos: 0,
                reason: other.to_string(),
            },
        }
    }
}
