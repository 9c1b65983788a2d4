//! Block transform pipeline
//!
//! Every block is stored as `obfuscate(compress(slice))` and restored with
//! `decompress(obfuscate(payload))`. Compression is raw DEFLATE without a
//! zlib or gzip wrapper.
//!
//! The obfuscation step is a single-byte XOR. It only keeps payloads from
//! being readable in a hex dump and provides no confidentiality.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;

use crate::constants::OBFUSCATION_KEY;
use crate::error::{ApakError, ApakResult};

/// Compress data with raw DEFLATE
pub fn compress(data: &[u8]) -> ApakResult<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(
        Vec::with_capacity(data.len() / 2),
        Compression::default(),
    );
    encoder
        .write_all(data)
        .map_err(|e| ApakError::Compression(format!("DEFLATE compression failed: {e}")))?;
    encoder
        .finish()
        .map_err(|e| ApakError::Compression(format!("DEFLATE compression failed: {e}")))
}

/// Decompress raw DEFLATE data that is expected to inflate to `expected_size` bytes
///
/// At most `expected_size + 1` bytes are inflated so a corrupted stream
/// cannot balloon memory use.
pub fn decompress(data: &[u8], expected_size: usize) -> ApakResult<Vec<u8>> {
    let mut decompressed = Vec::with_capacity(expected_size);
    DeflateDecoder::new(data)
        .take(expected_size as u64 + 1)
        .read_to_end(&mut decompressed)
        .map_err(|e| ApakError::Compression(format!("DEFLATE decompression failed: {e}")))?;
    Ok(decompressed)
}

/// XOR every byte with the archive key, in place
pub fn obfuscate_in_place(data: &mut [u8]) {
    for byte in data {
        *byte ^= OBFUSCATION_KEY;
    }
}

/// XOR every byte with the archive key
///
/// Applying it twice yields the original input.
pub fn obfuscate(data: &[u8]) -> Vec<u8> {
    data.iter().map(|b| b ^ OBFUSCATION_KEY).collect()
}

/// Transform one raw slice into its stored form
pub fn encode_block(slice: &[u8]) -> ApakResult<Vec<u8>> {
    let mut payload = compress(slice)?;
    obfuscate_in_place(&mut payload);
    Ok(payload)
}

/// Restore the raw slice from a stored payload
///
/// The payload buffer is consumed since it is de-obfuscated in place.
pub fn decode_block(mut payload: Vec<u8>, expected_size: usize) -> ApakResult<Vec<u8>> {
    obfuscate_in_place(&mut payload);
    decompress(&payload, expected_size)
}
