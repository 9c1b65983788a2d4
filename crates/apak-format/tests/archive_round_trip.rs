#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! Integration tests for saving and loading archives on disk
//!
//! Covers the documented scenarios: small text entries, a multi-block entry
//! of pseudo-random data, empty entries, and detection of corrupted files.

use apak_format::constants::{BLOCK_SIZE, HEADER_SIZE, MAGIC};
use apak_format::{ApakError, Archive, ArchiveReader, ErrorKind, block_count_for};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rand::{RngExt, SeedableRng};
use std::fs;
use std::path::{Path, PathBuf};

fn temp_archive(dir: &Path, name: &str) -> PathBuf {
    dir.join(name)
}

fn pseudo_random(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut data = vec![0u8; len];
    rng.fill(&mut data[..]);
    data
}

#[test]
fn two_text_entries_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_archive(dir.path(), "scenario.apak");

    let mut archive = Archive::new();
    archive.add_file("textures/grass.txt", "Hello World").unwrap();
    archive
        .add_file("config/settings.json", "{ \"ok\": true }")
        .unwrap();
    archive.save(&path).expect("save should succeed");

    let loaded = Archive::load(&path).expect("load should succeed");
    assert_eq!(loaded.len(), 2);

    let chunks = loaded.chunks();
    assert_eq!(chunks[0].path(), "textures/grass.txt");
    assert_eq!(chunks[0].as_str(), Some("Hello World"));
    assert_eq!(chunks[0].original_size(), 11);
    assert_eq!(chunks[1].path(), "config/settings.json");
    assert_eq!(chunks[1].as_str(), Some("{ \"ok\": true }"));
}

#[test]
fn large_entry_spans_four_blocks() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_archive(dir.path(), "large.apak");
    let data = pseudo_random(3 * BLOCK_SIZE + 1, 0xA9A4);

    let mut archive = Archive::new();
    archive.add_file("blob.bin", data.clone()).unwrap();
    let layout = archive.save(&path).expect("save should succeed");

    let blocks = &layout.chunks[0].blocks;
    assert_eq!(blocks.len(), 4);
    assert_eq!(
        blocks.iter().map(|b| b.raw_len()).collect::<Vec<_>>(),
        vec![BLOCK_SIZE, BLOCK_SIZE, BLOCK_SIZE, 1]
    );

    let loaded = Archive::load(&path).expect("load should succeed");
    assert!(loaded.chunks()[0].data() == data.as_slice(), "data differs after round trip");

    // The parsed index matches what the writer reported
    let reader = ArchiveReader::open(&path).unwrap();
    assert_eq!(reader.layout(), &layout);
}

#[test]
fn empty_and_mixed_entries_keep_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_archive(dir.path(), "mixed.apak");

    let mut archive = Archive::new();
    archive.add_file("z/last-added-first.txt", "first").unwrap();
    archive.add_file("empty.bin", Vec::new()).unwrap();
    archive.add_file("a\\windows\\style.txt", "third").unwrap();
    archive
        .add_file("exact.bin", pseudo_random(BLOCK_SIZE, 7))
        .unwrap();
    archive.save(&path).unwrap();

    let loaded = Archive::load(&path).unwrap();
    assert_eq!(loaded, archive);
    assert_eq!(loaded.chunks()[2].path(), "a/windows/style.txt");
    assert!(loaded.chunks()[1].data().is_empty());
}

#[test]
fn empty_archive_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_archive(dir.path(), "empty.apak");

    Archive::new().save(&path).unwrap();
    assert_eq!(fs::metadata(&path).unwrap().len(), 24);
    assert!(Archive::load(&path).unwrap().is_empty());
}

#[test]
fn save_overwrites_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_archive(dir.path(), "overwrite.apak");
    fs::write(&path, vec![0xEE; 10 * 1024]).unwrap();

    let mut archive = Archive::new();
    archive.add_file("a", "a").unwrap();
    archive.save(&path).unwrap();

    assert_eq!(Archive::load(&path).unwrap(), archive);
}

#[test]
fn flipped_header_magic_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_archive(dir.path(), "magic.apak");

    let mut archive = Archive::new();
    archive.add_file("a.txt", "abc").unwrap();
    archive.save(&path).unwrap();
    let pristine = fs::read(&path).unwrap();
    assert_eq!(&pristine[0..4], &MAGIC);

    for index in 0..4 {
        let mut bytes = pristine.clone();
        bytes[index] ^= 0x20;
        fs::write(&path, &bytes).unwrap();

        let err = Archive::load(&path).unwrap_err();
        assert!(
            matches!(err, ApakError::InvalidSignature(_)),
            "byte {index}: {err}"
        );
        assert_eq!(err.kind(), ErrorKind::Format);
    }
}

#[test]
fn truncated_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_archive(dir.path(), "short.apak");

    for len in [0usize, 1, 8, 11] {
        fs::write(&path, &b"APAK\x01\x00\x00\x00\x00\x00\x00"[..len]).unwrap();
        let err = Archive::load(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format, "length {len}");
    }
}

#[test]
fn block_offset_past_end_is_a_bounds_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_archive(dir.path(), "bounds.apak");

    let mut archive = Archive::new();
    archive.add_file("p", "payload").unwrap();
    let layout = archive.save(&path).unwrap();

    // path_len (4) + "p" (1) + original_size (4) + block_count (4)
    let offset_pos = layout.index_offset as usize + 13;
    let mut bytes = fs::read(&path).unwrap();
    let file_len = bytes.len() as i64;
    bytes[offset_pos..offset_pos + 8].copy_from_slice(&(file_len + 1).to_le_bytes());
    fs::write(&path, &bytes).unwrap();

    let err = Archive::load(&path).unwrap_err();
    assert!(matches!(err, ApakError::InvalidBlockOffset { .. }), "{err}");
    assert_eq!(err.kind(), ErrorKind::Bounds);
}

#[test]
fn load_never_modifies_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_archive(dir.path(), "readonly.apak");

    let mut archive = Archive::new();
    archive.add_file("a", pseudo_random(4096, 1)).unwrap();
    archive.save(&path).unwrap();
    let before = fs::read(&path).unwrap();

    Archive::load(&path).unwrap();
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn payloads_are_not_plain_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_archive(dir.path(), "hidden.apak");

    let mut archive = Archive::new();
    archive.add_file("secret.txt", "a string that should not appear verbatim").unwrap();
    let layout = archive.save(&path).unwrap();

    let bytes = fs::read(&path).unwrap();
    let payload = &bytes[HEADER_SIZE as usize..layout.index_offset as usize];
    let needle = b"should not appear";
    assert!(!payload.windows(needle.len()).any(|w| w == needle));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Any set of named buffers survives a save/load cycle unchanged
    #[test]
    fn arbitrary_entries_round_trip(
        entries in prop::collection::vec(
            ("[a-z]{1,8}(/[a-z]{1,8}){0,2}", prop::collection::vec(any::<u8>(), 0..20_000)),
            0..6
        )
    ) {
        let mut archive = Archive::new();
        for (path, data) in &entries {
            archive.add_file(path, data.clone()).map_err(|e| TestCaseError::fail(e.to_string()))?;
        }

        let mut file = std::io::Cursor::new(Vec::new());
        let layout = archive.write_to(&mut file).map_err(|e| TestCaseError::fail(e.to_string()))?;
        file.set_position(0);
        let loaded = Archive::read_from(file).map_err(|e| TestCaseError::fail(e.to_string()))?;

        prop_assert_eq!(&loaded, &archive);
        for (chunk_layout, (_, data)) in layout.chunks.iter().zip(&entries) {
            prop_assert_eq!(chunk_layout.blocks.len(), block_count_for(data.len()));
            prop_assert_eq!(
                chunk_layout.blocks.iter().map(|b| b.raw_len()).sum::<usize>(),
                data.len()
            );
        }
    }
}
