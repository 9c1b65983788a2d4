//! In-memory archive and its save/load entry points

use std::fs::{self, File};
use std::io::{BufWriter, Read, Seek, Write};
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::chunk::Chunk;
use crate::error::{ApakError, ApakResult};
use crate::layout::ArchiveLayout;
use crate::reader::ArchiveReader;
use crate::writer::write_archive;

/// Ordered collection of named chunks
///
/// Chunks keep insertion order; that order is the index order of any file
/// written from this archive. An archive has a single owner and all
/// mutation goes through `&mut self`.
///
/// ```rust,no_run
/// use apak_format::Archive;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut archive = Archive::new();
/// archive.add_file("textures/grass.txt", b"Hello World".to_vec())?;
/// archive.save("assets.apak")?;
///
/// let loaded = Archive::load("assets.apak")?;
/// assert_eq!(loaded.chunks()[0].data(), b"Hello World");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Archive {
    chunks: Vec<Chunk>,
}

impl Archive {
    /// Create an empty archive
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, normalizing `path` to forward slashes
    pub fn add_file(&mut self, path: &str, data: impl Into<Vec<u8>>) -> ApakResult<&Chunk> {
        let chunk = Chunk::new(path, data.into())?;
        debug!(
            "Adding '{}' ({} bytes)",
            chunk.path(),
            chunk.original_size()
        );
        self.chunks.push(chunk);
        Ok(&self.chunks[self.chunks.len() - 1])
    }

    /// Read a file from disk and append it
    ///
    /// The archive path defaults to the file's base name.
    pub fn add_file_from_disk(
        &mut self,
        file_path: impl AsRef<Path>,
        archive_path: Option<&str>,
    ) -> ApakResult<&Chunk> {
        let file_path = file_path.as_ref();
        if file_path.as_os_str().is_empty() {
            return Err(ApakError::argument("file path must not be empty"));
        }

        let name = match archive_path {
            Some(name) => name.to_string(),
            None => file_path
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or_else(|| {
                    ApakError::argument(format!(
                        "cannot derive an archive path from {}",
                        file_path.display()
                    ))
                })?
                .to_string(),
        };

        let data = fs::read(file_path)?;
        self.add_file(&name, data)
    }

    /// Recursively add every regular file below `dir`
    ///
    /// Entries are named by their path relative to `dir`, optionally under
    /// `prefix`, and added in file-name order. Returns the number of files
    /// added.
    pub fn add_directory(&mut self, dir: impl AsRef<Path>, prefix: Option<&str>) -> ApakResult<usize> {
        let dir = dir.as_ref();
        let prefix = prefix
            .map(|p| p.replace('\\', "/").trim_matches('/').to_string())
            .filter(|p| !p.is_empty());

        let mut added = 0;
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(dir)
                .map_err(|e| ApakError::argument(e.to_string()))?;
            let relative = relative_archive_path(relative)?;
            let name = match &prefix {
                Some(prefix) => format!("{prefix}/{relative}"),
                None => relative,
            };

            self.add_file_from_disk(entry.path(), Some(&name))?;
            added += 1;
        }

        info!("Added {} files from {}", added, dir.display());
        Ok(added)
    }

    /// Number of chunks
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the archive holds no chunks
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Chunks in order
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Iterate over chunks in order
    pub fn iter(&self) -> std::slice::Iter<'_, Chunk> {
        self.chunks.iter()
    }

    /// First chunk stored under `path`
    pub fn get(&self, path: &str) -> Option<&Chunk> {
        let path = path.replace('\\', "/");
        self.chunks.iter().find(|chunk| chunk.path() == path)
    }

    /// Take ownership of the chunks
    pub fn into_chunks(self) -> Vec<Chunk> {
        self.chunks
    }

    /// Serialize to any seekable sink, returning the physical layout
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> ApakResult<ArchiveLayout> {
        let (_, layout) = write_archive(writer, &self.chunks)?;
        Ok(layout)
    }

    /// Write the archive to `path`, replacing any existing file
    ///
    /// A failed save can leave a truncated file behind.
    pub fn save(&self, path: impl AsRef<Path>) -> ApakResult<ArchiveLayout> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(ApakError::argument("archive path must not be empty"));
        }

        let file = File::create(path)?;
        let layout = self.write_to(BufWriter::new(file))?;

        info!(
            "Saved {} chunks ({} blocks) to {}",
            layout.chunks.len(),
            layout.block_count(),
            path.display()
        );
        Ok(layout)
    }

    /// Parse and fully decode an archive from any seekable source
    pub fn read_from<R: Read + Seek>(reader: R) -> ApakResult<Self> {
        let mut reader = ArchiveReader::new(reader)?;
        Ok(Self {
            chunks: reader.read_all()?,
        })
    }

    /// Load and fully decode the archive at `path`
    pub fn load(path: impl AsRef<Path>) -> ApakResult<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(ApakError::argument("archive path must not be empty"));
        }

        let mut reader = ArchiveReader::open(path)?;
        let archive = Self {
            chunks: reader.read_all()?,
        };

        info!("Loaded {} chunks from {}", archive.len(), path.display());
        Ok(archive)
    }

    /// Write every chunk to a file below `dir`
    ///
    /// Paths that would escape `dir` are rejected before anything is written.
    pub fn extract_to(&self, dir: impl AsRef<Path>) -> ApakResult<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let targets = self
            .chunks
            .iter()
            .map(|chunk| safe_join(dir, chunk.path()))
            .collect::<ApakResult<Vec<_>>>()?;

        for (chunk, target) in self.chunks.iter().zip(&targets) {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(target, chunk.data())?;
            debug!("Extracted '{}' to {}", chunk.path(), target.display());
        }

        Ok(targets)
    }
}

impl<'a> IntoIterator for &'a Archive {
    type Item = &'a Chunk;
    type IntoIter = std::slice::Iter<'a, Chunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.iter()
    }
}

/// Join forward-slash separated relative path components
fn relative_archive_path(relative: &Path) -> ApakResult<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str().ok_or_else(|| {
                ApakError::argument(format!("non UTF-8 path: {}", relative.display()))
            })?),
            Component::CurDir => {}
            _ => {
                return Err(ApakError::argument(format!(
                    "unexpected path component in {}",
                    relative.display()
                )));
            }
        }
    }
    Ok(parts.join("/"))
}

/// Resolve an archive path below `dir`, refusing anything that escapes it
fn safe_join(dir: &Path, archive_path: &str) -> ApakResult<PathBuf> {
    let mut target = dir.to_path_buf();
    let mut depth = 0;

    if archive_path.starts_with('/') {
        warn!("Refusing to extract absolute path '{}'", archive_path);
        return Err(ApakError::argument(format!(
            "absolute entry path '{archive_path}'"
        )));
    }

    for (position, part) in archive_path.split('/').enumerate() {
        match part {
            "" | "." => {}
            ".." => {
                warn!("Refusing to extract '{}' outside {}", archive_path, dir.display());
                return Err(ApakError::argument(format!(
                    "entry path '{archive_path}' escapes the output directory"
                )));
            }
            part if (position == 0 && is_drive_prefix(part))
                || (cfg!(windows) && part.contains(':')) =>
            {
                warn!("Refusing to extract '{}' with drive prefix", archive_path);
                return Err(ApakError::argument(format!(
                    "entry path '{archive_path}' contains a drive prefix"
                )));
            }
            part => {
                target.push(part);
                depth += 1;
            }
        }
    }

    if depth == 0 {
        return Err(ApakError::argument(format!(
            "entry path '{archive_path}' names no file"
        )));
    }
    Ok(target)
}

/// Whether `part` is a Windows drive designator such as `C:`
fn is_drive_prefix(part: &str) -> bool {
    let bytes = part.as_bytes();
    bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
