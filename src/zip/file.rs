//! Path-based helpers for archives stored as files.

use std::fs::{self, File, Metadata, OpenOptions};
use std::io;
use std::path::Path;

use tracing::debug;

use super::archive::{ZipArchive, ZipArchiveMode};
use super::compression::CompressionLevel;
use super::extractor::{file_attributes, modified_time};
use crate::error::Result;
use crate::io::ArchiveStream;

/// Opens, creates and unpacks archives by path.
pub struct ZipFile;

impl ZipFile {
    /// Open an existing archive for reading.
    pub fn open_read(path: impl AsRef<Path>) -> Result<ZipArchive<File>> {
        Self::open(path, ZipArchiveMode::Read)
    }

    /// Open an archive file in the given mode.
    ///
    /// Create truncates an existing file. Update creates the file if it is
    /// missing and starts an empty archive in that case.
    pub fn open(path: impl AsRef<Path>, mode: ZipArchiveMode) -> Result<ZipArchive<File>> {
        let path = path.as_ref();
        let file = match mode {
            ZipArchiveMode::Read => File::open(path)?,
            ZipArchiveMode::Create => File::create(path)?,
            ZipArchiveMode::Update => OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(path)?,
        };
        ZipArchive::new(file, mode)
    }

    /// Archive everything below `source_dir` into a new file.
    ///
    /// Files are added depth-first in name order with their timestamps and
    /// attributes. Empty directories become explicit `name/` entries. With
    /// `include_base_directory`, every name is prefixed with the source
    /// directory's own name.
    pub fn create_from_directory(
        source_dir: impl AsRef<Path>,
        archive_path: impl AsRef<Path>,
        level: CompressionLevel,
        include_base_directory: bool,
    ) -> Result<()> {
        let source_dir = fs::canonicalize(source_dir.as_ref())?;
        let mut archive = Self::open(archive_path, ZipArchiveMode::Create)?;

        let prefix = match source_dir.file_name() {
            Some(name) if include_base_directory => format!("{}/", name.to_string_lossy()),
            _ => String::new(),
        };
        let added = add_directory_contents(&mut archive, &source_dir, &prefix, level)?;
        if !added && !prefix.is_empty() {
            add_directory_entry(&mut archive, &prefix, &fs::metadata(&source_dir)?, level)?;
        }

        debug!(source = %source_dir.display(), entries = archive.len(), "archived directory");
        archive.finish()?;
        Ok(())
    }

    /// Unpack an archive file below `destination`. Existing files are not
    /// overwritten.
    pub fn extract_to_directory(archive_path: impl AsRef<Path>, destination: impl AsRef<Path>) -> Result<()> {
        Self::open_read(archive_path)?.extract_to_directory(destination, false)
    }
}

/// Returns whether anything was added below `dir`.
fn add_directory_contents<S: ArchiveStream>(
    archive: &mut ZipArchive<S>,
    dir: &Path,
    prefix: &str,
    level: CompressionLevel,
) -> Result<bool> {
    let mut children = fs::read_dir(dir)?.collect::<io::Result<Vec<_>>>()?;
    children.sort_by_key(|child| child.file_name());

    let mut added = false;
    for child in children {
        let path = child.path();
        let metadata = fs::metadata(&path)?;
        let name = format!("{prefix}{}", child.file_name().to_string_lossy());

        if metadata.is_dir() {
            let directory_name = format!("{name}/");
            if !add_directory_contents(archive, &path, &directory_name, level)? {
                add_directory_entry(archive, &directory_name, &metadata, level)?;
            }
            added = true;
        } else if metadata.is_file() {
            archive.create_entry_from_file(&path, &name, level)?;
            added = true;
        }
    }
    Ok(added)
}

fn add_directory_entry<S: ArchiveStream>(
    archive: &mut ZipArchive<S>,
    name: &str,
    metadata: &Metadata,
    level: CompressionLevel,
) -> Result<()> {
    let index = archive.create_entry_with_level(name, level)?;
    let entry = archive.entry_mut(index)?;
    entry.set_last_write_time(modified_time(metadata))?;
    entry.set_external_attributes(file_attributes(metadata))?;
    Ok(())
}
