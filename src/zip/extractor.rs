use std::fs::{self, File, Metadata, OpenOptions};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use filetime::FileTime;
use tracing::{debug, trace};

use super::archive::{ZipArchive, ZipArchiveMode};
use super::compression::CompressionLevel;
use super::datetime;
use crate::error::{Result, ZipError};
use crate::io::ArchiveStream;

/// MS-DOS directory attribute.
const DOS_DIRECTORY: u32 = 0x10;

impl<S: ArchiveStream> ZipArchive<S> {
    /// Extract every entry below `destination`, creating it if needed.
    ///
    /// Works in Read and Update mode. In Update mode each entry is read
    /// through an update stream, so it is recompressed when the archive is
    /// saved.
    ///
    /// # Errors
    ///
    /// - [`ZipError::PathTraversal`] if an entry name would land outside
    ///   `destination`; entries before it have already been written.
    /// - An I/O error if a file exists and `overwrite` is false.
    pub fn extract_to_directory(&mut self, destination: impl AsRef<Path>, overwrite: bool) -> Result<()> {
        let destination = destination.as_ref();
        fs::create_dir_all(destination)?;

        for index in 0..self.len() {
            let entry = self.entry(index)?;
            let target = resolve_entry_path(destination, entry.full_name())?;
            if entry.name().is_empty() || entry.is_directory() {
                fs::create_dir_all(&target)?;
                continue;
            }
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            self.extract_entry_to_file(index, &target, overwrite)?;
        }

        debug!(entries = self.len(), destination = %destination.display(), "extracted archive");
        Ok(())
    }

    /// Write one entry's content to `path`, then restore its modification
    /// time and Unix permissions where possible.
    pub fn extract_entry_to_file(&mut self, index: usize, path: impl AsRef<Path>, overwrite: bool) -> Result<()> {
        let path = path.as_ref();
        let mut options = OpenOptions::new();
        options.write(true);
        if overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }
        let mut file = options.open(path)?;
        let copied = self.copy_entry_to(index, &mut file)?;
        file.flush()?;
        drop(file);

        let entry = self.entry(index)?;
        restore_modified_time(path, entry.last_write_time());
        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777));
        }

        trace!(name = entry.full_name(), bytes = copied, "extracted entry");
        Ok(())
    }

    /// Add the file at `path` as a new entry named `entry_name`, carrying
    /// over its modification time and attributes. Returns the new index.
    pub fn create_entry_from_file(
        &mut self,
        path: impl AsRef<Path>,
        entry_name: &str,
        level: CompressionLevel,
    ) -> Result<usize> {
        let path = path.as_ref();
        let mut source = File::open(path)?;
        let metadata = source.metadata()?;

        let index = self.create_entry_with_level(entry_name, level)?;
        let entry = self.entry_mut(index)?;
        entry.set_last_write_time(modified_time(&metadata))?;
        entry.set_external_attributes(file_attributes(&metadata))?;

        let mut stream = self.open(index)?;
        io::copy(&mut source, &mut stream)?;
        stream.close()?;
        Ok(index)
    }

    fn copy_entry_to<W: Write>(&mut self, index: usize, writer: &mut W) -> Result<u64> {
        if self.mode() == ZipArchiveMode::Update {
            let mut stream = self.open_update(index)?;
            let copied = io::copy(&mut stream, writer)?;
            stream.close();
            return Ok(copied);
        }
        let mut reader = self.open_read(index)?;
        Ok(io::copy(&mut reader, writer)?)
    }
}

/// Join an entry name onto `destination` without leaving it.
///
/// `.` segments are dropped and `..` segments pop what came before them.
/// Absolute names, drive prefixes and `..` past the top are refused.
pub fn resolve_entry_path(destination: &Path, name: &str) -> Result<PathBuf> {
    let escape = || ZipError::PathTraversal(name.to_string());
    if name.starts_with('/') {
        return Err(escape());
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in name.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop().ok_or_else(escape)?;
            }
            _ => {
                let mut components = Path::new(segment).components();
                match (components.next(), components.next()) {
                    (Some(Component::Normal(_)), None) => segments.push(segment),
                    _ => return Err(escape()),
                }
            }
        }
    }

    let mut path = destination.to_path_buf();
    path.extend(segments);
    Ok(path)
}

/// File modification time as stored in an entry, clamped to what the DOS
/// format can hold.
pub(crate) fn modified_time(metadata: &Metadata) -> NaiveDateTime {
    let modified = match metadata.modified() {
        Ok(time) => DateTime::<Local>::from(time).naive_local(),
        Err(_) => return datetime::dos_epoch(),
    };
    if datetime::in_dos_range(&modified) {
        modified
    } else {
        datetime::dos_epoch()
    }
}

/// External attributes for a file or directory: Unix mode in the high
/// word on Unix, DOS attribute bits on Windows, and the DOS directory bit
/// for directories everywhere.
pub(crate) fn file_attributes(metadata: &Metadata) -> u32 {
    let mut attributes = 0;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        attributes |= metadata.permissions().mode() << 16;
    }
    #[cfg(windows)]
    {
        use std::os::windows::fs::MetadataExt;
        attributes |= metadata.file_attributes() & 0xFF;
    }
    if metadata.is_dir() {
        attributes |= DOS_DIRECTORY;
    }
    attributes
}

/// Best effort; the entry time is local and may not exist on this machine.
pub(crate) fn restore_modified_time(path: &Path, modified: NaiveDateTime) {
    if let Some(local) = Local.from_local_datetime(&modified).earliest() {
        let _ = filetime::set_file_mtime(path, FileTime::from_unix_time(local.timestamp(), 0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_entry_path_stays_inside() {
        let base = Path::new("out");
        assert_eq!(
            resolve_entry_path(base, "a/b.txt").unwrap(),
            Path::new("out").join("a").join("b.txt")
        );
        assert_eq!(
            resolve_entry_path(base, "a/./c/../b.txt").unwrap(),
            Path::new("out").join("a").join("b.txt")
        );
        assert_eq!(resolve_entry_path(base, "dir/").unwrap(), Path::new("out").join("dir"));
    }

    #[test]
    fn test_resolve_entry_path_refuses_escapes() {
        let base = Path::new("out");
        for name in ["../evil.txt", "a/../../evil.txt", "/etc/passwd"] {
            let error = resolve_entry_path(base, name).unwrap_err();
            assert!(matches!(error, ZipError::PathTraversal(_)), "{name}");
        }
    }
}
