use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{Seek, SeekFrom, Write};

use encoding_rs::Encoding;
use tracing::{debug, warn};

use super::compression::CompressionLevel;
use super::entry::ZipArchiveEntry;
use super::parser::ZipParser;
use super::streams::{EntryStream, ZipEntryReader, ZipEntryUpdateStream, ZipEntryWriter};
use super::structures::{EndOfCentralDirectory, MASK16, MASK32, Zip64Eocd, Zip64EocdLocator};
use crate::error::{Result, ZipError};
use crate::io::ArchiveStream;

/// What an archive is opened for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZipArchiveMode {
    /// Inspect and extract existing entries.
    Read,
    /// Append new entries to an empty stream, one at a time.
    Create,
    /// Read, modify, add and delete entries; everything is rewritten on save.
    Update,
}

/// Tunables for opening or creating an archive.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveOptions {
    /// Encoding for entry names without the UTF-8 flag, and for all new
    /// names when set. `None` reads legacy names as UTF-8 and writes ASCII
    /// or flagged UTF-8.
    pub entry_name_encoding: Option<&'static Encoding>,
    /// Level for entries created without an explicit level.
    pub compression_level: CompressionLevel,
}

/// A ZIP archive over a byte stream.
///
/// Read mode parses the central directory up front. Create mode writes each
/// entry as soon as it is opened and closed, and only one entry can hold the
/// stream at a time. Update mode keeps edits in memory and rewrites the whole
/// stream when the archive is finished.
///
/// Call [`finish`](Self::finish) to write the central directory and get the
/// stream back. Dropping an unfinished archive does the same but can only log
/// failures.
///
/// # Example
///
/// ```
/// use std::io::{Cursor, Read, Write};
/// use ziparc::{ZipArchive, ZipArchiveMode};
///
/// let mut archive = ZipArchive::new(Cursor::new(Vec::new()), ZipArchiveMode::Create)?;
/// let index = archive.create_entry("a/b.txt")?;
/// archive.open_write(index)?.write_all(b"hello")?;
/// let bytes = archive.finish()?.into_inner();
///
/// let archive = ZipArchive::new(Cursor::new(bytes), ZipArchiveMode::Read)?;
/// let mut text = String::new();
/// archive.open_read(0)?.read_to_string(&mut text)?;
/// assert_eq!(text, "hello");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct ZipArchive<S: ArchiveStream> {
    stream: Option<RefCell<S>>,
    mode: ZipArchiveMode,
    entries: Vec<ZipArchiveEntry>,
    entries_by_name: HashMap<String, usize>,
    /// Create mode: the entry currently holding the stream.
    stream_owner: Option<usize>,
    number_of_this_disk: u32,
    comment: Vec<u8>,
    options: ArchiveOptions,
    seekable: bool,
}

impl<S: ArchiveStream> ZipArchive<S> {
    pub fn new(stream: S, mode: ZipArchiveMode) -> Result<Self> {
        Self::with_options(stream, mode, ArchiveOptions::default())
    }

    /// Open an archive over `stream`.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if the stream lacks a capability the mode needs
    ///   (Read: read + seek; Create: write; Update: read + write + seek).
    /// - `InvalidData` / `Unsupported` if an existing central directory is
    ///   malformed or uses unsupported features, or, in Update mode, if any
    ///   entry's data cannot be reached.
    pub fn with_options(mut stream: S, mode: ZipArchiveMode, options: ArchiveOptions) -> Result<Self> {
        let capable = match mode {
            ZipArchiveMode::Read => stream.can_read() && stream.can_seek(),
            ZipArchiveMode::Create => stream.can_write(),
            ZipArchiveMode::Update => stream.can_read() && stream.can_write() && stream.can_seek(),
        };
        if !capable {
            return Err(ZipError::InvalidArgument(format!(
                "stream does not support {mode:?} mode"
            )));
        }

        let mut archive = Self {
            stream: None,
            mode,
            entries: Vec::new(),
            entries_by_name: HashMap::new(),
            stream_owner: None,
            number_of_this_disk: 0,
            comment: Vec::new(),
            options,
            seekable: stream.can_seek(),
        };

        match mode {
            ZipArchiveMode::Read => archive.read_central_directory(&mut stream, false)?,
            ZipArchiveMode::Update => {
                if stream.total_len()? > 0 {
                    archive.read_central_directory(&mut stream, true)?;
                    let stream_len = stream.total_len()?;
                    for entry in &archive.entries {
                        entry.check_openable(
                            &mut stream,
                            stream_len,
                            archive.number_of_this_disk,
                            true,
                        )?;
                    }
                }
            }
            ZipArchiveMode::Create => {}
        }

        debug!(?mode, entries = archive.entries.len(), "opened archive");
        archive.stream = Some(RefCell::new(stream));
        Ok(archive)
    }

    fn read_central_directory(&mut self, stream: &mut S, save_extra_fields: bool) -> Result<()> {
        let directory = ZipParser::new(stream)?.read_central_directory(save_extra_fields)?;
        self.number_of_this_disk = directory.number_of_this_disk;
        self.comment = directory.comment;
        for header in directory.headers {
            let entry = ZipArchiveEntry::from_central_directory(
                header,
                self.mode,
                self.options.compression_level,
                self.options.entry_name_encoding,
            );
            self.add_entry(entry);
        }
        Ok(())
    }

    fn add_entry(&mut self, entry: ZipArchiveEntry) -> usize {
        let index = self.entries.len();
        self.entries_by_name
            .entry(entry.full_name().to_string())
            .or_insert(index);
        self.entries.push(entry);
        index
    }

    fn rebuild_name_index(&mut self) {
        self.entries_by_name.clear();
        for (index, entry) in self.entries.iter().enumerate() {
            self.entries_by_name
                .entry(entry.full_name().to_string())
                .or_insert(index);
        }
    }

    fn cell(&self) -> Result<&RefCell<S>> {
        self.stream.as_ref().ok_or(ZipError::Disposed)
    }

    fn check_entry_listing(&self) -> Result<()> {
        if self.mode == ZipArchiveMode::Create {
            return Err(ZipError::WrongMode(
                "entries cannot be listed or looked up in create mode".into(),
            ));
        }
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.entries.len() {
            return Err(ZipError::InvalidArgument(format!(
                "entry index {index} out of range for {} entries",
                self.entries.len()
            )));
        }
        Ok(())
    }

    pub fn mode(&self) -> ZipArchiveMode {
        self.mode
    }

    /// Number of entries, in any mode.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in central directory order.
    pub fn entries(&self) -> Result<&[ZipArchiveEntry]> {
        self.check_entry_listing()?;
        Ok(&self.entries)
    }

    /// First entry with this exact full name.
    pub fn entry_by_name(&self, name: &str) -> Result<Option<&ZipArchiveEntry>> {
        Ok(self.index_of(name)?.map(|index| &self.entries[index]))
    }

    pub fn index_of(&self, name: &str) -> Result<Option<usize>> {
        self.check_entry_listing()?;
        Ok(self.entries_by_name.get(name).copied())
    }

    pub fn entry(&self, index: usize) -> Result<&ZipArchiveEntry> {
        self.check_index(index)?;
        Ok(&self.entries[index])
    }

    pub fn entry_mut(&mut self, index: usize) -> Result<&mut ZipArchiveEntry> {
        self.check_index(index)?;
        Ok(&mut self.entries[index])
    }

    /// Add an entry compressed at the archive's default level. Returns its
    /// index.
    pub fn create_entry(&mut self, name: &str) -> Result<usize> {
        self.create_entry_with_level(name, self.options.compression_level)
    }

    /// Add an entry. Duplicate names are allowed; lookups find the first.
    ///
    /// In Create mode the new entry takes over the stream. A previous entry
    /// that was never opened is written out as empty first.
    pub fn create_entry_with_level(&mut self, name: &str, level: CompressionLevel) -> Result<usize> {
        if self.mode == ZipArchiveMode::Read {
            return Err(ZipError::ReadOnlyArchive);
        }
        let entry =
            ZipArchiveEntry::new(name, self.mode, level, self.options.entry_name_encoding)?;

        if self.mode == ZipArchiveMode::Create {
            self.acquire_stream()?;
        }
        let index = self.add_entry(entry);
        if self.mode == ZipArchiveMode::Create {
            self.stream_owner = Some(index);
        }
        Ok(index)
    }

    fn acquire_stream(&mut self) -> Result<()> {
        let Some(owner) = self.stream_owner else {
            return Ok(());
        };
        if self.entries[owner].ever_opened_for_write {
            return Err(ZipError::StreamAlreadyOpen);
        }
        let cell = self.stream.as_ref().ok_or(ZipError::Disposed)?;
        self.entries[owner].write_and_finish_local_entry(cell)?;
        self.stream_owner = None;
        Ok(())
    }

    /// Open an entry the way the archive mode dictates.
    pub fn open(&mut self, index: usize) -> Result<EntryStream<'_, S>> {
        match self.mode {
            ZipArchiveMode::Read => Ok(EntryStream::Read(self.open_read(index)?)),
            ZipArchiveMode::Create => Ok(EntryStream::Write(self.open_write(index)?)),
            ZipArchiveMode::Update => Ok(EntryStream::Update(self.open_update(index)?)),
        }
    }

    /// Decompressing reader over an entry. Any number may be open at once.
    pub fn open_read(&self, index: usize) -> Result<ZipEntryReader<'_, S>> {
        if self.mode != ZipArchiveMode::Read {
            return Err(ZipError::WrongMode(
                "entries can only be opened for reading in read mode".into(),
            ));
        }
        self.check_index(index)?;
        self.entries[index].open_reader(self.cell()?, self.number_of_this_disk)
    }

    /// Writer for a new entry. Each entry can be opened exactly once.
    pub fn open_write(&mut self, index: usize) -> Result<ZipEntryWriter<'_, S>> {
        if self.mode != ZipArchiveMode::Create {
            return Err(ZipError::WrongMode(
                "entries can only be opened for writing in create mode".into(),
            ));
        }
        self.check_index(index)?;

        let Self {
            stream,
            entries,
            stream_owner,
            seekable,
            ..
        } = self;
        let cell = stream.as_ref().ok_or(ZipError::Disposed)?;
        let entry = &mut entries[index];
        if entry.ever_opened_for_write || *stream_owner != Some(index) {
            return Err(ZipError::AlreadyWritten);
        }
        entry.ever_opened_for_write = true;
        Ok(ZipEntryWriter::new(entry, cell, Some(stream_owner), *seekable))
    }

    /// In-memory editing stream for an entry. The stream does not borrow
    /// the archive; its content is written when the archive is finished.
    pub fn open_update(&mut self, index: usize) -> Result<ZipEntryUpdateStream> {
        if self.mode != ZipArchiveMode::Update {
            return Err(ZipError::WrongMode(
                "entries can only be opened for update in update mode".into(),
            ));
        }
        self.check_index(index)?;
        let disk = self.number_of_this_disk;
        let Self {
            stream, entries, ..
        } = self;
        let cell = stream.as_ref().ok_or(ZipError::Disposed)?;
        entries[index].open_update(cell, disk)
    }

    /// Remove an entry. Update mode only.
    pub fn delete_entry(&mut self, index: usize) -> Result<()> {
        if self.mode != ZipArchiveMode::Update {
            return Err(ZipError::WrongMode(
                "entries can only be deleted in update mode".into(),
            ));
        }
        self.check_index(index)?;
        if self.entries[index].is_open_for_update() {
            return Err(ZipError::StreamAlreadyOpen);
        }
        let removed = self.entries.remove(index);
        self.rebuild_name_index();
        debug!(name = removed.full_name(), "deleted entry");
        Ok(())
    }

    pub fn comment(&self) -> &[u8] {
        &self.comment
    }

    pub fn set_comment(&mut self, comment: impl Into<Vec<u8>>) -> Result<()> {
        if self.mode == ZipArchiveMode::Read {
            return Err(ZipError::ReadOnlyArchive);
        }
        let comment = comment.into();
        if comment.len() > u16::MAX as usize {
            return Err(ZipError::InvalidArgument(
                "archive comment longer than 65535 bytes".into(),
            ));
        }
        self.comment = comment;
        Ok(())
    }

    /// Write everything still pending and return the stream.
    pub fn finish(mut self) -> Result<S> {
        let written = match self.mode {
            ZipArchiveMode::Read => Ok(()),
            _ => self.write_file(),
        };
        // Taken even on failure so drop does not try again.
        let stream = self.stream.take().ok_or(ZipError::Disposed)?;
        written?;
        Ok(stream.into_inner())
    }

    fn write_file(&mut self) -> Result<()> {
        let Self {
            stream,
            mode,
            entries,
            number_of_this_disk,
            comment,
            stream_owner,
            ..
        } = self;
        let cell = stream.as_ref().ok_or(ZipError::Disposed)?;

        if *mode == ZipArchiveMode::Update {
            let mut stream = cell.borrow_mut();
            let stream_len = stream.total_len()?;
            for entry in entries.iter_mut() {
                entry.check_openable(&mut *stream, stream_len, *number_of_this_disk, true)?;
                entry.load_local_header_extra_fields_and_compressed_bytes(&mut *stream, stream_len)?;
            }
            stream.seek(SeekFrom::Start(0))?;
            stream.set_len(0)?;
        }

        for entry in entries.iter_mut() {
            entry.write_and_finish_local_entry(cell)?;
        }
        *stream_owner = None;

        let mut stream = cell.borrow_mut();
        let cd_start = stream.stream_position()?;
        for entry in entries.iter_mut() {
            entry.write_central_directory_file_header(&mut *stream)?;
        }
        let cd_size = stream.stream_position()? - cd_start;
        write_archive_epilogue(&mut *stream, entries.len() as u64, cd_start, cd_size, comment)?;
        stream.flush()?;

        debug!(
            mode = ?*mode,
            entries = entries.len(),
            cd_start,
            cd_size,
            "wrote central directory"
        );
        Ok(())
    }
}

fn write_archive_epilogue<W: Write + Seek>(
    writer: &mut W,
    entries: u64,
    cd_start: u64,
    cd_size: u64,
    comment: &[u8],
) -> Result<()> {
    if cd_start >= MASK32 as u64 || cd_size >= MASK32 as u64 || entries >= MASK16 as u64 {
        let zip64_eocd_start = writer.stream_position()?;
        Zip64Eocd::write_block(writer, entries, cd_start, cd_size)?;
        Zip64EocdLocator::write_block(writer, zip64_eocd_start)?;
    }
    EndOfCentralDirectory::write_block(writer, entries, cd_start, cd_size, comment)?;
    Ok(())
}

impl<S: ArchiveStream> Drop for ZipArchive<S> {
    fn drop(&mut self) {
        if self.stream.is_none() || self.mode == ZipArchiveMode::Read {
            return;
        }
        if let Err(error) = self.write_file() {
            warn!(%error, "failed to write archive on drop");
        }
    }
}

impl<S: ArchiveStream> std::fmt::Debug for ZipArchive<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipArchive")
            .field("mode", &self.mode)
            .field("entries", &self.entries)
            .field("comment_len", &self.comment.len())
            .finish_non_exhaustive()
    }
}
