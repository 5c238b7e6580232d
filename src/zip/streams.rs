//! Streams handed out by [`ZipArchive::open`](super::ZipArchive::open).
//!
//! - [`ZipEntryReader`]: decompressing view over an entry's data (Read mode).
//! - [`ZipEntryWriter`]: compresses straight into the archive stream and
//!   fixes up the entry's headers on close (Create mode).
//! - [`ZipEntryUpdateStream`]: seekable in-memory buffer that is written
//!   back when the archive is saved (Update mode).

use std::cell::RefCell;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{trace, warn};

use super::compression::{Compressor, Decompressor};
use super::entry::ZipArchiveEntry;
use crate::error::{Result, ZipError};
use crate::io::{ArchiveStream, CheckSumWriter, SharedStream, SubReadStream};

/// Reads an entry's decompressed content.
///
/// The CRC-32 is not checked while reading; compare against
/// [`ZipArchiveEntry::crc32`] after reading everything if it matters.
pub struct ZipEntryReader<'a, S: ArchiveStream> {
    inner: Decompressor<SubReadStream<SharedStream<'a, S>>>,
}

impl<'a, S: ArchiveStream> ZipEntryReader<'a, S> {
    pub(crate) fn new(inner: Decompressor<SubReadStream<SharedStream<'a, S>>>) -> Self {
        Self { inner }
    }

    /// Stop reading. Further reads fail; closing again is harmless.
    pub fn close(&mut self) {
        self.inner.get_mut().close();
    }
}

impl<S: ArchiveStream> std::fmt::Debug for ZipEntryReader<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipEntryReader").finish_non_exhaustive()
    }
}

impl<S: ArchiveStream> Read for ZipEntryReader<'_, S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

type TrackedCompressor<'a, S> = CheckSumWriter<Compressor<SharedStream<'a, S>>>;

/// Writes one entry into the archive stream.
///
/// Nothing reaches the stream until the first non-empty write, which emits
/// the local header and starts the compressor. Closing finishes the
/// compressor, then either patches CRC and sizes into the local header
/// (seekable stream) or appends a data descriptor (streaming). An entry that
/// was never written to is recorded as an empty Stored file.
///
/// Dropping the writer closes it; call [`close`](Self::close) to see errors.
pub struct ZipEntryWriter<'a, S: ArchiveStream> {
    entry: &'a mut ZipArchiveEntry,
    stream: &'a RefCell<S>,
    /// Create mode: the archive's stream owner slot, released on close.
    stream_owner: Option<&'a mut Option<usize>>,
    writer: Option<TrackedCompressor<'a, S>>,
    used_zip64: bool,
    seekable: bool,
    closed: bool,
}

impl<'a, S: ArchiveStream> ZipEntryWriter<'a, S> {
    pub(crate) fn new(
        entry: &'a mut ZipArchiveEntry,
        stream: &'a RefCell<S>,
        stream_owner: Option<&'a mut Option<usize>>,
        seekable: bool,
    ) -> Self {
        Self {
            entry,
            stream,
            stream_owner,
            writer: None,
            used_zip64: false,
            seekable,
            closed: false,
        }
    }

    /// Uncompressed bytes accepted so far.
    pub fn bytes_written(&self) -> u64 {
        self.writer.as_ref().map_or(0, CheckSumWriter::bytes_written)
    }

    fn start(&mut self) -> Result<()> {
        let mut stream = SharedStream::new(self.stream);
        self.used_zip64 = self
            .entry
            .write_local_file_header(&mut stream, !self.seekable, false)?;
        let compressor = Compressor::new(
            stream,
            self.entry.compression_method(),
            self.entry.compression_level(),
        )?;
        self.writer = Some(CheckSumWriter::new(compressor));
        Ok(())
    }

    /// Finish the entry. Closing twice is harmless.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let result = self.finish_entry();
        if let Some(owner) = self.stream_owner.take() {
            *owner = None;
        }
        result
    }

    fn finish_entry(&mut self) -> Result<()> {
        let Some(writer) = self.writer.take() else {
            let mut stream = SharedStream::new(self.stream);
            self.entry.write_local_file_header(&mut stream, !self.seekable, true)?;
            return Ok(());
        };

        let (compressor, summary) = writer.finish()?;
        let mut stream = compressor.finish()?;
        let end = stream.stream_position()?;

        self.entry.crc32 = summary.crc32;
        self.entry.uncompressed_size = summary.uncompressed_size;
        self.entry.compressed_size = end - summary.initial_position;
        trace!(
            name = self.entry.full_name(),
            uncompressed = summary.uncompressed_size,
            compressed = self.entry.compressed_size,
            "finished entry data"
        );

        if self.seekable {
            self.entry
                .write_crc_and_sizes_in_local_header(&mut stream, self.used_zip64)
        } else {
            self.entry.write_data_descriptor(&mut stream)
        }
    }
}

impl<S: ArchiveStream> Write for ZipEntryWriter<'_, S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.closed {
            return Err(ZipError::Disposed.into());
        }
        if buf.is_empty() {
            return Ok(0);
        }
        if self.writer.is_none() {
            self.start()?;
        }
        match self.writer.as_mut() {
            Some(writer) => writer.write(buf),
            None => Ok(0),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

impl<S: ArchiveStream> Drop for ZipEntryWriter<'_, S> {
    fn drop(&mut self) {
        if let Err(error) = self.close() {
            warn!(name = self.entry.full_name(), %error, "failed to finish entry on drop");
        }
    }
}

/// In-memory content of an entry opened in Update mode.
pub(crate) struct UpdateBuffer {
    pub data: Vec<u8>,
    /// An update stream is currently outstanding.
    pub open: bool,
    /// The archive has written this content out; later edits would be lost.
    pub saved: bool,
}

/// Seekable read/write view over an entry's content in Update mode.
///
/// The buffer is shared with the archive, so edits survive closing the
/// stream and are compressed when the archive is saved. Only one update
/// stream per entry may be open at a time. Once the archive is saved the
/// stream is disposed and every operation fails.
///
/// The buffer sits behind `Arc<Mutex<_>>` rather than `Rc<RefCell<_>>` so that
/// archives and their update streams stay `Send`.
pub struct ZipEntryUpdateStream {
    buffer: Arc<Mutex<UpdateBuffer>>,
    position: u64,
    closed: bool,
}

impl ZipEntryUpdateStream {
    pub(crate) fn new(buffer: Arc<Mutex<UpdateBuffer>>) -> Self {
        Self {
            buffer,
            position: 0,
            closed: false,
        }
    }

    fn check_open(&self) -> io::Result<()> {
        if self.closed || self.buffer.lock().saved {
            return Err(ZipError::Disposed.into());
        }
        Ok(())
    }

    pub fn len(&self) -> u64 {
        self.buffer.lock().data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Truncate or zero-extend the content.
    pub fn set_len(&mut self, len: u64) -> io::Result<()> {
        self.check_open()?;
        let len = usize::try_from(len)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "length too large"))?;
        self.buffer.lock().data.resize(len, 0);
        Ok(())
    }

    /// Release the entry for another update stream. Closing twice is harmless.
    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.buffer.lock().open = false;
        }
    }
}

impl Read for ZipEntryUpdateStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.check_open()?;
        let buffer = self.buffer.lock();
        let start = (self.position as usize).min(buffer.data.len());
        let count = buf.len().min(buffer.data.len() - start);
        buf[..count].copy_from_slice(&buffer.data[start..start + count]);
        drop(buffer);
        self.position += count as u64;
        Ok(count)
    }
}

impl Write for ZipEntryUpdateStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.check_open()?;
        let start = usize::try_from(self.position)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "position too large"))?;
        let end = start + buf.len();
        let mut buffer = self.buffer.lock();
        if buffer.data.len() < end {
            buffer.data.resize(end, 0);
        }
        buffer.data[start..end].copy_from_slice(buf);
        drop(buffer);
        self.position = end as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for ZipEntryUpdateStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.check_open()?;
        let (base, offset) = match pos {
            SeekFrom::Start(offset) => {
                self.position = offset;
                return Ok(offset);
            }
            SeekFrom::End(offset) => (self.len(), offset),
            SeekFrom::Current(offset) => (self.position, offset),
        };
        match base.checked_add_signed(offset) {
            Some(position) => {
                self.position = position;
                Ok(position)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )),
        }
    }
}

impl Drop for ZipEntryUpdateStream {
    fn drop(&mut self) {
        self.close();
    }
}

/// Any of the three entry streams, as returned by the mode-dispatching
/// [`ZipArchive::open`](super::ZipArchive::open).
///
/// Operations the underlying stream does not support fail with
/// [`io::ErrorKind::Unsupported`]. Prefer the mode-specific `open_*`
/// methods when the mode is known.
pub enum EntryStream<'a, S: ArchiveStream> {
    Read(ZipEntryReader<'a, S>),
    Write(ZipEntryWriter<'a, S>),
    Update(ZipEntryUpdateStream),
}

fn unsupported(what: &str) -> io::Error {
    io::Error::new(io::ErrorKind::Unsupported, format!("entry stream does not support {what}"))
}

impl<S: ArchiveStream> EntryStream<'_, S> {
    pub fn can_read(&self) -> bool {
        !matches!(self, EntryStream::Write(_))
    }

    pub fn can_write(&self) -> bool {
        !matches!(self, EntryStream::Read(_))
    }

    pub fn can_seek(&self) -> bool {
        matches!(self, EntryStream::Update(_))
    }

    pub fn close(&mut self) -> Result<()> {
        match self {
            EntryStream::Read(reader) => reader.close(),
            EntryStream::Write(writer) => writer.close()?,
            EntryStream::Update(stream) => stream.close(),
        }
        Ok(())
    }
}

impl<S: ArchiveStream> Read for EntryStream<'_, S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            EntryStream::Read(reader) => reader.read(buf),
            EntryStream::Update(stream) => stream.read(buf),
            EntryStream::Write(_) => Err(unsupported("reading")),
        }
    }
}

impl<S: ArchiveStream> Write for EntryStream<'_, S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            EntryStream::Write(writer) => writer.write(buf),
            EntryStream::Update(stream) => stream.write(buf),
            EntryStream::Read(_) => Err(unsupported("writing")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            EntryStream::Write(writer) => writer.flush(),
            EntryStream::Update(stream) => stream.flush(),
            EntryStream::Read(_) => Ok(()),
        }
    }
}

impl<S: ArchiveStream> Seek for EntryStream<'_, S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            EntryStream::Update(stream) => stream.seek(pos),
            _ => Err(unsupported("seeking")),
        }
    }
}
