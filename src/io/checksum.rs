use std::io::{self, Cursor, Write};

use crc32fast::Hasher;

/// Writers that can report the position of the archive stream they
/// eventually feed, even when bytes pass through a compressor first.
pub trait BackingPosition {
    fn backing_position(&mut self) -> io::Result<u64>;
}

impl<T> BackingPosition for Cursor<T>
where
    Cursor<T>: io::Seek,
{
    fn backing_position(&mut self) -> io::Result<u64> {
        io::Seek::stream_position(self)
    }
}

/// What a [`CheckSumWriter`] saw, handed back by [`CheckSumWriter::finish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteSummary {
    /// Archive position when the first byte arrived (or at finish, if none did).
    pub initial_position: u64,
    /// Uncompressed bytes accepted.
    pub uncompressed_size: u64,
    pub crc32: u32,
}

/// Write-only view that checksums and counts the bytes it forwards.
///
/// Bytes go to the inner writer, normally a compressor sitting on the
/// archive stream. The running CRC-32 covers the bytes in the order they were
/// accepted. The archive position is sampled lazily on the first non-empty
/// write; compressed size is later "final position minus initial position".
pub struct CheckSumWriter<W> {
    inner: W,
    hasher: Hasher,
    written: u64,
    initial_position: Option<u64>,
}

impl<W: Write + BackingPosition> CheckSumWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Hasher::new(),
            written: 0,
            initial_position: None,
        }
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Stop tracking and return the inner writer with the final figures.
    ///
    /// The inner writer is handed back unflushed; the caller decides when it
    /// is done (a compressor has to be finished before the archive position
    /// means anything).
    pub fn finish(mut self) -> io::Result<(W, WriteSummary)> {
        let initial_position = match self.initial_position {
            Some(position) => position,
            None => self.inner.backing_position()?,
        };
        let summary = WriteSummary {
            initial_position,
            uncompressed_size: self.written,
            crc32: self.hasher.finalize(),
        };
        Ok((self.inner, summary))
    }
}

impl<W: Write + BackingPosition> Write for CheckSumWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        if self.initial_position.is_none() {
            self.initial_position = Some(self.inner.backing_position()?);
        }

        let accepted = self.inner.write(buf)?;
        self.hasher.update(&buf[..accepted]);
        self.written += accepted as u64;
        Ok(accepted)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
