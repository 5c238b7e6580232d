use std::io::{self, Read, Seek, SeekFrom};

use tracing::trace;

use crate::error::ZipError;

/// Read-only window `[start, start + length)` over a larger stream.
///
/// The window keeps its own cursor. Before every read it checks where the
/// underlying stream actually is and seeks back if something else moved it,
/// so several windows over the same stream can be read in any interleaving.
/// Reads never cross the end of the window.
///
/// The type deliberately implements neither `Write` nor `Seek`.
pub struct SubReadStream<R> {
    inner: R,
    start: u64,
    end: u64,
    position: u64,
    closed: bool,
}

impl<R: Read + Seek> SubReadStream<R> {
    pub fn new(inner: R, start: u64, length: u64) -> Self {
        Self {
            inner,
            start,
            end: start.saturating_add(length),
            position: start,
            closed: false,
        }
    }

    /// Length of the window.
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// Cursor position relative to the start of the window.
    pub fn position(&self) -> u64 {
        self.position - self.start
    }

    /// Mark the view unreadable. Closing twice is harmless.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl<R: Read + Seek> Read for SubReadStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.closed {
            return Err(ZipError::Disposed.into());
        }

        let remaining = self.end.saturating_sub(self.position);
        let count = (buf.len() as u64).min(remaining) as usize;
        if count == 0 {
            return Ok(0);
        }

        if self.inner.stream_position()? != self.position {
            trace!(position = self.position, "re-seeking shared stream");
            self.inner.seek(SeekFrom::Start(self.position))?;
        }

        let read = self.inner.read(&mut buf[..count])?;
        self.position += read as u64;
        Ok(read)
    }
}
