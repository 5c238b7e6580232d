//! Byte streams an archive can live on, and the views entries use to reach
//! them.
//!
//! An archive owns exactly one [`ArchiveStream`]. What the stream can do
//! decides which archive modes are possible:
//!
//! | Mode   | read | write | seek |
//! |--------|------|-------|------|
//! | Read   | yes  |       | yes  |
//! | Create |      | yes   | (optional) |
//! | Update | yes  | yes   | yes  |
//!
//! Files and in-memory cursors support everything. [`ReadOnly`] wraps any
//! `Read + Seek` source, [`Streaming`] wraps any `Write` sink that cannot seek
//! (sockets, pipes, stdout).

mod adapters;
mod checksum;
mod sub_stream;

pub use adapters::{ReadOnly, Streaming};
pub use checksum::{BackingPosition, CheckSumWriter, WriteSummary};
pub use sub_stream::SubReadStream;

use std::cell::RefCell;
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

/// A byte stream that can back a ZIP archive.
///
/// The capability queries are consulted once, when the archive is opened;
/// unsupported operations on the stream itself should fail with
/// [`io::ErrorKind::Unsupported`].
pub trait ArchiveStream: Read + Write + Seek {
    fn can_read(&self) -> bool {
        true
    }

    fn can_write(&self) -> bool {
        true
    }

    fn can_seek(&self) -> bool {
        true
    }

    /// Truncate or extend the stream to exactly `len` bytes.
    fn set_len(&mut self, len: u64) -> io::Result<()>;

    /// Total length of the stream. The cursor position is preserved.
    fn total_len(&mut self) -> io::Result<u64> {
        let position = self.stream_position()?;
        let len = self.seek(SeekFrom::End(0))?;
        if position != len {
            self.seek(SeekFrom::Start(position))?;
        }
        Ok(len)
    }
}

impl ArchiveStream for File {
    fn set_len(&mut self, len: u64) -> io::Result<()> {
        File::set_len(self, len)
    }

    fn total_len(&mut self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }
}

impl ArchiveStream for Cursor<Vec<u8>> {
    fn set_len(&mut self, len: u64) -> io::Result<()> {
        let len = usize::try_from(len)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "length too large"))?;
        self.get_mut().resize(len, 0);
        Ok(())
    }

    fn total_len(&mut self) -> io::Result<u64> {
        Ok(self.get_ref().len() as u64)
    }
}

impl ArchiveStream for Cursor<&mut Vec<u8>> {
    fn set_len(&mut self, len: u64) -> io::Result<()> {
        let len = usize::try_from(len)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "length too large"))?;
        self.get_mut().resize(len, 0);
        Ok(())
    }

    fn total_len(&mut self) -> io::Result<u64> {
        Ok(self.get_ref().len() as u64)
    }
}

impl<T: ArchiveStream + ?Sized> ArchiveStream for &mut T {
    fn can_read(&self) -> bool {
        (**self).can_read()
    }

    fn can_write(&self) -> bool {
        (**self).can_write()
    }

    fn can_seek(&self) -> bool {
        (**self).can_seek()
    }

    fn set_len(&mut self, len: u64) -> io::Result<()> {
        (**self).set_len(len)
    }

    fn total_len(&mut self) -> io::Result<u64> {
        (**self).total_len()
    }
}

/// Shared handle to an archive stream.
///
/// Every entry stream of an archive goes through one of these. Each call
/// borrows the stream only for its own duration, so several readers can be
/// alive at once; none of them may assume the cursor is where it left it.
pub struct SharedStream<'a, S> {
    cell: &'a RefCell<S>,
}

impl<'a, S> SharedStream<'a, S> {
    pub fn new(cell: &'a RefCell<S>) -> Self {
        Self { cell }
    }
}

impl<S> Clone for SharedStream<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for SharedStream<'_, S> {}

impl<S: Read> Read for SharedStream<'_, S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.cell.borrow_mut().read(buf)
    }
}

impl<S: Write> Write for SharedStream<'_, S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.cell.borrow_mut().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.cell.borrow_mut().flush()
    }
}

impl<S: Seek> Seek for SharedStream<'_, S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.cell.borrow_mut().seek(pos)
    }
}
