use std::io::{self, Read, Seek, SeekFrom, Write};

use super::ArchiveStream;

fn unsupported(what: &str) -> io::Error {
    io::Error::new(io::ErrorKind::Unsupported, format!("stream does not support {what}"))
}

/// Read-only archive source over any seekable reader.
///
/// Use this for `Read`-mode archives on sources that cannot be written,
/// such as `Cursor<&[u8]>` or a `BufReader<File>`.
pub struct ReadOnly<R> {
    inner: R,
}

impl<R: Read + Seek> ReadOnly<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for ReadOnly<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R> Write for ReadOnly<R> {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(unsupported("writing"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<R: Seek> Seek for ReadOnly<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

impl<R: Read + Seek> ArchiveStream for ReadOnly<R> {
    fn can_write(&self) -> bool {
        false
    }

    fn set_len(&mut self, _len: u64) -> io::Result<()> {
        Err(unsupported("changing its length"))
    }
}

/// Append-only archive sink over a writer that cannot seek.
///
/// The only seek it answers is `SeekFrom::Current(0)`, which reports how
/// many bytes have been written so far. Entries written through it carry a
/// trailing data descriptor instead of having their local header patched.
pub struct Streaming<W> {
    inner: W,
    position: u64,
}

impl<W: Write> Streaming<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, position: 0 }
    }

    /// Number of bytes written so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W> Read for Streaming<W> {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(unsupported("reading"))
    }
}

impl<W: Write> Write for Streaming<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.position += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W> Seek for Streaming<W> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match pos {
            SeekFrom::Current(0) => Ok(self.position),
            _ => Err(unsupported("seeking")),
        }
    }
}

impl<W: Write> ArchiveStream for Streaming<W> {
    fn can_read(&self) -> bool {
        false
    }

    fn can_seek(&self) -> bool {
        false
    }

    fn set_len(&mut self, _len: u64) -> io::Result<()> {
        Err(unsupported("changing its length"))
    }

    fn total_len(&mut self) -> io::Result<u64> {
        Ok(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_only_rejects_writes() {
        let mut source = ReadOnly::new(Cursor::new(b"data".to_vec()));
        assert!(!source.can_write());
        let error = source.write(b"x").unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::Unsupported);

        let mut buf = String::new();
        source.read_to_string(&mut buf).unwrap();
        assert_eq!(buf, "data");
    }

    #[test]
    fn test_streaming_counts_position() {
        let mut sink = Streaming::new(Vec::new());
        sink.write_all(b"hello").unwrap();
        assert_eq!(sink.stream_position().unwrap(), 5);
        assert_eq!(sink.seek(SeekFrom::Start(0)).unwrap_err().kind(), io::ErrorKind::Unsupported);
        assert!(!sink.can_seek());
        assert_eq!(sink.into_inner(), b"hello");
    }
}
