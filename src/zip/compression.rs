use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use std::io::{self, Read, Seek, Write};
use std::str::FromStr;

use crate::error::{Result, ZipError};
use crate::io::BackingPosition;

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unknown(v) => *v,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, CompressionMethod::Unknown(_))
    }

    fn check_supported(&self) -> Result<()> {
        match self {
            CompressionMethod::Unknown(value) => Err(ZipError::unsupported(format!(
                "compression method {value}"
            ))),
            _ => Ok(()),
        }
    }
}

/// How hard the deflater works on new entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompressionLevel {
    #[default]
    Optimal,
    Fastest,
    /// Store entries without compressing them.
    NoCompression,
}

impl CompressionLevel {
    /// Method new entries written at this level use.
    pub fn method(&self) -> CompressionMethod {
        match self {
            CompressionLevel::NoCompression => CompressionMethod::Stored,
            _ => CompressionMethod::Deflate,
        }
    }

    fn flate2_level(&self) -> Compression {
        match self {
            CompressionLevel::Optimal => Compression::default(),
            CompressionLevel::Fastest => Compression::fast(),
            CompressionLevel::NoCompression => Compression::none(),
        }
    }
}

impl FromStr for CompressionLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "optimal" => Ok(CompressionLevel::Optimal),
            "fastest" => Ok(CompressionLevel::Fastest),
            "store" | "none" => Ok(CompressionLevel::NoCompression),
            other => Err(format!("unknown compression level '{other}'")),
        }
    }
}

/// Write side of an entry's data: bytes in, method-encoded bytes out.
pub enum Compressor<W: Write> {
    Stored(W),
    Deflate(DeflateEncoder<W>),
}

impl<W: Write> Compressor<W> {
    pub fn new(inner: W, method: CompressionMethod, level: CompressionLevel) -> Result<Self> {
        method.check_supported()?;
        Ok(match method {
            CompressionMethod::Deflate => {
                Compressor::Deflate(DeflateEncoder::new(inner, level.flate2_level()))
            }
            _ => Compressor::Stored(inner),
        })
    }

    pub fn get_mut(&mut self) -> &mut W {
        match self {
            Compressor::Stored(inner) => inner,
            Compressor::Deflate(encoder) => encoder.get_mut(),
        }
    }

    /// Flush the final block and hand back the inner writer.
    pub fn finish(self) -> io::Result<W> {
        match self {
            Compressor::Stored(mut inner) => {
                inner.flush()?;
                Ok(inner)
            }
            Compressor::Deflate(encoder) => encoder.finish(),
        }
    }
}

impl<W: Write> Write for Compressor<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Compressor::Stored(inner) => inner.write(buf),
            Compressor::Deflate(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Compressor::Stored(inner) => inner.flush(),
            Compressor::Deflate(encoder) => encoder.flush(),
        }
    }
}

impl<W: Write + Seek> BackingPosition for Compressor<W> {
    fn backing_position(&mut self) -> io::Result<u64> {
        self.get_mut().stream_position()
    }
}

/// Read side of an entry's data.
pub enum Decompressor<R: Read> {
    Stored(R),
    Deflate(DeflateDecoder<R>),
}

impl<R: Read> Decompressor<R> {
    pub fn new(inner: R, method: CompressionMethod) -> Result<Self> {
        method.check_supported()?;
        Ok(match method {
            CompressionMethod::Deflate => Decompressor::Deflate(DeflateDecoder::new(inner)),
            _ => Decompressor::Stored(inner),
        })
    }

    pub fn get_mut(&mut self) -> &mut R {
        match self {
            Decompressor::Stored(inner) => inner,
            Decompressor::Deflate(decoder) => decoder.get_mut(),
        }
    }
}

impl<R: Read> Read for Decompressor<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Decompressor::Stored(inner) => inner.read(buf),
            Decompressor::Deflate(decoder) => decoder.read(buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_method_codes() {
        assert_eq!(CompressionMethod::from_u16(0), CompressionMethod::Stored);
        assert_eq!(CompressionMethod::from_u16(8), CompressionMethod::Deflate);
        assert_eq!(CompressionMethod::from_u16(14), CompressionMethod::Unknown(14));
        assert_eq!(CompressionMethod::Unknown(14).as_u16(), 14);
        assert!(!CompressionMethod::Unknown(12).is_supported());
    }

    #[test]
    fn test_unknown_method_is_rejected() {
        let error = Decompressor::new(Cursor::new(Vec::new()), CompressionMethod::Unknown(14))
            .err()
            .unwrap();
        assert!(error.is_unsupported());
    }

    #[test]
    fn test_deflate_through_compressor_and_back() {
        let text = b"ziparc ziparc ziparc ziparc ziparc ziparc".repeat(20);
        let mut compressor = Compressor::new(
            Cursor::new(Vec::new()),
            CompressionMethod::Deflate,
            CompressionLevel::Fastest,
        )
        .unwrap();
        compressor.write_all(&text).unwrap();
        let compressed = compressor.finish().unwrap().into_inner();
        assert!(compressed.len() < text.len());

        let mut decompressor =
            Decompressor::new(Cursor::new(compressed), CompressionMethod::Deflate).unwrap();
        let mut out = Vec::new();
        decompressor.read_to_end(&mut out).unwrap();
        assert_eq!(out, text);
    }

    #[test]
    fn test_level_parsing() {
        assert_eq!("store".parse::<CompressionLevel>().unwrap(), CompressionLevel::NoCompression);
        assert_eq!("Fastest".parse::<CompressionLevel>().unwrap(), CompressionLevel::Fastest);
        assert!("ultra".parse::<CompressionLevel>().is_err());
        assert_eq!(CompressionLevel::NoCompression.method(), CompressionMethod::Stored);
    }
}
