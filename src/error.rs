//! Error types for archive operations.
//!
//! Errors fall into four groups:
//!
//! - **I/O** ([`ZipError::Io`]): failures of the underlying byte stream,
//!   carried unchanged.
//! - **Invalid data** ([`ZipError::InvalidData`]): the bytes do not match the
//!   ZIP format. The message names the structural check that failed.
//! - **Unsupported** ([`ZipError::Unsupported`]): valid ZIP features this
//!   crate does not implement (encryption, spanned archives, methods other
//!   than Stored and Deflate).
//! - **Usage**: the caller broke an API contract, e.g. opening a Create-mode
//!   entry twice or querying sizes that are not final yet.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ZipError {
    #[error("I/O error: {0}")]
    Io(io::Error),

    #[error("invalid zip data: {0}")]
    InvalidData(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("cannot access a closed stream or archive")]
    Disposed,

    #[error("entries in create mode can only be written to once, and only one entry can be held open at a time")]
    AlreadyWritten,

    #[error("only one stream can be open on an entry at a time")]
    StreamAlreadyOpen,

    #[error("cannot modify a read-only archive")]
    ReadOnlyArchive,

    #[error("length properties are unavailable once an entry has been opened for writing")]
    SizeNotAvailable,

    #[error("cannot modify an entry in create mode after it has been opened for writing")]
    FrozenAfterWrite,

    #[error("operation not valid in this archive mode: {0}")]
    WrongMode(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("extracting entry would write outside the destination directory: {0}")]
    PathTraversal(String),
}

pub type Result<T> = std::result::Result<T, ZipError>;

impl ZipError {
    pub(crate) fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData(message.into())
    }

    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    /// Whether the archive bytes themselves are malformed.
    pub fn is_invalid_data(&self) -> bool {
        matches!(self, Self::InvalidData(_))
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }

    /// Whether the error is a broken API contract rather than bad input.
    ///
    /// Retrying the same call will fail the same way.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Self::Disposed
                | Self::AlreadyWritten
                | Self::StreamAlreadyOpen
                | Self::ReadOnlyArchive
                | Self::SizeNotAvailable
                | Self::FrozenAfterWrite
                | Self::WrongMode(_)
                | Self::InvalidArgument(_)
        )
    }
}

impl From<io::Error> for ZipError {
    fn from(error: io::Error) -> Self {
        // Short fixed-size reads mean the structure was cut off, not that the
        // device failed.
        if error.kind() == io::ErrorKind::UnexpectedEof {
            return Self::invalid_data("unexpected end of stream");
        }

        // Codec errors that travelled through a std::io stream come back out
        // as themselves.
        if error.get_ref().is_some_and(|inner| inner.is::<ZipError>()) {
            return match error.into_inner().map(|inner| inner.downcast::<ZipError>()) {
                Some(Ok(zip_error)) => *zip_error,
                _ => Self::invalid_data("stream error"),
            };
        }

        Self::Io(error)
    }
}

impl From<ZipError> for io::Error {
    fn from(error: ZipError) -> Self {
        match error {
            ZipError::Io(inner) => inner,
            ZipError::InvalidData(_) | ZipError::PathTraversal(_) => {
                io::Error::new(io::ErrorKind::InvalidData, error)
            }
            ZipError::Unsupported(_) => io::Error::new(io::ErrorKind::Unsupported, error),
            ZipError::InvalidArgument(_) => io::Error::new(io::ErrorKind::InvalidInput, error),
            _ => io::Error::other(error),
        }
    }
}
