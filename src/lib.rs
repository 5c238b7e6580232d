//! # ziparc
//!
//! Read, create and update ZIP archives over any byte stream.
//!
//! An archive is opened in one of three modes:
//!
//! - **Read**: the central directory is parsed up front and entries are
//!   streamed out of the archive on demand.
//! - **Create**: entries are compressed straight into the output as they are
//!   written, one at a time. Sinks that cannot seek get data descriptors.
//! - **Update**: entries can be edited, added and deleted; the whole archive
//!   is rewritten when it is finished.
//!
//! ## Features
//!
//! - STORED and DEFLATE compression
//! - ZIP64 for large entries, large archives and many entries
//! - Unknown extra fields and comments survive an update
//! - Extraction that refuses to write outside the destination directory
//!
//! ## Example
//!
//! ```no_run
//! use std::io::Read;
//! use ziparc::{ZipFile, ZipArchiveMode};
//!
//! fn main() -> ziparc::Result<()> {
//!     let archive = ZipFile::open_read("archive.zip")?;
//!     for entry in archive.entries()? {
//!         println!("{} ({} bytes)", entry.full_name(), entry.length()?);
//!     }
//!
//!     let mut text = String::new();
//!     archive.open_read(0)?.read_to_string(&mut text)?;
//!
//!     let mut archive = ZipFile::open("archive.zip", ZipArchiveMode::Update)?;
//!     if let Some(index) = archive.index_of("stale.txt")? {
//!         archive.delete_entry(index)?;
//!     }
//!     archive.finish()?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod io;
pub mod zip;

pub use cli::Cli;
pub use error::{Result, ZipError};
pub use io::{ArchiveStream, ReadOnly, Streaming};
pub use zip::{
    ArchiveOptions, CompressionLevel, CompressionMethod, EntryStream, ZipArchive,
    ZipArchiveEntry, ZipArchiveMode, ZipEntryReader, ZipEntryUpdateStream, ZipEntryWriter,
    ZipFile,
};
