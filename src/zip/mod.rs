//! ZIP archive reading, writing and in-place updating.
//!
//! ## Architecture
//!
//! - [`structures`]: binary records (local/central headers, EOCD, ZIP64
//!   records, extra fields, data descriptors)
//! - [`parser`]: backward EOCD scan and central directory parsing
//! - `entry`: per-entry metadata and header serialization
//! - `streams`: the read, write and update streams entries are opened as
//! - `archive`: the [`ZipArchive`] state machine tying the above together
//! - `file` / `extractor`: file-system conveniences on top of the archive
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end, preceded by the
//!    ZIP64 EOCD record and locator when offsets or counts overflow
//!
//! Reading starts from the EOCD, so listing an archive never touches the
//! entry data.
//!
//! ## Supported Features
//!
//! - ZIP64 extensions for entries and archives over 4GB or 65535 entries
//! - STORED and DEFLATE compression methods
//! - Streaming output with data descriptors when the sink cannot seek
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - No BZIP2, LZMA, or other compression methods

mod archive;
mod compression;
mod datetime;
mod entry;
mod extractor;
mod file;
pub mod parser;
mod streams;
pub mod structures;

pub use archive::{ArchiveOptions, ZipArchive, ZipArchiveMode};
pub use compression::{CompressionLevel, CompressionMethod};
pub use entry::ZipArchiveEntry;
pub use extractor::resolve_entry_path;
pub use file::ZipFile;
pub use streams::{EntryStream, ZipEntryReader, ZipEntryUpdateStream, ZipEntryWriter};
