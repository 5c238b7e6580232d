//! Low-level ZIP archive parser.
//!
//! ## Parsing Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) by scanning backward, since a
//!    variable-length comment may follow it
//! 2. If any EOCD field holds a sentinel, follow the ZIP64 locator to the
//!    ZIP64 EOCD for the real 64-bit values
//! 3. Read the Central Directory to get metadata for all entries
//!
//! Local file headers are not touched here; entries locate their data
//! lazily when opened.

use std::io::{BufReader, Read, Seek, SeekFrom};

use tracing::{debug, trace};

use super::structures::{
    CentralDirectoryFileHeader, EndOfCentralDirectory, MASK16, MASK32, Zip64Eocd,
    Zip64EocdLocator,
};
use crate::error::{Result, ZipError};

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: u64 = 65535;

/// Bytes read per step of the backward signature scan.
const BACKWARDS_SEEK_BUFFER_SIZE: usize = 32;

/// Everything the archive needs from the tail of the file.
#[derive(Debug, Clone, Default)]
pub struct CentralDirectory {
    pub headers: Vec<CentralDirectoryFileHeader>,
    pub number_of_this_disk: u32,
    pub cd_offset: u64,
    pub cd_size: u64,
    pub comment: Vec<u8>,
}

/// Where the central directory lives, after ZIP64 resolution.
struct DirectoryLocation {
    number_of_this_disk: u32,
    cd_offset: u64,
    cd_size: u64,
    total_entries: u64,
    comment: Vec<u8>,
}

/// Low-level ZIP file parser over a seekable reader.
pub struct ZipParser<'a, R> {
    reader: &'a mut R,
    /// Total size of the archive in bytes
    size: u64,
}

impl<'a, R: Read + Seek> ZipParser<'a, R> {
    pub fn new(reader: &'a mut R) -> Result<Self> {
        let size = reader.seek(SeekFrom::End(0))?;
        Ok(Self { reader, size })
    }

    /// Read the whole central directory.
    ///
    /// With `save_extra_fields` every header keeps its unknown extra fields
    /// so they can be written back out; plain reading skips them.
    ///
    /// # Errors
    ///
    /// `InvalidData` for anything structurally wrong (including I/O failures
    /// while walking the directory), `Unsupported` for spanned archives.
    pub fn read_central_directory(&mut self, save_extra_fields: bool) -> Result<CentralDirectory> {
        let location = self.read_end_of_central_directory().map_err(corrupt)?;

        if location.cd_offset > self.size {
            return Err(ZipError::invalid_data(
                "central directory offset points past the end of the stream",
            ));
        }

        self.reader.seek(SeekFrom::Start(location.cd_offset))?;
        let mut buffered = BufReader::new(&mut *self.reader);
        let mut headers = Vec::new();
        while let Some(header) =
            CentralDirectoryFileHeader::try_read(&mut buffered, save_extra_fields).map_err(corrupt)?
        {
            headers.push(header);
        }

        if headers.len() as u64 != location.total_entries {
            return Err(ZipError::invalid_data(format!(
                "number of entries expected in end of central directory ({}) does not match the central directory ({})",
                location.total_entries,
                headers.len()
            )));
        }

        debug!(
            entries = headers.len(),
            cd_offset = location.cd_offset,
            cd_size = location.cd_size,
            "read central directory"
        );

        Ok(CentralDirectory {
            headers,
            number_of_this_disk: location.number_of_this_disk,
            cd_offset: location.cd_offset,
            cd_size: location.cd_size,
            comment: location.comment,
        })
    }

    /// Find and parse the End of Central Directory record, following the
    /// ZIP64 locator when the classic record is saturated.
    fn read_end_of_central_directory(&mut self) -> Result<DirectoryLocation> {
        if self.size < EndOfCentralDirectory::SIZE {
            return Err(ZipError::invalid_data(
                "stream is too small to hold an end of central directory record",
            ));
        }

        // The signature can start no later than SIZE bytes before the end.
        self.reader.seek(SeekFrom::Start(
            self.size - EndOfCentralDirectory::SIZE_AFTER_SIGNATURE,
        ))?;
        let max_scan = MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE;
        if !self.seek_backwards_to_signature(EndOfCentralDirectory::SIGNATURE, max_scan)? {
            return Err(ZipError::invalid_data(
                "end of central directory record could not be found",
            ));
        }

        let eocd_start = self.reader.stream_position()?;
        let eocd = EndOfCentralDirectory::try_read(&mut *self.reader)?.ok_or_else(|| {
            ZipError::invalid_data("end of central directory signature vanished")
        })?;
        trace!(eocd_start, total_entries = eocd.total_entries, "found end of central directory");

        let mut location = DirectoryLocation {
            number_of_this_disk: eocd.number_of_this_disk as u32,
            cd_offset: eocd.cd_offset as u64,
            cd_size: eocd.cd_size as u64,
            total_entries: eocd.total_entries as u64,
            comment: eocd.comment.clone(),
        };

        if eocd.number_of_this_disk != eocd.disk_with_cd
            || eocd.entries_on_this_disk != eocd.total_entries
        {
            return Err(spanned());
        }

        if eocd.number_of_this_disk == MASK16
            || eocd.cd_offset == MASK32
            || eocd.total_entries == MASK16
        {
            self.read_zip64_end_of_central_directory(eocd_start, &mut location)?;
        }

        Ok(location)
    }

    /// Overwrite `location` with the values of the ZIP64 EOCD, if a locator
    /// precedes the classic record.
    ///
    /// Archives with saturated fields but no locator keep the literal values.
    fn read_zip64_end_of_central_directory(
        &mut self,
        eocd_start: u64,
        location: &mut DirectoryLocation,
    ) -> Result<()> {
        // The locator ends where the EOCD starts; scan from just past its
        // signature.
        let Some(scan_from) = eocd_start.checked_sub(Zip64EocdLocator::SIZE - 4) else {
            return Ok(());
        };
        self.reader.seek(SeekFrom::Start(scan_from))?;
        if !self.seek_backwards_to_signature(Zip64EocdLocator::SIGNATURE, Zip64EocdLocator::SIZE)? {
            return Ok(());
        }

        let locator = Zip64EocdLocator::try_read(&mut *self.reader)?
            .ok_or_else(|| ZipError::invalid_data("zip64 locator signature vanished"))?;
        if locator.zip64_eocd_offset > i64::MAX as u64 {
            return Err(ZipError::invalid_data(
                "zip64 end of central directory offset is out of range",
            ));
        }

        self.reader
            .seek(SeekFrom::Start(locator.zip64_eocd_offset))?;
        let record = Zip64Eocd::try_read(&mut *self.reader)?.ok_or_else(|| {
            ZipError::invalid_data(
                "zip64 end of central directory record not found where the locator points",
            )
        })?;

        if record.number_of_this_disk != record.disk_with_cd
            || record.entries_on_this_disk != record.total_entries
        {
            return Err(spanned());
        }
        if record.total_entries > i64::MAX as u64 || record.cd_offset > i64::MAX as u64 {
            return Err(ZipError::invalid_data(
                "zip64 end of central directory values are out of range",
            ));
        }

        debug!(
            zip64_eocd_offset = locator.zip64_eocd_offset,
            total_entries = record.total_entries,
            "using zip64 end of central directory"
        );

        location.number_of_this_disk = record.number_of_this_disk;
        location.cd_offset = record.cd_offset;
        location.cd_size = record.cd_size;
        location.total_entries = record.total_entries;
        Ok(())
    }

    /// Scan backward from the current position for a 4-byte little-endian
    /// signature.
    ///
    /// Reads fixed-size chunks, each ending where the previous one started,
    /// feeding bytes into a rolling window from the back. The final chunk at
    /// the start of the stream may be shorter. On success the reader is left
    /// at the first byte of the signature.
    fn seek_backwards_to_signature(&mut self, signature: u32, max_bytes: u64) -> Result<bool> {
        let mut buffer = [0u8; BACKWARDS_SEEK_BUFFER_SIZE];
        let mut window: u32 = 0;
        let mut scanned: u64 = 0;
        let mut out_of_bytes = false;

        while !out_of_bytes && scanned <= max_bytes {
            let position = self.reader.stream_position()?;
            let chunk = if position >= BACKWARDS_SEEK_BUFFER_SIZE as u64 {
                BACKWARDS_SEEK_BUFFER_SIZE
            } else {
                out_of_bytes = true;
                position as usize
            };
            let chunk_start = position - chunk as u64;

            self.reader.seek(SeekFrom::Start(chunk_start))?;
            self.reader.read_exact(&mut buffer[..chunk])?;
            self.reader.seek(SeekFrom::Start(chunk_start))?;

            for index in (0..chunk).rev() {
                window = (window << 8) | buffer[index] as u32;
                if window == signature {
                    self.reader
                        .seek(SeekFrom::Start(chunk_start + index as u64))?;
                    return Ok(true);
                }
            }
            scanned += chunk as u64;
        }

        Ok(false)
    }
}

fn spanned() -> ZipError {
    ZipError::unsupported("split or spanned archives")
}

/// I/O trouble while walking the directory means the directory is bad.
fn corrupt(error: ZipError) -> ZipError {
    match error {
        ZipError::Io(inner) => ZipError::invalid_data(format!("central directory corrupt: {inner}")),
        other => other,
    }
}
