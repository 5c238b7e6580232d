//! Fixed-layout ZIP records and their (de)serialization.
//!
//! Every record offers a `try_read` that returns `Ok(None)` when the
//! signature does not match (so callers can sniff for a record) and a
//! writer that either succeeds or fails with the stream's I/O error.
//! All integers are little-endian.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::error::Result;

/// Sentinel written into a 32-bit field whose real value lives in ZIP64 space.
pub const MASK32: u32 = 0xFFFF_FFFF;
/// Sentinel written into a 16-bit field whose real value lives in ZIP64 space.
pub const MASK16: u16 = 0xFFFF;

/// Whether an entry's sizes need the ZIP64 escape.
///
/// A size of exactly `0xFFFFFFFF` still fits: only strictly larger values
/// overflow the 32-bit field.
pub fn sizes_too_large(uncompressed_size: u64, compressed_size: u64) -> bool {
    uncompressed_size > MASK32 as u64 || compressed_size > MASK32 as u64
}

/// One tagged, length-prefixed block of an extra-field chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraField {
    pub tag: u16,
    pub data: Vec<u8>,
}

impl ExtraField {
    /// Tag plus size.
    pub const HEADER_SIZE: usize = 4;

    pub fn new(tag: u16, data: Vec<u8>) -> Self {
        Self { tag, data }
    }

    pub fn total_size(&self) -> usize {
        Self::HEADER_SIZE + self.data.len()
    }

    /// Parse one block from the front of `bytes`.
    ///
    /// Returns the block and the number of bytes it occupied, or `None` when
    /// the header is cut short or the declared size runs past the buffer.
    pub fn try_read(bytes: &[u8]) -> Option<(Self, usize)> {
        if bytes.len() < Self::HEADER_SIZE {
            return None;
        }
        let tag = u16::from_le_bytes([bytes[0], bytes[1]]);
        let size = u16::from_le_bytes([bytes[2], bytes[3]]) as usize;
        let end = Self::HEADER_SIZE + size;
        if bytes.len() < end {
            return None;
        }
        Some((Self::new(tag, bytes[Self::HEADER_SIZE..end].to_vec()), end))
    }

    /// Parse a whole chain. Parsing stops at the first malformed block;
    /// trailing garbage is dropped.
    pub fn parse_all(mut bytes: &[u8]) -> Vec<ExtraField> {
        let mut fields = Vec::new();
        while let Some((field, used)) = Self::try_read(bytes) {
            fields.push(field);
            bytes = &bytes[used..];
        }
        fields
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u16::<LittleEndian>(self.tag)?;
        writer.write_u16::<LittleEndian>(self.data.len() as u16)?;
        writer.write_all(&self.data)
    }

    pub fn write_all<W: Write>(fields: &[ExtraField], writer: &mut W) -> io::Result<()> {
        for field in fields {
            field.write(writer)?;
        }
        Ok(())
    }

    pub fn total_size_of(fields: &[ExtraField]) -> usize {
        fields.iter().map(ExtraField::total_size).sum()
    }
}

/// Which 32-bit header fields held a sentinel and must be read from the
/// ZIP64 block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Zip64Request {
    pub uncompressed_size: bool,
    pub compressed_size: bool,
    pub local_header_offset: bool,
    pub start_disk_number: bool,
}

impl Zip64Request {
    pub fn is_empty(&self) -> bool {
        !(self.uncompressed_size
            || self.compressed_size
            || self.local_header_offset
            || self.start_disk_number)
    }

    fn expected_data_size(&self) -> usize {
        let mut size = 0;
        if self.uncompressed_size {
            size += 8;
        }
        if self.compressed_size {
            size += 8;
        }
        if self.local_header_offset {
            size += 8;
        }
        if self.start_disk_number {
            size += 4;
        }
        size
    }
}

/// ZIP64 extended information extra field (tag `0x0001`).
///
/// Only the present fields are serialized, always in the order
/// uncompressed size, compressed size, local header offset, disk number.
/// The block size is derived from which fields are present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Zip64ExtraField {
    pub uncompressed_size: Option<u64>,
    pub compressed_size: Option<u64>,
    pub local_header_offset: Option<u64>,
    pub start_disk_number: Option<u32>,
}

impl Zip64ExtraField {
    pub const TAG: u16 = 0x0001;
    /// Bytes between the start of the block and its first value.
    pub const OFFSET_TO_FIRST_FIELD: usize = 4;

    pub fn is_empty(&self) -> bool {
        self.uncompressed_size.is_none()
            && self.compressed_size.is_none()
            && self.local_header_offset.is_none()
            && self.start_disk_number.is_none()
    }

    /// Size of the values, excluding tag and size.
    pub fn data_size(&self) -> u16 {
        let eights = [
            self.uncompressed_size,
            self.compressed_size,
            self.local_header_offset,
        ]
        .iter()
        .filter(|value| value.is_some())
        .count() as u16;
        eights * 8 + if self.start_disk_number.is_some() { 4 } else { 0 }
    }

    /// Size of the whole block. Zero when no field is present, since no
    /// block gets written then.
    pub fn total_size(&self) -> u16 {
        if self.is_empty() {
            0
        } else {
            Self::OFFSET_TO_FIRST_FIELD as u16 + self.data_size()
        }
    }

    /// Interpret a generic extra field as a ZIP64 block holding exactly the
    /// requested values.
    ///
    /// A block of any other size is somebody else's data and yields `None`.
    fn from_extra_field(field: &ExtraField, request: Zip64Request) -> Option<Self> {
        if field.tag != Self::TAG || field.data.len() != request.expected_data_size() {
            return None;
        }

        let mut data = field.data.as_slice();
        let mut block = Self::default();
        if request.uncompressed_size {
            block.uncompressed_size = data.read_u64::<LittleEndian>().ok();
        }
        if request.compressed_size {
            block.compressed_size = data.read_u64::<LittleEndian>().ok();
        }
        if request.local_header_offset {
            block.local_header_offset = data.read_u64::<LittleEndian>().ok();
        }
        if request.start_disk_number {
            block.start_disk_number = data.read_u32::<LittleEndian>().ok();
        }
        Some(block)
    }

    /// Find the ZIP64 block in a raw extra-field chain without keeping
    /// anything else.
    ///
    /// With nothing requested this is always an empty block.
    pub fn get_just_zip64_block(extra: &[u8], request: Zip64Request) -> Option<Self> {
        if request.is_empty() {
            return Some(Self::default());
        }

        let mut rest = extra;
        while let Some((field, used)) = ExtraField::try_read(rest) {
            if let Some(block) = Self::from_extra_field(&field, request) {
                return Some(block);
            }
            rest = &rest[used..];
        }
        None
    }

    /// Pull the ZIP64 block out of a parsed chain.
    ///
    /// Every tag `0x0001` block is removed whether or not it matched, since
    /// the writer synthesizes its own. The first exact-size match wins.
    pub fn get_and_remove_zip64_block(
        fields: &mut Vec<ExtraField>,
        request: Zip64Request,
    ) -> Option<Self> {
        let found = if request.is_empty() {
            Some(Self::default())
        } else {
            fields
                .iter()
                .find_map(|field| Self::from_extra_field(field, request))
        };
        Self::remove_zip64_blocks(fields);
        found
    }

    pub fn remove_zip64_blocks(fields: &mut Vec<ExtraField>) {
        fields.retain(|field| field.tag != Self::TAG);
    }

    /// Write the block. Writes nothing when no field is present.
    pub fn write_block<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        writer.write_u16::<LittleEndian>(Self::TAG)?;
        writer.write_u16::<LittleEndian>(self.data_size())?;
        if let Some(value) = self.uncompressed_size {
            writer.write_u64::<LittleEndian>(value)?;
        }
        if let Some(value) = self.compressed_size {
            writer.write_u64::<LittleEndian>(value)?;
        }
        if let Some(value) = self.local_header_offset {
            writer.write_u64::<LittleEndian>(value)?;
        }
        if let Some(value) = self.start_disk_number {
            writer.write_u32::<LittleEndian>(value)?;
        }
        Ok(())
    }
}

/// Local File Header (LFH) - 30 bytes + name + extra
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalFileHeader {
    pub version_needed: u16,
    pub flags: u16,
    pub compression_method: u16,
    pub last_modified: u32,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name: Vec<u8>,
    pub extra_field: Vec<u8>,
}

impl LocalFileHeader {
    pub const SIGNATURE: u32 = 0x04034b50;
    pub const SIZE: u64 = 30;
    pub const OFFSET_TO_FLAGS: u64 = 6;
    pub const OFFSET_TO_CRC: u64 = 14;
    /// Offset of the name-length field; the extra-length field follows it.
    pub const OFFSET_TO_NAME_LENGTH: u64 = 26;

    pub fn try_read<R: Read>(reader: &mut R) -> Result<Option<Self>> {
        if reader.read_u32::<LittleEndian>()? != Self::SIGNATURE {
            return Ok(None);
        }

        let version_needed = reader.read_u16::<LittleEndian>()?;
        let flags = reader.read_u16::<LittleEndian>()?;
        let compression_method = reader.read_u16::<LittleEndian>()?;
        let last_modified = reader.read_u32::<LittleEndian>()?;
        let crc32 = reader.read_u32::<LittleEndian>()?;
        let compressed_size = reader.read_u32::<LittleEndian>()?;
        let uncompressed_size = reader.read_u32::<LittleEndian>()?;
        let name_length = reader.read_u16::<LittleEndian>()? as usize;
        let extra_length = reader.read_u16::<LittleEndian>()? as usize;

        let mut file_name = vec![0u8; name_length];
        reader.read_exact(&mut file_name)?;
        let mut extra_field = vec![0u8; extra_length];
        reader.read_exact(&mut extra_field)?;

        Ok(Some(Self {
            version_needed,
            flags,
            compression_method,
            last_modified,
            crc32,
            compressed_size,
            uncompressed_size,
            file_name,
            extra_field,
        }))
    }

    /// Skip over the header at the current position, leaving the reader at
    /// the start of the entry data.
    ///
    /// Returns `false` if the signature is wrong or the variable part would
    /// run past `stream_len`.
    pub fn try_skip<R: Read + Seek>(reader: &mut R, stream_len: u64) -> Result<bool> {
        let start = reader.stream_position()?;
        if start.saturating_add(Self::SIZE) > stream_len {
            return Ok(false);
        }
        if reader.read_u32::<LittleEndian>()? != Self::SIGNATURE {
            return Ok(false);
        }

        reader.seek(SeekFrom::Start(start + Self::OFFSET_TO_NAME_LENGTH))?;
        let name_length = reader.read_u16::<LittleEndian>()? as u64;
        let extra_length = reader.read_u16::<LittleEndian>()? as u64;

        let end = start + Self::SIZE + name_length + extra_length;
        if end > stream_len {
            return Ok(false);
        }
        reader.seek(SeekFrom::Start(end))?;
        Ok(true)
    }

    /// Read just the extra-field chain of the header at the current position.
    pub fn read_extra_fields<R: Read>(reader: &mut R) -> Result<Option<Vec<ExtraField>>> {
        Ok(Self::try_read(reader)?.map(|header| ExtraField::parse_all(&header.extra_field)))
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(Self::SIGNATURE)?;
        writer.write_u16::<LittleEndian>(self.version_needed)?;
        writer.write_u16::<LittleEndian>(self.flags)?;
        writer.write_u16::<LittleEndian>(self.compression_method)?;
        writer.write_u32::<LittleEndian>(self.last_modified)?;
        writer.write_u32::<LittleEndian>(self.crc32)?;
        writer.write_u32::<LittleEndian>(self.compressed_size)?;
        writer.write_u32::<LittleEndian>(self.uncompressed_size)?;
        writer.write_u16::<LittleEndian>(self.file_name.len() as u16)?;
        writer.write_u16::<LittleEndian>(self.extra_field.len() as u16)?;
        writer.write_all(&self.file_name)?;
        writer.write_all(&self.extra_field)
    }
}

/// Trailing record carrying CRC and sizes for entries whose local header was
/// written before they were known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataDescriptor {
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
}

impl DataDescriptor {
    pub const SIGNATURE: u32 = 0x08074b50;

    /// Sizes are written as 64-bit values when `zip64` is set.
    pub fn write<W: Write>(&self, writer: &mut W, zip64: bool) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(Self::SIGNATURE)?;
        writer.write_u32::<LittleEndian>(self.crc32)?;
        if zip64 {
            writer.write_u64::<LittleEndian>(self.compressed_size)?;
            writer.write_u64::<LittleEndian>(self.uncompressed_size)?;
        } else {
            writer.write_u32::<LittleEndian>(self.compressed_size as u32)?;
            writer.write_u32::<LittleEndian>(self.uncompressed_size as u32)?;
        }
        Ok(())
    }
}

/// Central Directory File Header (CDFH) - 46 bytes + name + extra + comment
///
/// Sizes, offset and disk number are held at full width. The 32-bit fields
/// are only produced when writing, escaping through a ZIP64 block as needed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CentralDirectoryFileHeader {
    pub version_made_by_specification: u8,
    pub version_made_by_platform: u8,
    pub version_needed: u16,
    pub flags: u16,
    pub compression_method: u16,
    pub last_modified: u32,
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub disk_number_start: u32,
    pub internal_attributes: u16,
    pub external_attributes: u32,
    pub local_header_offset: u64,
    pub file_name: Vec<u8>,
    /// Unknown extra fields, ZIP64 block removed. Only kept when requested.
    pub extra_fields: Option<Vec<ExtraField>>,
    pub file_comment: Vec<u8>,
}

impl CentralDirectoryFileHeader {
    pub const SIGNATURE: u32 = 0x02014b50;
    pub const SIZE: u64 = 46;

    /// Read one header at the current position.
    ///
    /// With `save_extra_fields` the whole extra chain is parsed and kept
    /// (minus the ZIP64 block); otherwise only the ZIP64 values are taken
    /// from it.
    pub fn try_read<R: Read>(reader: &mut R, save_extra_fields: bool) -> Result<Option<Self>> {
        if reader.read_u32::<LittleEndian>()? != Self::SIGNATURE {
            return Ok(None);
        }

        let version_made_by_specification = reader.read_u8()?;
        let version_made_by_platform = reader.read_u8()?;
        let version_needed = reader.read_u16::<LittleEndian>()?;
        let flags = reader.read_u16::<LittleEndian>()?;
        let compression_method = reader.read_u16::<LittleEndian>()?;
        let last_modified = reader.read_u32::<LittleEndian>()?;
        let crc32 = reader.read_u32::<LittleEndian>()?;
        let compressed_size = reader.read_u32::<LittleEndian>()?;
        let uncompressed_size = reader.read_u32::<LittleEndian>()?;
        let name_length = reader.read_u16::<LittleEndian>()? as usize;
        let extra_length = reader.read_u16::<LittleEndian>()? as usize;
        let comment_length = reader.read_u16::<LittleEndian>()? as usize;
        let disk_number_start = reader.read_u16::<LittleEndian>()?;
        let internal_attributes = reader.read_u16::<LittleEndian>()?;
        let external_attributes = reader.read_u32::<LittleEndian>()?;
        let local_header_offset = reader.read_u32::<LittleEndian>()?;

        let mut file_name = vec![0u8; name_length];
        reader.read_exact(&mut file_name)?;
        let mut extra = vec![0u8; extra_length];
        reader.read_exact(&mut extra)?;
        let mut file_comment = vec![0u8; comment_length];
        reader.read_exact(&mut file_comment)?;

        let request = Zip64Request {
            uncompressed_size: uncompressed_size == MASK32,
            compressed_size: compressed_size == MASK32,
            local_header_offset: local_header_offset == MASK32,
            start_disk_number: disk_number_start == MASK16,
        };

        let (zip64, extra_fields) = if save_extra_fields {
            let mut fields = ExtraField::parse_all(&extra);
            let zip64 = Zip64ExtraField::get_and_remove_zip64_block(&mut fields, request);
            (zip64, Some(fields))
        } else {
            (Zip64ExtraField::get_just_zip64_block(&extra, request), None)
        };
        // A sentinel without a matching block keeps its literal value.
        let zip64 = zip64.unwrap_or_default();

        Ok(Some(Self {
            version_made_by_specification,
            version_made_by_platform,
            version_needed,
            flags,
            compression_method,
            last_modified,
            crc32,
            compressed_size: zip64.compressed_size.unwrap_or(compressed_size as u64),
            uncompressed_size: zip64.uncompressed_size.unwrap_or(uncompressed_size as u64),
            disk_number_start: zip64
                .start_disk_number
                .unwrap_or(disk_number_start as u32),
            internal_attributes,
            external_attributes,
            local_header_offset: zip64
                .local_header_offset
                .unwrap_or(local_header_offset as u64),
            file_name,
            extra_fields,
            file_comment,
        }))
    }

    /// The ZIP64 block this header needs when written.
    ///
    /// Both sizes escape together; the offset and the disk number escape
    /// independently.
    pub fn zip64_extra_field(&self) -> Zip64ExtraField {
        let mut zip64 = Zip64ExtraField::default();
        if sizes_too_large(self.uncompressed_size, self.compressed_size) {
            zip64.uncompressed_size = Some(self.uncompressed_size);
            zip64.compressed_size = Some(self.compressed_size);
        }
        if self.local_header_offset > MASK32 as u64 {
            zip64.local_header_offset = Some(self.local_header_offset);
        }
        if self.disk_number_start >= MASK16 as u32 {
            zip64.start_disk_number = Some(self.disk_number_start);
        }
        zip64
    }

    /// Write the header, escaping overflowing fields.
    ///
    /// Unknown extra fields are dropped if they no longer fit next to the
    /// ZIP64 block.
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let zip64 = self.zip64_extra_field();
        let unknown = self.extra_fields.as_deref().unwrap_or_default();
        let unknown_size = ExtraField::total_size_of(unknown);
        let (unknown, extra_length) =
            if zip64.total_size() as usize + unknown_size > u16::MAX as usize {
                (&[][..], zip64.total_size())
            } else {
                (unknown, zip64.total_size() + unknown_size as u16)
            };

        let escape32 = |value: Option<u64>, fallback: u64| match value {
            Some(_) => MASK32,
            None => fallback as u32,
        };

        writer.write_u32::<LittleEndian>(Self::SIGNATURE)?;
        writer.write_u8(self.version_made_by_specification)?;
        writer.write_u8(self.version_made_by_platform)?;
        writer.write_u16::<LittleEndian>(self.version_needed)?;
        writer.write_u16::<LittleEndian>(self.flags)?;
        writer.write_u16::<LittleEndian>(self.compression_method)?;
        writer.write_u32::<LittleEndian>(self.last_modified)?;
        writer.write_u32::<LittleEndian>(self.crc32)?;
        writer.write_u32::<LittleEndian>(escape32(zip64.compressed_size, self.compressed_size))?;
        writer.write_u32::<LittleEndian>(escape32(
            zip64.uncompressed_size,
            self.uncompressed_size,
        ))?;
        writer.write_u16::<LittleEndian>(self.file_name.len() as u16)?;
        writer.write_u16::<LittleEndian>(extra_length)?;
        writer.write_u16::<LittleEndian>(self.file_comment.len() as u16)?;
        writer.write_u16::<LittleEndian>(match zip64.start_disk_number {
            Some(_) => MASK16,
            None => self.disk_number_start as u16,
        })?;
        writer.write_u16::<LittleEndian>(self.internal_attributes)?;
        writer.write_u32::<LittleEndian>(self.external_attributes)?;
        writer.write_u32::<LittleEndian>(escape32(
            zip64.local_header_offset,
            self.local_header_offset,
        ))?;
        writer.write_all(&self.file_name)?;
        zip64.write_block(writer)?;
        ExtraField::write_all(unknown, writer)?;
        writer.write_all(&self.file_comment)
    }
}

/// End of Central Directory (EOCD) - 22 bytes + comment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndOfCentralDirectory {
    pub number_of_this_disk: u16,
    pub disk_with_cd: u16,
    pub entries_on_this_disk: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment: Vec<u8>,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: u32 = 0x06054b50;
    pub const SIZE: u64 = 22;
    /// Distance from the first byte after the signature to the end of the
    /// fixed part. The backward scan starts this far before the end.
    pub const SIZE_AFTER_SIGNATURE: u64 = Self::SIZE - 4;

    pub fn try_read<R: Read>(reader: &mut R) -> Result<Option<Self>> {
        if reader.read_u32::<LittleEndian>()? != Self::SIGNATURE {
            return Ok(None);
        }

        let number_of_this_disk = reader.read_u16::<LittleEndian>()?;
        let disk_with_cd = reader.read_u16::<LittleEndian>()?;
        let entries_on_this_disk = reader.read_u16::<LittleEndian>()?;
        let total_entries = reader.read_u16::<LittleEndian>()?;
        let cd_size = reader.read_u32::<LittleEndian>()?;
        let cd_offset = reader.read_u32::<LittleEndian>()?;
        let comment_length = reader.read_u16::<LittleEndian>()? as usize;
        let mut comment = vec![0u8; comment_length];
        reader.read_exact(&mut comment)?;

        Ok(Some(Self {
            number_of_this_disk,
            disk_with_cd,
            entries_on_this_disk,
            total_entries,
            cd_size,
            cd_offset,
            comment,
        }))
    }

    /// Whether any field holds a sentinel pointing into the ZIP64 records.
    pub fn is_zip64(&self) -> bool {
        self.number_of_this_disk == MASK16
            || self.disk_with_cd == MASK16
            || self.entries_on_this_disk == MASK16
            || self.total_entries == MASK16
            || self.cd_size == MASK32
            || self.cd_offset == MASK32
    }

    /// Write the record for a single-disk archive, using sentinels for
    /// anything that does not fit.
    pub fn write_block<W: Write>(
        writer: &mut W,
        entries: u64,
        cd_start: u64,
        cd_size: u64,
        comment: &[u8],
    ) -> io::Result<()> {
        let entries = if entries >= MASK16 as u64 { MASK16 } else { entries as u16 };
        let cd_start = if cd_start >= MASK32 as u64 { MASK32 } else { cd_start as u32 };
        let cd_size = if cd_size >= MASK32 as u64 { MASK32 } else { cd_size as u32 };

        writer.write_u32::<LittleEndian>(Self::SIGNATURE)?;
        writer.write_u16::<LittleEndian>(0)?;
        writer.write_u16::<LittleEndian>(0)?;
        writer.write_u16::<LittleEndian>(entries)?;
        writer.write_u16::<LittleEndian>(entries)?;
        writer.write_u32::<LittleEndian>(cd_size)?;
        writer.write_u32::<LittleEndian>(cd_start)?;
        writer.write_u16::<LittleEndian>(comment.len() as u16)?;
        writer.write_all(comment)
    }
}

/// ZIP64 End of Central Directory Locator - 20 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zip64EocdLocator {
    pub disk_with_zip64_eocd: u32,
    pub zip64_eocd_offset: u64,
    pub total_disks: u32,
}

impl Zip64EocdLocator {
    pub const SIGNATURE: u32 = 0x07064b50;
    pub const SIZE: u64 = 20;

    pub fn try_read<R: Read>(reader: &mut R) -> Result<Option<Self>> {
        if reader.read_u32::<LittleEndian>()? != Self::SIGNATURE {
            return Ok(None);
        }

        Ok(Some(Self {
            disk_with_zip64_eocd: reader.read_u32::<LittleEndian>()?,
            zip64_eocd_offset: reader.read_u64::<LittleEndian>()?,
            total_disks: reader.read_u32::<LittleEndian>()?,
        }))
    }

    pub fn write_block<W: Write>(writer: &mut W, zip64_eocd_start: u64) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(Self::SIGNATURE)?;
        writer.write_u32::<LittleEndian>(0)?;
        writer.write_u64::<LittleEndian>(zip64_eocd_start)?;
        writer.write_u32::<LittleEndian>(1)
    }
}

/// ZIP64 End of Central Directory - 56 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zip64Eocd {
    pub record_size: u64,
    pub version_made_by: u16,
    pub version_needed: u16,
    pub number_of_this_disk: u32,
    pub disk_with_cd: u32,
    pub entries_on_this_disk: u64,
    pub total_entries: u64,
    pub cd_size: u64,
    pub cd_offset: u64,
}

impl Zip64Eocd {
    pub const SIGNATURE: u32 = 0x06064b50;
    pub const SIZE: u64 = 56;
    /// Value of the size field: the record minus signature and size field.
    pub const RECORD_SIZE: u64 = Self::SIZE - 12;
    pub const VERSION: u16 = 45;

    /// Reads the fixed part; any extensible data after it is ignored.
    pub fn try_read<R: Read>(reader: &mut R) -> Result<Option<Self>> {
        if reader.read_u32::<LittleEndian>()? != Self::SIGNATURE {
            return Ok(None);
        }

        Ok(Some(Self {
            record_size: reader.read_u64::<LittleEndian>()?,
            version_made_by: reader.read_u16::<LittleEndian>()?,
            version_needed: reader.read_u16::<LittleEndian>()?,
            number_of_this_disk: reader.read_u32::<LittleEndian>()?,
            disk_with_cd: reader.read_u32::<LittleEndian>()?,
            entries_on_this_disk: reader.read_u64::<LittleEndian>()?,
            total_entries: reader.read_u64::<LittleEndian>()?,
            cd_size: reader.read_u64::<LittleEndian>()?,
            cd_offset: reader.read_u64::<LittleEndian>()?,
        }))
    }

    pub fn write_block<W: Write>(
        writer: &mut W,
        entries: u64,
        cd_start: u64,
        cd_size: u64,
    ) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(Self::SIGNATURE)?;
        writer.write_u64::<LittleEndian>(Self::RECORD_SIZE)?;
        writer.write_u16::<LittleEndian>(Self::VERSION)?;
        writer.write_u16::<LittleEndian>(Self::VERSION)?;
        writer.write_u32::<LittleEndian>(0)?;
        writer.write_u32::<LittleEndian>(0)?;
        writer.write_u64::<LittleEndian>(entries)?;
        writer.write_u64::<LittleEndian>(entries)?;
        writer.write_u64::<LittleEndian>(cd_size)?;
        writer.write_u64::<LittleEndian>(cd_start)
    }
}
