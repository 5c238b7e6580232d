//! One member of an archive.
//!
//! An entry knows how to serialize its own local and central directory
//! headers, including the deferred CRC/size patch after its data has been
//! written. The archive owns the stream and hands it to the entry for the
//! duration of each operation.

use std::cell::{OnceCell, RefCell};
use std::io::{Read, Seek, SeekFrom, Write};
use std::sync::Arc;

use byteorder::{LittleEndian, WriteBytesExt};
use chrono::{Local, NaiveDateTime};
use encoding_rs::{Encoding, UTF_8};
use parking_lot::Mutex;
use tracing::trace;

use super::archive::ZipArchiveMode;
use super::compression::{CompressionLevel, CompressionMethod, Decompressor};
use super::datetime;
use super::streams::{UpdateBuffer, ZipEntryReader, ZipEntryUpdateStream, ZipEntryWriter};
use super::structures::{
    CentralDirectoryFileHeader, DataDescriptor, ExtraField, LocalFileHeader, MASK32,
    Zip64ExtraField, sizes_too_large,
};
use crate::error::{Result, ZipError};
use crate::io::{ArchiveStream, SharedStream, SubReadStream};

pub(crate) const FLAG_ENCRYPTED: u16 = 0x0001;
pub(crate) const FLAG_DATA_DESCRIPTOR: u16 = 0x0008;
pub(crate) const FLAG_UTF8: u16 = 0x0800;

const VERSION_DEFAULT: u16 = 10;
const VERSION_DEFLATE: u16 = 20;
const VERSION_EXPLICIT_DIRECTORY: u16 = 20;
const VERSION_ZIP64: u16 = 45;

pub(crate) const PLATFORM_FAT: u8 = 0;
pub(crate) const PLATFORM_UNIX: u8 = 3;

const CURRENT_PLATFORM: u8 = if cfg!(unix) { PLATFORM_UNIX } else { PLATFORM_FAT };

/// MS-DOS directory attribute.
const DOS_DIRECTORY: u32 = 0x10;
const UNIX_FILE_TYPE_MASK: u32 = 0o170000;
const UNIX_DIRECTORY: u32 = 0o040000;

/// Content held in memory between opening an entry and saving the archive.
pub(crate) enum Payload {
    Unbuffered,
    /// Decompressed content edited through an update stream.
    Uncompressed(Arc<Mutex<UpdateBuffer>>),
    /// Raw compressed bytes of an untouched entry, copied through on rewrite.
    CompressedPassthrough(Vec<u8>),
}

/// An entry in a ZIP archive.
pub struct ZipArchiveEntry {
    archive_mode: ZipArchiveMode,
    originally_in_archive: bool,
    disk_number_start: u32,
    version_made_by_platform: u8,
    version_made_by_specification: u8,
    version_to_extract: u16,
    flags: u16,
    compression_method: CompressionMethod,
    compression_level: CompressionLevel,
    last_modified: NaiveDateTime,
    pub(crate) uncompressed_size: u64,
    pub(crate) compressed_size: u64,
    internal_attributes: u16,
    external_attributes: u32,
    offset_of_local_header: u64,
    stored_offset_of_compressed_data: OnceCell<u64>,
    pub(crate) crc32: u32,
    full_name: String,
    stored_name: Vec<u8>,
    cd_unknown_extra_fields: Option<Vec<ExtraField>>,
    lh_unknown_extra_fields: Option<Vec<ExtraField>>,
    comment: Vec<u8>,
    pub(crate) payload: Payload,
    pub(crate) ever_opened_for_write: bool,
}

/// Encode an entry name for storage, returning the bytes and whether the
/// UTF-8 flag applies.
pub(crate) fn encode_entry_name(name: &str, encoding: Option<&'static Encoding>) -> (Vec<u8>, bool) {
    match encoding {
        Some(encoding) => {
            let (bytes, _, _) = encoding.encode(name);
            (bytes.into_owned(), encoding == UTF_8)
        }
        None => {
            let needs_unicode = name.chars().any(|c| !(' '..='~').contains(&c));
            (name.as_bytes().to_vec(), needs_unicode)
        }
    }
}

fn decode_entry_name(bytes: &[u8], flags: u16, encoding: Option<&'static Encoding>) -> String {
    if flags & FLAG_UTF8 != 0 {
        return String::from_utf8_lossy(bytes).into_owned();
    }
    encoding
        .unwrap_or(UTF_8)
        .decode_without_bom_handling(bytes)
        .0
        .into_owned()
}

impl ZipArchiveEntry {
    /// Entry parsed from an existing central directory.
    pub(crate) fn from_central_directory(
        header: CentralDirectoryFileHeader,
        archive_mode: ZipArchiveMode,
        level: CompressionLevel,
        encoding: Option<&'static Encoding>,
    ) -> Self {
        let full_name = decode_entry_name(&header.file_name, header.flags, encoding);
        Self {
            archive_mode,
            originally_in_archive: true,
            disk_number_start: header.disk_number_start,
            version_made_by_platform: header.version_made_by_platform,
            version_made_by_specification: header.version_made_by_specification,
            version_to_extract: header.version_needed,
            flags: header.flags,
            compression_method: CompressionMethod::from_u16(header.compression_method),
            compression_level: level,
            last_modified: datetime::from_dos(header.last_modified),
            uncompressed_size: header.uncompressed_size,
            compressed_size: header.compressed_size,
            internal_attributes: header.internal_attributes,
            external_attributes: header.external_attributes,
            offset_of_local_header: header.local_header_offset,
            stored_offset_of_compressed_data: OnceCell::new(),
            crc32: header.crc32,
            full_name,
            stored_name: header.file_name,
            cd_unknown_extra_fields: header.extra_fields,
            lh_unknown_extra_fields: None,
            comment: header.file_comment,
            payload: Payload::Unbuffered,
            ever_opened_for_write: false,
        }
    }

    /// Entry added in this session.
    pub(crate) fn new(
        name: &str,
        archive_mode: ZipArchiveMode,
        level: CompressionLevel,
        encoding: Option<&'static Encoding>,
    ) -> Result<Self> {
        if name.is_empty() {
            return Err(ZipError::InvalidArgument("entry name cannot be empty".into()));
        }
        let (stored_name, utf8) = encode_entry_name(name, encoding);
        if stored_name.len() > u16::MAX as usize {
            return Err(ZipError::unsupported("entry names longer than 65535 bytes"));
        }

        let mut entry = Self {
            archive_mode,
            originally_in_archive: false,
            disk_number_start: 0,
            version_made_by_platform: CURRENT_PLATFORM,
            version_made_by_specification: 0,
            version_to_extract: VERSION_DEFAULT,
            flags: if utf8 { FLAG_UTF8 } else { 0 },
            compression_method: level.method(),
            compression_level: level,
            last_modified: Local::now().naive_local(),
            uncompressed_size: 0,
            compressed_size: 0,
            internal_attributes: 0,
            external_attributes: 0,
            offset_of_local_header: 0,
            stored_offset_of_compressed_data: OnceCell::new(),
            crc32: 0,
            full_name: name.to_string(),
            stored_name,
            cd_unknown_extra_fields: None,
            lh_unknown_extra_fields: None,
            comment: Vec::new(),
            payload: Payload::Unbuffered,
            ever_opened_for_write: false,
        };
        if entry.name().is_empty() {
            entry.version_at_least(VERSION_EXPLICIT_DIRECTORY);
        }
        Ok(entry)
    }

    /// Path of the entry inside the archive, `/`-separated.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// File name part of [`full_name`](Self::full_name). Empty for explicit
    /// directory entries.
    pub fn name(&self) -> &str {
        let name = self.full_name.as_str();
        let cut = if self.version_made_by_platform == PLATFORM_FAT {
            name.rfind(['/', '\\'])
        } else {
            name.rfind('/')
        };
        match cut {
            Some(index) => &name[index + 1..],
            None => name,
        }
    }

    /// The raw name bytes as stored in the headers.
    pub fn raw_name(&self) -> &[u8] {
        &self.stored_name
    }

    pub fn comment(&self) -> &[u8] {
        &self.comment
    }

    pub fn set_comment(&mut self, comment: impl Into<Vec<u8>>) -> Result<()> {
        if self.archive_mode == ZipArchiveMode::Read {
            return Err(ZipError::ReadOnlyArchive);
        }
        let comment = comment.into();
        if comment.len() > u16::MAX as usize {
            return Err(ZipError::InvalidArgument(
                "entry comment longer than 65535 bytes".into(),
            ));
        }
        self.comment = comment;
        Ok(())
    }

    pub fn last_write_time(&self) -> NaiveDateTime {
        self.last_modified
    }

    /// Set the modification time. Only years 1980 through 2107 can be stored.
    pub fn set_last_write_time(&mut self, value: NaiveDateTime) -> Result<()> {
        self.check_mutable()?;
        if !datetime::in_dos_range(&value) {
            return Err(ZipError::InvalidArgument(format!(
                "last write time {value} is outside the range 1980-2107"
            )));
        }
        self.last_modified = value;
        Ok(())
    }

    pub fn external_attributes(&self) -> u32 {
        self.external_attributes
    }

    pub fn set_external_attributes(&mut self, value: u32) -> Result<()> {
        self.check_mutable()?;
        self.external_attributes = value;
        Ok(())
    }

    /// Whether the attributes mark this entry as a directory, either with
    /// the DOS directory bit or a Unix `S_IFDIR` mode.
    pub fn is_directory(&self) -> bool {
        self.external_attributes & DOS_DIRECTORY != 0
            || (self.external_attributes >> 16) & UNIX_FILE_TYPE_MASK == UNIX_DIRECTORY
    }

    /// Unix permission bits, if the entry was made on a Unix system.
    pub fn unix_mode(&self) -> Option<u32> {
        let mode = self.external_attributes >> 16;
        (self.version_made_by_platform == PLATFORM_UNIX && mode != 0).then_some(mode)
    }

    pub fn compression_method(&self) -> CompressionMethod {
        self.compression_method
    }

    /// Level used when this entry's data is (re)compressed.
    pub fn compression_level(&self) -> CompressionLevel {
        self.compression_level
    }

    pub fn crc32(&self) -> u32 {
        self.crc32
    }

    pub fn flags(&self) -> u16 {
        self.flags
    }

    pub fn has_data_descriptor(&self) -> bool {
        self.flags & FLAG_DATA_DESCRIPTOR != 0
    }

    pub fn is_encrypted(&self) -> bool {
        self.flags & FLAG_ENCRYPTED != 0
    }

    pub fn version_needed(&self) -> u16 {
        self.version_to_extract
    }

    pub fn offset_of_local_header(&self) -> u64 {
        self.offset_of_local_header
    }

    /// Uncompressed size.
    ///
    /// # Errors
    ///
    /// [`ZipError::SizeNotAvailable`] once the entry has been opened for
    /// writing, since the final size is only known when the archive is saved.
    pub fn length(&self) -> Result<u64> {
        if self.ever_opened_for_write {
            return Err(ZipError::SizeNotAvailable);
        }
        Ok(self.uncompressed_size)
    }

    /// Compressed size. Same availability rules as [`length`](Self::length).
    pub fn compressed_length(&self) -> Result<u64> {
        if self.ever_opened_for_write {
            return Err(ZipError::SizeNotAvailable);
        }
        Ok(self.compressed_size)
    }

    /// Unknown extra fields from the central directory, as read.
    pub fn central_extra_fields(&self) -> &[ExtraField] {
        self.cd_unknown_extra_fields.as_deref().unwrap_or_default()
    }

    pub(crate) fn is_open_for_update(&self) -> bool {
        match &self.payload {
            Payload::Uncompressed(buffer) => buffer.lock().open,
            _ => false,
        }
    }

    fn check_mutable(&self) -> Result<()> {
        match self.archive_mode {
            ZipArchiveMode::Read => Err(ZipError::ReadOnlyArchive),
            ZipArchiveMode::Create if self.ever_opened_for_write => Err(ZipError::FrozenAfterWrite),
            _ => Ok(()),
        }
    }

    fn version_at_least(&mut self, version: u16) {
        if self.version_to_extract < version {
            self.version_to_extract = version;
        }
    }

    /// Verify that the entry's data can be reached.
    ///
    /// Entries added in this session are always openable.
    pub(crate) fn check_openable<R: Read + Seek>(
        &self,
        stream: &mut R,
        stream_len: u64,
        archive_disk: u32,
        need_to_load_into_memory: bool,
    ) -> Result<()> {
        if !self.originally_in_archive {
            return Ok(());
        }

        if !self.compression_method.is_supported() {
            return Err(ZipError::unsupported(format!(
                "compression method {} of entry '{}'",
                self.compression_method.as_u16(),
                self.full_name
            )));
        }
        if self.is_encrypted() {
            return Err(ZipError::unsupported(format!(
                "encrypted entry '{}'",
                self.full_name
            )));
        }
        if self.disk_number_start != archive_disk {
            return Err(ZipError::unsupported(format!(
                "entry '{}' lives on another disk of a split archive",
                self.full_name
            )));
        }
        if self.offset_of_local_header > stream_len {
            return Err(ZipError::invalid_data(format!(
                "local file header offset of '{}' is out of range",
                self.full_name
            )));
        }

        let data_start = self.offset_of_compressed_data(stream, stream_len)?;
        let fits = data_start
            .checked_add(self.compressed_size)
            .is_some_and(|end| end <= stream_len);
        if !fits {
            return Err(ZipError::invalid_data(format!(
                "data of '{}' extends past the end of the stream",
                self.full_name
            )));
        }

        if need_to_load_into_memory && self.compressed_size > isize::MAX as u64 {
            return Err(ZipError::invalid_data(format!(
                "entry '{}' is too large to load into memory",
                self.full_name
            )));
        }
        Ok(())
    }

    /// Position of the first data byte, found by skipping the local header
    /// once and remembered afterwards.
    fn offset_of_compressed_data<R: Read + Seek>(&self, stream: &mut R, stream_len: u64) -> Result<u64> {
        if let Some(offset) = self.stored_offset_of_compressed_data.get() {
            return Ok(*offset);
        }

        stream.seek(SeekFrom::Start(self.offset_of_local_header))?;
        if !LocalFileHeader::try_skip(stream, stream_len)? {
            return Err(ZipError::invalid_data(format!(
                "local file header of '{}' is corrupt",
                self.full_name
            )));
        }
        let offset = stream.stream_position()?;
        let _ = self.stored_offset_of_compressed_data.set(offset);
        Ok(offset)
    }

    /// Decompressing view over the entry's data in the archive stream.
    pub(crate) fn open_reader<'a, S: ArchiveStream>(
        &self,
        cell: &'a RefCell<S>,
        archive_disk: u32,
    ) -> Result<ZipEntryReader<'a, S>> {
        let data_start = {
            let mut stream = cell.borrow_mut();
            let stream_len = stream.total_len()?;
            self.check_openable(&mut *stream, stream_len, archive_disk, false)?;
            self.offset_of_compressed_data(&mut *stream, stream_len)?
        };

        let window = SubReadStream::new(SharedStream::new(cell), data_start, self.compressed_size);
        Ok(ZipEntryReader::new(Decompressor::new(
            window,
            self.compression_method,
        )?))
    }

    /// Open the in-memory editing view, decompressing the original content
    /// the first time.
    pub(crate) fn open_update<S: ArchiveStream>(
        &mut self,
        cell: &RefCell<S>,
        archive_disk: u32,
    ) -> Result<ZipEntryUpdateStream> {
        if let Payload::Uncompressed(buffer) = &self.payload {
            let mut guard = buffer.lock();
            if guard.open {
                return Err(ZipError::StreamAlreadyOpen);
            }
            guard.open = true;
            drop(guard);
            return Ok(ZipEntryUpdateStream::new(Arc::clone(buffer)));
        }

        let mut data = Vec::new();
        if self.originally_in_archive {
            let mut reader = self.open_reader(cell, archive_disk)?;
            reader.read_to_end(&mut data)?;
        }

        self.ever_opened_for_write = true;
        if self.compression_method != CompressionMethod::Stored {
            self.compression_method = CompressionMethod::Deflate;
        }
        let buffer = Arc::new(Mutex::new(UpdateBuffer {
            data,
            open: true,
            saved: false,
        }));
        self.payload = Payload::Uncompressed(Arc::clone(&buffer));
        Ok(ZipEntryUpdateStream::new(buffer))
    }

    /// Write the local file header at the current position.
    ///
    /// Empty entries are forced to Stored with zero sizes. Streaming entries
    /// get the data descriptor flag and zeroed CRC/sizes. Otherwise the
    /// current CRC and sizes are written, escaped through a ZIP64 block when
    /// they are too large. Returns whether a ZIP64 block was written.
    pub(crate) fn write_local_file_header<W: Write + Seek>(
        &mut self,
        writer: &mut W,
        streaming: bool,
        is_empty: bool,
    ) -> Result<bool> {
        let mut zip64 = Zip64ExtraField::default();

        let (crc32, compressed_size, uncompressed_size) = if is_empty {
            self.compression_method = CompressionMethod::Stored;
            self.crc32 = 0;
            self.compressed_size = 0;
            self.uncompressed_size = 0;
            self.flags &= !FLAG_DATA_DESCRIPTOR;
            (0, 0, 0)
        } else if streaming {
            self.flags |= FLAG_DATA_DESCRIPTOR;
            (0, 0, 0)
        } else {
            self.flags &= !FLAG_DATA_DESCRIPTOR;
            if sizes_too_large(self.uncompressed_size, self.compressed_size) {
                zip64.uncompressed_size = Some(self.uncompressed_size);
                zip64.compressed_size = Some(self.compressed_size);
                self.version_at_least(VERSION_ZIP64);
                (self.crc32, MASK32, MASK32)
            } else {
                (
                    self.crc32,
                    self.compressed_size as u32,
                    self.uncompressed_size as u32,
                )
            }
        };

        if self.compression_method == CompressionMethod::Deflate {
            self.version_at_least(VERSION_DEFLATE);
        }

        self.offset_of_local_header = writer.stream_position()?;
        self.stored_offset_of_compressed_data = OnceCell::new();

        let unknown_size = self
            .lh_unknown_extra_fields
            .as_deref()
            .map_or(0, ExtraField::total_size_of);
        if zip64.total_size() as usize + unknown_size > u16::MAX as usize {
            self.lh_unknown_extra_fields = None;
        }
        let mut extra_field = Vec::new();
        zip64.write_block(&mut extra_field)?;
        if let Some(fields) = &self.lh_unknown_extra_fields {
            ExtraField::write_all(fields, &mut extra_field)?;
        }

        LocalFileHeader {
            version_needed: self.version_to_extract,
            flags: self.flags,
            compression_method: self.compression_method.as_u16(),
            last_modified: datetime::to_dos(&self.last_modified),
            crc32,
            compressed_size,
            uncompressed_size,
            file_name: self.stored_name.clone(),
            extra_field,
        }
        .write(writer)?;

        trace!(
            name = %self.full_name,
            offset = self.offset_of_local_header,
            zip64 = !zip64.is_empty(),
            streaming,
            "wrote local file header"
        );
        Ok(!zip64.is_empty())
    }

    /// Patch CRC and sizes into the already written local header, then
    /// return to the end of the data.
    ///
    /// A header without a ZIP64 block cannot grow one. If the sizes turn out
    /// too large for it, the entry switches to a data descriptor instead.
    pub(crate) fn write_crc_and_sizes_in_local_header<W: Write + Seek>(
        &mut self,
        writer: &mut W,
        used_zip64: bool,
    ) -> Result<()> {
        let final_position = writer.stream_position()?;
        let pretend_streaming =
            sizes_too_large(self.uncompressed_size, self.compressed_size) && !used_zip64;

        if pretend_streaming {
            self.flags |= FLAG_DATA_DESCRIPTOR;
            self.version_at_least(VERSION_ZIP64);
            writer.seek(SeekFrom::Start(
                self.offset_of_local_header + LocalFileHeader::OFFSET_TO_FLAGS,
            ))?;
            writer.write_u16::<LittleEndian>(self.flags)?;
            writer.seek(SeekFrom::Start(
                self.offset_of_local_header + LocalFileHeader::OFFSET_TO_CRC,
            ))?;
            writer.write_u32::<LittleEndian>(0)?;
            writer.write_u32::<LittleEndian>(0)?;
            writer.write_u32::<LittleEndian>(0)?;
        } else {
            writer.seek(SeekFrom::Start(
                self.offset_of_local_header + LocalFileHeader::OFFSET_TO_CRC,
            ))?;
            writer.write_u32::<LittleEndian>(self.crc32)?;
            if used_zip64 {
                writer.write_u32::<LittleEndian>(MASK32)?;
                writer.write_u32::<LittleEndian>(MASK32)?;
                writer.seek(SeekFrom::Start(
                    self.offset_of_local_header
                        + LocalFileHeader::SIZE
                        + self.stored_name.len() as u64
                        + Zip64ExtraField::OFFSET_TO_FIRST_FIELD as u64,
                ))?;
                writer.write_u64::<LittleEndian>(self.uncompressed_size)?;
                writer.write_u64::<LittleEndian>(self.compressed_size)?;
            } else {
                writer.write_u32::<LittleEndian>(self.compressed_size as u32)?;
                writer.write_u32::<LittleEndian>(self.uncompressed_size as u32)?;
            }
        }

        writer.seek(SeekFrom::Start(final_position))?;
        if pretend_streaming {
            self.write_data_descriptor(writer)?;
        }
        Ok(())
    }

    /// Append the trailing CRC/size record after the entry data.
    pub(crate) fn write_data_descriptor<W: Write>(&self, writer: &mut W) -> Result<()> {
        DataDescriptor {
            crc32: self.crc32,
            compressed_size: self.compressed_size,
            uncompressed_size: self.uncompressed_size,
        }
        .write(
            writer,
            sizes_too_large(self.uncompressed_size, self.compressed_size),
        )?;
        Ok(())
    }

    pub(crate) fn write_central_directory_file_header<W: Write>(&mut self, writer: &mut W) -> Result<()> {
        let mut header = CentralDirectoryFileHeader {
            version_made_by_specification: self.version_made_by_specification,
            version_made_by_platform: self.version_made_by_platform,
            version_needed: self.version_to_extract,
            flags: self.flags,
            compression_method: self.compression_method.as_u16(),
            last_modified: datetime::to_dos(&self.last_modified),
            crc32: self.crc32,
            compressed_size: self.compressed_size,
            uncompressed_size: self.uncompressed_size,
            disk_number_start: self.disk_number_start,
            internal_attributes: self.internal_attributes,
            external_attributes: self.external_attributes,
            local_header_offset: self.offset_of_local_header,
            file_name: self.stored_name.clone(),
            extra_fields: self.cd_unknown_extra_fields.clone(),
            file_comment: self.comment.clone(),
        };

        if !header.zip64_extra_field().is_empty() {
            self.version_at_least(VERSION_ZIP64);
        }
        header.version_needed = self.version_to_extract;
        if header.version_made_by_specification == 0 {
            header.version_made_by_specification = self.version_to_extract as u8;
        }

        header.write(writer)?;
        Ok(())
    }

    /// Before an Update-mode rewrite: capture what the rewrite would
    /// otherwise destroy, i.e. the local header's extra fields and, for
    /// untouched entries, the raw compressed bytes.
    pub(crate) fn load_local_header_extra_fields_and_compressed_bytes<R: Read + Seek>(
        &mut self,
        stream: &mut R,
        stream_len: u64,
    ) -> Result<()> {
        if !self.originally_in_archive {
            return Ok(());
        }

        stream.seek(SeekFrom::Start(self.offset_of_local_header))?;
        let mut fields = LocalFileHeader::read_extra_fields(stream)?.ok_or_else(|| {
            ZipError::invalid_data(format!("local file header of '{}' is corrupt", self.full_name))
        })?;
        Zip64ExtraField::remove_zip64_blocks(&mut fields);
        self.lh_unknown_extra_fields = (!fields.is_empty()).then_some(fields);

        if !self.ever_opened_for_write {
            let data_start = self.offset_of_compressed_data(stream, stream_len)?;
            let length = usize::try_from(self.compressed_size).map_err(|_| {
                ZipError::invalid_data(format!(
                    "entry '{}' is too large to load into memory",
                    self.full_name
                ))
            })?;
            let mut compressed = vec![0u8; length];
            stream.seek(SeekFrom::Start(data_start))?;
            stream.read_exact(&mut compressed)?;
            self.payload = Payload::CompressedPassthrough(compressed);
        }
        Ok(())
    }

    /// Write whatever local header and data this entry still owes the
    /// stream when the archive is saved.
    pub(crate) fn write_and_finish_local_entry<S: ArchiveStream>(
        &mut self,
        cell: &RefCell<S>,
    ) -> Result<()> {
        match std::mem::replace(&mut self.payload, Payload::Unbuffered) {
            Payload::Uncompressed(buffer) => {
                let mut buffer = buffer.lock();
                buffer.open = false;
                buffer.saved = true;
                self.uncompressed_size = buffer.data.len() as u64;
                self.compressed_size = 0;

                let mut writer = ZipEntryWriter::new(self, cell, None, true);
                writer.write_all(&buffer.data)?;
                writer.close()?;
            }
            Payload::CompressedPassthrough(compressed) => {
                let mut stream = cell.borrow_mut();
                self.write_local_file_header(&mut *stream, false, false)?;
                stream.write_all(&compressed)?;
            }
            Payload::Unbuffered => {
                if self.archive_mode == ZipArchiveMode::Update || !self.ever_opened_for_write {
                    self.ever_opened_for_write = true;
                    let mut stream = cell.borrow_mut();
                    self.write_local_file_header(&mut *stream, false, true)?;
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for ZipArchiveEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipArchiveEntry")
            .field("full_name", &self.full_name)
            .field("compression_method", &self.compression_method)
            .field("uncompressed_size", &self.uncompressed_size)
            .field("compressed_size", &self.compressed_size)
            .field("crc32", &format_args!("{:08x}", self.crc32))
            .field("offset_of_local_header", &self.offset_of_local_header)
            .finish_non_exhaustive()
    }
}
