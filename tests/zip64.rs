mod common;

use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

use common::{build_archive, extra_field, RawEntry};
use ziparc::{ArchiveStream, CompressionLevel, ZipArchive, ZipArchiveMode};

/// A stream whose first `skipped` bytes are implicit zeros, so archives can
/// start past the 4 GiB mark without allocating it.
struct SparseStream {
    skipped: u64,
    tail: Vec<u8>,
    position: u64,
}

impl SparseStream {
    fn starting_at(skipped: u64) -> Self {
        Self {
            skipped,
            tail: Vec::new(),
            position: skipped,
        }
    }

    fn len(&self) -> u64 {
        self.skipped + self.tail.len() as u64
    }
}

impl Read for SparseStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let count = if self.position < self.skipped {
            let count = buf.len().min((self.skipped - self.position) as usize);
            buf[..count].fill(0);
            count
        } else {
            let start = ((self.position - self.skipped) as usize).min(self.tail.len());
            let count = buf.len().min(self.tail.len() - start);
            buf[..count].copy_from_slice(&self.tail[start..start + count]);
            count
        };
        self.position += count as u64;
        Ok(count)
    }
}

impl Write for SparseStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.position < self.skipped {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "write into skipped range"));
        }
        let start = (self.position - self.skipped) as usize;
        let end = start + buf.len();
        if self.tail.len() < end {
            self.tail.resize(end, 0);
        }
        self.tail[start..end].copy_from_slice(buf);
        self.position += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for SparseStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(offset) => self.len().checked_add_signed(offset),
            SeekFrom::Current(offset) => self.position.checked_add_signed(offset),
        };
        self.position =
            target.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "bad seek"))?;
        Ok(self.position)
    }
}

impl ArchiveStream for SparseStream {
    fn set_len(&mut self, len: u64) -> io::Result<()> {
        let tail = len
            .checked_sub(self.skipped)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "cannot cut into skipped range"))?;
        self.tail.resize(tail as usize, 0);
        Ok(())
    }

    fn total_len(&mut self) -> io::Result<u64> {
        Ok(self.len())
    }
}

fn zip64_sizes(uncompressed: u64, compressed: u64) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&uncompressed.to_le_bytes());
    data.extend_from_slice(&compressed.to_le_bytes());
    data
}

#[test]
fn test_escaped_sizes_are_read_from_zip64_block() {
    let mut entry = RawEntry::stored("big", b"hi");
    entry.central_sizes = Some((u32::MAX, u32::MAX));
    entry.central_extra = extra_field(0x0001, &zip64_sizes(2, 2));
    let bytes = build_archive(&[entry], b"");

    let archive = ZipArchive::new(Cursor::new(bytes), ZipArchiveMode::Read).unwrap();
    let entry = archive.entry(0).unwrap();
    assert_eq!(entry.length().unwrap(), 2);
    assert_eq!(entry.compressed_length().unwrap(), 2);

    let mut data = Vec::new();
    archive.open_read(0).unwrap().read_to_end(&mut data).unwrap();
    assert_eq!(data, b"hi");
}

#[test]
fn test_zip64_block_of_wrong_size_is_ignored() {
    let mut entry = RawEntry::stored("big", b"hi");
    entry.central_sizes = Some((u32::MAX, u32::MAX));
    entry.central_extra = extra_field(0x0001, &2u64.to_le_bytes());
    let bytes = build_archive(&[entry], b"");

    let archive = ZipArchive::new(Cursor::new(bytes), ZipArchiveMode::Read).unwrap();
    let entry = archive.entry(0).unwrap();
    assert_eq!(entry.length().unwrap(), u32::MAX as u64);

    let error = archive.open_read(0).unwrap_err();
    assert!(error.is_invalid_data(), "{error}");
}

#[test]
fn test_zip64_block_is_not_kept_as_unknown_extra_field() {
    let mut entry = RawEntry::stored("big", b"hi");
    entry.central_sizes = Some((u32::MAX, u32::MAX));
    entry.central_extra = [
        extra_field(0x0001, &zip64_sizes(2, 2)),
        extra_field(0x7875, &[1, 4, 0, 0, 0, 0]),
    ]
    .concat();
    let bytes = build_archive(&[entry], b"");

    let archive = ZipArchive::new(Cursor::new(bytes), ZipArchiveMode::Update).unwrap();
    let fields = archive.entry(0).unwrap().central_extra_fields();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].tag, 0x7875);

    // Small again once rewritten, so no ZIP64 block and version 10 stays.
    let bytes = archive.finish().unwrap().into_inner();
    let archive = ZipArchive::new(Cursor::new(bytes), ZipArchiveMode::Read).unwrap();
    assert_eq!(archive.entry(0).unwrap().length().unwrap(), 2);
    assert_eq!(archive.entry(0).unwrap().version_needed(), 10);
}

#[test]
fn test_many_entries_use_zip64_end_of_central_directory() {
    const COUNT: usize = 0xFFFF;

    let mut archive = ZipArchive::new(Cursor::new(Vec::new()), ZipArchiveMode::Create).unwrap();
    for index in 0..COUNT {
        archive.create_entry(&format!("e{index}")).unwrap();
    }
    let bytes = archive.finish().unwrap().into_inner();

    // Classic record saturated, real count in the ZIP64 record.
    let eocd = &bytes[bytes.len() - 22..];
    assert_eq!(&eocd[..4], &0x06054b50u32.to_le_bytes());
    assert_eq!(&eocd[10..12], &0xFFFFu16.to_le_bytes());
    let locator = &bytes[bytes.len() - 42..bytes.len() - 22];
    assert_eq!(&locator[..4], &0x07064b50u32.to_le_bytes());

    let archive = ZipArchive::new(Cursor::new(bytes), ZipArchiveMode::Read).unwrap();
    assert_eq!(archive.len(), COUNT);
    assert_eq!(archive.entry(COUNT - 1).unwrap().full_name(), "e65534");
    assert_eq!(archive.index_of("e1234").unwrap(), Some(1234));
}

#[test]
fn test_round_trip_past_four_gibibytes() {
    const START: u64 = 0x1_2000_0000;
    let payload = b"zip64 offsets ".repeat(64);

    let mut archive =
        ZipArchive::new(SparseStream::starting_at(START), ZipArchiveMode::Create).unwrap();
    let first = archive.create_entry("first.txt").unwrap();
    archive.open_write(first).unwrap().write_all(&payload).unwrap();
    let second = archive
        .create_entry_with_level("second.bin", CompressionLevel::NoCompression)
        .unwrap();
    archive.open_write(second).unwrap().write_all(b"second").unwrap();
    let stream = archive.finish().unwrap();

    // Every offset in the classic record overflows, so the ZIP64 pair precedes it.
    let eocd = &stream.tail[stream.tail.len() - 22..];
    assert_eq!(&eocd[16..20], &u32::MAX.to_le_bytes());
    let locator = &stream.tail[stream.tail.len() - 42..stream.tail.len() - 22];
    assert_eq!(&locator[..4], &0x07064b50u32.to_le_bytes());

    let archive = ZipArchive::new(stream, ZipArchiveMode::Read).unwrap();
    let entries = archive.entries().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].offset_of_local_header(), START);
    assert!(entries[1].offset_of_local_header() > START);
    for entry in entries {
        assert_eq!(entry.version_needed(), 45);
    }

    let mut data = Vec::new();
    archive.open_read(0).unwrap().read_to_end(&mut data).unwrap();
    assert_eq!(data, payload);
    data.clear();
    archive.open_read(1).unwrap().read_to_end(&mut data).unwrap();
    assert_eq!(data, b"second");
}
