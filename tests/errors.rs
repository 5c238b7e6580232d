mod common;

use std::io::{Cursor, Read, Write};

use common::{build_archive, RawEntry};
use ziparc::{CompressionMethod, ReadOnly, ZipArchive, ZipArchiveMode, ZipError};

fn open_read(bytes: Vec<u8>) -> ziparc::Result<ZipArchive<Cursor<Vec<u8>>>> {
    ZipArchive::new(Cursor::new(bytes), ZipArchiveMode::Read)
}

#[test]
fn test_garbage_is_invalid_data() {
    let error = open_read(b"definitely not a zip archive, just text".to_vec()).unwrap_err();
    assert!(error.is_invalid_data(), "{error}");

    let error = open_read(b"PK".to_vec()).unwrap_err();
    assert!(error.is_invalid_data(), "{error}");
}

#[test]
fn test_entry_count_mismatch() {
    let mut bytes = build_archive(&[RawEntry::stored("a", b"a")], b"");
    let eocd = bytes.len() - 22;
    bytes[eocd + 8..eocd + 10].copy_from_slice(&2u16.to_le_bytes());
    bytes[eocd + 10..eocd + 12].copy_from_slice(&2u16.to_le_bytes());

    let error = open_read(bytes).unwrap_err();
    assert!(error.to_string().contains("number of entries"), "{error}");
}

#[test]
fn test_central_directory_offset_past_end() {
    let mut bytes = build_archive(&[RawEntry::stored("a", b"a")], b"");
    let eocd = bytes.len() - 22;
    bytes[eocd + 16..eocd + 20].copy_from_slice(&0x00FF_FFFFu32.to_le_bytes());
    assert!(open_read(bytes).unwrap_err().is_invalid_data());
}

#[test]
fn test_spanned_archive_is_unsupported() {
    let mut bytes = build_archive(&[RawEntry::stored("a", b"a")], b"");
    let eocd = bytes.len() - 22;
    bytes[eocd + 6..eocd + 8].copy_from_slice(&1u16.to_le_bytes());
    assert!(open_read(bytes).unwrap_err().is_unsupported());
}

#[test]
fn test_long_archive_comment_is_found() {
    let comment = vec![b'c'; 65535];
    let bytes = build_archive(&[RawEntry::stored("a", b"a")], &comment);
    let archive = open_read(bytes).unwrap();
    assert_eq!(archive.comment().len(), 65535);
    assert_eq!(archive.len(), 1);
}

#[test]
fn test_unknown_method_lists_but_does_not_open() {
    let mut entry = RawEntry::stored("lzma.bin", b"not really lzma");
    entry.method = 14;
    let bytes = build_archive(&[entry], b"");

    let archive = open_read(bytes.clone()).unwrap();
    let entry = archive.entry(0).unwrap();
    assert_eq!(entry.compression_method(), CompressionMethod::Unknown(14));
    assert!(archive.open_read(0).unwrap_err().is_unsupported());

    let error = ZipArchive::new(Cursor::new(bytes), ZipArchiveMode::Update).unwrap_err();
    assert!(error.is_unsupported(), "{error}");
}

#[test]
fn test_encrypted_entry_does_not_open() {
    let mut entry = RawEntry::stored("secret", b"ciphertext");
    entry.flags = 0x0001;
    let archive = open_read(build_archive(&[entry], b"")).unwrap();
    assert!(archive.entry(0).unwrap().is_encrypted());
    assert!(archive.open_read(0).unwrap_err().is_unsupported());
}

#[test]
fn test_wrong_mode_operations() {
    let mut archive = ZipArchive::new(Cursor::new(Vec::new()), ZipArchiveMode::Create).unwrap();
    let index = archive.create_entry("x").unwrap();
    assert!(matches!(archive.open_read(index), Err(ZipError::WrongMode(_))));
    assert!(matches!(archive.open_update(index), Err(ZipError::WrongMode(_))));
    assert!(matches!(archive.entry_by_name("x"), Err(ZipError::WrongMode(_))));

    let mut archive = ZipArchive::new(Cursor::new(Vec::new()), ZipArchiveMode::Update).unwrap();
    let index = archive.create_entry("x").unwrap();
    assert!(matches!(archive.open_write(index), Err(ZipError::WrongMode(_))));
}

#[test]
fn test_invalid_names() {
    let mut archive = ZipArchive::new(Cursor::new(Vec::new()), ZipArchiveMode::Create).unwrap();
    assert!(matches!(archive.create_entry(""), Err(ZipError::InvalidArgument(_))));
    assert!(archive.create_entry(&"n".repeat(65536)).unwrap_err().is_unsupported());
    assert!(matches!(
        archive.set_comment(vec![0u8; 65536]),
        Err(ZipError::InvalidArgument(_))
    ));
}

#[test]
fn test_writer_after_close_is_disposed() {
    let mut archive = ZipArchive::new(Cursor::new(Vec::new()), ZipArchiveMode::Create).unwrap();
    let index = archive.create_entry("x").unwrap();
    let mut writer = archive.open_write(index).unwrap();
    writer.write_all(b"data").unwrap();
    writer.close().unwrap();
    writer.close().unwrap();

    let error = writer.write(b"more").unwrap_err();
    assert!(matches!(ZipError::from(error), ZipError::Disposed));
}

#[test]
fn test_sizes_unavailable_after_open_write() {
    let mut archive = ZipArchive::new(Cursor::new(Vec::new()), ZipArchiveMode::Create).unwrap();
    let index = archive.create_entry("x").unwrap();
    assert_eq!(archive.entry(index).unwrap().length().unwrap(), 0);
    archive.open_write(index).unwrap().write_all(b"data").unwrap();
    assert!(matches!(
        archive.entry(index).unwrap().length(),
        Err(ZipError::SizeNotAvailable)
    ));
    assert!(matches!(
        archive.entry_mut(index).unwrap().set_external_attributes(0),
        Err(ZipError::FrozenAfterWrite)
    ));
}

#[test]
fn test_leaked_writer_holds_stream() {
    let mut archive = ZipArchive::new(Cursor::new(Vec::new()), ZipArchiveMode::Create).unwrap();
    let index = archive.create_entry("held").unwrap();
    std::mem::forget(archive.open_write(index).unwrap());
    assert!(matches!(archive.create_entry("next"), Err(ZipError::StreamAlreadyOpen)));
}

#[test]
fn test_closed_reader_is_disposed() {
    let bytes = build_archive(&[RawEntry::stored("a", b"abc")], b"");
    let archive = ZipArchive::new(ReadOnly::new(Cursor::new(bytes)), ZipArchiveMode::Read).unwrap();
    let mut reader = archive.open_read(0).unwrap();
    let mut byte = [0u8; 1];
    reader.read_exact(&mut byte).unwrap();
    reader.close();
    let error = reader.read(&mut byte).unwrap_err();
    assert!(matches!(ZipError::from(error), ZipError::Disposed));
}
