use std::io::{Cursor, Read, Write};

use ziparc::{
    ArchiveOptions, CompressionLevel, CompressionMethod, Streaming, ZipArchive, ZipArchiveMode,
};

fn create_archive(files: &[(&str, &[u8])], level: CompressionLevel) -> Vec<u8> {
    let mut archive = ZipArchive::new(Cursor::new(Vec::new()), ZipArchiveMode::Create).unwrap();
    for (name, data) in files {
        let index = archive.create_entry_with_level(name, level).unwrap();
        let mut writer = archive.open_write(index).unwrap();
        writer.write_all(data).unwrap();
        writer.close().unwrap();
    }
    archive.finish().unwrap().into_inner()
}

fn read_entry(archive: &ZipArchive<Cursor<Vec<u8>>>, index: usize) -> Vec<u8> {
    let mut data = Vec::new();
    archive.open_read(index).unwrap().read_to_end(&mut data).unwrap();
    data
}

#[test]
fn test_single_entry_round_trip() {
    let bytes = create_archive(&[("a/b.txt", b"hello".as_slice())], CompressionLevel::Optimal);
    let archive = ZipArchive::new(Cursor::new(bytes), ZipArchiveMode::Read).unwrap();

    let entries = archive.entries().unwrap();
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.full_name(), "a/b.txt");
    assert_eq!(entry.name(), "b.txt");
    assert_eq!(entry.length().unwrap(), 5);
    // A fixed-Huffman block for five literals rounds up to seven bytes.
    assert_eq!(entry.compression_method(), CompressionMethod::Deflate);
    assert_eq!(entry.compressed_length().unwrap(), 7);
    assert_eq!(entry.crc32(), crc32fast::hash(b"hello"));
    assert!(!entry.has_data_descriptor());
    assert_eq!(read_entry(&archive, 0), b"hello");
}

#[test]
fn test_empty_and_tiny_entries() {
    let bytes = create_archive(
        &[("empty", b"".as_slice()), ("one", b"x".as_slice()), ("stored", b"plain text".as_slice())],
        CompressionLevel::NoCompression,
    );
    let archive = ZipArchive::new(Cursor::new(bytes), ZipArchiveMode::Read).unwrap();
    let entries = archive.entries().unwrap();

    assert_eq!(entries[0].length().unwrap(), 0);
    assert_eq!(entries[0].compression_method(), CompressionMethod::Stored);
    assert_eq!(entries[0].crc32(), 0);
    assert_eq!(read_entry(&archive, 0), b"");

    assert_eq!(read_entry(&archive, 1), b"x");
    assert_eq!(entries[2].compression_method(), CompressionMethod::Stored);
    assert_eq!(entries[2].compressed_length().unwrap(), 10);
    assert_eq!(read_entry(&archive, 2), b"plain text");
}

#[test]
fn test_deflate_shrinks_repetitive_content() {
    let text = b"the quick brown fox jumps over the lazy dog\n".repeat(200);
    let bytes = create_archive(&[("fox.txt", text.as_slice())], CompressionLevel::Fastest);
    let archive = ZipArchive::new(Cursor::new(bytes), ZipArchiveMode::Read).unwrap();
    let entry = archive.entry(0).unwrap();

    assert_eq!(entry.compression_method(), CompressionMethod::Deflate);
    assert_eq!(entry.version_needed(), 20);
    assert!(entry.compressed_length().unwrap() < entry.length().unwrap());
    assert_eq!(read_entry(&archive, 0), text);
}

#[test]
fn test_interleaved_readers() {
    let first = vec![1u8; 3000];
    let second = vec![2u8; 3000];
    let bytes = create_archive(
        &[("first", first.as_slice()), ("second", second.as_slice())],
        CompressionLevel::NoCompression,
    );
    let archive = ZipArchive::new(Cursor::new(bytes), ZipArchiveMode::Read).unwrap();

    let mut a = archive.open_read(0).unwrap();
    let mut b = archive.open_read(1).unwrap();
    let mut chunk_a = [0u8; 1000];
    let mut chunk_b = [0u8; 1000];
    for _ in 0..3 {
        a.read_exact(&mut chunk_a).unwrap();
        b.read_exact(&mut chunk_b).unwrap();
        assert!(chunk_a.iter().all(|&byte| byte == 1));
        assert!(chunk_b.iter().all(|&byte| byte == 2));
    }
    assert_eq!(a.read(&mut chunk_a).unwrap(), 0);
}

#[test]
fn test_streaming_sink_uses_data_descriptors() {
    let sink = Streaming::new(Vec::new());
    let mut archive = ZipArchive::new(sink, ZipArchiveMode::Create).unwrap();
    let index = archive.create_entry("streamed.txt").unwrap();
    archive.open_write(index).unwrap().write_all(b"streamed content").unwrap();
    let index = archive.create_entry("nothing").unwrap();
    archive.open_write(index).unwrap().close().unwrap();
    let bytes = archive.finish().unwrap().into_inner();

    let archive = ZipArchive::new(Cursor::new(bytes), ZipArchiveMode::Read).unwrap();
    let entries = archive.entries().unwrap();
    assert!(entries[0].has_data_descriptor());
    assert_eq!(entries[0].crc32(), crc32fast::hash(b"streamed content"));
    assert_eq!(read_entry(&archive, 0), b"streamed content");

    assert!(!entries[1].has_data_descriptor());
    assert_eq!(entries[1].length().unwrap(), 0);
}

#[test]
fn test_streamed_local_header_has_zeroed_sizes_and_descriptor() {
    let sink = Streaming::new(Vec::new());
    let mut archive = ZipArchive::new(sink, ZipArchiveMode::Create).unwrap();
    let index = archive
        .create_entry_with_level("s", CompressionLevel::NoCompression)
        .unwrap();
    archive.open_write(index).unwrap().write_all(b"abc").unwrap();
    let bytes = archive.finish().unwrap().into_inner();

    // Local header: flags at 6, CRC and sizes at 14..26.
    assert_eq!(u16::from_le_bytes([bytes[6], bytes[7]]) & 0x0008, 0x0008);
    assert!(bytes[14..26].iter().all(|&byte| byte == 0));
    // Name "s" then data "abc", then the descriptor.
    let descriptor = &bytes[34..50];
    assert_eq!(&descriptor[..4], &0x08074b50u32.to_le_bytes());
    assert_eq!(&descriptor[4..8], &crc32fast::hash(b"abc").to_le_bytes());
    assert_eq!(&descriptor[8..12], &3u32.to_le_bytes());
    assert_eq!(&descriptor[12..16], &3u32.to_le_bytes());
}

#[test]
fn test_comments_and_utf8_names_round_trip() {
    let mut archive = ZipArchive::new(Cursor::new(Vec::new()), ZipArchiveMode::Create).unwrap();
    archive.set_comment("archive comment").unwrap();
    let index = archive.create_entry("résumé.txt").unwrap();
    archive.entry_mut(index).unwrap().set_comment("entry comment").unwrap();
    archive.open_write(index).unwrap().write_all(b"cv").unwrap();
    let bytes = archive.finish().unwrap().into_inner();

    let archive = ZipArchive::new(Cursor::new(bytes), ZipArchiveMode::Read).unwrap();
    assert_eq!(archive.comment(), b"archive comment");
    let entry = archive.entry_by_name("résumé.txt").unwrap().unwrap();
    assert_eq!(entry.flags() & 0x0800, 0x0800);
    assert_eq!(entry.comment(), b"entry comment");
}

#[test]
fn test_legacy_encoding_option() {
    let options = ArchiveOptions {
        entry_name_encoding: Some(encoding_rs::WINDOWS_1252),
        ..Default::default()
    };
    let mut archive =
        ZipArchive::with_options(Cursor::new(Vec::new()), ZipArchiveMode::Create, options).unwrap();
    let index = archive.create_entry("caf\u{e9}.txt").unwrap();
    archive.open_write(index).unwrap().write_all(b"x").unwrap();
    let bytes = archive.finish().unwrap().into_inner();

    let archive =
        ZipArchive::with_options(Cursor::new(bytes), ZipArchiveMode::Read, options).unwrap();
    let entry = archive.entry(0).unwrap();
    assert_eq!(entry.raw_name(), b"caf\xe9.txt");
    assert_eq!(entry.flags() & 0x0800, 0);
    assert_eq!(entry.full_name(), "caf\u{e9}.txt");
}

#[test]
fn test_duplicate_names_resolve_to_first() {
    let bytes = create_archive(
        &[("dup", b"first".as_slice()), ("dup", b"second".as_slice())],
        CompressionLevel::Optimal,
    );
    let archive = ZipArchive::new(Cursor::new(bytes), ZipArchiveMode::Read).unwrap();
    assert_eq!(archive.len(), 2);
    assert_eq!(archive.index_of("dup").unwrap(), Some(0));
    assert_eq!(archive.index_of("missing").unwrap(), None);
}

#[test]
fn test_last_write_time_round_trips_at_two_second_precision() {
    let time = chrono::NaiveDate::from_ymd_opt(2021, 6, 15)
        .unwrap()
        .and_hms_opt(13, 45, 31)
        .unwrap();
    let mut archive = ZipArchive::new(Cursor::new(Vec::new()), ZipArchiveMode::Create).unwrap();
    let index = archive.create_entry("timed").unwrap();
    archive.entry_mut(index).unwrap().set_last_write_time(time).unwrap();
    let bytes = archive.finish().unwrap().into_inner();

    let archive = ZipArchive::new(Cursor::new(bytes), ZipArchiveMode::Read).unwrap();
    let expected = chrono::NaiveDate::from_ymd_opt(2021, 6, 15)
        .unwrap()
        .and_hms_opt(13, 45, 30)
        .unwrap();
    assert_eq!(archive.entry(0).unwrap().last_write_time(), expected);
}

#[test]
fn test_open_dispatches_on_mode() {
    let bytes = create_archive(&[("f", b"data".as_slice())], CompressionLevel::Optimal);
    let mut archive = ZipArchive::new(Cursor::new(bytes), ZipArchiveMode::Read).unwrap();
    let mut stream = archive.open(0).unwrap();
    assert!(stream.can_read());
    assert!(!stream.can_write());
    assert!(!stream.can_seek());
    assert_eq!(stream.write(b"x").unwrap_err().kind(), std::io::ErrorKind::Unsupported);
    let mut text = String::new();
    stream.read_to_string(&mut text).unwrap();
    assert_eq!(text, "data");
}
