//! Hand-built archives for cases the writer never produces.

#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};

/// 1980-01-01.
pub const DOS_DATE_EPOCH: u16 = 0x0021;

pub struct RawEntry {
    pub name: &'static str,
    /// Written as-is; `method` only labels it.
    pub data: Vec<u8>,
    pub method: u16,
    pub flags: u16,
    pub local_extra: Vec<u8>,
    pub central_extra: Vec<u8>,
    /// Overrides the (compressed, uncompressed) sizes in the central record.
    pub central_sizes: Option<(u32, u32)>,
}

impl RawEntry {
    pub fn stored(name: &'static str, data: &[u8]) -> Self {
        Self {
            name,
            data: data.to_vec(),
            method: 0,
            flags: 0,
            local_extra: Vec::new(),
            central_extra: Vec::new(),
            central_sizes: None,
        }
    }
}

pub fn extra_field(tag: u16, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.write_u16::<LittleEndian>(tag).unwrap();
    out.write_u16::<LittleEndian>(data.len() as u16).unwrap();
    out.extend_from_slice(data);
    out
}

pub fn build_archive(entries: &[RawEntry], comment: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut offsets = Vec::new();

    for entry in entries {
        offsets.push(out.len() as u32);
        let size = entry.data.len() as u32;
        out.write_u32::<LittleEndian>(0x04034b50).unwrap();
        out.write_u16::<LittleEndian>(10).unwrap();
        out.write_u16::<LittleEndian>(entry.flags).unwrap();
        out.write_u16::<LittleEndian>(entry.method).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(DOS_DATE_EPOCH).unwrap();
        out.write_u32::<LittleEndian>(crc32fast::hash(&entry.data)).unwrap();
        out.write_u32::<LittleEndian>(size).unwrap();
        out.write_u32::<LittleEndian>(size).unwrap();
        out.write_u16::<LittleEndian>(entry.name.len() as u16).unwrap();
        out.write_u16::<LittleEndian>(entry.local_extra.len() as u16).unwrap();
        out.extend_from_slice(entry.name.as_bytes());
        out.extend_from_slice(&entry.local_extra);
        out.extend_from_slice(&entry.data);
    }

    let cd_start = out.len() as u32;
    for (entry, offset) in entries.iter().zip(offsets) {
        let size = entry.data.len() as u32;
        let (compressed, uncompressed) = entry.central_sizes.unwrap_or((size, size));
        out.write_u32::<LittleEndian>(0x02014b50).unwrap();
        out.write_u16::<LittleEndian>(20).unwrap();
        out.write_u16::<LittleEndian>(10).unwrap();
        out.write_u16::<LittleEndian>(entry.flags).unwrap();
        out.write_u16::<LittleEndian>(entry.method).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(DOS_DATE_EPOCH).unwrap();
        out.write_u32::<LittleEndian>(crc32fast::hash(&entry.data)).unwrap();
        out.write_u32::<LittleEndian>(compressed).unwrap();
        out.write_u32::<LittleEndian>(uncompressed).unwrap();
        out.write_u16::<LittleEndian>(entry.name.len() as u16).unwrap();
        out.write_u16::<LittleEndian>(entry.central_extra.len() as u16).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap();
        out.write_u32::<LittleEndian>(offset).unwrap();
        out.extend_from_slice(entry.name.as_bytes());
        out.extend_from_slice(&entry.central_extra);
    }
    let cd_size = out.len() as u32 - cd_start;

    out.write_u32::<LittleEndian>(0x06054b50).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap();
    out.write_u16::<LittleEndian>(entries.len() as u16).unwrap();
    out.write_u16::<LittleEndian>(entries.len() as u16).unwrap();
    out.write_u32::<LittleEndian>(cd_size).unwrap();
    out.write_u32::<LittleEndian>(cd_start).unwrap();
    out.write_u16::<LittleEndian>(comment.len() as u16).unwrap();
    out.extend_from_slice(comment);
    out
}
