//! Shared fixtures: a minimal ZIP writer and an in-memory archive source.

#![allow(dead_code)]

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use byteorder::{LittleEndian, WriteBytesExt};
use flate2::write::DeflateEncoder;
use flate2::{Compression, Crc};
use lzma_rs::compress::{Options as LzmaOptions, UnpackedSize};

use zipnames::ReadAt;

const METHOD_STORED: u16 = 0;
const METHOD_DEFLATE: u16 = 8;
const METHOD_BZIP2: u16 = 12;
const METHOD_LZMA: u16 = 14;
const FLAG_LZMA_EOS: u16 = 0x0002;
const FLAG_UTF8: u16 = 0x0800;
const DOS_DATE_1980_01_01: u16 = 0x0021;

/// Builds ZIP archives entry by entry.
#[derive(Default)]
pub struct ZipBuilder {
    body: Vec<u8>,
    central: Vec<u8>,
    count: u16,
    comment: Vec<u8>,
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored(mut self, name: &str, content: &[u8]) -> Self {
        self.push(name, METHOD_STORED, 0, content, content.to_vec());
        self
    }

    pub fn deflated(mut self, name: &str, content: &[u8]) -> Self {
        let compressed = deflate(content);
        self.push(name, METHOD_DEFLATE, 0, content, compressed);
        self
    }

    /// Deflated entry whose headers claim `claimed_size` uncompressed bytes.
    pub fn deflated_with_size(mut self, name: &str, content: &[u8], claimed_size: u32) -> Self {
        let mut crc = Crc::new();
        crc.update(content);
        let compressed = deflate(content);
        self.push_raw(name, METHOD_DEFLATE, 0, crc.sum(), claimed_size, compressed);
        self
    }

    pub fn bzip2ed(mut self, name: &str, content: &[u8]) -> Self {
        let mut encoder = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
        encoder.write_all(content).unwrap();
        let compressed = encoder.finish().unwrap();
        self.push(name, METHOD_BZIP2, 0, content, compressed);
        self
    }

    /// LZMA entry laid out like ZIP writers do: version, properties length,
    /// properties, then a stream terminated by an end marker.
    pub fn lzma(mut self, name: &str, content: &[u8]) -> Self {
        let options = LzmaOptions {
            unpacked_size: UnpackedSize::SkipWritingToHeader,
        };
        let mut stream = Vec::new();
        lzma_rs::lzma_compress_with_options(&mut &content[..], &mut stream, &options).unwrap();

        let mut data = vec![9, 20];
        data.write_u16::<LittleEndian>(5).unwrap();
        data.extend_from_slice(&stream);
        self.push(name, METHOD_LZMA, FLAG_LZMA_EOS, content, data);
        self
    }

    pub fn directory(mut self, name: &str) -> Self {
        assert!(name.ends_with('/'));
        self.push(name, METHOD_STORED, 0, b"", Vec::new());
        self
    }

    /// Entry whose stored data is `data` but whose header records `crc`.
    pub fn with_crc(mut self, name: &str, data: &[u8], crc: u32) -> Self {
        self.push_raw(name, METHOD_STORED, 0, crc, data.len() as u32, data.to_vec());
        self
    }

    pub fn with_method(mut self, name: &str, method: u16, data: &[u8]) -> Self {
        self.push(name, method, 0, data, data.to_vec());
        self
    }

    pub fn encrypted(mut self, name: &str, data: &[u8]) -> Self {
        self.push(name, METHOD_STORED, 0x0001, data, data.to_vec());
        self
    }

    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = comment.as_bytes().to_vec();
        self
    }

    fn push(&mut self, name: &str, method: u16, flags: u16, content: &[u8], data: Vec<u8>) {
        let mut crc = Crc::new();
        crc.update(content);
        self.push_raw(name, method, flags, crc.sum(), content.len() as u32, data);
    }

    fn push_raw(
        &mut self,
        name: &str,
        method: u16,
        flags: u16,
        crc: u32,
        uncompressed_size: u32,
        data: Vec<u8>,
    ) {
        let flags = flags | FLAG_UTF8;
        let offset = self.body.len() as u32;
        let name = name.as_bytes();

        let lfh = &mut self.body;
        lfh.extend_from_slice(b"PK\x03\x04");
        lfh.write_u16::<LittleEndian>(20).unwrap();
        lfh.write_u16::<LittleEndian>(flags).unwrap();
        lfh.write_u16::<LittleEndian>(method).unwrap();
        lfh.write_u16::<LittleEndian>(0).unwrap();
        lfh.write_u16::<LittleEndian>(DOS_DATE_1980_01_01).unwrap();
        lfh.write_u32::<LittleEndian>(crc).unwrap();
        lfh.write_u32::<LittleEndian>(data.len() as u32).unwrap();
        lfh.write_u32::<LittleEndian>(uncompressed_size).unwrap();
        lfh.write_u16::<LittleEndian>(name.len() as u16).unwrap();
        lfh.write_u16::<LittleEndian>(0).unwrap();
        lfh.extend_from_slice(name);
        lfh.extend_from_slice(&data);

        let cd = &mut self.central;
        cd.extend_from_slice(b"PK\x01\x02");
        cd.write_u16::<LittleEndian>(20).unwrap();
        cd.write_u16::<LittleEndian>(20).unwrap();
        cd.write_u16::<LittleEndian>(flags).unwrap();
        cd.write_u16::<LittleEndian>(method).unwrap();
        cd.write_u16::<LittleEndian>(0).unwrap();
        cd.write_u16::<LittleEndian>(DOS_DATE_1980_01_01).unwrap();
        cd.write_u32::<LittleEndian>(crc).unwrap();
        cd.write_u32::<LittleEndian>(data.len() as u32).unwrap();
        cd.write_u32::<LittleEndian>(uncompressed_size).unwrap();
        cd.write_u16::<LittleEndian>(name.len() as u16).unwrap();
        cd.write_u16::<LittleEndian>(0).unwrap();
        cd.write_u16::<LittleEndian>(0).unwrap();
        cd.write_u16::<LittleEndian>(0).unwrap();
        cd.write_u16::<LittleEndian>(0).unwrap();
        cd.write_u32::<LittleEndian>(0).unwrap();
        cd.write_u32::<LittleEndian>(offset).unwrap();
        cd.extend_from_slice(name);

        self.count += 1;
    }

    pub fn finish(self) -> Vec<u8> {
        let mut out = self.body;
        let cd_offset = out.len() as u32;
        let cd_size = self.central.len() as u32;
        out.extend_from_slice(&self.central);

        out.extend_from_slice(b"PK\x05\x06");
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(self.count).unwrap();
        out.write_u16::<LittleEndian>(self.count).unwrap();
        out.write_u32::<LittleEndian>(cd_size).unwrap();
        out.write_u32::<LittleEndian>(cd_offset).unwrap();
        out.write_u16::<LittleEndian>(self.comment.len() as u16).unwrap();
        out.extend_from_slice(&self.comment);
        out
    }

    pub fn write_to(self, path: &Path) {
        std::fs::write(path, self.finish()).unwrap();
    }
}

fn deflate(content: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(content).unwrap();
    encoder.finish().unwrap()
}

/// Archive held in memory, optionally returning short reads.
pub struct SliceReader {
    data: Vec<u8>,
    max_chunk: usize,
}

impl SliceReader {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            max_chunk: usize::MAX,
        }
    }

    /// Never return more than `max_chunk` bytes from one `read_at`.
    pub fn chunked(data: Vec<u8>, max_chunk: usize) -> Self {
        Self { data, max_chunk }
    }
}

#[async_trait]
impl ReadAt for SliceReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let start = (offset as usize).min(self.data.len());
        let n = buf.len().min(self.data.len() - start).min(self.max_chunk);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        Ok(n)
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}
