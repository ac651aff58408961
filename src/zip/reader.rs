use bzip2::read::BzDecoder;
use flate2::Crc;
use flate2::read::DeflateDecoder;
use lzma_rs::decompress::{Options as LzmaOptions, UnpackedSize};
use std::io::{self, Read, Write};
use std::sync::Arc;

use crate::io::ReadAt;
use anyhow::{Context, Result, anyhow, bail};

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// Upper bound for pre-allocating decompressed output from an untrusted size field.
const MAX_PREALLOC: u64 = 16 * 1024 * 1024;

/// Size of the LZMA properties block that follows the 4-byte ZIP LZMA header.
const LZMA_PROPS_SIZE: u16 = 5;

/// Reads entries of a ZIP archive fully into memory
pub struct ZipReader<R: ReadAt> {
    parser: ZipParser<R>,
}

impl<R: ReadAt> ZipReader<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// List all entries in central directory order
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        self.parser.list_files().await
    }

    /// Read and decompress the content of `entry`.
    ///
    /// Decompression stops one byte past the recorded uncompressed size, so a
    /// stream lying about its size is caught without unbounded allocation.
    /// The result is checked against the recorded size and CRC-32.
    ///
    /// # Arguments
    ///
    /// * `entry` - An entry returned by [`list_files()`](Self::list_files)
    ///
    /// # Errors
    ///
    /// Returns an error for encrypted entries, unsupported compression
    /// methods, corrupt streams, and size or CRC-32 mismatches.
    pub async fn read_entry(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        if entry.is_encrypted() {
            bail!("Entry {} is encrypted", entry.file_name);
        }

        let data_offset = self.parser.get_data_offset(entry).await?;
        match data_offset.checked_add(entry.compressed_size) {
            Some(end) if end <= self.parser.size() => {}
            _ => bail!("Data of {} extends past the end of the archive", entry.file_name),
        }

        let mut raw = vec![0u8; entry.compressed_size as usize];
        self.parser
            .reader()
            .read_exact_at(data_offset, &mut raw)
            .await?;

        let limit = entry.uncompressed_size.saturating_add(1);

        let out = match entry.compression_method {
            CompressionMethod::Stored => raw,
            CompressionMethod::Deflate => read_bounded(DeflateDecoder::new(raw.as_slice()), limit)
                .with_context(|| format!("Failed to inflate {}", entry.file_name))?,
            CompressionMethod::Bzip2 => read_bounded(BzDecoder::new(raw.as_slice()), limit)
                .with_context(|| {
                    format!("Failed to decompress BZIP2 data of {}", entry.file_name)
                })?,
            CompressionMethod::Lzma => decompress_lzma(entry, &raw, limit)?,
            CompressionMethod::Unknown(_) => bail!(
                "Unsupported compression method {} for {} (supported: STORED, DEFLATE, BZIP2, LZMA)",
                entry.compression_method.as_u16(),
                entry.file_name
            ),
        };

        if out.len() as u64 != entry.uncompressed_size {
            bail!(
                "Size mismatch for {}: expected {} bytes, got {}",
                entry.file_name,
                entry.uncompressed_size,
                out.len()
            );
        }

        let mut crc = Crc::new();
        crc.update(&out);
        if crc.sum() != entry.crc32 {
            bail!(
                "CRC-32 mismatch for {}: expected {:08x}, got {:08x}",
                entry.file_name,
                entry.crc32,
                crc.sum()
            );
        }

        Ok(out)
    }
}

/// Drain `decoder`, reading at most `limit` bytes.
fn read_bounded(decoder: impl Read, limit: u64) -> io::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(limit.min(MAX_PREALLOC) as usize);
    decoder.take(limit).read_to_end(&mut out)?;
    Ok(out)
}

/// Decode a ZIP LZMA stream.
///
/// The data starts with a version (2 bytes) and a properties length (2 bytes),
/// followed by the 5-byte properties and the raw stream without a size field.
/// If the entry's EOS flag is set the stream ends with a marker, otherwise it
/// runs for exactly the uncompressed size.
fn decompress_lzma(entry: &ZipFileEntry, raw: &[u8], limit: u64) -> Result<Vec<u8>> {
    if raw.len() < 4 + LZMA_PROPS_SIZE as usize {
        bail!("LZMA data of {} is truncated", entry.file_name);
    }
    let props_size = u16::from_le_bytes([raw[2], raw[3]]);
    if props_size != LZMA_PROPS_SIZE {
        bail!(
            "Unexpected LZMA properties size {} for {}",
            props_size,
            entry.file_name
        );
    }

    let unpacked_size = if entry.has_lzma_eos_marker() {
        UnpackedSize::UseProvided(None)
    } else {
        UnpackedSize::UseProvided(Some(entry.uncompressed_size))
    };
    let options = LzmaOptions {
        unpacked_size,
        ..Default::default()
    };

    let mut input = &raw[4..];
    let mut out = BoundedWriter::new(limit);
    lzma_rs::lzma_decompress_with_options(&mut input, &mut out, &options)
        .map_err(|e| anyhow!("Failed to decompress LZMA data of {}: {}", entry.file_name, e))?;
    Ok(out.buf)
}

/// In-memory sink that refuses to grow past `limit` bytes.
struct BoundedWriter {
    buf: Vec<u8>,
    limit: u64,
}

impl BoundedWriter {
    fn new(limit: u64) -> Self {
        Self {
            buf: Vec::with_capacity(limit.min(MAX_PREALLOC) as usize),
            limit,
        }
    }
}

impl Write for BoundedWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let room = self.limit.saturating_sub(self.buf.len() as u64);
        if room == 0 && !data.is_empty() {
            return Err(io::Error::other("decompressed data exceeds the recorded size"));
        }
        let n = data.len().min(room as usize);
        self.buf.extend_from_slice(&data[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
