//! Central directory parsing.
//!
//! A ZIP archive is read from its tail: the End of Central Directory (EOCD)
//! record points at the central directory, which lists every entry together
//! with the offset of its Local File Header. Archives that overflow the
//! 16/32-bit EOCD fields carry a ZIP64 EOCD located through a locator record
//! placed right before the regular EOCD.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};
use std::sync::Arc;

use crate::io::ReadAt;
use anyhow::{Context, Result, bail};
use tracing::debug;

use super::structures::*;

/// Largest archive comment the format can describe.
const MAX_COMMENT_SIZE: u64 = 65535;

/// Extra field header id of the ZIP64 extended information block.
const ZIP64_EXTRA_ID: u16 = 0x0001;

/// Reads ZIP structures from any [`ReadAt`] source.
///
/// Usually driven through [`ZipReader`](super::ZipReader).
pub struct ZipParser<R: ReadAt> {
    reader: Arc<R>,
    size: u64,
}

impl<R: ReadAt> ZipParser<R> {
    pub fn new(reader: Arc<R>) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// Locate the EOCD record and return it with its offset.
    ///
    /// Archives without a comment end with the bare 22-byte record, which is
    /// checked first. Otherwise the tail is scanned backwards and the last
    /// signature followed by a full record is taken, so a comment or padding
    /// after the record does not matter.
    ///
    /// # Returns
    ///
    /// A tuple of (EOCD record, offset of the EOCD in the source).
    ///
    /// # Errors
    ///
    /// Returns an error if no EOCD signature is found.
    pub async fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64)> {
        let record = EndOfCentralDirectory::SIZE as u64;

        if self.size >= record {
            let offset = self.size - record;
            let mut buf = vec![0u8; EndOfCentralDirectory::SIZE];
            self.reader.read_exact_at(offset, &mut buf).await?;

            if &buf[0..4] == EndOfCentralDirectory::SIGNATURE && buf[20..22] == [0, 0] {
                let eocd = EndOfCentralDirectory::from_bytes(&buf)?;
                return Ok((eocd, offset));
            }
        }

        let search_size = (MAX_COMMENT_SIZE + record).min(self.size);
        let search_start = self.size - search_size;

        let mut buf = vec![0u8; search_size as usize];
        self.reader.read_exact_at(search_start, &mut buf).await?;

        if buf.len() >= EndOfCentralDirectory::SIZE {
            // The last complete record wins; bytes after its comment are ignored
            for i in (0..=buf.len() - EndOfCentralDirectory::SIZE).rev() {
                if &buf[i..i + 4] == EndOfCentralDirectory::SIGNATURE {
                    let eocd = EndOfCentralDirectory::from_bytes(
                        &buf[i..i + EndOfCentralDirectory::SIZE],
                    )?;
                    return Ok((eocd, search_start + i as u64));
                }
            }
        }

        bail!("Not a valid ZIP file")
    }

    /// Read the ZIP64 EOCD that sits right before its locator.
    ///
    /// The record is located relative to the regular EOCD rather than through
    /// the offset stored in the locator, which is wrong when data has been
    /// prepended to the archive.
    ///
    /// # Arguments
    ///
    /// * `eocd_offset` - Offset of the regular EOCD in the source
    ///
    /// # Returns
    ///
    /// The parsed record and its actual offset in the source.
    ///
    /// # Errors
    ///
    /// Returns an error if the locator or the record is missing or invalid.
    pub async fn read_zip64_eocd(&self, eocd_offset: u64) -> Result<(Zip64EOCD, u64)> {
        let locator_offset = eocd_offset
            .checked_sub(Zip64EOCDLocator::SIZE as u64)
            .context("ZIP64 End of Central Directory Locator is missing")?;
        let mut locator_buf = vec![0u8; Zip64EOCDLocator::SIZE];
        self.reader
            .read_exact_at(locator_offset, &mut locator_buf)
            .await?;
        let locator = Zip64EOCDLocator::from_bytes(&locator_buf)?;

        let eocd64_offset = locator_offset
            .checked_sub(Zip64EOCD::MIN_SIZE as u64)
            .context("ZIP64 End of Central Directory is missing")?;
        if locator.eocd64_offset != eocd64_offset {
            debug!(
                recorded = locator.eocd64_offset,
                actual = eocd64_offset,
                "ZIP64 record moved by leading data"
            );
        }
        let mut eocd64_buf = vec![0u8; Zip64EOCD::MIN_SIZE];
        self.reader
            .read_exact_at(eocd64_offset, &mut eocd64_buf)
            .await?;

        Ok((Zip64EOCD::from_bytes(&eocd64_buf)?, eocd64_offset))
    }

    /// Read every central directory record, in directory order.
    ///
    /// The central directory ends where the (ZIP64) EOCD begins. Any gap
    /// between that position and the recorded `cd_offset + cd_size` is data
    /// prepended to the archive (a self-extractor stub, for instance), and
    /// every recorded offset is shifted by it.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive is not a ZIP file or its central
    /// directory is inconsistent.
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        let (eocd, eocd_offset) = self.find_eocd().await?;

        let (cd_offset, cd_size, total_entries, cd_end) = if eocd.is_zip64() {
            let (eocd64, eocd64_offset) = self.read_zip64_eocd(eocd_offset).await?;
            (
                eocd64.cd_offset,
                eocd64.cd_size,
                eocd64.total_entries,
                eocd64_offset,
            )
        } else {
            (
                eocd.cd_offset as u64,
                eocd.cd_size as u64,
                eocd.total_entries as u64,
                eocd_offset,
            )
        };

        let prefix = cd_end
            .checked_sub(cd_size)
            .and_then(|start| start.checked_sub(cd_offset))
            .with_context(|| {
                format!(
                    "Central directory ({} bytes at offset {}) overlaps its end record",
                    cd_size, cd_offset
                )
            })?;
        if prefix > 0 {
            debug!(prefix, "archive is preceded by leading data");
        }
        if total_entries.saturating_mul(CDFH_MIN_SIZE as u64) > cd_size {
            bail!(
                "Central directory of {} bytes cannot hold {} entries",
                cd_size,
                total_entries
            );
        }

        let mut cd_data = vec![0u8; cd_size as usize];
        self.reader
            .read_exact_at(cd_offset + prefix, &mut cd_data)
            .await?;

        let mut entries = Vec::with_capacity(total_entries as usize);
        let mut cursor = Cursor::new(cd_data.as_slice());
        for index in 0..total_entries {
            let mut entry = parse_cdfh(&mut cursor)
                .with_context(|| format!("Corrupt central directory record #{}", index))?;
            entry.lfh_offset = entry.lfh_offset.saturating_add(prefix);
            entries.push(entry);
        }

        Ok(entries)
    }

    /// Offset of the first data byte of `entry`.
    ///
    /// The local header repeats the name and may carry a different extra
    /// field than the central record, so its own lengths are authoritative.
    pub async fn get_data_offset(&self, entry: &ZipFileEntry) -> Result<u64> {
        if entry.lfh_offset.saturating_add(LFH_SIZE as u64) > self.size {
            bail!("Local File Header of {} lies outside the archive", entry.file_name);
        }
        let mut lfh_buf = vec![0u8; LFH_SIZE];
        self.reader
            .read_exact_at(entry.lfh_offset, &mut lfh_buf)
            .await?;

        if &lfh_buf[0..4] != LFH_SIGNATURE {
            bail!("Invalid Local File Header for {}", entry.file_name);
        }

        let mut cursor = Cursor::new(&lfh_buf[26..]);
        let file_name_length = cursor.read_u16::<LittleEndian>()? as u64;
        let extra_field_length = cursor.read_u16::<LittleEndian>()? as u64;

        Ok(entry.lfh_offset + LFH_SIZE as u64 + file_name_length + extra_field_length)
    }

    pub fn reader(&self) -> &Arc<R> {
        &self.reader
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Parse one Central Directory File Header at the cursor position.
fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> Result<ZipFileEntry> {
    let mut sig = [0u8; 4];
    cursor.read_exact(&mut sig)?;
    if sig != CDFH_SIGNATURE {
        bail!("Invalid Central Directory File Header");
    }

    let _version_made_by = cursor.read_u16::<LittleEndian>()?;
    let _version_needed = cursor.read_u16::<LittleEndian>()?;
    let flags = cursor.read_u16::<LittleEndian>()?;
    let compression_method = cursor.read_u16::<LittleEndian>()?;
    let _last_mod_time = cursor.read_u16::<LittleEndian>()?;
    let _last_mod_date = cursor.read_u16::<LittleEndian>()?;
    let crc32 = cursor.read_u32::<LittleEndian>()?;
    let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let file_name_length = cursor.read_u16::<LittleEndian>()?;
    let extra_field_length = cursor.read_u16::<LittleEndian>()?;
    let file_comment_length = cursor.read_u16::<LittleEndian>()?;
    let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
    let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
    let _external_attrs = cursor.read_u32::<LittleEndian>()?;
    let mut lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

    let mut file_name_bytes = vec![0u8; file_name_length as usize];
    cursor.read_exact(&mut file_name_bytes)?;
    let file_name = String::from_utf8_lossy(&file_name_bytes).into_owned();
    let is_directory = file_name.ends_with('/');

    let mut extra_bytes = vec![0u8; extra_field_length as usize];
    cursor.read_exact(&mut extra_bytes)?;
    let mut extra = Cursor::new(extra_bytes.as_slice());

    while extra.position() + 4 <= extra.get_ref().len() as u64 {
        let header_id = extra.read_u16::<LittleEndian>()?;
        let field_size = extra.read_u16::<LittleEndian>()? as u64;
        let field_end = extra.position() + field_size;

        if header_id == ZIP64_EXTRA_ID {
            // Only the saturated header fields are present, in this order
            if uncompressed_size == 0xFFFFFFFF && extra.position() + 8 <= field_end {
                uncompressed_size = extra.read_u64::<LittleEndian>()?;
            }
            if compressed_size == 0xFFFFFFFF && extra.position() + 8 <= field_end {
                compressed_size = extra.read_u64::<LittleEndian>()?;
            }
            if lfh_offset == 0xFFFFFFFF && extra.position() + 8 <= field_end {
                lfh_offset = extra.read_u64::<LittleEndian>()?;
            }
        }
        extra.set_position(field_end);
    }

    let mut comment = vec![0u8; file_comment_length as usize];
    cursor.read_exact(&mut comment)?;

    Ok(ZipFileEntry {
        file_name,
        compression_method: CompressionMethod::from_u16(compression_method),
        flags,
        compressed_size,
        uncompressed_size,
        crc32,
        lfh_offset,
        is_directory,
    })
}
