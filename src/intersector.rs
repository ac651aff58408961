//! Reading every qualifying entry of an archive and intersecting their lines.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::filter;
use crate::intersect;
use crate::io::{LocalFileReader, ReadAt};
use crate::names::{self, DecodePolicy};
use crate::zip::{ZipFileEntry, ZipReader};

/// An open archive whose entries are name lists.
///
/// The central directory is read once when the intersector is built; the
/// underlying source stays open until the intersector is dropped.
pub struct ArchiveIntersector<R: ReadAt> {
    archive: ZipReader<R>,
    entries: Vec<ZipFileEntry>,
    path: PathBuf,
    decode: DecodePolicy,
}

impl ArchiveIntersector<LocalFileReader> {
    /// Open a ZIP file from disk.
    ///
    /// The file stays open for the lifetime of the returned intersector.
    ///
    /// # Arguments
    ///
    /// * `path` - Path of the ZIP archive
    /// * `decode` - How invalid UTF-8 in entries is handled
    ///
    /// # Returns
    ///
    /// An intersector with the central directory already read.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ArchiveOpen`] if the file is missing, unreadable or
    /// not a ZIP archive.
    pub async fn open(path: &Path, decode: DecodePolicy) -> Result<Self> {
        let reader = LocalFileReader::new(path).map_err(|e| Error::archive_open(path, e))?;
        Self::new(Arc::new(reader), path, decode).await
    }
}

impl<R: ReadAt> ArchiveIntersector<R> {
    /// Build an intersector over any random-access source.
    ///
    /// # Arguments
    ///
    /// * `reader` - A shared reader implementing [`ReadAt`]
    /// * `path` - Name of the archive, used only in error messages
    /// * `decode` - How invalid UTF-8 in entries is handled
    ///
    /// # Returns
    ///
    /// An intersector with the central directory already read.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ArchiveOpen`] if the source is not a readable ZIP archive.
    pub async fn new(
        reader: Arc<R>,
        path: impl Into<PathBuf>,
        decode: DecodePolicy,
    ) -> Result<Self> {
        let path = path.into();
        let archive = ZipReader::new(reader);
        let entries = archive
            .list_files()
            .await
            .map_err(|e| Error::archive_open(&path, e))?;
        debug!(archive = %path.display(), entries = entries.len(), "read central directory");

        Ok(Self {
            archive,
            entries,
            path,
            decode,
        })
    }

    /// Every entry in the archive, directories included.
    pub fn entries(&self) -> &[ZipFileEntry] {
        &self.entries
    }

    /// Entries that hold name lists, in archive order.
    pub fn qualifying_entries(&self) -> Vec<&ZipFileEntry> {
        self.entries
            .iter()
            .filter(|entry| {
                let keep = filter::qualifies(entry);
                if !keep {
                    debug!(entry = %entry.file_name, "skipping entry");
                }
                keep
            })
            .collect()
    }

    /// Decoded lines of each qualifying entry, in archive order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntryRead`] naming the first entry that cannot be
    /// read or decompressed.
    pub async fn name_lists(&self) -> Result<Vec<Vec<String>>> {
        let qualifying = self.qualifying_entries();
        info!(count = qualifying.len(), "qualifying entries");

        let mut lists = Vec::with_capacity(qualifying.len());
        for entry in qualifying {
            let bytes = self
                .archive
                .read_entry(entry)
                .await
                .map_err(|e| Error::entry_read(&entry.file_name, e))?;
            let list = names::parse_name_list(&bytes, self.decode);
            debug!(entry = %entry.file_name, lines = list.len(), "decoded name list");
            lists.push(list);
        }
        Ok(lists)
    }

    /// Names present in every qualifying entry.
    ///
    /// Candidates come from the first qualifying entry; a name is kept when
    /// every other entry lists it at least once.
    ///
    /// # Returns
    ///
    /// The common names as a set; empty when the lists share nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyArchive`] when no entry qualifies, or
    /// [`Error::EntryRead`] when an entry cannot be read.
    pub async fn common_names(&self) -> Result<HashSet<String>> {
        let lists = self.name_lists().await?;
        let common = intersect::common_names(&lists).ok_or_else(|| Error::EmptyArchive {
            path: self.path.clone(),
        })?;
        info!(common = common.len(), "computed common names");
        Ok(common)
    }
}
