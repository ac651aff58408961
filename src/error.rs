//! Errors reported by the intersector.

use std::path::PathBuf;

type Source = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot open archive {}: {source}", path.display())]
    ArchiveOpen {
        path: PathBuf,
        #[source]
        source: Source,
    },

    #[error("Archive {} has no qualifying entries", path.display())]
    EmptyArchive { path: PathBuf },

    #[error("Failed to read entry {name}: {source}")]
    EntryRead {
        name: String,
        #[source]
        source: Source,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to echo names: {0}")]
    Echo(#[source] std::io::Error),
}

impl Error {
    pub(crate) fn archive_open(path: impl Into<PathBuf>, source: anyhow::Error) -> Self {
        Error::ArchiveOpen {
            path: path.into(),
            source: source.into(),
        }
    }

    pub(crate) fn entry_read(name: impl Into<String>, source: anyhow::Error) -> Self {
        Error::EntryRead {
            name: name.into(),
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
