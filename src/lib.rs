//! # zipnames
//!
//! Finds the names shared by every name list stored in a ZIP archive.
//!
//! Each file in the archive is read as newline-delimited text, one name per
//! line. Directories, hidden files (base name starting with `.`) and the
//! `Thumbs.db` / `desktop.ini` files left behind by desktop shells are
//! skipped. The result is the set of lines present in every remaining file.
//!
//! ## Features
//!
//! - ZIP archives with STORED, DEFLATE, BZIP2 or LZMA entries, including ZIP64,
//!   commented, padded and self-extracting archives
//! - CRC-32 and size verification of every entry read
//! - Lenient decoding: invalid UTF-8 is dropped, never an error
//! - Every common line terminator is recognized (`\n`, `\r\n`, `\r` and the Unicode ones)
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use zipnames::{ArchiveIntersector, DecodePolicy};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let intersector =
//!         ArchiveIntersector::open(Path::new("rosters.zip"), DecodePolicy::Ignore).await?;
//!
//!     for name in intersector.common_names().await? {
//!         println!("{}", name);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod intersect;
pub mod intersector;
pub mod io;
pub mod logging;
pub mod names;
pub mod output;
pub mod zip;

pub use cli::Cli;
pub use config::{Config, DEFAULT_OUTPUT_FILE};
pub use error::{Error, Result};
pub use intersector::ArchiveIntersector;
pub use io::{LocalFileReader, ReadAt};
pub use names::DecodePolicy;
pub use output::write_names;
pub use zip::{ZipFileEntry, ZipReader};
