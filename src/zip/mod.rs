//! ZIP archive reading.
//!
//! - [`structures`]: fixed records of the format (EOCD, ZIP64 records, entry metadata)
//! - [`parser`]: locating and decoding the central directory
//! - [`reader`]: pulling one entry's content into memory
//!
//! Supported: STORED, DEFLATE, BZIP2 and LZMA entries, ZIP64 archives, archive
//! comments, trailing padding, and leading data such as self-extractor stubs.
//! Not supported: encryption, multi-disk archives, other compression methods.

mod parser;
mod reader;
mod structures;

pub use parser::ZipParser;
pub use reader::ZipReader;
pub use structures::*;
