use std::path::PathBuf;

use crate::cli::Cli;
use crate::names::DecodePolicy;

/// Output file, relative to the working directory.
pub const DEFAULT_OUTPUT_FILE: &str = "output.txt";

/// Settings for one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub archive: PathBuf,
    pub output: PathBuf,
    pub decode: DecodePolicy,
}

impl Config {
    pub fn new(archive: impl Into<PathBuf>) -> Self {
        Self {
            archive: archive.into(),
            output: PathBuf::from(DEFAULT_OUTPUT_FILE),
            decode: DecodePolicy::default(),
        }
    }
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Self::new(cli.archive)
    }
}
