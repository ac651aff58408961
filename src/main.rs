//! Command-line entry point for zipnames.
//!
//! Reads the archive named on the command line, writes the common names to
//! `output.txt` in the working directory and prints them to stdout.

use anyhow::Result;
use clap::Parser;

use zipnames::{ArchiveIntersector, Cli, Config, write_names};

/// Application entry point.
///
/// Installs logging, parses the single archive argument and runs the
/// intersection. Any error is printed to stderr with a non-zero exit status.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    zipnames::logging::init();

    let config = Config::from(Cli::parse());
    run(&config).await
}

/// Compute the common names of `config.archive` and persist them.
///
/// The archive is closed before the output file is written.
///
/// # Arguments
///
/// * `config` - Archive path, output path and decode policy for this run
///
/// # Returns
///
/// Returns `Ok(())` once every name is written and echoed, or the first
/// error encountered.
async fn run(config: &Config) -> Result<()> {
    let names = {
        let intersector = ArchiveIntersector::open(&config.archive, config.decode).await?;
        intersector.common_names().await?
    };

    let mut stdout = tokio::io::stdout();
    write_names(&config.output, &names, &mut stdout).await?;

    Ok(())
}
