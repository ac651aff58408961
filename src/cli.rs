use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "zipnames")]
#[command(version)]
#[command(about = "Find the names listed in every file of a ZIP archive", long_about = None)]
#[command(after_help = "Each non-hidden file in the archive is read as one name per line.\n\
The names present in all of them are written to output.txt and printed.\n\n\
Example:\n  zipnames rosters.zip")]
pub struct Cli {
    /// ZIP archive holding the name lists
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,
}
