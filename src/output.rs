//! Persisting and echoing the common names.

use std::collections::HashSet;
use std::path::Path;

use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};

/// Write one name per line to `path`, replacing its content, and echo each line to `echo`.
///
/// Lines follow the set's iteration order. A failure part way leaves the file partial.
///
/// # Arguments
///
/// * `path` - Output file; created if missing, truncated otherwise
/// * `names` - The common names to persist
/// * `echo` - Sink receiving the same lines, stdout in the binary
///
/// # Errors
///
/// Returns [`Error::Output`] if the file cannot be created or written, and
/// [`Error::Echo`] if writing to `echo` fails.
pub async fn write_names<W>(path: &Path, names: &HashSet<String>, echo: &mut W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let output_error = |source| Error::Output {
        path: path.to_path_buf(),
        source,
    };

    let mut file = fs::File::create(path).await.map_err(output_error)?;

    for name in names {
        let line = format!("{}\n", name);
        echo.write_all(line.as_bytes()).await.map_err(Error::Echo)?;
        file.write_all(line.as_bytes()).await.map_err(output_error)?;
    }

    file.flush().await.map_err(output_error)?;
    echo.flush().await.map_err(Error::Echo)?;

    Ok(())
}
