//! Which archive entries count as name lists.

use crate::zip::ZipFileEntry;

/// Files dropped by desktop shells that never hold names.
pub const ARTIFACT_NAMES: [&str; 2] = ["thumbs.db", "desktop.ini"];

/// Final path segment of an in-archive name.
pub fn base_name(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// Hidden files (leading `.`, case-sensitive) and OS artifacts (case-insensitive).
pub fn is_artifact(base: &str) -> bool {
    base.starts_with('.')
        || ARTIFACT_NAMES
            .iter()
            .any(|artifact| base.eq_ignore_ascii_case(artifact))
}

/// A non-directory entry whose base name is not an artifact.
pub fn qualifies(entry: &ZipFileEntry) -> bool {
    !entry.is_directory && !is_artifact(base_name(&entry.file_name))
}
