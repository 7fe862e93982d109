//! Atomic file output

use crate::error::ResultsError;
use std::path::Path;

/// Write `contents` to `path` through a temporary file and a rename
///
/// Readers never observe a partially written file. Parent directories are
/// created as needed.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), ResultsError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
