//! File I/O primitives with consistent error handling.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Read file contents as UTF-8 text.
///
/// A file that cannot be decoded as UTF-8 fails here with an
/// `InvalidData` I/O error, the same as any other read failure.
pub fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(Error::Io)
}

/// Write content to a file atomically (write to .tmp, then rename).
///
/// The rename is atomic on POSIX filesystems, so readers always see
/// either the old content or the new content — never a partial write.
pub fn write_file_atomic(path: &Path, content: &str) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        Error::InvalidArgument(format!("Invalid path: {}", path.display()))
    })?;

    let filename = path.file_name().ok_or_else(|| {
        Error::InvalidArgument(format!("Invalid path: {}", path.display()))
    })?;

    let tmp_path = parent.join(format!("{}.tmp", filename.to_string_lossy()));

    fs::write(&tmp_path, content)?;
    fs::rename(&tmp_path, path)?;

    Ok(())
}
