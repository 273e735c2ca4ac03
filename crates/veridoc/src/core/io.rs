//! File I/O helpers shared by the hashing and extraction paths.

use crate::error::Result;
use std::path::Path;
use tokio::fs;

/// Read a file asynchronously. The handle is released when the read
/// completes, on success and on error alike.
///
/// # Errors
///
/// Returns `VeridocError::Io` for I/O errors (these always bubble up).
pub async fn read_file_async(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    Ok(fs::read(path.as_ref()).await?)
}

/// Check if a path exists and points at a regular file.
pub fn file_exists(path: impl AsRef<Path>) -> bool {
    path.as_ref().is_file()
}
