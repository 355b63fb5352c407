//! File I/O primitives with consistent error handling.
//!
//! Every failure maps to `Error::internal_io` with the operation as context,
//! which is how filesystem errors surface from the pipeline.

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

fn io_error(e: std::io::Error, operation: &str, path: &Path) -> Error {
    Error::internal_io(
        e.to_string(),
        Some(format!("{}: {}", operation, path.display())),
    )
}

/// Read file contents with standardized error handling.
pub fn read_file(path: &Path, operation: &str) -> Result<String> {
    fs::read_to_string(path).map_err(|e| io_error(e, operation, path))
}

/// Read raw file bytes with standardized error handling.
pub fn read_bytes(path: &Path, operation: &str) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| io_error(e, operation, path))
}

/// Write content to file with standardized error handling.
pub fn write_file(path: &Path, content: &str, operation: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| io_error(e, operation, path))
}

/// Write raw bytes to file with standardized error handling.
pub fn write_bytes(path: &Path, content: &[u8], operation: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| io_error(e, operation, path))
}

/// Copy a single file, overwriting the destination.
pub fn copy_file(from: &Path, to: &Path, operation: &str) -> Result<()> {
    fs::copy(from, to)
        .map(|_| ())
        .map_err(|e| io_error(e, operation, from))
}

/// Create a directory and all missing parents.
pub fn ensure_dir(dir: &Path, operation: &str) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| io_error(e, operation, dir))
}

/// Delete a directory tree if it exists.
pub fn remove_dir_if_exists(dir: &Path, operation: &str) -> Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    fs::remove_dir_all(dir).map_err(|e| io_error(e, operation, dir))
}

/// Delete a single file if it exists.
pub fn remove_file_if_exists(path: &Path, operation: &str) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    remove_file(path, operation)
}

/// Delete a single file.
pub fn remove_file(path: &Path, operation: &str) -> Result<()> {
    fs::remove_file(path).map_err(|e| io_error(e, operation, path))
}
