//! Utility functions for Dopamine.
//!
//! Bounded reads and atomic writes shared by the wallet store and the
//! journal migration.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use crate::error::{DopamineError, Result};

/// Maximum file size that can be read into memory (10 MB).
///
/// A month of journal lines or the wallet file should be far below this.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10 MB

/// Read a file into a string with size limit protection.
///
/// # Errors
///
/// Returns an error if:
/// * The file cannot be read (doesn't exist, permission denied, etc.)
/// * The file exceeds `MAX_FILE_SIZE`
pub fn read_to_string_limited(path: &Path) -> Result<String> {
    read_to_string_with_limit(path, MAX_FILE_SIZE)
}

/// Read a file into a string with a custom size limit.
///
/// # Errors
///
/// Returns an error if the file exceeds `max_size`, cannot be read, or is
/// not valid UTF-8.
pub fn read_to_string_with_limit(path: &Path, max_size: u64) -> Result<String> {
    let bytes = read_bytes_with_limit(path, max_size)?;
    String::from_utf8(bytes).map_err(|e| {
        DopamineError::storage(path, io::Error::new(io::ErrorKind::InvalidData, e))
    })
}

/// Read a file's raw bytes with size limit protection.
///
/// Line-oriented readers use this so one undecodable line does not hide the
/// rest of the file.
pub fn read_bytes_limited(path: &Path) -> Result<Vec<u8>> {
    read_bytes_with_limit(path, MAX_FILE_SIZE)
}

/// Read a file's raw bytes with a custom size limit.
pub fn read_bytes_with_limit(path: &Path, max_size: u64) -> Result<Vec<u8>> {
    let metadata = fs::metadata(path).map_err(|e| DopamineError::storage(path, e))?;

    let size = metadata.len();
    if size > max_size {
        return Err(DopamineError::ledger(format!(
            "file {} is too large ({} bytes, max {} bytes)",
            path.display(),
            size,
            max_size
        )));
    }

    fs::read(path).map_err(|e| DopamineError::storage(path, e))
}

/// Sibling temp path unique to this process, e.g. `wallet.json.4242.tmp`.
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".{}.tmp", process::id()));
    path.with_file_name(name)
}

/// Replace `path` with `contents` via a sibling temp file and rename.
///
/// Readers see either the old file or the new one, never a partial write.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| DopamineError::storage(parent, e))?;
    }

    let temp_path = temp_path_for(path);
    {
        let mut file = File::create(&temp_path).map_err(|e| DopamineError::storage(&temp_path, e))?;
        file.write_all(contents)
            .map_err(|e| DopamineError::storage(&temp_path, e))?;
        file.sync_all()
            .map_err(|e| DopamineError::storage(&temp_path, e))?;
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        DopamineError::storage(path, e)
    })
}
