//! I/O helpers shared by the store snapshot and the key-string area.

use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::Path;

use crate::error::DbError;

/// Maps an I/O error onto the matching `DbError` variant.
pub fn classify_io_error(error: std::io::Error, context: &str) -> DbError {
    match error.kind() {
        ErrorKind::StorageFull | ErrorKind::OutOfMemory => {
            DbError::DiskFull(format!("{}: {}", context, error))
        }
        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted => {
            DbError::TransientIoError(format!("{}: {}", context, error))
        }
        _ => DbError::IoError(format!("{}: {}", context, error)),
    }
}

/// Runs `operation`, retrying it while it fails with a transient I/O error.
pub fn retry_io_operation<F, T>(
    operation: F,
    max_retries: u32,
    retry_delay_ms: u64,
    context: &str,
) -> Result<T, DbError>
where
    F: Fn() -> Result<T, DbError>,
{
    let mut attempt = 0;
    loop {
        match operation() {
            Ok(result) => return Ok(result),
            Err(DbError::TransientIoError(message)) if attempt < max_retries => {
                attempt += 1;
                tracing::warn!(
                    "Transient I/O error in {} (attempt {}/{}): {}",
                    context,
                    attempt,
                    max_retries,
                    message
                );
                if retry_delay_ms > 0 {
                    std::thread::sleep(std::time::Duration::from_millis(retry_delay_ms));
                }
            }
            Err(err) => return Err(err),
        }
    }
}

/// Replaces `dir/file_name` with `contents` through a synced temporary file.
pub fn write_atomic(dir: &Path, file_name: &str, contents: &[u8]) -> Result<(), DbError> {
    fs::create_dir_all(dir).map_err(|e| classify_io_error(e, "Failed to create data directory"))?;

    let temp_path = dir.join(format!("{}.tmp", file_name));
    let final_path = dir.join(file_name);

    let mut file =
        File::create(&temp_path).map_err(|e| classify_io_error(e, "Failed to create temp file"))?;
    file.write_all(contents)
        .map_err(|e| classify_io_error(e, &format!("Failed to write {}", file_name)))?;
    file.sync_all()
        .map_err(|e| classify_io_error(e, &format!("Failed to sync {}", file_name)))?;

    fs::rename(&temp_path, &final_path)
        .map_err(|e| classify_io_error(e, &format!("Failed to rename {}", file_name)))?;

    Ok(())
}

/// Reads `dir/file_name` as text, or `None` if it does not exist.
pub fn read_optional(dir: &Path, file_name: &str) -> Result<Option<String>, DbError> {
    let path = dir.join(file_name);
    let mut file = match File::open(&path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(classify_io_error(e, &format!("Failed to open {}", file_name))),
    };

    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| classify_io_error(e, &format!("Failed to read {}", file_name)))?;
    Ok(Some(contents))
}
