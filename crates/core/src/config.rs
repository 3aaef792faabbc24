//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services,
//! so request handling never reads process-wide environment variables.

use crate::constants::{DEFAULT_MAX_FILE_SIZE, DEFAULT_UPLOAD_DIR};
use crate::{CoreError, CoreResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    upload_dir: PathBuf,
    max_file_size: u64,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` if `upload_dir` is empty or `max_file_size` is zero.
    pub fn new(upload_dir: PathBuf, max_file_size: u64) -> CoreResult<Self> {
        if upload_dir.as_os_str().is_empty() {
            return Err(CoreError::InvalidInput(
                "upload directory cannot be empty".into(),
            ));
        }
        if max_file_size == 0 {
            return Err(CoreError::InvalidInput(
                "maximum file size must be greater than zero".into(),
            ));
        }

        Ok(Self {
            upload_dir,
            max_file_size,
        })
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }
}

/// Resolve the upload directory from an optional `UPLOAD_PATH` value.
///
/// Relative values (including the default) are anchored at `base`, normally the working
/// directory, so the resolved path does not depend on later `chdir` calls.
pub fn upload_dir_from_env_value(value: Option<String>, base: &Path) -> PathBuf {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_UPLOAD_DIR.to_string());

    let path = PathBuf::from(value);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Parse the maximum upload size from an optional `MAX_FILE_SIZE` value.
///
/// If `value` is `None` or empty/whitespace, returns the default of 100 MiB.
pub fn max_file_size_from_env_value(value: Option<String>) -> CoreResult<u64> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let Some(value) = value else {
        return Ok(DEFAULT_MAX_FILE_SIZE);
    };

    match value.parse::<u64>() {
        Ok(0) | Err(_) => Err(CoreError::InvalidInput(format!(
            "MAX_FILE_SIZE must be a positive number of bytes, got '{}'",
            value
        ))),
        Ok(bytes) => Ok(bytes),
    }
}
