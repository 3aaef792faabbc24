//! Constants used throughout the filedock core crate.

/// Upload directory used when `UPLOAD_PATH` is not set, relative to the working directory.
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";

/// Largest accepted upload body in bytes when `MAX_FILE_SIZE` is not set (100 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 104_857_600;

/// Address the REST server binds to when `FILEDOCK_REST_ADDR` is not set.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";
