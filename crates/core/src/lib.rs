//! # filedock Core
//!
//! Service layer between the API/CLI front ends and the ingestion crate:
//! - Startup configuration ([`CoreConfig`])
//! - Batch uploads into the configured directory ([`UploadService`])
//! - Browsing stored files: listing, search, retrieval, deletion ([`CatalogService`])
//!
//! **No API concerns**: HTTP routing, multipart parsing and response shaping belong in
//! `api-rest` and `api-shared`.

pub mod catalog;
pub mod config;
pub mod constants;
pub mod error;
pub mod upload;

pub use catalog::{CatalogEntry, CatalogService, FileListing, RetrievedFile};
pub use config::CoreConfig;
pub use constants::{DEFAULT_MAX_FILE_SIZE, DEFAULT_REST_ADDR, DEFAULT_UPLOAD_DIR};
pub use error::{CoreError, CoreResult};
pub use upload::{prepare_renames, FolderListing, UploadService, WebFileMeta, WebUpload};

pub use filedock_files::{
    BatchOutcome, BatchSummary, FileDescriptor, FileSource, FilesError, UploadResult,
    UploadStats, UploadStatus,
};
