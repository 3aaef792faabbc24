//! Upload service: the ingestion engine bound to the configured upload directory.
//!
//! This is the facade the API and CLI call. It turns folder listings, rename previews and
//! multipart parts into [`FileDescriptor`]s and hands them to the engine.

use crate::config::CoreConfig;
use crate::{CoreError, CoreResult};
use filedock_files::names;
use filedock_files::{
    list_folder, BatchOutcome, FileDescriptor, FsStore, IngestionEngine, UploadStats,
};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// Files found in a source folder, ready to be submitted.
#[derive(Debug, Clone)]
pub struct FolderListing {
    pub files: Vec<FileDescriptor>,
    pub total_files: usize,
    pub total_size: u64,
}

/// One file part of a multipart upload.
#[derive(Debug, Clone)]
pub struct WebUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Client metadata for a multipart file part, aligned with the parts by index.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebFileMeta {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub new_name: Option<String>,
    #[serde(default)]
    pub extension: Option<String>,
}

/// Ingests batches into the upload directory.
#[derive(Debug, Clone)]
pub struct UploadService {
    engine: Arc<IngestionEngine<FsStore>>,
}

impl UploadService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        let store = FsStore::new(cfg.upload_dir());
        Self {
            engine: Arc::new(IngestionEngine::new(store)),
        }
    }

    /// Describes the files directly inside `folder`.
    pub fn list_folder(&self, folder: &Path) -> CoreResult<FolderListing> {
        let files = list_folder(folder)?;
        let total_size = files.iter().map(FileDescriptor::size).sum();

        Ok(FolderListing {
            total_files: files.len(),
            total_size,
            files,
        })
    }

    /// Ingests path- or buffer-sourced descriptors.
    ///
    /// # Errors
    ///
    /// Fails only if the upload directory cannot be created; per-file failures are reported
    /// in the outcome.
    pub fn ingest(&self, descriptors: Vec<FileDescriptor>) -> CoreResult<BatchOutcome> {
        Ok(self.engine.ingest_batch(descriptors)?)
    }

    /// Ingests multipart parts, applying the optional JSON metadata array by index.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` if `metadata` is not a JSON array of file metadata,
    /// and otherwise behaves like [`UploadService::ingest`].
    pub fn ingest_web(
        &self,
        uploads: Vec<WebUpload>,
        metadata: Option<&str>,
    ) -> CoreResult<BatchOutcome> {
        let descriptors = web_descriptors(uploads, metadata)?;
        self.ingest(descriptors)
    }

    /// Counts and sizes the stored top-level files.
    pub fn stats(&self) -> CoreResult<UploadStats> {
        Ok(self.engine.stats()?)
    }
}

/// Normalises requested names without touching storage.
///
/// Invalid names are sanitised and a missing extension is restored from the descriptor's
/// extension hint, exactly as ingestion would do.
pub fn prepare_renames(descriptors: Vec<FileDescriptor>) -> Vec<FileDescriptor> {
    descriptors
        .into_iter()
        .map(|descriptor| match descriptor.new_name() {
            Some(requested) => {
                let prepared = names::prepare_target_name(requested, descriptor.extension());
                descriptor.with_new_name(prepared)
            }
            None => descriptor,
        })
        .collect()
}

fn web_descriptors(
    uploads: Vec<WebUpload>,
    metadata: Option<&str>,
) -> CoreResult<Vec<FileDescriptor>> {
    let metadata: Vec<WebFileMeta> = match metadata.map(str::trim).filter(|m| !m.is_empty()) {
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| CoreError::InvalidInput(format!("invalid file metadata: {}", e)))?,
        None => Vec::new(),
    };

    let descriptors = uploads
        .into_iter()
        .enumerate()
        .map(|(index, upload)| {
            let meta = metadata.get(index).cloned().unwrap_or_default();
            let id = meta
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| upload.file_name.clone());

            let mut descriptor = FileDescriptor::from_buffer(id, upload.file_name, upload.bytes);
            if let Some(new_name) = meta.new_name {
                descriptor = descriptor.with_new_name(new_name);
            }
            if let Some(extension) = meta.extension {
                descriptor = descriptor.with_extension(extension);
            }
            descriptor
        })
        .collect();

    Ok(descriptors)
}
