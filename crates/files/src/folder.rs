//! Listing a local source folder as ingestion descriptors.

use crate::media;
use crate::model::FileDescriptor;
use crate::{FilesError, FilesResult};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;
use uuid::Uuid;

/// Describes every regular file directly inside `folder`.
///
/// Subdirectories are not descended into. Each descriptor gets a fresh random id and is
/// sourced from the file's path, so nothing is read beyond the sniffing needed for the
/// media type.
///
/// # Errors
///
/// Returns [`FilesError::SourceNotFound`] if `folder` does not exist,
/// [`FilesError::NotADirectory`] if it is not a directory, and [`FilesError::Io`] if it
/// cannot be read.
pub fn list_folder(folder: &Path) -> FilesResult<Vec<FileDescriptor>> {
    if !folder.exists() {
        return Err(FilesError::SourceNotFound(folder.to_path_buf()));
    }
    if !folder.is_dir() {
        return Err(FilesError::NotADirectory(folder.to_path_buf()));
    }

    let mut descriptors = Vec::new();
    for entry in fs::read_dir(folder)? {
        let entry = entry?;
        let path = entry.path();
        let metadata = fs::metadata(&path)?;
        if !metadata.is_file() {
            continue;
        }

        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_owned) else {
            tracing::warn!("skipping non UTF-8 file name in {}", folder.display());
            continue;
        };

        let modified = metadata.modified().ok().map(DateTime::<Utc>::from);
        let created = metadata
            .created()
            .ok()
            .map(DateTime::<Utc>::from)
            .or(modified);

        descriptors.push(
            FileDescriptor::from_path(Uuid::new_v4().to_string(), name, &path)
                .with_size(metadata.len())
                .with_media_type(media::guess_for_path(&path))
                .with_timestamps(created, modified),
        );
    }

    descriptors.sort_by(|a, b| a.original_name().cmp(b.original_name()));
    Ok(descriptors)
}
