//! Metadata catalog over the upload directory.
//!
//! Read-side operations used for browsing: recursive listing, search, retrieval by exact
//! name or by opaque id, and deletion. None of this takes part in ingestion decisions.
//!
//! Entry ids are the entry's path (as walked from the configured upload directory),
//! encoded as URL-safe base64 without padding. Ids are only a handle: a decoded path is
//! canonicalised and must still lie inside the upload directory before it is read.

use crate::config::CoreConfig;
use crate::{CoreError, CoreResult};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use filedock_files::{media, names};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Metadata for one stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub extension: String,
    pub size: u64,
    pub media_type: String,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
    /// Path relative to the upload directory, using `/` separators
    pub relative_path: String,
}

/// A set of entries with totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListing {
    pub files: Vec<CatalogEntry>,
    pub total_files: usize,
    pub total_size: u64,
}

impl FileListing {
    fn from_entries(files: Vec<CatalogEntry>) -> Self {
        Self {
            total_files: files.len(),
            total_size: files.iter().map(|f| f.size).sum(),
            files,
        }
    }
}

/// File content loaded for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievedFile {
    pub file_name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl RetrievedFile {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    fn load(path: &Path) -> CoreResult<Self> {
        let bytes = fs::read(path)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_owned();
        let media_type = media::guess(&file_name, Some(&bytes));

        Ok(Self {
            file_name,
            media_type,
            bytes,
        })
    }
}

/// Browsing operations scoped to the configured upload directory.
#[derive(Debug, Clone)]
pub struct CatalogService {
    cfg: Arc<CoreConfig>,
}

impl CatalogService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    fn upload_dir(&self) -> &Path {
        self.cfg.upload_dir()
    }

    /// Lists every file under the upload directory, descending into subdirectories.
    ///
    /// A missing upload directory yields an empty listing.
    pub fn list_all(&self) -> CoreResult<FileListing> {
        if !self.upload_dir().exists() {
            return Ok(FileListing::default());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(self.upload_dir())
            .min_depth(1)
            .sort_by_file_name()
        {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                tracing::warn!("skipping non UTF-8 file {}", entry.path().display());
                continue;
            };

            let metadata = entry.metadata()?;
            let modified_at = metadata.modified().ok().map(DateTime::<Utc>::from);
            let created_at = metadata
                .created()
                .ok()
                .map(DateTime::<Utc>::from)
                .or(modified_at);
            let (_, extension) = names::split_extension(&name);

            files.push(CatalogEntry {
                id: encode_id(entry.path()),
                extension: extension.trim_start_matches('.').to_owned(),
                size: metadata.len(),
                media_type: media::guess_for_path(entry.path()),
                created_at,
                modified_at,
                relative_path: self.relative_path(entry.path()),
                name,
            });
        }

        Ok(FileListing::from_entries(files))
    }

    /// Case-insensitive substring search over file names.
    pub fn search(&self, term: &str) -> CoreResult<FileListing> {
        let needle = term.to_lowercase();
        let matches = self
            .list_all()?
            .files
            .into_iter()
            .filter(|entry| entry.name.to_lowercase().contains(&needle))
            .collect();

        Ok(FileListing::from_entries(matches))
    }

    /// Loads the first file, anywhere under the upload directory, named exactly `name`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Files` for names that are not a single path component and
    /// `CoreError::NotFound` if nothing matches.
    pub fn find_by_name(&self, name: &str) -> CoreResult<RetrievedFile> {
        names::check_flat(name)?;
        if !self.upload_dir().exists() {
            return Err(CoreError::NotFound(name.to_owned()));
        }

        for entry in WalkDir::new(self.upload_dir()).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() && entry.file_name().to_str() == Some(name) {
                return RetrievedFile::load(entry.path());
            }
        }

        Err(CoreError::NotFound(name.to_owned()))
    }

    /// Loads a file by the opaque id produced by [`CatalogService::list_all`].
    ///
    /// # Errors
    ///
    /// - `CoreError::InvalidInput` if the id does not decode to a path
    /// - `CoreError::NotFound` if the decoded path does not name an existing file
    /// - `CoreError::OutsideUploadDir` if it resolves outside the upload directory
    pub fn find_by_id(&self, id: &str) -> CoreResult<RetrievedFile> {
        let path = decode_id(id)?;
        if !path.is_file() {
            return Err(CoreError::NotFound(id.to_owned()));
        }

        let root = self.upload_dir().canonicalize()?;
        let resolved = path.canonicalize()?;
        if !resolved.starts_with(&root) {
            tracing::warn!(
                "rejected id resolving outside the upload directory: {}",
                resolved.display()
            );
            return Err(CoreError::OutsideUploadDir(id.to_owned()));
        }

        RetrievedFile::load(&resolved)
    }

    /// Deletes the top-level stored file called `name`.
    pub fn delete_by_name(&self, name: &str) -> CoreResult<()> {
        names::check_flat(name)?;
        let path = self.upload_dir().join(name);
        if !path.is_file() {
            return Err(CoreError::NotFound(name.to_owned()));
        }

        fs::remove_file(&path)?;
        tracing::info!("deleted {}", path.display());
        Ok(())
    }

    fn relative_path(&self, path: &Path) -> String {
        path.strip_prefix(self.upload_dir())
            .unwrap_or(path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Encodes a path as an opaque id.
pub fn encode_id(path: &Path) -> String {
    URL_SAFE_NO_PAD.encode(path.to_string_lossy().as_bytes())
}

/// Decodes an id produced by [`encode_id`].
pub fn decode_id(id: &str) -> CoreResult<PathBuf> {
    let bytes = URL_SAFE_NO_PAD
        .decode(id)
        .map_err(|e| CoreError::InvalidInput(format!("malformed file id: {}", e)))?;
    let path = String::from_utf8(bytes)
        .map_err(|_| CoreError::InvalidInput("file id is not valid UTF-8".into()))?;
    Ok(PathBuf::from(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn catalog(root: &Path) -> CatalogService {
        let cfg = CoreConfig::new(root.to_path_buf(), 1024).unwrap();
        CatalogService::new(Arc::new(cfg))
    }

    fn seeded() -> (TempDir, CatalogService) {
        let temp = TempDir::new().unwrap();
        let uploads = temp.path().join("uploads");
        fs::create_dir_all(uploads.join("2024")).unwrap();
        fs::write(uploads.join("Report.pdf"), "%PDF-1.4 body").unwrap();
        fs::write(uploads.join("notes.txt"), "hello").unwrap();
        fs::write(uploads.join("2024").join("old-report.txt"), "older").unwrap();
        let catalog = catalog(&uploads);
        (temp, catalog)
    }

    #[test]
    fn test_list_all_recurses() {
        let (_temp, catalog) = seeded();

        let listing = catalog.list_all().unwrap();

        assert_eq!(listing.total_files, 3);
        assert_eq!(listing.total_size, 13 + 5 + 5);
        let nested = listing
            .files
            .iter()
            .find(|f| f.name == "old-report.txt")
            .unwrap();
        assert_eq!(nested.relative_path, "2024/old-report.txt");
        assert_eq!(nested.extension, "txt");
        assert_eq!(nested.media_type, "text/plain");
        let pdf = listing.files.iter().find(|f| f.name == "Report.pdf").unwrap();
        assert_eq!(pdf.media_type, "application/pdf");
    }

    #[test]
    fn test_list_all_missing_directory_is_empty() {
        let temp = TempDir::new().unwrap();
        let listing = catalog(&temp.path().join("nothing")).list_all().unwrap();
        assert_eq!(listing, FileListing::default());
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let (_temp, catalog) = seeded();

        let listing = catalog.search("REPORT").unwrap();

        let mut found: Vec<&str> = listing.files.iter().map(|f| f.name.as_str()).collect();
        found.sort();
        assert_eq!(found, vec!["Report.pdf", "old-report.txt"]);
        assert_eq!(listing.total_files, 2);
    }

    #[test]
    fn test_find_by_name_searches_subdirectories() {
        let (_temp, catalog) = seeded();

        let file = catalog.find_by_name("old-report.txt").unwrap();
        assert_eq!(file.bytes, b"older");
        assert_eq!(file.size(), 5);
        assert_eq!(file.media_type, "text/plain");

        assert!(matches!(
            catalog.find_by_name("absent.txt"),
            Err(CoreError::NotFound(_))
        ));
        assert!(matches!(
            catalog.find_by_name("../secret"),
            Err(CoreError::Files(_))
        ));
    }

    #[test]
    fn test_find_by_id_round_trips_listing_ids() {
        let (_temp, catalog) = seeded();
        let listing = catalog.list_all().unwrap();
        let entry = listing.files.iter().find(|f| f.name == "notes.txt").unwrap();

        let file = catalog.find_by_id(&entry.id).unwrap();
        assert_eq!(file.file_name, "notes.txt");
        assert_eq!(file.bytes, b"hello");
    }

    #[test]
    fn test_find_by_id_rejects_paths_outside_upload_dir() {
        let (temp, catalog) = seeded();
        let outside = temp.path().join("secret.txt");
        fs::write(&outside, "keep out").unwrap();

        let result = catalog.find_by_id(&encode_id(&outside));
        assert!(matches!(result, Err(CoreError::OutsideUploadDir(_))));

        let sneaky = temp.path().join("uploads").join("..").join("secret.txt");
        let result = catalog.find_by_id(&encode_id(&sneaky));
        assert!(matches!(result, Err(CoreError::OutsideUploadDir(_))));
    }

    #[test]
    fn test_find_by_id_errors() {
        let (temp, catalog) = seeded();
        assert!(matches!(
            catalog.find_by_id("%%%"),
            Err(CoreError::InvalidInput(_))
        ));
        let missing = temp.path().join("uploads").join("gone.txt");
        assert!(matches!(
            catalog.find_by_id(&encode_id(&missing)),
            Err(CoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_by_name() {
        let (temp, catalog) = seeded();

        catalog.delete_by_name("notes.txt").unwrap();
        assert!(!temp.path().join("uploads/notes.txt").exists());

        assert!(matches!(
            catalog.delete_by_name("notes.txt"),
            Err(CoreError::NotFound(_))
        ));
        assert!(matches!(
            catalog.delete_by_name("2024"),
            Err(CoreError::NotFound(_))
        ));
    }
}
