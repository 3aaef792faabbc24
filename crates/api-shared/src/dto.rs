//! JSON request and response bodies.
//!
//! Field names are camelCase on the wire. Timestamps travel as RFC 3339 strings.

use chrono::{DateTime, Utc};
use filedock_core::{
    BatchOutcome, BatchSummary, CatalogEntry, FileDescriptor, FileListing, FileSource,
    FolderListing, UploadResult, UploadStats,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use utoipa::ToSchema;

fn to_rfc3339(value: Option<DateTime<Utc>>) -> Option<String> {
    value.map(|v| v.to_rfc3339())
}

fn from_rfc3339(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
        .map(|v| v.with_timezone(&Utc))
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorRes {
    pub fn new(message: impl Into<String>, error: Option<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error,
        }
    }
}

/// A file offered for upload, sourced from a path on the server's filesystem.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptorDto {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub original_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    #[serde(default)]
    pub size: u64,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
}

impl From<FileDescriptorDto> for FileDescriptor {
    fn from(dto: FileDescriptorDto) -> Self {
        let name = dto.name.filter(|n| !n.trim().is_empty());
        let original_name = if dto.original_name.trim().is_empty() {
            name.clone().unwrap_or_else(|| {
                Path::new(&dto.path)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            })
        } else {
            dto.original_name
        };
        // A client-side rename may arrive as a changed `name` rather than `newName`.
        let new_name = dto
            .new_name
            .or_else(|| name.filter(|n| *n != original_name));

        let mut descriptor = FileDescriptor::from_path(dto.id, original_name, dto.path)
            .with_size(dto.size)
            .with_timestamps(
                from_rfc3339(dto.created_at.as_deref()),
                from_rfc3339(dto.modified_at.as_deref()),
            );
        if let Some(new_name) = new_name {
            descriptor = descriptor.with_new_name(new_name);
        }
        if let Some(extension) = dto.extension {
            descriptor = descriptor.with_extension(extension);
        }
        if let Some(mimetype) = dto.mimetype {
            descriptor = descriptor.with_media_type(mimetype);
        }
        descriptor
    }
}

impl From<&FileDescriptor> for FileDescriptorDto {
    fn from(descriptor: &FileDescriptor) -> Self {
        let path = match descriptor.source() {
            FileSource::Path(path) => path.to_string_lossy().into_owned(),
            FileSource::Buffer(_) => String::new(),
        };

        Self {
            id: descriptor.id().to_owned(),
            name: Some(descriptor.original_name().to_owned()),
            original_name: descriptor.original_name().to_owned(),
            new_name: descriptor.new_name().map(str::to_owned),
            extension: descriptor.extension().map(str::to_owned),
            size: descriptor.size(),
            path,
            mimetype: descriptor.media_type().map(str::to_owned),
            created_at: to_rfc3339(descriptor.created_at()),
            modified_at: to_rfc3339(descriptor.modified_at()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FolderListReq {
    #[serde(default)]
    pub folder_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FolderListRes {
    pub success: bool,
    pub message: String,
    pub files: Vec<FileDescriptorDto>,
    pub total_files: usize,
    pub total_size: u64,
}

impl From<&FolderListing> for FolderListRes {
    fn from(listing: &FolderListing) -> Self {
        Self {
            success: true,
            message: format!("Found {} files", listing.total_files),
            files: listing.files.iter().map(FileDescriptorDto::from).collect(),
            total_files: listing.total_files,
            total_size: listing.total_size,
        }
    }
}

/// Body of the rename preview and path-based upload requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct FilesReq {
    #[serde(default)]
    pub files: Vec<FileDescriptorDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RenameRes {
    pub success: bool,
    pub message: String,
    pub files: Vec<FileDescriptorDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResultDto {
    pub id: String,
    pub original_name: String,
    pub new_name: String,
    /// One of `pending`, `done`, `failed`, `duplicate`
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
}

impl From<&UploadResult> for UploadResultDto {
    fn from(result: &UploadResult) -> Self {
        Self {
            id: result.id().to_owned(),
            original_name: result.original_name().to_owned(),
            new_name: result.new_name().to_owned(),
            status: result.status().to_string(),
            final_path: result
                .final_path()
                .map(|p| p.to_string_lossy().into_owned()),
            error: result.error().map(str::to_owned),
            size: result.size(),
            extension: result.extension().map(str::to_owned),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SummaryDto {
    pub total: usize,
    pub done: usize,
    pub failed: usize,
    pub duplicate: usize,
    pub pending: usize,
}

impl From<BatchSummary> for SummaryDto {
    fn from(summary: BatchSummary) -> Self {
        Self {
            total: summary.total,
            done: summary.done,
            failed: summary.failed,
            duplicate: summary.duplicate,
            pending: summary.pending,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BatchUploadRes {
    pub success: bool,
    pub message: String,
    pub results: Vec<UploadResultDto>,
    pub summary: SummaryDto,
}

impl BatchUploadRes {
    /// Shapes an outcome; `label` names the upload kind, e.g. "Batch" or "Web".
    pub fn from_outcome(outcome: &BatchOutcome, label: &str) -> Self {
        Self {
            success: true,
            message: format!(
                "{} upload completed. {} files uploaded successfully.",
                label, outcome.summary.done
            ),
            results: outcome.results.iter().map(UploadResultDto::from).collect(),
            summary: outcome.summary.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoredFileDto {
    pub name: String,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsDto {
    pub total_files: usize,
    pub total_size: u64,
    pub files: Vec<StoredFileDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatsRes {
    pub success: bool,
    pub message: String,
    pub data: StatsDto,
}

impl From<&UploadStats> for StatsRes {
    fn from(stats: &UploadStats) -> Self {
        Self {
            success: true,
            message: "Upload statistics retrieved successfully".into(),
            data: StatsDto {
                total_files: stats.total_files,
                total_size: stats.total_size,
                files: stats
                    .files
                    .iter()
                    .map(|f| StoredFileDto {
                        name: f.name.clone(),
                        size: f.size,
                        uploaded_at: to_rfc3339(f.uploaded_at),
                    })
                    .collect(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntryDto {
    pub id: String,
    pub name: String,
    pub extension: String,
    pub size: u64,
    pub mimetype: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
    pub relative_path: String,
}

impl From<&CatalogEntry> for CatalogEntryDto {
    fn from(entry: &CatalogEntry) -> Self {
        Self {
            id: entry.id.clone(),
            name: entry.name.clone(),
            extension: entry.extension.clone(),
            size: entry.size,
            mimetype: entry.media_type.clone(),
            created_at: to_rfc3339(entry.created_at),
            modified_at: to_rfc3339(entry.modified_at),
            relative_path: entry.relative_path.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileListRes {
    pub success: bool,
    pub message: String,
    pub files: Vec<CatalogEntryDto>,
    pub total_files: usize,
    pub total_size: u64,
}

impl FileListRes {
    pub fn new(listing: &FileListing, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            files: listing.files.iter().map(CatalogEntryDto::from).collect(),
            total_files: listing.total_files,
            total_size: listing.total_size,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteRes {
    pub success: bool,
    pub message: String,
}
