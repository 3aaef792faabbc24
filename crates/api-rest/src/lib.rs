//! # API REST
//!
//! REST API implementation for filedock.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, multipart parsing, CORS)
//!
//! Uses `api-shared` for request/response bodies and `filedock-core` for the work itself.
//! Core calls touch the filesystem, so handlers run them on the blocking pool.

#![warn(rust_2018_idioms)]

use api_shared::{
    BatchUploadRes, CatalogEntryDto, DeleteRes, ErrorRes, FileDescriptorDto, FileListRes,
    FilesReq, FolderListReq, FolderListRes, HealthRes, HealthService, RenameRes, StatsDto,
    StatsRes, StoredFileDto, SummaryDto, UploadResultDto,
};
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path as AxumPath, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post, put},
    Router,
};
use filedock_core::{
    prepare_renames, CatalogService, CoreConfig, CoreError, CoreResult, FileDescriptor,
    FilesError, RetrievedFile, UploadService, WebUpload,
};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    upload_service: UploadService,
    catalog_service: CatalogService,
}

impl AppState {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self {
            upload_service: UploadService::new(cfg.clone()),
            catalog_service: CatalogService::new(cfg),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_folder,
        rename_files,
        upload_files,
        upload_web,
        upload_stats,
        list_metadata,
        search_metadata,
        download_file,
        stream_file,
        file_by_id,
        delete_file,
        metadata_stats,
    ),
    components(schemas(
        HealthRes,
        ErrorRes,
        FolderListReq,
        FolderListRes,
        FileDescriptorDto,
        FilesReq,
        RenameRes,
        UploadResultDto,
        SummaryDto,
        BatchUploadRes,
        StoredFileDto,
        StatsDto,
        StatsRes,
        CatalogEntryDto,
        FileListRes,
        DeleteRes,
    ))
)]
pub struct ApiDoc;

type ApiError = (StatusCode, Json<ErrorRes>);
type ApiResult<T> = Result<Json<T>, ApiError>;

/// Builds the REST router for the given configuration.
///
/// Request bodies are capped at the configured maximum file size.
pub fn router(cfg: Arc<CoreConfig>) -> Router {
    let body_limit = usize::try_from(cfg.max_file_size()).unwrap_or(usize::MAX);

    Router::new()
        .route("/health", get(health))
        .route("/api/files/list-folder", post(list_folder))
        .route("/api/files/rename", put(rename_files))
        .route("/api/files/upload", post(upload_files))
        .route("/api/files/upload-web", post(upload_web))
        .route("/api/files/stats", get(upload_stats))
        .route("/api/file-metadata/list", get(list_metadata))
        .route("/api/file-metadata/search", get(search_metadata))
        .route("/api/file-metadata/download/:filename", get(download_file))
        .route("/api/file-metadata/stream/:filename", get(stream_file))
        .route("/api/file-metadata/file/:id", get(file_by_id))
        .route("/api/file-metadata/delete/:filename", delete(delete_file))
        .route("/api/file-metadata/stats", get(metadata_stats))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState::new(cfg))
}

fn bad_request(message: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorRes::new(message, None)),
    )
}

fn internal_error() -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorRes::new("Internal error", None)),
    )
}

/// Maps a core error onto a status code and JSON error body.
fn core_error(context: &str, err: CoreError) -> ApiError {
    let status = match &err {
        CoreError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        CoreError::NotFound(_) => StatusCode::NOT_FOUND,
        CoreError::OutsideUploadDir(_) => StatusCode::FORBIDDEN,
        CoreError::Files(FilesError::SourceNotFound(_)) => StatusCode::NOT_FOUND,
        CoreError::Files(FilesError::NameInvalid(_) | FilesError::NotADirectory(_)) => {
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::error!("{} error: {:?}", context, err);
    } else {
        tracing::debug!("{} rejected: {}", context, err);
    }

    (
        status,
        Json(ErrorRes::new(context, Some(err.to_string()))),
    )
}

/// Runs a core call on the blocking pool.
async fn run_blocking<T, F>(context: &'static str, work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> CoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result.map_err(|e| core_error(context, e)),
        Err(e) => {
            tracing::error!("{} task failed: {:?}", context, e);
            Err(internal_error())
        }
    }
}

fn file_response(file: RetrievedFile, disposition: &str) -> Response {
    let disposition = format!(
        "{}; filename=\"{}\"",
        disposition,
        file.file_name.replace('"', "")
    );

    (
        [
            (header::CONTENT_TYPE, file.media_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    )
        .into_response()
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
#[axum::debug_handler]
async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/api/files/list-folder",
    request_body = FolderListReq,
    responses(
        (status = 200, description = "Files directly inside the folder", body = FolderListRes),
        (status = 400, description = "Missing folder path or not a directory", body = ErrorRes),
        (status = 404, description = "Folder not found", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// List the files directly inside a server-side source folder
///
/// The returned descriptors can be edited (renamed) and posted back to the upload endpoint.
#[axum::debug_handler]
async fn list_folder(
    State(state): State<AppState>,
    Json(req): Json<FolderListReq>,
) -> ApiResult<FolderListRes> {
    let folder = req.folder_path.trim().to_owned();
    if folder.is_empty() {
        return Err(bad_request("Folder path is required"));
    }

    let service = state.upload_service.clone();
    let listing = run_blocking("List folder", move || {
        service.list_folder(&PathBuf::from(folder))
    })
    .await?;

    Ok(Json(FolderListRes::from(&listing)))
}

#[utoipa::path(
    put,
    path = "/api/files/rename",
    request_body = FilesReq,
    responses(
        (status = 200, description = "Descriptors with normalised names", body = RenameRes),
        (status = 400, description = "No files provided", body = ErrorRes)
    )
)]
/// Preview the names ingestion would use for the requested renames
#[axum::debug_handler]
async fn rename_files(Json(req): Json<FilesReq>) -> ApiResult<RenameRes> {
    if req.files.is_empty() {
        return Err(bad_request("No files provided"));
    }

    let descriptors: Vec<FileDescriptor> = req.files.into_iter().map(Into::into).collect();
    let files: Vec<FileDescriptorDto> = prepare_renames(descriptors)
        .iter()
        .map(FileDescriptorDto::from)
        .collect();

    Ok(Json(RenameRes {
        success: true,
        message: format!("Prepared {} file names", files.len()),
        files,
    }))
}

#[utoipa::path(
    post,
    path = "/api/files/upload",
    request_body = FilesReq,
    responses(
        (status = 200, description = "Per-file results and summary", body = BatchUploadRes),
        (status = 400, description = "No files provided", body = ErrorRes),
        (status = 500, description = "Upload directory unavailable", body = ErrorRes)
    )
)]
/// Ingest a batch of files read from server-side paths
#[axum::debug_handler]
async fn upload_files(
    State(state): State<AppState>,
    Json(req): Json<FilesReq>,
) -> ApiResult<BatchUploadRes> {
    if req.files.is_empty() {
        return Err(bad_request("No files provided"));
    }

    let descriptors: Vec<FileDescriptor> = req.files.into_iter().map(Into::into).collect();
    let service = state.upload_service.clone();
    let outcome = run_blocking("Batch upload", move || service.ingest(descriptors)).await?;

    Ok(Json(BatchUploadRes::from_outcome(&outcome, "Batch")))
}

#[utoipa::path(
    post,
    path = "/api/files/upload-web",
    request_body(
        content = String,
        content_type = "multipart/form-data",
        description = "File parts plus an optional `files` JSON array of {id, newName, extension}"
    ),
    responses(
        (status = 200, description = "Per-file results and summary", body = BatchUploadRes),
        (status = 400, description = "No file parts or malformed metadata", body = ErrorRes),
        (status = 500, description = "Upload directory unavailable", body = ErrorRes)
    )
)]
/// Ingest files uploaded as multipart parts
///
/// Parts carrying a filename are files. A text part named `files` (or `metadata`) holds the
/// JSON metadata array, applied to the file parts by index.
#[axum::debug_handler]
async fn upload_web(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<BatchUploadRes> {
    let mut uploads = Vec::new();
    let mut metadata = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::debug!("Malformed multipart body: {}", e);
                return Err(bad_request("Malformed multipart body"));
            }
        };

        if let Some(file_name) = field.file_name().map(str::to_owned) {
            let bytes = field.bytes().await.map_err(|e| {
                tracing::debug!("Failed to read part {}: {}", file_name, e);
                bad_request("Failed to read uploaded file")
            })?;
            uploads.push(WebUpload {
                file_name,
                bytes: bytes.to_vec(),
            });
        } else if matches!(field.name(), Some("files") | Some("metadata")) {
            let text = field
                .text()
                .await
                .map_err(|_| bad_request("Failed to read file metadata"))?;
            metadata = Some(text);
        }
    }

    if uploads.is_empty() {
        return Err(bad_request("No files uploaded"));
    }

    let service = state.upload_service.clone();
    let outcome = run_blocking("Web upload", move || {
        service.ingest_web(uploads, metadata.as_deref())
    })
    .await?;

    Ok(Json(BatchUploadRes::from_outcome(&outcome, "Web")))
}

#[utoipa::path(
    get,
    path = "/api/files/stats",
    responses(
        (status = 200, description = "Stored file statistics", body = StatsRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn upload_stats(State(state): State<AppState>) -> ApiResult<StatsRes> {
    let service = state.upload_service.clone();
    let stats = run_blocking("Upload stats", move || service.stats()).await?;
    Ok(Json(StatsRes::from(&stats)))
}

#[utoipa::path(
    get,
    path = "/api/file-metadata/list",
    responses(
        (status = 200, description = "Every stored file, recursively", body = FileListRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn list_metadata(State(state): State<AppState>) -> ApiResult<FileListRes> {
    let catalog = state.catalog_service.clone();
    let listing = run_blocking("List files", move || catalog.list_all()).await?;
    Ok(Json(FileListRes::new(
        &listing,
        format!("Found {} files", listing.total_files),
    )))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/file-metadata/search",
    params(("q" = String, Query, description = "Case-insensitive name fragment")),
    responses(
        (status = 200, description = "Matching files", body = FileListRes),
        (status = 400, description = "Missing search term", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn search_metadata(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<FileListRes> {
    let Some(term) = params.q.filter(|q| !q.trim().is_empty()) else {
        return Err(bad_request("Search term is required"));
    };

    let catalog = state.catalog_service.clone();
    let message = format!("Found files matching \"{}\"", term);
    let listing = run_blocking("Search files", move || catalog.search(&term)).await?;
    Ok(Json(FileListRes::new(&listing, message)))
}

#[utoipa::path(
    get,
    path = "/api/file-metadata/download/{filename}",
    params(("filename" = String, Path, description = "Stored file name")),
    responses(
        (status = 200, description = "File content as an attachment"),
        (status = 404, description = "File not found", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn download_file(
    State(state): State<AppState>,
    AxumPath(filename): AxumPath<String>,
) -> Result<Response, ApiError> {
    let catalog = state.catalog_service.clone();
    let file = run_blocking("Download file", move || catalog.find_by_name(&filename)).await?;
    Ok(file_response(file, "attachment"))
}

#[utoipa::path(
    get,
    path = "/api/file-metadata/stream/{filename}",
    params(("filename" = String, Path, description = "Stored file name")),
    responses(
        (status = 200, description = "File content for inline display"),
        (status = 404, description = "File not found", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn stream_file(
    State(state): State<AppState>,
    AxumPath(filename): AxumPath<String>,
) -> Result<Response, ApiError> {
    let catalog = state.catalog_service.clone();
    let file = run_blocking("Stream file", move || catalog.find_by_name(&filename)).await?;
    Ok(file_response(file, "inline"))
}

#[utoipa::path(
    get,
    path = "/api/file-metadata/file/{id}",
    params(("id" = String, Path, description = "Opaque id from the listing")),
    responses(
        (status = 200, description = "File content"),
        (status = 400, description = "Malformed id", body = ErrorRes),
        (status = 403, description = "Id resolves outside the upload directory", body = ErrorRes),
        (status = 404, description = "File not found", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn file_by_id(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Response, ApiError> {
    let catalog = state.catalog_service.clone();
    let file = run_blocking("Get file", move || catalog.find_by_id(&id)).await?;
    Ok(file_response(file, "inline"))
}

#[utoipa::path(
    delete,
    path = "/api/file-metadata/delete/{filename}",
    params(("filename" = String, Path, description = "Stored file name")),
    responses(
        (status = 200, description = "File deleted", body = DeleteRes),
        (status = 404, description = "File not found", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn delete_file(
    State(state): State<AppState>,
    AxumPath(filename): AxumPath<String>,
) -> ApiResult<DeleteRes> {
    let catalog = state.catalog_service.clone();
    let name = filename.clone();
    run_blocking("Delete file", move || catalog.delete_by_name(&name)).await?;

    Ok(Json(DeleteRes {
        success: true,
        message: format!("File {} deleted successfully", filename),
    }))
}

#[utoipa::path(
    get,
    path = "/api/file-metadata/stats",
    responses(
        (status = 200, description = "Stored file statistics", body = StatsRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn metadata_stats(State(state): State<AppState>) -> ApiResult<StatsRes> {
    let service = state.upload_service.clone();
    let stats = run_blocking("File stats", move || service.stats()).await?;
    Ok(Json(StatsRes::from(&stats)))
}
