use filedock_files::FilesError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("path lies outside the upload directory: {0}")]
    OutsideUploadDir(String),
    #[error(transparent)]
    Files(#[from] FilesError),
    #[error("failed to read upload directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to scan upload directory: {0}")]
    Walk(#[from] walkdir::Error),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
