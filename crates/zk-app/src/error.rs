use thiserror::Error;
use zk_core::error::GenerationError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Error from backend: {0}")]
    BackendError(#[from] GenerationError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
