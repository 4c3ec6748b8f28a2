use thiserror::Error;

use crate::validator::MIB;

/// Why a candidate file was kept out of the staged set
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("File size must be less than {}MB ({filename} is {size} bytes)", .limit / MIB)]
    FileTooLarge {
        filename: String,
        size: u64,
        limit: u64,
    },

    #[error("Invalid file type: {filename} is {mime_type}, expected {accepted}")]
    UnsupportedType {
        filename: String,
        mime_type: String,
        accepted: String,
    },

    #[error("Maximum {max} files allowed")]
    TooManyFiles { max: usize, attempted: usize },

    #[error("No staged file at position {index} ({len} staged)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Synchronous guard failures raised by the generation session
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Please provide either text description or upload images")]
    MissingInput,

    #[error("A generation is already in progress")]
    AlreadyInFlight,

    #[error("Inputs cannot be edited while a generation is in progress")]
    Busy,

    #[error("Description must be {max} characters or fewer ({length} given)")]
    TextTooLong { length: usize, max: usize },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Failure of a single call to a generation backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("{}", describe_status(.status, .message))]
    Status { status: u16, message: Option<String> },

    #[error("Failed to reach backend: {0}")]
    Network(String),

    #[error("Backend did not answer within {0}s")]
    Timeout(u64),

    #[error("Unexpected response from backend: {0}")]
    MalformedResponse(String),

    #[error("Generation cancelled")]
    Cancelled,
}

impl GenerationError {
    /// True when the error carries no detail worth showing on its own
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Network(detail) | Self::MalformedResponse(detail) => detail.trim().is_empty(),
            _ => false,
        }
    }
}

fn describe_status(status: &u16, message: &Option<String>) -> String {
    match message {
        Some(message) if !message.trim().is_empty() => message.clone(),
        _ => format!("Generation failed (HTTP {status})"),
    }
}
