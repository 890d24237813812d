//! Error types for canvas-sync.

use thiserror::Error;

use crate::correlation::CorrelationKey;

/// Errors that can occur while loading configuration or running a sync.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid tracked todo '{summary}': {reason}")]
    DataIntegrity { summary: String, reason: String },

    #[error("Course for tracked assignment {key} is no longer active")]
    CourseNotActive { key: CorrelationKey },

    #[error("Invalid due date: {0}")]
    DueDate(String),

    #[error("Canvas error: {0}")]
    Lms(String),

    #[error("CalDAV error: {0}")]
    CalDav(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for canvas-sync operations.
pub type SyncResult<T> = Result<T, SyncError>;
