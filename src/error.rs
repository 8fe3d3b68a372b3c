//! Error types for stream-saver

use std::time::Duration;

use thiserror::Error;

/// Coarse classification of failures, used for logging and exit handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Session errors
    AuthRejected,
    Locked,

    // Request errors
    Offline,
    AnalyzeFailed,
    NetworkError,
    BackendError,

    // User errors
    NoResult,
    UnknownFormat,
    InvalidConfig,

    // System errors
    FileError,
    LaunchError,
}

/// Main error type for stream-saver
#[derive(Error, Debug)]
pub enum StreamSaverError {
    #[error("Incorrect access code.")]
    AuthRejected,

    #[error("Session is locked. Enter the access code first.")]
    Locked,

    #[error("Engine is offline.")]
    Offline,

    /// Every analyze failure collapses into this one message. The cause is logged.
    #[error("Could not analyze video.")]
    AnalyzeFailed,

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Backend returned HTTP {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("Nothing analyzed yet")]
    NoResult,

    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to start download: {0}")]
    Launch(String),

    #[error("File error: {0}")]
    File(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StreamSaverError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::AuthRejected => ErrorCode::AuthRejected,
            Self::Locked => ErrorCode::Locked,
            Self::Offline => ErrorCode::Offline,
            Self::AnalyzeFailed => ErrorCode::AnalyzeFailed,
            Self::Timeout(_) | Self::Http(_) => ErrorCode::NetworkError,
            Self::Backend { .. } | Self::Json(_) => ErrorCode::BackendError,
            Self::NoResult => ErrorCode::NoResult,
            Self::UnknownFormat(_) => ErrorCode::UnknownFormat,
            Self::InvalidConfig(_) => ErrorCode::InvalidConfig,
            Self::File(_) => ErrorCode::FileError,
            Self::Launch(_) => ErrorCode::LaunchError,
        }
    }
}

pub type Result<T> = std::result::Result<T, StreamSaverError>;
