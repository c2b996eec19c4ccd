//! Failure taxonomy for the publish pipeline.
//!
//! Every stage returns [`SyncError`]; the orchestrator in
//! [`crate::synchronise`] is the only place that turns one into the reported
//! outcome. File-system access goes through [`crate::contract::RepoFs`], whose
//! failures are [`FsFault`]s and are folded into a `SyncError` by the stage that
//! observed them (see [`FsFault::into_sync_error`]).

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Pipeline stage a stage-less failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    FolderValidation,
    ConfigValidation,
    /// Any other stage; reported with the generic fallback message.
    Pipeline,
}

impl Stage {
    pub fn unknown_error_message(self) -> &'static str {
        match self {
            Stage::FolderValidation => "Unknown error during folder validation",
            Stage::ConfigValidation => "Unknown error during configuration validation",
            Stage::Pipeline => "An unknown error occurred",
        }
    }
}

/// The remote call a transport failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCall {
    ConfigValidation,
    Upload,
}

impl fmt::Display for RemoteCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteCall::ConfigValidation => f.write_str("Configuration validation request"),
            RemoteCall::Upload => f.write_str("Upload request"),
        }
    }
}

/// Response detail attached to a transport failure when the server answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Duplicate folder names found (case-insensitive):\n{}", .0.join("\n"))]
    DuplicateFolders(Vec<String>),

    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Configuration validation failed with status code {0}")]
    ConfigRejected(u16),

    #[error("Upload failed with status code {0}")]
    UploadRejected(u16),

    /// A remote call failed. `response` is present when the server answered with
    /// an error status, absent for pure network failures. A bare upload failure
    /// reports the underlying error text unchanged.
    #[error("{}", transport_message(.call, .response.as_ref(), .message))]
    Transport {
        call: RemoteCall,
        response: Option<ErrorResponse>,
        message: String,
    },

    #[error("Failed to decode PumpRoom response: {0}")]
    InvalidResponse(String),

    #[error("HTTP client error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("Failed to build archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{}", .0.unknown_error_message())]
    Unknown(Stage),
}

fn transport_message(call: &RemoteCall, response: Option<&ErrorResponse>, message: &str) -> String {
    match response {
        Some(resp) => format!("{call} failed with status {}: {}", resp.status, resp.body),
        None => match call {
            RemoteCall::ConfigValidation => format!("{call} failed: {message}"),
            RemoteCall::Upload => message.to_string(),
        },
    }
}

impl SyncError {
    /// Server response carried by a transport failure, if any.
    pub fn response(&self) -> Option<&ErrorResponse> {
        match self {
            SyncError::Transport { response, .. } => response.as_ref(),
            _ => None,
        }
    }
}

/// Failure reported by a [`crate::contract::RepoFs`] implementation.
#[derive(Debug, Error)]
pub enum FsFault {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A failure that carries no usable description. [`crate::local_fs::LocalFs`]
    /// never produces it; other `RepoFs` implementations may.
    #[error("unrecognised file-system failure")]
    Unrecognised,
}

impl FsFault {
    /// Standard I/O errors pass through unchanged; anything else becomes the
    /// stage's unknown-error sentinel.
    pub fn into_sync_error(self, stage: Stage) -> SyncError {
        match self {
            FsFault::Io(e) => SyncError::Io(e),
            FsFault::Unrecognised => SyncError::Unknown(stage),
        }
    }
}
