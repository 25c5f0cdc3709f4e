use thiserror::Error;

use crate::handle::HandleKind;

/// Failure of a capability operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FsError {
    #[error("entry not found: {0}")]
    NotFound(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("{name} is not a {expected}")]
    TypeMismatch { name: String, expected: HandleKind },
    #[error("entry already exists: {0}")]
    AlreadyExists(String),
    #[error("invalid entry name: {0:?}")]
    InvalidName(String),
    #[error("directory not empty: {0}")]
    NotEmpty(String),
    #[error("malformed content in {name}: {reason}")]
    MalformedContent { name: String, reason: String },
    #[error("{op} failed: {reason}")]
    Io { op: &'static str, reason: String },
}

/// Coarse classification used by callers to decide how loudly to report a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The user dismissed a prompt. Never reported.
    UserCancelled,
    PermissionDenied,
    NotFound,
    MalformedContent,
    Io,
}

impl FsError {
    pub fn io(op: &'static str, err: impl std::fmt::Display) -> Self {
        FsError::Io {
            op,
            reason: err.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FsError::NotFound(_) => ErrorKind::NotFound,
            FsError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            FsError::MalformedContent { .. } => ErrorKind::MalformedContent,
            FsError::TypeMismatch { .. }
            | FsError::AlreadyExists(_)
            | FsError::InvalidName(_)
            | FsError::NotEmpty(_)
            | FsError::Io { .. } => ErrorKind::Io,
        }
    }
}
