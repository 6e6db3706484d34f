use std::fmt::{self, Display, Formatter};
use thiserror::Error;

/// Errors raised while provisioning a workload or tracking runtime state.
///
/// Every variant carries a message that names the offending entity (secret,
/// machine, field) so it can be surfaced to users verbatim.
#[derive(Error, Debug)]
pub enum WorkspaceError {
    /// A required annotation or field is missing or malformed.
    Configuration(String),
    /// The environment is structurally inconsistent.
    Validation(String),
    /// The entity is already present, or a single-instance resource is claimed twice.
    Conflict(String),
    /// The targeted runtime state, machine or server does not exist.
    NotFound(String),
    Internal(String),
    Io(#[from] std::io::Error),
    Serialization(String),
}

/// Category of a [`WorkspaceError`], independent of its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Validation,
    Conflict,
    NotFound,
    Internal,
    Io,
    Serialization,
}

impl WorkspaceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkspaceError::Configuration(_) => ErrorKind::Configuration,
            WorkspaceError::Validation(_) => ErrorKind::Validation,
            WorkspaceError::Conflict(_) => ErrorKind::Conflict,
            WorkspaceError::NotFound(_) => ErrorKind::NotFound,
            WorkspaceError::Internal(_) => ErrorKind::Internal,
            WorkspaceError::Io(_) => ErrorKind::Io,
            WorkspaceError::Serialization(_) => ErrorKind::Serialization,
        }
    }

    /// The bare message without the category prefix used by `Display`.
    pub fn message(&self) -> String {
        match self {
            WorkspaceError::Configuration(s)
            | WorkspaceError::Validation(s)
            | WorkspaceError::Conflict(s)
            | WorkspaceError::NotFound(s)
            | WorkspaceError::Internal(s)
            | WorkspaceError::Serialization(s) => s.clone(),
            WorkspaceError::Io(e) => e.to_string(),
        }
    }
}

impl Display for WorkspaceError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            WorkspaceError::Configuration(s) => write!(f, "Configuration error: {}", s),
            WorkspaceError::Validation(s) => write!(f, "Validation error: {}", s),
            WorkspaceError::Conflict(s) => write!(f, "Conflict: {}", s),
            WorkspaceError::NotFound(s) => write!(f, "Not found: {}", s),
            WorkspaceError::Internal(s) => write!(f, "Internal error: {}", s),
            WorkspaceError::Io(e) => write!(f, "I/O error: {}", e),
            WorkspaceError::Serialization(s) => write!(f, "Serialization error: {}", s),
        }
    }
}

impl From<serde_yaml_ng::Error> for WorkspaceError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        WorkspaceError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for WorkspaceError {
    fn from(err: serde_json::Error) -> Self {
        WorkspaceError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WorkspaceError>;
