use std::path::PathBuf;
use thiserror::Error;

use crate::types::{ParseModeError, PathType};

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Permission denied: {path}")]
    AccessDenied { path: PathBuf },

    #[error("Cannot {operation} {path}: expected {expected} but found existing {actual} (requires --{required_flag})")]
    PathConflict {
        operation: &'static str,
        path: PathBuf,
        expected: PathType,
        actual: PathType,
        required_flag: &'static str,
    },

    #[error("Privilege escalation failed on {host}: {stderr}")]
    PrivilegeEscalationFailed { host: String, stderr: String },

    #[error("Failed to resolve {kind} '{name}' to a numeric id")]
    AttributeResolution { kind: &'static str, name: String },

    #[error("Remote command failed on {host} (exit code {code}): {command}: {stderr}")]
    RemoteCommandFailed {
        host: String,
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("Unexpected stat output for {path}: {output:?}")]
    StatParse { path: PathBuf, output: String },

    #[error(transparent)]
    InvalidMode(#[from] ParseModeError),

    #[error("Invalid driver target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("Invalid driver configuration: {0}")]
    Configuration(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DriverError {
    /// Classify an `io::Error` for `path` into the driver taxonomy
    pub fn from_io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        let path = path.into();
        match error.kind() {
            std::io::ErrorKind::NotFound => DriverError::NotFound { path },
            std::io::ErrorKind::PermissionDenied => DriverError::AccessDenied { path },
            _ => DriverError::Io {
                path,
                source: error,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, DriverError>;
