//! Error types for the pomfix core library.

use std::io;
use std::path::{Path, PathBuf};

/// Top-level error enum for the pomfix core library.
#[derive(Debug, thiserror::Error)]
pub enum PomfixError {
    #[error("{}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("{}: no such file", path.display())]
    NotFound { path: PathBuf },

    #[error("{}: permission denied", path.display())]
    PermissionDenied { path: PathBuf },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("${{{key}}} has no value (in {target})")]
    MissingKey { key: String, target: String },

    #[error("{}: no line starting with '{keyword}'", path.display())]
    VersionDeclarationNotFound { keyword: String, path: PathBuf },
}

impl PomfixError {
    /// Classify an I/O failure on `path` into the matching variant.
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => PomfixError::NotFound {
                path: path.to_path_buf(),
            },
            io::ErrorKind::PermissionDenied => PomfixError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => PomfixError::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }

    pub fn parse(path: &Path, message: impl Into<String>) -> Self {
        PomfixError::Parse {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    pub fn missing_key(key: impl Into<String>, target: impl Into<String>) -> Self {
        PomfixError::MissingKey {
            key: key.into(),
            target: target.into(),
        }
    }

    /// Short classification printed in front of the error detail.
    pub fn category(&self) -> &'static str {
        match self {
            PomfixError::Parse { .. } => "parse error",
            PomfixError::NotFound { .. } => "not found",
            PomfixError::PermissionDenied { .. } => "permission denied",
            PomfixError::Io { .. } => "io error",
            PomfixError::MissingKey { .. } => "missing key",
            PomfixError::VersionDeclarationNotFound { .. } => "version declaration not found",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            PomfixError::Parse { .. } => exit_codes::PARSE_ERROR,
            PomfixError::NotFound { .. } => exit_codes::NOT_FOUND,
            PomfixError::PermissionDenied { .. } => exit_codes::PERMISSION_DENIED,
            PomfixError::Io { .. } => exit_codes::IO_ERROR,
            PomfixError::MissingKey { .. } => exit_codes::MISSING_KEY,
            PomfixError::VersionDeclarationNotFound { .. } => exit_codes::VERSION_NOT_FOUND,
        }
    }
}

pub type PomfixResult<T> = Result<T, PomfixError>;

/// Process exit codes. The Makefile branches on these, so the values are
/// part of the interface and must not be renumbered.
pub mod exit_codes {
    /// Success, whether or not anything was rewritten
    pub const SUCCESS: u8 = 0;
    /// Unexpected failure outside the classified categories
    pub const INTERNAL_ERROR: u8 = 1;
    /// Invalid command-line usage
    pub const BAD_ARGUMENTS: u8 = 2;
    /// A required file does not exist
    pub const NOT_FOUND: u8 = 3;
    /// A required path cannot be read or written
    pub const PERMISSION_DENIED: u8 = 4;
    /// Any other I/O failure
    pub const IO_ERROR: u8 = 5;
    /// Malformed descriptor, cache entry, or XML target
    pub const PARSE_ERROR: u8 = 6;
    /// A placeholder references a key with no value
    pub const MISSING_KEY: u8 = 7;
    /// The build file has no version declaration line
    pub const VERSION_NOT_FOUND: u8 = 8;
    /// The build file version was rewritten; re-run the whole build
    pub const RESTART_REQUIRED: u8 = 75;
}
