//! Error types shared by the Tokensmith crates.

use std::fmt;
use thiserror::Error;

/// Stable, machine-readable error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(&'static str);

impl ErrorCode {
    pub const FILE_NOT_FOUND: Self = Self("FS001");
    pub const FILE_READ_ERROR: Self = Self("FS002");
    pub const FILE_WRITE_ERROR: Self = Self("FS003");
    pub const DIR_READ_ERROR: Self = Self("FS004");
    pub const INVALID_ENCODING: Self = Self("FS005");

    /// The raw code string.
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Broad error category, used in log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    FileSystem,
    Encoding,
}

/// The main error type for Tokensmith file plumbing.
#[derive(Error, Debug)]
pub enum Error {
    /// File system error.
    #[error("{message}")]
    FileSystem {
        code: ErrorCode,
        message: String,
        path: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// File contents could not be decoded as text.
    #[error("{message}")]
    Encoding {
        message: String,
        path: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Create a file-not-found error.
    pub fn file_not_found(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::FileSystem {
            code: ErrorCode::FILE_NOT_FOUND,
            message: format!("file not found: {path}"),
            path: Some(path),
            source: None,
        }
    }

    /// Error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::FileSystem { code, .. } => *code,
            Self::Encoding { .. } => ErrorCode::INVALID_ENCODING,
        }
    }

    /// Category for this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::FileSystem { .. } => ErrorCategory::FileSystem,
            Self::Encoding { .. } => ErrorCategory::Encoding,
        }
    }

    /// Path the error refers to, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::FileSystem { path, .. } => path.as_deref(),
            Self::Encoding { path, .. } => Some(path),
        }
    }
}

/// Result type alias using Tokensmith's Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_not_found_carries_path() {
        let err = Error::file_not_found("tokens/colors.json");
        assert_eq!(err.code(), ErrorCode::FILE_NOT_FOUND);
        assert_eq!(err.category(), ErrorCategory::FileSystem);
        assert_eq!(err.path(), Some("tokens/colors.json"));
        assert_eq!(err.to_string(), "file not found: tokens/colors.json");
    }

    #[test]
    fn test_encoding_error() {
        let err = Error::Encoding {
            message: "file is not valid UTF-8: a.json".to_string(),
            path: "a.json".to_string(),
            source: None,
        };
        assert_eq!(err.code(), ErrorCode::INVALID_ENCODING);
        assert_eq!(err.category(), ErrorCategory::Encoding);
        assert_eq!(err.path(), Some("a.json"));
        assert_eq!(ErrorCode::FILE_WRITE_ERROR.as_str(), "FS003");
    }
}
