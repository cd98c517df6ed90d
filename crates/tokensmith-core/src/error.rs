//! Token pipeline errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, resolving or writing tokens.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token source not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: tokensmith_common_core::Error,
    },

    #[error("{}", parse_message(file, *line, *column, message))]
    Parse {
        file: PathBuf,
        line: Option<usize>,
        column: Option<usize>,
        message: String,
    },

    #[error("invalid token '{path}' in {}: {message}", file.display())]
    InvalidToken {
        file: PathBuf,
        path: String,
        message: String,
    },

    #[error("invalid glob '{pattern}': {message}")]
    InvalidGlob { pattern: String, message: String },

    #[error("cyclic reference: {}", chain.join(" -> "))]
    CyclicReference { chain: Vec<String> },

    #[error("unresolved reference '{{{path}}}' in token '{referrer}'")]
    UnresolvedReference { path: String, referrer: String },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: tokensmith_common_core::Error,
    },

    #[error("output {} would be written twice, by {first} and {second}", path.display())]
    OutputCollision {
        path: PathBuf,
        first: String,
        second: String,
    },

    #[error("failed to serialize {target}: {message}")]
    Serialize { target: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn parse_message(file: &std::path::Path, line: Option<usize>, column: Option<usize>, message: &str) -> String {
    match (line, column) {
        (Some(line), Some(column)) => {
            format!("failed to parse {} at {line}:{column}: {message}", file.display())
        }
        _ => format!("failed to parse {}: {message}", file.display()),
    }
}

impl TokenError {
    /// Short stable name of the error kind, used in reports and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SourceNotFound { .. } => "source_not_found",
            Self::Read { .. } => "read",
            Self::Parse { .. } => "parse",
            Self::InvalidToken { .. } => "invalid_token",
            Self::InvalidGlob { .. } => "invalid_glob",
            Self::CyclicReference { .. } => "cyclic_reference",
            Self::UnresolvedReference { .. } => "unresolved_reference",
            Self::Write { .. } => "write",
            Self::OutputCollision { .. } => "output_collision",
            Self::Serialize { .. } => "serialize",
            Self::Io(_) => "io",
        }
    }

    /// Whether the error came from the file system rather than token content.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            Self::SourceNotFound { .. } | Self::Read { .. } | Self::Write { .. } | Self::Io(_)
        )
    }
}

/// Result type for token operations.
pub type TokenResult<T> = Result<T, TokenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_lists_chain() {
        let err = TokenError::CyclicReference {
            chain: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "cyclic reference: a -> b -> a");
        assert_eq!(err.kind(), "cyclic_reference");
    }

    #[test]
    fn test_unresolved_message_names_path_and_referrer() {
        let err = TokenError::UnresolvedReference {
            path: "nonexistent.path".into(),
            referrer: "color.link".into(),
        };
        assert_eq!(
            err.to_string(),
            "unresolved reference '{nonexistent.path}' in token 'color.link'"
        );
    }

    #[test]
    fn test_parse_message_with_position() {
        let err = TokenError::Parse {
            file: PathBuf::from("tokens/color.json"),
            line: Some(3),
            column: Some(7),
            message: "expected value".into(),
        };
        assert_eq!(
            err.to_string(),
            "failed to parse tokens/color.json at 3:7: expected value"
        );
        assert!(!err.is_io());
    }
}
