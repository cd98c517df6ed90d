//! CLI error handling and formatting.

use thiserror::Error;
use tokensmith_common_config::{ConfigError, EnvError};
use tokensmith_core::TokenError;
use tokensmith_watch::WatchError;

use crate::Exit;

/// CLI error type with context for the user.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        hint: Option<String>,
    },

    #[error("{message}")]
    Io {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{message}")]
    Token {
        message: String,
        #[source]
        source: TokenError,
    },

    #[error("{message}")]
    Watch {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{message}")]
    User {
        message: String,
        hint: Option<String>,
    },

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Get the error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config { .. } => "E001",
            Self::Io { .. } => "E002",
            Self::Token { .. } => "E003",
            Self::Watch { .. } => "E004",
            Self::User { .. } => "E010",
            Self::Other(_) => "E999",
        }
    }

    /// Process exit status for this error
    pub fn exit(&self) -> Exit {
        match self {
            Self::Config { .. } => Exit::ConfigError,
            Self::Io { .. } => Exit::IoError,
            Self::Token { .. } => Exit::TokenError,
            Self::Watch { .. } => Exit::WatchError,
            Self::User { .. } | Self::Other(_) => Exit::GeneralError,
        }
    }

    /// Get hint for this error if available
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Config { hint, .. } | Self::User { hint, .. } => hint.as_deref(),
            Self::Token { source, .. } => token_hint(source),
            Self::Io {
                source: Some(source),
                ..
            } => source.downcast_ref::<TokenError>().and_then(token_hint),
            _ => None,
        }
    }

    /// `error[CODE]: message` plus an optional hint line.
    pub fn render(&self) -> String {
        let mut out = format!("error[{}]: {}", self.code(), self);
        if let Some(hint) = self.hint() {
            out.push_str(&format!("\n  hint: {hint}"));
        }
        out
    }

    pub fn user(message: impl Into<String>, hint: Option<&str>) -> Self {
        Self::User {
            message: message.into(),
            hint: hint.map(str::to_string),
        }
    }
}

fn token_hint(err: &TokenError) -> Option<&'static str> {
    match err {
        TokenError::SourceNotFound { .. } => Some("check paths.input in tokensmith.yaml or pass --input"),
        TokenError::CyclicReference { .. } => {
            Some("break the cycle by pointing one token at a literal value")
        }
        TokenError::OutputCollision { .. } => {
            Some("rename one of the sources, or set includeRootDirName: true")
        }
        _ => None,
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        let hint = match &err {
            ConfigError::NotFound { .. } => Some("run `tokensmith config init` to create one".to_string()),
            ConfigError::EnvVarNotFound { var } => Some(format!("set {var} or use ${{{var}:-default}}")),
            _ => None,
        };
        Self::Config {
            message: err.to_string(),
            source: Some(Box::new(err)),
            hint,
        }
    }
}

impl From<EnvError> for CliError {
    fn from(err: EnvError) -> Self {
        ConfigError::from(err).into()
    }
}

impl From<TokenError> for CliError {
    fn from(err: TokenError) -> Self {
        if err.is_io() {
            return Self::Io {
                message: err.to_string(),
                source: Some(Box::new(err)),
            };
        }
        Self::Token {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<WatchError> for CliError {
    fn from(err: WatchError) -> Self {
        match err {
            WatchError::Build(e) => e.into(),
            WatchError::Config(e) => e.into(),
            other => Self::Watch {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}
