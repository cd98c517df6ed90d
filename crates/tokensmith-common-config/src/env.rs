//! Environment variable handling.

use crate::types::ParserConfig;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable errors.
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },
}

/// Environment variable names.
pub mod vars {
    pub const TOKENSMITH_CONFIG: &str = "TOKENSMITH_CONFIG";
    pub const TOKENSMITH_INPUT: &str = "TOKENSMITH_INPUT";
    pub const TOKENSMITH_OUTPUT: &str = "TOKENSMITH_OUTPUT";
    pub const TOKENSMITH_PRETTY: &str = "TOKENSMITH_PRETTY";
    pub const TOKENSMITH_LOG_LEVEL: &str = "TOKENSMITH_LOG_LEVEL";
    pub const NODE_ENV: &str = "NODE_ENV";
}

/// Environment access.
pub struct Environment {
    _guard: (),
}

impl Environment {
    /// Initialize environment from .env files in the working directory.
    pub fn init() -> Self {
        // Missing files are fine; later files override earlier ones
        let _ = dotenvy::from_filename(".env");
        let _ = dotenvy::from_filename(".env.local");

        if let Ok(mode) = env::var(vars::NODE_ENV) {
            let _ = dotenvy::from_filename(format!(".env.{}", mode));
        }

        Self { _guard: () }
    }

    /// Get an optional string variable.
    pub fn get(var: &str) -> Option<String> {
        env::var(var).ok().filter(|v| !v.is_empty())
    }

    /// Get a boolean variable.
    pub fn get_bool(var: &str) -> Result<Option<bool>, EnvError> {
        match Self::get(var) {
            None => Ok(None),
            Some(v) => match v.to_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(Some(true)),
                "false" | "0" | "no" => Ok(Some(false)),
                _ => Err(EnvError::InvalidValue {
                    var: var.to_string(),
                    message: format!("expected a boolean, got '{v}'"),
                }),
            },
        }
    }

    /// Apply `TOKENSMITH_*` overrides on top of a parsed config.
    pub fn apply_overrides(config: &mut ParserConfig) -> Result<(), EnvError> {
        if let Some(input) = Self::get(vars::TOKENSMITH_INPUT) {
            config.paths.input = env::split_paths(&input).collect::<Vec<PathBuf>>();
        }
        if let Some(output) = Self::get(vars::TOKENSMITH_OUTPUT) {
            config.paths.output = PathBuf::from(output);
        }
        if let Some(pretty) = Self::get_bool(vars::TOKENSMITH_PRETTY)? {
            config.pretty = pretty;
        }
        Ok(())
    }
}
