use thiserror::Error;
use tokensmith_common_config::ConfigError;
use tokensmith_core::TokenError;

/// Watch driver and build-tool integration errors.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("file watcher error: {0}")]
    Notify(#[from] notify::Error),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("token build failed: {0}")]
    Build(#[from] TokenError),

    #[error("no tokio runtime available to run the watch driver")]
    NoRuntime,

    #[error("watch task failed: {0}")]
    Task(String),
}
