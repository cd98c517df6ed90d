//! Common test utilities for CLI testing.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::{tempdir, TempDir};

/// A project directory with a `tokens/` input root.
pub struct TestContext {
    pub temp_dir: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        std::fs::create_dir_all(temp_dir.path().join("tokens")).expect("Failed to create tokens dir");
        Self { temp_dir }
    }

    /// Get path to temp directory
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write a token source under `tokens/`.
    pub fn with_tokens(self, relative: &str, tokens: serde_json::Value) -> Self {
        let path = self.path().join("tokens").join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create source dir");
        }
        std::fs::write(&path, serde_json::to_string_pretty(&tokens).unwrap())
            .expect("Failed to write tokens");
        self
    }

    /// Write `tokensmith.yaml`.
    pub fn with_config(self, config: &str) -> Self {
        std::fs::write(self.config_path(), config).expect("Failed to write config");
        self
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join("tokensmith.yaml")
    }

    pub fn output(&self, relative: &str) -> PathBuf {
        self.path().join("dist/tokens").join(relative)
    }

    pub fn read_output(&self, relative: &str) -> String {
        std::fs::read_to_string(self.output(relative)).expect("Failed to read output")
    }

    /// Create a command configured for this context
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("tokensmith").expect("Binary not found");
        cmd.current_dir(self.path())
            .env_remove("TOKENSMITH_CONFIG")
            .env_remove("TOKENSMITH_INPUT")
            .env_remove("TOKENSMITH_OUTPUT")
            .env_remove("TOKENSMITH_PRETTY")
            .env_remove("TOKENSMITH_LOG_LEVEL")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1");
        cmd
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
