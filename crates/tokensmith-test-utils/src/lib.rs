//! Test utilities for Tokensmith crates.

use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokensmith_common_config::ParserConfig;

/// Creates a temporary directory that is cleaned up on drop.
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// A throwaway project: `tokens/` sources, optional `themes/` and a
/// `dist/` output directory, all inside one temp dir.
pub struct TokenFixture {
    dir: TempDir,
}

impl TokenFixture {
    pub fn new() -> Self {
        let fixture = Self { dir: temp_dir() };
        std::fs::create_dir_all(fixture.tokens_dir()).expect("Failed to create tokens dir");
        fixture
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn tokens_dir(&self) -> PathBuf {
        self.root().join("tokens")
    }

    pub fn themes_dir(&self) -> PathBuf {
        self.root().join("themes")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root().join("dist")
    }

    /// Write a token file under `tokens/`.
    pub fn source(&self, relative: &str, tokens: Value) -> PathBuf {
        self.write_json(self.tokens_dir().join(relative), &tokens)
    }

    /// Write raw text under `tokens/`, for malformed inputs.
    pub fn raw_source(&self, relative: &str, text: &str) -> PathBuf {
        self.write(self.tokens_dir().join(relative), text)
    }

    /// Write a theme override file under `themes/`.
    pub fn theme(&self, relative: &str, tokens: Value) -> PathBuf {
        self.write_json(self.themes_dir().join(relative), &tokens)
    }

    /// Write any file relative to the project root.
    pub fn file(&self, relative: &str, text: &str) -> PathBuf {
        self.write(self.root().join(relative), text)
    }

    /// Read an output artifact.
    pub fn output(&self, relative: &str) -> String {
        let path = self.output_dir().join(relative);
        std::fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("Failed to read {}: {e}", path.display()))
    }

    /// Parse an output artifact as JSON.
    pub fn output_json(&self, relative: &str) -> Value {
        serde_json::from_str(&self.output(relative)).expect("Output is not valid JSON")
    }

    pub fn output_exists(&self, relative: &str) -> bool {
        self.output_dir().join(relative).exists()
    }

    /// Default config pointed at this fixture.
    pub fn config(&self) -> ParserConfig {
        let mut config = ParserConfig::default();
        config.paths.input = vec![self.tokens_dir()];
        config.paths.output = self.output_dir();
        config
    }

    fn write_json(&self, path: PathBuf, tokens: &Value) -> PathBuf {
        let text = serde_json::to_string_pretty(tokens).expect("Failed to serialize tokens");
        self.write(path, &text)
    }

    fn write(&self, path: PathBuf, text: &str) -> PathBuf {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create fixture dir");
        }
        std::fs::write(&path, text).expect("Failed to write fixture file");
        path
    }
}

impl Default for TokenFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Assert that a Result is Ok and return the value.
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
}

/// Assert that a Result is Err and return the error.
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        match $expr {
            Ok(v) => panic!("Expected Err, got Ok: {:?}", v),
            Err(e) => e,
        }
    };
}
