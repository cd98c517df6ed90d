//! Artifact emitters.
//!
//! Emitters are pure: they turn resolved, in-memory token data into
//! [`Artifact`]s. Nothing here touches the file system; the pipeline writes
//! the artifacts once every emitter has succeeded.

pub mod css;
pub mod docs;
pub mod json;
pub mod module;
pub mod scss;
pub mod themes;

use crate::error::TokenResult;
use crate::forest::TokenForest;
use crate::loader::Theme;
use std::path::PathBuf;
use tokensmith_common_config::ParserConfig;

pub use css::CssEmitter;
pub use docs::DocsEmitter;
pub use json::JsonEmitter;
pub use module::ModuleEmitter;
pub use scss::ScssEmitter;
pub use themes::ThemesEmitter;

/// Banner for CSS output.
pub const CSS_HEADER: &str = "/* Generated by tokensmith. Do not edit. */";
/// Banner for SCSS and TypeScript output.
pub const LINE_HEADER: &str = "// Generated by tokensmith. Do not edit.";

/// One output file, relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub contents: String,
}

impl Artifact {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// Everything an emitter may read.
#[derive(Debug, Clone, Copy)]
pub struct EmitInput<'a> {
    /// The resolved forest.
    pub forest: &'a TokenForest,
    /// Resolved theme trees.
    pub themes: &'a [Theme],
    pub config: &'a ParserConfig,
}

/// An output target.
pub trait Emitter: Send + Sync {
    /// Target name used in logs.
    fn name(&self) -> &'static str;

    /// Whether the target is switched on for this config.
    fn enabled(&self, config: &ParserConfig) -> bool;

    /// Produce this target's artifacts.
    fn emit(&self, input: &EmitInput<'_>) -> TokenResult<Vec<Artifact>>;
}

/// Every built-in emitter, in output order.
pub fn default_emitters() -> Vec<Box<dyn Emitter>> {
    vec![
        Box::new(JsonEmitter),
        Box::new(DocsEmitter),
        Box::new(ScssEmitter),
        Box::new(CssEmitter),
        Box::new(ThemesEmitter),
        Box::new(ModuleEmitter),
    ]
}

/// Serialize JSON output, honoring `pretty`.
pub(crate) fn to_json_text(
    value: &serde_json::Value,
    pretty: bool,
    target: &str,
) -> TokenResult<String> {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    text.map(|mut s| {
        s.push('\n');
        s
    })
    .map_err(|e| crate::error::TokenError::Serialize {
        target: target.to_string(),
        message: e.to_string(),
    })
}
