//! Tokensmith design-token pipeline.
//!
//! This crate loads JSON token trees, resolves `{path}` references across
//! them, normalizes their shape and emits JSON, SCSS, CSS, themed bundles,
//! a generated entry module and Markdown docs.

pub mod emit;
pub mod error;
pub mod forest;
pub mod loader;
pub mod naming;
pub mod normalize;
pub mod pipeline;
pub mod reference;
pub mod resolver;
pub mod token;

pub use emit::{Artifact, EmitInput, Emitter};
pub use error::{TokenError, TokenResult};
pub use forest::{TokenForest, TokenSource};
pub use loader::{load_sources, LoadOutcome, SkippedFile, Theme, TokenLoader};
pub use normalize::{shape, ShapeOptions};
pub use pipeline::{Build, BuildReport, CheckReport, Pipeline};
pub use resolver::{resolve_forest, resolve_theme};
pub use token::{Token, TokenNode, TokenValue};
