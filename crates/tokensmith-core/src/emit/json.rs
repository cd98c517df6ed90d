//! JSON target.

use super::{to_json_text, Artifact, EmitInput, Emitter};
use crate::error::{TokenError, TokenResult};
use crate::normalize::{shape, ShapeOptions};
use crate::token::TokenNode;
use std::collections::HashMap;
use std::path::PathBuf;
use tokensmith_common_config::ParserConfig;

/// Writes one JSON file per source, or a single merged file.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEmitter;

/// A JSON artifact's path, its dotted group (empty for the merged file)
/// and the tree it holds.
pub struct JsonOutput {
    pub path: PathBuf,
    pub group: Vec<String>,
    pub tree: TokenNode,
}

/// The trees the JSON target writes, in processing order.
///
/// Separate-files mode keeps each source's relative path (prefixed with
/// the root directory name when `includeRootDirName` is set); merged mode
/// nests every source under its group path in `jsonFile`. Two sources
/// mapping to the same file (same relative path under different roots
/// without `includeRootDirName`) are an error.
pub fn json_outputs(input: &EmitInput<'_>) -> TokenResult<Vec<JsonOutput>> {
    let config = input.config;
    if !config.use_tokens_in_separate_files {
        return Ok(vec![JsonOutput {
            path: PathBuf::from(&config.json_file),
            group: Vec::new(),
            tree: input.forest.nested_tree(config.include_root_dir_name),
        }]);
    }

    let mut claimed = HashMap::new();
    let mut outputs = Vec::with_capacity(input.forest.len());
    for source in &input.forest.sources {
        let mut path = PathBuf::new();
        if config.include_root_dir_name && !source.root_name.is_empty() {
            path.push(&source.root_name);
        }
        path.push(source.relative.with_extension("json"));

        if let Some(first) = claimed.insert(path.clone(), source.file_path()) {
            return Err(TokenError::OutputCollision {
                path,
                first: first.display().to_string(),
                second: source.file_path().display().to_string(),
            });
        }
        outputs.push(JsonOutput {
            path,
            group: source.group.clone(),
            tree: source.tree.clone(),
        });
    }
    Ok(outputs)
}

impl Emitter for JsonEmitter {
    fn name(&self) -> &'static str {
        "json"
    }

    fn enabled(&self, _config: &ParserConfig) -> bool {
        true
    }

    fn emit(&self, input: &EmitInput<'_>) -> TokenResult<Vec<Artifact>> {
        let opts = ShapeOptions::from_config(input.config);
        json_outputs(input)?
            .into_iter()
            .map(|out| {
                let text = to_json_text(&shape(&out.tree, &opts), input.config.pretty, "json")?;
                Ok(Artifact::new(out.path, text))
            })
            .collect()
    }
}
