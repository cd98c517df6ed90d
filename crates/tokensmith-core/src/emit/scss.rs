//! SCSS variables target.

use super::{Artifact, EmitInput, Emitter, LINE_HEADER};
use crate::error::{TokenError, TokenResult};
use crate::normalize::{flat_tokens, FlatToken};
use tokensmith_common_config::{ParserConfig, ScssConfig};

const INDEX_MODULE: &str = "index";

/// Writes `$name: value;` declarations.
///
/// Separate-files mode writes one `_<group>.scss` partial per source plus
/// an `_index.scss` forwarding them all; merged mode writes `scss.file`.
/// A source whose partial would be `_index.scss` itself is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScssEmitter;

impl Emitter for ScssEmitter {
    fn name(&self) -> &'static str {
        "scss"
    }

    fn enabled(&self, config: &ParserConfig) -> bool {
        config.scss.enabled
    }

    fn emit(&self, input: &EmitInput<'_>) -> TokenResult<Vec<Artifact>> {
        let config = input.config;
        let scss = &config.scss;

        if !config.use_tokens_in_separate_files {
            let mut body = String::new();
            for source in &input.forest.sources {
                body.push_str(&declarations(
                    &flat_tokens(&source.tree, config.unit_multiplier),
                    scss,
                ));
            }
            return Ok(vec![Artifact::new(&scss.file, with_header(&body))]);
        }

        let mut artifacts = Vec::with_capacity(input.forest.len() + 1);
        let mut index = String::new();
        for source in &input.forest.sources {
            let module = source.group.join("-");
            if module == INDEX_MODULE {
                return Err(TokenError::OutputCollision {
                    path: format!("_{INDEX_MODULE}.scss").into(),
                    first: source.file_path().display().to_string(),
                    second: "the SCSS forwarding index".to_string(),
                });
            }
            let body = declarations(&flat_tokens(&source.tree, config.unit_multiplier), scss);
            artifacts.push(Artifact::new(format!("_{module}.scss"), with_header(&body)));
            index.push_str(&format!("@forward \"{module}\";\n"));
        }
        artifacts.push(Artifact::new(format!("_{INDEX_MODULE}.scss"), with_header(&index)));
        Ok(artifacts)
    }
}

fn with_header(body: &str) -> String {
    format!("{LINE_HEADER}\n{body}")
}

fn declarations(tokens: &[FlatToken], scss: &ScssConfig) -> String {
    let default = if scss.default_flag { " !default" } else { "" };
    tokens
        .iter()
        .filter(|t| t.token.build.exports_scss())
        .map(|t| format!("${}: {}{};\n", prefixed(&scss.prefix, &t.name), t.value, default))
        .collect()
}

/// Join a configured prefix and a token name with `-`.
pub(crate) fn prefixed(prefix: &str, name: &str) -> String {
    let prefix = prefix.trim_matches('-');
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}-{name}")
    }
}
