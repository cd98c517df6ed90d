//! Markdown companions for JSON artifacts.

use super::json::json_outputs;
use super::{Artifact, EmitInput, Emitter};
use crate::error::TokenResult;
use crate::normalize::css_value;
use crate::token::TokenNode;
use std::fmt::Write;
use tokensmith_common_config::ParserConfig;

/// Writes `<artifact>.md` next to every JSON artifact.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocsEmitter;

impl Emitter for DocsEmitter {
    fn name(&self) -> &'static str {
        "docs"
    }

    fn enabled(&self, config: &ParserConfig) -> bool {
        config.docs
    }

    fn emit(&self, input: &EmitInput<'_>) -> TokenResult<Vec<Artifact>> {
        Ok(json_outputs(input)?
            .into_iter()
            .map(|out| {
                let title = if out.group.is_empty() {
                    "Design tokens".to_string()
                } else {
                    out.group.join(".")
                };
                let contents = render_table(&title, &out.tree, input.config.unit_multiplier);
                Artifact::new(out.path.with_extension("md"), contents)
            })
            .collect())
    }
}

fn render_table(title: &str, tree: &TokenNode, unit_multiplier: f64) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {title}\n");
    out.push_str("| Token | Value | Type | Description |\n");
    out.push_str("| --- | --- | --- | --- |\n");
    for (path, token) in tree.leaves() {
        let _ = writeln!(
            out,
            "| `{}` | `{}` | {} | {} |",
            path.join("."),
            escape(&css_value(token, unit_multiplier)),
            escape(token.token_type.as_deref().unwrap_or("")),
            escape(token.description.as_deref().unwrap_or("")),
        );
    }
    out
}

fn escape(cell: &str) -> String {
    cell.replace('|', "\\|").replace('\n', " ")
}
