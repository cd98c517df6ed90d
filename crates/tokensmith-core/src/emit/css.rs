//! CSS custom properties target.

use super::scss::prefixed;
use super::{Artifact, EmitInput, Emitter, CSS_HEADER};
use crate::error::TokenResult;
use crate::normalize::flat_tokens;
use indexmap::map::Entry;
use indexmap::IndexMap;
use tokensmith_common_config::{CssVarsPrefer, ParserConfig};
use tracing::debug;

/// Writes every token as `--name: value;` inside `css.selector`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CssEmitter;

impl Emitter for CssEmitter {
    fn name(&self) -> &'static str {
        "css"
    }

    fn enabled(&self, config: &ParserConfig) -> bool {
        config.css.enabled
    }

    fn emit(&self, input: &EmitInput<'_>) -> TokenResult<Vec<Artifact>> {
        let config = input.config;
        let vars = collect_vars(input);

        let mut out = String::new();
        out.push_str(CSS_HEADER);
        out.push('\n');
        out.push_str(&config.css.selector);
        out.push_str(" {\n");
        for (name, value) in &vars {
            out.push_str(&format!("  --{name}: {value};\n"));
        }
        out.push_str("}\n");

        Ok(vec![Artifact::new(&config.css.file, out)])
    }
}

/// Variable name to value, applying `cssVarsPrefer` over processing order.
///
/// With `last` a redefinition updates the value but keeps the position of
/// the first definition.
fn collect_vars(input: &EmitInput<'_>) -> IndexMap<String, String> {
    let config = input.config;
    let mut vars: IndexMap<String, String> = IndexMap::new();

    for source in &input.forest.sources {
        for token in flat_tokens(&source.tree, config.unit_multiplier) {
            if !token.token.build.exports_css() {
                continue;
            }
            let name = prefixed(&config.css.prefix, &token.name);
            match vars.entry(name) {
                Entry::Vacant(slot) => {
                    slot.insert(token.value);
                }
                Entry::Occupied(mut slot) => {
                    debug!(
                        variable = %slot.key(),
                        source = %source.relative.display(),
                        prefer = ?config.css_vars_prefer,
                        "css variable defined more than once"
                    );
                    if config.css_vars_prefer == CssVarsPrefer::Last {
                        slot.insert(token.value);
                    }
                }
            }
        }
    }
    vars
}
