//! Themed bundle target.

use super::{to_json_text, Artifact, EmitInput, Emitter};
use crate::error::TokenResult;
use crate::normalize::{shape, ShapeOptions};
use serde_json::{Map, Value};
use tokensmith_common_config::ParserConfig;

/// Writes `themesOutFile`: one resolved, normalized tree per theme.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThemesEmitter;

impl Emitter for ThemesEmitter {
    fn name(&self) -> &'static str {
        "themes"
    }

    fn enabled(&self, config: &ParserConfig) -> bool {
        config.themes_dir.is_some()
    }

    fn emit(&self, input: &EmitInput<'_>) -> TokenResult<Vec<Artifact>> {
        let opts = ShapeOptions::from_config(input.config);
        let bundle: Map<String, Value> = input
            .themes
            .iter()
            .map(|theme| (theme.name.clone(), shape(&theme.tree, &opts)))
            .collect();

        let text = to_json_text(&Value::Object(bundle), input.config.pretty, "themes")?;
        Ok(vec![Artifact::new(&input.config.themes_out_file, text)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::TokenForest;
    use crate::loader::Theme;
    use crate::token::TokenNode;
    use serde_json::json;

    #[test]
    fn test_bundle_keyed_by_theme() {
        let forest = TokenForest::default();
        let themes = vec![
            Theme {
                name: "dark".into(),
                tree: TokenNode::from_json(&json!({ "bg": "#000" })).unwrap(),
            },
            Theme {
                name: "light".into(),
                tree: TokenNode::from_json(&json!({ "bg": "#fff" })).unwrap(),
            },
        ];
        let config = ParserConfig {
            themes_dir: Some("themes".into()),
            pretty: false,
            ..ParserConfig::default()
        };
        let input = EmitInput {
            forest: &forest,
            themes: &themes,
            config: &config,
        };

        assert!(ThemesEmitter.enabled(&config));
        let artifacts = ThemesEmitter.emit(&input).unwrap();
        assert_eq!(artifacts[0].path, std::path::PathBuf::from("themes.json"));
        assert_eq!(
            artifacts[0].contents,
            "{\"dark\":{\"bg\":\"#000\"},\"light\":{\"bg\":\"#fff\"}}\n"
        );
    }
}
