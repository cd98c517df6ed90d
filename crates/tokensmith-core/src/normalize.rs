//! Output shaping.
//!
//! Turns resolved token trees into the JSON shape the config asks for and
//! into the flat name/value list the stylesheet emitters consume.

use crate::naming::{apply_case, to_kebab};
use crate::token::{Token, TokenNode, TokenValue};
use serde_json::{Map, Number, Value};
use std::collections::HashSet;
use tokensmith_common_config::{NameCase, ParserConfig, ServiceFields};
use tracing::debug;

/// Options controlling the JSON shape of a tree.
#[derive(Debug, Clone)]
pub struct ShapeOptions {
    pub fields: ServiceFields,
    pub case: NameCase,
    pub flatten: bool,
    pub separator: String,
}

impl ShapeOptions {
    pub fn from_config(config: &ParserConfig) -> Self {
        Self {
            fields: config.keep_service_fields.clone(),
            case: config.naming.case,
            flatten: config.flatten,
            separator: config.flatten_separator.clone(),
        }
    }
}

impl Default for ShapeOptions {
    fn default() -> Self {
        Self::from_config(&ParserConfig::default())
    }
}

/// Shape a whole tree.
///
/// The case transform applies to tree keys (group and token names), never
/// to token field names.
pub fn shape(node: &TokenNode, opts: &ShapeOptions) -> Value {
    if opts.flatten {
        let mut out = Map::new();
        for (path, token) in node.leaves() {
            let key = path
                .iter()
                .map(|segment| apply_case(segment, opts.case))
                .collect::<Vec<_>>()
                .join(&opts.separator);
            insert_key(&mut out, key, shape_token(token, &opts.fields));
        }
        return Value::Object(out);
    }
    shape_nested(node, opts)
}

fn shape_nested(node: &TokenNode, opts: &ShapeOptions) -> Value {
    match node {
        TokenNode::Leaf(token) => shape_token(token, &opts.fields),
        TokenNode::Group(children) => {
            let mut out = Map::with_capacity(children.len());
            for (key, child) in children {
                insert_key(&mut out, apply_case(key, opts.case), shape_nested(child, opts));
            }
            Value::Object(out)
        }
    }
}

/// Keys that collide after case conversion or flattening keep the later value.
fn insert_key(out: &mut Map<String, Value>, key: String, value: Value) {
    if out.contains_key(&key) {
        debug!(key = %key, "output key produced more than once, later token wins");
    }
    out.insert(key, value);
}

/// Shape one leaf: a bare value when nothing but the value survives,
/// otherwise an object in the source's key style.
pub fn shape_token(token: &Token, fields: &ServiceFields) -> Value {
    let mut kept = Map::new();
    let style = token.style;

    let keep_text = |name: &str, value: &Option<String>, kept: &mut Map<String, Value>| {
        if let Some(v) = value {
            if fields.keeps(name) {
                kept.insert(style.key(name), Value::String(v.clone()));
            }
        }
    };
    keep_text("type", &token.token_type, &mut kept);
    keep_text("unit", &token.unit, &mut kept);
    keep_text("description", &token.description, &mut kept);
    keep_text("category", &token.category, &mut kept);

    if fields.keeps("meta") {
        let meta = meta_object(token);
        if !meta.is_empty() {
            kept.insert("meta".to_string(), Value::Object(meta));
        }
    }
    for (key, value) in &token.extra {
        if fields.keeps(key.trim_start_matches('$')) {
            kept.insert(key.clone(), value.clone());
        }
    }

    if kept.is_empty() {
        return token.value.to_json();
    }

    let mut out = Map::with_capacity(kept.len() + 1);
    out.insert(style.key("value"), token.value.to_json());
    out.extend(kept);
    Value::Object(out)
}

fn meta_object(token: &Token) -> Map<String, Value> {
    let mut meta = Map::new();
    if let Some(css) = token.build.css {
        meta.insert("css".to_string(), Value::Bool(css));
    }
    if let Some(scss) = token.build.scss {
        meta.insert("scss".to_string(), Value::Bool(scss));
    }
    if token.build.multiply {
        meta.insert("multiply".to_string(), Value::Bool(true));
    }
    meta.extend(token.meta.iter().map(|(k, v)| (k.clone(), v.clone())));
    meta
}

/// A token flattened for stylesheet output.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatToken {
    /// Kebab-cased path joined with `-`.
    pub name: String,
    /// Stylesheet text of the value.
    pub value: String,
    pub token: Token,
}

/// Flatten a tree for CSS or SCSS output.
pub fn flat_tokens(tree: &TokenNode, unit_multiplier: f64) -> Vec<FlatToken> {
    let mut seen = HashSet::new();
    tree.leaves()
        .into_iter()
        .map(|(path, token)| {
            let name = css_name(&path);
            if !seen.insert(name.clone()) {
                debug!(name = %name, path = %path.join("."), "stylesheet name produced more than once");
            }
            FlatToken {
                name,
                value: css_value(token, unit_multiplier),
                token: token.clone(),
            }
        })
        .collect()
}

/// Stylesheet name of a token path.
pub fn css_name(path: &[String]) -> String {
    path.iter()
        .map(|segment| to_kebab(segment))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Stylesheet text of a token's value, with multiplier and unit applied.
pub fn css_value(token: &Token, unit_multiplier: f64) -> String {
    match &token.value {
        TokenValue::Number(n) => {
            let number = if token.build.multiply {
                multiply(n, unit_multiplier)
            } else {
                n.to_string()
            };
            match &token.unit {
                Some(unit) => format!("{number}{unit}"),
                None => number,
            }
        }
        other => other.to_string(),
    }
}

fn multiply(n: &Number, factor: f64) -> String {
    match n.as_f64() {
        Some(v) => format_number(v * factor),
        None => n.to_string(),
    }
}

fn format_number(v: f64) -> String {
    // Round away float noise such as 0.30000000000000004
    let rounded = (v * 1e6).round() / 1e6;
    format!("{rounded}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(value: Value) -> TokenNode {
        TokenNode::from_json(&value).unwrap()
    }

    #[test]
    fn test_keep_all_preserves_key_style() {
        let t = tree(json!({
            "a": { "$value": "#fff", "$type": "color", "$description": "bg" },
            "b": { "value": 4, "unit": "px" },
            "c": 1
        }));
        let shaped = shape(&t, &ShapeOptions::default());
        assert_eq!(
            shaped,
            json!({
                "a": { "$value": "#fff", "$type": "color", "$description": "bg" },
                "b": { "value": 4, "unit": "px" },
                "c": 1
            })
        );
    }

    #[test]
    fn test_keep_none_leaves_bare_values() {
        let t = tree(json!({ "a": { "value": "#fff", "type": "color", "meta": { "css": false } } }));
        let opts = ShapeOptions {
            fields: ServiceFields::None,
            ..ShapeOptions::default()
        };
        assert_eq!(shape(&t, &opts), json!({ "a": "#fff" }));
    }

    #[test]
    fn test_keep_core_and_list() {
        let t = tree(json!({
            "a": { "value": 4, "type": "dimension", "unit": "px", "description": "x", "deprecated": true }
        }));

        let core = ShapeOptions {
            fields: ServiceFields::Core,
            ..ShapeOptions::default()
        };
        assert_eq!(
            shape(&t, &core),
            json!({ "a": { "value": 4, "type": "dimension", "unit": "px" } })
        );

        let only = ShapeOptions {
            fields: ServiceFields::Only(vec!["description".into(), "deprecated".into()]),
            ..ShapeOptions::default()
        };
        assert_eq!(
            shape(&t, &only),
            json!({ "a": { "value": 4, "description": "x", "deprecated": true } })
        );
    }

    #[test]
    fn test_flatten_with_case() {
        let t = tree(json!({ "fontSize": { "baseLine": 16 } }));
        let opts = ShapeOptions {
            case: NameCase::Kebab,
            flatten: true,
            separator: "/".to_string(),
            ..ShapeOptions::default()
        };
        assert_eq!(shape(&t, &opts), json!({ "font-size/base-line": 16 }));
    }

    #[test]
    fn test_colliding_keys_keep_later_token() {
        let flat = ShapeOptions {
            flatten: true,
            separator: ".".to_string(),
            ..ShapeOptions::default()
        };
        let t = tree(json!({ "a.b": 1, "a": { "b": 2 } }));
        assert_eq!(shape(&t, &flat), json!({ "a.b": 2 }));

        let kebab = ShapeOptions {
            case: NameCase::Kebab,
            ..ShapeOptions::default()
        };
        let t = tree(json!({ "fontSize": 1, "font-size": 2 }));
        assert_eq!(shape(&t, &kebab), json!({ "font-size": 2 }));
    }

    #[test]
    fn test_css_value_multiplier_and_unit() {
        let t = tree(json!({
            "space": { "value": 4, "unit": "px", "meta": { "multiply": true } },
            "ratio": 1.5,
            "font": ["Inter", "sans-serif"]
        }));
        let flat = flat_tokens(&t, 2.0);
        let values: Vec<(&str, &str)> = flat
            .iter()
            .map(|f| (f.name.as_str(), f.value.as_str()))
            .collect();
        assert_eq!(
            values,
            vec![("space", "8px"), ("ratio", "1.5"), ("font", "Inter, sans-serif")]
        );
    }

    #[test]
    fn test_css_name() {
        assert_eq!(
            css_name(&["color".into(), "brandPrimary".into()]),
            "color-brand-primary"
        );
    }
}
