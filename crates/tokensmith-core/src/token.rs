//! Token tree model.
//!
//! A source file parses into a [`TokenNode`] tree. Objects carrying a
//! `value` (or `$value`) key are leaves; every other object is a group.
//! Scalars and arrays are shorthand leaves.

use indexmap::IndexMap;
use serde_json::{Map, Number, Value};
use std::fmt;

/// A token's value.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    String(String),
    /// A string that looks like a CSS color.
    Color(String),
    Number(Number),
    Bool(bool),
    List(Vec<TokenValue>),
}

impl TokenValue {
    /// Classify a string value.
    pub fn from_text(s: impl Into<String>) -> Self {
        let s = s.into();
        if is_color(&s) {
            Self::Color(s)
        } else {
            Self::String(s)
        }
    }

    /// Convert a JSON value. Objects and `null` are not token values.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::from_text(s.clone())),
            Value::Number(n) => Some(Self::Number(n.clone())),
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Array(items) => items
                .iter()
                .map(Self::from_json)
                .collect::<Option<Vec<_>>>()
                .map(Self::List),
            Value::Null | Value::Object(_) => None,
        }
    }

    /// JSON form of the value.
    pub fn to_json(&self) -> Value {
        match self {
            Self::String(s) | Self::Color(s) => Value::String(s.clone()),
            Self::Number(n) => Value::Number(n.clone()),
            Self::Bool(b) => Value::Bool(*b),
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
        }
    }

    /// The raw text if this is a string-like value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Color(s) => Some(s),
            _ => None,
        }
    }

    /// Whether the value (or any list element) still contains a reference.
    pub fn has_reference(&self) -> bool {
        match self {
            Self::String(s) | Self::Color(s) => !crate::reference::find_references(s).is_empty(),
            Self::List(items) => items.iter().any(Self::has_reference),
            _ => false,
        }
    }
}

/// Renders the value as stylesheet text. Lists are comma-joined.
impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) | Self::Color(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

/// Whether a string is a hex or functional CSS color.
pub fn is_color(s: &str) -> bool {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        return matches!(hex.len(), 3 | 4 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    let lower = s.to_ascii_lowercase();
    ["rgb(", "rgba(", "hsl(", "hsla("]
        .iter()
        .any(|prefix| lower.starts_with(prefix))
        && lower.ends_with(')')
}

/// Which key spelling a leaf used in its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyStyle {
    /// `value`, `type`, ...
    #[default]
    Plain,
    /// `$value`, `$type`, ...
    Dollar,
}

impl KeyStyle {
    /// Spell a field name in this style.
    pub fn key(&self, field: &str) -> String {
        match self {
            Self::Plain => field.to_string(),
            Self::Dollar => format!("${field}"),
        }
    }
}

/// Per-target build flags from a leaf's `meta` object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildFlags {
    /// Export as a CSS custom property. Unset means yes.
    pub css: Option<bool>,
    /// Export as an SCSS variable. Unset means yes.
    pub scss: Option<bool>,
    /// Apply the configured unit multiplier to numeric values.
    pub multiply: bool,
}

impl BuildFlags {
    pub fn exports_css(&self) -> bool {
        self.css.unwrap_or(true)
    }

    pub fn exports_scss(&self) -> bool {
        self.scss.unwrap_or(true)
    }
}

/// A leaf token.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub value: TokenValue,
    pub token_type: Option<String>,
    pub unit: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub build: BuildFlags,
    /// Unrecognized `meta` entries, kept verbatim.
    pub meta: IndexMap<String, Value>,
    /// Unrecognized leaf fields, kept verbatim.
    pub extra: IndexMap<String, Value>,
    pub style: KeyStyle,
    /// Written as a bare value rather than an object.
    pub shorthand: bool,
}

impl Token {
    /// A bare token with only a value.
    pub fn new(value: TokenValue) -> Self {
        Self {
            value,
            token_type: None,
            unit: None,
            description: None,
            category: None,
            build: BuildFlags::default(),
            meta: IndexMap::new(),
            extra: IndexMap::new(),
            style: KeyStyle::Plain,
            shorthand: true,
        }
    }
}

/// A node in the token tree.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenNode {
    Group(IndexMap<String, TokenNode>),
    Leaf(Token),
}

/// Failure converting JSON into a token tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeError {
    /// Dotted path of the offending node.
    pub path: String,
    pub message: String,
}

impl Default for TokenNode {
    fn default() -> Self {
        Self::Group(IndexMap::new())
    }
}

impl TokenNode {
    /// Parse the top level of a token file.
    pub fn from_json(value: &Value) -> Result<Self, TreeError> {
        match value {
            Value::Object(map) => {
                let mut path = Vec::new();
                Self::parse_group(map, &mut path, None)
            }
            _ => Err(TreeError {
                path: String::new(),
                message: "top level of a token file must be an object".to_string(),
            }),
        }
    }

    fn parse_node(
        value: &Value,
        path: &mut Vec<String>,
        inherited_type: Option<&str>,
    ) -> Result<Self, TreeError> {
        match value {
            Value::Object(map) if is_leaf_object(map) => {
                Self::parse_leaf(map, path, inherited_type).map(Self::Leaf)
            }
            Value::Object(map) => Self::parse_group(map, path, inherited_type),
            other => match TokenValue::from_json(other) {
                Some(v) => {
                    let mut token = Token::new(v);
                    token.token_type = inherited_type.map(str::to_string);
                    Ok(Self::Leaf(token))
                }
                None => Err(TreeError {
                    path: path.join("."),
                    message: "token value must be a string, number, boolean or array".to_string(),
                }),
            },
        }
    }

    fn parse_group(
        map: &Map<String, Value>,
        path: &mut Vec<String>,
        inherited_type: Option<&str>,
    ) -> Result<Self, TreeError> {
        // `$type` on a group applies to every descendant without its own type
        let group_type = map
            .get("$type")
            .and_then(Value::as_str)
            .or(inherited_type);

        let mut children = IndexMap::with_capacity(map.len());
        for (key, child) in map {
            if key.starts_with('$') {
                continue;
            }
            path.push(key.clone());
            let node = Self::parse_node(child, path, group_type)?;
            path.pop();
            children.insert(key.clone(), node);
        }
        Ok(Self::Group(children))
    }

    fn parse_leaf(
        map: &Map<String, Value>,
        path: &mut Vec<String>,
        inherited_type: Option<&str>,
    ) -> Result<Token, TreeError> {
        let err = |message: String| TreeError {
            path: path.join("."),
            message,
        };

        let style = if map.contains_key("$value") {
            KeyStyle::Dollar
        } else {
            KeyStyle::Plain
        };
        let raw = map
            .get("$value")
            .or_else(|| map.get("value"))
            .unwrap_or(&Value::Null);
        let value = TokenValue::from_json(raw)
            .ok_or_else(|| err("token value must be a string, number, boolean or array".to_string()))?;

        let mut token = Token::new(value);
        token.style = style;
        token.shorthand = false;
        token.token_type = inherited_type.map(str::to_string);

        for (key, field) in map {
            let name = key.strip_prefix('$').unwrap_or(key);
            match name {
                "value" => {}
                "type" => token.token_type = Some(text_field(field, key).map_err(err)?),
                "unit" => token.unit = Some(text_field(field, key).map_err(err)?),
                "description" => token.description = Some(text_field(field, key).map_err(err)?),
                "category" => token.category = Some(text_field(field, key).map_err(err)?),
                "meta" => {
                    let meta = field
                        .as_object()
                        .ok_or_else(|| err(format!("'{key}' must be an object")))?;
                    apply_meta(&mut token, meta).map_err(err)?;
                }
                _ => {
                    token.extra.insert(key.clone(), field.clone());
                }
            }
        }
        Ok(token)
    }

    /// Look up a node by path segments.
    pub fn get<S: AsRef<str>>(&self, path: &[S]) -> Option<&TokenNode> {
        let mut node = self;
        for segment in path {
            match node {
                Self::Group(children) => node = children.get(segment.as_ref())?,
                Self::Leaf(_) => return None,
            }
        }
        Some(node)
    }

    /// Look up a leaf by dotted path.
    pub fn leaf(&self, dotted: &str) -> Option<&Token> {
        let segments: Vec<&str> = dotted.split('.').collect();
        match self.get(&segments)? {
            Self::Leaf(token) => Some(token),
            Self::Group(_) => None,
        }
    }

    /// Every leaf with its path, in document order.
    pub fn leaves(&self) -> Vec<(Vec<String>, &Token)> {
        let mut out = Vec::new();
        let mut path = Vec::new();
        self.collect_leaves(&mut path, &mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, path: &mut Vec<String>, out: &mut Vec<(Vec<String>, &'a Token)>) {
        match self {
            Self::Leaf(token) => out.push((path.clone(), token)),
            Self::Group(children) => {
                for (key, child) in children {
                    path.push(key.clone());
                    child.collect_leaves(path, out);
                    path.pop();
                }
            }
        }
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Group(children) => children.values().map(Self::leaf_count).sum(),
        }
    }

    /// Build a new tree with every leaf passed through `f`.
    pub fn try_map_leaves<E, F>(&self, f: &mut F) -> Result<TokenNode, E>
    where
        F: FnMut(&[String], &Token) -> Result<Token, E>,
    {
        let mut path = Vec::new();
        self.map_inner(&mut path, f)
    }

    fn map_inner<E, F>(&self, path: &mut Vec<String>, f: &mut F) -> Result<TokenNode, E>
    where
        F: FnMut(&[String], &Token) -> Result<Token, E>,
    {
        match self {
            Self::Leaf(token) => f(path, token).map(Self::Leaf),
            Self::Group(children) => {
                let mut mapped = IndexMap::with_capacity(children.len());
                for (key, child) in children {
                    path.push(key.clone());
                    let node = child.map_inner(path, f)?;
                    path.pop();
                    mapped.insert(key.clone(), node);
                }
                Ok(Self::Group(mapped))
            }
        }
    }

    /// Deep-merge `other` into `self`. Leaves in `other` win per path.
    pub fn merge_from(&mut self, other: &TokenNode) {
        match (self, other) {
            (Self::Group(mine), Self::Group(theirs)) => {
                for (key, node) in theirs {
                    match mine.get_mut(key) {
                        Some(existing) => existing.merge_from(node),
                        None => {
                            mine.insert(key.clone(), node.clone());
                        }
                    }
                }
            }
            (this, other) => *this = other.clone(),
        }
    }

    /// Wrap `self` under the given path segments.
    pub fn nest<S: AsRef<str>>(self, path: &[S]) -> TokenNode {
        path.iter().rev().fold(self, |node, segment| {
            let mut map = IndexMap::new();
            map.insert(segment.as_ref().to_string(), node);
            Self::Group(map)
        })
    }
}

fn is_leaf_object(map: &Map<String, Value>) -> bool {
    map.contains_key("value") || map.contains_key("$value")
}

fn text_field(field: &Value, key: &str) -> Result<String, String> {
    match field {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(format!("'{key}' must be a string")),
    }
}

fn apply_meta(token: &mut Token, meta: &Map<String, Value>) -> Result<(), String> {
    for (key, value) in meta {
        match key.as_str() {
            "description" if token.description.is_none() => {
                token.description = Some(text_field(value, key)?);
            }
            "category" if token.category.is_none() => {
                token.category = Some(text_field(value, key)?);
            }
            "css" | "scss" | "multiply" => {
                let flag = value
                    .as_bool()
                    .ok_or_else(|| format!("meta.{key} must be a boolean"))?;
                match key.as_str() {
                    "css" => token.build.css = Some(flag),
                    "scss" => token.build.scss = Some(flag),
                    _ => token.build.multiply = flag,
                }
            }
            _ => {
                token.meta.insert(key.clone(), value.clone());
            }
        }
    }
    Ok(())
}
