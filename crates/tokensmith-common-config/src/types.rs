//! Configuration types.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration for one pipeline run.
///
/// Built once per run by [`crate::ConfigLoader`] and never mutated while the
/// pipeline is executing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParserConfig {
    /// Input roots and output directory.
    pub paths: PathsConfig,
    /// Root-relative globs a source file must match.
    pub include_globs: Vec<String>,
    /// Root-relative globs that drop a source file.
    pub exclude_globs: Vec<String>,
    /// Collapse nested groups into single-level keys in JSON output.
    pub flatten: bool,
    /// Separator used when `flatten` is on.
    pub flatten_separator: String,
    /// Resolve `{path}` references.
    pub resolve_references: bool,
    /// Which metadata fields survive normalization.
    pub keep_service_fields: ServiceFields,
    /// Pretty-print JSON output.
    pub pretty: bool,
    /// Which definition wins when two tokens map to the same CSS variable.
    pub css_vars_prefer: CssVarsPrefer,
    /// One JSON artifact per source file instead of a merged file.
    pub use_tokens_in_separate_files: bool,
    /// Nest merged JSON output under the input root's directory name.
    pub include_root_dir_name: bool,
    /// Merged JSON file name (relative to the output directory).
    pub json_file: String,
    /// Generated entry module path (relative to the output directory).
    pub entry_file_path: Option<PathBuf>,
    /// Directory of theme override trees.
    pub themes_dir: Option<PathBuf>,
    /// Themed bundle file name (relative to the output directory).
    pub themes_out_file: String,
    /// What to do with a malformed source file.
    pub parse_errors: ParseErrorPolicy,
    /// Write Markdown documentation next to JSON artifacts.
    pub docs: bool,
    /// Multiplier for numeric tokens flagged with `multiply`.
    pub unit_multiplier: f64,
    /// Key naming transform.
    pub naming: NamingConfig,
    /// SCSS target options.
    pub scss: ScssConfig,
    /// CSS custom-property target options.
    pub css: CssConfig,
    /// Watch driver options.
    pub watch: WatchConfig,
    /// Build hook stage that runs the pipeline in build-tool mode.
    pub run_on: BuildStage,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            include_globs: vec!["**/*.json".to_string()],
            exclude_globs: Vec::new(),
            flatten: false,
            flatten_separator: ".".to_string(),
            resolve_references: true,
            keep_service_fields: ServiceFields::All,
            pretty: true,
            css_vars_prefer: CssVarsPrefer::Last,
            use_tokens_in_separate_files: true,
            include_root_dir_name: false,
            json_file: "tokens.json".to_string(),
            entry_file_path: None,
            themes_dir: None,
            themes_out_file: "themes.json".to_string(),
            parse_errors: ParseErrorPolicy::Abort,
            docs: false,
            unit_multiplier: 1.0,
            naming: NamingConfig::default(),
            scss: ScssConfig::default(),
            css: CssConfig::default(),
            watch: WatchConfig::default(),
            run_on: BuildStage::PreBuild,
        }
    }
}

impl ParserConfig {
    /// Output directory.
    pub fn output_dir(&self) -> &Path {
        &self.paths.output
    }

    /// Absolute path of the generated entry module, if configured.
    pub fn entry_file(&self) -> Option<PathBuf> {
        self.entry_file_path
            .as_ref()
            .map(|p| self.paths.output.join(p))
    }

    /// Module id the dev server should invalidate after a rebuild.
    pub fn entry_module_id(&self) -> Option<String> {
        self.watch.entry_module.clone().or_else(|| {
            self.entry_file()
                .map(|p| p.to_string_lossy().replace('\\', "/"))
        })
    }

    /// Make every configured path absolute against `base`.
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        let absolutize = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                base.join(p)
            }
        };
        self.paths.input = self.paths.input.iter().map(|p| absolutize(p)).collect();
        self.paths.output = absolutize(&self.paths.output);
        self.themes_dir = self.themes_dir.as_deref().map(absolutize);
        self
    }
}

/// Input and output locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// One or more token roots. A single string is accepted.
    #[serde(deserialize_with = "one_or_many")]
    pub input: Vec<PathBuf>,
    /// Output directory.
    pub output: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input: vec![PathBuf::from("tokens")],
            output: PathBuf::from("dist/tokens"),
        }
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(PathBuf),
        Many(Vec<PathBuf>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(p) => vec![p],
        OneOrMany::Many(v) => v,
    })
}

/// Metadata fields recognized on a token besides its value.
pub const SERVICE_FIELDS: &[&str] = &["type", "unit", "description", "category", "meta"];

/// Fields kept by the `core` preset besides the value.
pub const CORE_FIELDS: &[&str] = &["type", "unit"];

/// Which service fields survive normalization.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "ServiceFieldsRepr", into = "ServiceFieldsRepr")]
pub enum ServiceFields {
    /// Keep every metadata field.
    #[default]
    All,
    /// Strip everything but the value.
    None,
    /// Keep value, type and unit.
    Core,
    /// Keep the value plus the named fields.
    Only(Vec<String>),
}

impl ServiceFields {
    /// Whether the named field is kept.
    pub fn keeps(&self, field: &str) -> bool {
        match self {
            Self::All => true,
            Self::None => false,
            Self::Core => CORE_FIELDS.contains(&field),
            Self::Only(fields) => fields.iter().any(|f| f == field),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum ServiceFieldsRepr {
    Preset(String),
    List(Vec<String>),
}

impl TryFrom<ServiceFieldsRepr> for ServiceFields {
    type Error = String;

    fn try_from(repr: ServiceFieldsRepr) -> Result<Self, Self::Error> {
        match repr {
            ServiceFieldsRepr::Preset(name) => match name.as_str() {
                "all" => Ok(Self::All),
                "none" => Ok(Self::None),
                "core" => Ok(Self::Core),
                other => Err(format!(
                    "unknown keepServiceFields preset '{other}' (expected all, none, core or a list)"
                )),
            },
            ServiceFieldsRepr::List(fields) => Ok(Self::Only(
                fields
                    .into_iter()
                    .map(|f| f.trim_start_matches('$').to_string())
                    .collect(),
            )),
        }
    }
}

impl From<ServiceFields> for ServiceFieldsRepr {
    fn from(fields: ServiceFields) -> Self {
        match fields {
            ServiceFields::All => Self::Preset("all".to_string()),
            ServiceFields::None => Self::Preset("none".to_string()),
            ServiceFields::Core => Self::Preset("core".to_string()),
            ServiceFields::Only(list) => Self::List(list),
        }
    }
}

/// CSS variable collision policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CssVarsPrefer {
    /// Keep the first definition in processing order.
    First,
    /// Keep the last definition in processing order.
    #[default]
    Last,
}

/// Policy for source files that fail to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseErrorPolicy {
    /// Fail the whole run.
    #[default]
    Abort,
    /// Log, record in the report and continue without the file.
    Skip,
}

/// Key case transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameCase {
    #[default]
    Keep,
    Kebab,
    Camel,
    Snake,
}

/// Naming options.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Case applied to every key of JSON output.
    pub case: NameCase,
}

/// SCSS variables target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScssConfig {
    pub enabled: bool,
    /// Output file for merged mode.
    pub file: String,
    /// Append `!default` to every variable.
    #[serde(rename = "default")]
    pub default_flag: bool,
    /// Variable name prefix.
    pub prefix: String,
}

impl Default for ScssConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file: "tokens.scss".to_string(),
            default_flag: false,
            prefix: String::new(),
        }
    }
}

/// CSS custom properties target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CssConfig {
    pub enabled: bool,
    pub file: String,
    /// Custom property prefix, `--{prefix}-{name}`.
    pub prefix: String,
    /// Selector wrapping the declarations.
    pub selector: String,
}

impl Default for CssConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file: "variables.css".to_string(),
            prefix: String::new(),
            selector: ":root".to_string(),
        }
    }
}

/// Watch driver options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WatchConfig {
    /// Window in which change events are coalesced into one run.
    pub debounce_ms: u64,
    /// Module id to invalidate on the dev server after a rebuild.
    pub entry_module: Option<String>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            entry_module: None,
        }
    }
}

/// Build hook stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildStage {
    #[default]
    PreBuild,
    PostBuild,
}
