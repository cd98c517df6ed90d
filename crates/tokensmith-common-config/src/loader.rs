//! Configuration file loading and parsing.

use crate::env::{EnvError, Environment};
use crate::types::ParserConfig;
use regex::{Captures, Regex};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File names looked for in the project directory, in order.
pub const CONFIG_FILE_NAMES: &[&str] = &["tokensmith.yaml", "tokensmith.yml", "tokensmith.json"];

/// Config loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read config: {source}")]
    ReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("invalid config at line {}: {message}", line.map(|l| l.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    ParseError { line: Option<usize>, message: String },

    #[error("validation error: {message}")]
    ValidationError { message: String },

    #[error("environment variable not found: {var}")]
    EnvVarNotFound { var: String },

    #[error(transparent)]
    Env(#[from] EnvError),
}

/// Configuration loader.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    base_path: PathBuf,
    explicit: Option<PathBuf>,
    env_overrides: bool,
}

impl ConfigLoader {
    /// Create a loader for the given project directory.
    pub fn new(project_dir: impl AsRef<Path>) -> Self {
        Self {
            base_path: project_dir.as_ref().to_path_buf(),
            explicit: None,
            env_overrides: true,
        }
    }

    /// Load from an explicit file. Relative paths inside it resolve against
    /// the file's directory.
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let base_path = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self {
            base_path,
            explicit: Some(path),
            env_overrides: true,
        }
    }

    /// Skip `TOKENSMITH_*` environment overrides.
    pub fn without_env_overrides(mut self) -> Self {
        self.env_overrides = false;
        self
    }

    /// Project directory relative paths are resolved against.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Every path a config file may appear at for this loader.
    pub fn candidates(&self) -> Vec<PathBuf> {
        match &self.explicit {
            Some(explicit) => vec![explicit.clone()],
            None => CONFIG_FILE_NAMES
                .iter()
                .map(|name| self.base_path.join(name))
                .collect(),
        }
    }

    /// The config file that [`load`](Self::load) reads, if any.
    pub fn locate(&self) -> Option<PathBuf> {
        if let Some(explicit) = &self.explicit {
            return Some(explicit.clone());
        }
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| self.base_path.join(name))
            .find(|p| p.is_file())
    }

    /// Load configuration; defaults apply when no file is present.
    ///
    /// The returned config has absolute paths and has been validated.
    pub fn load(&self) -> Result<ParserConfig, ConfigError> {
        let mut config = match self.locate() {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::NotFound { path });
                }
                let contents = std::fs::read_to_string(&path)?;
                let expanded = self.expand_env_vars(&contents)?;
                Self::parse(&path, &expanded)?
            }
            None => ParserConfig::default(),
        };

        if self.env_overrides {
            Environment::apply_overrides(&mut config)?;
        }

        let config = config.resolve_paths(&self.base_path);
        self.validate(&config)?;
        Ok(config)
    }

    fn parse(path: &Path, contents: &str) -> Result<ParserConfig, ConfigError> {
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        if is_json {
            serde_json::from_str(contents).map_err(|e| ConfigError::ParseError {
                line: Some(e.line()),
                message: e.to_string(),
            })
        } else if contents.trim().is_empty() {
            Ok(ParserConfig::default())
        } else {
            serde_yaml::from_str(contents).map_err(|e| ConfigError::ParseError {
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })
        }
    }

    /// Expand environment variables in the form `${VAR}` or `${VAR:-default}`.
    pub fn expand_env_vars(&self, content: &str) -> Result<String, ConfigError> {
        let re = Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}").map_err(|e| {
            ConfigError::ParseError {
                line: None,
                message: e.to_string(),
            }
        })?;

        let mut missing = None;
        let expanded = re.replace_all(content, |cap: &Captures<'_>| {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(v) => v,
                Err(_) => match cap.get(2) {
                    Some(default) => default.as_str().to_string(),
                    None => {
                        missing.get_or_insert_with(|| var_name.to_string());
                        String::new()
                    }
                },
            }
        });

        match missing {
            Some(var) => Err(ConfigError::EnvVarNotFound { var }),
            None => Ok(expanded.into_owned()),
        }
    }

    /// Validate configuration values.
    pub fn validate(&self, config: &ParserConfig) -> Result<(), ConfigError> {
        let invalid = |message: String| Err(ConfigError::ValidationError { message });

        if config.paths.input.is_empty() {
            return invalid("paths.input must name at least one directory".to_string());
        }
        if config.paths.output.as_os_str().is_empty() {
            return invalid("paths.output must not be empty".to_string());
        }
        if config.paths.input.iter().any(|i| i == &config.paths.output) {
            return invalid("paths.output must differ from every input directory".to_string());
        }
        if config.include_globs.is_empty() {
            return invalid("includeGlobs must contain at least one pattern".to_string());
        }
        for pattern in config.include_globs.iter().chain(&config.exclude_globs) {
            if let Err(e) = glob::Pattern::new(pattern) {
                return invalid(format!("invalid glob '{pattern}': {e}"));
            }
        }
        if !(config.unit_multiplier.is_finite() && config.unit_multiplier > 0.0) {
            return invalid("unitMultiplier must be a positive number".to_string());
        }
        if config.flatten && config.flatten_separator.is_empty() {
            return invalid("flattenSeparator must not be empty when flatten is on".to_string());
        }
        if config.css.enabled && config.css.selector.trim().is_empty() {
            return invalid("css.selector must not be empty".to_string());
        }
        if config.json_file.is_empty() || config.themes_out_file.is_empty() {
            return invalid("jsonFile and themesOutFile must not be empty".to_string());
        }

        Ok(())
    }

    /// Write a config as YAML to `tokensmith.yaml` in the project directory.
    pub fn save(&self, config: &ParserConfig) -> Result<PathBuf, ConfigError> {
        std::fs::create_dir_all(&self.base_path)?;
        let config_path = self
            .explicit
            .clone()
            .unwrap_or_else(|| self.base_path.join(CONFIG_FILE_NAMES[0]));

        let yaml = serde_yaml::to_string(config).map_err(|e| ConfigError::ParseError {
            line: None,
            message: e.to_string(),
        })?;

        std::fs::write(&config_path, yaml)?;
        Ok(config_path)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new(std::env::current_dir().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CssVarsPrefer, ParseErrorPolicy, ServiceFields};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_defaults_when_no_file() {
        let dir = tempdir().unwrap();
        let loader = ConfigLoader::new(dir.path()).without_env_overrides();
        let config = loader.load().unwrap();

        assert_eq!(config.paths.input, vec![dir.path().join("tokens")]);
        assert_eq!(config.paths.output, dir.path().join("dist/tokens"));
        assert!(config.resolve_references);
    }

    #[test]
    fn test_load_yaml_file() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("tokensmith.yaml"),
            r#"
paths:
  input: design/tokens
  output: build
keepServiceFields: none
cssVarsPrefer: first
parseErrors: skip
useTokensInSeparateFiles: false
includeRootDirName: true
scss:
  default: true
"#,
        )
        .unwrap();

        let config = ConfigLoader::new(dir.path())
            .without_env_overrides()
            .load()
            .unwrap();

        assert_eq!(config.paths.input, vec![dir.path().join("design/tokens")]);
        assert_eq!(config.paths.output, dir.path().join("build"));
        assert_eq!(config.keep_service_fields, ServiceFields::None);
        assert_eq!(config.css_vars_prefer, CssVarsPrefer::First);
        assert_eq!(config.parse_errors, ParseErrorPolicy::Skip);
        assert!(!config.use_tokens_in_separate_files);
        assert!(config.include_root_dir_name);
        assert!(config.scss.default_flag);
        // untouched values keep their defaults
        assert_eq!(config.css.selector, ":root");
        assert!(config.pretty);
    }

    #[test]
    fn test_load_json_file_with_field_list() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.json");
        fs::write(
            &path,
            r#"{ "paths": { "input": ["a", "b"] }, "keepServiceFields": ["type", "$description"] }"#,
        )
        .unwrap();

        let config = ConfigLoader::from_file(&path)
            .without_env_overrides()
            .load()
            .unwrap();

        assert_eq!(config.paths.input, vec![dir.path().join("a"), dir.path().join("b")]);
        assert_eq!(
            config.keep_service_fields,
            ServiceFields::Only(vec!["type".to_string(), "description".to_string()])
        );
    }

    #[test]
    fn test_unknown_preset_is_a_parse_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("tokensmith.yaml"), "keepServiceFields: some\n").unwrap();

        let err = ConfigLoader::new(dir.path())
            .without_env_overrides()
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_explicit_missing_file() {
        let dir = tempdir().unwrap();
        let err = ConfigLoader::from_file(dir.path().join("nope.yaml"))
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn test_env_var_expansion() {
        std::env::set_var("TOKENSMITH_TEST_OUT", "public/tokens");
        let loader = ConfigLoader::new(".");
        let result = loader
            .expand_env_vars("output: ${TOKENSMITH_TEST_OUT}\nprefix: ${TOKENSMITH_TEST_NOPE:-ds}")
            .unwrap();
        assert_eq!(result, "output: public/tokens\nprefix: ds");
        std::env::remove_var("TOKENSMITH_TEST_OUT");
    }

    #[test]
    fn test_env_var_missing_error() {
        let loader = ConfigLoader::new(".");
        match loader.expand_env_vars("key: ${TOKENSMITH_MISSING_VAR}").unwrap_err() {
            ConfigError::EnvVarNotFound { var } => assert_eq!(var, "TOKENSMITH_MISSING_VAR"),
            other => panic!("Expected EnvVarNotFound error, got {other:?}"),
        }
    }

    #[test]
    fn test_validation_errors() {
        let loader = ConfigLoader::new(".");

        let mut config = ParserConfig::default();
        config.unit_multiplier = 0.0;
        assert!(matches!(
            loader.validate(&config),
            Err(ConfigError::ValidationError { message }) if message.contains("unitMultiplier")
        ));

        let mut config = ParserConfig::default();
        config.exclude_globs = vec!["[broken".to_string()];
        assert!(matches!(
            loader.validate(&config),
            Err(ConfigError::ValidationError { message }) if message.contains("[broken")
        ));

        let mut config = ParserConfig::default();
        config.paths.output = config.paths.input[0].clone();
        assert!(loader.validate(&config).is_err());

        let mut config = ParserConfig::default();
        config.paths.input.clear();
        assert!(loader.validate(&config).is_err());
    }

    #[test]
    fn test_parse_error_with_line_number() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("tokensmith.yaml"),
            "paths:\n  input: [unclosed\n",
        )
        .unwrap();

        match ConfigLoader::new(dir.path())
            .without_env_overrides()
            .load()
            .unwrap_err()
        {
            ConfigError::ParseError { line, .. } => assert!(line.is_some()),
            other => panic!("Expected ParseError with line number, got {other:?}"),
        }
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let loader = ConfigLoader::new(dir.path()).without_env_overrides();

        let mut config = ParserConfig::default();
        config.keep_service_fields = ServiceFields::Core;
        config.css.prefix = "ds".to_string();

        let path = loader.save(&config).unwrap();
        assert_eq!(path, dir.path().join("tokensmith.yaml"));

        let loaded = loader.load().unwrap();
        assert_eq!(loaded.keep_service_fields, ServiceFields::Core);
        assert_eq!(loaded.css.prefix, "ds");
    }
}
