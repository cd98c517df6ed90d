//! Configuration types for Tokensmith.
//!
//! This crate provides [`ParserConfig`], loaded from `tokensmith.yaml`
//! (or `.yml`/`.json`) with `${VAR}` expansion and `TOKENSMITH_*`
//! environment overrides.

pub mod env;
pub mod loader;
pub mod types;

pub use env::*;
pub use loader::*;
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_sensible_values() {
        let config = ParserConfig::default();

        assert_eq!(config.include_globs, vec!["**/*.json".to_string()]);
        assert!(config.exclude_globs.is_empty());
        assert!(config.resolve_references);
        assert!(config.pretty);
        assert!(config.use_tokens_in_separate_files);
        assert!(!config.include_root_dir_name);
        assert_eq!(config.keep_service_fields, ServiceFields::All);
        assert_eq!(config.css_vars_prefer, CssVarsPrefer::Last);
        assert_eq!(config.parse_errors, ParseErrorPolicy::Abort);
        assert_eq!(config.unit_multiplier, 1.0);
        assert_eq!(config.watch.debounce_ms, 100);
        assert_eq!(config.run_on, BuildStage::PreBuild);
    }

    #[test]
    fn test_config_serializes_to_camel_case_yaml() {
        let yaml = serde_yaml::to_string(&ParserConfig::default()).unwrap();

        assert!(yaml.contains("paths:"));
        assert!(yaml.contains("keepServiceFields: all"));
        assert!(yaml.contains("cssVarsPrefer: last"));
        assert!(yaml.contains("useTokensInSeparateFiles: true"));
        assert!(yaml.contains("runOn: pre-build"));
    }

    #[test]
    fn test_service_fields_keeps() {
        assert!(ServiceFields::All.keeps("description"));
        assert!(!ServiceFields::None.keeps("type"));
        assert!(ServiceFields::Core.keeps("unit"));
        assert!(!ServiceFields::Core.keeps("description"));
        let only = ServiceFields::Only(vec!["category".to_string()]);
        assert!(only.keeps("category"));
        assert!(!only.keeps("type"));
    }

    #[test]
    fn test_entry_module_id() {
        let mut config = ParserConfig::default();
        assert_eq!(config.entry_module_id(), None);

        config.entry_file_path = Some("index.ts".into());
        assert_eq!(config.entry_module_id().as_deref(), Some("dist/tokens/index.ts"));

        config.watch.entry_module = Some("virtual:tokens".to_string());
        assert_eq!(config.entry_module_id().as_deref(), Some("virtual:tokens"));
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var(vars::TOKENSMITH_OUTPUT, "public/ds");
        std::env::set_var(vars::TOKENSMITH_PRETTY, "false");

        let mut config = ParserConfig::default();
        Environment::apply_overrides(&mut config).unwrap();
        assert_eq!(config.paths.output, std::path::PathBuf::from("public/ds"));
        assert!(!config.pretty);

        std::env::remove_var(vars::TOKENSMITH_OUTPUT);
        std::env::remove_var(vars::TOKENSMITH_PRETTY);
    }
}
