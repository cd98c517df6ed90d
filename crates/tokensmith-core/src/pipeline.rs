//! Load, resolve, emit and write.
//!
//! Everything up to emission happens in memory. Artifacts are only written
//! once every stage has succeeded, and every artifact is staged next to its
//! target before any of them replaces the previous output.

use crate::emit::{default_emitters, Artifact, EmitInput, Emitter};
use crate::error::{TokenError, TokenResult};
use crate::forest::TokenForest;
use crate::loader::{LoadOutcome, SkippedFile, Theme, TokenLoader};
use crate::resolver::{resolve_forest, resolve_theme};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokensmith_common_config::ParserConfig;
use tokensmith_common_fs as fs;
use tokensmith_common_log::spans::{
    emit_span, file_span, instrument_future, record_error, run_span, stage_span, Timer,
};
use tracing::{debug, info};

/// Summary of a completed run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildReport {
    /// Written files, relative to the output directory.
    pub artifacts: Vec<PathBuf>,
    pub output_dir: PathBuf,
    pub sources: usize,
    pub tokens: usize,
    pub themes: usize,
    pub skipped: Vec<SkippedFile>,
    pub elapsed_ms: u64,
}

/// Summary of a load-and-resolve check.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    pub sources: usize,
    pub tokens: usize,
    pub themes: usize,
    pub skipped: Vec<SkippedFile>,
}

/// An in-memory build: resolved data plus the artifacts it produced.
#[derive(Debug, Clone)]
pub struct Build {
    pub forest: TokenForest,
    pub themes: Vec<Theme>,
    pub skipped: Vec<SkippedFile>,
    pub artifacts: Vec<Artifact>,
}

struct Resolved {
    forest: TokenForest,
    themes: Vec<Theme>,
    skipped: Vec<SkippedFile>,
}

/// The token build pipeline for one config.
pub struct Pipeline {
    config: ParserConfig,
    emitters: Vec<Box<dyn Emitter>>,
    runs: AtomicU64,
}

impl Pipeline {
    /// Create a pipeline with the built-in emitters.
    pub fn new(config: ParserConfig) -> Self {
        Self {
            config,
            emitters: default_emitters(),
            runs: AtomicU64::new(0),
        }
    }

    /// Replace the emitter set.
    pub fn with_emitters(mut self, emitters: Vec<Box<dyn Emitter>>) -> Self {
        self.emitters = emitters;
        self
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    async fn load_and_resolve(&self) -> TokenResult<Resolved> {
        let timer = Timer::start("load");
        let loader = TokenLoader::new(&self.config)?;
        let LoadOutcome { forest, skipped } =
            instrument_future(loader.load(), stage_span("load")).await?;

        let themes = match &self.config.themes_dir {
            Some(dir) => instrument_future(loader.load_themes(dir), stage_span("themes")).await?,
            None => Vec::new(),
        };
        timer.finish();

        let timer = Timer::start("resolve");
        let resolved = stage_span("resolve").in_scope(|| -> TokenResult<Resolved> {
            // Themes apply to the unresolved forest so references follow overrides
            let themes = themes
                .into_iter()
                .map(|theme| {
                    let tree = if self.config.resolve_references {
                        resolve_theme(&forest, &theme.tree)?
                    } else {
                        let mut tree = forest.merged_content();
                        tree.merge_from(&theme.tree);
                        tree
                    };
                    Ok(Theme {
                        name: theme.name,
                        tree,
                    })
                })
                .collect::<TokenResult<Vec<_>>>()?;

            let forest = if self.config.resolve_references {
                resolve_forest(&forest)?
            } else {
                forest
            };

            Ok(Resolved {
                forest,
                themes,
                skipped,
            })
        })?;
        timer.finish();
        Ok(resolved)
    }

    /// Run every stage in memory without writing anything.
    pub async fn build(&self) -> TokenResult<Build> {
        let Resolved {
            forest,
            themes,
            skipped,
        } = self.load_and_resolve().await?;

        let timer = Timer::start("emit");
        let input = EmitInput {
            forest: &forest,
            themes: &themes,
            config: &self.config,
        };
        let mut artifacts = Vec::new();
        let mut owners: HashMap<PathBuf, &'static str> = HashMap::new();
        for emitter in self.emitters.iter().filter(|e| e.enabled(&self.config)) {
            let produced = emit_span(emitter.name()).in_scope(|| emitter.emit(&input))?;
            debug!(emitter = emitter.name(), artifacts = produced.len(), "emitted");
            for artifact in &produced {
                if let Some(first) = owners.insert(artifact.path.clone(), emitter.name()) {
                    return Err(TokenError::OutputCollision {
                        path: artifact.path.clone(),
                        first: format!("the {first} target"),
                        second: format!("the {} target", emitter.name()),
                    });
                }
            }
            artifacts.extend(produced);
        }
        timer.finish();

        Ok(Build {
            forest,
            themes,
            skipped,
            artifacts,
        })
    }

    /// Build, then write every artifact atomically under the output
    /// directory.
    pub async fn run(&self) -> TokenResult<BuildReport> {
        let run = self.runs.fetch_add(1, Ordering::Relaxed) + 1;
        let span = run_span(run);
        let result = instrument_future(self.run_inner(), span.clone()).await;
        if let Err(e) = &result {
            span.in_scope(|| record_error(e));
        }
        result
    }

    async fn run_inner(&self) -> TokenResult<BuildReport> {
        let started = Instant::now();
        let build = self.build().await?;

        let output_dir = self.config.output_dir().to_path_buf();
        let timer = Timer::start("write");
        let written = write_artifacts(output_dir.clone(), build.artifacts).await?;
        timer.finish();

        let report = BuildReport {
            artifacts: written,
            output_dir,
            sources: build.forest.len(),
            tokens: build.forest.token_count(),
            themes: build.themes.len(),
            skipped: build.skipped,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            artifacts = report.artifacts.len(),
            tokens = report.tokens,
            skipped = report.skipped.len(),
            elapsed_ms = report.elapsed_ms,
            "tokens built"
        );
        Ok(report)
    }

    /// Load and resolve only.
    pub async fn check(&self) -> TokenResult<CheckReport> {
        let resolved = self.load_and_resolve().await?;
        Ok(CheckReport {
            sources: resolved.forest.len(),
            tokens: resolved.forest.token_count(),
            themes: resolved.themes.len(),
            skipped: resolved.skipped,
        })
    }
}

/// Write artifacts under `output_dir`, returning their relative paths.
///
/// Every artifact is first written to a temporary file beside its target.
/// Targets are only replaced once all of them are staged, so a failed
/// write leaves the previous output in place.
pub async fn write_artifacts(output_dir: PathBuf, artifacts: Vec<Artifact>) -> TokenResult<Vec<PathBuf>> {
    let span = stage_span("write");
    tokio::task::spawn_blocking(move || {
        let _entered = span.enter();
        fs::ensure_dir(&output_dir).map_err(|source| TokenError::Write {
            path: output_dir.clone(),
            source,
        })?;

        let mut staged = Vec::with_capacity(artifacts.len());
        for artifact in &artifacts {
            let target = output_dir.join(&artifact.path);
            let _file = file_span("write", &target.to_string_lossy()).entered();
            let file = fs::stage_write(&target, artifact.contents.as_bytes())
                .map_err(|source| TokenError::Write {
                    path: target.clone(),
                    source,
                })?;
            debug!(bytes = artifact.contents.len(), "staged artifact");
            staged.push(file);
        }

        for file in staged {
            let target = file.target().to_path_buf();
            file.commit()
                .map_err(|source| TokenError::Write { path: target, source })?;
        }
        Ok(artifacts.into_iter().map(|a| a.path).collect())
    })
    .await
    .map_err(|e| TokenError::Io(std::io::Error::other(e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, contents: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    fn config(dir: &Path) -> ParserConfig {
        let mut config = ParserConfig::default();
        config.paths.input = vec![dir.join("tokens")];
        config.paths.output = dir.join("dist");
        config
    }

    #[tokio::test]
    async fn test_build_is_in_memory() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "tokens/color.json", r##"{ "bg": "#fff" }"##);

        let build = Pipeline::new(config(dir.path())).build().await.unwrap();
        assert!(!build.artifacts.is_empty());
        assert!(!dir.path().join("dist").exists());
    }

    #[tokio::test]
    async fn test_themes_follow_overrides() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "tokens/color.json",
            r##"{ "bg": "#fff", "surface": "{bg}" }"##,
        );
        write(dir.path(), "themes/dark.json", r##"{ "bg": "#000" }"##);

        let mut config = config(dir.path());
        config.themes_dir = Some(dir.path().join("themes"));

        let build = Pipeline::new(config).build().await.unwrap();
        let dark = &build.themes[0];
        assert_eq!(dark.name, "dark");
        assert_eq!(dark.tree.leaf("surface").unwrap().value.to_string(), "#000");
        assert_eq!(
            build.forest.sources[0].tree.leaf("surface").unwrap().value.to_string(),
            "#fff"
        );
    }

    #[tokio::test]
    async fn test_themes_keep_group_qualified_references() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "tokens/base/color.json", r##"{ "bg": "#fff" }"##);
        write(dir.path(), "tokens/button.json", r#"{ "fill": "{base.color.bg}" }"#);

        let mut config = config(dir.path());
        assert_eq!(Pipeline::new(config.clone()).check().await.unwrap().sources, 2);

        write(dir.path(), "themes/dark.json", r##"{ "bg": "#000" }"##);
        config.themes_dir = Some(dir.path().join("themes"));
        let build = Pipeline::new(config).build().await.unwrap();
        assert_eq!(build.themes[0].tree.leaf("fill").unwrap().value.to_string(), "#000");
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_output() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("dist");
        write(&out, "a.json", "old");
        // A file where a directory is needed makes the second artifact fail
        write(&out, "blocked", "");

        let artifacts = vec![
            Artifact::new("a.json", "new"),
            Artifact::new("blocked/b.json", "new"),
        ];
        let err = write_artifacts(out.clone(), artifacts).await.unwrap_err();
        assert!(matches!(err, TokenError::Write { .. }));

        assert_eq!(std::fs::read_to_string(out.join("a.json")).unwrap(), "old");
        assert!(!out.join(".a.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_two_targets_claiming_one_file_fail() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "tokens/color.json", r##"{ "bg": "#fff" }"##);

        let mut config = config(dir.path());
        config.use_tokens_in_separate_files = false;
        config.css.file = config.scss.file.clone();

        match Pipeline::new(config).run().await.unwrap_err() {
            TokenError::OutputCollision { path, first, second } => {
                assert_eq!(path, PathBuf::from("tokens.scss"));
                assert_eq!(first, "the scss target");
                assert_eq!(second, "the css target");
            }
            other => panic!("expected collision, got {other:?}"),
        }
        assert!(!dir.path().join("dist").exists());
    }

    #[tokio::test]
    async fn test_references_left_alone_when_disabled() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "tokens/a.json", r#"{ "a": "{missing}" }"#);

        let mut config = config(dir.path());
        assert!(Pipeline::new(config.clone()).check().await.is_err());

        config.resolve_references = false;
        let report = Pipeline::new(config).check().await.unwrap();
        assert_eq!(report.tokens, 1);
    }
}
