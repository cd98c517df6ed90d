//! Token source loading.
//!
//! Walks every input root, filters files by the configured globs, reads them
//! concurrently and parses each into a [`TokenSource`]. Processing order is
//! root order, then relative path.

use crate::error::{TokenError, TokenResult};
use crate::forest::{TokenForest, TokenSource};
use crate::token::{TokenNode, TreeError};
use futures_util::future::join_all;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokensmith_common_config::{ParseErrorPolicy, ParserConfig};
use tokensmith_common_core::ErrorCategory;
use tokensmith_common_fs::{self as fs, FileFilter, MAX_SOURCE_SIZE};
use tracing::{debug, warn};

/// A source file dropped under `parseErrors: skip`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of loading every input root.
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    pub forest: TokenForest,
    pub skipped: Vec<SkippedFile>,
}

/// A named theme override tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub name: String,
    pub tree: TokenNode,
}

/// Loads token sources according to a [`ParserConfig`].
#[derive(Debug, Clone)]
pub struct TokenLoader {
    roots: Vec<PathBuf>,
    filter: FileFilter,
    policy: ParseErrorPolicy,
}

impl TokenLoader {
    /// Create a loader for the config's input roots and globs.
    pub fn new(config: &ParserConfig) -> TokenResult<Self> {
        Ok(Self {
            roots: config.paths.input.clone(),
            filter: build_filter(&config.include_globs, &config.exclude_globs)?,
            policy: config.parse_errors,
        })
    }

    /// Load every matching file under every root.
    pub async fn load(&self) -> TokenResult<LoadOutcome> {
        let mut pending = Vec::new();
        for root in &self.roots {
            if !fs::is_dir(root) {
                return Err(TokenError::SourceNotFound { path: root.clone() });
            }
            let files = fs::list_files_matching(root, &self.filter).map_err(|source| {
                TokenError::Read {
                    path: root.clone(),
                    source,
                }
            })?;
            debug!(root = %root.display(), files = files.len(), "discovered token files");
            pending.extend(files.into_iter().map(|rel| (root.clone(), rel)));
        }

        let reads = pending
            .iter()
            .map(|(root, rel)| fs::read_to_string_async(root.join(rel), MAX_SOURCE_SIZE));
        let contents = join_all(reads).await;

        let mut outcome = LoadOutcome::default();
        for ((root, relative), text) in pending.into_iter().zip(contents) {
            let file = root.join(&relative);
            let text = match text {
                Ok(text) => text,
                // Undecodable bytes are a malformed file, not an I/O failure
                Err(source)
                    if source.category() == ErrorCategory::Encoding
                        && self.policy == ParseErrorPolicy::Skip =>
                {
                    warn!(file = %file.display(), code = %source.code(), "skipping undecodable token file");
                    outcome.skipped.push(SkippedFile {
                        path: file,
                        reason: source.to_string(),
                    });
                    continue;
                }
                Err(source) => return Err(TokenError::Read { path: file, source }),
            };

            match parse_tree(&file, &text) {
                Ok(tree) => outcome
                    .forest
                    .sources
                    .push(TokenSource::new(root, relative, tree)),
                Err(err) if self.policy == ParseErrorPolicy::Skip => {
                    warn!(file = %file.display(), error = %err, "skipping malformed token file");
                    outcome.skipped.push(SkippedFile {
                        path: file,
                        reason: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }

        debug!(
            sources = outcome.forest.len(),
            tokens = outcome.forest.token_count(),
            skipped = outcome.skipped.len(),
            "loaded token sources"
        );
        Ok(outcome)
    }

    /// Load theme override trees from `dir`.
    ///
    /// Each top-level `*.json` file is one theme named after its stem; each
    /// sub-directory is one theme whose matching files merge in path order.
    pub async fn load_themes(&self, dir: &Path) -> TokenResult<Vec<Theme>> {
        if !fs::is_dir(dir) {
            return Err(TokenError::SourceNotFound {
                path: dir.to_path_buf(),
            });
        }

        let mut read_dir = tokio::fs::read_dir(dir).await?;
        let mut entries = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            let path = entry.path();
            let is_dir = tokio::fs::metadata(&path).await?.is_dir();
            entries.push((path, is_dir));
        }
        entries.sort();

        // Theme name plus the files merged into it, in order
        let mut plan: Vec<(String, Vec<PathBuf>)> = Vec::new();
        for (entry, is_dir) in entries {
            if is_dir {
                let Some(name) = entry.file_name().map(|n| n.to_string_lossy().to_string()) else {
                    continue;
                };
                let files = fs::list_files_matching(&entry, &self.filter).map_err(|source| {
                    TokenError::Read {
                        path: entry.clone(),
                        source,
                    }
                })?;
                plan.push((name, files.into_iter().map(|rel| entry.join(rel)).collect()));
            } else if fs::extension(&entry).as_deref() == Some("json") {
                let Some(stem) = entry.file_stem().map(|s| s.to_string_lossy().to_string()) else {
                    continue;
                };
                plan.push((stem, vec![entry]));
            }
        }

        let themes = join_all(plan.into_iter().map(|(name, files)| async move {
            let mut tree = TokenNode::default();
            for read in join_all(files.iter().map(|file| read_tree(file))).await {
                tree.merge_from(&read?);
            }
            Ok::<_, TokenError>(Theme { name, tree })
        }))
        .await
        .into_iter()
        .collect::<TokenResult<Vec<_>>>()?;
        debug!(dir = %dir.display(), themes = themes.len(), "loaded themes");
        Ok(themes)
    }
}

/// Load every source described by `config`.
pub async fn load_sources(config: &ParserConfig) -> TokenResult<LoadOutcome> {
    TokenLoader::new(config)?.load().await
}

/// Compile include and exclude globs.
pub fn build_filter(include: &[String], exclude: &[String]) -> TokenResult<FileFilter> {
    for pattern in include.iter().chain(exclude) {
        if let Err(e) = glob::Pattern::new(pattern) {
            return Err(TokenError::InvalidGlob {
                pattern: pattern.clone(),
                message: e.msg.to_string(),
            });
        }
    }
    FileFilter::new(include, exclude).map_err(|e| TokenError::InvalidGlob {
        pattern: include.join(", "),
        message: e.msg.to_string(),
    })
}

async fn read_tree(file: &Path) -> TokenResult<TokenNode> {
    let text = fs::read_to_string_async(file, MAX_SOURCE_SIZE)
        .await
        .map_err(|source| TokenError::Read {
            path: file.to_path_buf(),
            source,
        })?;
    parse_tree(file, &text)
}

/// Parse one file's text into a token tree.
pub fn parse_tree(file: &Path, text: &str) -> TokenResult<TokenNode> {
    let value: serde_json::Value = serde_json::from_str(text).map_err(|e| TokenError::Parse {
        file: file.to_path_buf(),
        line: Some(e.line()),
        column: Some(e.column()),
        message: e.to_string(),
    })?;

    TokenNode::from_json(&value).map_err(|TreeError { path, message }| {
        if path.is_empty() {
            TokenError::Parse {
                file: file.to_path_buf(),
                line: None,
                column: None,
                message,
            }
        } else {
            TokenError::InvalidToken {
                file: file.to_path_buf(),
                path,
                message,
            }
        }
    })
}
