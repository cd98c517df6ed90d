//! Parsed token sources in processing order.

use crate::token::TokenNode;
use std::path::{Path, PathBuf};

/// One parsed token file.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenSource {
    /// Input root the file was found under.
    pub root: PathBuf,
    /// Final component of `root`.
    pub root_name: String,
    /// Path relative to `root`.
    pub relative: PathBuf,
    /// Relative path without extension, split on directories.
    pub group: Vec<String>,
    pub tree: TokenNode,
}

impl TokenSource {
    pub fn new(root: impl Into<PathBuf>, relative: impl Into<PathBuf>, tree: TokenNode) -> Self {
        let root = root.into();
        let relative = relative.into();
        let root_name = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let group = group_path(&relative);
        Self {
            root,
            root_name,
            relative,
            group,
            tree,
        }
    }

    /// Dotted group path, e.g. `color.brand` for `color/brand.json`.
    pub fn group_name(&self) -> String {
        self.group.join(".")
    }

    /// Absolute path of the source file.
    pub fn file_path(&self) -> PathBuf {
        self.root.join(&self.relative)
    }
}

/// Group path of a root-relative file path.
pub fn group_path(relative: &Path) -> Vec<String> {
    let without_ext = relative.with_extension("");
    without_ext
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(s) => Some(s.to_string_lossy().to_string()),
            _ => None,
        })
        .collect()
}

/// Every source of one run, sorted by root order then relative path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenForest {
    pub sources: Vec<TokenSource>,
}

impl TokenForest {
    pub fn new(sources: Vec<TokenSource>) -> Self {
        Self { sources }
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Total number of leaf tokens across all sources.
    pub fn token_count(&self) -> usize {
        self.sources.iter().map(|s| s.tree.leaf_count()).sum()
    }

    /// Every source's content deep-merged in processing order.
    pub fn merged_content(&self) -> TokenNode {
        let mut merged = TokenNode::default();
        for source in &self.sources {
            merged.merge_from(&source.tree);
        }
        merged
    }

    /// Every source nested under its group path, and under its root
    /// directory name when `include_root` is set.
    pub fn nested_tree(&self, include_root: bool) -> TokenNode {
        let mut merged = TokenNode::default();
        for source in &self.sources {
            let mut path = Vec::with_capacity(source.group.len() + 1);
            if include_root && !source.root_name.is_empty() {
                path.push(source.root_name.clone());
            }
            path.extend(source.group.iter().cloned());
            merged.merge_from(&source.tree.clone().nest(&path));
        }
        merged
    }
}
