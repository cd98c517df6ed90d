use crate::error::WatchError;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokensmith_common_config::ParserConfig;
use tokensmith_common_fs::FileFilter;
use tokensmith_core::loader::build_filter;
use tracing::{debug, trace};

/// A change relevant to the token build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    TokensChanged(PathBuf),
    TokensRemoved(PathBuf),
    ConfigChanged,
}

/// What to watch and which paths count.
#[derive(Debug, Clone)]
pub struct WatchScope {
    roots: Vec<PathBuf>,
    output: PathBuf,
    filter: FileFilter,
    config_files: Vec<PathBuf>,
}

/// Canonicalize through the nearest existing ancestor, so paths that do
/// not exist yet compare equal to the paths notify reports.
fn canonical(path: &Path) -> PathBuf {
    let mut existing = path;
    let mut rest = Vec::new();
    loop {
        if let Ok(base) = std::fs::canonicalize(existing) {
            return rest.iter().rev().fold(base, |acc, name| acc.join(name));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name.to_os_string());
                existing = parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}

impl WatchScope {
    /// Input roots and the themes directory of `config`, plus the given
    /// config file candidates.
    pub fn new(config: &ParserConfig, config_files: Vec<PathBuf>) -> Result<Self, WatchError> {
        let mut roots: Vec<PathBuf> = config.paths.input.iter().map(|p| canonical(p)).collect();
        if let Some(themes) = &config.themes_dir {
            roots.push(canonical(themes));
        }
        let filter = build_filter(&config.include_globs, &config.exclude_globs)?;
        Ok(Self {
            roots,
            output: canonical(config.output_dir()),
            filter,
            config_files: config_files.iter().map(|p| canonical(p)).collect(),
        })
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Map a raw notify event to a watch event, if it matters.
    pub fn classify(&self, event: &Event) -> Option<WatchEvent> {
        let removed = match &event.kind {
            EventKind::Create(_) | EventKind::Modify(_) => false,
            EventKind::Remove(_) => true,
            _ => return None,
        };

        for path in &event.paths {
            if self.config_files.iter().any(|c| c == path) {
                return Some(WatchEvent::ConfigChanged);
            }
            if path.starts_with(&self.output) {
                continue;
            }
            let matched = self.roots.iter().find_map(|root| path.strip_prefix(root).ok());
            let Some(relative) = matched else { continue };
            if !self.filter.matches(relative) {
                continue;
            }
            return Some(if removed {
                WatchEvent::TokensRemoved(path.clone())
            } else {
                WatchEvent::TokensChanged(path.clone())
            });
        }
        None
    }
}

/// Watches token roots and config files for changes.
pub struct TokenWatcher {
    _watcher: RecommendedWatcher,
    receiver: mpsc::Receiver<WatchEvent>,
}

impl TokenWatcher {
    pub fn new(scope: WatchScope) -> Result<Self, WatchError> {
        let (tx, rx) = mpsc::channel(256);

        let classifier = scope.clone();
        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    trace!(?event, "raw file event");
                    if let Some(watch_event) = classifier.classify(&event) {
                        let _ = tx.blocking_send(watch_event);
                    }
                }
                Err(e) => debug!(error = %e, "watch backend error"),
            }
        })?;

        for root in &scope.roots {
            if root.is_dir() {
                watcher.watch(root, RecursiveMode::Recursive)?;
            }
        }

        let mut config_dirs: Vec<&Path> = scope.config_files.iter().filter_map(|p| p.parent()).collect();
        config_dirs.sort();
        config_dirs.dedup();
        for dir in config_dirs {
            if dir.is_dir() && !scope.roots.iter().any(|r| dir.starts_with(r)) {
                watcher.watch(dir, RecursiveMode::NonRecursive)?;
            }
        }

        debug!(roots = scope.roots.len(), "watching token sources");
        Ok(Self {
            _watcher: watcher,
            receiver: rx,
        })
    }

    pub async fn next_event(&mut self) -> Option<WatchEvent> {
        self.receiver.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, ModifyKind, RemoveKind};
    use tempfile::TempDir;

    fn scope(dir: &Path) -> WatchScope {
        let tokens = dir.join("tokens");
        std::fs::create_dir_all(&tokens).unwrap();
        let mut config = ParserConfig::default();
        config.paths.input = vec![tokens];
        config.paths.output = dir.join("tokens/dist");
        config.exclude_globs = vec!["drafts/**".to_string()];
        WatchScope::new(&config, vec![dir.join("tokensmith.yaml")]).unwrap()
    }

    fn tokens_root(dir: &Path) -> PathBuf {
        canonical(&dir.join("tokens"))
    }

    fn event(kind: EventKind, path: PathBuf) -> Event {
        Event::new(kind).add_path(path)
    }

    #[test]
    fn test_classify_token_changes() {
        let dir = TempDir::new().unwrap();
        let scope = scope(dir.path());
        let file = tokens_root(dir.path()).join("color.json");

        assert_eq!(
            scope.classify(&event(EventKind::Create(CreateKind::File), file.clone())),
            Some(WatchEvent::TokensChanged(file.clone()))
        );
        assert_eq!(
            scope.classify(&event(
                EventKind::Modify(ModifyKind::Data(DataChange::Content)),
                file.clone()
            )),
            Some(WatchEvent::TokensChanged(file.clone()))
        );
        assert_eq!(
            scope.classify(&event(EventKind::Remove(RemoveKind::File), file.clone())),
            Some(WatchEvent::TokensRemoved(file))
        );
    }

    #[test]
    fn test_classify_ignores_irrelevant_paths() {
        let dir = TempDir::new().unwrap();
        let scope = scope(dir.path());
        let root = tokens_root(dir.path());
        let modify = || EventKind::Modify(ModifyKind::Data(DataChange::Content));

        assert_eq!(scope.classify(&event(modify(), root.join("notes.txt"))), None);
        assert_eq!(scope.classify(&event(modify(), root.join("drafts/wip.json"))), None);
        assert_eq!(scope.classify(&event(modify(), root.join("dist/color.json"))), None);
        assert_eq!(
            scope.classify(&event(EventKind::Access(notify::event::AccessKind::Any), root.join("a.json"))),
            None
        );
    }

    #[test]
    fn test_classify_config_change() {
        let dir = TempDir::new().unwrap();
        let scope = scope(dir.path());
        let config = canonical(dir.path()).join("tokensmith.yaml");

        assert_eq!(
            scope.classify(&event(EventKind::Create(CreateKind::File), config)),
            Some(WatchEvent::ConfigChanged)
        );
    }

    #[tokio::test]
    async fn test_watcher_reports_written_file() {
        let dir = TempDir::new().unwrap();
        let mut watcher = TokenWatcher::new(scope(dir.path())).unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        let file = dir.path().join("tokens/color.json");
        tokio::fs::write(&file, r##"{ "bg": "#fff" }"##).await.unwrap();

        let event = tokio::time::timeout(std::time::Duration::from_secs(10), watcher.next_event())
            .await
            .expect("no file event within timeout");
        assert!(matches!(event, Some(WatchEvent::TokensChanged(path)) if path.ends_with("color.json")));
    }
}
