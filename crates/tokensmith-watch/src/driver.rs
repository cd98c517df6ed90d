//! Hot reload driver.
//!
//! One task owns the watcher and the pipeline, so runs never overlap.
//! Changes that arrive during a run queue up in the watcher channel and
//! are coalesced into a single follow-up run.

use crate::error::WatchError;
use crate::watcher::{TokenWatcher, WatchEvent, WatchScope};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tokensmith_common_config::{ConfigLoader, ParserConfig};
use tokensmith_core::{BuildReport, Pipeline};
use tracing::{debug, error, info, warn};

/// Update pushed to connected dev-server clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotUpdate {
    FullReload,
}

/// The dev server a driver reports rebuilds to.
pub trait DevServer: Send + Sync {
    /// Drop the cached module with this id.
    fn invalidate_module(&self, id: &str);

    /// Notify connected clients.
    fn send_update(&self, update: HotUpdate);
}

/// What happened in the driver, for callers that want to follow along.
#[derive(Debug, Clone)]
pub enum DriverEvent {
    Built(BuildReport),
    Failed(String),
    ConfigReloaded,
    ConfigRejected(String),
}

#[derive(Debug, Default)]
struct Batch {
    changed: Vec<PathBuf>,
    config: bool,
}

impl Batch {
    fn add(&mut self, event: WatchEvent) {
        match event {
            WatchEvent::TokensChanged(path) | WatchEvent::TokensRemoved(path) => {
                if !self.changed.contains(&path) {
                    self.changed.push(path);
                }
            }
            WatchEvent::ConfigChanged => self.config = true,
        }
    }
}

/// Re-runs the pipeline on change and drives an optional dev server.
pub struct HotReloadDriver {
    config: ParserConfig,
    loader: Option<ConfigLoader>,
    server: Option<Arc<dyn DevServer>>,
    debounce: Duration,
    initial_run: bool,
}

impl HotReloadDriver {
    pub fn new(config: ParserConfig) -> Self {
        let debounce = Duration::from_millis(config.watch.debounce_ms);
        Self {
            config,
            loader: None,
            server: None,
            debounce,
            initial_run: true,
        }
    }

    /// Reload config through `loader` when its file changes.
    pub fn with_config_loader(mut self, loader: ConfigLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn with_dev_server(mut self, server: Arc<dyn DevServer>) -> Self {
        self.server = Some(server);
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Skip the build that normally runs as soon as the driver starts.
    pub fn without_initial_run(mut self) -> Self {
        self.initial_run = false;
        self
    }

    fn scope(&self, config: &ParserConfig) -> Result<WatchScope, WatchError> {
        let config_files = self
            .loader
            .as_ref()
            .map(ConfigLoader::candidates)
            .unwrap_or_default();
        WatchScope::new(config, config_files)
    }

    /// Start watching on the current tokio runtime.
    pub fn spawn(self) -> Result<WatchHandle, WatchError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| WatchError::NoRuntime)?;
        let watcher = TokenWatcher::new(self.scope(&self.config)?)?;

        let (events, first_receiver) = broadcast::channel(64);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let sender = events.clone();
        let task = runtime.spawn(self.run_loop(watcher, sender, shutdown_rx));

        Ok(WatchHandle {
            shutdown: Some(shutdown_tx),
            task: Some(task),
            events,
            first_receiver: Some(first_receiver),
        })
    }

    async fn run_loop(
        mut self,
        mut watcher: TokenWatcher,
        events: broadcast::Sender<DriverEvent>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        let mut pipeline = Pipeline::new(self.config.clone());
        if self.initial_run {
            self.build(&pipeline, &events).await;
        }

        loop {
            let first = tokio::select! {
                _ = &mut shutdown => break,
                event = watcher.next_event() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            let mut batch = Batch::default();
            batch.add(first);
            let window = tokio::time::sleep(self.debounce);
            tokio::pin!(window);
            loop {
                tokio::select! {
                    _ = &mut window => break,
                    event = watcher.next_event() => match event {
                        Some(event) => batch.add(event),
                        None => break,
                    },
                }
            }
            debug!(changed = batch.changed.len(), config = batch.config, "change batch");

            if batch.config {
                match self.reload_config() {
                    Ok(Some(config)) => {
                        match self.scope(&config).and_then(TokenWatcher::new) {
                            Ok(new_watcher) => watcher = new_watcher,
                            Err(e) => warn!(error = %e, "keeping previous watch set"),
                        }
                        info!("config reloaded");
                        pipeline = Pipeline::new(config.clone());
                        self.config = config;
                        let _ = events.send(DriverEvent::ConfigReloaded);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!(error = %e, "invalid config, keeping previous config");
                        let _ = events.send(DriverEvent::ConfigRejected(e.to_string()));
                        if batch.changed.is_empty() {
                            continue;
                        }
                    }
                }
            }

            self.build(&pipeline, &events).await;
        }

        debug!("watch driver stopped");
    }

    fn reload_config(&self) -> Result<Option<ParserConfig>, WatchError> {
        let Some(loader) = &self.loader else {
            return Ok(None);
        };
        let config = loader.load()?;
        Ok((config != self.config).then_some(config))
    }

    async fn build(&self, pipeline: &Pipeline, events: &broadcast::Sender<DriverEvent>) {
        match pipeline.run().await {
            Ok(report) => {
                if let Some(server) = &self.server {
                    if let Some(id) = self.config.entry_module_id() {
                        server.invalidate_module(&id);
                    }
                    server.send_update(HotUpdate::FullReload);
                }
                let _ = events.send(DriverEvent::Built(report));
            }
            Err(e) => {
                error!(error = %e, kind = e.kind(), "token build failed, keeping previous output");
                let _ = events.send(DriverEvent::Failed(e.to_string()));
            }
        }
    }
}

/// Handle to a running driver.
pub struct WatchHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
    events: broadcast::Sender<DriverEvent>,
    first_receiver: Option<broadcast::Receiver<DriverEvent>>,
}

impl WatchHandle {
    /// Follow driver events. The first subscriber sees every event since
    /// the driver started.
    pub fn subscribe(&mut self) -> broadcast::Receiver<DriverEvent> {
        self.first_receiver
            .take()
            .unwrap_or_else(|| self.events.subscribe())
    }

    /// Stop the driver and wait for it to release the file watcher.
    pub async fn shutdown(mut self) -> Result<(), WatchError> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        match self.task.take() {
            Some(task) => task.await.map_err(|e| WatchError::Task(e.to_string())),
            None => Ok(()),
        }
    }

    /// Whether the driver task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}
