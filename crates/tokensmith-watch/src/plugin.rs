//! Build-tool integration.

use crate::driver::{DevServer, HotReloadDriver, WatchHandle};
use crate::error::WatchError;
use std::sync::{Arc, Mutex};
use tokensmith_common_config::{BuildStage, ConfigLoader, ParserConfig};
use tokensmith_core::{BuildReport, Pipeline};
use tracing::{debug, info};

/// Build hook stages a host build tool calls into.
pub type HookStage = BuildStage;

/// Runs the token pipeline from a host build tool's hooks and keeps a
/// watch driver bound to its dev server.
pub struct TokensPlugin {
    config: ParserConfig,
    loader: Option<ConfigLoader>,
    watch: Mutex<Option<WatchHandle>>,
}

impl TokensPlugin {
    pub fn new(config: ParserConfig) -> Self {
        Self {
            config,
            loader: None,
            watch: Mutex::new(None),
        }
    }

    /// Load config through `loader` now and again whenever it changes.
    pub fn from_loader(loader: ConfigLoader) -> Result<Self, WatchError> {
        let config = loader.load()?;
        Ok(Self {
            config,
            loader: Some(loader),
            watch: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Run the pipeline if `stage` is the configured `runOn` stage.
    ///
    /// Any pipeline error is returned as a build failure.
    pub async fn hook(&self, stage: HookStage) -> Result<Option<BuildReport>, WatchError> {
        if stage != self.config.run_on {
            debug!(?stage, run_on = ?self.config.run_on, "hook stage skipped");
            return Ok(None);
        }
        let report = Pipeline::new(self.config.clone()).run().await?;
        info!(?stage, artifacts = report.artifacts.len(), "tokens built from build hook");
        Ok(Some(report))
    }

    /// Bind a watch driver to `server`. A driver already bound is replaced.
    pub fn configure_server(&self, server: Arc<dyn DevServer>) -> Result<(), WatchError> {
        let mut driver = HotReloadDriver::new(self.config.clone()).with_dev_server(server);
        if let Some(loader) = &self.loader {
            driver = driver.with_config_loader(loader.clone());
        }
        let handle = driver.spawn()?;

        let mut slot = self.watch.lock().unwrap_or_else(|e| e.into_inner());
        // Dropping the previous handle signals its driver to stop
        *slot = Some(handle);
        Ok(())
    }

    /// Follow the bound driver's events, if a driver is running.
    pub fn subscribe(&self) -> Option<tokio::sync::broadcast::Receiver<crate::DriverEvent>> {
        let mut slot = self.watch.lock().unwrap_or_else(|e| e.into_inner());
        slot.as_mut().map(WatchHandle::subscribe)
    }

    /// Stop the bound driver, if any.
    pub async fn close(&self) -> Result<(), WatchError> {
        let handle = self
            .watch
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        match handle {
            Some(handle) => handle.shutdown().await,
            None => Ok(()),
        }
    }
}
