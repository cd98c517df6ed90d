//! Watch mode and dev-server integration for Tokensmith.
//!
//! [`TokenWatcher`] turns file system notifications into [`WatchEvent`]s,
//! [`HotReloadDriver`] re-runs the pipeline on them and [`TokensPlugin`]
//! exposes both to a host build tool.

pub mod driver;
pub mod error;
pub mod plugin;
pub mod watcher;

pub use driver::{DevServer, DriverEvent, HotReloadDriver, HotUpdate, WatchHandle};
pub use error::WatchError;
pub use plugin::{HookStage, TokensPlugin};
pub use watcher::{TokenWatcher, WatchEvent, WatchScope};
