//! Command implementations.

mod build;
mod check;
mod config;

pub use build::{BuildCommand, WatchCommand};
pub use check::CheckCommand;
pub use config::ConfigCommand;
