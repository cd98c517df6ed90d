//! Build and watch commands.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, ValueHint};
use tokio::sync::broadcast::error::RecvError;
use tokensmith_common_config::ParserConfig;
use tokensmith_common_fs::path::resolve_against;
use tokensmith_core::Pipeline;
use tokensmith_watch::{DriverEvent, HotReloadDriver};
use tracing::{debug, info};

use crate::cli::CommandContext;
use crate::error::CliError;
use crate::output::print_output;
use crate::Exit;

/// Input and output overrides shared by `build` and `watch`.
#[derive(Debug, Clone, Default, Args)]
pub struct PathArgs {
    /// Token input directory (repeatable, replaces paths.input)
    #[arg(short, long, value_hint = ValueHint::DirPath)]
    pub input: Vec<PathBuf>,

    /// Output directory (replaces paths.output)
    #[arg(short, long, value_hint = ValueHint::DirPath)]
    pub output: Option<PathBuf>,
}

impl PathArgs {
    fn is_empty(&self) -> bool {
        self.input.is_empty() && self.output.is_none()
    }

    /// Apply overrides; relative paths resolve against `cwd`.
    fn apply(&self, config: &mut ParserConfig, cwd: &Path) {
        if !self.input.is_empty() {
            config.paths.input = self
                .input
                .iter()
                .map(|p| resolve_against(cwd, p))
                .collect();
        }
        if let Some(output) = &self.output {
            config.paths.output = resolve_against(cwd, output);
        }
    }
}

/// Build every configured output
#[derive(Debug, Parser)]
pub struct BuildCommand {
    /// Keep running and rebuild on change
    #[arg(short, long)]
    pub watch: bool,

    #[command(flatten)]
    pub paths: PathArgs,
}

impl BuildCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<Exit, CliError> {
        let mut config = ctx.load_config()?;
        if !self.paths.is_empty() {
            let cwd = std::env::current_dir()?;
            self.paths.apply(&mut config, &cwd);
            ctx.loader.validate(&config)?;
        }

        if self.watch {
            return watch(ctx, config, self.paths.is_empty()).await;
        }

        let report = Pipeline::new(config).run().await?;
        print_output(ctx, &report)?;
        Ok(Exit::Success)
    }
}

/// Build, then rebuild on change
#[derive(Debug, Parser)]
pub struct WatchCommand {
    #[command(flatten)]
    pub paths: PathArgs,
}

impl WatchCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<Exit, CliError> {
        BuildCommand {
            watch: true,
            paths: self.paths.clone(),
        }
        .execute(ctx)
        .await
    }
}

/// Run the hot reload driver until Ctrl-C.
///
/// Config file changes are only followed when no path overrides were
/// given, since a reload would drop them.
async fn watch(ctx: &CommandContext, config: ParserConfig, reload_config: bool) -> Result<Exit, CliError> {
    let mut driver = HotReloadDriver::new(config);
    if reload_config {
        driver = driver.with_config_loader(ctx.loader.clone());
    }
    let mut handle = driver.spawn()?;
    let mut events = handle.subscribe();
    info!("watching for changes, press Ctrl-C to stop");

    let exit = loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                break Exit::Interrupted;
            }
            event = events.recv() => match event {
                Ok(DriverEvent::Built(report)) => print_output(ctx, &report)?,
                // The driver logs failures and rejected configs itself
                Ok(other) => debug!(event = ?other, "driver event"),
                Err(RecvError::Lagged(missed)) => debug!(missed, "skipped driver events"),
                Err(RecvError::Closed) => {
                    return Err(CliError::Watch {
                        message: "watch driver stopped unexpectedly".to_string(),
                        source: None,
                    });
                }
            },
        }
    };

    handle.shutdown().await?;
    info!("watch stopped");
    Ok(exit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_args_resolve_against_cwd() {
        let args = PathArgs {
            input: vec![PathBuf::from("./tokens"), PathBuf::from("/abs/more")],
            output: Some(PathBuf::from("../out")),
        };
        let mut config = ParserConfig::default();
        args.apply(&mut config, Path::new("/work"));

        assert_eq!(
            config.paths.input,
            vec![PathBuf::from("/work/tokens"), PathBuf::from("/abs/more")]
        );
        assert_eq!(config.paths.output, PathBuf::from("/out"));
    }

    #[test]
    fn test_empty_path_args_leave_config_alone() {
        let args = PathArgs::default();
        assert!(args.is_empty());

        let mut config = ParserConfig::default();
        args.apply(&mut config, Path::new("/work"));
        assert_eq!(config, ParserConfig::default());
    }
}
