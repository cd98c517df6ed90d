//! Config command.

use clap::{Parser, Subcommand};
use tokensmith_common_config::ParserConfig;

use crate::cli::{CommandContext, OutputFormat};
use crate::error::CliError;
use crate::output::{print_output, StatusOutput};
use crate::Exit;

/// Inspect or create the configuration file
#[derive(Debug, Parser)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write a default tokensmith.yaml
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

impl ConfigCommand {
    pub fn execute(&self, ctx: &CommandContext) -> Result<Exit, CliError> {
        match &self.action {
            ConfigAction::Show => show(ctx),
            ConfigAction::Init { force } => init(ctx, *force),
        }
    }
}

fn show(ctx: &CommandContext) -> Result<Exit, CliError> {
    let config = ctx.load_config()?;
    let rendered = match ctx.format {
        OutputFormat::Text => serde_yaml::to_string(&config)
            .map_err(|e| anyhow::anyhow!("YAML serialization failed: {e}"))?,
        OutputFormat::Json => serde_json::to_string_pretty(&config)
            .map_err(|e| anyhow::anyhow!("JSON serialization failed: {e}"))?,
    };
    print!("{rendered}");
    if !rendered.ends_with('\n') {
        println!();
    }
    Ok(Exit::Success)
}

fn init(ctx: &CommandContext, force: bool) -> Result<Exit, CliError> {
    if let Some(existing) = ctx.loader.locate().filter(|p| p.is_file()) {
        if !force {
            return Err(CliError::user(
                format!("config file already exists: {}", existing.display()),
                Some("pass --force to overwrite it"),
            ));
        }
    }

    let path = ctx.loader.save(&ParserConfig::default())?;
    print_output(ctx, &StatusOutput::success(format!("Created {}", path.display())))?;
    Ok(Exit::Success)
}
