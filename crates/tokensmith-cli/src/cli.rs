//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{ArgAction, CommandFactory, Parser, Subcommand, ValueHint};
use tokensmith_common_config::{ConfigLoader, ParserConfig};

use crate::commands::{BuildCommand, CheckCommand, ConfigCommand, WatchCommand};
use crate::error::CliError;
use crate::Exit;

/// Tokensmith - design token pipeline
///
/// Turns directories of JSON design tokens into JSON, SCSS, CSS custom
/// properties, a themed bundle and an entry module.
#[derive(Debug, Parser)]
#[command(
    name = "tokensmith",
    author,
    version,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true,
        help = "Increase verbosity level"
    )]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(
        short,
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Suppress non-error output"
    )]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "TOKENSMITH_CONFIG",
        value_hint = ValueHint::FilePath,
        help = "Path to configuration file"
    )]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        value_enum,
        help = "Output format (text, json)"
    )]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Available subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build every configured output once
    Build(BuildCommand),

    /// Load and resolve tokens without writing anything
    Check(CheckCommand),

    /// Build, then rebuild on every change (same as `build --watch`)
    Watch(WatchCommand),

    /// Inspect or create the configuration file
    Config(ConfigCommand),

    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsCommand),
}

/// Shell completions generation
#[derive(Debug, Parser)]
pub struct CompletionsCommand {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

impl CompletionsCommand {
    pub fn execute(&self) -> Result<Exit, CliError> {
        let mut cmd = Cli::command();
        clap_complete::generate(self.shell, &mut cmd, "tokensmith", &mut std::io::stdout());
        Ok(Exit::Success)
    }
}

/// State shared by every command.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub loader: ConfigLoader,
    pub format: OutputFormat,
    pub verbose: u8,
    pub quiet: bool,
}

impl CommandContext {
    /// Load and validate the configuration.
    pub fn load_config(&self) -> Result<ParserConfig, CliError> {
        Ok(self.loader.load()?)
    }
}

impl Cli {
    /// Config loader for `--config`, or the working directory.
    pub fn config_loader(&self) -> ConfigLoader {
        match &self.config {
            Some(path) => ConfigLoader::from_file(path),
            None => ConfigLoader::default(),
        }
    }

    /// Execute the selected command
    pub async fn execute(self) -> Result<Exit, CliError> {
        let ctx = CommandContext {
            loader: self.config_loader(),
            format: self.format,
            verbose: self.verbose,
            quiet: self.quiet,
        };

        match self.command {
            Command::Build(cmd) => cmd.execute(&ctx).await,
            Command::Check(cmd) => cmd.execute(&ctx).await,
            Command::Watch(cmd) => cmd.execute(&ctx).await,
            Command::Config(cmd) => cmd.execute(&ctx),
            Command::Completions(cmd) => cmd.execute(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_build_flags() {
        let cli = Cli::try_parse_from([
            "tokensmith", "build", "--watch", "--input", "a", "--input", "b", "--output", "out",
        ])
        .unwrap();
        match cli.command {
            Command::Build(cmd) => {
                assert!(cmd.watch);
                assert_eq!(cmd.paths.input, vec![PathBuf::from("a"), PathBuf::from("b")]);
                assert_eq!(cmd.paths.output, Some(PathBuf::from("out")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["tokensmith", "-q", "-v", "check"]).is_err());
    }

    #[test]
    fn test_global_format_flag() {
        let cli = Cli::try_parse_from(["tokensmith", "check", "--format", "json"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
    }
}
