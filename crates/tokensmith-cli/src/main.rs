//! Tokensmith CLI
//!
//! Main entry point for the `tokensmith` binary.

use std::process::ExitCode;

use clap::Parser;
use tokensmith_common_config::Environment;
use tokensmith_common_log::LogConfig;

mod cli;
mod commands;
mod error;
mod output;

use cli::Cli;
use error::CliError;

/// Application exit codes
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Success = 0,
    GeneralError = 1,
    ConfigError = 2,
    IoError = 3,
    TokenError = 4,
    WatchError = 5,
    Interrupted = 130,
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        ExitCode::from(exit as u8)
    }
}

fn main() -> ExitCode {
    let _env = Environment::init();
    let cli = Cli::parse();

    if let Err(e) = tokensmith_common_log::init(LogConfig::from_verbosity(cli.verbose, cli.quiet)) {
        eprintln!("warning: {e}");
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("{}", CliError::from(e).render());
            return Exit::GeneralError.into();
        }
    };

    match runtime.block_on(cli.execute()) {
        Ok(exit) => exit.into(),
        Err(e) => {
            tracing::debug!(code = e.code(), error = ?e, "command failed");
            eprintln!("{}", e.render());
            e.exit().into()
        }
    }
}
