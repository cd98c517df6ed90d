//! Check command.

use clap::Parser;
use tokensmith_core::Pipeline;

use crate::cli::CommandContext;
use crate::error::CliError;
use crate::output::print_output;
use crate::Exit;

/// Load and resolve every source and theme without writing output
#[derive(Debug, Parser)]
pub struct CheckCommand {}

impl CheckCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<Exit, CliError> {
        let config = ctx.load_config()?;
        let report = Pipeline::new(config).check().await?;
        print_output(ctx, &report)?;
        Ok(Exit::Success)
    }
}
