//! Output formatting utilities for CLI commands.

use serde::Serialize;
use tokensmith_core::{BuildReport, CheckReport, SkippedFile};

use crate::cli::{CommandContext, OutputFormat};
use crate::error::CliError;

/// Types a command can print in either output format.
pub trait FormattedOutput {
    fn format_text(&self, verbose: bool) -> String;
}

/// Print a command result to stdout, unless `--quiet` is set.
pub fn print_output<T>(ctx: &CommandContext, value: &T) -> Result<(), CliError>
where
    T: FormattedOutput + Serialize,
{
    if ctx.quiet {
        return Ok(());
    }
    let output = match ctx.format {
        OutputFormat::Text => value.format_text(ctx.verbose > 0),
        OutputFormat::Json => serde_json::to_string_pretty(value).map_err(|e| {
            CliError::Other(anyhow::anyhow!("JSON serialization failed: {e}"))
        })?,
    };

    println!("{output}");
    Ok(())
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

fn skipped_lines(out: &mut String, skipped: &[SkippedFile]) {
    for file in skipped {
        out.push_str(&format!("\n  skipped {}: {}", file.path.display(), file.reason));
    }
}

impl FormattedOutput for BuildReport {
    fn format_text(&self, verbose: bool) -> String {
        let mut out = format!(
            "Built {} from {} in {} ({} ms)",
            plural(self.artifacts.len(), "file"),
            plural(self.tokens, "token"),
            plural(self.sources, "source"),
            self.elapsed_ms
        );
        if verbose {
            for artifact in &self.artifacts {
                out.push_str(&format!("\n  {}", self.output_dir.join(artifact).display()));
            }
        }
        skipped_lines(&mut out, &self.skipped);
        out
    }
}

impl FormattedOutput for CheckReport {
    fn format_text(&self, _verbose: bool) -> String {
        let mut out = format!(
            "OK: {} in {}, {}",
            plural(self.tokens, "token"),
            plural(self.sources, "source"),
            plural(self.themes, "theme")
        );
        skipped_lines(&mut out, &self.skipped);
        out
    }
}

/// A one-line status message.
#[derive(Debug, Serialize)]
pub struct StatusOutput {
    pub status: &'static str,
    pub message: String,
}

impl StatusOutput {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success",
            message: message.into(),
        }
    }
}

impl FormattedOutput for StatusOutput {
    fn format_text(&self, _verbose: bool) -> String {
        self.message.clone()
    }
}
