//! Exec command for running a single console command line.

use crate::cli::common::{CliError, CliResult};
use crate::config::Config;
use crate::console::TerminalConsole;
use crate::shell::Shell;
use clap::Args;
use tracing::info;

/// Run one console command, e.g. `ec adc0 calibration start`
#[derive(Debug, Clone, Args)]
pub struct ExecArgs {
    /// Command tokens
    #[arg(
        value_name = "TOKENS",
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub tokens: Vec<String>,

    /// Disable coloured output
    #[arg(long)]
    pub no_color: bool,
}

impl ExecArgs {
    /// Execute the exec command
    pub fn execute(&self, config: &Config) -> CliResult<()> {
        let registry = config
            .build_registry()
            .map_err(|e| CliError::validation(format!("{e:#}")))?;
        let shell = Shell::new(registry, config.shell_options());

        let mut console = TerminalConsole::new(config.shell.prompt.clone());
        if self.no_color {
            console = console.without_color();
        }

        let tokens: Vec<&str> = self.tokens.iter().map(String::as_str).collect();
        info!(command = %tokens.join(" "), "executing console command");

        status_result(shell.execute(&mut console, &tokens))
    }
}

/// Zero and positive statuses are accepted results; only negative ones fail.
fn status_result(status: i32) -> CliResult<()> {
    if status < 0 {
        Err(CliError::command(status))
    } else {
        Ok(())
    }
}
