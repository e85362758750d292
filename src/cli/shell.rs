//! Interactive console session.
//!
//! Reads command lines from stdin and dispatches them through one [`Shell`], so
//! driver state (a finished calibration, the settings store) persists between
//! commands. Besides the command tree the session understands a few built-ins:
//! `help`, `retval` (status of the previous command), and `exit`/`quit`.

use crate::cli::common::{CliError, CliResult};
use crate::config::Config;
use crate::console::{Console, TerminalConsole};
use crate::constants::APP_NAME;
use crate::shell::Shell;
use clap::Args;
use std::io::{self, BufRead, IsTerminal};
use tracing::debug;

/// Start an interactive console
#[derive(Debug, Clone, Default, Args)]
pub struct ShellArgs {
    /// Disable coloured output
    #[arg(long)]
    pub no_color: bool,
}

/// What the session should do after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    /// Read the next line
    Continue,
    /// End the session
    Exit,
}

/// Console session state kept between lines.
pub struct Session {
    shell: Shell,
    last_status: i32,
}

impl Session {
    /// Fresh session with a `retval` of 0.
    #[must_use]
    pub fn new(shell: Shell) -> Self {
        Self {
            shell,
            last_status: 0,
        }
    }

    /// Status of the last dispatched command.
    #[must_use]
    pub fn last_status(&self) -> i32 {
        self.last_status
    }

    /// Tokenizes and runs one input line.
    pub fn run_line(&mut self, console: &mut dyn Console, line: &str) -> LineOutcome {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            [] => {}
            ["exit"] | ["quit"] => return LineOutcome::Exit,
            ["help"] => self.shell.print_help(console, None),
            ["retval"] => console.print(&self.last_status.to_string()),
            _ => {
                debug!(line, "dispatching console line");
                self.last_status = self.shell.execute(console, &tokens);
            }
        }
        LineOutcome::Continue
    }
}

impl ShellArgs {
    /// Execute the shell command
    pub fn execute(&self, config: &Config) -> CliResult<()> {
        let registry = config
            .build_registry()
            .map_err(|e| CliError::validation(format!("{e:#}")))?;
        let mut session = Session::new(Shell::new(registry, config.shell_options()));

        let stdin = io::stdin();
        let interactive = stdin.is_terminal();
        let mut console = TerminalConsole::new(config.shell.prompt.clone());
        if self.no_color || !interactive {
            console = console.without_color();
        }

        if interactive {
            console.print(&format!(
                "{APP_NAME} v{} - type 'help' for commands",
                env!("CARGO_PKG_VERSION")
            ));
        }

        let mut lines = stdin.lock().lines();
        loop {
            if interactive {
                console.show_prompt();
            }

            let Some(line) = lines.next() else {
                break;
            };
            let line = line.map_err(|e| CliError::io(format!("Failed to read input: {e}")))?;

            if session.run_line(&mut console, &line) == LineOutcome::Exit {
                break;
            }
        }

        if interactive {
            console.print("");
        }

        Ok(())
    }
}
