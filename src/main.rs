//! EC Matrix Console - calibration shell for EC keyboard matrices
//!
//! Enumerates the configured matrix devices and exposes them through a console
//! command tree (`ec <device> calibration start|save|load`, `ec <device> scan_rate`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ecmatrix::cli::{CliError, DevicesArgs, ExecArgs, ExitCode, ShellArgs};
use ecmatrix::config::Config;

/// EC Matrix Console - enumerate and calibrate EC keyboard matrices
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config.toml (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List configured matrix devices
    Devices(DevicesArgs),
    /// Run a single console command
    Exec(ExecArgs),
    /// Start an interactive console (default)
    Shell(ShellArgs),
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<Config, CliError> {
    let result = match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    result.map_err(|e| CliError::validation(format!("{e:#}")))
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = load_config(cli.config.as_ref()).and_then(|config| match &cli.command {
        Some(Command::Devices(args)) => args.execute(&config),
        Some(Command::Exec(args)) => args.execute(&config),
        Some(Command::Shell(args)) => args.execute(&config),
        None => ShellArgs::default().execute(&config),
    });

    let exit_code = match result {
        Ok(()) => ExitCode::Success,
        Err(err) => {
            eprintln!("Error: {err}");
            err.exit_code
        }
    };
    std::process::exit(exit_code.code());
}
