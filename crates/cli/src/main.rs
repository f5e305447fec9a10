// vinmerge CLI - reconcile ERP, linkage and web-catalog product exports

mod exit_codes;
mod logging;
mod recon;
mod util;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::EXIT_SUCCESS;

#[derive(Parser)]
#[command(name = "vinmerge")]
#[command(about = "Deduplicate and merge ERP, linkage and web-catalog exports, then report revenue")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Debug-level logging on stderr
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only warnings and errors on stderr
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline from a TOML config file
    #[command(after_help = "\
Examples:
  vinmerge run cellar.vinmerge.toml
  vinmerge run cellar.vinmerge.toml --top 20
  vinmerge run cellar.vinmerge.toml --json
  vinmerge run cellar.vinmerge.toml --output result.json --export-dir out/
  vinmerge run cellar.vinmerge.toml --web exports/web-2021.csv")]
    Run(recon::RunArgs),

    /// Check a config and its source files without running
    #[command(after_help = "\
Examples:
  vinmerge validate cellar.vinmerge.toml")]
    Validate {
        /// Path to the .vinmerge.toml config file
        config: PathBuf,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("VINMERGE_COMMIT"), ")",
            "\nengine:  vinmerge-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("VINMERGE_TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("VINMERGE_COMMIT"), ")",
            "\nengine:  vinmerge-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("VINMERGE_TARGET"),
        )
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Run(args) => recon::cmd_run(args),
        Commands::Validate { config } => recon::cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
