//! `scenario-call` binary: expands scenario calls in Gherkin feature files.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;

use scenario_call_cli::commands::{self, DataFiles, ExpandOptions};
use scenario_call_cli::config::{CliConfig, LogLevel};
use scenario_call_cli::error::{CliError, EXIT_CONFIG};
use scenario_call_cli::logging::init_logging;

/// Expand scenario calls in Gherkin feature files.
#[derive(Parser, Debug)]
#[command(name = "scenario-call", version, about)]
struct Cli {
    /// Log level (trace, debug, info, warn, error, off).
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,
    /// Directory searched for called features [default: working directory].
    #[arg(long, global = true)]
    root: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct DataArgs {
    /// JSON file of extra call phrases keyed by language tag.
    #[arg(long, value_name = "FILE")]
    phrases: Option<PathBuf>,
    /// JSON dialect table replacing the bundled keyword data.
    #[arg(long, value_name = "FILE")]
    dialects: Option<PathBuf>,
}

impl From<DataArgs> for DataFiles {
    fn from(args: DataArgs) -> Self {
        Self {
            phrases: args.phrases,
            dialects: args.dialects,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Expand the scenario calls of feature files.
    Expand {
        /// Write each expanded file into this directory instead of stdout.
        #[arg(long, short = 'o', value_name = "DIR")]
        output_dir: Option<PathBuf>,
        #[command(flatten)]
        data: DataArgs,
        /// Feature files to expand.
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },
    /// List supported languages and whether they have localised call
    /// phrases.
    Languages {
        #[command(flatten)]
        data: DataArgs,
    },
}

fn build_config(cli: &Cli) -> Result<CliConfig, CliError> {
    let config = CliConfig::from_env()?;
    Ok(config.apply_overrides(cli.log_level, cli.root.clone()))
}

fn run(config: &CliConfig, command: Command) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    match command {
        Command::Expand {
            output_dir,
            data,
            files,
        } => {
            let options = ExpandOptions {
                files,
                output_dir,
                data: data.into(),
            };
            commands::expand(config, &options, &mut stdout)
        }
        Command::Languages { data } => commands::languages(&data.into(), &mut stdout),
    }
}

fn exit_code(code: i32) -> ExitCode {
    u8::try_from(code).map_or(ExitCode::FAILURE, ExitCode::from)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            init_logging(&CliConfig::default());
            error!(error = %e, "invalid configuration");
            return exit_code(EXIT_CONFIG);
        }
    };
    init_logging(&config);

    match run(&config, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "scenario-call failed");
            exit_code(e.exit_code())
        }
    }
}
