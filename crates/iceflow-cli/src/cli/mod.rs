mod commands;
mod helpers;

use clap::Parser;
use iceflow_core::domain::IceflowError;

pub fn run_from_env() -> i32 {
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{err}");
                return 0;
            }
            _ => {
                eprintln!("{err}");
                return 2;
            }
        },
    };

    match dispatch(cli.command) {
        Ok(code) => code,
        Err(error) => {
            let core_error = error.as_core_error();
            eprintln!("error: {core_error}");
            core_error.exit_code()
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Parser)]
#[command(name = "iceflow-rs", about = "Ice-sheet boundary forcing driver")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Build the configured forcing chains and step them over an interval
    Run(commands::RunArgs),
    /// Classify grid columns and derive the surface elevation
    Mask(commands::MaskArgs),
}

fn dispatch(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Run(args) => commands::run_run_command(args),
        CliCommand::Mask(args) => commands::run_mask_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Core(#[from] IceflowError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_core_error(&self) -> IceflowError {
        match self {
            Self::Usage(message) => IceflowError::configuration(message.clone()),
            Self::Core(error) => error.clone(),
            Self::Internal(error) => IceflowError::io_system(format!("{error:#}")),
        }
    }
}
