mod commands;
mod logging;

use abins_core::domain::AbinsError;
use clap::Parser;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match parse_and_dispatch(args, true) {
        Ok(code) => code,
        Err(error) => {
            let error = error.as_abins_error();
            eprintln!("{}", error.diagnostic_line());
            if let Some(summary_line) = error.fatal_exit_line() {
                eprintln!("{}", summary_line);
            }
            error.exit_code()
        }
    }
}

/// Runs one command line without installing a global logger.
#[cfg(test)]
pub(crate) fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    parse_and_dispatch(args.into_iter().map(Into::into).collect(), false)
}

fn parse_and_dispatch(args: Vec<String>, install_logging: bool) -> Result<i32, CliError> {
    let full_args = std::iter::once("abins-rs".to_string())
        .chain(args)
        .collect::<Vec<_>>();

    let cli = match Cli::try_parse_from(&full_args) {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                return Ok(0);
            }
            _ => return Err(CliError::Usage(err.to_string())),
        },
    };

    if install_logging {
        logging::setup_logging(cli.verbose, cli.quiet)?;
    }
    dispatch_parsed(cli.command)
}

#[derive(Parser)]
#[command(
    name = "abins-rs",
    about = "Powder dynamical structure factor S(Q, ω) engine",
    version
)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all log output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Compute S for an input document and save it next to the input
    Calculate(commands::CalculateArgs),
    /// Read a previously saved S without recomputing it
    Load(commands::LoadArgs),
    /// Write saved per-atom spectra as text tables
    Export(commands::ExportArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Calculate(args) => commands::run_calculate_command(args),
        CliCommand::Load(args) => commands::run_load_command(args),
        CliCommand::Export(args) => commands::run_export_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(#[from] AbinsError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_abins_error(&self) -> AbinsError {
        match self {
            Self::Usage(message) => AbinsError::configuration("CONFIG.CLI_USAGE", message.clone()),
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => AbinsError::internal("INTERNAL.CLI", format!("{error:#}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CliError, run};
    use abins_core::domain::{AbinsError, AbinsErrorCategory};

    #[test]
    fn help_exits_successfully() {
        assert_eq!(run(["--help"]).expect("help should succeed"), 0);
    }

    #[test]
    fn unknown_subcommand_is_a_usage_error() {
        let error = run(["simulate"]).expect_err("unknown command should fail");
        assert!(matches!(error, CliError::Usage(_)));
        assert_eq!(
            error.as_abins_error().category(),
            AbinsErrorCategory::ConfigurationError
        );
    }

    #[test]
    fn compute_errors_keep_their_category() {
        let error = CliError::from(AbinsError::unimplemented(
            "UNIMPLEMENTED.SINGLE_CRYSTAL_S",
            "SingleCrystal case not implemented yet.",
        ));
        assert_eq!(error.as_abins_error().exit_code(), 5);
    }
}
