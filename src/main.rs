use std::process::ExitCode;

use clap::Parser;

use valctl::cli::{Cli, Command};
use valctl::commands::{self, exit_codes};
use valctl::logging::init_logging;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
	let cli = Cli::parse();
	init_logging(cli.verbose, cli.quiet);

	let result = match &cli.command {
		Command::Config { command } => commands::config::run(&cli, command),
		Command::Validator { command } => commands::validator::run(&cli, command).await,
		Command::Tx { command } => commands::tx::run(&cli, command).await,
	};

	match result {
		Ok(()) => ExitCode::from(exit_codes::EXIT_SUCCESS),
		Err(err) => {
			eprintln!("Error: {err:#}");
			ExitCode::from(exit_codes::exit_code_for(&err))
		}
	}
}
