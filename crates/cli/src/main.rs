//! Entry point for the command-line interface.

use sastgate::args::parse_cli;
use sastgate::init_logging;
use sastgate::run::{run, ERROR_EXIT_CODE};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = parse_cli();
    init_logging(cli.debug, cli.quiet);
    match run(cli) {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(ERROR_EXIT_CODE)
        }
    }
}
