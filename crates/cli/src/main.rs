use std::process::ExitCode;

use clap::Parser;

use farmdb_cli::cli::Cli;
use farmdb_cli::commands::inset;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let opts = match cli.validate() {
        Ok(opts) => opts,
        Err(message) => {
            eprintln!("Error: {message}");
            return ExitCode::from(2);
        }
    };

    match inset::run(&opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
