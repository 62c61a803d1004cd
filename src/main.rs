use clap::Parser;
use std::env;
use std::process::ExitCode;
use tidy_tree::cli::{Cli, run_cli};
use tidy_tree::logging::init_logger;
use tidy_tree::output::OutputFormatter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let cwd = match env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            OutputFormatter::error(&format!("Cannot determine current directory: {}", e));
            return ExitCode::FAILURE;
        }
    };

    match run_cli(&cli, &cwd) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&format!("Error: {}", e));
            ExitCode::FAILURE
        }
    }
}
