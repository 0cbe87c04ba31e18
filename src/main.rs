use clap::Parser;
use std::process::ExitCode;

use tlc_gateway::cli::{Cli, execute_command, init_logger_from_settings, load_and_merge_config};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match load_and_merge_config(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return ExitCode::from(2);
        }
    };

    if let Err(e) = init_logger_from_settings(&settings) {
        eprintln!("{:#}", e);
        return ExitCode::from(2);
    }

    match execute_command(&cli, settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = ?e, "Command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
