use clap::Parser;
use std::process::ExitCode;
use wheelpin::{AppError, Cli, execute, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(e.exit_code());
        }
    };

    init_tracing(config.verbosity);
    tracing::debug!("effective configuration: {:?}", config);

    match execute(&cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ AppError::BatchFailed { .. }) => {
            tracing::warn!("{}", e);
            ExitCode::from(e.exit_code())
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
