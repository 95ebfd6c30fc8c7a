//! Greencart CLI

use std::{io, process::ExitCode};

use jiff::Timestamp;
use tracing::error;

use greencart::{cli, config::Config, observability};

/// Greencart CLI entry point
#[tokio::main]
pub async fn main() -> ExitCode {
    // Load configuration from .env and CLI arguments
    let config = match Config::load() {
        Ok(config) => config,
        Err(error) => error.exit(),
    };

    if let Err(error) = observability::init_subscriber(&config.logging) {
        #[expect(
            clippy::print_stderr,
            reason = "logging failed to initialise, must use eprintln"
        )]
        {
            eprintln!("Logging error: {error}");
        }

        return ExitCode::FAILURE;
    }

    let mut out = io::stdout().lock();

    match cli::run(&config, Timestamp::now(), &mut out).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");

            #[expect(
                clippy::print_stderr,
                reason = "command errors are reported to the user, not only the log"
            )]
            {
                eprintln!("{err}");
            }

            ExitCode::FAILURE
        }
    }
}
