use std::process::ExitCode;

use ngffcheck::NgffError;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match ngffcheck::run() {
        Ok(()) => ExitCode::SUCCESS,
        // The report has already been printed.
        Err(NgffError::ValidationFailed { .. }) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}
