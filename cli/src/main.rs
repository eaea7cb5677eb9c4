//! `cloudctl`: list, show, create, update and delete platform resources.

mod args;
mod commands;
mod kv;
mod output;
mod runtime;

use std::io::Write;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use cloud_core::{ApiError, Client};

use crate::args::Cli;

fn run(cli: &Cli) -> Result<()> {
    let config = runtime::load_config(cli)?;
    let client = Client::from_config(&config, &cli.prefix)?;
    tracing::debug!(endpoint = %client.executor().endpoint().base(), "client ready");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    commands::run(&cli.command, cli.format, &client, &mut out)?;
    out.flush()?;
    Ok(())
}

/// `error: <message> (<kind>)`; connection failures keep their attempt count.
fn error_line(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ApiError>() {
        Some(api @ ApiError::ConnectionFailure { .. }) => {
            format!("error: {api} ({})", api.kind())
        }
        Some(api) => format!("error: {} ({})", api.message(), api.kind()),
        None => format!("error: {err:#}"),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    runtime::init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", error_line(&err));
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloud_core::ErrorKind;

    #[test]
    fn exhausted_connection_failure_reports_attempts() {
        let err = anyhow::Error::new(ApiError::ConnectionFailure {
            attempts: 3,
            message: "connection refused".to_string(),
        });
        assert_eq!(
            error_line(&err),
            "error: connection failed after 3 attempt(s): connection refused (ConnectionFailure)"
        );
    }

    #[test]
    fn api_errors_print_message_and_kind() {
        let err = anyhow::Error::new(ApiError::Api {
            kind: ErrorKind::NotFound,
            status: 404,
            message: "Network n1 could not be found.".to_string(),
        });
        assert_eq!(
            error_line(&err),
            "error: Network n1 could not be found. (NotFound)"
        );
    }

    #[test]
    fn other_errors_print_their_chain() {
        let err = anyhow::anyhow!("bad flag").context("parsing --query");
        assert_eq!(error_line(&err), "error: parsing --query: bad flag");
    }
}
