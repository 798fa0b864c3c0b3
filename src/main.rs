//! perfstat CLI entry point.

use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use perfstat::cli::{error_line, Args};
use perfstat::error::{EXIT_OK, EXIT_USAGE};
use perfstat::run::{exit_code, report, run, RunConfig};
use perfstat_core::CancelToken;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse command line arguments
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.print().context("failed to print usage")?;
            return Ok(ExitCode::from(EXIT_OK));
        }
        Err(e) => {
            eprintln!("perfstat: {}", error_line(&e));
            return Ok(ExitCode::from(EXIT_USAGE));
        }
    };

    // Set up logging on stderr, stdout carries the records
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| args.log_level().into()),
        )
        .with_writer(io::stderr)
        .init();

    let config = match RunConfig::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("perfstat: {e}");
            return Ok(ExitCode::from(e.exit_code()));
        }
    };

    // Stop between records on Ctrl-C
    let cancel = CancelToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, stopping");
                cancel.cancel();
            }
        })
    };

    let result = tokio::task::spawn_blocking(move || run(&config, cancel))
        .await
        .context("dispatch task failed")?;
    watcher.abort();

    let code = match result {
        Ok(summary) => {
            report(&summary, io::stderr().lock()).context("failed to write diagnostics")?;
            exit_code(&summary)
        }
        Err(e) => {
            // Streams that failed before the abort are still reported
            if let Some(summary) = e.summary() {
                report(summary, io::stderr().lock()).context("failed to write diagnostics")?;
            }
            eprintln!("perfstat: {e}");
            e.exit_code()
        }
    };

    Ok(ExitCode::from(code))
}
