//! perfstat - Print data-grid performance statistics capture files.
//!
//! This library holds the command-line glue around `perfstat-core`: argument
//! parsing, the output sink, exit-code policy and diagnostics.
//!
//! # Example
//!
//! ```no_run
//! use perfstat::cli::Args;
//! use perfstat::run::{run, RunConfig};
//! use perfstat_core::CancelToken;
//! use clap::Parser;
//!
//! let args = Args::parse_from(["perfstat", "/var/perf", "--ops", "QUERY"]);
//! let config = RunConfig::from_args(&args).unwrap();
//! let summary = run(&config, CancelToken::new()).unwrap();
//! ```

pub mod cli;
pub mod error;
pub mod run;

pub use error::{Result, RunError};
