//! Command-line interface module.
//!
//! This module handles:
//! - Argument parsing via clap
//! - The output sink (stdout or a freshly created file)

mod args;
mod output;

pub use args::{error_line, Args, Format};
pub use output::OutputSink;
