//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use perfstat_core::{DecodeLimits, OperationKind, OutputFormat, RecordFilter, DEFAULT_MAX_FIELD_LEN};

use crate::error::RunError;

/// Line formats for printed records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// `OP [key=value, ...]` lines (default)
    Text,
    /// JSON Lines (one JSON object per record)
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
        }
    }
}

/// Print data-grid performance statistics capture files.
#[derive(Parser, Debug)]
#[command(name = "perfstat")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Capture file, or directory of per-node capture files
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Write records to this file instead of stdout (must not exist)
    #[arg(long = "out", value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Only print these operation kinds, e.g. CACHE_GET,TX_COMMIT
    #[arg(long = "ops", value_name = "OPS", value_delimiter = ',')]
    pub ops: Option<Vec<OperationKind>>,

    /// Lower bound of the start time window, epoch millis (inclusive)
    #[arg(long = "from", value_name = "MS", allow_negative_numbers = true)]
    pub from: Option<i64>,

    /// Upper bound of the start time window, epoch millis (inclusive)
    #[arg(long = "to", value_name = "MS", allow_negative_numbers = true)]
    pub to: Option<i64>,

    /// Only print records of these cache ids
    #[arg(
        long = "cache-ids",
        value_name = "IDS",
        value_delimiter = ',',
        allow_hyphen_values = true
    )]
    pub cache_ids: Option<Vec<i32>>,

    /// Output line format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: Format,

    /// Largest string or list accepted from a capture file, in bytes
    #[arg(long = "max-field-len", value_name = "BYTES", default_value_t = DEFAULT_MAX_FIELD_LEN)]
    pub max_field_len: usize,

    /// Enable verbose output (repeat for more)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Build the record filter from the filter flags.
    pub fn filter(&self) -> Result<RecordFilter, RunError> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(RunError::Usage(format!(
                    "--from {from} is later than --to {to}"
                )));
            }
        }

        let mut filter = RecordFilter::new().with_time_window(self.from, self.to);
        if let Some(ops) = &self.ops {
            filter = filter.with_ops(ops.iter().copied());
        }
        if let Some(cache_ids) = &self.cache_ids {
            filter = filter.with_cache_ids(cache_ids.iter().copied());
        }
        Ok(filter)
    }

    pub fn limits(&self) -> Result<DecodeLimits, RunError> {
        if self.max_field_len == 0 {
            return Err(RunError::Usage("--max-field-len must be positive".to_string()));
        }
        Ok(DecodeLimits {
            max_field_len: self.max_field_len,
        })
    }

    /// Default log level for the `-v` count.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// Single-line form of a clap error: the message paragraph without the
/// `error: ` prefix, usage or tips.
pub fn error_line(err: &clap::Error) -> String {
    let rendered = err.render().to_string();
    let message = rendered
        .lines()
        .take_while(|line| !line.trim().is_empty())
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(" ");
    message
        .strip_prefix("error: ")
        .unwrap_or(message.as_str())
        .to_string()
}
