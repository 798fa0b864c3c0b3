//! One invocation of the printer: scan, open the sink, dispatch, report.

use std::io::Write;
use std::path::PathBuf;

use perfstat_core::{
    scan, CancelToken, CaptureNaming, DecodeLimits, Dispatcher, FailureReason, OutputFormat,
    PrintHandler, RecordFilter, RunSummary, StreamError,
};

use crate::cli::{Args, OutputSink};
use crate::error::{Result, EXIT_CANCELLED, EXIT_FAILURE, EXIT_OK};

/// Validated settings of a run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub path: PathBuf,
    pub out: Option<PathBuf>,
    pub naming: CaptureNaming,
    pub filter: RecordFilter,
    pub limits: DecodeLimits,
    pub format: OutputFormat,
}

impl RunConfig {
    pub fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            path: args.path.clone(),
            out: args.out.clone(),
            naming: CaptureNaming::default(),
            filter: args.filter()?,
            limits: args.limits()?,
            format: args.format.into(),
        })
    }
}

/// Print every admitted record of the capture files at `config.path`.
///
/// The output file is only created once the input has been found, so usage
/// errors never leave an empty file behind.
pub fn run(config: &RunConfig, cancel: CancelToken) -> Result<RunSummary> {
    let files = scan(&config.path, &config.naming)?;
    if files.is_empty() {
        tracing::warn!(path = %config.path.display(), "no capture files found");
    }

    let sink = match &config.out {
        Some(path) => OutputSink::create(path)?,
        None => OutputSink::stdout(),
    };

    let mut dispatcher = Dispatcher::new()
        .with_filter(config.filter.clone())
        .with_limits(config.limits)
        .with_cancel_token(cancel);
    dispatcher.add_handler(PrintHandler::new(sink, config.format));

    let summary = dispatcher.run(&files)?;
    Ok(summary)
}

/// Write one diagnostic line per failed stream.
pub fn report<W: Write>(summary: &RunSummary, mut err: W) -> std::io::Result<()> {
    for failure in &summary.failures {
        let path = failure.path.display();
        match &failure.reason {
            FailureReason::Open(e) => writeln!(err, "perfstat: failed to open {path}: {e}")?,
            FailureReason::Stream(StreamError::Corrupt { offset, source }) => {
                writeln!(err, "perfstat: corrupt stream {path} at offset {offset}: {source}")?
            }
            FailureReason::Stream(StreamError::Io { offset, source }) => {
                writeln!(err, "perfstat: failed to read {path} at offset {offset}: {source}")?
            }
        }
    }
    if summary.cancelled {
        writeln!(err, "perfstat: interrupted")?;
    }
    Ok(())
}

/// Process exit status for a run that completed.
pub fn exit_code(summary: &RunSummary) -> u8 {
    if summary.cancelled {
        EXIT_CANCELLED
    } else if summary.has_failures() {
        EXIT_FAILURE
    } else {
        EXIT_OK
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perfstat_core::{CorruptFrame, StreamFailure};

    #[test]
    fn test_report_lines() {
        let summary = RunSummary {
            failures: vec![
                StreamFailure {
                    path: PathBuf::from("/d/a.prf"),
                    offset: Some(17),
                    reason: FailureReason::Stream(StreamError::Corrupt {
                        offset: 17,
                        source: CorruptFrame::UnknownOp { op: 0x80 },
                    }),
                },
                StreamFailure {
                    path: PathBuf::from("/d/b.prf"),
                    offset: None,
                    reason: FailureReason::Open(std::io::Error::other("denied")),
                },
            ],
            ..RunSummary::default()
        };

        let mut out = Vec::new();
        report(&summary, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "perfstat: corrupt stream /d/a.prf at offset 17: unknown op-byte 0x80\n\
             perfstat: failed to open /d/b.prf: denied\n"
        );
        assert_eq!(exit_code(&summary), EXIT_FAILURE);
    }

    #[test]
    fn test_exit_code_precedence() {
        assert_eq!(exit_code(&RunSummary::default()), EXIT_OK);

        let cancelled = RunSummary {
            cancelled: true,
            failures: vec![StreamFailure {
                path: PathBuf::from("x"),
                offset: None,
                reason: FailureReason::Open(std::io::Error::other("gone")),
            }],
            ..RunSummary::default()
        };
        assert_eq!(exit_code(&cancelled), EXIT_CANCELLED);
    }
}
