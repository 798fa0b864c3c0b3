//! Error types for the perfstat CLI.

use std::path::PathBuf;

use perfstat_core::{DispatchError, RunSummary, ScanError};
use thiserror::Error;

/// Exit status of a successful run.
pub const EXIT_OK: u8 = 0;

/// Exit status for usage errors and unusable input paths.
pub const EXIT_USAGE: u8 = 1;

/// Exit status when a stream or the output failed mid-run.
pub const EXIT_FAILURE: u8 = 2;

/// Exit status after an interrupt (128 + SIGINT).
pub const EXIT_CANCELLED: u8 = 130;

/// Errors that end a CLI run.
#[derive(Error, Debug)]
pub enum RunError {
    /// Invalid combination of arguments
    #[error("{0}")]
    Usage(String),

    /// Input path missing, unreadable or misnamed
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// `--out` names an existing file
    #[error("output file already exists: {}", path.display())]
    OutputExists { path: PathBuf },

    /// `--out` could not be created
    #[error("failed to create output file {}: {source}", path.display())]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing records failed
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl RunError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            RunError::Usage(_) | RunError::OutputExists { .. } => EXIT_USAGE,
            RunError::Scan(ScanError::NotFound { .. } | ScanError::BadName { .. }) => EXIT_USAGE,
            RunError::Scan(ScanError::Io { .. })
            | RunError::CreateOutput { .. }
            | RunError::Dispatch(_) => EXIT_FAILURE,
        }
    }

    /// Partial summary of a run that was aborted by an output failure.
    pub fn summary(&self) -> Option<&RunSummary> {
        match self {
            RunError::Dispatch(e) => Some(e.summary()),
            _ => None,
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, RunError>;

#[cfg(test)]
mod tests {
    use super::*;
    use perfstat_core::HandlerError;

    #[test]
    fn test_exit_codes() {
        let path = PathBuf::from("x");
        assert_eq!(RunError::Usage("bad".into()).exit_code(), 1);
        assert_eq!(RunError::OutputExists { path: path.clone() }.exit_code(), 1);
        assert_eq!(
            RunError::Scan(ScanError::NotFound { path: path.clone() }).exit_code(),
            1
        );
        assert_eq!(
            RunError::Scan(ScanError::BadName { path: path.clone() }).exit_code(),
            1
        );
        assert_eq!(
            RunError::Scan(ScanError::Io {
                path,
                source: std::io::Error::other("denied"),
            })
            .exit_code(),
            2
        );
        let aborted = RunError::Dispatch(DispatchError::Handler {
            source: HandlerError::Io(std::io::Error::other("pipe")),
            summary: Box::default(),
        });
        assert_eq!(aborted.exit_code(), 2);
        assert!(aborted.summary().is_some());
        assert!(RunError::Usage("bad".into()).summary().is_none());
    }
}
