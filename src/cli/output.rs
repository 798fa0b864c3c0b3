//! Destination of printed records.

use std::fs::{File, OpenOptions};
use std::io::{self, LineWriter, Stdout, Write};
use std::path::Path;

use crate::error::RunError;

/// Standard output or a newly created file, flushed line by line.
pub enum OutputSink {
    Stdout(Stdout),
    File(LineWriter<File>),
}

impl OutputSink {
    pub fn stdout() -> Self {
        OutputSink::Stdout(io::stdout())
    }

    /// Create `path`, refusing to overwrite an existing file.
    pub fn create(path: &Path) -> Result<Self, RunError> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|source| match source.kind() {
                io::ErrorKind::AlreadyExists => RunError::OutputExists {
                    path: path.to_path_buf(),
                },
                _ => RunError::CreateOutput {
                    path: path.to_path_buf(),
                    source,
                },
            })?;
        Ok(OutputSink::File(LineWriter::new(file)))
    }
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputSink::Stdout(out) => out.write(buf),
            OutputSink::File(out) => out.write(buf),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            OutputSink::Stdout(out) => out.lock().write_all(buf),
            OutputSink::File(out) => out.write_all(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputSink::Stdout(out) => out.flush(),
            OutputSink::File(out) => out.flush(),
        }
    }
}
