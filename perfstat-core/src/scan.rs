//! Capture file discovery.
//!
//! Nodes write their statistics to files named
//! `<prefix>-<node uuid>-<creation ts>.<ext>`, rolling over to a new file with
//! a later creation timestamp when a file grows too large. Archived captures
//! may additionally be gzipped (`.<ext>.gz`).

use std::cmp::Ordering;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use uuid::Uuid;

use crate::error::ScanError;

/// File name prefix used by the data grid.
pub const DEFAULT_PREFIX: &str = "node";

/// File extension used by the data grid.
pub const DEFAULT_EXTENSION: &str = "prf";

/// Suffix of gzipped captures.
const GZIP_SUFFIX: &str = ".gz";

/// Buffer size for reading capture files (64KB).
const BUFFER_SIZE: usize = 65536;

/// Naming convention of capture files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureNaming {
    pub prefix: String,
    pub extension: String,
}

impl Default for CaptureNaming {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

impl CaptureNaming {
    /// Parse a file name, returning `None` if it does not follow the convention.
    pub fn parse(&self, file_name: &str) -> Option<ParsedName> {
        let (rest, compressed) = match file_name.strip_suffix(GZIP_SUFFIX) {
            Some(rest) => (rest, true),
            None => (file_name, false),
        };

        let rest = rest
            .strip_suffix(self.extension.as_str())?
            .strip_suffix('.')?
            .strip_prefix(self.prefix.as_str())?
            .strip_prefix('-')?;

        let (uuid, created_at) = rest.rsplit_once('-')?;

        // Only the canonical hyphenated form, not the simple or braced ones.
        if uuid.len() != 36 {
            return None;
        }
        let node_id = Uuid::try_parse(uuid).ok()?;

        if created_at.is_empty() || !created_at.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let created_at = created_at.parse().ok()?;

        Some(ParsedName {
            node_id,
            created_at,
            compressed,
        })
    }

    /// File name for the given node and creation time.
    pub fn file_name(&self, node_id: Uuid, created_at: u64) -> String {
        format!(
            "{}-{}-{}.{}",
            self.prefix,
            node_id.hyphenated(),
            created_at,
            self.extension
        )
    }
}

/// Components of a capture file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedName {
    pub node_id: Uuid,
    /// Creation time in epoch milliseconds
    pub created_at: u64,
    pub compressed: bool,
}

/// A capture file produced by one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureFile {
    pub path: PathBuf,
    pub node_id: Uuid,
    pub created_at: u64,
    pub compressed: bool,
}

impl CaptureFile {
    fn new(path: PathBuf, name: ParsedName) -> Self {
        Self {
            path,
            node_id: name.node_id,
            created_at: name.created_at,
            compressed: name.compressed,
        }
    }

    /// Open the file as a byte source, decompressing gzipped captures.
    pub fn open(&self) -> std::io::Result<Box<dyn Read + Send>> {
        let file = File::open(&self.path)?;
        let reader: Box<dyn Read + Send> = if self.compressed {
            Box::new(GzDecoder::new(BufReader::with_capacity(BUFFER_SIZE, file)))
        } else {
            Box::new(file)
        };
        Ok(reader)
    }

    /// Replay order: node, then creation time, then file name.
    fn replay_order(&self, other: &Self) -> Ordering {
        self.node_id
            .cmp(&other.node_id)
            .then(self.created_at.cmp(&other.created_at))
            .then_with(|| self.path.file_name().cmp(&other.path.file_name()))
    }
}

/// Find the capture files at `path`.
///
/// A regular file must follow the naming convention. A directory is listed
/// non-recursively, entries that do not follow the convention are skipped,
/// and the result is ordered so that the rollover files of one node replay
/// in the order they were written.
pub fn scan(path: &Path, naming: &CaptureNaming) -> Result<Vec<CaptureFile>, ScanError> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ScanError::NotFound {
                path: path.to_path_buf(),
            })
        }
        Err(source) => {
            return Err(ScanError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    if !metadata.is_dir() {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| naming.parse(n))
            .ok_or_else(|| ScanError::BadName {
                path: path.to_path_buf(),
            })?;
        return Ok(vec![CaptureFile::new(path.to_path_buf(), name)]);
    }

    let io_err = |source| ScanError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(path).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str().and_then(|n| naming.parse(n)) else {
            tracing::debug!(file = ?entry.path(), "skipping non-capture file");
            continue;
        };
        let entry_path = entry.path();
        // Follows symlinks, unlike DirEntry::file_type.
        if !entry_path.is_file() {
            continue;
        }
        files.push(CaptureFile::new(entry_path, name));
    }

    files.sort_by(CaptureFile::replay_order);

    tracing::debug!(dir = %path.display(), count = files.len(), "scanned capture directory");

    Ok(files)
}
