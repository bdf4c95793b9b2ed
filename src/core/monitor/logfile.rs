//! Durable CSV log of completed cycles

use crate::core::monitor::types::{CycleRecord, MonitorError};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Basename of the log inside the platform temp directory.
pub const LOG_BASENAME: &str = "linkpulse.csv";

const HEADER: &str = "date,latency,down,up";

/// Append-only CSV log, one row per completed cycle.
///
/// Created with its header row on first use and never truncated except by
/// the explicit [`clear`](CycleLog::clear) operation. Appends are
/// fire-and-forget: a crash mid-write loses at most the trailing record.
#[derive(Debug, Clone)]
pub struct CycleLog {
    path: PathBuf,
}

impl CycleLog {
    /// Log at the well-known location, `<temp dir>/linkpulse.csv`.
    pub fn at_default_path() -> Self {
        Self {
            path: std::env::temp_dir().join(LOG_BASENAME),
        }
    }

    /// Log at an explicit path (tests point this at a scratch dir).
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file containing only the header row if it is absent.
    /// Existing contents are left untouched.
    pub fn ensure_exists(&self) -> Result<(), MonitorError> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(MonitorError::LogFile)?;
        }
        std::fs::write(&self.path, format!("{}\n", HEADER)).map_err(MonitorError::LogFile)
    }

    /// Append one completed-cycle row.
    pub fn append(&self, record: &CycleRecord) -> Result<(), MonitorError> {
        self.ensure_exists()?;
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(MonitorError::LogFile)?;
        writeln!(
            file,
            "{},{},{},{}",
            record.timestamp_ms, record.latency_ms, record.download, record.upload
        )
        .map_err(MonitorError::LogFile)
    }

    /// Raw file contents, header included.
    pub fn contents(&self) -> Result<String, MonitorError> {
        std::fs::read_to_string(&self.path).map_err(MonitorError::LogFile)
    }

    /// Delete the log and immediately recreate it with only the header.
    pub fn clear(&self) -> Result<(), MonitorError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(MonitorError::LogFile(e)),
        }
        self.ensure_exists()
    }
}
