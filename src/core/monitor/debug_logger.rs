//! Env-gated JSONL debug logging with size-based rotation
//!
//! The monitor runs unattended for weeks, so the debug log rotates itself:
//! once the current file crosses the size threshold it is gzipped into a
//! timestamped archive and a bounded number of archives is retained. A
//! lock file guards rotation against a second monitor process on the same
//! machine.
//!
//! Logging is off unless `LINKPULSE_DEBUG=true`; every write path
//! swallows its own errors so diagnostics can never take down the loop.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, OnceLock};

use chrono::Local;
use flate2::{write::GzEncoder, Compression};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const LOG_ROTATION_SIZE_MB: u64 = 8;
const MAX_ARCHIVES: u32 = 5;
const ROTATION_CHECK_INTERVAL: u32 = 200;

#[derive(Serialize, Deserialize, Debug, Clone)]
struct LogEntry {
    timestamp: String,
    level: String,
    component: String,
    event: String,
    message: String,
    correlation_id: Option<String>,
    fields: HashMap<String, serde_json::Value>,
}

struct RotatingLogger {
    log_path: PathBuf,
    write_count: AtomicU32,
}

impl RotatingLogger {
    fn new(log_path: PathBuf) -> Self {
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        Self {
            log_path,
            write_count: AtomicU32::new(0),
        }
    }

    fn write_with_rotation(&self, json_line: &str) -> Result<(), std::io::Error> {
        // Check for rotation every ROTATION_CHECK_INTERVAL writes
        if self.write_count.fetch_add(1, Ordering::Relaxed) % ROTATION_CHECK_INTERVAL == 0 {
            let _ = self.rotate_if_needed(); // Don't let rotation errors stop logging
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        writeln!(file, "{}", json_line)?;
        Ok(())
    }

    fn rotate_if_needed(&self) -> Result<(), std::io::Error> {
        if !self.needs_rotation()? {
            return Ok(());
        }

        // File locking to prevent concurrent rotation
        let lock_path = self.log_path.with_extension("lock");
        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&lock_path)?;

        match lock_file.try_lock_exclusive() {
            Ok(()) => {
                // Re-check after acquiring the lock
                if self.needs_rotation()? {
                    self.perform_rotation()?;
                }
                let _ = std::fs::remove_file(&lock_path);
                Ok(())
            }
            // Another process is rotating, skip this time
            Err(_) => Ok(()),
        }
    }

    fn needs_rotation(&self) -> Result<bool, std::io::Error> {
        if !self.log_path.exists() {
            return Ok(false);
        }
        let metadata = std::fs::metadata(&self.log_path)?;
        Ok(metadata.len() >= LOG_ROTATION_SIZE_MB * 1024 * 1024)
    }

    fn perform_rotation(&self) -> Result<(), std::io::Error> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let base_name = match self.log_path.file_stem().and_then(|s| s.to_str()) {
            Some(name) => name.to_string(),
            None => return Ok(()),
        };
        let log_dir = match self.log_path.parent() {
            Some(dir) => dir.to_path_buf(),
            None => return Ok(()),
        };
        let archive_path = log_dir.join(format!("{}.{}.gz", base_name, timestamp));

        // Move current log aside, compress, then drop the intermediate
        let temp_path = self.log_path.with_extension("rotating");
        std::fs::rename(&self.log_path, &temp_path)?;

        let source_file = File::open(&temp_path)?;
        let target_file = File::create(&archive_path)?;
        let mut encoder = GzEncoder::new(target_file, Compression::default());
        std::io::copy(&mut BufReader::new(source_file), &mut encoder)?;
        encoder.finish()?;

        std::fs::remove_file(&temp_path)?;

        let _ = self.cleanup_old_archives(&log_dir, &base_name);

        Ok(())
    }

    fn cleanup_old_archives(
        &self,
        log_dir: &std::path::Path,
        base_name: &str,
    ) -> Result<(), std::io::Error> {
        let mut archives = Vec::new();
        for entry in std::fs::read_dir(log_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with(&format!("{}.", base_name)) && name.ends_with(".gz") {
                archives.push((entry.path(), entry.metadata()?.modified()?));
            }
        }

        archives.sort_by_key(|(_, modified)| *modified);
        if archives.len() > MAX_ARCHIVES as usize {
            let to_remove = archives.len() - MAX_ARCHIVES as usize;
            for (path, _) in archives.iter().take(to_remove) {
                let _ = std::fs::remove_file(path);
            }
        }

        Ok(())
    }
}

/// Debug logger for the measurement loop.
///
/// Each process gets a short session correlation id; individual cycles
/// attach their own `cycle_<uuid>` id so one cycle's probe start/end and
/// completion events can be grepped together.
pub struct DebugLogger {
    enabled: bool,
    rotating_logger: Option<Mutex<RotatingLogger>>,
    session_id: String,
}

impl DebugLogger {
    pub fn new() -> Self {
        let enabled = parse_env_bool("LINKPULSE_DEBUG");
        let session_id = Uuid::new_v4().to_string()[..8].to_string();

        let rotating_logger = if enabled {
            Some(Mutex::new(RotatingLogger::new(Self::log_path())))
        } else {
            None
        };

        Self {
            enabled,
            rotating_logger,
            session_id,
        }
    }

    fn log_path() -> PathBuf {
        std::env::temp_dir().join("linkpulse").join("debug.jsonl")
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    fn log(
        &self,
        level: &str,
        component: &str,
        event: &str,
        message: &str,
        correlation_id: Option<String>,
        fields: HashMap<String, serde_json::Value>,
    ) {
        if !self.enabled {
            return;
        }

        let entry = LogEntry {
            timestamp: Local::now().to_rfc3339(),
            level: level.to_string(),
            component: component.to_string(),
            event: event.to_string(),
            message: message.to_string(),
            correlation_id: correlation_id.or_else(|| Some(self.session_id.clone())),
            fields,
        };

        if let Some(logger) = &self.rotating_logger {
            if let Ok(logger) = logger.lock() {
                if let Ok(json_line) = serde_json::to_string(&entry) {
                    let _ = logger.write_with_rotation(&json_line); // Don't crash on logging errors
                }
            }
        }
    }

    pub fn debug(&self, component: &str, message: &str) {
        self.log("DEBUG", component, "debug", message, None, HashMap::new());
    }

    pub fn error(&self, component: &str, message: &str) {
        self.log("ERROR", component, "error", message, None, HashMap::new());
    }

    /// Probe step started, with the timeout it was given.
    pub fn probe_start(&self, kind: &str, timeout_ms: u64, cycle_id: &str) {
        let mut fields = HashMap::new();
        fields.insert(
            "kind".to_string(),
            serde_json::Value::String(kind.to_string()),
        );
        fields.insert(
            "timeout_ms".to_string(),
            serde_json::Value::Number(timeout_ms.into()),
        );

        self.log(
            "PROBE",
            "CycleScheduler",
            "probe_start",
            &format!("Starting {} probe", kind),
            Some(cycle_id.to_string()),
            fields,
        );
    }

    /// Probe step finished, successfully or not.
    pub fn probe_end(&self, kind: &str, outcome: &str, duration_ms: u64, cycle_id: &str) {
        let mut fields = HashMap::new();
        fields.insert(
            "kind".to_string(),
            serde_json::Value::String(kind.to_string()),
        );
        fields.insert(
            "outcome".to_string(),
            serde_json::Value::String(outcome.to_string()),
        );
        fields.insert(
            "duration_ms".to_string(),
            serde_json::Value::Number(duration_ms.into()),
        );

        self.log(
            "PROBE",
            "CycleScheduler",
            "probe_end",
            &format!("{} probe finished: {} ({}ms)", kind, outcome, duration_ms),
            Some(cycle_id.to_string()),
            fields,
        );
    }

    /// Cycle completed and was folded into history.
    pub fn cycle_complete(&self, cycles: u64, history_len: usize, cycle_id: &str) {
        let mut fields = HashMap::new();
        fields.insert(
            "cycles".to_string(),
            serde_json::Value::Number(cycles.into()),
        );
        fields.insert(
            "history_len".to_string(),
            serde_json::Value::Number((history_len as u64).into()),
        );

        self.log(
            "CYCLE",
            "CycleScheduler",
            "cycle_complete",
            &format!("Cycle {} complete", cycles),
            Some(cycle_id.to_string()),
            fields,
        );
    }
}

impl Default for DebugLogger {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse boolean environment variables (strict true/false only).
///
/// Only "true" or "false" are accepted, case insensitive. Anything else,
/// including unset, is false.
pub fn parse_env_bool(env_var: &str) -> bool {
    std::env::var(env_var)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "true"))
        .unwrap_or(false)
}

/// Process-wide logger instance, constructed on first use.
pub fn get_debug_logger() -> &'static DebugLogger {
    static LOGGER: OnceLock<DebugLogger> = OnceLock::new();
    LOGGER.get_or_init(DebugLogger::new)
}
