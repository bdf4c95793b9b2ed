// Core types for the measurement loop
use serde::{Deserialize, Serialize};

/// Sentinel recorded in place of a real measurement when a probe fails.
///
/// Failed cycles still produce a full record so that every history series
/// grows in lock-step; `-1` is what distinguishes them.
pub const SENTINEL: f64 = -1.0;

/// Phase of the measurement cycle, written to the snapshot on entry.
///
/// The sequence is strictly linear: `Idle → Starting → RunningLatencyTest
/// → (LatencyFinished | LatencyFailed) → RunningSpeedTest →
/// (SpeedFinished | SpeedFailed) → Idle`. A failed step never aborts the
/// cycle; both probes always run and the cycle always returns to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CyclePhase {
    #[default]
    Idle,
    Starting,
    RunningLatencyTest,
    LatencyFinished,
    LatencyFailed,
    RunningSpeedTest,
    SpeedFinished,
    SpeedFailed,
}

impl CyclePhase {
    /// Human-readable status label shown on the dashboard.
    pub fn label(&self) -> &'static str {
        match self {
            CyclePhase::Idle => "idle",
            CyclePhase::Starting => "Starting tests",
            CyclePhase::RunningLatencyTest => "Running latency test...",
            CyclePhase::LatencyFinished => "Finished latency test",
            CyclePhase::LatencyFailed => "Error, latency test failed!",
            CyclePhase::RunningSpeedTest => "Running speed test...",
            CyclePhase::SpeedFinished => "Finished speed test",
            CyclePhase::SpeedFailed => "Error, speed test failed!",
        }
    }

    /// Whether this phase marks a failed probe step.
    pub fn is_failure(&self) -> bool {
        matches!(self, CyclePhase::LatencyFailed | CyclePhase::SpeedFailed)
    }
}

impl std::fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Rolling averages over every completed cycle, at display precision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Averages {
    pub latency_ms: f64,
    pub upload: f64,
    pub download: f64,
    pub human_upload: f64,
    pub human_download: f64,
}

/// Live status consumed by the renderer once per tick.
///
/// Single writer discipline: the cycle scheduler owns the measurement
/// fields, the tick driver owns `countdown` and `uptime_secs`; both go
/// through one shared mutex so the renderer's per-tick clone never sees a
/// torn write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StatusSnapshot {
    /// Seconds until the next measurement cycle starts.
    pub countdown: u64,
    /// Current cycle phase (drives the status line).
    pub phase: CyclePhase,
    /// Cumulative completed cycles since process start.
    pub cycles: u64,
    /// Process uptime in seconds.
    pub uptime_secs: u64,
    /// Most recent latency in milliseconds, or the sentinel on failure.
    pub latency_ms: f64,
    /// Most recent raw upload throughput (machine units from the probe).
    pub upload: f64,
    /// Most recent raw download throughput.
    pub download: f64,
    /// Most recent upload in megabits.
    pub human_upload: f64,
    /// Most recent download in megabits.
    pub human_download: f64,
    /// Rolling averages, recomputed only after a cycle fully completes.
    pub averages: Averages,
}

/// One completed cycle as persisted to the CSV log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleRecord {
    /// Wall-clock completion time, epoch milliseconds.
    pub timestamp_ms: i64,
    pub latency_ms: f64,
    pub download: f64,
    pub upload: f64,
}

/// Failures of the monitor's own plumbing. Probe failures are not errors
/// at this level; they degrade to sentinel values inside the cycle.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("cycle log I/O failed: {0}")]
    LogFile(#[source] std::io::Error),
    #[error("terminal I/O failed: {0}")]
    Terminal(#[source] std::io::Error),
}

/// Current wall-clock time as epoch milliseconds.
///
/// All persisted cycle timestamps go through this helper so the CSV rows
/// stay uniform and chronologically ordered.
pub fn epoch_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
