/*!
Probe client contracts and production adapters.

The scheduler never talks to the network itself; it drives two capability
providers through narrow async traits. Production adapters shell out to the
system measurement tools (`ping`, `speedtest-cli`) via `tokio::process`,
while tests inject scripted implementations.

Every failure a probe can produce is a value of [`ProbeError`]; none of
them is fatal to the process. The scheduler collapses all of them to the
sentinel before recording.
*/

use async_trait::async_trait;
use tokio::process::Command;

/// Classified probe failures.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// The latency probe reported the target unreachable.
    #[error("no_internet")]
    NoInternet,
    /// The hard external deadline elapsed before the probe finished.
    #[error("timeout_error")]
    Timeout,
    /// Any other probe-reported failure.
    #[error("probe transport error: {0}")]
    Transport(String),
    /// The probe succeeded but its output did not match the expected shape.
    #[error("unparseable probe output: {0}")]
    Parse(String),
}

/// Four throughput measurements from one probe run.
///
/// `upload`/`download` are the probe's raw machine units; the `human_`
/// pair is the same measurement in megabits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThroughputSample {
    pub upload: f64,
    pub download: f64,
    pub human_upload: f64,
    pub human_download: f64,
}

/// Configuration handed into the throughput probe. These bound the probe's
/// own behavior; the scheduler's hard deadline applies on top regardless.
#[derive(Debug, Clone)]
pub struct ThroughputOptions {
    /// Soft time budget in milliseconds.
    pub soft_budget_ms: u64,
    /// Internal latency trials per candidate server.
    pub trial_count: u32,
    /// Maximum candidate servers to select among.
    pub server_cap: u32,
}

/// One latency measurement against a target host.
///
/// Implementations return their raw multi-line diagnostic output; the
/// numeric round-trip time is extracted by the scheduler, so a probe that
/// prints an unexpected format degrades to a parse failure rather than
/// breaking the contract.
#[async_trait]
pub trait LatencyProbe: Send + Sync {
    async fn measure(
        &self,
        host: &str,
        timeout_secs: u32,
        count: u32,
    ) -> Result<String, ProbeError>;
}

/// One throughput measurement returning all four values at once.
#[async_trait]
pub trait ThroughputProbe: Send + Sync {
    async fn measure(&self, options: &ThroughputOptions) -> Result<ThroughputSample, ProbeError>;
}

/// Production latency probe: the system `ping` binary.
pub struct PingCommand;

#[async_trait]
impl LatencyProbe for PingCommand {
    async fn measure(
        &self,
        host: &str,
        timeout_secs: u32,
        count: u32,
    ) -> Result<String, ProbeError> {
        let output = Command::new("ping")
            .arg("-c")
            .arg(count.to_string())
            .arg("-W")
            .arg(timeout_secs.to_string())
            .arg(host)
            .output()
            .await
            .map_err(|e| ProbeError::Transport(format!("failed to spawn ping: {}", e)))?;

        // ping exits non-zero when the host never answered
        if !output.status.success() {
            return Err(ProbeError::NoInternet);
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Production throughput probe: `speedtest-cli --json`.
///
/// The soft budget maps to `--timeout`; `speedtest-cli` exposes no switch
/// for the trial count or server cap, so those contract fields bound only
/// probes that support them. The JSON payload reports bits per second,
/// which this adapter keeps as the raw unit and also converts to megabits.
pub struct SpeedtestCommand;

#[async_trait]
impl ThroughputProbe for SpeedtestCommand {
    async fn measure(&self, options: &ThroughputOptions) -> Result<ThroughputSample, ProbeError> {
        let timeout_secs = options.soft_budget_ms.div_ceil(1000);
        let output = Command::new("speedtest-cli")
            .arg("--json")
            .arg("--timeout")
            .arg(timeout_secs.to_string())
            .output()
            .await
            .map_err(|e| ProbeError::Transport(format!("failed to spawn speedtest-cli: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProbeError::Transport(stderr.trim().to_string()));
        }

        let payload: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| ProbeError::Parse(format!("speedtest JSON: {}", e)))?;

        let download = payload
            .get("download")
            .and_then(serde_json::Value::as_f64)
            .ok_or_else(|| ProbeError::Parse("missing download field".to_string()))?;
        let upload = payload
            .get("upload")
            .and_then(serde_json::Value::as_f64)
            .ok_or_else(|| ProbeError::Parse("missing upload field".to_string()))?;

        Ok(ThroughputSample {
            upload,
            download,
            human_upload: upload / 1_000_000.0,
            human_download: download / 1_000_000.0,
        })
    }
}
