/*!
Cycle scheduler - drives one measurement cycle end to end.

One cycle walks a fixed sequence: a settle delay so the status label is
visible before the first network call, the latency step, the throughput
step, then completion bookkeeping. Failure in a step never aborts the
cycle; every failure collapses to the sentinel and the cycle always
returns to `Idle` with a persisted record.

## Step timeouts

The latency probe is bounded by the timeout handed to it. The throughput
probe additionally runs under a hard external deadline enforced here with
`tokio::time::timeout`: its own soft budget is advisory and has been
observed to overrun, and the tick driver's liveness depends on every cycle
finishing in bounded time. When the deadline wins the race the pending
probe future is dropped, so a late result can never double-write the
snapshot.

## Re-entrancy

A new cycle must never start while one is in flight. The 60-tick period
makes overlap impossible today (worst case cycle is ~51s), but the guard
stays: losing the in-flight race is a programming error and aborts with a
diagnostic rather than corrupting shared state.
*/

use crate::core::monitor::config::MonitorConfig;
use crate::core::monitor::debug_logger::get_debug_logger;
use crate::core::monitor::logfile::CycleLog;
use crate::core::monitor::probes::{
    LatencyProbe, ProbeError, ThroughputOptions, ThroughputProbe, ThroughputSample,
};
use crate::core::monitor::store::SampleHistory;
use crate::core::monitor::types::{
    epoch_millis, CyclePhase, CycleRecord, StatusSnapshot, SENTINEL,
};

use regex::Regex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::time::Instant;
use tokio::time::{sleep, timeout};
use uuid::Uuid;

/// Drives the measurement cycle. Sole writer of the measurement fields in
/// the shared snapshot; the tick driver only touches countdown/uptime.
pub struct CycleScheduler {
    config: MonitorConfig,
    snapshot: Arc<Mutex<StatusSnapshot>>,
    history: Arc<Mutex<SampleHistory>>,
    log: CycleLog,
    latency_probe: Arc<dyn LatencyProbe>,
    throughput_probe: Arc<dyn ThroughputProbe>,
    in_flight: AtomicBool,
}

impl CycleScheduler {
    pub fn new(
        config: MonitorConfig,
        snapshot: Arc<Mutex<StatusSnapshot>>,
        history: Arc<Mutex<SampleHistory>>,
        log: CycleLog,
        latency_probe: Arc<dyn LatencyProbe>,
        throughput_probe: Arc<dyn ThroughputProbe>,
    ) -> Self {
        Self {
            config,
            snapshot,
            history,
            log,
            latency_probe,
            throughput_probe,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Run one full measurement cycle.
    ///
    /// # Panics
    ///
    /// Panics if called while a previous cycle is still in flight; the
    /// caller contract (one spawn per countdown expiry) makes that a
    /// programming error, not a runtime condition.
    pub async fn run_cycle(&self) {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            panic!("measurement cycle started while a previous one was still in flight");
        }

        let cycle_id = format!("cycle_{}", Uuid::new_v4());

        self.set_phase(CyclePhase::Starting);
        sleep(self.config.settle_delay).await;

        let latency = self.latency_step(&cycle_id).await;
        let sample = self.speed_step(&cycle_id).await;
        self.complete(latency, sample, &cycle_id);

        self.in_flight.store(false, Ordering::SeqCst);
    }

    /// Latency step: probe, extract the round-trip time, record.
    ///
    /// Unreachable host, transport error and unparseable output all take
    /// the same path: sentinel into snapshot and history, `LatencyFailed`
    /// label for the visibility window.
    async fn latency_step(&self, cycle_id: &str) -> f64 {
        let logger = get_debug_logger();
        self.set_phase(CyclePhase::RunningLatencyTest);
        logger.probe_start(
            "latency",
            u64::from(self.config.ping_timeout_secs) * 1000,
            cycle_id,
        );
        let started = Instant::now();

        let result = match self
            .latency_probe
            .measure(
                &self.config.target_host,
                self.config.ping_timeout_secs,
                self.config.ping_count,
            )
            .await
        {
            Ok(output) => extract_rtt(&output),
            Err(err) => Err(err),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let value = match result {
            Ok(ms) => {
                logger.probe_end("latency", "ok", elapsed_ms, cycle_id);
                self.record_latency(ms, CyclePhase::LatencyFinished);
                ms
            }
            Err(err) => {
                logger.probe_end("latency", &err.to_string(), elapsed_ms, cycle_id);
                self.record_latency(SENTINEL, CyclePhase::LatencyFailed);
                SENTINEL
            }
        };

        sleep(self.config.visibility_delay).await;
        value
    }

    /// Throughput step: probe raced against the hard external deadline.
    async fn speed_step(&self, cycle_id: &str) -> ThroughputSample {
        let logger = get_debug_logger();
        self.set_phase(CyclePhase::RunningSpeedTest);
        let options = ThroughputOptions {
            soft_budget_ms: self.config.speed_soft_budget_ms,
            trial_count: self.config.speed_trial_count,
            server_cap: self.config.speed_server_cap,
        };
        logger.probe_start(
            "throughput",
            self.config.speed_hard_deadline.as_millis() as u64,
            cycle_id,
        );
        let started = Instant::now();

        // Deadline measured from just before the probe starts, independent
        // of the probe's internal budget.
        let result = match timeout(
            self.config.speed_hard_deadline,
            self.throughput_probe.measure(&options),
        )
        .await
        {
            Ok(inner) => inner,
            Err(_) => Err(ProbeError::Timeout),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let sample = match result {
            Ok(sample) => {
                logger.probe_end("throughput", "ok", elapsed_ms, cycle_id);
                self.record_speeds(sample, CyclePhase::SpeedFinished);
                sample
            }
            Err(err) => {
                logger.probe_end("throughput", &err.to_string(), elapsed_ms, cycle_id);
                let sample = ThroughputSample {
                    upload: SENTINEL,
                    download: SENTINEL,
                    human_upload: SENTINEL,
                    human_download: SENTINEL,
                };
                self.record_speeds(sample, CyclePhase::SpeedFailed);
                sample
            }
        };

        sleep(self.config.visibility_delay).await;
        sample
    }

    /// Completion: persist the record, recompute averages, return to idle.
    fn complete(&self, latency: f64, sample: ThroughputSample, cycle_id: &str) {
        let logger = get_debug_logger();

        let record = CycleRecord {
            timestamp_ms: epoch_millis(),
            latency_ms: latency,
            download: sample.download,
            upload: sample.upload,
        };
        // Fire-and-forget persistence: a failed append is logged, never fatal
        if let Err(err) = self.log.append(&record) {
            logger.error("CycleScheduler", &format!("cycle log append failed: {}", err));
        }

        let (history_len, averages) = {
            let history = self.lock_history();
            (history.len(), history.averages(self.config.average_precision))
        };

        let cycles = {
            let mut snap = self.lock_snapshot();
            snap.cycles += 1;
            snap.averages = averages;
            snap.phase = CyclePhase::Idle;
            snap.cycles
        };

        logger.cycle_complete(cycles, history_len, cycle_id);
    }

    fn record_latency(&self, value: f64, phase: CyclePhase) {
        self.lock_history().push_latency(value);
        let mut snap = self.lock_snapshot();
        snap.latency_ms = value;
        snap.phase = phase;
    }

    fn record_speeds(&self, sample: ThroughputSample, phase: CyclePhase) {
        self.lock_history().push_speeds(
            sample.upload,
            sample.download,
            sample.human_upload,
            sample.human_download,
        );
        let mut snap = self.lock_snapshot();
        snap.upload = sample.upload;
        snap.download = sample.download;
        snap.human_upload = sample.human_upload;
        snap.human_download = sample.human_download;
        snap.phase = phase;
    }

    fn set_phase(&self, phase: CyclePhase) {
        self.lock_snapshot().phase = phase;
    }

    fn lock_snapshot(&self) -> MutexGuard<'_, StatusSnapshot> {
        self.snapshot.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_history(&self) -> MutexGuard<'_, SampleHistory> {
        self.history.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Pull the round-trip time out of ping-style diagnostic output.
///
/// Takes the second-to-last `\n`-separated element, which on
/// newline-terminated `ping` output is the final visible
/// `rtt min/avg/max/mdev = a/b/c/d ms` summary line, then captures the
/// number after the first `=.../`, the average. Any mismatch is a parse
/// failure handled like any other probe failure.
pub fn extract_rtt(output: &str) -> Result<f64, ProbeError> {
    static RTT_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = RTT_PATTERN
        .get_or_init(|| Regex::new(r"=.*?/(\d+\.\d+)").ok())
        .as_ref()
        .ok_or_else(|| ProbeError::Parse("rtt pattern failed to compile".to_string()))?;

    let lines: Vec<&str> = output.split('\n').collect();
    let line = lines
        .len()
        .checked_sub(2)
        .and_then(|idx| lines.get(idx))
        .ok_or_else(|| ProbeError::Parse("probe output too short".to_string()))?;

    let rtt = pattern
        .captures(line)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| ProbeError::Parse(format!("no rtt summary in line {:?}", line)))?;

    rtt.as_str()
        .parse::<f64>()
        .map_err(|e| ProbeError::Parse(format!("rtt not a float: {}", e)))
}
