//! Common test utilities and helpers for monitor tests

use async_trait::async_trait;
use linkpulse::core::monitor::{
    CycleLog, CycleScheduler, LatencyProbe, MonitorConfig, MonitorError, ProbeError, Renderer,
    SampleHistory, StatusSnapshot, ThroughputOptions, ThroughputProbe, ThroughputSample,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Test helper to create a temporary directory for test files
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Newline-terminated ping output whose rtt summary carries `avg` as the
/// average round-trip time.
pub fn ping_output(avg: &str) -> String {
    format!(
        "PING google.com (142.250.1.100) 56(84) bytes of data.\n\
         64 bytes from 142.250.1.100: icmp_seq=1 ttl=115 time=12.1 ms\n\
         \n\
         --- google.com ping statistics ---\n\
         10 packets transmitted, 10 received, 0% packet loss, time 9013ms\n\
         rtt min/avg/max/mdev = 10.1/{}/15.0/1.2 ms\n",
        avg
    )
}

pub fn sample(upload: f64, download: f64) -> ThroughputSample {
    ThroughputSample {
        upload,
        download,
        human_upload: upload / 1_000_000.0,
        human_download: download / 1_000_000.0,
    }
}

/// Latency probe replaying a scripted sequence of responses.
pub struct ScriptedLatencyProbe {
    responses: Mutex<VecDeque<Result<String, ProbeError>>>,
}

impl ScriptedLatencyProbe {
    pub fn new(responses: Vec<Result<String, ProbeError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
        }
    }
}

#[async_trait]
impl LatencyProbe for ScriptedLatencyProbe {
    async fn measure(
        &self,
        _host: &str,
        _timeout_secs: u32,
        _count: u32,
    ) -> Result<String, ProbeError> {
        self.responses
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or_else(|| Err(ProbeError::Transport("latency script exhausted".to_string())))
    }
}

/// Throughput probe replaying scripted responses and recording the options
/// it was handed, so tests can assert configuration forwarding.
pub struct ScriptedThroughputProbe {
    responses: Mutex<VecDeque<Result<ThroughputSample, ProbeError>>>,
    pub seen_options: Mutex<Vec<ThroughputOptions>>,
}

impl ScriptedThroughputProbe {
    pub fn new(responses: Vec<Result<ThroughputSample, ProbeError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            seen_options: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ThroughputProbe for ScriptedThroughputProbe {
    async fn measure(&self, options: &ThroughputOptions) -> Result<ThroughputSample, ProbeError> {
        self.seen_options
            .lock()
            .expect("options lock")
            .push(options.clone());
        self.responses
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or_else(|| {
                Err(ProbeError::Transport("throughput script exhausted".to_string()))
            })
    }
}

/// Throughput probe that never completes; only the scheduler's hard
/// deadline gets the cycle past it.
pub struct HangingThroughputProbe;

#[async_trait]
impl ThroughputProbe for HangingThroughputProbe {
    async fn measure(&self, _options: &ThroughputOptions) -> Result<ThroughputSample, ProbeError> {
        std::future::pending::<()>().await;
        unreachable!()
    }
}

/// Renderer capturing every frame's snapshot for later assertions.
#[derive(Clone, Default)]
pub struct RecordingRenderer {
    pub frames: Arc<Mutex<Vec<StatusSnapshot>>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.lock().expect("frames lock").len()
    }
}

impl Renderer for RecordingRenderer {
    fn draw(&mut self, snapshot: &StatusSnapshot) -> Result<(), MonitorError> {
        self.frames
            .lock()
            .expect("frames lock")
            .push(snapshot.clone());
        Ok(())
    }
}

/// Fully wired scheduler plus the shared state tests assert against.
pub struct Harness {
    pub scheduler: Arc<CycleScheduler>,
    pub snapshot: Arc<Mutex<StatusSnapshot>>,
    pub history: Arc<Mutex<SampleHistory>>,
    pub log: CycleLog,
    // Keeps the scratch dir alive for the harness lifetime
    _dir: TempDir,
}

pub fn harness(
    config: MonitorConfig,
    latency: Arc<dyn LatencyProbe>,
    throughput: Arc<dyn ThroughputProbe>,
) -> Harness {
    let dir = create_temp_dir();
    let log = CycleLog::at(dir.path().join("linkpulse.csv"));
    let snapshot = Arc::new(Mutex::new(StatusSnapshot::default()));
    let history = Arc::new(Mutex::new(SampleHistory::new()));
    let scheduler = Arc::new(CycleScheduler::new(
        config,
        Arc::clone(&snapshot),
        Arc::clone(&history),
        log.clone(),
        latency,
        throughput,
    ));
    Harness {
        scheduler,
        snapshot,
        history,
        log,
        _dir: dir,
    }
}
