//! In-memory rolling history of completed cycles

use crate::core::monitor::types::Averages;

/// Five ordered series of measurements, one entry per completed cycle.
///
/// The series grow in lock-step: every cycle appends to all five exactly
/// once, with the sentinel standing in for failed probes, so each length
/// always equals the cumulative cycle count. Unbounded for the process
/// lifetime; at one entry per minute that is under a megabyte per month.
#[derive(Debug, Default)]
pub struct SampleHistory {
    latency: Vec<f64>,
    upload: Vec<f64>,
    download: Vec<f64>,
    human_upload: Vec<f64>,
    human_download: Vec<f64>,
}

impl SampleHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the cycle's latency measurement (or sentinel).
    ///
    /// Called exactly once per cycle by the latency step; together with
    /// [`push_speeds`](Self::push_speeds) this keeps all five series in
    /// lock-step.
    pub fn push_latency(&mut self, latency: f64) {
        self.latency.push(latency);
    }

    /// Append the cycle's four throughput measurements (or sentinels).
    pub fn push_speeds(&mut self, upload: f64, download: f64, human_upload: f64, human_download: f64) {
        self.upload.push(upload);
        self.download.push(download);
        self.human_upload.push(human_upload);
        self.human_download.push(human_download);
    }

    /// Completed cycle count. Equal across all five series.
    pub fn len(&self) -> usize {
        self.latency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latency.is_empty()
    }

    pub fn latency(&self) -> &[f64] {
        &self.latency
    }

    pub fn upload(&self) -> &[f64] {
        &self.upload
    }

    pub fn download(&self) -> &[f64] {
        &self.download
    }

    pub fn human_upload(&self) -> &[f64] {
        &self.human_upload
    }

    pub fn human_download(&self) -> &[f64] {
        &self.human_download
    }

    /// Recompute all five rolling averages at the given display precision.
    ///
    /// Sentinel entries are folded into the denominator alongside real
    /// measurements, so any failure pulls the average down. Known accuracy
    /// trade-off, kept to match the recorded history semantics.
    pub fn averages(&self, precision: u32) -> Averages {
        Averages {
            latency_ms: average(&self.latency, precision),
            upload: average(&self.upload, precision),
            download: average(&self.download, precision),
            human_upload: average(&self.human_upload, precision),
            human_download: average(&self.human_download, precision),
        }
    }
}

/// Arithmetic mean rounded to `precision` decimal places.
///
/// An empty series is a defined boundary, not an error: it averages to 0.
pub fn average(series: &[f64], precision: u32) -> f64 {
    if series.is_empty() {
        return 0.0;
    }
    let sum: f64 = series.iter().sum();
    let mean = sum / series.len() as f64;
    let factor = 10f64.powi(precision as i32);
    (mean * factor).round() / factor
}
