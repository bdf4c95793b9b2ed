//! Monitor timing and probe configuration

use std::time::Duration;

/// Every timing and probe knob of the measurement loop, as a named field.
///
/// The defaults reproduce the production cadence (one cycle per minute,
/// 2-second settle/visibility delays, 45-second hard deadline on the
/// throughput probe). Tests override individual fields to run the loop
/// against a paused clock.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Host the latency probe pings.
    /// Default: "google.com"
    pub target_host: String,

    /// Per-attempt timeout handed to the latency probe, in seconds.
    /// Default: 10
    pub ping_timeout_secs: u32,

    /// Round trips the latency probe performs per cycle.
    /// Default: 10
    pub ping_count: u32,

    /// Soft time budget passed to the throughput probe, in milliseconds.
    /// Advisory only; the hard deadline below is what bounds the step.
    /// Default: 7500ms
    pub speed_soft_budget_ms: u64,

    /// Internal latency trials the throughput probe runs per server.
    /// Default: 2
    pub speed_trial_count: u32,

    /// Candidate servers the throughput probe may select among.
    /// Default: 2
    pub speed_server_cap: u32,

    /// Hard wall-clock deadline on the whole throughput step, measured
    /// from just before the probe starts. The probe's own budget has been
    /// observed to overrun; this one is enforced by the scheduler.
    /// Default: 45s
    pub speed_hard_deadline: Duration,

    /// Settle delay at cycle start, before the first network call.
    /// Default: 2s
    pub settle_delay: Duration,

    /// Delay after each probe step so the status label stays visible.
    /// Default: 2s
    pub visibility_delay: Duration,

    /// Driver ticks between cycle starts.
    /// Default: 60
    pub cycle_period_ticks: u64,

    /// Tick driver period.
    /// Default: 1s
    pub tick_period: Duration,

    /// Decimal places kept when averaging history series.
    /// Default: 3
    pub average_precision: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            target_host: "google.com".to_string(),
            ping_timeout_secs: 10,
            ping_count: 10,
            speed_soft_budget_ms: 7500,
            speed_trial_count: 2,
            speed_server_cap: 2,
            speed_hard_deadline: Duration::from_secs(45),
            settle_delay: Duration::from_secs(2),
            visibility_delay: Duration::from_secs(2),
            cycle_period_ticks: 60,
            tick_period: Duration::from_secs(1),
            average_precision: 3,
        }
    }
}
