//! Live dashboard rendering
//!
//! Formatting is split from terminal control: [`render_dashboard`] turns a
//! snapshot into the full frame text, while [`TerminalRenderer`] owns the
//! clear/reposition/flush dance around it. Sentinel values and the failed
//! phases render red so a bad cycle is visible at a glance.

use crate::core::monitor::types::{CyclePhase, MonitorError, StatusSnapshot, SENTINEL};

use crossterm::style::Stylize;
use crossterm::{cursor, execute, terminal};
use std::io::Write;

/// Per-tick consumer of the status snapshot. The snapshot is advisory and
/// read-only; implementations must not feed it back into control flow.
pub trait Renderer: Send {
    fn draw(&mut self, snapshot: &StatusSnapshot) -> Result<(), MonitorError>;
}

/// Renders the dashboard to stdout, redrawing the whole frame each tick.
pub struct TerminalRenderer {
    out: std::io::Stdout,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self {
            out: std::io::stdout(),
        }
    }

    /// Hide the cursor and clear the screen before the first frame.
    pub fn enter(&mut self) -> Result<(), MonitorError> {
        execute!(
            self.out,
            cursor::Hide,
            terminal::Clear(terminal::ClearType::All)
        )
        .map_err(MonitorError::Terminal)
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for TerminalRenderer {
    fn draw(&mut self, snapshot: &StatusSnapshot) -> Result<(), MonitorError> {
        execute!(
            self.out,
            terminal::Clear(terminal::ClearType::All),
            cursor::MoveTo(0, 0)
        )
        .map_err(MonitorError::Terminal)?;
        self.out
            .write_all(render_dashboard(snapshot).as_bytes())
            .map_err(MonitorError::Terminal)?;
        self.out.flush().map_err(MonitorError::Terminal)
    }
}

/// Restore the cursor on the way out. Safe to call even if `enter` never
/// ran.
pub fn restore_terminal() -> Result<(), MonitorError> {
    execute!(std::io::stdout(), cursor::Show).map_err(MonitorError::Terminal)
}

/// Format one full dashboard frame from a snapshot.
pub fn render_dashboard(snapshot: &StatusSnapshot) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{} | Version {}\n",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    ));
    out.push_str(&format!("Status: {}\n", phase_label(snapshot.phase)));
    out.push_str(&format!(
        "Seconds until next test: {}\n",
        snapshot.countdown
    ));
    out.push_str(&format!("Total tests: {}\n", snapshot.cycles));
    out.push_str(&format!("Uptime: {}\n\n", format_uptime(snapshot.uptime_secs)));

    out.push_str("Last test results:\n");
    out.push_str("------------------\n\n");
    out.push_str(&format!("Latency: {} ms\n", format_value(snapshot.latency_ms)));
    out.push_str("Speed:\n");
    out.push_str(&format!(
        "   Down: {}\t({} Mb)\n   Up:   {}\t({} Mb)\n\n",
        format_value(snapshot.download),
        format_value(snapshot.human_download),
        format_value(snapshot.upload),
        format_value(snapshot.human_upload)
    ));

    let avg = &snapshot.averages;
    out.push_str("Avg test results:\n");
    out.push_str("------------------\n\n");
    out.push_str(&format!("Latency: {} ms\n", avg.latency_ms));
    out.push_str("Speed:\n");
    out.push_str(&format!(
        "   Down: {}\t({} Mb)\n   Up:   {}\t({} Mb)\n",
        avg.download, avg.human_download, avg.upload, avg.human_upload
    ));

    out
}

fn phase_label(phase: CyclePhase) -> String {
    let label = phase.label();
    match phase {
        CyclePhase::Idle | CyclePhase::LatencyFinished | CyclePhase::SpeedFinished => {
            label.green().to_string()
        }
        CyclePhase::Starting => label.yellow().to_string(),
        CyclePhase::RunningLatencyTest | CyclePhase::RunningSpeedTest => label.cyan().to_string(),
        CyclePhase::LatencyFailed | CyclePhase::SpeedFailed => label.red().to_string(),
    }
}

/// Sentinel measurements render red; everything else passes through.
fn format_value(value: f64) -> String {
    if value == SENTINEL {
        value.to_string().red().to_string()
    } else {
        value.to_string()
    }
}

/// Uptime as `days:hours:minutes:seconds`.
fn format_uptime(uptime_secs: u64) -> String {
    let total = chrono::Duration::seconds(uptime_secs as i64);
    let days = total.num_days();
    let hours = total.num_hours() - days * 24;
    let minutes = total.num_minutes() - total.num_hours() * 60;
    let seconds = total.num_seconds() - total.num_minutes() * 60;
    format!("{}:{}:{}:{}", days, hours, minutes, seconds)
}
