pub mod config;
pub mod debug_logger;
pub mod driver;
pub mod logfile;
pub mod probes;
pub mod renderer;
pub mod scheduler;
pub mod store;
pub mod types;

// Re-export commonly used items
pub use config::MonitorConfig;
pub use debug_logger::{get_debug_logger, DebugLogger};
pub use driver::TickDriver;
pub use logfile::{CycleLog, LOG_BASENAME};
pub use probes::{
    LatencyProbe, PingCommand, ProbeError, SpeedtestCommand, ThroughputOptions, ThroughputProbe,
    ThroughputSample,
};
pub use renderer::{render_dashboard, restore_terminal, Renderer, TerminalRenderer};
pub use scheduler::{extract_rtt, CycleScheduler};
pub use store::{average, SampleHistory};
pub use types::*;
