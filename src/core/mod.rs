pub mod monitor;

pub use monitor::{CycleScheduler, MonitorConfig, StatusSnapshot, TickDriver};
