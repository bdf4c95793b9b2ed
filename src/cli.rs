use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "linkpulse")]
#[command(version = concat!("Ver:", env!("CARGO_PKG_VERSION")))]
#[command(about = "Terminal network quality monitor with CSV history")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<LogCommand>,
}

/// Log-file maintenance commands. Each acts and exits immediately instead
/// of starting the monitor loop.
#[derive(Subcommand, Debug)]
pub enum LogCommand {
    /// Print the CSV log file's path
    Loc,
    /// Dump the CSV log's raw contents
    View,
    /// Delete the CSV log and reinitialize it with the header row
    Empty,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
