use linkpulse::cli::{Cli, LogCommand};
use linkpulse::core::monitor::{
    renderer, CycleLog, CycleScheduler, MonitorConfig, PingCommand, SampleHistory,
    SpeedtestCommand, StatusSnapshot, TerminalRenderer, TickDriver,
};

use std::sync::{Arc, Mutex};
use tokio::sync::watch;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse_args();
    let log = CycleLog::at_default_path();

    // Log maintenance commands act and exit without starting the monitor
    match cli.command {
        Some(LogCommand::Loc) => {
            println!("{}", log.path().display());
            return Ok(());
        }
        Some(LogCommand::View) => {
            log.ensure_exists()?;
            print!("{}", log.contents()?);
            return Ok(());
        }
        Some(LogCommand::Empty) => {
            log.clear()?;
            return Ok(());
        }
        None => {}
    }

    // Create the CSV with its header before the first cycle runs
    log.ensure_exists()?;

    let config = MonitorConfig::default();
    let snapshot = Arc::new(Mutex::new(StatusSnapshot::default()));
    let history = Arc::new(Mutex::new(SampleHistory::new()));
    let scheduler = Arc::new(CycleScheduler::new(
        config.clone(),
        Arc::clone(&snapshot),
        history,
        log,
        Arc::new(PingCommand),
        Arc::new(SpeedtestCommand),
    ));

    let mut terminal = TerminalRenderer::new();
    terminal.enter()?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let driver = TickDriver::new(config, scheduler, snapshot, Box::new(terminal), shutdown_rx);
    let mut driver_task = tokio::spawn(driver.run());

    // A single interrupt stops future ticks; an in-flight cycle is not
    // interrupted, matching the stop contract.
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            let _ = shutdown_tx.send(true);
            let _ = (&mut driver_task).await;
        }
        _ = &mut driver_task => {}
    }

    renderer::restore_terminal()?;
    Ok(())
}
