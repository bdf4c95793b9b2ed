/*!
Tick driver - the fixed one-second heartbeat of the monitor.

Every tick does exactly three things: advance the cycle countdown
(spawning a measurement cycle when it expires), bump uptime, and hand the
current snapshot to the renderer. The cycle runs as its own task so a
slow probe never stalls the dashboard refresh.

Shutdown is a watch channel raced against the interval; flipping it stops
future ticks at the next boundary. An in-flight cycle is left to finish
on its own - the stop contract is "no new ticks", not "interrupt network
calls".
*/

use crate::core::monitor::config::MonitorConfig;
use crate::core::monitor::renderer::Renderer;
use crate::core::monitor::scheduler::CycleScheduler;
use crate::core::monitor::types::{MonitorError, StatusSnapshot};

use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

pub struct TickDriver {
    config: MonitorConfig,
    scheduler: Arc<CycleScheduler>,
    snapshot: Arc<Mutex<StatusSnapshot>>,
    renderer: Box<dyn Renderer>,
    shutdown: watch::Receiver<bool>,
    countdown: u64,
}

impl TickDriver {
    /// The countdown starts at zero so the first cycle launches on the
    /// very first tick after startup.
    pub fn new(
        config: MonitorConfig,
        scheduler: Arc<CycleScheduler>,
        snapshot: Arc<Mutex<StatusSnapshot>>,
        renderer: Box<dyn Renderer>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            config,
            scheduler,
            snapshot,
            renderer,
            shutdown,
            countdown: 0,
        }
    }

    /// Tick once per period until the shutdown signal fires.
    pub async fn run(mut self) -> Result<(), MonitorError> {
        let mut ticks = tokio::time::interval(self.config.tick_period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticks.tick() => self.tick()?,
                _ = self.shutdown.changed() => break,
            }
        }

        Ok(())
    }

    fn tick(&mut self) -> Result<(), MonitorError> {
        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown == 0 {
            let scheduler = Arc::clone(&self.scheduler);
            tokio::spawn(async move { scheduler.run_cycle().await });
            self.countdown = self.config.cycle_period_ticks;
        }

        let snapshot = {
            let mut snap = self.snapshot.lock().unwrap_or_else(|e| e.into_inner());
            snap.countdown = self.countdown;
            snap.uptime_secs += 1;
            snap.clone()
        };

        self.renderer.draw(&snapshot)
    }
}
