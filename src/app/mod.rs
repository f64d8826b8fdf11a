pub mod shutdown;
pub mod state;

pub use shutdown::ShutdownManager;
pub use state::App;

use anyhow::Result;
use std::fmt;
use std::time::Instant;

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    TickLimit,
    Shutdown,
    Extinction,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StopReason::TickLimit => "tick limit reached",
            StopReason::Shutdown => "shutdown requested",
            StopReason::Extinction => "population extinct",
        };
        f.write_str(label)
    }
}

impl App {
    /// Ticks until the limit, a shutdown request or extinction, then flushes
    /// the feed and saves. Save failures end the run with an error.
    pub fn run(&mut self) -> Result<StopReason> {
        let started = Instant::now();
        tracing::info!(
            tick = self.world.tick,
            population = self.world.population(),
            seed = self.world.seed,
            "Simulation started"
        );

        let reason = loop {
            if self.shutdown.is_shutdown_requested() {
                break StopReason::Shutdown;
            }
            if self.stop_at.is_some_and(|limit| self.world.tick >= limit) {
                break StopReason::TickLimit;
            }
            if self.world.population() == 0 {
                break StopReason::Extinction;
            }
            self.step()?;
        };

        self.finish()?;
        tracing::info!(
            %reason,
            tick = self.world.tick,
            population = self.world.population(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Simulation stopped"
        );
        Ok(reason)
    }

    /// One tick: record every event, narrate the feed, save when due.
    pub fn step(&mut self) -> Result<()> {
        let events = self.world.update()?;
        self.history.log_events(&events)?;
        let notices = self.world.take_notices();
        self.chronicle.narrate_all(&notices);

        if self.save_interval > 0 && self.world.tick % self.save_interval == 0 {
            self.save_state()?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(summary) = self.world.flush_summary() {
            self.chronicle.narrate(&summary);
        }
        if self.shutdown.should_save_on_exit() {
            self.save_state()?;
        }
        self.history.flush()?;
        for (tag, count) in self.world.metrics.event_totals() {
            tracing::debug!(tag = tag.label(), count, "Event total");
        }
        Ok(())
    }
}
