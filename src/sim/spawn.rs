//! Spawn scheduler
//!
//! A countdown timer in simulation ticks. There is only ever one per session,
//! so restarting replaces the pending fire instead of stacking a second timer.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpawnScheduler {
    cadence_ticks: u32,
    /// Ticks left until the next spawn
    countdown: u32,
    running: bool,
}

impl SpawnScheduler {
    /// Start (or restart) with a cadence. The first spawn fires one full
    /// cadence after start.
    pub fn start(&mut self, cadence_ticks: u32) {
        self.cadence_ticks = cadence_ticks.max(1);
        self.countdown = self.cadence_ticks;
        self.running = true;
    }

    /// Cancel the pending spawn. `tick` is a no-op until the next `start`.
    pub fn stop(&mut self) {
        self.running = false;
        self.countdown = 0;
    }

    /// Apply a new cadence after a level change, restarting the countdown
    pub fn reconfigure(&mut self, cadence_ticks: u32) {
        if self.running {
            self.start(cadence_ticks);
        } else {
            self.cadence_ticks = cadence_ticks.max(1);
        }
    }

    /// Advance one tick. Returns true when a token should spawn.
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown == 0 {
            self.countdown = self.cadence_ticks;
            true
        } else {
            false
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn cadence_ticks(&self) -> u32 {
        self.cadence_ticks
    }
}
