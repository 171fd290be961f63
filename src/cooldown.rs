//! Session cooldown gate
//!
//! A player may start one session per cooldown window.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::catalog::PlayerId;
use crate::error::CooldownError;

/// Default window between session starts
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(4 * 60 * 60);

#[derive(Debug)]
pub struct SessionGate {
    window: Duration,
    last_start: Mutex<HashMap<PlayerId, Instant>>,
}

impl Default for SessionGate {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

impl SessionGate {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_start: Mutex::new(HashMap::new()),
        }
    }

    /// Record a session start at `now`, or refuse with the time remaining
    pub fn try_start(&self, player: &PlayerId, now: Instant) -> Result<(), CooldownError> {
        let mut last_start = self.last_start.lock();
        if let Some(&last) = last_start.get(player) {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.window {
                return Err(CooldownError::Active {
                    remaining: self.window - elapsed,
                });
            }
        }
        last_start.insert(player.clone(), now);
        Ok(())
    }
}
