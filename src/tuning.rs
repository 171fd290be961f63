//! Data-driven game balance
//!
//! Every gameplay constant lives here so a session can be rebalanced from a
//! JSON file without a rebuild. Missing fields take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::{consts::SIM_HZ, ms_to_ticks};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Track ===
    /// Track width in px
    pub track_width: f32,
    /// Bottom boundary in px; a token whose top edge reaches it is missed
    pub track_height: f32,
    /// Side of the square token footprint in px
    pub token_size: f32,
    /// Vertical position new tokens start at (above the visible track)
    pub spawn_y: f32,

    // === Falling ===
    /// Base fall speed range in px/tick, scaled by the level speed multiplier
    pub base_speed_min: f32,
    pub base_speed_max: f32,
    /// Speed multiplier gained per level
    pub speed_step: f32,

    // === Spawning ===
    /// Spawn cadence = max(min_cadence_ms, base_cadence_ms - level * cadence_decrement_ms)
    pub base_cadence_ms: u32,
    pub min_cadence_ms: u32,
    pub cadence_decrement_ms: u32,

    // === Progression ===
    /// Collections needed to clear a level
    pub level_quota: u32,
    /// Seconds before a level advances regardless of quota
    pub level_time_limit_secs: u32,
    pub max_level: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            track_width: 480.0,
            track_height: 800.0,
            token_size: 60.0,
            spawn_y: -60.0,

            base_speed_min: 2.0,
            base_speed_max: 3.0,
            speed_step: 0.5,

            base_cadence_ms: 1000,
            min_cadence_ms: 400,
            cadence_decrement_ms: 50,

            level_quota: 10,
            level_time_limit_secs: 30,
            max_level: 10,
        }
    }
}

impl Tuning {
    /// Spawn cadence for a level in milliseconds
    pub fn cadence_ms(&self, level: u32) -> u32 {
        self.base_cadence_ms
            .saturating_sub(level.saturating_mul(self.cadence_decrement_ms))
            .max(self.min_cadence_ms)
    }

    /// Spawn cadence for a level in simulation ticks (never zero)
    pub fn cadence_ticks(&self, level: u32) -> u32 {
        ms_to_ticks(self.cadence_ms(level)).max(1)
    }

    /// Level time limit in simulation ticks
    pub fn level_time_limit_ticks(&self) -> u64 {
        self.level_time_limit_secs as u64 * SIM_HZ as u64
    }

    /// Horizontal spawn range: a token never overhangs the right edge
    pub fn spawn_x_range(&self) -> f32 {
        (self.track_width - self.token_size).max(0.0)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token_size <= 0.0 {
            return Err(ConfigError::InvalidTuning("token_size must be positive"));
        }
        if self.base_speed_min <= 0.0 || self.base_speed_max < self.base_speed_min {
            return Err(ConfigError::InvalidTuning(
                "base speed range must be positive and ordered",
            ));
        }
        if self.max_level == 0 {
            return Err(ConfigError::InvalidTuning("max_level must be at least 1"));
        }
        Ok(())
    }

    /// Load tuning from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let tuning: Tuning = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from a JSON file, falling back to defaults on any error
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            log::info!("Using default tuning");
            return Self::default();
        };
        match Self::load(path) {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path.display());
                tuning
            }
            Err(e) => {
                log::warn!("{e}, using default tuning");
                Self::default()
            }
        }
    }
}
