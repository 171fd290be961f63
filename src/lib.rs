//! Token Rain - a falling-token collection game
//!
//! Core modules:
//! - `catalog`: Token types, rarity weights, point values
//! - `sim`: Deterministic simulation (spawning, falling, taps, level progression)
//! - `ledger`: Server-side pending-token ledger
//! - `leaderboard`: Top-10 score table
//! - `claim`: Claim flow handing pending tokens to a claim sink
//! - `session`: Async driver running a simulation against a backend
//! - `server`: HTTP surface over ledger, leaderboard and claims
//! - `tuning`: Data-driven game balance

pub mod catalog;
pub mod claim;
pub mod cooldown;
pub mod error;
pub mod leaderboard;
pub mod ledger;
pub mod server;
pub mod session;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use catalog::{Catalog, PlayerId, RarityTier, TokenType, TokenTypeId};
pub use leaderboard::Leaderboard;
pub use ledger::PendingLedger;
pub use settings::ServerSettings;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation rate (one tick per display frame)
    pub const SIM_HZ: u32 = 60;
    /// Fixed simulation timestep in seconds
    pub const SIM_DT: f64 = 1.0 / SIM_HZ as f64;
    /// Fall distance multiplier applied per tick (speeds are px/tick)
    pub const FALL_STEP: f32 = 1.0;

    /// Valid token type ids at the ledger boundary are 1..=MAX_TOKEN_TYPE
    pub const MAX_TOKEN_TYPE: u8 = 15;

    /// Points per rarity tier
    pub const COMMON_POINTS: u64 = 10;
    pub const RARE_POINTS: u64 = 50;
    pub const EPIC_POINTS: u64 = 100;
}

/// Convert a duration in milliseconds to whole simulation ticks (rounded up)
#[inline]
pub fn ms_to_ticks(ms: u32) -> u32 {
    (ms as u64 * consts::SIM_HZ as u64).div_ceil(1000) as u32
}

/// Current wall-clock time as Unix milliseconds
pub fn unix_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
