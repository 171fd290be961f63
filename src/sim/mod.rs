//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by token ID)
//! - No rendering, network or platform dependencies

pub mod collision;
pub mod fall;
pub mod progression;
pub mod spawn;
pub mod state;
pub mod tick;

pub use collision::{footprint_contains, resolve_tap};
pub use progression::{check_level_up, should_level_up};
pub use spawn::SpawnScheduler;
pub use state::{EndReason, FallingToken, GameEvent, GamePhase, GameState, TokenState};
pub use tick::{TickInput, tick};
