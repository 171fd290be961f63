//! Fixed timestep simulation tick
//!
//! Core game loop that advances a session deterministically.
//! Order inside a tick: start/stop input, taps, spawn, fall, progression.

use glam::Vec2;

use super::fall;
use super::progression::check_level_up;
use super::state::{EndReason, GameEvent, GamePhase, GameState};
use crate::consts::FALL_STEP;

/// Idle bot taps at most once every this many ticks
pub const IDLE_TAP_INTERVAL_TICKS: u64 = 45;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Start or restart the session
    pub start: bool,
    /// End the session early
    pub stop: bool,
    /// Tap/click points in track coordinates, resolved in order
    pub taps: Vec<Vec2>,
    /// Idle/demo mode - a bot plays the game
    pub idle_mode: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput) {
    if input.start || (input.idle_mode && state.phase == GamePhase::Idle) {
        state.start();
    }
    if input.stop {
        state.stop();
    }

    // Nothing moves outside of play
    if state.phase != GamePhase::Playing {
        return;
    }

    state.time_ticks += 1;

    for &tap in &input.taps {
        state.handle_tap(tap);
    }
    if input.idle_mode && state.time_ticks.is_multiple_of(IDLE_TAP_INTERVAL_TICKS) {
        if let Some(target) = idle_target(state) {
            state.handle_tap(target);
        }
    }

    if state.spawner.tick() {
        state.spawn_token();
    }

    let bottom = state.tuning.track_height;
    let missed = fall::advance(&mut state.tokens, FALL_STEP, bottom);
    if !missed.is_empty() {
        for token in &missed {
            log::debug!("Token {} missed at level {}", token.id, state.level);
            state.push_event(GameEvent::TokenMissed { token_id: token.id });
        }
        state.end_game(EndReason::Missed);
        return;
    }

    check_level_up(state);
}

/// The bot aims at the center of the lowest falling token
fn idle_target(state: &GameState) -> Option<Vec2> {
    let size = state.tuning.token_size;
    state
        .tokens
        .iter()
        .max_by(|a, b| {
            a.pos
                .y
                .partial_cmp(&b.pos.y)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|t| t.center(size))
}
