//! Level progression
//!
//! A level advances when its quota is met or its time limit runs out,
//! until the max level is reached.

use super::state::{GameEvent, GameState};

/// Whether the current level should advance this tick
pub fn should_level_up(state: &GameState) -> bool {
    if !state.is_playing() || state.level >= state.tuning.max_level {
        return false;
    }
    state.collected_this_level >= state.tuning.level_quota
        || state.level_elapsed_ticks() > state.tuning.level_time_limit_ticks()
}

/// Apply at most one level-up. Returns true if the level changed.
pub fn check_level_up(state: &mut GameState) -> bool {
    if !should_level_up(state) {
        return false;
    }
    state.level += 1;
    state.speed_multiplier += state.tuning.speed_step;
    state.collected_this_level = 0;
    state.level_start_tick = state.time_ticks;
    let cadence = state.tuning.cadence_ticks(state.level);
    state.spawner.reconfigure(cadence);
    state.push_event(GameEvent::LevelUp { level: state.level });
    log::info!(
        "{} reached level {} (speed x{}, spawn every {} ticks)",
        state.player,
        state.level,
        state.speed_multiplier,
        cadence
    );
    true
}
