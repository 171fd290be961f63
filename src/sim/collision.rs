//! Tap collision against token footprints
//!
//! A token occupies the axis-aligned square `[x, x + size] x [y, y + size]`.
//! Edges are inclusive, so a tap exactly on the border collects the token.

use glam::Vec2;

use super::state::{GameState, TokenState};

/// Check whether a point lies inside a token footprint (edges inclusive)
#[inline]
pub fn footprint_contains(token_pos: Vec2, size: f32, point: Vec2) -> bool {
    point.x >= token_pos.x
        && point.x <= token_pos.x + size
        && point.y >= token_pos.y
        && point.y <= token_pos.y + size
}

/// Collect every falling token under the tap point.
///
/// All overlapping tokens are collected by the same tap. Returns the
/// collected ids in id order; empty when not playing or nothing was hit.
pub fn resolve_tap(state: &mut GameState, point: Vec2) -> Vec<u32> {
    if !state.is_playing() {
        return Vec::new();
    }

    let size = state.tuning.token_size;
    let mut collected = Vec::new();
    for token in state.tokens.iter_mut() {
        if token.state == TokenState::Falling && footprint_contains(token.pos, size, point) {
            token.state = TokenState::Collected;
            collected.push(token.clone());
        }
    }
    if collected.is_empty() {
        return Vec::new();
    }

    state.tokens.retain(|t| t.state == TokenState::Falling);
    for token in &collected {
        state.record_collection(token);
    }
    collected.iter().map(|t| t.id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{PlayerId, TokenTypeId};
    use crate::sim::state::GameEvent;
    use proptest::prelude::*;

    fn playing_state() -> GameState {
        let mut state = GameState::with_defaults(PlayerId::parse("alice").unwrap(), 5);
        state.start();
        state.drain_events();
        state
    }

    fn tt(id: i64) -> TokenTypeId {
        TokenTypeId::new(id).unwrap()
    }

    #[test]
    fn test_footprint_edges_inclusive() {
        let pos = Vec2::new(100.0, 200.0);
        assert!(footprint_contains(pos, 60.0, Vec2::new(130.0, 230.0)));
        assert!(footprint_contains(pos, 60.0, Vec2::new(100.0, 200.0)));
        assert!(footprint_contains(pos, 60.0, Vec2::new(160.0, 260.0)));
        assert!(!footprint_contains(pos, 60.0, Vec2::new(160.01, 230.0)));
        assert!(!footprint_contains(pos, 60.0, Vec2::new(130.0, 199.99)));
    }

    #[test]
    fn test_tap_collects_and_scores() {
        let mut state = playing_state();
        let id = state.spawn_token_at(tt(14), Vec2::new(0.0, 100.0), 2.0);
        state.drain_events();

        let hit = state.handle_tap(Vec2::new(30.0, 130.0));
        assert_eq!(hit, vec![id]);
        assert!(state.tokens.is_empty());
        assert_eq!(state.total_score, 100);
        assert_eq!(state.collected_this_level, 1);
        assert_eq!(
            state.drain_events(),
            vec![GameEvent::TokenCollected {
                player: PlayerId::parse("alice").unwrap(),
                token_id: id,
                token_type: tt(14),
                points: 100,
            }]
        );
    }

    #[test]
    fn test_overlapping_tokens_collected_together() {
        let mut state = playing_state();
        let a = state.spawn_token_at(tt(1), Vec2::new(0.0, 0.0), 2.0);
        let b = state.spawn_token_at(tt(11), Vec2::new(30.0, 30.0), 2.0);
        let c = state.spawn_token_at(tt(2), Vec2::new(300.0, 30.0), 2.0);

        let hit = state.handle_tap(Vec2::new(45.0, 45.0));
        assert_eq!(hit, vec![a, b]);
        assert_eq!(state.tokens.len(), 1);
        assert_eq!(state.tokens[0].id, c);
        assert_eq!(state.total_score, 60);
    }

    #[test]
    fn test_miss_is_noop() {
        let mut state = playing_state();
        state.spawn_token_at(tt(1), Vec2::new(0.0, 0.0), 2.0);
        assert!(state.handle_tap(Vec2::new(200.0, 200.0)).is_empty());
        assert_eq!(state.tokens.len(), 1);
        assert_eq!(state.total_score, 0);
    }

    #[test]
    fn test_tap_ignored_when_not_playing() {
        let mut state = playing_state();
        state.spawn_token_at(tt(1), Vec2::new(0.0, 0.0), 2.0);
        state.stop();
        assert!(state.handle_tap(Vec2::new(10.0, 10.0)).is_empty());
        assert_eq!(state.tokens.len(), 1);
    }

    proptest! {
        #[test]
        fn prop_inside_hits_outside_misses(
            x in 0.0f32..400.0,
            y in -60.0f32..700.0,
            dx in 0.5f32..59.5,
            dy in 0.5f32..59.5,
        ) {
            let pos = Vec2::new(x, y);
            prop_assert!(footprint_contains(pos, 60.0, pos + Vec2::new(dx, dy)));
            prop_assert!(!footprint_contains(pos, 60.0, pos + Vec2::new(-dx, dy)));
            prop_assert!(!footprint_contains(pos, 60.0, pos + Vec2::new(dx, 60.0 + dy)));
        }
    }
}
