//! Fall simulator
//!
//! Advances every falling token exactly once per step and splits off the
//! ones that reached the bottom boundary.

use super::state::{FallingToken, TokenState};

/// Move all falling tokens down by `speed * step`.
///
/// Tokens whose top edge reaches `bottom` (inclusive) are marked `Missed`,
/// removed from `tokens` and returned in id order.
pub fn advance(tokens: &mut Vec<FallingToken>, step: f32, bottom: f32) -> Vec<FallingToken> {
    for token in tokens.iter_mut() {
        if token.state == TokenState::Falling {
            token.pos.y += token.speed * step;
            if token.pos.y >= bottom {
                token.state = TokenState::Missed;
            }
        }
    }

    let mut missed = Vec::new();
    tokens.retain(|t| {
        if t.state == TokenState::Missed {
            missed.push(t.clone());
            false
        } else {
            true
        }
    });
    missed
}

/// Ticks for a token at `y` with `speed` to reach `bottom` at step 1
pub fn ticks_to_bottom(y: f32, speed: f32, bottom: f32) -> u32 {
    if y >= bottom {
        return 0;
    }
    ((bottom - y) / speed).ceil() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TokenTypeId;
    use glam::Vec2;
    use proptest::prelude::*;

    fn token(id: u32, y: f32, speed: f32) -> FallingToken {
        FallingToken {
            id,
            token_type: TokenTypeId::new(1).unwrap(),
            pos: Vec2::new(0.0, y),
            speed,
            state: TokenState::Falling,
        }
    }

    #[test]
    fn test_advance_moves_each_token_once() {
        let mut tokens = vec![token(0, 0.0, 2.0), token(1, 10.0, 3.5)];
        let missed = advance(&mut tokens, 1.0, 800.0);
        assert!(missed.is_empty());
        assert_eq!(tokens[0].pos.y, 2.0);
        assert_eq!(tokens[1].pos.y, 13.5);
    }

    #[test]
    fn test_missed_tokens_removed() {
        let mut tokens = vec![token(0, 795.0, 5.0), token(1, 0.0, 5.0), token(2, 799.0, 0.5)];
        let missed = advance(&mut tokens, 1.0, 800.0);
        assert_eq!(missed.iter().map(|t| t.id).collect::<Vec<_>>(), vec![0]);
        assert_eq!(missed[0].state, TokenState::Missed);
        assert_eq!(tokens.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_exact_tick_count_to_bottom() {
        // p0 = -60, B = 800, s = 3 -> ceil(860 / 3) = 287
        let mut tokens = vec![token(0, -60.0, 3.0)];
        let expected = ticks_to_bottom(-60.0, 3.0, 800.0);
        assert_eq!(expected, 287);
        for _ in 0..expected - 1 {
            assert!(advance(&mut tokens, 1.0, 800.0).is_empty());
        }
        assert_eq!(advance(&mut tokens, 1.0, 800.0).len(), 1);
        assert!(tokens.is_empty());
    }

    proptest! {
        #[test]
        fn prop_reaches_bottom_after_ceil_ticks(
            p0 in -100i32..700,
            speed in 1u32..20,
        ) {
            // Integer inputs keep the float sums exact
            let (p0, speed, bottom) = (p0 as f32, speed as f32, 800.0);
            let expected = ticks_to_bottom(p0, speed, bottom);
            let mut tokens = vec![token(0, p0, speed)];
            let mut ticks = 0;
            while !tokens.is_empty() {
                advance(&mut tokens, 1.0, bottom);
                ticks += 1;
            }
            prop_assert_eq!(ticks, expected);
        }
    }
}
