//! Game state and core simulation types
//!
//! One `GameState` is one player's session: the progression counters, the
//! live token set, the spawn scheduler and the seeded RNG all live here.

use std::sync::Arc;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use super::spawn::SpawnScheduler;
use crate::catalog::{Catalog, PlayerId, TokenTypeId};
use crate::tuning::Tuning;

/// Current phase of a session. Level-ups are instantaneous pulses inside `Playing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GamePhase {
    /// No session started yet
    Idle,
    /// Active gameplay
    Playing,
    /// Session ended, state frozen until restart
    GameOver,
}

/// Lifecycle of a spawned token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenState {
    Falling,
    Collected,
    Missed,
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EndReason {
    /// A token reached the bottom of the track
    Missed,
    /// Explicit stop by the player or driver
    Stopped,
}

/// A token falling down the track
#[derive(Debug, Clone, Serialize)]
pub struct FallingToken {
    pub id: u32,
    pub token_type: TokenTypeId,
    /// Top-left corner of the footprint; x is fixed at spawn
    pub pos: Vec2,
    /// Fall speed in px/tick, fixed at spawn
    pub speed: f32,
    pub state: TokenState,
}

impl FallingToken {
    /// Center of the token footprint
    pub fn center(&self, size: f32) -> Vec2 {
        self.pos + Vec2::splat(size / 2.0)
    }
}

/// Things that happened during a tick or tap, drained by the driver
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GameEvent {
    Started,
    TokenSpawned {
        token_id: u32,
        token_type: TokenTypeId,
    },
    TokenCollected {
        player: PlayerId,
        token_id: u32,
        token_type: TokenTypeId,
        points: u64,
    },
    TokenMissed {
        token_id: u32,
    },
    LevelUp {
        level: u32,
    },
    GameOver {
        reason: EndReason,
        level: u32,
        score: u64,
        collected_this_level: u32,
    },
}

/// Complete session state (deterministic given seed and inputs)
#[derive(Debug, Clone)]
pub struct GameState {
    pub player: PlayerId,
    /// Run seed for reproducibility
    pub seed: u64,
    rng: Pcg32,
    pub tuning: Tuning,
    catalog: Arc<Catalog>,
    pub phase: GamePhase,
    /// Current level (1..=max_level)
    pub level: u32,
    pub speed_multiplier: f32,
    pub collected_this_level: u32,
    /// Tick at which the current level began
    pub level_start_tick: u64,
    pub total_score: u64,
    /// Tokens collected over the whole session
    pub tokens_collected: u32,
    /// Simulation tick counter for the current session
    pub time_ticks: u64,
    /// Live falling tokens (sorted by id)
    pub tokens: Vec<FallingToken>,
    pub spawner: SpawnScheduler,
    pub end_reason: Option<EndReason>,
    events: Vec<GameEvent>,
    /// Next token ID
    next_id: u32,
}

impl GameState {
    /// Create an idle session for a player
    pub fn new(player: PlayerId, seed: u64, tuning: Tuning, catalog: Arc<Catalog>) -> Self {
        Self {
            player,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            tuning,
            catalog,
            phase: GamePhase::Idle,
            level: 1,
            speed_multiplier: 1.0,
            collected_this_level: 0,
            level_start_tick: 0,
            total_score: 0,
            tokens_collected: 0,
            time_ticks: 0,
            tokens: Vec::new(),
            spawner: SpawnScheduler::default(),
            end_reason: None,
            events: Vec::new(),
            next_id: 0,
        }
    }

    /// Idle session with default tuning and the standard catalog
    pub fn with_defaults(player: PlayerId, seed: u64) -> Self {
        Self::new(player, seed, Tuning::default(), Catalog::standard())
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    /// Start (or restart) a session: Idle/GameOver -> Playing.
    ///
    /// Resets progression, clears the live set and restarts the spawn
    /// scheduler. Starting while already playing restarts as well.
    pub fn start(&mut self) {
        self.level = 1;
        self.speed_multiplier = 1.0;
        self.collected_this_level = 0;
        self.total_score = 0;
        self.tokens_collected = 0;
        self.time_ticks = 0;
        self.level_start_tick = 0;
        self.tokens.clear();
        self.next_id = 0;
        self.end_reason = None;
        self.phase = GamePhase::Playing;
        self.spawner.start(self.tuning.cadence_ticks(self.level));
        self.events.push(GameEvent::Started);
        log::info!("Session started for {}", self.player);
    }

    /// Explicitly end a playing session
    pub fn stop(&mut self) {
        if self.is_playing() {
            self.end_game(EndReason::Stopped);
        }
    }

    /// Playing -> GameOver. Stops spawning and freezes the live set.
    pub(crate) fn end_game(&mut self, reason: EndReason) {
        self.phase = GamePhase::GameOver;
        self.spawner.stop();
        self.end_reason = Some(reason);
        self.events.push(GameEvent::GameOver {
            reason,
            level: self.level,
            score: self.total_score,
            collected_this_level: self.collected_this_level,
        });
        log::info!(
            "Game over for {} ({:?}): level {}, score {}",
            self.player,
            reason,
            self.level,
            self.total_score
        );
    }

    /// Allocate a new token ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Spawn one token with a weighted random type, random column and speed
    pub fn spawn_token(&mut self) -> u32 {
        let token_type = self.catalog.select(&mut self.rng);
        let x_range = self.tuning.spawn_x_range();
        let x = if x_range > 0.0 {
            self.rng.random_range(0.0..x_range)
        } else {
            0.0
        };
        let (min, max) = (self.tuning.base_speed_min, self.tuning.base_speed_max);
        let base = if max > min {
            self.rng.random_range(min..max)
        } else {
            min
        };
        let speed = base * self.speed_multiplier;
        let y = self.tuning.spawn_y;
        self.spawn_token_at(token_type, Vec2::new(x, y), speed)
    }

    /// Place a token at an exact position and speed
    pub fn spawn_token_at(&mut self, token_type: TokenTypeId, pos: Vec2, speed: f32) -> u32 {
        let id = self.next_entity_id();
        self.tokens.push(FallingToken {
            id,
            token_type,
            pos,
            speed,
            state: TokenState::Falling,
        });
        self.events.push(GameEvent::TokenSpawned {
            token_id: id,
            token_type,
        });
        id
    }

    /// Collision Resolver entry point for input events between ticks
    pub fn handle_tap(&mut self, point: Vec2) -> Vec<u32> {
        super::collision::resolve_tap(self, point)
    }

    /// Record a collected token: score, level counter, event
    pub(crate) fn record_collection(&mut self, token: &FallingToken) {
        let points = self.catalog.points_for(token.token_type);
        self.total_score += points;
        self.collected_this_level += 1;
        self.tokens_collected += 1;
        self.events.push(GameEvent::TokenCollected {
            player: self.player.clone(),
            token_id: token.id,
            token_type: token.token_type,
            points,
        });
    }

    pub(crate) fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take the events queued since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Ticks elapsed in the current level
    pub fn level_elapsed_ticks(&self) -> u64 {
        self.time_ticks - self.level_start_tick
    }
}
