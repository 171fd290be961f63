//! Async session driver
//!
//! Runs one `GameState` on a fixed-rate tokio interval, resolves taps as
//! they arrive, and reports collections and the final score to a backend.
//! Reports are fire-and-forget: the frame loop never awaits them, failures
//! are logged and never retried.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use glam::Vec2;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tokio::time::MissedTickBehavior;

use crate::catalog::{PlayerId, TokenTypeId};
use crate::consts::SIM_DT;
use crate::error::BackendError;
use crate::sim::{EndReason, GameEvent, GamePhase, GameState, TickInput, tick};

/// Where collections and scores go
pub trait GameBackend: Send + Sync + 'static {
    fn record_collection(
        &self,
        player: &PlayerId,
        token_type: TokenTypeId,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Returns the leaderboard rank, if any
    fn submit_score(
        &self,
        player: &PlayerId,
        score: u64,
    ) -> impl Future<Output = Result<Option<usize>, BackendError>> + Send;
}

/// Player input delivered to a running session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Start,
    Tap(Vec2),
    Stop,
}

/// Final numbers of a finished session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub player: PlayerId,
    pub level: u32,
    pub score: u64,
    pub collected_this_level: u32,
    pub tokens_collected: u32,
    pub end_reason: Option<EndReason>,
    /// Reports the backend never acknowledged
    pub failed_reports: u32,
}

/// Outcome of one background report
#[derive(Debug)]
enum Report {
    Collection {
        token_type: TokenTypeId,
        result: Result<(), BackendError>,
    },
    Score {
        score: u64,
        result: Result<Option<usize>, BackendError>,
    },
}

pub struct SessionDriver<B> {
    state: GameState,
    backend: Arc<B>,
    idle_mode: bool,
    reports: JoinSet<Report>,
    failed_reports: u32,
}

impl<B: GameBackend> SessionDriver<B> {
    pub fn new(state: GameState, backend: Arc<B>) -> Self {
        Self {
            state,
            backend,
            idle_mode: false,
            reports: JoinSet::new(),
            failed_reports: 0,
        }
    }

    /// Let the idle bot play
    pub fn with_idle_mode(mut self, idle_mode: bool) -> Self {
        self.idle_mode = idle_mode;
        self
    }

    /// Drive the session until it ends.
    ///
    /// Returns at game over, or when the command channel closes while no
    /// session is in progress. Outstanding reports finish before returning.
    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<SessionCommand>,
    ) -> SessionSummary {
        let mut frames = tokio::time::interval(Duration::from_secs_f64(SIM_DT));
        frames.set_missed_tick_behavior(MissedTickBehavior::Burst);
        let mut commands_open = true;

        loop {
            tokio::select! {
                _ = frames.tick() => {
                    let input = TickInput {
                        idle_mode: self.idle_mode,
                        ..Default::default()
                    };
                    tick(&mut self.state, &input);
                }
                command = commands.recv(), if commands_open => match command {
                    Some(SessionCommand::Start) => self.state.start(),
                    Some(SessionCommand::Tap(point)) => {
                        self.state.handle_tap(point);
                    }
                    Some(SessionCommand::Stop) => self.state.stop(),
                    None => commands_open = false,
                },
            }

            self.dispatch_events();
            self.reap_reports();

            if self.state.phase == GamePhase::GameOver {
                break;
            }
            if !commands_open && !self.idle_mode && self.state.phase == GamePhase::Idle {
                break;
            }
        }

        self.finish().await
    }

    /// Turn drained game events into background reports
    fn dispatch_events(&mut self) {
        for event in self.state.drain_events() {
            match event {
                GameEvent::TokenCollected {
                    player, token_type, ..
                } => {
                    let backend = Arc::clone(&self.backend);
                    self.reports.spawn(async move {
                        let result = backend.record_collection(&player, token_type).await;
                        Report::Collection { token_type, result }
                    });
                }
                GameEvent::GameOver {
                    reason: EndReason::Missed,
                    score,
                    ..
                } => {
                    let backend = Arc::clone(&self.backend);
                    let player = self.state.player.clone();
                    self.reports.spawn(async move {
                        let result = backend.submit_score(&player, score).await;
                        Report::Score { score, result }
                    });
                }
                GameEvent::LevelUp { level } => {
                    log::debug!("{} level up -> {level}", self.state.player);
                }
                _ => {}
            }
        }
    }

    /// Observe finished reports without waiting on pending ones
    fn reap_reports(&mut self) {
        while let Some(finished) = self.reports.try_join_next() {
            self.observe(finished);
        }
    }

    fn observe(&mut self, finished: Result<Report, JoinError>) {
        match finished {
            Ok(Report::Collection { result: Ok(()), .. }) => {}
            Ok(Report::Collection {
                token_type,
                result: Err(e),
            }) => {
                self.failed_reports += 1;
                log::warn!(
                    "Dropped collection of token {token_type} for {}: {e}",
                    self.state.player
                );
            }
            Ok(Report::Score { score, result }) => match result {
                Ok(Some(rank)) => log::info!("{} placed #{rank} with {score}", self.state.player),
                Ok(None) => log::info!("{} scored {score}, not ranked", self.state.player),
                Err(e) => {
                    self.failed_reports += 1;
                    log::warn!("Score submission failed for {}: {e}", self.state.player);
                }
            },
            Err(e) => {
                self.failed_reports += 1;
                log::warn!("Report task failed: {e}");
            }
        }
    }

    async fn finish(mut self) -> SessionSummary {
        self.dispatch_events();
        while let Some(finished) = self.reports.join_next().await {
            self.observe(finished);
        }
        SessionSummary {
            player: self.state.player.clone(),
            level: self.state.level,
            score: self.state.total_score,
            collected_this_level: self.state.collected_this_level,
            tokens_collected: self.state.tokens_collected,
            end_reason: self.state.end_reason,
            failed_reports: self.failed_reports,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::PendingLedger;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct RecordingBackend {
        ledger: PendingLedger,
        scores: parking_lot::Mutex<Vec<u64>>,
        calls: AtomicU32,
        /// Fail every n-th collection report (0 = never)
        fail_every: u32,
    }

    impl GameBackend for RecordingBackend {
        async fn record_collection(
            &self,
            player: &PlayerId,
            token_type: TokenTypeId,
        ) -> Result<(), BackendError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_every > 0 && n % self.fail_every == 0 {
                return Err(BackendError::Unavailable("connection reset".into()));
            }
            self.ledger.record_collection(player, token_type);
            Ok(())
        }

        async fn submit_score(
            &self,
            _player: &PlayerId,
            score: u64,
        ) -> Result<Option<usize>, BackendError> {
            self.scores.lock().push(score);
            Ok(Some(1))
        }
    }

    fn alice_state() -> GameState {
        GameState::with_defaults(PlayerId::parse("alice").unwrap(), 2024)
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_session_reports_every_collection() {
        let backend = Arc::new(RecordingBackend::default());
        let (_tx, rx) = mpsc::unbounded_channel();
        let summary = SessionDriver::new(alice_state(), Arc::clone(&backend))
            .with_idle_mode(true)
            .run(rx)
            .await;

        assert_eq!(summary.end_reason, Some(EndReason::Missed));
        assert!(summary.tokens_collected > 0);
        assert_eq!(summary.failed_reports, 0);
        let alice = PlayerId::parse("alice").unwrap();
        assert_eq!(
            backend.ledger.pending_total(&alice),
            summary.tokens_collected as u64
        );
        assert_eq!(*backend.scores.lock(), vec![summary.score]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_reports_are_dropped_not_fatal() {
        let backend = Arc::new(RecordingBackend {
            fail_every: 2,
            ..Default::default()
        });
        let (_tx, rx) = mpsc::unbounded_channel();
        let summary = SessionDriver::new(alice_state(), Arc::clone(&backend))
            .with_idle_mode(true)
            .run(rx)
            .await;

        let alice = PlayerId::parse("alice").unwrap();
        let recorded = backend.ledger.pending_total(&alice);
        assert_eq!(summary.failed_reports, summary.tokens_collected / 2);
        assert_eq!(
            recorded + summary.failed_reports as u64,
            summary.tokens_collected as u64
        );
        // Score accumulates locally regardless of report failures
        assert!(summary.score >= summary.tokens_collected as u64 * 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tap_and_stop_commands() {
        let backend = Arc::new(RecordingBackend::default());
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = alice_state();
        state.tuning.track_height = 1.0e9;
        let driver = SessionDriver::new(state, Arc::clone(&backend));

        tx.send(SessionCommand::Start).unwrap();
        let handle = tokio::spawn(driver.run(rx));

        // First spawn lands after one cadence; it sits near the top
        tokio::time::sleep(Duration::from_millis(1000)).await;
        let tuning = crate::tuning::Tuning::default();
        // Sweep the spawn row; every token is somewhere in [0, width) x [spawn_y, ...)
        let mut x = 1.0;
        while x < tuning.track_width {
            for y in [-50.0f32, -10.0, 30.0, 70.0] {
                tx.send(SessionCommand::Tap(Vec2::new(x, y))).unwrap();
            }
            x += tuning.token_size - 1.0;
        }
        tx.send(SessionCommand::Stop).unwrap();

        let summary = handle.await.unwrap();
        assert_eq!(summary.end_reason, Some(EndReason::Stopped));
        assert!(summary.tokens_collected >= 1);
        // Stopped sessions do not submit a score
        assert!(backend.scores.lock().is_empty());
        let alice = PlayerId::parse("alice").unwrap();
        assert_eq!(
            backend.ledger.pending_total(&alice),
            summary.tokens_collected as u64
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_channel_without_start_returns() {
        let backend = Arc::new(RecordingBackend::default());
        let (tx, rx) = mpsc::unbounded_channel::<SessionCommand>();
        drop(tx);
        let summary = SessionDriver::new(alice_state(), backend).run(rx).await;
        assert_eq!(summary.end_reason, None);
        assert_eq!(summary.score, 0);
    }
}
