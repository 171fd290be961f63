//! Token Rain server entry point
//!
//! Loads settings and tuning, then serves the HTTP API. `token-rain demo`
//! additionally runs one idle-bot session against the same state.

use std::sync::Arc;

use token_rain::catalog::{Catalog, PlayerId};
use token_rain::server::{self, AppState};
use token_rain::session::SessionDriver;
use token_rain::sim::GameState;
use token_rain::{ServerSettings, Tuning};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();
    log::info!("Token Rain server starting...");

    let settings = ServerSettings::load();
    let tuning = Tuning::load_or_default(settings.tuning_path.as_deref());
    log::info!(
        "Track {}x{}, quota {} per level, {} levels",
        tuning.track_width,
        tuning.track_height,
        tuning.level_quota,
        tuning.max_level
    );

    let state = Arc::new(AppState::new(&settings));

    if std::env::args().nth(1).as_deref() == Some("demo") {
        spawn_demo(Arc::clone(&state), tuning);
    }

    server::serve(&settings, state).await
}

/// Run one idle session in the background, feeding the live ledger
fn spawn_demo(state: Arc<AppState>, tuning: Tuning) {
    let Ok(player) = PlayerId::parse("demo-bot") else {
        return;
    };
    let seed = token_rain::unix_millis();
    log::info!("Demo session with seed: {seed}");
    let game = GameState::new(player, seed, tuning, Catalog::standard());
    let (commands, rx) = tokio::sync::mpsc::unbounded_channel();
    tokio::spawn(async move {
        let summary = SessionDriver::new(game, state).with_idle_mode(true).run(rx).await;
        drop(commands);
        log::info!(
            "Demo finished at level {} with score {} ({} tokens)",
            summary.level,
            summary.score,
            summary.tokens_collected
        );
    });
}
