//! HTTP surface over the ledger, leaderboard, claims and cooldown gate
//!
//! Routes:
//! - `POST /collect` `{user, token_type}`
//! - `GET /pending/{user}`
//! - `POST /clear` `{user}`
//! - `POST /claim` `{user}`
//! - `GET /balances/{user}`
//! - `POST /start-game` `{user}`
//! - `POST /submit-score` `{user, score}`
//! - `GET /leaderboard`

use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{PlayerId, TokenTypeId};
use crate::claim::{Balance, BalanceBook, ClaimReceipt, ClaimSink, claim_all};
use crate::cooldown::SessionGate;
use crate::error::{BackendError, ClaimError, CooldownError, ValidationError};
use crate::leaderboard::{Leaderboard, LeaderboardEntry};
use crate::ledger::{PendingEntry, PendingLedger};
use crate::session::GameBackend;
use crate::settings::ServerSettings;
use crate::unix_millis;

/// Shared server state, injected into every handler
pub struct AppState {
    pub ledger: PendingLedger,
    pub leaderboard: Mutex<Leaderboard>,
    pub balances: Arc<BalanceBook>,
    sink: Arc<dyn ClaimSink>,
    pub gate: SessionGate,
}

impl AppState {
    /// State whose claims credit the in-process balance book
    pub fn new(settings: &ServerSettings) -> Self {
        let balances = Arc::new(BalanceBook::new());
        let sink: Arc<dyn ClaimSink> = balances.clone();
        Self {
            ledger: PendingLedger::new(),
            leaderboard: Mutex::new(Leaderboard::new()),
            balances,
            sink,
            gate: SessionGate::new(settings.cooldown()),
        }
    }

    /// Route claims to an external sink instead of the balance book
    pub fn with_sink(mut self, sink: Arc<dyn ClaimSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Submit a final score stamped with the current time
    pub fn record_score(&self, player: PlayerId, score: u64) -> Option<usize> {
        self.leaderboard.lock().submit(player, score, unix_millis())
    }
}

impl GameBackend for AppState {
    async fn record_collection(
        &self,
        player: &PlayerId,
        token_type: TokenTypeId,
    ) -> Result<(), BackendError> {
        self.ledger.record_collection(player, token_type);
        Ok(())
    }

    async fn submit_score(
        &self,
        player: &PlayerId,
        score: u64,
    ) -> Result<Option<usize>, BackendError> {
        Ok(self.record_score(player.clone(), score))
    }
}

/// Errors surfaced to HTTP clients
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("invalid request body: {0}")]
    Body(#[from] JsonRejection),
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("score must be a non-negative number")]
    InvalidScore,
    #[error(transparent)]
    Cooldown(#[from] CooldownError),
    #[error(transparent)]
    Claim(#[from] ClaimError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_)
            | ApiError::Body(_)
            | ApiError::MissingField(_)
            | ApiError::InvalidScore => StatusCode::BAD_REQUEST,
            ApiError::Cooldown(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Claim(_) => StatusCode::BAD_GATEWAY,
        };
        log::warn!("Request rejected ({status}): {self}");
        (status, self.to_string()).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct CollectRequest {
    pub user: Option<String>,
    pub token_type: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UserRequest {
    pub user: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub user: Option<String>,
    /// Any non-negative JSON number; fractions are truncated
    pub score: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct PendingResponse {
    pub tokens: Vec<PendingEntry>,
}

#[derive(Debug, Serialize)]
pub struct BalancesResponse {
    pub balances: Vec<Balance>,
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub success: bool,
    /// 1-indexed rank, 0 when not on the board
    pub rank: usize,
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub started: bool,
}

fn parse_user(user: Option<String>) -> Result<PlayerId, ApiError> {
    let user = user.ok_or(ApiError::MissingField("user"))?;
    Ok(PlayerId::parse(&user)?)
}

/// Record one collected token. The token type is range-checked only; the
/// client's report is trusted.
async fn collect(
    State(app): State<Arc<AppState>>,
    body: Result<Json<CollectRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(req) = body?;
    let player = parse_user(req.user)?;
    let token_type = req.token_type.ok_or(ApiError::MissingField("token_type"))?;
    let token_type = TokenTypeId::new(token_type)?;
    app.ledger.record_collection(&player, token_type);
    Ok(StatusCode::OK)
}

async fn pending(
    State(app): State<Arc<AppState>>,
    Path(user): Path<String>,
) -> Result<Json<PendingResponse>, ApiError> {
    let player = PlayerId::parse(&user)?;
    let tokens = app.ledger.list_pending(&player);
    log::debug!("Fetching {} pending entries for user {player}", tokens.len());
    Ok(Json(PendingResponse { tokens }))
}

async fn clear(
    State(app): State<Arc<AppState>>,
    body: Result<Json<UserRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(req) = body?;
    let player = parse_user(req.user)?;
    app.ledger.clear(&player);
    Ok(StatusCode::OK)
}

async fn claim(
    State(app): State<Arc<AppState>>,
    body: Result<Json<UserRequest>, JsonRejection>,
) -> Result<Json<ClaimReceipt>, ApiError> {
    let Json(req) = body?;
    let player = parse_user(req.user)?;
    let receipt = claim_all(&app.ledger, app.sink.as_ref(), &player)?;
    Ok(Json(receipt))
}

async fn balances(
    State(app): State<Arc<AppState>>,
    Path(user): Path<String>,
) -> Result<Json<BalancesResponse>, ApiError> {
    let player = PlayerId::parse(&user)?;
    Ok(Json(BalancesResponse {
        balances: app.balances.balances(&player),
    }))
}

async fn start_game(
    State(app): State<Arc<AppState>>,
    body: Result<Json<UserRequest>, JsonRejection>,
) -> Result<Json<StartResponse>, ApiError> {
    let Json(req) = body?;
    let player = parse_user(req.user)?;
    app.gate.try_start(&player, Instant::now())?;
    log::info!("Session start granted for {player}");
    Ok(Json(StartResponse { started: true }))
}

async fn submit_score(
    State(app): State<Arc<AppState>>,
    body: Result<Json<ScoreRequest>, JsonRejection>,
) -> Result<Json<ScoreResponse>, ApiError> {
    let Json(req) = body?;
    let player = parse_user(req.user)?;
    let score = req.score.ok_or(ApiError::MissingField("score"))?;
    if !score.is_finite() || score < 0.0 {
        return Err(ApiError::InvalidScore);
    }
    let rank = app.record_score(player, score as u64);
    Ok(Json(ScoreResponse {
        success: true,
        rank: rank.unwrap_or(0),
    }))
}

async fn leaderboard(State(app): State<Arc<AppState>>) -> Json<Vec<LeaderboardEntry>> {
    Json(app.leaderboard.lock().entries().to_vec())
}

/// Build the router over shared state
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/collect", post(collect))
        .route("/pending/{user}", get(pending))
        .route("/clear", post(clear))
        .route("/claim", post(claim))
        .route("/balances/{user}", get(balances))
        .route("/start-game", post(start_game))
        .route("/submit-score", post(submit_score))
        .route("/leaderboard", get(leaderboard))
        .with_state(state)
}

/// Bind and serve until the process exits
pub async fn serve(settings: &ServerSettings, state: Arc<AppState>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(settings.bind_addr()).await?;
    log::info!("Server running on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await
}
