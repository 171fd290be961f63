//! Error types shared across the engine, ledger and server
//!
//! Nothing here is fatal: validation errors are returned to the caller,
//! config errors fall back to defaults, backend errors are logged and dropped.

use std::time::Duration;

use thiserror::Error;

use crate::consts::MAX_TOKEN_TYPE;

/// Rejected input at the ledger boundary. Never mutates state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("player id must not be empty")]
    EmptyPlayer,
    #[error("token type {0} outside 1..={MAX_TOKEN_TYPE}")]
    TokenTypeOutOfRange(i64),
}

/// Failure loading tuning or server settings
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("catalog must contain at least one token type")]
    EmptyCatalog,
    #[error("duplicate token type {0} in catalog")]
    DuplicateTokenType(u8),
    #[error("invalid tuning: {0}")]
    InvalidTuning(&'static str),
}

/// Claim hand-off failure. The ledger is left intact.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimError {
    #[error("claim sink rejected batch: {0}")]
    Sink(String),
}

/// Session start refused by the cooldown gate
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CooldownError {
    #[error("cooldown active, next session in {}s", remaining.as_secs())]
    Active { remaining: Duration },
}

/// Transport failure reporting to a game backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}
