//! Shared error types for the services crate.

use thiserror::Error;

use rush_core::model::QuestionError;
use rush_core::session::RushError;
use storage::repository::StorageError;

/// Errors emitted by `ApiClient`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by question suppliers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SupplyError {
    #[error("question supply failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("malformed question payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by score sinks.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SubmitError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("score submission unavailable: {0}")]
    Unavailable(String),
}

/// Errors that abort the controller loop.
///
/// Collaborator failures (supply, sink, ledger) never abort a session; they
/// are logged and surfaced as updates instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ControllerError {
    #[error(transparent)]
    Rush(#[from] RushError),
}
