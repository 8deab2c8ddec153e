//! Error types for the session layer
//!
//! Every variant is a recoverable, caller-facing condition. The HTTP layer
//! turns them into structured JSON bodies; none of them is retried here.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chess_engine::ChessEngineError;
use serde::Serialize;

use crate::session::Side;
use crate::store::StoreError;

/// Errors that can occur while managing game sessions
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Malformed mode, color, depth, position or move syntax
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A session with this id already exists
    #[error("Game already in progress: {game_id}")]
    DuplicateSession { game_id: String },

    /// No session with this id
    #[error("Game not found: {game_id}")]
    SessionNotFound { game_id: String },

    /// The game is over; no more moves are accepted
    #[error("Game has ended: {game_id}")]
    SessionEnded { game_id: String },

    /// The caller is not the side to move
    #[error("Not your turn: {to_move} is to move")]
    NotYourTurn { to_move: Side },

    /// Well-formed move rejected by the rules
    #[error("Illegal move: {uci}")]
    IllegalMove { uci: String },

    /// The engine was asked to move in a position without legal moves
    #[error("No legal move available in game {game_id}")]
    NoLegalMove { game_id: String },

    /// Session store failure
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// Search task failed to complete
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;

impl From<ChessEngineError> for SessionError {
    fn from(err: ChessEngineError) -> Self {
        match err {
            ChessEngineError::IllegalMove { uci } => SessionError::IllegalMove { uci },
            other => SessionError::InvalidParameter(other.to_string()),
        }
    }
}

impl SessionError {
    /// Stable machine-readable name of the error kind
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::InvalidParameter(_) => "invalid_parameter",
            SessionError::DuplicateSession { .. } => "duplicate_session",
            SessionError::SessionNotFound { .. } => "session_not_found",
            SessionError::SessionEnded { .. } => "session_ended",
            SessionError::NotYourTurn { .. } => "not_your_turn",
            SessionError::IllegalMove { .. } => "illegal_move",
            SessionError::NoLegalMove { .. } => "no_legal_move",
            SessionError::Storage(_) => "storage",
            SessionError::Internal(_) => "internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            SessionError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            SessionError::SessionNotFound { .. } => StatusCode::NOT_FOUND,
            SessionError::DuplicateSession { .. }
            | SessionError::SessionEnded { .. }
            | SessionError::NotYourTurn { .. }
            | SessionError::NoLegalMove { .. } => StatusCode::CONFLICT,
            SessionError::IllegalMove { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            SessionError::Storage(_) | SessionError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, code = self.code(), "request rejected");
        }

        let body = ErrorBody {
            error: self.to_string(),
            code: self.code(),
        };
        (status, Json(body)).into_response()
    }
}
