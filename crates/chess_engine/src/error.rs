//! Error types for chess engine
//!
//! The search itself cannot fail; these errors come from the rules adapter
//! when a caller hands it a malformed position or move.

use thiserror::Error;

/// Errors that can occur in the chess engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChessEngineError {
    /// Forsyth-Edwards string could not be parsed or describes an
    /// impossible setup
    #[error("Invalid position '{fen}': {reason}")]
    InvalidPosition { fen: String, reason: String },

    /// Move string is not a four or five character square pair
    #[error("Invalid move syntax: '{input}'")]
    InvalidMoveSyntax { input: String },

    /// Well-formed move that is not legal in the current position
    #[error("Illegal move: {uci}")]
    IllegalMove { uci: String },
}

/// Result type alias for chess engine operations
pub type ChessEngineResult<T> = Result<T, ChessEngineError>;
