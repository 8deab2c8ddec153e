//! Legal move enumeration in a pinned order, plus square-pair notation
//!
//! `shakmaty` generates moves grouped by piece type. That order is stable but
//! it is a detail of the library, and the search resolves ties to the first
//! move it sees. The order is therefore pinned here: ascending by from-square,
//! then to-square, then promotion role, with "no promotion" first. Squares
//! are indexed a1 = 0 through h8 = 63.

use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Move, Position as _, Role};

use crate::error::{ChessEngineError, ChessEngineResult};

/// Sort key for the canonical move order.
pub type MoveOrderKey = (u32, u32, Option<Role>);

/// Canonical ordering key of a move.
///
/// Castling is keyed by the king's two-square step (`e1g1`), not by the
/// king-takes-rook encoding `shakmaty` uses internally.
pub fn move_order_key(mv: &Move) -> MoveOrderKey {
    match mv.to_uci(CastlingMode::Standard) {
        UciMove::Normal {
            from,
            to,
            promotion,
        } => (u32::from(from), u32::from(to), promotion),
        // Drops and null moves do not occur in standard chess
        _ => (u32::MAX, u32::MAX, None),
    }
}

/// All legal moves of `chess`, in canonical order.
pub fn ordered_legal_moves(chess: &Chess) -> Vec<Move> {
    let mut moves: Vec<Move> = chess.legal_moves().into_iter().collect();
    moves.sort_by_cached_key(move_order_key);
    moves
}

/// Square-pair notation of a move, e.g. `e2e4` or `e7e8q`.
pub fn to_uci(mv: &Move) -> String {
    mv.to_uci(CastlingMode::Standard).to_string()
}

/// Parse a four or five character square-pair string.
///
/// Only plain board moves are accepted: null moves (`0000`) and piece drops
/// are rejected as syntax errors.
pub fn parse_uci(input: &str) -> ChessEngineResult<UciMove> {
    let syntax_error = || ChessEngineError::InvalidMoveSyntax {
        input: input.to_string(),
    };

    let trimmed = input.trim();
    if !(4..=5).contains(&trimmed.len()) {
        return Err(syntax_error());
    }

    match trimmed.parse::<UciMove>() {
        Ok(uci @ UciMove::Normal { .. }) => Ok(uci),
        _ => Err(syntax_error()),
    }
}

/// Resolve a parsed square pair against a position.
pub fn resolve_uci(chess: &Chess, uci: &UciMove) -> ChessEngineResult<Move> {
    uci.to_move(chess)
        .map_err(|_| ChessEngineError::IllegalMove {
            uci: uci.to_string(),
        })
}
