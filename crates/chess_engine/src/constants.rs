//! # Evaluation Values & Search Limits
//!
//! Material is counted in whole pawns: the evaluator is deliberately
//! material-only, so there is no need for centipawn resolution.
//!
//! | Piece  | Value |
//! |--------|-------|
//! | Pawn   | 1     |
//! | Knight | 3     |
//! | Bishop | 3     |
//! | Rook   | 5     |
//! | Queen  | 9     |
//! | King   | 0     |
//!
//! The king carries no material value. Mate is a structural property of the
//! game tree (a terminal node), not something the evaluator scores.

use shakmaty::Role;

pub const PAWN_VALUE: i32 = 1;
pub const KNIGHT_VALUE: i32 = 3;
pub const BISHOP_VALUE: i32 = 3;
pub const ROOK_VALUE: i32 = 5;
pub const QUEEN_VALUE: i32 = 9;
pub const KING_VALUE: i32 = 0;

/// Roles that contribute to the material balance, in evaluation order.
pub const MATERIAL_ROLES: [Role; 5] = [
    Role::Pawn,
    Role::Knight,
    Role::Bishop,
    Role::Rook,
    Role::Queen,
];

/// Material value of a single piece of the given role.
pub const fn role_value(role: Role) -> i32 {
    match role {
        Role::Pawn => PAWN_VALUE,
        Role::Knight => KNIGHT_VALUE,
        Role::Bishop => BISHOP_VALUE,
        Role::Rook => ROOK_VALUE,
        Role::Queen => QUEEN_VALUE,
        Role::King => KING_VALUE,
    }
}

/// Hard ceiling on search depth.
///
/// The game tree grows roughly as 35^depth before pruning, so anything above
/// this would never return in a request/response setting.
pub const MAX_SEARCH_DEPTH: u8 = 10;

/// Depth used when a caller does not ask for one.
pub const DEFAULT_SEARCH_DEPTH: u8 = 3;

/// Alpha-beta window bound. Symmetric so `-SCORE_INF` never overflows.
pub const SCORE_INF: i32 = i32::MAX;

/// Half-move clock value at which the game is drawn without a claim.
pub const SEVENTY_FIVE_MOVE_HALFMOVES: u32 = 150;

/// Occurrences of the same position that draw the game without a claim.
pub const FIVEFOLD_REPETITION: usize = 5;
