//! Depth-bounded minimax search with alpha-beta pruning
//!
//! The search works on [`Position`] snapshots: every node owns the position it
//! evaluates, produced by [`Position::play`]-style successor construction, so
//! no branch ever observes another branch's moves.
//!
//! ## Module Organization
//!
//! - `alphabeta` - the pruned search used to pick engine moves
//! - `minimax` - exhaustive reference search with the same move order and
//!   tie-break, used to verify that pruning never changes a decision

mod alphabeta;
mod minimax;

pub use alphabeta::alphabeta;
pub use minimax::minimax;

use shakmaty::{Color, Move};
use tracing::debug;

use crate::constants::MAX_SEARCH_DEPTH;
use crate::move_gen::to_uci;
use crate::position::Position;

/// Node counters collected during a search. Informational only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Positions visited, root included
    pub nodes: u64,
    /// Positions scored statically (depth exhausted or game over)
    pub leaves: u64,
    /// Times the remaining siblings of a node were skipped
    pub cutoffs: u64,
}

/// Outcome of a search: the chosen move (if any) and its minimax score from
/// White's perspective.
///
/// `best_move` is `None` only when the root itself was scored statically,
/// i.e. the root position is terminal or the search depth was zero. That is
/// "no move available", not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub best_move: Option<Move>,
    pub score: i32,
    pub stats: SearchStats,
}

impl SearchResult {
    /// Chosen move in square-pair notation
    pub fn best_move_uci(&self) -> Option<String> {
        self.best_move.as_ref().map(to_uci)
    }
}

/// Clamp a requested depth into `[1, max]`, where `max` itself never exceeds
/// [`MAX_SEARCH_DEPTH`].
pub fn clamp_depth(requested: u8, max: u8) -> u8 {
    let ceiling = max.clamp(1, MAX_SEARCH_DEPTH);
    requested.clamp(1, ceiling)
}

/// Pick a move for the side to move.
///
/// Depth is clamped into `[1, MAX_SEARCH_DEPTH]` and the maximizing side is
/// taken from the position, so callers cannot search for the wrong color.
pub fn find_best_move(position: &Position, depth: u8) -> SearchResult {
    let depth = clamp_depth(depth, MAX_SEARCH_DEPTH);
    let result = alphabeta(position, depth, position.turn() == Color::White);

    debug!(
        depth,
        score = result.score,
        best_move = result.best_move_uci().as_deref().unwrap_or("none"),
        nodes = result.stats.nodes,
        cutoffs = result.stats.cutoffs,
        "search finished"
    );

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(fen: &str) -> Position {
        Position::from_fen(fen).expect("valid test position")
    }

    /// Positions used to compare pruned and exhaustive search
    const EQUIVALENCE_POSITIONS: [(&str, u8); 5] = [
        ("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1", 3),
        ("r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5Q2/PPPP1PPP/RNB1K1NR w KQkq - 2 3", 3),
        ("4k3/8/8/3q4/8/8/3R4/4K3 w - - 0 1", 4),
        ("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1", 2),
        ("6k1/5ppp/8/8/8/8/r4PPP/1R4K1 b - - 0 1", 3),
    ];

    #[test]
    fn test_depth_one_from_start_scores_zero() {
        let result = find_best_move(&Position::new(), 1);
        assert_eq!(result.score, 0);
        // Every reply keeps material level, so the first move in canonical
        // order wins the tie
        assert_eq!(result.best_move_uci().as_deref(), Some("b1a3"));
    }

    #[test]
    fn test_search_is_deterministic() {
        let root = position(EQUIVALENCE_POSITIONS[1].0);
        let first = find_best_move(&root, 2);
        for _ in 0..3 {
            assert_eq!(find_best_move(&root, 2), first);
        }
    }

    #[test]
    fn test_alphabeta_matches_exhaustive_minimax() {
        for (fen, max_depth) in EQUIVALENCE_POSITIONS {
            let root = position(fen);
            let maximizing = root.turn() == Color::White;
            for depth in 1..=max_depth {
                let pruned = alphabeta(&root, depth, maximizing);
                let full = minimax(&root, depth, maximizing);
                assert_eq!(pruned.best_move, full.best_move, "{fen} at depth {depth}");
                assert_eq!(pruned.score, full.score, "{fen} at depth {depth}");
                assert!(pruned.stats.nodes <= full.stats.nodes);
            }
        }
    }

    #[test]
    fn test_pruning_actually_prunes() {
        let root = Position::new();
        let pruned = alphabeta(&root, 3, true);
        let full = minimax(&root, 3, true);
        assert!(pruned.stats.cutoffs > 0);
        assert!(pruned.stats.nodes < full.stats.nodes);
        assert_eq!(full.stats.cutoffs, 0);
    }

    #[test]
    fn test_white_captures_hanging_queen() {
        let result = find_best_move(&position("4k3/8/8/3q4/8/8/3R4/4K3 w - - 0 1"), 1);
        assert_eq!(result.best_move_uci().as_deref(), Some("d2d5"));
        assert_eq!(result.score, 5);
    }

    #[test]
    fn test_black_minimizes_when_to_move() {
        let result = find_best_move(&position("4k3/8/8/3Q4/8/8/3r4/4K3 b - - 0 1"), 1);
        assert_eq!(result.best_move_uci().as_deref(), Some("d2d5"));
        assert_eq!(result.score, -5);
    }

    #[test]
    fn test_depth_two_avoids_losing_the_rook() {
        // Rxa7 grabs a pawn but the rook is then taken by the king on b8
        let root = position("1k6/p7/8/8/8/8/8/R5K1 w - - 0 1");
        let shallow = find_best_move(&root, 1);
        assert_eq!(shallow.best_move_uci().as_deref(), Some("a1a7"));
        let deeper = find_best_move(&root, 2);
        assert_ne!(deeper.best_move_uci().as_deref(), Some("a1a7"));
        assert_eq!(deeper.score, 4);
    }

    #[test]
    fn test_depth_zero_is_static_evaluation() {
        let result = alphabeta(&position("4k3/8/8/3q4/8/8/3R4/4K3 w - - 0 1"), 0, true);
        assert_eq!(result.best_move, None);
        assert_eq!(result.score, -4);
    }

    #[test]
    fn test_terminal_root_has_no_move() {
        // Fool's mate, White to move and mated
        let mated = position("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3");
        let result = find_best_move(&mated, 3);
        assert_eq!(result.best_move, None);
        assert_eq!(result.score, 0);
        assert_eq!(result.stats.nodes, 1);
    }

    #[test]
    fn test_clamp_depth_bounds() {
        assert_eq!(clamp_depth(0, 10), 1);
        assert_eq!(clamp_depth(3, 10), 3);
        assert_eq!(clamp_depth(42, 10), 10);
        assert_eq!(clamp_depth(8, 5), 5);
        assert_eq!(clamp_depth(12, 200), MAX_SEARCH_DEPTH);
    }

    #[test]
    fn test_find_best_move_clamps_zero_depth_up() {
        let result = find_best_move(&Position::new(), 0);
        assert!(result.best_move.is_some());
    }
}
