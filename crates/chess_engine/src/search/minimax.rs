//! Exhaustive minimax without pruning
//!
//! Same move order, same strict-improvement tie-break and same leaf rule as
//! [`super::alphabeta`]. It visits every node, so it is only practical at
//! shallow depths; it exists to check that pruning never changes a decision.

use shakmaty::Move;

use super::{SearchResult, SearchStats};
use crate::constants::SCORE_INF;
use crate::evaluation::evaluate;
use crate::position::Position;

pub fn minimax(root: &Position, depth: u8, maximizing_for_white: bool) -> SearchResult {
    let mut stats = SearchStats::default();
    let (best_move, score) = minimax_node(root, depth, maximizing_for_white, &mut stats);
    SearchResult {
        best_move,
        score,
        stats,
    }
}

fn minimax_node(
    position: &Position,
    depth: u8,
    maximizing: bool,
    stats: &mut SearchStats,
) -> (Option<Move>, i32) {
    stats.nodes += 1;

    if depth == 0 {
        stats.leaves += 1;
        return (None, evaluate(position));
    }

    let moves = position.legal_moves();
    if moves.is_empty() || position.is_rule_draw() {
        stats.leaves += 1;
        return (None, evaluate(position));
    }

    let mut best_move = None;
    let mut best_score = if maximizing { -SCORE_INF } else { SCORE_INF };

    for mv in moves {
        let child = position.play_legal(&mv);
        let (_, score) = minimax_node(&child, depth - 1, !maximizing, stats);
        let improves = if maximizing {
            score > best_score
        } else {
            score < best_score
        };
        if improves {
            best_score = score;
            best_move = Some(mv);
        }
    }

    (best_move, best_score)
}
