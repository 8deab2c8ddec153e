//! Alpha-beta search over an explicit stack of frames
//!
//! Each frame stands for one node of the game tree and owns the position at
//! that node. Descending into a child pushes a frame built from a fresh
//! successor position; finishing a node pops its frame and hands the score to
//! the parent. Depth is bounded by the caller, but the explicit stack keeps
//! the cost of a deep search on the heap rather than the thread stack.

use shakmaty::Move;

use super::{SearchResult, SearchStats};
use crate::constants::SCORE_INF;
use crate::evaluation::evaluate;
use crate::position::Position;

/// One interior node of the game tree
struct SearchFrame {
    position: Position,
    depth: u8,
    alpha: i32,
    beta: i32,
    maximizing: bool,
    moves: Vec<Move>,
    move_index: usize,
    best_score: i32,
    best_move: Option<Move>,
}

impl SearchFrame {
    /// Next child to explore, or `None` once all moves are done or the
    /// window has closed.
    fn next_child(&mut self) -> Option<Position> {
        if self.alpha >= self.beta || self.move_index >= self.moves.len() {
            return None;
        }
        let child = self.position.play_legal(&self.moves[self.move_index]);
        self.move_index += 1;
        Some(child)
    }

    /// Fold the score of the child just searched into this node.
    fn absorb(&mut self, score: i32, stats: &mut SearchStats) {
        let searched = self.move_index - 1;

        if self.maximizing {
            if score > self.best_score {
                self.best_score = score;
                self.best_move = Some(self.moves[searched].clone());
            }
            self.alpha = self.alpha.max(score);
        } else {
            if score < self.best_score {
                self.best_score = score;
                self.best_move = Some(self.moves[searched].clone());
            }
            self.beta = self.beta.min(score);
        }

        if self.alpha >= self.beta && self.move_index < self.moves.len() {
            stats.cutoffs += 1;
        }
    }
}

/// Result of entering a node: either it is scored on the spot or it needs
/// its children searched.
enum Visit {
    Leaf(i32),
    Interior(SearchFrame),
}

fn visit(
    position: Position,
    depth: u8,
    alpha: i32,
    beta: i32,
    maximizing: bool,
    stats: &mut SearchStats,
) -> Visit {
    stats.nodes += 1;

    if depth == 0 {
        stats.leaves += 1;
        return Visit::Leaf(evaluate(&position));
    }

    let moves = position.legal_moves();
    if moves.is_empty() || position.is_rule_draw() {
        stats.leaves += 1;
        return Visit::Leaf(evaluate(&position));
    }

    Visit::Interior(SearchFrame {
        position,
        depth,
        alpha,
        beta,
        maximizing,
        moves,
        move_index: 0,
        best_score: if maximizing { -SCORE_INF } else { SCORE_INF },
        best_move: None,
    })
}

/// Minimax with alpha-beta pruning.
///
/// `maximizing_for_white` must name the side to move at `root`; the flag
/// alternates on every ply below. Moves are tried in canonical order and a
/// later move replaces the current best only on a strict improvement, so ties
/// go to the first move seen. A `depth` of zero scores the root statically
/// and returns no move.
pub fn alphabeta(root: &Position, depth: u8, maximizing_for_white: bool) -> SearchResult {
    let mut stats = SearchStats::default();

    let root_frame = match visit(
        root.clone(),
        depth,
        -SCORE_INF,
        SCORE_INF,
        maximizing_for_white,
        &mut stats,
    ) {
        Visit::Leaf(score) => {
            return SearchResult {
                best_move: None,
                score,
                stats,
            }
        }
        Visit::Interior(frame) => frame,
    };

    let mut stack = vec![root_frame];
    let mut child_score: Option<i32> = None;
    let mut finished: Option<SearchFrame> = None;

    while let Some(frame) = stack.last_mut() {
        if let Some(score) = child_score.take() {
            frame.absorb(score, &mut stats);
        }

        if let Some(child) = frame.next_child() {
            let (depth, alpha, beta, maximizing) =
                (frame.depth - 1, frame.alpha, frame.beta, !frame.maximizing);
            match visit(child, depth, alpha, beta, maximizing, &mut stats) {
                Visit::Leaf(score) => child_score = Some(score),
                Visit::Interior(child_frame) => stack.push(child_frame),
            }
            continue;
        }

        // Node exhausted or cut off: report to the parent
        finished = stack.pop();
        child_score = finished.as_ref().map(|done| done.best_score);
    }

    // The root frame is always the last one popped
    match finished {
        Some(root_frame) => SearchResult {
            best_move: root_frame.best_move,
            score: root_frame.best_score,
            stats,
        },
        None => SearchResult {
            best_move: None,
            score: evaluate(root),
            stats,
        },
    }
}
