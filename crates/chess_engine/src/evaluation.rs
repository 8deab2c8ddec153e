//! Material evaluation
//!
//! Scores a position by counting piece values, from White's perspective:
//! positive means White is ahead. There are no positional terms; the engine's
//! playing strength comes entirely from the search.

use shakmaty::{Board, Color};

use crate::constants::{role_value, MATERIAL_ROLES};
use crate::position::Position;

/// Static evaluation of a position.
pub fn evaluate(position: &Position) -> i32 {
    material_balance(position.board())
}

/// Sum over piece types of (White count - Black count) x value.
pub fn material_balance(board: &Board) -> i32 {
    MATERIAL_ROLES
        .iter()
        .map(|&role| {
            let of_role = board.by_role(role);
            let white = (of_role & board.by_color(Color::White)).count() as i32;
            let black = (of_role & board.by_color(Color::Black)).count() as i32;
            (white - black) * role_value(role)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{PAWN_VALUE, QUEEN_VALUE};

    fn eval_fen(fen: &str) -> i32 {
        evaluate(&Position::from_fen(fen).expect("valid test position"))
    }

    /// Mirror a position top to bottom and swap piece colors.
    ///
    /// Test positions carry no castling rights or en-passant square, so only
    /// placement and side to move need rewriting.
    fn mirror_fen(fen: &str) -> String {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        let placement = fields[0]
            .split('/')
            .rev()
            .map(|rank| {
                rank.chars()
                    .map(|c| {
                        if c.is_ascii_uppercase() {
                            c.to_ascii_lowercase()
                        } else {
                            c.to_ascii_uppercase()
                        }
                    })
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("/");
        let turn = if fields[1] == "w" { "b" } else { "w" };
        format!("{placement} {turn} - - 0 1")
    }

    #[test]
    fn test_starting_position_material_balance() {
        assert_eq!(evaluate(&Position::new()), 0);
    }

    #[test]
    fn test_white_up_queen() {
        let score = eval_fen("rnb1kbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        assert_eq!(score, QUEEN_VALUE);
    }

    #[test]
    fn test_black_up_pawn() {
        let score = eval_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPP1PPP/RNBQKBNR w KQkq - 0 1");
        assert_eq!(score, -PAWN_VALUE);
    }

    #[test]
    fn test_kings_carry_no_value() {
        assert_eq!(eval_fen("8/8/4k3/8/8/4K3/8/8 w - - 0 1"), 0);
    }

    #[test]
    fn test_mixed_material() {
        // White: R + B + 2P = 10, Black: N + 3P = 6
        let score = eval_fen("4k3/ppp5/2n5/8/8/8/PP6/R1B1K3 w - - 0 1");
        assert_eq!(score, 4);
    }

    #[test]
    fn test_mirroring_colors_negates_score() {
        for fen in [
            "rnb1kbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w - - 0 1",
            "4k3/ppp5/2n5/8/8/8/PP6/R1B1K3 w - - 0 1",
            "r5k1/5ppp/8/8/3Q4/8/5PPP/6K1 b - - 0 1",
            "8/8/4k3/8/8/4K3/8/8 w - - 0 1",
        ] {
            let mirrored = mirror_fen(fen);
            assert_eq!(eval_fen(&mirrored), -eval_fen(fen), "{fen} vs {mirrored}");
        }
    }
}
