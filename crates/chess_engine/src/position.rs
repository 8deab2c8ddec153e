//! Position model and rules adapter
//!
//! [`Position`] is the only view the rest of the system has of the rules
//! library. It is a value type: [`Position::play`] borrows the receiver and
//! returns a fresh successor, so a position can be handed to a search, cloned
//! into sibling branches, or stored in a session without any aliasing
//! concerns.
//!
//! Legality, check, castling, en passant and the draw rules all come from
//! `shakmaty`; this module only decides which of them count as "terminal" and
//! how they map to a game outcome.

use std::fmt;
use std::str::FromStr;

use shakmaty::fen::Fen;
use shakmaty::{Board, CastlingMode, Chess, Color, EnPassantMode, Move, Position as _, PositionError};

use crate::constants::{FIVEFOLD_REPETITION, SEVENTY_FIVE_MOVE_HALFMOVES};
use crate::error::{ChessEngineError, ChessEngineResult};
use crate::move_gen::{ordered_legal_moves, parse_uci, resolve_uci, to_uci};

/// Full chess position: placement, side to move, castling rights,
/// en-passant target and move counters.
#[derive(Debug, Clone, Default)]
pub struct Position {
    chess: Chess,
}

impl Position {
    /// Standard starting position
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a Forsyth-Edwards string.
    ///
    /// Setups the rules library considers impossible (no king, two kings of a
    /// color, the side not to move in check, pawns on the back rank, ...) are
    /// rejected. Castling rights and en-passant targets that do not fit the
    /// placement are dropped instead of failing the whole position.
    pub fn from_fen(fen: &str) -> ChessEngineResult<Self> {
        let invalid = |reason: String| ChessEngineError::InvalidPosition {
            fen: fen.to_string(),
            reason,
        };

        let parsed: Fen = fen.trim().parse().map_err(|e| invalid(format!("{e}")))?;
        let chess: Chess = parsed
            .into_position(CastlingMode::Standard)
            .or_else(PositionError::ignore_invalid_castling_rights)
            .or_else(PositionError::ignore_invalid_ep_square)
            .map_err(|e| invalid(format!("{e}")))?;

        Ok(Self { chess })
    }

    /// Forsyth-Edwards string, writing an en-passant square only when the
    /// capture is actually legal.
    pub fn fen(&self) -> String {
        Fen::from_position(self.chess.clone(), EnPassantMode::Legal).to_string()
    }

    /// Identity of the position for repetition counting: placement, side to
    /// move, castling rights and en-passant square. Move counters are
    /// excluded.
    pub fn repetition_key(&self) -> String {
        self.fen()
            .split_whitespace()
            .take(4)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn turn(&self) -> Color {
        self.chess.turn()
    }

    pub fn halfmoves(&self) -> u32 {
        self.chess.halfmoves()
    }

    pub fn fullmoves(&self) -> u32 {
        self.chess.fullmoves().get()
    }

    pub fn board(&self) -> &Board {
        self.chess.board()
    }

    pub fn is_check(&self) -> bool {
        self.chess.is_check()
    }

    /// Legal moves in canonical order (see [`crate::move_gen`]).
    pub fn legal_moves(&self) -> Vec<Move> {
        ordered_legal_moves(&self.chess)
    }

    /// Turn a square-pair string into a legal move of this position.
    ///
    /// Malformed input is [`ChessEngineError::InvalidMoveSyntax`]; a
    /// well-formed pair that is not legal here is
    /// [`ChessEngineError::IllegalMove`].
    pub fn parse_move(&self, input: &str) -> ChessEngineResult<Move> {
        let uci = parse_uci(input)?;
        resolve_uci(&self.chess, &uci)
    }

    /// Successor position after `mv`.
    ///
    /// Fails with [`ChessEngineError::IllegalMove`] unless `mv` is a member of
    /// the current legal-move set. `self` is never modified.
    pub fn play(&self, mv: &Move) -> ChessEngineResult<Position> {
        if !self.chess.is_legal(mv) {
            return Err(ChessEngineError::IllegalMove { uci: to_uci(mv) });
        }
        Ok(self.play_legal(mv))
    }

    /// Successor after a move already known to be legal here.
    ///
    /// Used by the search, which only ever plays moves taken from
    /// [`Position::legal_moves`] of the same position.
    pub(crate) fn play_legal(&self, mv: &Move) -> Position {
        let mut chess = self.chess.clone();
        chess.play_unchecked(mv);
        Position { chess }
    }

    /// Termination classification of this position in isolation.
    ///
    /// Repetition needs the line of play and is layered on by the caller via
    /// [`GameStatus::with_repetitions`].
    pub fn status(&self) -> GameStatus {
        if self.chess.is_checkmate() {
            GameStatus::Checkmate {
                winner: !self.chess.turn(),
            }
        } else if self.chess.is_stalemate() {
            GameStatus::Stalemate
        } else if self.chess.is_insufficient_material() {
            GameStatus::InsufficientMaterial
        } else if self.chess.halfmoves() >= SEVENTY_FIVE_MOVE_HALFMOVES {
            GameStatus::SeventyFiveMoveRule
        } else {
            GameStatus::InProgress
        }
    }

    /// Drawn by a rule that does not depend on the legal-move set:
    /// insufficient material or the seventy-five-move rule.
    ///
    /// Together with "no legal moves" this is equivalent to
    /// [`Position::is_terminal`], which lets the search reuse the move list it
    /// already generated.
    pub fn is_rule_draw(&self) -> bool {
        self.chess.is_insufficient_material()
            || self.chess.halfmoves() >= SEVENTY_FIVE_MOVE_HALFMOVES
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }
}

impl FromStr for Position {
    type Err = ChessEngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Position::from_fen(s)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fen())
    }
}

/// Why a game is, or is not, over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    InProgress,
    Checkmate { winner: Color },
    Stalemate,
    InsufficientMaterial,
    SeventyFiveMoveRule,
    FivefoldRepetition,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        self != GameStatus::InProgress
    }

    /// Fold in how often the current position has occurred in the game.
    ///
    /// A rule-based ending already reached takes precedence over repetition.
    pub fn with_repetitions(self, occurrences: usize) -> GameStatus {
        if self == GameStatus::InProgress && occurrences >= FIVEFOLD_REPETITION {
            GameStatus::FivefoldRepetition
        } else {
            self
        }
    }

    pub fn outcome(self) -> GameOutcome {
        match self {
            GameStatus::InProgress => GameOutcome::InProgress,
            GameStatus::Checkmate {
                winner: Color::White,
            } => GameOutcome::White,
            GameStatus::Checkmate {
                winner: Color::Black,
            } => GameOutcome::Black,
            GameStatus::Stalemate
            | GameStatus::InsufficientMaterial
            | GameStatus::SeventyFiveMoveRule
            | GameStatus::FivefoldRepetition => GameOutcome::Draw,
        }
    }
}

/// Result of a game as reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameOutcome {
    White,
    Black,
    Draw,
    InProgress,
}

impl GameOutcome {
    /// Wire spelling: `white`, `black`, `draw` or `*`.
    pub fn as_str(self) -> &'static str {
        match self {
            GameOutcome::White => "white",
            GameOutcome::Black => "black",
            GameOutcome::Draw => "draw",
            GameOutcome::InProgress => "*",
        }
    }

    pub fn is_decided(self) -> bool {
        self != GameOutcome::InProgress
    }
}

impl fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "white" => Ok(GameOutcome::White),
            "black" => Ok(GameOutcome::Black),
            "draw" => Ok(GameOutcome::Draw),
            "*" => Ok(GameOutcome::InProgress),
            other => Err(format!("unknown outcome '{other}'")),
        }
    }
}
