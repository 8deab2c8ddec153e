//! Game session record
//!
//! A [`GameSession`] is everything the server remembers about one game. The
//! manager loads it from the store, mutates it while holding the game's lock,
//! and writes it back; nothing else keeps a position across requests.

use std::fmt;
use std::str::FromStr;

use chess_engine::move_gen::to_uci;
use chess_engine::{ChessEngineResult, Color, GameOutcome, GameStatus, Move, Position};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Who plays the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// One human against the built-in engine
    Ai,
    /// Two humans sharing the session
    Player,
}

impl GameMode {
    pub fn as_str(self) -> &'static str {
        match self {
            GameMode::Ai => "ai",
            GameMode::Player => "player",
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameMode {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ai" => Ok(GameMode::Ai),
            "player" => Ok(GameMode::Player),
            other => Err(SessionError::InvalidParameter(format!(
                "invalid game type '{other}', expected 'ai' or 'player'"
            ))),
        }
    }
}

/// A color as spelled on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::White => "white",
            Side::Black => "black",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "white" => Ok(Side::White),
            "black" => Ok(Side::Black),
            other => Err(SessionError::InvalidParameter(format!(
                "invalid color '{other}', expected 'white' or 'black'"
            ))),
        }
    }
}

impl From<Color> for Side {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }
}

impl From<Side> for Color {
    fn from(side: Side) -> Self {
        match side {
            Side::White => Color::White,
            Side::Black => Color::Black,
        }
    }
}

/// Optional display names for the two seats
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Players {
    pub white: Option<String>,
    pub black: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GameSession {
    pub id: String,
    pub mode: GameMode,
    /// Seat of the human in `ai` games, `None` in `player` games
    pub human_color: Option<Side>,
    /// Seat of the engine in `ai` games, `None` in `player` games
    pub engine_color: Option<Side>,
    /// Default search depth for engine moves
    pub depth: u8,
    pub position: Position,
    pub start_fen: String,
    /// Moves played so far, in square-pair notation
    pub moves: Vec<String>,
    /// Repetition key of every position reached, the start included
    pub history: Vec<String>,
    pub outcome: GameOutcome,
    pub players: Players,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GameSession {
    /// Fresh session at `position`.
    ///
    /// A starting position that is already over (a custom stalemate, say)
    /// produces a session that is ended from the outset.
    pub fn new(
        id: String,
        mode: GameMode,
        human_color: Option<Side>,
        depth: u8,
        position: Position,
        players: Players,
    ) -> Self {
        let now = Utc::now();
        let engine_color = match mode {
            GameMode::Ai => human_color.map(Side::opposite),
            GameMode::Player => None,
        };
        let human_color = match mode {
            GameMode::Ai => human_color,
            GameMode::Player => None,
        };

        let mut session = GameSession {
            id,
            mode,
            human_color,
            engine_color,
            depth,
            start_fen: position.fen(),
            history: vec![position.repetition_key()],
            position,
            moves: Vec::new(),
            outcome: GameOutcome::InProgress,
            players,
            created_at: now,
            updated_at: now,
        };
        session.outcome = session.status().outcome();
        session
    }

    pub fn is_ended(&self) -> bool {
        self.outcome.is_decided()
    }

    pub fn side_to_move(&self) -> Side {
        self.position.turn().into()
    }

    pub fn is_engine_turn(&self) -> bool {
        self.engine_color == Some(self.side_to_move())
    }

    /// Whether a human may move now. Always true in `player` games.
    pub fn is_human_turn(&self) -> bool {
        match self.mode {
            GameMode::Ai => self.human_color == Some(self.side_to_move()),
            GameMode::Player => true,
        }
    }

    /// Occurrences of the current position in the game so far
    pub fn repetitions(&self) -> usize {
        let current = self.position.repetition_key();
        self.history.iter().filter(|key| **key == current).count()
    }

    /// Rules status of the current position including repetition.
    pub fn status(&self) -> GameStatus {
        self.position.status().with_repetitions(self.repetitions())
    }

    /// Play `mv` and record it.
    ///
    /// On error the session is left exactly as it was.
    pub fn apply(&mut self, mv: &Move) -> ChessEngineResult<GameStatus> {
        let next = self.position.play(mv)?;

        self.moves.push(to_uci(mv));
        self.history.push(next.repetition_key());
        self.position = next;
        self.updated_at = Utc::now();

        let status = self.status();
        self.outcome = status.outcome();
        Ok(status)
    }

    /// Recompute the outcome from the current position.
    pub fn refresh_outcome(&mut self) -> GameStatus {
        let status = self.status();
        self.outcome = status.outcome();
        status
    }

    pub fn snapshot(&self, ai_move: Option<String>) -> GameSnapshot {
        GameSnapshot {
            game_id: self.id.clone(),
            board: self.position.fen(),
            result: self.outcome.as_str().to_string(),
            turn: self.side_to_move(),
            mode: self.mode,
            moves: self.moves.clone(),
            ended: self.is_ended(),
            start_fen: self.start_fen.clone(),
            white_player: self.players.white.clone(),
            black_player: self.players.black.clone(),
            ai_move,
        }
    }
}

/// Read-only projection of a session returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub game_id: String,
    /// Forsyth-Edwards string of the current position
    pub board: String,
    /// `white`, `black`, `draw` or `*`
    pub result: String,
    pub turn: Side,
    pub mode: GameMode,
    pub moves: Vec<String>,
    pub ended: bool,
    /// Position the game started from
    pub start_fen: String,
    pub white_player: Option<String>,
    pub black_player: Option<String>,
    /// Engine reply made during this request, if any
    pub ai_move: Option<String>,
}
