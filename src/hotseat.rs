//! Terminal hot-seat game
//!
//! Two people share one terminal, or one person plays the engine. The loop
//! reads moves from any [`BufRead`] and writes to any [`Write`], so tests can
//! script a whole game.

use std::io::{BufRead, Write};

use anyhow::bail;
use chess_engine::constants::DEFAULT_SEARCH_DEPTH;
use chess_engine::move_gen::to_uci;
use chess_engine::{find_best_move, ChessEngineError, Color, GameOutcome, GameStatus, Position};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct HotseatConfig {
    pub white: String,
    pub black: String,
    /// Color played by the engine, if any
    pub engine: Option<Color>,
    pub depth: u8,
}

impl Default for HotseatConfig {
    fn default() -> Self {
        Self {
            white: "White".to_string(),
            black: "Black".to_string(),
            engine: None,
            depth: DEFAULT_SEARCH_DEPTH,
        }
    }
}

impl HotseatConfig {
    fn name(&self, color: Color) -> &str {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }
}

/// How a hot-seat session finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotseatEnd {
    Finished(GameOutcome),
    /// A player typed `quit` or input ran out
    Quit,
}

/// Print the board the way a player reads it: rank 8 at the top, uppercase
/// for White, `.` for empty squares.
pub fn render_board(position: &Position) -> String {
    let fen = position.fen();
    let placement = fen.split_whitespace().next().unwrap_or_default();

    placement
        .split('/')
        .map(|rank| {
            rank.chars()
                .flat_map(|c| match c.to_digit(10) {
                    Some(empty) => vec!['.'; empty as usize],
                    None => vec![c],
                })
                .map(String::from)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn describe(status: GameStatus) -> &'static str {
    match status {
        GameStatus::InProgress => "in progress",
        GameStatus::Checkmate { .. } => "checkmate",
        GameStatus::Stalemate => "stalemate",
        GameStatus::InsufficientMaterial => "insufficient material",
        GameStatus::SeventyFiveMoveRule => "seventy-five-move rule",
        GameStatus::FivefoldRepetition => "fivefold repetition",
    }
}

/// Play one game from the initial position until it ends or a player quits.
pub fn run<R: BufRead, W: Write>(
    config: &HotseatConfig,
    mut input: R,
    output: &mut W,
) -> anyhow::Result<HotseatEnd> {
    let mut position = Position::new();
    let mut history = vec![position.repetition_key()];

    writeln!(output, "{} (White) vs {} (Black)", config.white, config.black)?;

    loop {
        let key = position.repetition_key();
        let repetitions = history.iter().filter(|seen| **seen == key).count();
        let status = position.status().with_repetitions(repetitions);

        writeln!(output, "\n{}\n", render_board(&position))?;

        if status.is_terminal() {
            let outcome = status.outcome();
            writeln!(output, "Game over! Result: {outcome} ({})", describe(status))?;
            return Ok(HotseatEnd::Finished(outcome));
        }

        let turn = position.turn();
        let name = config.name(turn);

        let mv = if config.engine == Some(turn) {
            let result = find_best_move(&position, config.depth);
            let Some(mv) = result.best_move else {
                bail!("engine found no move in a position that is not over");
            };
            debug!(score = result.score, nodes = result.stats.nodes, "engine searched");
            writeln!(output, "{name} (engine) plays {}", to_uci(&mv))?;
            mv
        } else {
            let example = match turn {
                Color::White => "e2e4",
                Color::Black => "e7e5",
            };
            loop {
                write!(output, "{name}, enter your move in UCI format (e.g. {example}): ")?;
                output.flush()?;

                let mut line = String::new();
                if input.read_line(&mut line)? == 0 {
                    writeln!(output)?;
                    return Ok(HotseatEnd::Quit);
                }
                let line = line.trim();
                if line.eq_ignore_ascii_case("quit") {
                    return Ok(HotseatEnd::Quit);
                }

                match position.parse_move(line) {
                    Ok(mv) => break mv,
                    Err(ChessEngineError::IllegalMove { .. }) => {
                        writeln!(output, "Illegal move, please try again.")?
                    }
                    Err(_) => writeln!(output, "Invalid move format, please try again.")?,
                }
            }
        };

        position = position.play(&mv)?;
        history.push(position.repetition_key());
    }
}
