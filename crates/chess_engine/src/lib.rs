//! Game-state engine and move search
//!
//! This crate wraps the `shakmaty` rules library behind a small value-type
//! [`Position`] adapter and builds the opponent on top of it:
//!
//! - [`position`] - position model, legality and termination classification
//! - [`move_gen`] - canonical legal-move ordering and square-pair notation
//! - [`evaluation`] - material-only static evaluation (White's perspective)
//! - [`search`] - depth-bounded minimax with alpha-beta pruning
//!
//! Nothing in here performs I/O; every function is a pure computation over
//! owned or borrowed positions, so callers are free to run searches for
//! different games on different threads.

pub mod constants;
pub mod error;
pub mod evaluation;
pub mod move_gen;
pub mod position;
pub mod search;

pub use error::{ChessEngineError, ChessEngineResult};
pub use evaluation::evaluate;
pub use position::{GameOutcome, GameStatus, Position};
pub use search::{find_best_move, SearchResult, SearchStats};

pub use shakmaty::{Color, Move, Role, Square};
