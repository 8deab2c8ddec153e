//! Game session server
//!
//! Owns every running game and exposes them over HTTP:
//!
//! - [`session`] - the per-game record and its read-only snapshot
//! - [`store`] - where sessions live between requests (memory or SQLite)
//! - [`locks`] - per-game serialization of read-modify-write cycles
//! - [`manager`] - the game lifecycle state machine
//! - [`api`] - axum routes on top of the manager
//! - [`config`] / [`server`] - environment configuration and process bootstrap

pub mod api;
pub mod config;
pub mod error;
pub mod locks;
pub mod manager;
pub mod server;
pub mod session;
pub mod store;

pub use error::{SessionError, SessionResult};
pub use manager::{SearchLimits, SessionManager, StartGame};
pub use session::{GameMode, GameSession, GameSnapshot, Players, Side};
