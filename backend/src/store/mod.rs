//! Session storage
//!
//! The manager talks to storage only through [`SessionStore`], so the same
//! game logic runs against the in-process map used for tests and single-node
//! deployments or against the SQLite table used when games must survive a
//! restart. Stores guarantee that a single call is atomic; serializing a
//! read-modify-write cycle across calls is the manager's job (see
//! [`crate::locks`]).

mod memory;
mod sqlite;

pub use memory::MemorySessionStore;
pub use sqlite::SqliteSessionStore;

use async_trait::async_trait;

use crate::session::GameSession;

/// Errors raised by a session store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// `insert` found an existing session with the same id
    #[error("session '{0}' already exists")]
    Duplicate(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored record could not be turned back into a session
    #[error("corrupt session record '{id}': {reason}")]
    Corrupt { id: String, reason: String },
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<GameSession>, StoreError>;

    /// Store a new session, failing with [`StoreError::Duplicate`] if the id
    /// is taken.
    async fn insert(&self, session: &GameSession) -> Result<(), StoreError>;

    /// Create or overwrite a session.
    async fn put(&self, session: &GameSession) -> Result<(), StoreError>;

    /// Remove a session. Returns whether one existed.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;
}
