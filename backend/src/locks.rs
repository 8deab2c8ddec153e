//! Per-game serialization
//!
//! Every manager operation that reads a session and writes it back holds the
//! game's lock for the whole cycle, so two requests for the same game can
//! never interleave (no double-applied move, no legality check against a
//! stale position). Requests for different games only share the brief
//! registry lookup.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Registry = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

#[derive(Clone, Default)]
pub struct SessionLocks {
    registry: Registry,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `game_id`.
    pub async fn lock(&self, game_id: &str) -> SessionGuard {
        let handle = self
            .registry
            .lock()
            .entry(game_id.to_string())
            .or_default()
            .clone();

        let guard = handle.lock_owned().await;

        SessionGuard {
            game_id: game_id.to_string(),
            registry: Arc::clone(&self.registry),
            guard: Some(guard),
        }
    }

    /// Number of games with a holder or waiter
    pub fn active(&self) -> usize {
        self.registry.lock().len()
    }
}

/// Exclusive access to one game, released on drop.
pub struct SessionGuard {
    game_id: String,
    registry: Registry,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let mut registry = self.registry.lock();
        // Release first so our handle no longer counts towards the total
        drop(self.guard.take());
        let unused = registry
            .get(&self.game_id)
            .is_some_and(|handle| Arc::strong_count(handle) == 1);
        if unused {
            registry.remove(&self.game_id);
        }
    }
}
