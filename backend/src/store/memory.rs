use std::collections::hash_map::Entry;
use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{SessionStore, StoreError};
use crate::session::GameSession;

/// Sessions kept in a process-local map. Lost on restart.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, GameSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, id: &str) -> Result<Option<GameSession>, StoreError> {
        Ok(self.sessions.read().get(id).cloned())
    }

    async fn insert(&self, session: &GameSession) -> Result<(), StoreError> {
        match self.sessions.write().entry(session.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate(session.id.clone())),
            Entry::Vacant(slot) => {
                slot.insert(session.clone());
                Ok(())
            }
        }
    }

    async fn put(&self, session: &GameSession) -> Result<(), StoreError> {
        self.sessions
            .write()
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.sessions.write().remove(id).is_some())
    }
}
