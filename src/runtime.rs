//! Runtime for executing conversation turns
//!
//! The transition function is pure; this module owns the I/O around it and
//! serializes turns per conversation key.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::{TurnError, TurnReply, TurnRunner, APOLOGY_MESSAGE};
pub use traits::*;

use crate::db::{Database, DbResult};
use crate::state_machine::Event;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Type alias for production runtime with concrete implementations
pub type ProductionRuntime = TurnRunner<DatabaseStorage, TimestampReferences, SystemClock>;

/// Entry point for all conversations served by this process
pub struct RuntimeManager {
    db: Database,
    runner: ProductionRuntime,
    /// One lock per conversation key; turns for the same key run one at a time
    turn_locks: RwLock<HashMap<String, Arc<Mutex<()>>>>,
}

impl RuntimeManager {
    pub fn new(db: Database, reservation_trigger: Option<String>) -> Self {
        let runner = TurnRunner::new(
            DatabaseStorage::new(db.clone()),
            TimestampReferences::default(),
            SystemClock,
        )
        .with_reservation_trigger(reservation_trigger);
        Self {
            db,
            runner,
            turn_locks: RwLock::new(HashMap::new()),
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Run one turn for `key`, waiting for any turn already running on it
    pub async fn dispatch(&self, key: &str, event: Event) -> Result<TurnReply, TurnError> {
        let lock = self.turn_lock(key).await;
        let _guard = lock.lock().await;
        self.runner.run_turn(key, event).await
    }

    /// Delete a conversation, waiting for any turn already running on it
    pub async fn delete_conversation(&self, key: &str) -> DbResult<()> {
        let lock = self.turn_lock(key).await;
        let result = {
            let _guard = lock.lock().await;
            self.db.delete_conversation(key)
        };
        drop(lock);
        self.forget(key).await;
        result
    }

    /// Drop the turn lock for `key` unless a turn holds or awaits it
    async fn forget(&self, key: &str) {
        let mut locks = self.turn_locks.write().await;
        if locks.get(key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(key);
        }
    }

    async fn turn_lock(&self, key: &str) -> Arc<Mutex<()>> {
        if let Some(lock) = self.turn_locks.read().await.get(key) {
            return lock.clone();
        }
        self.turn_locks
            .write()
            .await
            .entry(key.to_string())
            .or_default()
            .clone()
    }
}
