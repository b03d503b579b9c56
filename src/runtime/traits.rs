//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::db::Database;
use crate::state_machine::{ConversationState, UserIdentity};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Storage for conversation state
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the conversation state; a missing record loads as the default
    async fn load_state(&self, key: &str) -> Result<ConversationState, String>;

    /// Replace the conversation state
    async fn save_state(&self, key: &str, state: &ConversationState) -> Result<(), String>;
}

/// Storage for user identity
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Load the user identity; a missing record loads as empty
    async fn load_identity(&self, key: &str) -> Result<UserIdentity, String>;

    /// Replace the user identity
    async fn save_identity(&self, key: &str, identity: &UserIdentity) -> Result<(), String>;
}

/// Combined storage trait for convenience
pub trait Storage: StateStore + IdentityStore {}
impl<T: StateStore + IdentityStore> Storage for T {}

/// Source of order references for confirmed reservations.
/// Every call must return a reference never returned before.
pub trait OrderReferences: Send + Sync {
    fn next_reference(&self) -> String;
}

/// Source of the current date for relative date parsing
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: StateStore + ?Sized> StateStore for Arc<T> {
    async fn load_state(&self, key: &str) -> Result<ConversationState, String> {
        (**self).load_state(key).await
    }

    async fn save_state(&self, key: &str, state: &ConversationState) -> Result<(), String> {
        (**self).save_state(key, state).await
    }
}

#[async_trait]
impl<T: IdentityStore + ?Sized> IdentityStore for Arc<T> {
    async fn load_identity(&self, key: &str) -> Result<UserIdentity, String> {
        (**self).load_identity(key).await
    }

    async fn save_identity(&self, key: &str, identity: &UserIdentity) -> Result<(), String> {
        (**self).save_identity(key, identity).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Adapter to use Database as Storage
#[derive(Clone)]
pub struct DatabaseStorage {
    db: Database,
}

impl DatabaseStorage {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl StateStore for DatabaseStorage {
    async fn load_state(&self, key: &str) -> Result<ConversationState, String> {
        self.db.load_state(key).map_err(|e| e.to_string())
    }

    async fn save_state(&self, key: &str, state: &ConversationState) -> Result<(), String> {
        self.db.save_state(key, state).map_err(|e| e.to_string())
    }
}

#[async_trait]
impl IdentityStore for DatabaseStorage {
    async fn load_identity(&self, key: &str) -> Result<UserIdentity, String> {
        self.db.load_identity(key).map_err(|e| e.to_string())
    }

    async fn save_identity(&self, key: &str, identity: &UserIdentity) -> Result<(), String> {
        self.db.save_identity(key, identity).map_err(|e| e.to_string())
    }
}

/// Time-derived order references: `HR-<utc timestamp>-<sequence>`.
///
/// The per-process sequence keeps references unique within one millisecond.
#[derive(Debug, Default)]
pub struct TimestampReferences {
    sequence: AtomicU64,
}

impl OrderReferences for TimestampReferences {
    fn next_reference(&self) -> String {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        format!("HR-{}-{sequence}", Utc::now().format("%Y%m%d%H%M%S%3f"))
    }
}

/// Local calendar date
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}
