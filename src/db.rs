//! Database module for the concierge
//!
//! Provides persistence for conversation state and user identity.

mod schema;

pub use schema::*;

use crate::state_machine::{ConversationState, UserIdentity};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),
    #[error("Database lock poisoned")]
    LockPoisoned,
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.conn()?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    fn conn(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }

    // ==================== Conversation State ====================

    /// Load conversation state, or a fresh default if none is stored.
    ///
    /// A stored blob that no longer parses is treated like a missing one.
    pub fn load_state(&self, key: &str) -> DbResult<ConversationState> {
        let Some(state_json) = self.load_state_json(key)? else {
            return Ok(ConversationState::default());
        };

        Ok(serde_json::from_str(&state_json).unwrap_or_else(|e| {
            tracing::warn!(conv_key = %key, error = %e, "Discarding unreadable conversation state");
            ConversationState::default()
        }))
    }

    /// Raw stored state blob
    pub fn load_state_json(&self, key: &str) -> DbResult<Option<String>> {
        let conn = self.conn()?;
        let state_json = conn
            .query_row(
                "SELECT state FROM conversation_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(state_json)
    }

    /// Save conversation state in a single upsert
    pub fn save_state(&self, key: &str, state: &ConversationState) -> DbResult<()> {
        let state_json = serde_json::to_string(state)?;
        let conn = self.conn()?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO conversation_state (key, state, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(key) DO UPDATE SET state = excluded.state, updated_at = excluded.updated_at",
            params![key, state_json, now],
        )?;
        Ok(())
    }

    // ==================== User Identity ====================

    /// Load the user identity, or an empty one if none is stored
    pub fn load_identity(&self, key: &str) -> DbResult<UserIdentity> {
        let conn = self.conn()?;
        let identity_json: Option<String> = conn
            .query_row(
                "SELECT identity FROM user_identity WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        let Some(identity_json) = identity_json else {
            return Ok(UserIdentity::default());
        };

        Ok(serde_json::from_str(&identity_json).unwrap_or_else(|e| {
            tracing::warn!(conv_key = %key, error = %e, "Discarding unreadable user identity");
            UserIdentity::default()
        }))
    }

    /// Save the user identity in a single upsert
    pub fn save_identity(&self, key: &str, identity: &UserIdentity) -> DbResult<()> {
        let identity_json = serde_json::to_string(identity)?;
        let conn = self.conn()?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO user_identity (key, identity, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET identity = excluded.identity, updated_at = excluded.updated_at",
            params![key, identity_json, now],
        )?;
        Ok(())
    }

    // ==================== Conversation Operations ====================

    /// List stored conversations, most recently updated first
    pub fn list_conversations(&self) -> DbResult<Vec<ConversationSummary>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT key, created_at, updated_at FROM conversation_state ORDER BY updated_at DESC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(ConversationSummary {
                key: row.get(0)?,
                created_at: parse_datetime(&row.get::<_, String>(1)?),
                updated_at: parse_datetime(&row.get::<_, String>(2)?),
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Delete a conversation's state and identity
    pub fn delete_conversation(&self, key: &str) -> DbResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let deleted_state = tx.execute("DELETE FROM conversation_state WHERE key = ?1", params![key])?;
        let deleted_identity = tx.execute("DELETE FROM user_identity WHERE key = ?1", params![key])?;
        tx.commit()?;

        if deleted_state + deleted_identity == 0 {
            return Err(DbError::ConversationNotFound(key.to_string()));
        }
        Ok(())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}
