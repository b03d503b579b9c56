//! Database schema and types

use chrono::{DateTime, Utc};
use serde::Serialize;

/// SQL schema for initialization
///
/// Conversation state and user identity live in separate namespaces, both
/// keyed by the conversation key supplied by the transport.
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS conversation_state (
    key TEXT PRIMARY KEY,
    state TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_conversation_state_updated ON conversation_state(updated_at DESC);

CREATE TABLE IF NOT EXISTS user_identity (
    key TEXT PRIMARY KEY,
    identity TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
";

/// A stored conversation, as listed by the API
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    pub key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
