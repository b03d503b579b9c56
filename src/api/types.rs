//! API request and response types

use crate::db::ConversationSummary;
use crate::state_machine::{ConversationState, UserIdentity};
use serde::{Deserialize, Serialize};

/// An inbound channel activity
#[derive(Debug, Deserialize)]
pub struct ActivityRequest {
    #[serde(rename = "type")]
    pub activity_type: String,
    #[serde(default)]
    pub text: String,
}

/// Response for conversation creation
#[derive(Debug, Serialize)]
pub struct CreateConversationResponse {
    pub key: String,
}

/// Response with a list of conversations
#[derive(Debug, Serialize)]
pub struct ConversationListResponse {
    pub conversations: Vec<ConversationSummary>,
}

/// Stored state of one conversation
#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub state: ConversationState,
    pub identity: UserIdentity,
}

/// Response for lifecycle actions
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Messages for the user, when the failure has something to tell them
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<String>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            messages: Vec::new(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.messages.push(message.into());
        self
    }
}
