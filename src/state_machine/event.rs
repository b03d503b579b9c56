//! Events that can occur in a conversation

/// Inbound events that trigger a turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A message typed by the user
    UserMessage { text: String },

    /// Any non-message activity from the channel (typing, join, etc.)
    Channel { event_type: String },

    /// Explicit request to start the reservation waterfall
    BeginReservation,
}

impl Event {
    /// Build an event from a transport activity type and its text
    pub fn from_activity(activity_type: &str, text: &str) -> Self {
        if activity_type.eq_ignore_ascii_case("message") {
            Event::UserMessage {
                text: text.to_string(),
            }
        } else {
            Event::Channel {
                event_type: activity_type.to_string(),
            }
        }
    }

    /// Short name for logging
    pub fn kind(&self) -> &str {
        match self {
            Event::UserMessage { .. } => "message",
            Event::Channel { event_type } => event_type,
            Event::BeginReservation => "begin_reservation",
        }
    }
}
