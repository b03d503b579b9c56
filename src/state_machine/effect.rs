//! Effects produced by state transitions

use crate::state_machine::state::UserIdentity;

/// Effects to be executed after a state transition, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send a plain-text message to the user
    Reply { text: String },

    /// Persist the user's identity
    SaveIdentity { identity: UserIdentity },

    /// Issue an order reference for the reservation and tell the user
    ConfirmReservation,
}

impl Effect {
    pub fn reply(text: impl Into<String>) -> Self {
        Effect::Reply { text: text.into() }
    }

    pub fn save_identity(identity: UserIdentity) -> Self {
        Effect::SaveIdentity { identity }
    }
}
