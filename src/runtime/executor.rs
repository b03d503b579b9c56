//! Turn executor
//!
//! Runs one inbound event against one conversation: a single load, the pure
//! transition, effect execution, and a single save.

use super::traits::{Clock, OrderReferences, Storage};
use crate::state_machine::state::{ConversationState, FlowId, RoomReservation};
use crate::state_machine::{transition, ConvContext, Effect, Event, TransitionError, UserIdentity};
use crate::waterfall::StepError;
use serde::Serialize;
use thiserror::Error;

/// Shown to the user whenever a turn fails for a reason other than input
pub const APOLOGY_MESSAGE: &str = "Sorry, something went wrong on my side. Please try again.";

/// Messages produced by a turn, in the order they should be sent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TurnReply {
    pub messages: Vec<String>,
}

/// Turn-level failures
#[derive(Debug, Error)]
pub enum TurnError {
    /// State could not be loaded or saved; nothing was committed
    #[error("Persistence failure: {0}")]
    Persistence(String),
    /// A flow step failed; the flow was abandoned
    #[error("Flow step failed: {0}")]
    Step(#[from] StepError),
    #[error("Flow {0} is already running")]
    FlowBusy(FlowId),
}

impl TurnError {
    /// Whether the caller may retry the whole turn
    pub fn is_retryable(&self) -> bool {
        matches!(self, TurnError::Persistence(_))
    }

    /// Text to show the user for this failure
    pub fn user_message(&self) -> String {
        match self {
            TurnError::Persistence(_) | TurnError::Step(_) => APOLOGY_MESSAGE.to_string(),
            TurnError::FlowBusy(flow) => format!(
                "Let's finish the current {} conversation first.",
                flow.as_str().replace('_', " ")
            ),
        }
    }
}

/// Generic turn runner that can work with any storage, reference source, and clock
pub struct TurnRunner<S, R, C>
where
    S: Storage,
    R: OrderReferences,
    C: Clock,
{
    storage: S,
    references: R,
    clock: C,
    reservation_trigger: Option<String>,
}

impl<S, R, C> TurnRunner<S, R, C>
where
    S: Storage,
    R: OrderReferences,
    C: Clock,
{
    pub fn new(storage: S, references: R, clock: C) -> Self {
        Self {
            storage,
            references,
            clock,
            reservation_trigger: None,
        }
    }

    /// Set the message that starts the reservation flow
    pub fn with_reservation_trigger(mut self, trigger: Option<String>) -> Self {
        self.reservation_trigger = trigger;
        self
    }

    /// Process one inbound event for the conversation `key`.
    ///
    /// State is loaded once and, on every path that got past loading, saved
    /// once. Callers must not run two turns for the same key concurrently.
    pub async fn run_turn(&self, key: &str, event: Event) -> Result<TurnReply, TurnError> {
        tracing::info!(conv_key = %key, event = %event.kind(), "Processing turn");

        let mut state = self
            .storage
            .load_state(key)
            .await
            .map_err(TurnError::Persistence)?;
        let identity = self
            .storage
            .load_identity(key)
            .await
            .map_err(TurnError::Persistence)?;

        if let Some(problem) = state.repair() {
            tracing::warn!(conv_key = %key, %problem, "Malformed conversation state, reset to idle");
        }

        let context = ConvContext::new(key, self.clock.today())
            .with_reservation_trigger(self.reservation_trigger.clone());

        let result = match transition(&state, &identity, &context, event) {
            Ok(result) => result,
            Err(TransitionError::FlowBusy(flow)) => {
                self.save_state(key, &state).await?;
                return Err(TurnError::FlowBusy(flow));
            }
            Err(TransitionError::Step(e)) => {
                tracing::error!(
                    conv_key = %key,
                    flow = ?state.active_flow,
                    step = state.active_step,
                    error = %e,
                    "Flow step failed, abandoning flow"
                );
                state.clear_flow();
                if let Err(save_err) = self.storage.save_state(key, &state).await {
                    tracing::error!(conv_key = %key, error = %save_err, "Best-effort save failed");
                }
                return Err(TurnError::Step(e));
            }
        };

        let mut new_state = result.new_state;
        let mut reply = TurnReply::default();
        let mut new_identity: Option<UserIdentity> = None;

        for effect in result.effects {
            self.execute_effect(key, effect, &mut new_state, &mut new_identity, &mut reply);
        }

        if let Some(identity) = new_identity {
            self.storage
                .save_identity(key, &identity)
                .await
                .map_err(TurnError::Persistence)?;
        }
        self.save_state(key, &new_state).await?;

        tracing::debug!(
            conv_key = %key,
            turn_count = new_state.turn_count,
            flow = ?new_state.active_flow,
            step = new_state.active_step,
            messages = reply.messages.len(),
            "Turn complete"
        );
        Ok(reply)
    }

    fn execute_effect(
        &self,
        key: &str,
        effect: Effect,
        state: &mut ConversationState,
        identity: &mut Option<UserIdentity>,
        reply: &mut TurnReply,
    ) {
        match effect {
            Effect::Reply { text } => reply.messages.push(text),
            Effect::SaveIdentity { identity: captured } => {
                tracing::info!(conv_key = %key, "User identity captured");
                *identity = Some(captured);
            }
            Effect::ConfirmReservation => {
                let reference = self.references.next_reference();
                tracing::info!(conv_key = %key, order_reference = %reference, "Reservation confirmed");
                state.reservation.order_reference = Some(reference.clone());
                reply
                    .messages
                    .push(confirmation_message(&state.reservation, &reference));
            }
        }
    }

    async fn save_state(&self, key: &str, state: &ConversationState) -> Result<(), TurnError> {
        self.storage.save_state(key, state).await.map_err(|e| {
            tracing::error!(conv_key = %key, error = %e, "Failed to save conversation state");
            TurnError::Persistence(e)
        })
    }
}

fn confirmation_message(reservation: &RoomReservation, reference: &str) -> String {
    format!(
        "{} You're all set! Your order reference is {reference}.",
        reservation.summary()
    )
}
