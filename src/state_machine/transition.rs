//! Pure state transition function
//!
//! Decides, for one inbound event, which flow (if any) receives it. All I/O
//! (loading, saving, issuing order references) happens in the runtime.

use super::state::{ConversationState, FlowId, UserIdentity};
use super::{Effect, Event};
use crate::waterfall::{self, StepError};
use chrono::NaiveDate;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConversationState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConversationState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Flow {0} is already running")]
    FlowBusy(FlowId),
    #[error(transparent)]
    Step(#[from] StepError),
}

/// Context for a single turn (immutable configuration)
#[derive(Debug, Clone)]
pub struct ConvContext {
    pub conversation_key: String,
    /// Anchor for relative dates such as "tomorrow"
    pub today: NaiveDate,
    /// Message that starts the reservation flow when the conversation is idle
    pub reservation_trigger: Option<String>,
}

impl ConvContext {
    pub fn new(conversation_key: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            conversation_key: conversation_key.into(),
            today,
            reservation_trigger: None,
        }
    }

    pub fn with_reservation_trigger(mut self, trigger: Option<String>) -> Self {
        self.reservation_trigger = trigger;
        self
    }

    fn is_reservation_trigger(&self, text: &str) -> bool {
        self.reservation_trigger
            .as_deref()
            .is_some_and(|trigger| trigger.trim().eq_ignore_ascii_case(text.trim()))
    }
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs. `state` is
/// never modified; on error the caller still holds the state as loaded.
pub fn transition(
    state: &ConversationState,
    identity: &UserIdentity,
    context: &ConvContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    let mut next = state.clone();

    match event {
        // Channel activity never advances a flow
        Event::Channel { event_type } => {
            Ok(TransitionResult::new(next).with_effect(acknowledge(&event_type)))
        }

        Event::UserMessage { text } if text.trim().is_empty() => {
            Ok(TransitionResult::new(next).with_effect(acknowledge("message")))
        }

        Event::BeginReservation => {
            if let Some(flow) = state.active_flow {
                tracing::debug!(conv_key = %context.conversation_key, %flow, "Reservation requested while busy");
                return Err(TransitionError::FlowBusy(flow));
            }
            let effects = waterfall::start(FlowId::Reservation, &mut next)?;
            Ok(TransitionResult::new(next).with_effects(effects))
        }

        // Unknown user, nothing running: ask for a name before anything else
        Event::UserMessage { .. } if identity.name.is_none() && state.is_idle() => {
            let effects = waterfall::start(FlowId::NameCapture, &mut next)?;
            Ok(TransitionResult::new(next).with_effects(effects))
        }

        Event::UserMessage { text } if !state.is_idle() => {
            let effects = waterfall::resume(&mut next, &text, context.today)?;
            Ok(TransitionResult::new(next).with_effects(effects))
        }

        Event::UserMessage { text } if context.is_reservation_trigger(&text) => {
            let effects = waterfall::start(FlowId::Reservation, &mut next)?;
            Ok(TransitionResult::new(next).with_effects(effects))
        }

        Event::UserMessage { text } => {
            next.turn_count += 1;
            let reply = format!("Turn {}: You sent '{}'", next.turn_count, text);
            Ok(TransitionResult::new(next).with_effect(Effect::reply(reply)))
        }
    }
}

fn acknowledge(event_type: &str) -> Effect {
    Effect::reply(format!("{event_type} event detected"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::PromptId;
    use crate::state_machine::state::RoomReservation;

    fn context() -> ConvContext {
        ConvContext::new("conv-1", NaiveDate::from_ymd_opt(2026, 10, 18).unwrap())
    }

    fn known() -> UserIdentity {
        UserIdentity {
            name: Some("Ada".to_string()),
        }
    }

    fn message(text: &str) -> Event {
        Event::UserMessage {
            text: text.to_string(),
        }
    }

    fn replies(result: &TransitionResult) -> Vec<&str> {
        result
            .effects
            .iter()
            .filter_map(|e| match e {
                Effect::Reply { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_first_message_starts_name_capture() {
        let state = ConversationState::default();
        let result =
            transition(&state, &UserIdentity::default(), &context(), message("hello")).unwrap();

        assert_eq!(result.new_state.turn_count, 0);
        assert_eq!(result.new_state.active_flow, Some(FlowId::NameCapture));
        assert_eq!(result.new_state.pending_prompt, Some(PromptId::Name));
        assert_eq!(replies(&result), vec!["What is your name?"]);
    }

    #[test]
    fn test_idle_known_user_gets_echo() {
        let state = ConversationState::default();
        let result = transition(&state, &known(), &context(), message("hi")).unwrap();

        assert_eq!(result.new_state.turn_count, 1);
        assert_eq!(replies(&result), vec!["Turn 1: You sent 'hi'"]);
    }

    #[test]
    fn test_channel_event_is_acknowledged_without_progress() {
        let mut state = ConversationState::default();
        state.enter_step(FlowId::Reservation, 1, PromptId::StayLength);
        let event = Event::Channel {
            event_type: "typing".to_string(),
        };

        let result = transition(&state, &known(), &context(), event).unwrap();

        assert_eq!(result.new_state, state);
        assert_eq!(replies(&result), vec!["typing event detected"]);
    }

    #[test]
    fn test_blank_message_is_acknowledged() {
        let state = ConversationState::default();
        let result =
            transition(&state, &UserIdentity::default(), &context(), message("  ")).unwrap();

        assert_eq!(result.new_state, state);
        assert_eq!(replies(&result), vec!["message event detected"]);
    }

    #[test]
    fn test_nights_answer_advances_one_step() {
        let mut state = ConversationState::default();
        state.reservation.start_date = NaiveDate::from_ymd_opt(2026, 11, 2);
        state.enter_step(FlowId::Reservation, 1, PromptId::StayLength);

        let result = transition(&state, &known(), &context(), message("3")).unwrap();

        assert_eq!(result.new_state.reservation.nights, Some(2));
        assert_eq!(result.new_state.active_step, 2);
        assert_eq!(result.new_state.pending_prompt, Some(PromptId::Occupants));
        assert_eq!(
            replies(&result),
            vec!["How many people will be staying in the room?"]
        );
    }

    #[test]
    fn test_declined_confirmation_cancels_and_keeps_slots() {
        let mut state = ConversationState::default();
        state.reservation = RoomReservation {
            start_date: NaiveDate::from_ymd_opt(2026, 11, 2),
            nights: Some(2),
            occupants: Some(2),
            bed_size: Some(crate::state_machine::state::BedSize::Double),
            ..RoomReservation::default()
        };
        state.enter_step(FlowId::Reservation, 4, PromptId::Confirmation);

        let result = transition(&state, &known(), &context(), message("no")).unwrap();

        assert!(result.new_state.is_idle());
        assert_eq!(result.new_state.reservation.nights, Some(2));
        assert_eq!(result.new_state.reservation.confirmed, Some(false));
        assert_eq!(replies(&result), vec![waterfall::CANCELLATION_MESSAGE]);
    }

    #[test]
    fn test_running_flow_takes_precedence_over_name_capture() {
        let mut state = ConversationState::default();
        state.enter_step(FlowId::Reservation, 0, PromptId::StartDate);

        let result = transition(
            &state,
            &UserIdentity::default(),
            &context(),
            message("tomorrow"),
        )
        .unwrap();

        assert_eq!(result.new_state.active_flow, Some(FlowId::Reservation));
        assert_eq!(result.new_state.pending_prompt, Some(PromptId::StayLength));
    }

    #[test]
    fn test_begin_reservation_while_busy_is_rejected() {
        let mut state = ConversationState::default();
        state.enter_step(FlowId::NameCapture, 0, PromptId::Name);

        let err = transition(&state, &known(), &context(), Event::BeginReservation).unwrap_err();

        assert_eq!(err, TransitionError::FlowBusy(FlowId::NameCapture));
    }

    #[test]
    fn test_begin_reservation_when_idle() {
        let state = ConversationState::default();
        let result = transition(&state, &known(), &context(), Event::BeginReservation).unwrap();

        assert_eq!(result.new_state.pending_prompt, Some(PromptId::StartDate));
        assert_eq!(result.new_state.turn_count, 0);
    }

    #[test]
    fn test_trigger_phrase_starts_reservation() {
        let state = ConversationState::default();
        let ctx = context().with_reservation_trigger(Some("Book a room".to_string()));

        let result = transition(&state, &known(), &ctx, message("book a ROOM ")).unwrap();

        assert_eq!(result.new_state.active_flow, Some(FlowId::Reservation));
        assert_eq!(result.new_state.turn_count, 0);
    }

    #[test]
    fn test_step_error_leaves_input_state_untouched() {
        // Cursor says the bed size prompt is pending but earlier slots are empty
        let mut state = ConversationState::default();
        state.enter_step(FlowId::Reservation, 3, PromptId::BedSize);

        let err = transition(&state, &known(), &context(), message("single")).unwrap_err();

        assert!(matches!(
            err,
            TransitionError::Step(StepError::MissingSlot { slot: "occupants", .. })
        ));
    }
}
