//! Waterfall flow engine
//!
//! A flow is a fixed sequence of steps that runs one step per turn. Nothing
//! survives between turns except the continuation stored in
//! `ConversationState`, so resuming a flow means: parse the reply with the
//! pending prompt's validator, then run the step after the one that issued
//! the prompt, handing it the parsed value.

mod steps;

pub use steps::{Step, StepAction, CANCELLATION_MESSAGE};

use crate::prompt::PromptValue;
use crate::state_machine::state::{ConversationState, FlowId, MalformedState, RoomReservation};
use crate::state_machine::Effect;
use chrono::NaiveDate;
use thiserror::Error;

/// A step could not run for a reason other than user input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    #[error("flow {flow} has no step {step}")]
    NoSuchStep { flow: FlowId, step: usize },
    #[error("step {step} expected a {expected} value, got {found}")]
    UnexpectedValue {
        step: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    #[error("step {step} needs the {slot} slot, which is empty")]
    MissingSlot {
        step: &'static str,
        slot: &'static str,
    },
    #[error("no flow is active")]
    NotRunning,
    #[error("cannot resume flow: {0}")]
    Malformed(#[from] MalformedState),
}

/// Start `flow` from its first step.
///
/// Starting the reservation flow discards any earlier reservation.
pub fn start(flow: FlowId, state: &mut ConversationState) -> Result<Vec<Effect>, StepError> {
    if flow == FlowId::Reservation {
        state.reservation = RoomReservation::default();
    }
    tracing::debug!(%flow, "Starting flow");
    run_step(flow, 0, None, state)
}

/// Feed a user reply to the running flow.
///
/// A rejected reply re-issues the pending prompt and leaves the continuation
/// untouched.
pub fn resume(
    state: &mut ConversationState,
    text: &str,
    today: NaiveDate,
) -> Result<Vec<Effect>, StepError> {
    let cursor = state.cursor()?.ok_or(StepError::NotRunning)?;

    match cursor.prompt.validator().parse(text, today) {
        Ok(value) => run_step(cursor.flow, cursor.step + 1, Some(value), state),
        Err(rejection) => {
            tracing::debug!(
                flow = %cursor.flow,
                step = cursor.step,
                prompt = %cursor.prompt,
                %rejection,
                "Reply rejected, re-prompting"
            );
            Ok(vec![Effect::reply(cursor.prompt.text(&state.reservation))])
        }
    }
}

fn run_step(
    flow: FlowId,
    index: usize,
    previous: Option<PromptValue>,
    state: &mut ConversationState,
) -> Result<Vec<Effect>, StepError> {
    let step = Step::at(flow, index).ok_or(StepError::NoSuchStep { flow, step: index })?;

    match step.run(previous, &mut state.reservation)? {
        StepAction::Prompt(prompt) => {
            state.enter_step(flow, index, prompt);
            tracing::debug!(%flow, step = index, %prompt, "Prompt issued");
            Ok(vec![Effect::reply(prompt.text(&state.reservation))])
        }
        StepAction::End(effects) => {
            state.clear_flow();
            tracing::debug!(%flow, "Flow finished");
            Ok(effects)
        }
    }
}
