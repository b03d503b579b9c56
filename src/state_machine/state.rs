//! Conversation state types

use crate::prompt::PromptId;
use crate::waterfall::Step;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Slot Model
// ============================================================================

/// Bed size offered for a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BedSize {
    Single,
    Double,
}

impl BedSize {
    pub fn label(self) -> &'static str {
        match self {
            BedSize::Single => "single bed",
            BedSize::Double => "double bed",
        }
    }
}

/// Who the user is. Captured once by the name-capture flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub name: Option<String>,
}

/// The room reservation under construction.
///
/// Slots are filled strictly in field order by the reservation waterfall.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomReservation {
    pub start_date: Option<NaiveDate>,
    /// Days entered by the user minus one; the check-in day is implied
    pub nights: Option<u64>,
    pub occupants: Option<u64>,
    pub bed_size: Option<BedSize>,
    pub confirmed: Option<bool>,
    /// Issued when the reservation is confirmed
    #[serde(default)]
    pub order_reference: Option<String>,
}

impl RoomReservation {
    /// One-line description of the filled slots
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(date) = self.start_date {
            parts.push(format!("checking in {date}"));
        }
        if let Some(nights) = self.nights {
            let unit = if nights == 1 { "night" } else { "nights" };
            parts.push(format!("{nights} {unit}"));
        }
        if let Some(occupants) = self.occupants {
            let unit = if occupants == 1 { "guest" } else { "guests" };
            parts.push(format!("{occupants} {unit}"));
        }
        if let Some(bed) = self.bed_size {
            parts.push(bed.label().to_string());
        }

        if parts.is_empty() {
            "Your reservation has no details yet.".to_string()
        } else {
            format!("Your reservation: {}.", parts.join(", "))
        }
    }
}

// ============================================================================
// Conversation State
// ============================================================================

/// A multi-turn flow that can own the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowId {
    NameCapture,
    Reservation,
}

impl FlowId {
    pub fn as_str(self) -> &'static str {
        match self {
            FlowId::NameCapture => "name_capture",
            FlowId::Reservation => "reservation",
        }
    }
}

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-conversation record, loaded and saved once per turn.
///
/// `(active_flow, active_step, pending_prompt)` is the persisted continuation
/// of the running flow: `active_step` is the step that issued
/// `pending_prompt`, and the next inbound message answers it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    pub turn_count: u64,
    pub active_flow: Option<FlowId>,
    pub active_step: usize,
    pub pending_prompt: Option<PromptId>,
    pub reservation: RoomReservation,
}

/// Validated view of a running flow's continuation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowCursor {
    pub flow: FlowId,
    pub step: usize,
    pub prompt: PromptId,
}

/// The persisted continuation cannot be resumed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedState {
    #[error("flow {0} is active but no prompt is pending")]
    FlowWithoutPrompt(FlowId),
    #[error("prompt {0} is pending but no flow is active")]
    PromptWithoutFlow(PromptId),
    #[error("flow {flow} has no step {step}")]
    StepOutOfRange { flow: FlowId, step: usize },
    #[error("step {step} of flow {flow} issues {expected}, but {found} is pending")]
    PromptMismatch {
        flow: FlowId,
        step: usize,
        expected: String,
        found: PromptId,
    },
}

impl ConversationState {
    pub fn is_idle(&self) -> bool {
        self.active_flow.is_none()
    }

    /// Check the continuation triple and return the running flow, if any
    pub fn cursor(&self) -> Result<Option<FlowCursor>, MalformedState> {
        match (self.active_flow, self.pending_prompt) {
            (None, None) => Ok(None),
            (Some(flow), None) => Err(MalformedState::FlowWithoutPrompt(flow)),
            (None, Some(prompt)) => Err(MalformedState::PromptWithoutFlow(prompt)),
            (Some(flow), Some(prompt)) => {
                let step = Step::at(flow, self.active_step).ok_or(
                    MalformedState::StepOutOfRange {
                        flow,
                        step: self.active_step,
                    },
                )?;
                if step.prompt() != Some(prompt) {
                    return Err(MalformedState::PromptMismatch {
                        flow,
                        step: self.active_step,
                        expected: step
                            .prompt()
                            .map_or_else(|| "no prompt".to_string(), |p| p.to_string()),
                        found: prompt,
                    });
                }
                Ok(Some(FlowCursor {
                    flow,
                    step: self.active_step,
                    prompt,
                }))
            }
        }
    }

    /// Point the continuation at a step that just issued `prompt`
    pub fn enter_step(&mut self, flow: FlowId, step: usize, prompt: PromptId) {
        self.active_flow = Some(flow);
        self.active_step = step;
        self.pending_prompt = Some(prompt);
    }

    /// Return to idle. Slots are left as they are.
    pub fn clear_flow(&mut self) {
        self.active_flow = None;
        self.active_step = 0;
        self.pending_prompt = None;
    }

    /// Reset a state whose continuation cannot be resumed.
    ///
    /// Returns the problem that was found, if any. The in-progress
    /// reservation is dropped; the turn count is kept.
    pub fn repair(&mut self) -> Option<MalformedState> {
        let problem = self.cursor().err()?;
        self.clear_flow();
        self.reservation = RoomReservation::default();
        Some(problem)
    }
}
