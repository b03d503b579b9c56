//! Step definitions for the concierge flows
//!
//! Each step receives the value accepted for the previous step's prompt,
//! stores it, and either issues its own prompt or ends the flow.

use super::StepError;
use crate::prompt::{PromptId, PromptValue};
use crate::state_machine::state::{BedSize, FlowId, RoomReservation, UserIdentity};
use crate::state_machine::Effect;
use chrono::NaiveDate;

pub const CANCELLATION_MESSAGE: &str =
    "No problem, I have not booked anything. Your reservation details are kept if you want to start again.";

/// What a step decided to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    /// Wait for the reply to this prompt; ends the turn
    Prompt(PromptId),
    /// Finish the flow with these effects
    End(Vec<Effect>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameCaptureStep {
    AskName,
    Greet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationStep {
    AskStartDate,
    AskStayLength,
    AskOccupants,
    AskBedSize,
    AskConfirmation,
    Finish,
}

const NAME_CAPTURE: &[NameCaptureStep] = &[NameCaptureStep::AskName, NameCaptureStep::Greet];

const RESERVATION: &[ReservationStep] = &[
    ReservationStep::AskStartDate,
    ReservationStep::AskStayLength,
    ReservationStep::AskOccupants,
    ReservationStep::AskBedSize,
    ReservationStep::AskConfirmation,
    ReservationStep::Finish,
];

/// A step of any flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    NameCapture(NameCaptureStep),
    Reservation(ReservationStep),
}

impl Step {
    /// Resolve a persisted step index
    pub fn at(flow: FlowId, index: usize) -> Option<Step> {
        match flow {
            FlowId::NameCapture => NAME_CAPTURE.get(index).copied().map(Step::NameCapture),
            FlowId::Reservation => RESERVATION.get(index).copied().map(Step::Reservation),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Step::NameCapture(NameCaptureStep::AskName) => "ask_name",
            Step::NameCapture(NameCaptureStep::Greet) => "greet",
            Step::Reservation(ReservationStep::AskStartDate) => "ask_start_date",
            Step::Reservation(ReservationStep::AskStayLength) => "ask_stay_length",
            Step::Reservation(ReservationStep::AskOccupants) => "ask_occupants",
            Step::Reservation(ReservationStep::AskBedSize) => "ask_bed_size",
            Step::Reservation(ReservationStep::AskConfirmation) => "ask_confirmation",
            Step::Reservation(ReservationStep::Finish) => "finish",
        }
    }

    /// The prompt this step issues, or `None` for a final step
    pub fn prompt(self) -> Option<PromptId> {
        match self {
            Step::NameCapture(NameCaptureStep::AskName) => Some(PromptId::Name),
            Step::Reservation(ReservationStep::AskStartDate) => Some(PromptId::StartDate),
            Step::Reservation(ReservationStep::AskStayLength) => Some(PromptId::StayLength),
            Step::Reservation(ReservationStep::AskOccupants) => Some(PromptId::Occupants),
            Step::Reservation(ReservationStep::AskBedSize) => Some(PromptId::BedSize),
            Step::Reservation(ReservationStep::AskConfirmation) => Some(PromptId::Confirmation),
            Step::NameCapture(NameCaptureStep::Greet) | Step::Reservation(ReservationStep::Finish) => {
                None
            }
        }
    }

    /// Run the step with the previous step's result.
    ///
    /// Slots are only written after every check has passed, so an error
    /// leaves `reservation` untouched.
    pub fn run(
        self,
        previous: Option<PromptValue>,
        reservation: &mut RoomReservation,
    ) -> Result<StepAction, StepError> {
        let name = self.name();
        match self {
            Step::NameCapture(NameCaptureStep::AskName) => Ok(StepAction::Prompt(PromptId::Name)),
            Step::NameCapture(NameCaptureStep::Greet) => {
                let name_text = expect_text(name, previous)?;
                let greeting = format!(
                    "Nice to meet you, {name_text}! Let me know whenever you want to reserve a room."
                );
                Ok(StepAction::End(vec![
                    Effect::save_identity(UserIdentity {
                        name: Some(name_text),
                    }),
                    Effect::reply(greeting),
                ]))
            }
            Step::Reservation(step) => run_reservation(step, name, previous, reservation),
        }
    }
}

fn run_reservation(
    step: ReservationStep,
    name: &'static str,
    previous: Option<PromptValue>,
    reservation: &mut RoomReservation,
) -> Result<StepAction, StepError> {
    match step {
        ReservationStep::AskStartDate => Ok(StepAction::Prompt(PromptId::StartDate)),
        ReservationStep::AskStayLength => {
            let date = expect_date(name, previous)?;
            reservation.start_date = Some(date);
            Ok(StepAction::Prompt(PromptId::StayLength))
        }
        ReservationStep::AskOccupants => {
            require(name, "start_date", reservation.start_date.is_some())?;
            let days = expect_positive(name, previous)?;
            reservation.nights = Some(days - 1);
            Ok(StepAction::Prompt(PromptId::Occupants))
        }
        ReservationStep::AskBedSize => {
            require(name, "nights", reservation.nights.is_some())?;
            let occupants = expect_positive(name, previous)?;
            reservation.occupants = Some(occupants);
            Ok(StepAction::Prompt(PromptId::BedSize))
        }
        ReservationStep::AskConfirmation => {
            require(name, "occupants", reservation.occupants.is_some())?;
            let bed = expect_bed(name, previous)?;
            reservation.bed_size = Some(bed);
            Ok(StepAction::Prompt(PromptId::Confirmation))
        }
        ReservationStep::Finish => {
            require(name, "bed_size", reservation.bed_size.is_some())?;
            let confirmed = expect_confirm(name, previous)?;
            reservation.confirmed = Some(confirmed);
            if confirmed {
                Ok(StepAction::End(vec![Effect::ConfirmReservation]))
            } else {
                Ok(StepAction::End(vec![Effect::reply(CANCELLATION_MESSAGE)]))
            }
        }
    }
}

fn require(step: &'static str, slot: &'static str, filled: bool) -> Result<(), StepError> {
    if filled {
        Ok(())
    } else {
        Err(StepError::MissingSlot { step, slot })
    }
}

fn unexpected(step: &'static str, expected: &'static str, found: Option<&PromptValue>) -> StepError {
    StepError::UnexpectedValue {
        step,
        expected,
        found: found.map_or("nothing", PromptValue::kind),
    }
}

fn expect_text(step: &'static str, value: Option<PromptValue>) -> Result<String, StepError> {
    match value {
        Some(PromptValue::Text(text)) => Ok(text),
        other => Err(unexpected(step, "text", other.as_ref())),
    }
}

fn expect_date(step: &'static str, value: Option<PromptValue>) -> Result<NaiveDate, StepError> {
    match value {
        Some(PromptValue::Date(date)) => Ok(date),
        other => Err(unexpected(step, "date", other.as_ref())),
    }
}

fn expect_positive(step: &'static str, value: Option<PromptValue>) -> Result<u64, StepError> {
    match value {
        Some(PromptValue::Number(n)) if n >= 1 => u64::try_from(n)
            .map_err(|_| unexpected(step, "positive number", Some(&PromptValue::Number(n)))),
        other => Err(unexpected(step, "positive number", other.as_ref())),
    }
}

fn expect_bed(step: &'static str, value: Option<PromptValue>) -> Result<BedSize, StepError> {
    match value {
        Some(PromptValue::Bed(bed)) => Ok(bed),
        other => Err(unexpected(step, "bed", other.as_ref())),
    }
}

fn expect_confirm(step: &'static str, value: Option<PromptValue>) -> Result<bool, StepError> {
    match value {
        Some(PromptValue::Confirm(answer)) => Ok(answer),
        other => Err(unexpected(step, "confirm", other.as_ref())),
    }
}
