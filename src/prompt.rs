//! Prompts and the validators that interpret replies to them
//!
//! Every prompt the concierge can issue is a `PromptId`. The persisted
//! `pending_prompt` of a conversation names one of these, and the next inbound
//! message is parsed by that prompt's `Validator`.

mod choice;
mod date;
mod number;
mod yes_no;

pub use choice::Choice;

use crate::state_machine::state::{BedSize, RoomReservation};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Bed sizes offered by the bed-size prompt, in presentation order
pub const BED_CHOICES: &[Choice] = &[
    Choice::new("single bed", "single", BedSize::Single),
    Choice::new("double bed", "double", BedSize::Double),
];

/// A prompt issued by a waterfall step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptId {
    Name,
    StartDate,
    StayLength,
    Occupants,
    BedSize,
    Confirmation,
}

impl PromptId {
    /// Identifier used at the storage boundary
    pub fn as_str(self) -> &'static str {
        match self {
            PromptId::Name => "name",
            PromptId::StartDate => "start_date",
            PromptId::StayLength => "stay_length",
            PromptId::Occupants => "occupants",
            PromptId::BedSize => "bed_size",
            PromptId::Confirmation => "confirmation",
        }
    }

    pub fn validator(self) -> Validator {
        match self {
            PromptId::Name => Validator::Text,
            PromptId::StartDate => Validator::Date,
            // The first day of the stay is the check-in day, so at least one
            // day is needed for a non-negative night count.
            PromptId::StayLength | PromptId::Occupants => Validator::Integer { min: 1 },
            PromptId::BedSize => Validator::Choice(BED_CHOICES),
            PromptId::Confirmation => Validator::YesNo,
        }
    }

    /// Text shown to the user when this prompt is issued (or re-issued).
    ///
    /// Depends only on the prompt and the reservation slots, so re-prompting
    /// without a state change yields the same text.
    pub fn text(self, reservation: &RoomReservation) -> String {
        match self {
            PromptId::Name => "What is your name?".to_string(),
            PromptId::StartDate => "What day would you like to check in?".to_string(),
            PromptId::StayLength => {
                "How many days will you be staying, counting the check-in day?".to_string()
            }
            PromptId::Occupants => "How many people will be staying in the room?".to_string(),
            PromptId::BedSize => {
                let options = BED_CHOICES
                    .iter()
                    .enumerate()
                    .map(|(i, choice)| format!("({}) {}", i + 1, choice.label))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("Which bed size would you like? {options}")
            }
            PromptId::Confirmation => format!(
                "{} Shall I book it? (yes or no)",
                reservation.summary()
            ),
        }
    }
}

impl fmt::Display for PromptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reply that has been accepted by a validator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptValue {
    Date(NaiveDate),
    Number(i64),
    Bed(BedSize),
    Confirm(bool),
    Text(String),
}

impl PromptValue {
    /// Short name of the value kind, for error reporting
    pub fn kind(&self) -> &'static str {
        match self {
            PromptValue::Date(_) => "date",
            PromptValue::Number(_) => "number",
            PromptValue::Bed(_) => "bed",
            PromptValue::Confirm(_) => "confirm",
            PromptValue::Text(_) => "text",
        }
    }
}

/// Why a reply was not accepted. Always recovered by re-prompting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("reply is empty")]
    Empty,
    #[error("no date found in reply")]
    NoDate,
    #[error("date {0} is in the past")]
    PastDate(NaiveDate),
    #[error("no number found in reply")]
    NotANumber,
    #[error("{value} is below the minimum of {min}")]
    BelowMinimum { value: i64, min: i64 },
    #[error("reply does not match any choice")]
    NoMatchingChoice,
    #[error("reply matches more than one choice")]
    AmbiguousChoice,
    #[error("reply is neither yes nor no")]
    NotYesOrNo,
}

/// Parsing rule for a prompt's reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validator {
    Date,
    Integer { min: i64 },
    Choice(&'static [Choice]),
    YesNo,
    Text,
}

impl Validator {
    /// Interpret raw user text. `today` anchors relative date expressions.
    pub fn parse(self, text: &str, today: NaiveDate) -> Result<PromptValue, Rejection> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Rejection::Empty);
        }

        match self {
            Validator::Date => {
                let date = date::parse_date(text, today).ok_or(Rejection::NoDate)?;
                if date < today {
                    return Err(Rejection::PastDate(date));
                }
                Ok(PromptValue::Date(date))
            }
            Validator::Integer { min } => {
                let value = number::parse_integer(text).ok_or(Rejection::NotANumber)?;
                if value < min {
                    return Err(Rejection::BelowMinimum { value, min });
                }
                Ok(PromptValue::Number(value))
            }
            Validator::Choice(choices) => {
                choice::match_choice(text, choices).map(|c| PromptValue::Bed(c.value))
            }
            Validator::YesNo => yes_no::parse_yes_no(text)
                .map(PromptValue::Confirm)
                .ok_or(Rejection::NotYesOrNo),
            Validator::Text => Ok(PromptValue::Text(text.to_string())),
        }
    }
}
