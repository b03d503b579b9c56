//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::state::*;
use super::transition::*;
use super::*;
use crate::prompt::PromptId;
use chrono::NaiveDate;
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
}

fn test_context() -> ConvContext {
    ConvContext::new("test-conv", today())
}

fn known() -> UserIdentity {
    UserIdentity {
        name: Some("Ada".to_string()),
    }
}

fn message(text: impl Into<String>) -> Event {
    Event::UserMessage { text: text.into() }
}

fn replies(result: &TransitionResult) -> Vec<String> {
    result
        .effects
        .iter()
        .filter_map(|e| match e {
            Effect::Reply { text } => Some(text.clone()),
            _ => None,
        })
        .collect()
}

/// A reservation flow waiting on the prompt at `step`, with every earlier slot filled
fn reservation_at(step: usize) -> ConversationState {
    let prompts = [
        PromptId::StartDate,
        PromptId::StayLength,
        PromptId::Occupants,
        PromptId::BedSize,
        PromptId::Confirmation,
    ];
    let mut state = ConversationState::default();
    if step > 0 {
        state.reservation.start_date = NaiveDate::from_ymd_opt(2026, 11, 2);
    }
    if step > 1 {
        state.reservation.nights = Some(2);
    }
    if step > 2 {
        state.reservation.occupants = Some(2);
    }
    if step > 3 {
        state.reservation.bed_size = Some(BedSize::Double);
    }
    state.enter_step(FlowId::Reservation, step, prompts[step]);
    state
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_flow_state() -> impl Strategy<Value = ConversationState> {
    prop_oneof![
        Just(ConversationState::default()),
        Just({
            let mut state = ConversationState::default();
            state.enter_step(FlowId::NameCapture, 0, PromptId::Name);
            state
        }),
        (0usize..5).prop_map(reservation_at),
    ]
}

fn arb_state() -> impl Strategy<Value = ConversationState> {
    (arb_flow_state(), 0u64..10_000, any::<Option<bool>>(), proptest::option::of("[A-Z]{2}-[0-9]{4}"))
        .prop_map(|(mut state, turn_count, confirmed, reference)| {
            state.turn_count = turn_count;
            state.reservation.confirmed = confirmed;
            state.reservation.order_reference = reference;
            state
        })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// An accepted stay length of n days is stored as n - 1 nights
    #[test]
    fn prop_nights_are_days_minus_one(days in 1i64..1000) {
        let state = reservation_at(1);
        let result = transition(&state, &known(), &test_context(), message(days.to_string())).unwrap();

        prop_assert_eq!(result.new_state.reservation.nights, Some(u64::try_from(days - 1).unwrap()));
        prop_assert_eq!(result.new_state.pending_prompt, Some(PromptId::Occupants));
    }

    /// Stay lengths below one day are rejected and leave the state unchanged
    #[test]
    fn prop_short_stays_are_rejected(days in -1000i64..1) {
        let state = reservation_at(1);
        let result = transition(&state, &known(), &test_context(), message(days.to_string())).unwrap();

        prop_assert_eq!(&result.new_state, &state);
        prop_assert_eq!(replies(&result), vec![PromptId::StayLength.text(&state.reservation)]);
    }

    /// An unparseable reply repeats the pending prompt byte-for-byte, every time
    #[test]
    fn prop_rejection_is_idempotent(step in 0usize..5, junk in "[qxzj]{3,12}") {
        let state = reservation_at(step);
        let prompt = state.pending_prompt.unwrap();

        let first = transition(&state, &known(), &test_context(), message(junk.clone())).unwrap();
        let second = transition(&first.new_state, &known(), &test_context(), message(junk)).unwrap();

        prop_assert_eq!(&first.new_state, &state);
        prop_assert_eq!(&second.new_state, &state);
        prop_assert_eq!(replies(&first), vec![prompt.text(&state.reservation)]);
        prop_assert_eq!(replies(&first), replies(&second));
    }

    /// A user without a name is always asked for it first when nothing is running
    #[test]
    fn prop_name_is_asked_first(text in "[a-zA-Z0-9 ]{0,30}", turns in 0u64..100) {
        prop_assume!(!text.trim().is_empty());
        let state = ConversationState { turn_count: turns, ..ConversationState::default() };

        let result = transition(&state, &UserIdentity::default(), &test_context(), message(text)).unwrap();

        prop_assert_eq!(result.new_state.turn_count, turns);
        prop_assert_eq!(result.new_state.pending_prompt, Some(PromptId::Name));
    }

    /// Echo turns never disturb a later flow: the step order is fixed
    #[test]
    fn prop_step_order_is_fixed(echoes in 0usize..10) {
        let mut state = ConversationState::default();
        for i in 0..echoes {
            state = transition(&state, &known(), &test_context(), message(format!("hi {i}"))).unwrap().new_state;
        }
        prop_assert_eq!(state.turn_count, echoes as u64);

        let mut prompts = Vec::new();
        state = transition(&state, &known(), &test_context(), Event::BeginReservation).unwrap().new_state;
        prompts.push(state.pending_prompt);
        for reply in ["tomorrow", "3", "2", "single"] {
            state = transition(&state, &known(), &test_context(), message(reply)).unwrap().new_state;
            prompts.push(state.pending_prompt);
        }

        prop_assert_eq!(prompts, vec![
            Some(PromptId::StartDate),
            Some(PromptId::StayLength),
            Some(PromptId::Occupants),
            Some(PromptId::BedSize),
            Some(PromptId::Confirmation),
        ]);
        prop_assert_eq!(state.turn_count, echoes as u64);
    }

    /// Channel events never change the state
    #[test]
    fn prop_channel_events_are_inert(state in arb_state(), event_type in "[a-zA-Z]{1,20}") {
        let result = transition(&state, &known(), &test_context(), Event::Channel { event_type }).unwrap();
        prop_assert_eq!(result.new_state, state);
    }

    /// Saving a loaded state reproduces the stored bytes
    #[test]
    fn prop_serde_round_trip_is_stable(state in arb_state()) {
        let json = serde_json::to_string(&state).unwrap();
        let loaded: ConversationState = serde_json::from_str(&json).unwrap();

        prop_assert_eq!(&loaded, &state);
        prop_assert_eq!(serde_json::to_string(&loaded).unwrap(), json);
        prop_assert!(loaded.cursor().is_ok());
    }
}
