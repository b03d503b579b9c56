//! Enumerated-choice matching

use super::Rejection;
use crate::state_machine::state::BedSize;
use nucleo_matcher::pattern::{CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Config, Matcher, Utf32Str};

/// One labeled option of a choice prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub label: &'static str,
    /// Single word that selects this choice on its own
    pub keyword: &'static str,
    pub value: BedSize,
}

impl Choice {
    pub const fn new(label: &'static str, keyword: &'static str, value: BedSize) -> Self {
        Self {
            label,
            keyword,
            value,
        }
    }
}

/// Match a reply against an ordered list of choices.
///
/// Tried in order: 1-based index, exact label or keyword (case-insensitive),
/// then a fuzzy match where the single best-scoring label wins.
pub(super) fn match_choice<'a>(text: &str, choices: &'a [Choice]) -> Result<&'a Choice, Rejection> {
    let normalized = text.trim().to_lowercase();

    if let Ok(index) = normalized.trim_end_matches('.').parse::<usize>() {
        return index
            .checked_sub(1)
            .and_then(|i| choices.get(i))
            .ok_or(Rejection::NoMatchingChoice);
    }

    if let Some(choice) = choices
        .iter()
        .find(|c| normalized == c.label || normalized == c.keyword)
    {
        return Ok(choice);
    }

    // A keyword appearing as a word of a longer reply ("a double please")
    let words: Vec<&str> = normalized
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let by_keyword: Vec<&Choice> = choices
        .iter()
        .filter(|c| words.contains(&c.keyword))
        .collect();
    match by_keyword.as_slice() {
        [only] => return Ok(*only),
        [] => {}
        _ => return Err(Rejection::AmbiguousChoice),
    }

    fuzzy_match(&normalized, choices)
}

fn fuzzy_match<'a>(text: &str, choices: &'a [Choice]) -> Result<&'a Choice, Rejection> {
    let mut matcher = Matcher::new(Config::DEFAULT);
    let pattern = Pattern::parse(text, CaseMatching::Ignore, Normalization::Smart);
    let mut buf = Vec::new();

    let mut scored: Vec<(u32, &Choice)> = choices
        .iter()
        .filter_map(|choice| {
            pattern
                .score(Utf32Str::new(choice.label, &mut buf), &mut matcher)
                .map(|score| (score, choice))
        })
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    match scored.as_slice() {
        [] => Err(Rejection::NoMatchingChoice),
        [(_, only)] => Ok(*only),
        [(best, choice), (runner_up, _), ..] if best > runner_up => Ok(*choice),
        _ => Err(Rejection::AmbiguousChoice),
    }
}
