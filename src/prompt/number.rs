//! Integer recognition

use regex::Regex;
use std::sync::LazyLock;

static INTEGER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:^|[^\w-])(-?\d+)\b").unwrap());

const NUMBER_WORDS: &[&str] = &[
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
    "nineteen",
];

const TENS_WORDS: &[&str] = &[
    "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];

/// Parse an integer from a reply: the whole text, or the single number the
/// text contains, written as digits or English words ("twenty-one").
///
/// A reply mentioning more than one number ("2 adults and 1 child") is not
/// guessed at.
pub(super) fn parse_integer(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Ok(value) = text.parse::<i64>() {
        return Some(value);
    }

    let mut found = INTEGER_RE
        .captures_iter(text)
        .map(|caps| caps[1].parse().ok())
        .collect::<Option<Vec<i64>>>()?;

    let lowered = text.to_lowercase();
    found.extend(
        lowered
            .split(|c: char| !(c.is_alphanumeric() || c == '-'))
            .filter_map(word_value),
    );

    match found.as_slice() {
        [only] => Some(*only),
        _ => None,
    }
}

/// Value of one number word, including hyphenated compounds
fn word_value(word: &str) -> Option<i64> {
    let word = word.trim_matches('-');
    if let Some((tens, unit)) = word.split_once('-') {
        let unit = units_value(unit).filter(|u| (1..=9).contains(u))?;
        return Some(tens_value(tens)? + unit);
    }
    units_value(word).or_else(|| tens_value(word))
}

fn units_value(word: &str) -> Option<i64> {
    NUMBER_WORDS
        .iter()
        .position(|w| *w == word)
        .and_then(|index| i64::try_from(index).ok())
}

fn tens_value(word: &str) -> Option<i64> {
    TENS_WORDS
        .iter()
        .position(|w| *w == word)
        .and_then(|index| i64::try_from(index).ok())
        .map(|index| 20 + index * 10)
}
