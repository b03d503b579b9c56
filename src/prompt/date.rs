//! Free-text date recognition
//!
//! Fixed en-US rule: numeric dates are month first. A date without a year is
//! the first such day on or after `today`. Weekday names resolve to the
//! soonest such weekday strictly after `today`. Time-of-day words are ignored.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use regex::Regex;
use std::sync::LazyLock;

const MONTHS: &str = "jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";

static ISO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").unwrap());

static NUMERIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})[/-](\d{1,2})(?:[/-](\d{4}|\d{2}))?\b").unwrap()
});

static MONTH_DAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b({MONTHS})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?\b(?:,?\s+(\d{{4}}))?"
    ))
    .unwrap()
});

static DAY_MONTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b(\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?({MONTHS})\b\.?(?:,?\s+(\d{{4}}))?"
    ))
    .unwrap()
});

static IN_DAYS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bin\s+(\d{1,3}|a|an|one|two|three)\s+(days?|weeks?)\b").unwrap());

static WEEKDAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(mon|tue|tues|wed|thu|thur|thurs|fri|sat|sun)(?:day|nesday|sday|urday)?\b")
        .unwrap()
});

static NOW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\W*(?:right\s+)?now\W*$").unwrap());

/// Find the first date-like expression in `text`.
pub(super) fn parse_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let text = text.to_lowercase();

    if let Some(caps) = ISO_RE.captures(&text) {
        return NaiveDate::from_ymd_opt(
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        );
    }

    if let Some(caps) = NUMERIC_RE.captures(&text) {
        let month: u32 = caps[1].parse().ok()?;
        let day: u32 = caps[2].parse().ok()?;
        let year = caps.get(3).and_then(|y| full_year(y.as_str()));
        return resolve(year, month, day, today);
    }

    if let Some(caps) = MONTH_DAY_RE.captures(&text) {
        let month = month_number(&caps[1])?;
        let day: u32 = caps[2].parse().ok()?;
        let year = caps.get(3).and_then(|y| y.as_str().parse().ok());
        return resolve(year, month, day, today);
    }

    if let Some(caps) = DAY_MONTH_RE.captures(&text) {
        let day: u32 = caps[1].parse().ok()?;
        let month = month_number(&caps[2])?;
        let year = caps.get(3).and_then(|y| y.as_str().parse().ok());
        return resolve(year, month, day, today);
    }

    // Counted and named days outrank the bare relative words, so
    // "in 3 days from now" is not read as today.
    if let Some(caps) = IN_DAYS_RE.captures(&text) {
        let count: u64 = match &caps[1] {
            "a" | "an" | "one" => 1,
            "two" => 2,
            "three" => 3,
            digits => digits.parse().ok()?,
        };
        let days = if caps[2].starts_with("week") {
            count * 7
        } else {
            count
        };
        return today.checked_add_days(Days::new(days));
    }

    if let Some(caps) = WEEKDAY_RE.captures(&text) {
        let weekday = weekday(&caps[1])?;
        return Some(next_weekday(today, weekday));
    }

    if text.contains("day after tomorrow") {
        return today.checked_add_days(Days::new(2));
    }
    if has_word(&text, "tomorrow") {
        return today.checked_add_days(Days::new(1));
    }
    if has_word(&text, "today") || has_word(&text, "tonight") {
        return Some(today);
    }
    // "now" only counts as a date when it is the whole reply
    if NOW_RE.is_match(&text) {
        return Some(today);
    }

    None
}

fn has_word(text: &str, word: &str) -> bool {
    text.split(|c: char| !c.is_alphanumeric()).any(|w| w == word)
}

fn full_year(year: &str) -> Option<i32> {
    let value: i32 = year.parse().ok()?;
    if year.len() == 2 {
        Some(2000 + value)
    } else {
        Some(value)
    }
}

/// Build a date, filling in a missing year with the first occurrence on or
/// after `today`.
fn resolve(year: Option<i32>, month: u32, day: u32, today: NaiveDate) -> Option<NaiveDate> {
    if let Some(year) = year {
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    // Feb 29 may be several years away
    (today.year()..today.year() + 8)
        .filter_map(|year| NaiveDate::from_ymd_opt(year, month, day))
        .find(|date| *date >= today)
}

fn month_number(name: &str) -> Option<u32> {
    let month = match name.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn weekday(prefix: &str) -> Option<Weekday> {
    let weekday = match prefix.get(..3)? {
        "mon" => Weekday::Mon,
        "tue" => Weekday::Tue,
        "wed" => Weekday::Wed,
        "thu" => Weekday::Thu,
        "fri" => Weekday::Fri,
        "sat" => Weekday::Sat,
        "sun" => Weekday::Sun,
        _ => return None,
    };
    Some(weekday)
}

fn next_weekday(today: NaiveDate, weekday: Weekday) -> NaiveDate {
    let ahead = (weekday.num_days_from_monday() + 7 - today.weekday().num_days_from_monday()) % 7;
    let ahead = if ahead == 0 { 7 } else { ahead };
    today + Days::new(u64::from(ahead))
}
