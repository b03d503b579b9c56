//! Yes/no recognition

const AFFIRMATIVE: &[&str] = &[
    "yes", "y", "yeah", "yep", "yup", "sure", "ok", "okay", "confirm", "correct", "true",
    "absolutely", "definitely", "please",
];

const NEGATIVE: &[&str] = &[
    "no", "n", "nope", "nah", "cancel", "false", "never", "don't", "dont",
];

const AFFIRMATIVE_PHRASES: &[&str] = &["why not", "go ahead", "of course"];

const NEGATIVE_PHRASES: &[&str] = &["do not", "not really", "not now", "not yet", "no thanks"];

/// Hedges that are neither answer, whatever else the reply says
const UNDECIDED_PHRASES: &[&str] = &["not sure", "no idea", "not certain"];

/// Classify a reply as yes or no. Replies with both a yes and a no, or with
/// neither, are ambiguous. A bare "not" negates nothing on its own; only the
/// negating phrases above count.
pub(super) fn parse_yes_no(text: &str) -> Option<bool> {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
        .collect();
    // Padded so phrases only match on word boundaries
    let joined = format!(" {} ", words.join(" "));
    let has_phrase = |phrases: &[&str]| phrases.iter().any(|p| joined.contains(&format!(" {p} ")));

    if has_phrase(UNDECIDED_PHRASES) {
        return None;
    }

    let yes = words.iter().any(|w| AFFIRMATIVE.contains(w)) || has_phrase(AFFIRMATIVE_PHRASES);
    let no = words.iter().any(|w| NEGATIVE.contains(w)) || has_phrase(NEGATIVE_PHRASES);

    match (yes, no) {
        (true, false) => Some(true),
        (false, true) => Some(false),
        _ => None,
    }
}
