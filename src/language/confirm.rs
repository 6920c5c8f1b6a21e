use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::phrases::LanguageProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confirmation {
    Positive,
    Negative,
    /// Both kinds of keyword, or neither.
    Ambiguous,
}

/// Case-folded keyword match against the profile's yes/no sets.
///
/// The positive and negative checks run separately and a hit on both is
/// ambiguous. A positive keyword that only occurs inside a negative keyword
/// occurrence ("是" within "不是") is not a positive hit.
pub fn classify_confirmation(transcript: &str, profile: &LanguageProfile) -> Confirmation {
    let folded = transcript.trim().to_lowercase();
    if folded.is_empty() {
        return Confirmation::Ambiguous;
    }

    let negative_spans: Vec<Range<usize>> = profile
        .negative_words
        .iter()
        .flat_map(|word| occurrences(&folded, word))
        .collect();

    let positive = profile.positive_words.iter().any(|word| {
        occurrences(&folded, word)
            .any(|hit| !negative_spans.iter().any(|neg| covers(neg, &hit)))
    });
    let negative = !negative_spans.is_empty();

    match (positive, negative) {
        (true, false) => Confirmation::Positive,
        (false, true) => Confirmation::Negative,
        _ => Confirmation::Ambiguous,
    }
}

fn occurrences<'a>(haystack: &'a str, needle: &'a str) -> impl Iterator<Item = Range<usize>> + 'a {
    haystack
        .match_indices(needle)
        .map(|(start, hit)| start..start + hit.len())
}

fn covers(outer: &Range<usize>, inner: &Range<usize>) -> bool {
    outer.start <= inner.start && inner.end <= outer.end && outer.len() > inner.len()
}
