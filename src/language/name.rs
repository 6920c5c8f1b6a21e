use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedName {
    pub first_name: String,
    pub last_name: String,
}

/// What a name-phase transcript turned out to hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameReading {
    Full(CapturedName),
    /// Only one word was heard.
    Single(String),
    Empty,
}

pub fn read_name(transcript: &str) -> NameReading {
    let words: Vec<&str> = transcript.split_whitespace().collect();
    match words.as_slice() {
        [] => NameReading::Empty,
        [only] => NameReading::Single((*only).to_string()),
        [first, rest @ ..] => NameReading::Full(CapturedName {
            first_name: (*first).to_string(),
            last_name: rest.join(" "),
        }),
    }
}

/// First word is the first name, everything after it the last name.
/// Needs at least two words.
pub fn parse_full_name(transcript: &str) -> Option<CapturedName> {
    match read_name(transcript) {
        NameReading::Full(name) => Some(name),
        NameReading::Single(_) | NameReading::Empty => None,
    }
}

/// "John" -> "J. o. h. n."
pub fn spell_out(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }
    let letters: Vec<String> = name.chars().map(String::from).collect();
    format!("{}.", letters.join(". "))
}
