//! Language data and the pure transcript interpreters.
//!
//! Nothing in here touches an engine or a timer. The reactor feeds raw
//! transcripts in and gets typed readings back.

pub mod confirm;
pub mod detect;
pub mod name;
pub mod phrases;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

pub use confirm::{classify_confirmation, Confirmation};
pub use detect::LanguageDetector;
pub use name::{parse_full_name, read_name, spell_out, CapturedName, NameReading};
pub use phrases::{LanguageProfile, NameField, PhraseBank};

/// Languages the kiosk can hold a check-in conversation in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportedLanguage {
    En,
    Es,
    Zh,
}

impl SupportedLanguage {
    /// Declaration order. Detection ties and the selection prompt both follow it.
    pub const ALL: [SupportedLanguage; 3] = [Self::En, Self::Es, Self::Zh];

    pub fn tag(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
            Self::Zh => "zh",
        }
    }
}

impl Default for SupportedLanguage {
    fn default() -> Self {
        Self::En
    }
}

impl fmt::Display for SupportedLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for SupportedLanguage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" => Ok(Self::En),
            "es" => Ok(Self::Es),
            "zh" => Ok(Self::Zh),
            other => Err(Error::UnknownLanguage(other.to_string())),
        }
    }
}
