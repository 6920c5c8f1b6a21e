//! TOML configuration
//!
//! Every field is optional; a missing file section falls back to defaults.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::kernel::reactor::DialoguePolicy;
use crate::kernel::time::DialogueTiming;
use crate::language::SupportedLanguage;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KioskConfig {
    pub dialogue: DialogueConfig,
    pub timing: TimingConfig,
    pub output: OutputConfig,
    pub input: InputConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DialogueConfig {
    pub default_language: SupportedLanguage,
    /// Languages whose recognizer support is weak; recognition for them
    /// falls back to `default_language`.
    pub reduced_support: Vec<SupportedLanguage>,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            default_language: SupportedLanguage::En,
            reduced_support: vec![SupportedLanguage::Zh],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub prompt_gap_ms: u64,
    pub speech_settle_ms: u64,
    pub confirmation_settle_ms: u64,
    pub recognition_settle_ms: u64,
    pub search_settle_ms: u64,
    pub silence_rearm_ms: u64,
    pub speech_ms_per_char: u64,
    pub watchdog_margin_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            prompt_gap_ms: 400,
            speech_settle_ms: 250,
            confirmation_settle_ms: 500,
            recognition_settle_ms: 100,
            search_settle_ms: 2000,
            silence_rearm_ms: 1500,
            speech_ms_per_char: 80,
            watchdog_margin_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputEngineKind {
    /// Print prompts to stdout
    #[default]
    Console,
    /// Spawn an OS text-to-speech program
    Command,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub engine: OutputEngineKind,
    pub command: String,
    pub args: Vec<String>,
    /// Voice tag -> engine voice name (e.g. "en-US" = "Samantha")
    pub voices: HashMap<String, String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            engine: OutputEngineKind::Console,
            command: "say".to_string(),
            args: Vec::new(),
            voices: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub listen_timeout_ms: u64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            listen_timeout_ms: 8000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub endpoint: String,
    pub timeout_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:3000/api/appointments/search".to_string(),
            timeout_ms: 5000,
        }
    }
}

impl KioskConfig {
    /// Load and validate a config file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, is not valid TOML, or fails
    /// validation
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// # Errors
    ///
    /// Returns error on malformed TOML or invalid values
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns error if the values cannot drive a dialogue
    pub fn validate(&self) -> Result<()> {
        if self
            .dialogue
            .reduced_support
            .contains(&self.dialogue.default_language)
        {
            return Err(Error::Config(format!(
                "default language {} cannot itself fall back",
                self.dialogue.default_language
            )));
        }
        if self.timing.recognition_settle_ms == 0 {
            return Err(Error::Config(
                "recognition_settle_ms must be greater than zero".to_string(),
            ));
        }
        if self.output.engine == OutputEngineKind::Command && self.output.command.trim().is_empty() {
            return Err(Error::Config("output command is empty".to_string()));
        }
        if self.search.endpoint.trim().is_empty() {
            return Err(Error::Config("search endpoint is empty".to_string()));
        }
        Ok(())
    }

    pub fn policy(&self) -> DialoguePolicy {
        DialoguePolicy {
            default_language: self.dialogue.default_language,
            reduced_support: self.dialogue.reduced_support.clone(),
        }
    }

    pub fn timing(&self) -> DialogueTiming {
        DialogueTiming::from(&self.timing)
    }
}
