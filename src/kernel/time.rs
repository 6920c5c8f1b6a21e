use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::TimingConfig;

/// Session generation. Bumped on every start and cancel; anything stamped
/// with an older generation is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Generation {
    pub epoch: u64,
}

impl Generation {
    pub fn new() -> Self {
        Generation { epoch: 0 }
    }

    pub fn next(&self) -> Self {
        Generation { epoch: self.epoch + 1 }
    }
}

/// Every wait the dialogue inserts between turns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogueTiming {
    /// Between the per-language selection prompts.
    pub prompt_gap: Duration,
    /// After a prompt ends and before the recognizer is armed.
    pub speech_settle: Duration,
    /// After the spelled-out confirmation. Engines tend to report "ended"
    /// early on long letter-by-letter utterances.
    pub confirmation_settle: Duration,
    /// Input port stop-to-start gap.
    pub recognition_settle: Duration,
    /// Between invoking search and declaring the flow complete.
    pub search_settle: Duration,
    /// Quiet re-listen after a silent attempt in the name phases.
    pub silence_rearm: Duration,
    pub speech_ms_per_char: u64,
    pub watchdog_margin: Duration,
}

impl DialogueTiming {
    /// Upper bound for an utterance before its "ended" event is given up on.
    pub fn watchdog_for(&self, text: &str) -> Duration {
        let chars = text.chars().count() as u64;
        Duration::from_millis(chars * self.speech_ms_per_char) + self.watchdog_margin
    }
}

impl Default for DialogueTiming {
    fn default() -> Self {
        Self::from(&TimingConfig::default())
    }
}

impl From<&TimingConfig> for DialogueTiming {
    fn from(cfg: &TimingConfig) -> Self {
        Self {
            prompt_gap: Duration::from_millis(cfg.prompt_gap_ms),
            speech_settle: Duration::from_millis(cfg.speech_settle_ms),
            confirmation_settle: Duration::from_millis(cfg.confirmation_settle_ms),
            recognition_settle: Duration::from_millis(cfg.recognition_settle_ms),
            search_settle: Duration::from_millis(cfg.search_settle_ms),
            silence_rearm: Duration::from_millis(cfg.silence_rearm_ms),
            speech_ms_per_char: cfg.speech_ms_per_char,
            watchdog_margin: Duration::from_millis(cfg.watchdog_margin_ms),
        }
    }
}
