use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::language::{CapturedName, SupportedLanguage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DialoguePhase {
    #[default]
    Idle,
    SelectingLanguage,
    AwaitingName,
    ConfirmingName,
    Completed,
    Cancelled,
}

impl DialoguePhase {
    /// A session is in flight and owns the voice ports.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            DialoguePhase::SelectingLanguage
                | DialoguePhase::AwaitingName
                | DialoguePhase::ConfirmingName
        )
    }
}

/// Strict state delta. This is the ONLY way the session mutates.
#[derive(Debug, Clone)]
pub enum StateDelta {
    SessionStarted { id: Uuid, language: SupportedLanguage },
    PhaseChanged(DialoguePhase),
    LanguageSelected {
        language: SupportedLanguage,
        /// Differs from `language` when recognition falls back.
        recognition: SupportedLanguage,
    },
    NameCaptured(CapturedName),
    NameDiscarded,
    /// Back to defaults, as after a cancel.
    Reset { language: SupportedLanguage },
}

#[derive(Debug, Clone, Default)]
pub struct DialogueSession {
    pub id: Option<Uuid>,
    pub phase: DialoguePhase,
    pub language: SupportedLanguage,
    pub recognition_language: SupportedLanguage,
    pub captured: Option<CapturedName>,
    /// Monotonic mutation counter
    pub version: u64,
}

impl DialogueSession {
    pub fn new(language: SupportedLanguage) -> Self {
        Self {
            language,
            recognition_language: language,
            ..Self::default()
        }
    }

    /// Pure reduction: Session + Delta -> Mutated Session
    pub fn reduce(&mut self, delta: StateDelta) {
        self.version += 1;

        match delta {
            StateDelta::SessionStarted { id, language } => {
                self.id = Some(id);
                self.language = language;
                self.recognition_language = language;
                self.captured = None;
            }
            StateDelta::PhaseChanged(phase) => {
                self.phase = phase;
            }
            StateDelta::LanguageSelected {
                language,
                recognition,
            } => {
                self.language = language;
                self.recognition_language = recognition;
            }
            StateDelta::NameCaptured(name) => {
                self.captured = Some(name);
            }
            StateDelta::NameDiscarded => {
                self.captured = None;
            }
            StateDelta::Reset { language } => {
                let version = self.version;
                *self = Self::new(language);
                self.version = version;
            }
        }
    }
}
