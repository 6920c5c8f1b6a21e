use super::phrases::PhraseBank;
use super::SupportedLanguage;

/// Maps a language-selection transcript to a supported language.
#[derive(Debug, Clone, Copy, Default)]
pub struct LanguageDetector {
    bank: PhraseBank,
}

impl LanguageDetector {
    pub fn new(bank: PhraseBank) -> Self {
        Self { bank }
    }

    /// First profile (declaration order) with a keyword in the transcript wins.
    pub fn detect(&self, transcript: &str) -> Option<SupportedLanguage> {
        let folded = transcript.trim().to_lowercase();
        if folded.is_empty() {
            return None;
        }
        self.bank
            .profiles()
            .find(|profile| {
                profile
                    .language_keywords
                    .iter()
                    .any(|keyword| folded.contains(keyword))
            })
            .map(|profile| profile.language)
    }
}
