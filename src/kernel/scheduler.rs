use std::collections::VecDeque;
use std::time::Duration;

use super::event::{AttemptId, TimerId, TimerKind, UtteranceId};
use super::time::{DialogueTiming, Generation};
use crate::language::{CapturedName, LanguageProfile, PhraseBank};

/// What the dialogue wants to do next, before it is broken into turns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogueAct {
    OfferLanguages,
    LanguageNotUnderstood,
    AskName { reduced_support: bool },
    OnlyOneName,
    /// The recognizer failed while waiting for a name.
    RepeatNamePrompt,
    ConfirmName(CapturedName),
    TryAgain,
    AskYesNo,
    Search(CapturedName),
    /// Re-arm the recognizer without saying anything.
    ListenQuietly,
}

/// One step of a turn script. Scripts run strictly in order; a cue only
/// starts once the previous one has finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cue {
    Say {
        text: String,
        voice_tag: &'static str,
        /// Wait after "ended" before the next cue.
        settle: Duration,
    },
    Pause(Duration),
    Listen,
    Search(CapturedName),
    Finish,
}

/// Instructions for the driver. The reactor never touches an engine itself.
#[derive(Debug, Clone, PartialEq)]
pub enum SideEffect {
    Speak {
        generation: Generation,
        utterance: UtteranceId,
        text: String,
        voice_tag: &'static str,
    },
    StopSpeaking,
    SetRecognitionLanguage(&'static str),
    /// Input port `start()`: drop any stale attempt and arm a new one.
    ArmRecognition {
        generation: Generation,
        attempt: AttemptId,
    },
    /// Open the armed attempt once the settle delay has passed.
    OpenRecognition {
        generation: Generation,
        attempt: AttemptId,
    },
    StopListening,
    Schedule {
        id: TimerId,
        generation: Generation,
        after: Duration,
        kind: TimerKind,
    },
    CancelTimer(TimerId),
    ClearTimers,
    Search(CapturedName),
    /// Session is over; stop both ports and give up the voice lease.
    Release,
    Log(String),
}

pub struct Scheduler {
    bank: PhraseBank,
    timing: DialogueTiming,
}

impl Scheduler {
    pub fn new(bank: PhraseBank, timing: DialogueTiming) -> Self {
        Self { bank, timing }
    }

    pub fn timing(&self) -> &DialogueTiming {
        &self.timing
    }

    /// Pure projection: Act + Language -> turn script
    pub fn script(&self, act: DialogueAct, profile: &LanguageProfile) -> VecDeque<Cue> {
        let t = &self.timing;
        let say = |text: &str, settle: Duration| Cue::Say {
            text: text.to_string(),
            voice_tag: profile.voice_tag,
            settle,
        };

        let mut cues = VecDeque::new();
        match act {
            DialogueAct::OfferLanguages => {
                // One utterance per language; the engine only holds one at a time.
                let profiles: Vec<_> = self.bank.profiles().collect();
                for (idx, p) in profiles.iter().enumerate() {
                    let settle = if idx + 1 == profiles.len() {
                        t.speech_settle
                    } else {
                        t.prompt_gap
                    };
                    cues.push_back(Cue::Say {
                        text: p.language_prompt.to_string(),
                        voice_tag: p.voice_tag,
                        settle,
                    });
                }
                cues.push_back(Cue::Listen);
            }
            DialogueAct::LanguageNotUnderstood => {
                cues.push_back(say(profile.language_not_understood, t.speech_settle));
                cues.push_back(Cue::Listen);
            }
            DialogueAct::AskName { reduced_support } => {
                if reduced_support {
                    cues.push_back(say(profile.reduced_support_notice, t.prompt_gap));
                }
                cues.push_back(say(profile.name_prompt, t.speech_settle));
                cues.push_back(Cue::Listen);
            }
            DialogueAct::RepeatNamePrompt => {
                cues.push_back(say(profile.name_prompt, t.speech_settle));
                cues.push_back(Cue::Listen);
            }
            DialogueAct::OnlyOneName => {
                cues.push_back(say(profile.only_one_name, t.speech_settle));
                cues.push_back(Cue::Listen);
            }
            DialogueAct::ConfirmName(name) => {
                cues.push_back(say(&profile.confirmation_prompt(&name), t.confirmation_settle));
                cues.push_back(Cue::Listen);
            }
            DialogueAct::TryAgain => {
                cues.push_back(say(profile.try_again, t.speech_settle));
                cues.push_back(Cue::Listen);
            }
            DialogueAct::AskYesNo => {
                cues.push_back(say(profile.did_not_catch, t.speech_settle));
                cues.push_back(Cue::Listen);
            }
            DialogueAct::Search(name) => {
                cues.push_back(say(profile.searching, Duration::ZERO));
                cues.push_back(Cue::Search(name));
                cues.push_back(Cue::Pause(t.search_settle));
                cues.push_back(Cue::Finish);
            }
            DialogueAct::ListenQuietly => {
                cues.push_back(Cue::Pause(t.silence_rearm));
                cues.push_back(Cue::Listen);
            }
        }
        cues
    }
}
