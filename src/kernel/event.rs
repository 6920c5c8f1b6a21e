use serde::{Deserialize, Serialize};

use super::time::Generation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UtteranceId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttemptId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerId(pub u64);

/// Everything that can move the dialogue forward. All of it arrives on the
/// one driver queue.
#[derive(Debug, Clone)]
pub enum Event {
    /// UI requests
    Command(Command),
    /// Voice output engine callbacks
    Output(OutputEvent),
    /// Voice input engine callbacks
    Input(InputEvent),
    Timer(TimerEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    StartCheckIn,
    CancelCheckIn,
}

#[derive(Debug, Clone)]
pub struct OutputEvent {
    pub generation: Generation,
    pub utterance: UtteranceId,
    pub signal: OutputSignal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSignal {
    Started,
    Ended,
    Failed(String),
}

impl OutputSignal {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OutputSignal::Started)
    }
}

#[derive(Debug, Clone)]
pub struct InputEvent {
    pub generation: Generation,
    pub attempt: AttemptId,
    pub outcome: RecognitionOutcome,
}

/// Exactly one of these per recognition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionOutcome {
    Transcript(String),
    NoSpeech,
    Error(String),
}

impl RecognitionOutcome {
    /// The transcript, if anything but whitespace was heard.
    pub fn heard(&self) -> Option<&str> {
        match self {
            RecognitionOutcome::Transcript(text) if !text.trim().is_empty() => Some(text.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TimerEvent {
    pub generation: Generation,
    pub id: TimerId,
    pub kind: TimerKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Resume the current script.
    Continue,
    /// Give up waiting for an utterance's "ended" event.
    UtteranceWatchdog(UtteranceId),
    /// Recognition settle has elapsed; open the armed attempt.
    OpenRecognition(AttemptId),
}

// Helpers for building events in drivers and tests
impl Event {
    pub fn transcript(generation: Generation, attempt: AttemptId, text: &str) -> Self {
        Event::Input(InputEvent {
            generation,
            attempt,
            outcome: RecognitionOutcome::Transcript(text.to_string()),
        })
    }

    pub fn output(generation: Generation, utterance: UtteranceId, signal: OutputSignal) -> Self {
        Event::Output(OutputEvent {
            generation,
            utterance,
            signal,
        })
    }
}
