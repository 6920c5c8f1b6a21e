use serde::{Deserialize, Serialize};

use crate::kernel::event::{AttemptId, UtteranceId};
use crate::kernel::state::DialoguePhase;

// Allowed: IDs, Phases, Counts, Port flags
// Forbidden: Transcripts, Names, Prompt text

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TelemetryEvent {
    PhaseTransition {
        from: DialoguePhase,
        to: DialoguePhase,
    },

    Utterance {
        utterance: UtteranceId,
        event: UtteranceEventKind,
    },

    Recognition {
        attempt: AttemptId,
        event: RecognitionEventKind,
    },

    /// An event from an old generation or a superseded turn was ignored.
    StaleDropped {
        source: EventSource,
    },

    /// Port flags as observed by the driver after each step.
    PortState {
        speaking: bool,
        listening: bool,
    },

    SearchInvoked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UtteranceEventKind {
    Requested,
    Started,
    Ended,
    Failed,
    WatchdogExpired,
    /// Output unsupported; treated as already spoken.
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecognitionEventKind {
    Armed,
    Opened,
    Heard,
    Silent,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventSource {
    Output,
    Input,
    Timer,
}
