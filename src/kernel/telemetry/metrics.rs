use std::collections::VecDeque;

use super::event::{RecognitionEventKind, TelemetryEvent, UtteranceEventKind};
use crate::kernel::state::DialoguePhase;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TelemetrySnapshot {
    pub phase_stats: PhaseStats,
    pub utterance_stats: UtteranceStats,
    pub recognition_stats: RecognitionStats,
    pub stale_drops: u64,
    pub searches: u64,
    /// Recorded instants where both ports were busy. Must stay zero.
    pub overlap_instants: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhaseStats {
    pub transitions: u64,
    pub completed: u64,
    pub cancelled: u64,
    /// Phases entered, in order.
    pub path: Vec<DialoguePhase>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtteranceStats {
    pub requested: u64,
    pub ended: u64,
    pub failed: u64,
    pub watchdog_expired: u64,
    pub skipped: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecognitionStats {
    pub armed: u64,
    pub opened: u64,
    pub heard: u64,
    pub silent: u64,
    pub failed: u64,
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();

    for event in events {
        match event {
            TelemetryEvent::PhaseTransition { to, .. } => {
                snap.phase_stats.transitions += 1;
                snap.phase_stats.path.push(*to);
                match to {
                    DialoguePhase::Completed => snap.phase_stats.completed += 1,
                    DialoguePhase::Cancelled => snap.phase_stats.cancelled += 1,
                    _ => {}
                }
            }
            TelemetryEvent::Utterance { event, .. } => {
                let u = &mut snap.utterance_stats;
                match event {
                    UtteranceEventKind::Requested => u.requested += 1,
                    UtteranceEventKind::Started => {}
                    UtteranceEventKind::Ended => u.ended += 1,
                    UtteranceEventKind::Failed => u.failed += 1,
                    UtteranceEventKind::WatchdogExpired => u.watchdog_expired += 1,
                    UtteranceEventKind::Skipped => u.skipped += 1,
                }
            }
            TelemetryEvent::Recognition { event, .. } => {
                let r = &mut snap.recognition_stats;
                match event {
                    RecognitionEventKind::Armed => r.armed += 1,
                    RecognitionEventKind::Opened => r.opened += 1,
                    RecognitionEventKind::Heard => r.heard += 1,
                    RecognitionEventKind::Silent => r.silent += 1,
                    RecognitionEventKind::Failed => r.failed += 1,
                }
            }
            TelemetryEvent::StaleDropped { .. } => snap.stale_drops += 1,
            TelemetryEvent::PortState {
                speaking,
                listening,
            } => {
                if *speaking && *listening {
                    snap.overlap_instants += 1;
                }
            }
            TelemetryEvent::SearchInvoked => snap.searches += 1,
        }
    }

    snap
}
