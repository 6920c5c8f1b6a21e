use std::collections::VecDeque;
use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::cancel::CancellationRegistry;
use super::event::{
    AttemptId, Command, Event, InputEvent, OutputEvent, OutputSignal, RecognitionOutcome,
    TimerEvent, TimerId, TimerKind, UtteranceId,
};
use super::scheduler::{Cue, DialogueAct, Scheduler, SideEffect};
use super::state::{DialoguePhase, DialogueSession, StateDelta};
use super::telemetry::event::{
    EventSource, RecognitionEventKind, TelemetryEvent, UtteranceEventKind,
};
use super::telemetry::recorder::TelemetryRecorder;
use super::time::DialogueTiming;
use crate::language::{
    classify_confirmation, read_name, Confirmation, LanguageDetector, LanguageProfile,
    NameReading, PhraseBank, SupportedLanguage,
};

/// Which engines this runtime actually has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub output: bool,
    pub input: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            output: true,
            input: true,
        }
    }
}

/// Language policy for the dialogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialoguePolicy {
    pub default_language: SupportedLanguage,
    /// Languages whose recognition falls back to `default_language`.
    pub reduced_support: Vec<SupportedLanguage>,
}

impl Default for DialoguePolicy {
    fn default() -> Self {
        Self {
            default_language: SupportedLanguage::En,
            reduced_support: vec![SupportedLanguage::Zh],
        }
    }
}

/// The one thing the dialogue is currently waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Awaiting {
    Nothing,
    Utterance {
        id: UtteranceId,
        watchdog: TimerId,
        settle: Duration,
    },
    Timer(TimerId),
    Recognition(AttemptId),
}

/// The check-in dialogue state machine.
///
/// `step` is pure with respect to the outside world: it never awaits and
/// never touches an engine. It returns the effects the driver must perform.
pub struct Reactor {
    pub session: DialogueSession,
    pub scheduler: Scheduler,
    pub cancel_registry: CancellationRegistry,
    pub telemetry: TelemetryRecorder,
    bank: PhraseBank,
    detector: LanguageDetector,
    policy: DialoguePolicy,
    capabilities: Capabilities,
    script: VecDeque<Cue>,
    awaiting: Awaiting,
    next_utterance: u64,
    next_attempt: u64,
    next_timer: u64,
}

impl Reactor {
    pub fn new(policy: DialoguePolicy, timing: DialogueTiming, capabilities: Capabilities) -> Self {
        let bank = PhraseBank::new();
        Self {
            session: DialogueSession::new(policy.default_language),
            scheduler: Scheduler::new(bank, timing),
            cancel_registry: CancellationRegistry::new(),
            telemetry: TelemetryRecorder::new(),
            bank,
            detector: LanguageDetector::new(bank),
            policy,
            capabilities,
            script: VecDeque::new(),
            awaiting: Awaiting::Nothing,
            next_utterance: 0,
            next_attempt: 0,
            next_timer: 0,
        }
    }

    pub fn phase(&self) -> DialoguePhase {
        self.session.phase
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// True while an utterance, timer or recognition attempt is outstanding.
    /// An active session with nothing pending is a stuck conversation.
    pub fn has_pending_turn(&self) -> bool {
        self.awaiting != Awaiting::Nothing
    }

    /// The attempt currently listened for, if any.
    pub fn awaited_attempt(&self) -> Option<AttemptId> {
        match self.awaiting {
            Awaiting::Recognition(attempt) => Some(attempt),
            _ => None,
        }
    }

    /// The utterance currently spoken, if any.
    pub fn awaited_utterance(&self) -> Option<UtteranceId> {
        match self.awaiting {
            Awaiting::Utterance { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Process one event. Returns the side effects to be executed by the driver.
    pub fn step(&mut self, event: Event) -> Vec<SideEffect> {
        let mut effects = Vec::new();
        match event {
            Event::Command(Command::StartCheckIn) => self.start_check_in(&mut effects),
            Event::Command(Command::CancelCheckIn) => self.cancel_check_in(&mut effects),
            Event::Output(ev) => self.on_output(ev, &mut effects),
            Event::Input(ev) => self.on_input(ev, &mut effects),
            Event::Timer(ev) => self.on_timer(ev, &mut effects),
        }
        effects
    }

    // === Commands ===

    fn start_check_in(&mut self, effects: &mut Vec<SideEffect>) {
        if !self.capabilities.input {
            warn!("Check-in requested but voice input is unavailable");
            effects.push(SideEffect::Log("voice unavailable".to_string()));
            return;
        }
        if self.session.phase.is_active() {
            debug!("Check-in already running in {:?}; ignoring start", self.session.phase);
            return;
        }

        let generation = self.cancel_registry.invalidate();
        self.script.clear();
        self.awaiting = Awaiting::Nothing;

        let id = Uuid::new_v4();
        let language = self.policy.default_language;
        self.session.reduce(StateDelta::SessionStarted { id, language });
        info!(session = %id, epoch = generation.epoch, "Check-in session started");

        effects.push(SideEffect::SetRecognitionLanguage(self.bank.lookup(language).voice_tag));
        self.transition(DialoguePhase::SelectingLanguage);
        self.perform(DialogueAct::OfferLanguages, effects);
    }

    fn cancel_check_in(&mut self, effects: &mut Vec<SideEffect>) {
        let was = self.session.phase;

        // Ports are stopped whatever the phase; stopping idle ports is a no-op.
        effects.push(SideEffect::StopSpeaking);
        effects.push(SideEffect::StopListening);
        effects.push(SideEffect::ClearTimers);
        effects.push(SideEffect::Release);

        self.cancel_registry.invalidate();
        self.script.clear();
        self.awaiting = Awaiting::Nothing;

        if was.is_active() {
            info!(session = ?self.session.id, "Check-in cancelled in {:?}", was);
            self.transition(DialoguePhase::Cancelled);
        }
        self.session.reduce(StateDelta::Reset {
            language: self.policy.default_language,
        });
        if was != DialoguePhase::Idle {
            self.telemetry.record(TelemetryEvent::PhaseTransition {
                from: if was.is_active() { DialoguePhase::Cancelled } else { was },
                to: DialoguePhase::Idle,
            });
        }
    }

    // === Engine callbacks ===

    fn on_output(&mut self, ev: OutputEvent, effects: &mut Vec<SideEffect>) {
        if !self.cancel_registry.is_current(ev.generation) {
            self.drop_stale(EventSource::Output);
            return;
        }
        let Awaiting::Utterance { id, watchdog, settle } = self.awaiting else {
            self.drop_stale(EventSource::Output);
            return;
        };
        if id != ev.utterance {
            self.drop_stale(EventSource::Output);
            return;
        }

        match ev.signal {
            OutputSignal::Started => {
                self.record_utterance(id, UtteranceEventKind::Started);
            }
            OutputSignal::Ended => {
                self.record_utterance(id, UtteranceEventKind::Ended);
                self.cancel_registry.disarm(watchdog);
                effects.push(SideEffect::CancelTimer(watchdog));
                self.settle_then_advance(settle, effects);
            }
            OutputSignal::Failed(reason) => {
                // A failed prompt counts as spoken; the turn still has to end in a listen.
                warn!(utterance = id.0, "Utterance failed: {}", reason);
                self.record_utterance(id, UtteranceEventKind::Failed);
                self.cancel_registry.disarm(watchdog);
                effects.push(SideEffect::CancelTimer(watchdog));
                self.settle_then_advance(settle, effects);
            }
        }
    }

    fn on_timer(&mut self, ev: TimerEvent, effects: &mut Vec<SideEffect>) {
        if !self.cancel_registry.admit(&ev) {
            self.drop_stale(EventSource::Timer);
            return;
        }

        match (ev.kind, self.awaiting) {
            (TimerKind::Continue, Awaiting::Timer(id)) if id == ev.id => {
                self.awaiting = Awaiting::Nothing;
                self.advance(effects);
            }
            (TimerKind::UtteranceWatchdog(utterance), Awaiting::Utterance { id, settle, .. })
                if id == utterance =>
            {
                warn!(utterance = id.0, "No end-of-utterance signal; assuming speech finished");
                self.record_utterance(id, UtteranceEventKind::WatchdogExpired);
                effects.push(SideEffect::StopSpeaking);
                self.settle_then_advance(settle, effects);
            }
            (TimerKind::OpenRecognition(attempt), Awaiting::Timer(id)) if id == ev.id => {
                self.telemetry.record(TelemetryEvent::Recognition {
                    attempt,
                    event: RecognitionEventKind::Opened,
                });
                effects.push(SideEffect::OpenRecognition {
                    generation: self.cancel_registry.generation(),
                    attempt,
                });
                self.awaiting = Awaiting::Recognition(attempt);
            }
            _ => self.drop_stale(EventSource::Timer),
        }
    }

    fn on_input(&mut self, ev: InputEvent, effects: &mut Vec<SideEffect>) {
        if !self.cancel_registry.is_current(ev.generation)
            || self.awaiting != Awaiting::Recognition(ev.attempt)
        {
            self.drop_stale(EventSource::Input);
            return;
        }
        self.awaiting = Awaiting::Nothing;

        let kind = match &ev.outcome {
            RecognitionOutcome::Transcript(_) if ev.outcome.heard().is_some() => {
                RecognitionEventKind::Heard
            }
            RecognitionOutcome::Error(reason) => {
                warn!(attempt = ev.attempt.0, "Recognition error: {}", reason);
                RecognitionEventKind::Failed
            }
            _ => RecognitionEventKind::Silent,
        };
        self.telemetry.record(TelemetryEvent::Recognition {
            attempt: ev.attempt,
            event: kind,
        });

        let heard = ev.outcome.heard();
        let failed = kind == RecognitionEventKind::Failed;
        match self.session.phase {
            DialoguePhase::SelectingLanguage => self.interpret_language(heard, effects),
            DialoguePhase::AwaitingName => self.interpret_name(heard, failed, effects),
            DialoguePhase::ConfirmingName => self.interpret_confirmation(heard, failed, effects),
            other => debug!("Recognition result in {:?} ignored", other),
        }
    }

    // === Interpretation ===

    fn interpret_language(&mut self, heard: Option<&str>, effects: &mut Vec<SideEffect>) {
        // Errors and silence are handled like an unmatched transcript here.
        let Some(language) = heard.and_then(|t| self.detector.detect(t)) else {
            debug!("No language recognised");
            self.perform(DialogueAct::LanguageNotUnderstood, effects);
            return;
        };

        let reduced_support = self.policy.reduced_support.contains(&language);
        let recognition = if reduced_support {
            self.policy.default_language
        } else {
            language
        };
        info!(
            language = %language,
            recognition = %recognition,
            "Language selected"
        );
        self.session.reduce(StateDelta::LanguageSelected {
            language,
            recognition,
        });
        effects.push(SideEffect::SetRecognitionLanguage(
            self.bank.lookup(recognition).voice_tag,
        ));
        self.transition(DialoguePhase::AwaitingName);
        self.perform(DialogueAct::AskName { reduced_support }, effects);
    }

    /// Silence re-listens quietly. A recognizer error is answered with the
    /// name prompt so a failing engine cannot re-arm in a silent loop.
    fn interpret_name(&mut self, heard: Option<&str>, failed: bool, effects: &mut Vec<SideEffect>) {
        match heard.map(read_name) {
            Some(NameReading::Full(name)) => {
                self.session.reduce(StateDelta::NameCaptured(name.clone()));
                self.transition(DialoguePhase::ConfirmingName);
                self.perform(DialogueAct::ConfirmName(name), effects);
            }
            Some(NameReading::Single(_)) => self.perform(DialogueAct::OnlyOneName, effects),
            None if failed => self.perform(DialogueAct::RepeatNamePrompt, effects),
            Some(NameReading::Empty) | None => self.perform(DialogueAct::ListenQuietly, effects),
        }
    }

    fn interpret_confirmation(
        &mut self,
        heard: Option<&str>,
        failed: bool,
        effects: &mut Vec<SideEffect>,
    ) {
        let Some(transcript) = heard else {
            let act = if failed {
                DialogueAct::AskYesNo
            } else {
                DialogueAct::ListenQuietly
            };
            self.perform(act, effects);
            return;
        };
        let Some(name) = self.session.captured.clone() else {
            // Nothing to confirm; go back and ask for the name again.
            self.transition(DialoguePhase::AwaitingName);
            self.perform(DialogueAct::TryAgain, effects);
            return;
        };

        let mut verdict = classify_confirmation(transcript, self.profile());
        if verdict == Confirmation::Ambiguous
            && self.session.recognition_language != self.session.language
        {
            // A fallback recognizer hears answers in its own language.
            verdict = classify_confirmation(
                transcript,
                self.bank.lookup(self.session.recognition_language),
            );
        }

        match verdict {
            Confirmation::Positive => {
                info!(session = ?self.session.id, "Name confirmed");
                self.perform(DialogueAct::Search(name), effects);
            }
            Confirmation::Negative => {
                self.session.reduce(StateDelta::NameDiscarded);
                self.transition(DialoguePhase::AwaitingName);
                self.perform(DialogueAct::TryAgain, effects);
            }
            Confirmation::Ambiguous => self.perform(DialogueAct::AskYesNo, effects),
        }
    }

    // === Script execution ===

    fn perform(&mut self, act: DialogueAct, effects: &mut Vec<SideEffect>) {
        debug!("Dialogue act {:?}", act);
        self.script = self.scheduler.script(act, self.profile());
        self.awaiting = Awaiting::Nothing;
        self.advance(effects);
    }

    /// Runs cues until one has to wait on an engine or a timer.
    fn advance(&mut self, effects: &mut Vec<SideEffect>) {
        while let Some(cue) = self.script.pop_front() {
            match cue {
                Cue::Say {
                    text,
                    voice_tag,
                    settle,
                } => {
                    let id = self.next_utterance_id();
                    if !self.capabilities.output {
                        self.record_utterance(id, UtteranceEventKind::Skipped);
                        if !settle.is_zero() {
                            self.wait(settle, TimerKind::Continue, effects);
                            return;
                        }
                        continue;
                    }
                    let watchdog_after = self.scheduler.timing().watchdog_for(&text);
                    let watchdog = self.schedule(
                        watchdog_after,
                        TimerKind::UtteranceWatchdog(id),
                        effects,
                    );
                    self.record_utterance(id, UtteranceEventKind::Requested);
                    effects.push(SideEffect::Speak {
                        generation: self.cancel_registry.generation(),
                        utterance: id,
                        text,
                        voice_tag,
                    });
                    self.awaiting = Awaiting::Utterance {
                        id,
                        watchdog,
                        settle,
                    };
                    return;
                }
                Cue::Pause(after) => {
                    self.wait(after, TimerKind::Continue, effects);
                    return;
                }
                Cue::Listen => {
                    let attempt = self.next_attempt_id();
                    self.telemetry.record(TelemetryEvent::Recognition {
                        attempt,
                        event: RecognitionEventKind::Armed,
                    });
                    effects.push(SideEffect::ArmRecognition {
                        generation: self.cancel_registry.generation(),
                        attempt,
                    });
                    let settle = self.scheduler.timing().recognition_settle;
                    self.wait(settle, TimerKind::OpenRecognition(attempt), effects);
                    return;
                }
                Cue::Search(name) => {
                    self.telemetry.record(TelemetryEvent::SearchInvoked);
                    effects.push(SideEffect::Search(name));
                }
                Cue::Finish => {
                    self.finish(effects);
                    return;
                }
            }
        }
        self.awaiting = Awaiting::Nothing;
    }

    fn settle_then_advance(&mut self, settle: Duration, effects: &mut Vec<SideEffect>) {
        self.awaiting = Awaiting::Nothing;
        if settle.is_zero() {
            self.advance(effects);
        } else {
            self.wait(settle, TimerKind::Continue, effects);
        }
    }

    fn finish(&mut self, effects: &mut Vec<SideEffect>) {
        info!(session = ?self.session.id, "Check-in voice flow complete");
        effects.push(SideEffect::StopListening);
        effects.push(SideEffect::ClearTimers);
        effects.push(SideEffect::Release);
        // Nothing from this session may land after completion.
        self.cancel_registry.invalidate();
        self.script.clear();
        self.awaiting = Awaiting::Nothing;
        self.transition(DialoguePhase::Completed);
        // The search already has its copy of the name.
        self.session.reduce(StateDelta::NameDiscarded);
    }

    // === Helpers ===

    fn wait(&mut self, after: Duration, kind: TimerKind, effects: &mut Vec<SideEffect>) {
        let id = self.schedule(after, kind, effects);
        self.awaiting = Awaiting::Timer(id);
    }

    fn schedule(&mut self, after: Duration, kind: TimerKind, effects: &mut Vec<SideEffect>) -> TimerId {
        self.next_timer += 1;
        let id = TimerId(self.next_timer);
        self.cancel_registry.arm(id);
        effects.push(SideEffect::Schedule {
            id,
            generation: self.cancel_registry.generation(),
            after,
            kind,
        });
        id
    }

    fn transition(&mut self, to: DialoguePhase) {
        let from = self.session.phase;
        if from == to {
            return;
        }
        info!("Phase {:?} -> {:?}", from, to);
        self.session.reduce(StateDelta::PhaseChanged(to));
        self.telemetry.record(TelemetryEvent::PhaseTransition { from, to });
    }

    fn profile(&self) -> &'static LanguageProfile {
        self.bank.lookup(self.session.language)
    }

    fn next_utterance_id(&mut self) -> UtteranceId {
        self.next_utterance += 1;
        UtteranceId(self.next_utterance)
    }

    fn next_attempt_id(&mut self) -> AttemptId {
        self.next_attempt += 1;
        AttemptId(self.next_attempt)
    }

    fn record_utterance(&mut self, utterance: UtteranceId, event: UtteranceEventKind) {
        self.telemetry.record(TelemetryEvent::Utterance { utterance, event });
    }

    fn drop_stale(&mut self, source: EventSource) {
        debug!("Dropped stale {:?} event", source);
        self.telemetry.record(TelemetryEvent::StaleDropped { source });
    }
}
