use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

use super::event::{Command, Event, InputEvent, RecognitionOutcome, TimerEvent, TimerId};
use super::lease::{VoiceArbiter, VoiceLease};
use super::reactor::{Capabilities, Reactor};
use super::scheduler::SideEffect;
use super::state::DialoguePhase;
use super::telemetry::event::TelemetryEvent;
use super::telemetry::metrics::TelemetrySnapshot;
use crate::config::KioskConfig;
use crate::error::{Error, Result};
use crate::language::{CapturedName, PhraseBank, SupportedLanguage};
use crate::ports::{SpeechInputPort, SpeechOutputPort, SpeechRecognizer, SpeechSynthesizer};
use crate::services::{Appointment, AppointmentSearch};

const LEASE_OWNER: &str = "check-in";

/// What the kiosk UI renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInStatus {
    pub phase: DialoguePhase,
    pub selected_language: SupportedLanguage,
    pub is_listening: bool,
    pub is_speaking: bool,
    pub is_voice_supported: bool,
    pub captured_name: Option<CapturedName>,
    /// Last transcript heard, for on-screen echo.
    pub transcript: String,
}

/// Result of the one search call a confirmed check-in makes.
#[derive(Debug)]
pub struct SearchReport {
    pub session: Option<Uuid>,
    pub name: CapturedName,
    pub language: SupportedLanguage,
    pub outcome: Result<Vec<Appointment>>,
}

/// Cloneable UI-side handle to a running [`Driver`].
#[derive(Debug, Clone)]
pub struct CheckInHandle {
    tx: mpsc::UnboundedSender<Event>,
    status: watch::Receiver<CheckInStatus>,
}

impl CheckInHandle {
    /// # Errors
    ///
    /// `VoiceUnavailable` when the runtime has no recognizer, `ChannelClosed`
    /// when the driver has stopped
    pub fn start_check_in(&self) -> Result<()> {
        if !self.status.borrow().is_voice_supported {
            return Err(Error::VoiceUnavailable);
        }
        self.send(Command::StartCheckIn)
    }

    /// Safe in any phase, including idle.
    pub fn cancel_check_in(&self) -> Result<()> {
        self.send(Command::CancelCheckIn)
    }

    pub fn status(&self) -> CheckInStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CheckInStatus> {
        self.status.clone()
    }

    fn send(&self, command: Command) -> Result<()> {
        self.tx
            .send(Event::Command(command))
            .map_err(|_| Error::ChannelClosed)
    }
}

/// Owns the reactor and both voice ports; executes side effects.
///
/// Every engine callback, timer and UI command arrives on one queue, so the
/// reactor only ever sees one event at a time.
pub struct Driver {
    reactor: Reactor,
    receiver: mpsc::UnboundedReceiver<Event>,
    tx: mpsc::UnboundedSender<Event>,
    output: SpeechOutputPort,
    input: SpeechInputPort,
    search: Arc<dyn AppointmentSearch>,
    results: Option<mpsc::UnboundedSender<SearchReport>>,
    arbiter: VoiceArbiter,
    lease: Option<VoiceLease>,
    timers: HashMap<TimerId, JoinHandle<()>>,
    status: watch::Sender<CheckInStatus>,
    ports: (bool, bool),
}

impl Driver {
    pub fn new(
        config: &KioskConfig,
        synthesizer: Box<dyn SpeechSynthesizer>,
        recognizer: Box<dyn SpeechRecognizer>,
        search: Arc<dyn AppointmentSearch>,
        arbiter: VoiceArbiter,
    ) -> (Self, CheckInHandle) {
        let (tx, receiver) = mpsc::unbounded_channel();

        let policy = config.policy();
        let recognition_tag = PhraseBank::new().lookup(policy.default_language).voice_tag;
        let output = SpeechOutputPort::new(synthesizer, tx.clone());
        let input = SpeechInputPort::new(recognizer, tx.clone(), recognition_tag);
        let capabilities = Capabilities {
            output: output.is_supported(),
            input: input.is_supported(),
        };
        if !capabilities.output {
            warn!("No voice output engine; prompts will be skipped");
        }

        let reactor = Reactor::new(policy, config.timing(), capabilities);
        let initial = CheckInStatus {
            phase: reactor.phase(),
            selected_language: reactor.session.language,
            is_listening: false,
            is_speaking: false,
            is_voice_supported: capabilities.input,
            captured_name: None,
            transcript: String::new(),
        };
        let (status, status_rx) = watch::channel(initial);

        let handle = CheckInHandle {
            tx: tx.clone(),
            status: status_rx,
        };
        let driver = Self {
            reactor,
            receiver,
            tx,
            output,
            input,
            search,
            results: None,
            arbiter,
            lease: None,
            timers: HashMap::new(),
            status,
            ports: (false, false),
        };
        (driver, handle)
    }

    /// Forward search outcomes, e.g. to an announcer.
    pub fn with_results(mut self, results: mpsc::UnboundedSender<SearchReport>) -> Self {
        self.results = Some(results);
        self
    }

    /// Runs until `shutdown` fires. Returns the session telemetry.
    pub async fn run(mut self, shutdown: CancellationToken) -> TelemetrySnapshot {
        info!("Check-in driver running");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                event = self.receiver.recv() => match event {
                    Some(event) => self.handle(event),
                    None => break,
                },
            }
        }
        self.teardown();
        let snapshot = self.reactor.telemetry.snapshot();
        info!(
            completed = snapshot.phase_stats.completed,
            cancelled = snapshot.phase_stats.cancelled,
            stale_drops = snapshot.stale_drops,
            "Check-in driver stopped"
        );
        snapshot
    }

    fn handle(&mut self, event: Event) {
        let span = info_span!("check_in", session = ?self.reactor.session.id);
        let _enter = span.enter();

        match &event {
            Event::Command(Command::StartCheckIn) => {
                if !self.admit_start() {
                    self.publish();
                    return;
                }
            }
            Event::Output(ev) => self.output.observe(ev),
            Event::Input(ev) => self.input.observe(ev),
            Event::Timer(ev) => {
                self.timers.remove(&ev.id);
            }
            Event::Command(Command::CancelCheckIn) => {}
        }

        let effects = self.reactor.step(event);
        for effect in effects {
            self.apply(effect);
        }
        self.record_ports();
        self.publish();
    }

    /// Takes the voice lease for a new session. A start while a session is
    /// running is passed through; the reactor ignores it.
    fn admit_start(&mut self) -> bool {
        if !self.input.is_supported() {
            warn!("Check-in start rejected: voice input unavailable");
            return false;
        }
        if self.lease.is_some() {
            return true;
        }
        match self.arbiter.try_acquire(LEASE_OWNER) {
            Ok(lease) => {
                self.lease = Some(lease);
                true
            }
            Err(e) => {
                warn!("Check-in start rejected: {}", e);
                false
            }
        }
    }

    fn apply(&mut self, effect: SideEffect) {
        debug!("Effect {:?}", effect);
        match effect {
            SideEffect::Speak {
                generation,
                utterance,
                text,
                voice_tag,
            } => self.output.speak(&text, voice_tag, generation, utterance),
            SideEffect::StopSpeaking => self.output.stop(),
            SideEffect::SetRecognitionLanguage(tag) => self.input.set_language(tag),
            SideEffect::ArmRecognition {
                generation,
                attempt,
            } => self.input.start(generation, attempt),
            SideEffect::OpenRecognition {
                generation,
                attempt,
            } => {
                if let Err(e) = self.input.open(attempt) {
                    // Report through the queue so the turn still resolves.
                    warn!(attempt = attempt.0, "Could not start recognition: {}", e);
                    let _ = self.tx.send(Event::Input(InputEvent {
                        generation,
                        attempt,
                        outcome: RecognitionOutcome::Error(e.to_string()),
                    }));
                }
            }
            SideEffect::StopListening => self.input.stop(),
            SideEffect::Schedule {
                id,
                generation,
                after,
                kind,
            } => {
                let tx = self.tx.clone();
                let task = tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    let _ = tx.send(Event::Timer(TimerEvent {
                        generation,
                        id,
                        kind,
                    }));
                });
                self.timers.insert(id, task);
            }
            SideEffect::CancelTimer(id) => {
                if let Some(task) = self.timers.remove(&id) {
                    task.abort();
                }
            }
            SideEffect::ClearTimers => self.clear_timers(),
            SideEffect::Search(name) => self.spawn_search(name),
            SideEffect::Release => {
                self.output.stop();
                self.input.stop();
                self.input.reset_transcript();
                self.lease = None;
            }
            SideEffect::Log(message) => info!("{}", message),
        }
    }

    fn spawn_search(&self, name: CapturedName) {
        let search = Arc::clone(&self.search);
        let results = self.results.clone();
        let session = self.reactor.session.id;
        let language = self.reactor.session.language;
        tokio::spawn(async move {
            let outcome = search.search(&name).await;
            match &outcome {
                Ok(found) => info!(count = found.len(), "Appointment search finished"),
                Err(e) => warn!("Appointment search failed: {}", e),
            }
            if let Some(results) = results {
                let _ = results.send(SearchReport {
                    session,
                    name,
                    language,
                    outcome,
                });
            }
        });
    }

    fn clear_timers(&mut self) {
        for (_, task) in self.timers.drain() {
            task.abort();
        }
    }

    fn record_ports(&mut self) {
        let ports = (self.output.is_speaking(), self.input.is_listening());
        if ports != self.ports {
            self.ports = ports;
            self.reactor.telemetry.record(TelemetryEvent::PortState {
                speaking: ports.0,
                listening: ports.1,
            });
        }
    }

    fn publish(&self) {
        let session = &self.reactor.session;
        self.status.send_replace(CheckInStatus {
            phase: session.phase,
            selected_language: session.language,
            is_listening: self.input.is_listening(),
            is_speaking: self.output.is_speaking(),
            is_voice_supported: self.input.is_supported(),
            captured_name: session.captured.clone(),
            transcript: self.input.transcript().to_string(),
        });
    }

    fn teardown(&mut self) {
        self.clear_timers();
        self.output.stop();
        self.input.stop();
        self.lease = None;
        self.publish();
    }
}
