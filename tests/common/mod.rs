#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use kiosk_voice::config::KioskConfig;
use kiosk_voice::kernel::event::{Event, InputEvent, OutputSignal, RecognitionOutcome, TimerEvent, TimerKind};
use kiosk_voice::kernel::reactor::{Capabilities, DialoguePolicy, Reactor};
use kiosk_voice::kernel::scheduler::SideEffect;
use kiosk_voice::kernel::telemetry::metrics::TelemetrySnapshot;
use kiosk_voice::kernel::time::DialogueTiming;
use kiosk_voice::language::CapturedName;
use kiosk_voice::ports::{InputSink, OutputSink, SpeechRecognizer, SpeechSynthesizer};
use kiosk_voice::services::{Appointment, AppointmentSearch};
use kiosk_voice::{CheckInHandle, CheckInStatus, DialoguePhase, Driver, VoiceArbiter};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

// === Pure reactor harness ===

/// Plays perfect engines around a bare reactor: every utterance ends at once
/// and every timer except the utterance watchdog fires in order.
pub struct Harness {
    pub reactor: Reactor,
    pub effects: Vec<SideEffect>,
    queue: VecDeque<Event>,
    /// Leave utterances hanging instead of ending them.
    pub mute_endings: bool,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_capabilities(Capabilities::default())
    }

    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        Self::from_reactor(Reactor::new(
            DialoguePolicy::default(),
            DialogueTiming::default(),
            capabilities,
        ))
    }

    pub fn from_reactor(reactor: Reactor) -> Self {
        Self {
            reactor,
            effects: Vec::new(),
            queue: VecDeque::new(),
            mute_endings: false,
        }
    }

    pub fn send(&mut self, event: Event) {
        self.queue.push_back(event);
        while let Some(event) = self.queue.pop_front() {
            let effects = self.reactor.step(event);
            for effect in &effects {
                match effect {
                    SideEffect::Speak {
                        generation,
                        utterance,
                        ..
                    } if !self.mute_endings => {
                        self.queue
                            .push_back(Event::output(*generation, *utterance, OutputSignal::Ended));
                    }
                    SideEffect::Schedule {
                        id,
                        generation,
                        kind,
                        ..
                    } if !matches!(kind, TimerKind::UtteranceWatchdog(_)) => {
                        self.queue.push_back(Event::Timer(TimerEvent {
                            generation: *generation,
                            id: *id,
                            kind: *kind,
                        }));
                    }
                    _ => {}
                }
            }
            self.effects.extend(effects);
        }
    }

    pub fn start(&mut self) {
        self.send(Event::Command(kiosk_voice::kernel::event::Command::StartCheckIn));
    }

    pub fn cancel(&mut self) {
        self.send(Event::Command(kiosk_voice::kernel::event::Command::CancelCheckIn));
    }

    /// Answers the attempt the reactor is listening for.
    pub fn say(&mut self, text: &str) {
        self.answer(RecognitionOutcome::Transcript(text.to_string()));
    }

    pub fn answer(&mut self, outcome: RecognitionOutcome) {
        let attempt = self
            .reactor
            .awaited_attempt()
            .expect("reactor is not listening");
        let generation = self.reactor.cancel_registry.generation();
        self.send(Event::Input(InputEvent {
            generation,
            attempt,
            outcome,
        }));
    }

    pub fn spoken(&self) -> Vec<&str> {
        self.effects
            .iter()
            .filter_map(|e| match e {
                SideEffect::Speak { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn voices(&self) -> Vec<&'static str> {
        self.effects
            .iter()
            .filter_map(|e| match e {
                SideEffect::Speak { voice_tag, .. } => Some(*voice_tag),
                _ => None,
            })
            .collect()
    }

    pub fn searches(&self) -> Vec<&CapturedName> {
        self.effects
            .iter()
            .filter_map(|e| match e {
                SideEffect::Search(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    pub fn recognition_languages(&self) -> Vec<&'static str> {
        self.effects
            .iter()
            .filter_map(|e| match e {
                SideEffect::SetRecognitionLanguage(tag) => Some(*tag),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }
}

// === Fake engines ===

/// Shared "is the speaker busy" flag, checked by the fake recognizer.
#[derive(Clone, Default)]
pub struct Speaker {
    busy: Arc<AtomicBool>,
    pub lines: Arc<Mutex<Vec<(String, String)>>>,
}

impl Speaker {
    pub fn lines(&self) -> Vec<(String, String)> {
        self.lines.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.lines.lock().unwrap().len()
    }
}

pub struct FakeSynthesizer {
    speaker: Speaker,
    ms_per_char: u64,
    /// Never report "ended"
    hang: bool,
    task: Option<JoinHandle<()>>,
}

impl FakeSynthesizer {
    pub fn new(speaker: Speaker) -> Self {
        Self {
            speaker,
            ms_per_char: 10,
            hang: false,
            task: None,
        }
    }

    pub fn hanging(speaker: Speaker) -> Self {
        Self {
            hang: true,
            ..Self::new(speaker)
        }
    }
}

impl SpeechSynthesizer for FakeSynthesizer {
    fn speak(&mut self, text: &str, voice_tag: &str, sink: OutputSink) {
        self.cancel();
        self.speaker
            .lines
            .lock()
            .unwrap()
            .push((voice_tag.to_string(), text.to_string()));
        self.speaker.busy.store(true, Ordering::SeqCst);

        let busy = Arc::clone(&self.speaker.busy);
        let duration = Duration::from_millis(text.chars().count() as u64 * self.ms_per_char);
        let hang = self.hang;
        self.task = Some(tokio::spawn(async move {
            sink.started();
            if hang {
                std::future::pending::<()>().await;
            }
            tokio::time::sleep(duration).await;
            busy.store(false, Ordering::SeqCst);
            sink.ended();
        }));
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.speaker.busy.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone)]
pub enum Answer {
    Heard(String),
    Silence,
    Fail,
}

pub fn heard(text: &str) -> Answer {
    Answer::Heard(text.to_string())
}

#[derive(Clone, Default)]
pub struct Microphone {
    answers: Arc<Mutex<VecDeque<Answer>>>,
    pub languages: Arc<Mutex<Vec<String>>>,
    pub starts: Arc<AtomicUsize>,
    pub aborts: Arc<AtomicUsize>,
    /// Attempts opened while the speaker was busy.
    pub overlaps: Arc<AtomicUsize>,
}

impl Microphone {
    pub fn scripted(answers: Vec<Answer>) -> Self {
        Self {
            answers: Arc::new(Mutex::new(answers.into())),
            ..Self::default()
        }
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn overlaps(&self) -> usize {
        self.overlaps.load(Ordering::SeqCst)
    }

    pub fn languages(&self) -> Vec<String> {
        self.languages.lock().unwrap().clone()
    }
}

/// Answers each attempt from a script after 200ms. Once the script runs
/// out it keeps listening forever.
pub struct FakeRecognizer {
    mic: Microphone,
    speaker: Speaker,
    task: Option<JoinHandle<()>>,
}

impl FakeRecognizer {
    pub fn new(mic: Microphone, speaker: Speaker) -> Self {
        Self {
            mic,
            speaker,
            task: None,
        }
    }
}

impl SpeechRecognizer for FakeRecognizer {
    fn start(&mut self, language_tag: &str, sink: InputSink) -> kiosk_voice::Result<()> {
        self.mic.starts.fetch_add(1, Ordering::SeqCst);
        self.mic.languages.lock().unwrap().push(language_tag.to_string());
        if self.speaker.busy.load(Ordering::SeqCst) {
            self.mic.overlaps.fetch_add(1, Ordering::SeqCst);
        }

        let answer = self.mic.answers.lock().unwrap().pop_front();
        self.task = Some(tokio::spawn(async move {
            let Some(answer) = answer else {
                std::future::pending::<()>().await;
                return;
            };
            tokio::time::sleep(Duration::from_millis(200)).await;
            match answer {
                Answer::Heard(text) => sink.heard(text),
                Answer::Silence => sink.no_speech(),
                Answer::Fail => sink.failed("network"),
            }
        }));
        Ok(())
    }

    fn abort(&mut self) {
        self.mic.aborts.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[derive(Clone, Default)]
pub struct FakeSearch {
    calls: Arc<Mutex<Vec<CapturedName>>>,
    pub results: Vec<Appointment>,
}

impl FakeSearch {
    pub fn calls(&self) -> Vec<CapturedName> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AppointmentSearch for FakeSearch {
    async fn search(&self, name: &CapturedName) -> kiosk_voice::Result<Vec<Appointment>> {
        self.calls.lock().unwrap().push(name.clone());
        Ok(self.results.clone())
    }
}

pub fn name(first: &str, last: &str) -> CapturedName {
    CapturedName {
        first_name: first.to_string(),
        last_name: last.to_string(),
    }
}

// === Running driver ===

pub struct Kiosk {
    pub handle: CheckInHandle,
    pub speaker: Speaker,
    pub mic: Microphone,
    pub search: FakeSearch,
    pub arbiter: VoiceArbiter,
    shutdown: CancellationToken,
    task: JoinHandle<TelemetrySnapshot>,
}

impl Kiosk {
    pub fn start(answers: Vec<Answer>) -> Self {
        let speaker = Speaker::default();
        Self::launch(
            Box::new(FakeSynthesizer::new(speaker.clone())),
            speaker,
            Microphone::scripted(answers),
        )
    }

    pub fn launch(synthesizer: Box<dyn SpeechSynthesizer>, speaker: Speaker, mic: Microphone) -> Self {
        let search = FakeSearch::default();
        let arbiter = VoiceArbiter::new();
        let recognizer = FakeRecognizer::new(mic.clone(), speaker.clone());
        let (driver, handle) = Driver::new(
            &KioskConfig::default(),
            synthesizer,
            Box::new(recognizer),
            Arc::new(search.clone()),
            arbiter.clone(),
        );
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(driver.run(shutdown.clone()));
        Self {
            handle,
            speaker,
            mic,
            search,
            arbiter,
            shutdown,
            task,
        }
    }

    pub async fn wait_for(&self, phase: DialoguePhase) -> CheckInStatus {
        let mut status = self.handle.subscribe();
        let current = tokio::time::timeout(Duration::from_secs(300), status.wait_for(|s| s.phase == phase))
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for {phase:?}"))
            .expect("driver stopped")
            .clone();
        current
    }

    pub async fn stop(self) -> TelemetrySnapshot {
        self.shutdown.cancel();
        self.task.await.expect("driver panicked")
    }
}
