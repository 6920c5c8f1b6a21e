use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{Error, Result};
use crate::kernel::event::{AttemptId, Event, InputEvent, RecognitionOutcome};
use crate::kernel::time::Generation;

/// Voice input engine contract: single-shot, non-continuous recognition.
///
/// After `start` the engine reports exactly one of `heard`/`no_speech`/
/// `failed` through the sink unless `abort` is called first.
pub trait SpeechRecognizer: Send {
    fn is_supported(&self) -> bool {
        true
    }

    /// Some engines reject overlapping sessions; the port always aborts and
    /// waits out a settle delay before calling this again.
    fn start(&mut self, language_tag: &str, sink: InputSink) -> Result<()>;

    fn abort(&mut self);
}

/// Callback handle for one recognition attempt.
#[derive(Debug)]
pub struct InputSink {
    tx: mpsc::UnboundedSender<Event>,
    generation: Generation,
    attempt: AttemptId,
}

impl InputSink {
    pub fn new(tx: mpsc::UnboundedSender<Event>, generation: Generation, attempt: AttemptId) -> Self {
        Self {
            tx,
            generation,
            attempt,
        }
    }

    pub fn attempt(&self) -> AttemptId {
        self.attempt
    }

    pub fn heard(self, transcript: impl Into<String>) {
        self.send(RecognitionOutcome::Transcript(transcript.into()));
    }

    pub fn no_speech(self) {
        self.send(RecognitionOutcome::NoSpeech);
    }

    pub fn failed(self, reason: impl Into<String>) {
        self.send(RecognitionOutcome::Error(reason.into()));
    }

    fn send(self, outcome: RecognitionOutcome) {
        let _ = self.tx.send(Event::Input(InputEvent {
            generation: self.generation,
            attempt: self.attempt,
            outcome,
        }));
    }
}

pub struct SpeechInputPort {
    engine: Box<dyn SpeechRecognizer>,
    tx: mpsc::UnboundedSender<Event>,
    language_tag: String,
    armed: Option<(Generation, AttemptId)>,
    listening: Option<AttemptId>,
    transcript: String,
}

impl SpeechInputPort {
    pub fn new(engine: Box<dyn SpeechRecognizer>, tx: mpsc::UnboundedSender<Event>, language_tag: &str) -> Self {
        Self {
            engine,
            tx,
            language_tag: language_tag.to_string(),
            armed: None,
            listening: None,
            transcript: String::new(),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.engine.is_supported()
    }

    pub fn is_listening(&self) -> bool {
        self.listening.is_some()
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn language(&self) -> &str {
        &self.language_tag
    }

    pub fn reset_transcript(&mut self) {
        self.transcript.clear();
    }

    /// Applies to the next attempt only.
    pub fn set_language(&mut self, language_tag: &str) {
        self.language_tag = language_tag.to_string();
    }

    /// First half of `start()`: drops any stale attempt, clears the
    /// transcript and arms `attempt`. The caller waits out the recognition
    /// settle delay and then calls [`open`](Self::open).
    pub fn start(&mut self, generation: Generation, attempt: AttemptId) {
        self.stop();
        self.transcript.clear();
        self.armed = Some((generation, attempt));
    }

    /// Second half of `start()`: hands the armed attempt to the engine.
    pub fn open(&mut self, attempt: AttemptId) -> Result<()> {
        if !self.is_supported() {
            return Err(Error::VoiceUnavailable);
        }
        let Some((generation, armed)) = self.armed.take() else {
            return Err(Error::Engine(format!("attempt {} was never armed", attempt.0)));
        };
        if armed != attempt {
            return Err(Error::Engine(format!(
                "attempt {} superseded by {}",
                attempt.0, armed.0
            )));
        }
        debug!(attempt = attempt.0, language = %self.language_tag, "Listening");
        self.engine.start(
            &self.language_tag,
            InputSink::new(self.tx.clone(), generation, attempt),
        )?;
        self.listening = Some(attempt);
        Ok(())
    }

    /// Aborts without a transcript. Safe to call when idle.
    pub fn stop(&mut self) {
        self.armed = None;
        if self.listening.take().is_some() {
            self.engine.abort();
        }
    }

    pub fn observe(&mut self, event: &InputEvent) {
        if self.listening != Some(event.attempt) {
            return;
        }
        self.listening = None;
        if let RecognitionOutcome::Transcript(text) = &event.outcome {
            self.transcript = text.clone();
        }
    }
}
