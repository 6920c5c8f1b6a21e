use tokio::sync::mpsc;
use tracing::debug;

use crate::kernel::event::{Event, OutputEvent, OutputSignal, UtteranceId};
use crate::kernel::time::Generation;

/// Voice output engine contract.
///
/// `speak` must eventually report exactly one of `ended`/`failed` through the
/// sink unless `cancel` is called first. The sink's terminal methods consume
/// it, so an engine cannot report twice.
pub trait SpeechSynthesizer: Send {
    fn is_supported(&self) -> bool {
        true
    }

    fn speak(&mut self, text: &str, voice_tag: &str, sink: OutputSink);

    /// Silence the current utterance. No callback is required afterwards.
    fn cancel(&mut self);
}

/// Callback handle for one utterance.
#[derive(Debug)]
pub struct OutputSink {
    tx: mpsc::UnboundedSender<Event>,
    generation: Generation,
    utterance: UtteranceId,
}

impl OutputSink {
    pub fn new(tx: mpsc::UnboundedSender<Event>, generation: Generation, utterance: UtteranceId) -> Self {
        Self {
            tx,
            generation,
            utterance,
        }
    }

    pub fn utterance(&self) -> UtteranceId {
        self.utterance
    }

    pub fn started(&self) {
        self.send(OutputSignal::Started);
    }

    pub fn ended(self) {
        self.send(OutputSignal::Ended);
    }

    pub fn failed(self, reason: impl Into<String>) {
        self.send(OutputSignal::Failed(reason.into()));
    }

    fn send(&self, signal: OutputSignal) {
        // Driver gone means nobody is listening for this utterance any more.
        let _ = self.tx.send(Event::Output(OutputEvent {
            generation: self.generation,
            utterance: self.utterance,
            signal,
        }));
    }
}

pub struct SpeechOutputPort {
    engine: Box<dyn SpeechSynthesizer>,
    tx: mpsc::UnboundedSender<Event>,
    current: Option<UtteranceId>,
}

impl SpeechOutputPort {
    pub fn new(engine: Box<dyn SpeechSynthesizer>, tx: mpsc::UnboundedSender<Event>) -> Self {
        Self {
            engine,
            tx,
            current: None,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.engine.is_supported()
    }

    pub fn is_speaking(&self) -> bool {
        self.current.is_some()
    }

    /// Replaces whatever is being said. A no-op when output is unsupported.
    pub fn speak(&mut self, text: &str, voice_tag: &str, generation: Generation, utterance: UtteranceId) {
        if !self.is_supported() {
            return;
        }
        if self.current.take().is_some() {
            self.engine.cancel();
        }
        debug!(utterance = utterance.0, voice = voice_tag, "Speaking");
        self.current = Some(utterance);
        self.engine
            .speak(text, voice_tag, OutputSink::new(self.tx.clone(), generation, utterance));
    }

    pub fn stop(&mut self) {
        if self.current.take().is_some() {
            self.engine.cancel();
        }
    }

    /// Port bookkeeping for an engine callback. Callbacks for anything but
    /// the current utterance change nothing.
    pub fn observe(&mut self, event: &OutputEvent) {
        if self.current == Some(event.utterance) && event.signal.is_terminal() {
            self.current = None;
        }
    }
}
