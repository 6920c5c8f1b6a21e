//! Concrete voice engines for the kiosk binary.

mod command;
mod console;

pub use command::CommandSynthesizer;
pub use console::{ConsoleRecognizer, ConsoleSynthesizer};

use crate::error::{Error, Result};
use crate::ports::{InputSink, OutputSink, SpeechRecognizer, SpeechSynthesizer};

/// Stand-in for a runtime without text-to-speech.
#[derive(Debug, Default)]
pub struct UnavailableSynthesizer;

impl SpeechSynthesizer for UnavailableSynthesizer {
    fn is_supported(&self) -> bool {
        false
    }

    fn speak(&mut self, _text: &str, _voice_tag: &str, sink: OutputSink) {
        sink.failed("speech output unavailable");
    }

    fn cancel(&mut self) {}
}

/// Stand-in for a runtime without speech recognition.
#[derive(Debug, Default)]
pub struct UnavailableRecognizer;

impl SpeechRecognizer for UnavailableRecognizer {
    fn is_supported(&self) -> bool {
        false
    }

    fn start(&mut self, _language_tag: &str, _sink: InputSink) -> Result<()> {
        Err(Error::VoiceUnavailable)
    }

    fn abort(&mut self) {}
}
