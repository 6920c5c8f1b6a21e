//! Voice ports
//!
//! Each port wraps one external engine and keeps the bookkeeping the
//! dialogue relies on: which utterance or attempt is current, and whether
//! the engine is busy. Engines report back through sinks that stamp every
//! callback with the session generation and the utterance/attempt id.

mod input;
mod output;

pub use input::{InputSink, SpeechInputPort, SpeechRecognizer};
pub use output::{OutputSink, SpeechOutputPort, SpeechSynthesizer};
