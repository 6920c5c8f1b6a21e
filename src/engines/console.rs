use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::ports::{InputSink, OutputSink, SpeechRecognizer, SpeechSynthesizer};

/// Prints prompts and pretends to take `ms_per_char` per character to say them.
#[derive(Debug)]
pub struct ConsoleSynthesizer {
    ms_per_char: u64,
    task: Option<JoinHandle<()>>,
}

impl ConsoleSynthesizer {
    pub fn new(ms_per_char: u64) -> Self {
        Self {
            ms_per_char,
            task: None,
        }
    }
}

impl SpeechSynthesizer for ConsoleSynthesizer {
    fn speak(&mut self, text: &str, voice_tag: &str, sink: OutputSink) {
        self.cancel();
        println!("[{voice_tag}] {text}");
        let duration = Duration::from_millis(text.chars().count() as u64 * self.ms_per_char);
        self.task = Some(tokio::spawn(async move {
            sink.started();
            tokio::time::sleep(duration).await;
            sink.ended();
        }));
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for ConsoleSynthesizer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Treats typed lines as transcripts.
///
/// Lines typed while no attempt is open are discarded when the next attempt
/// opens, the way a microphone would not have heard them.
#[derive(Debug)]
pub struct ConsoleRecognizer {
    lines: Arc<Mutex<mpsc::UnboundedReceiver<String>>>,
    timeout: Duration,
    task: Option<JoinHandle<()>>,
}

impl ConsoleRecognizer {
    pub fn new(lines: mpsc::UnboundedReceiver<String>, timeout: Duration) -> Self {
        Self {
            lines: Arc::new(Mutex::new(lines)),
            timeout,
            task: None,
        }
    }
}

impl SpeechRecognizer for ConsoleRecognizer {
    fn start(&mut self, language_tag: &str, sink: InputSink) -> Result<()> {
        if self.task.as_ref().is_some_and(|task| !task.is_finished()) {
            return Err(Error::Engine("recognition already in progress".to_string()));
        }
        println!("(listening, {language_tag})");

        let lines = Arc::clone(&self.lines);
        let timeout = self.timeout;
        self.task = Some(tokio::spawn(async move {
            let mut lines = lines.lock().await;
            while lines.try_recv().is_ok() {}
            match tokio::time::timeout(timeout, lines.recv()).await {
                Ok(Some(line)) => sink.heard(line),
                Ok(None) => sink.failed("console input closed"),
                Err(_) => sink.no_speech(),
            }
        }));
        Ok(())
    }

    fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for ConsoleRecognizer {
    fn drop(&mut self) {
        self.abort();
    }
}
