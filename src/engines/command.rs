use std::collections::HashMap;

use tokio::process::Command;
use tokio::sync::oneshot;
use tracing::warn;

use crate::config::OutputConfig;
use crate::ports::{OutputSink, SpeechSynthesizer};

/// Speaks through an OS text-to-speech program such as macOS `say`.
///
/// One child process per utterance; cancelling kills it.
#[derive(Debug)]
pub struct CommandSynthesizer {
    program: String,
    args: Vec<String>,
    voices: HashMap<String, String>,
    stop: Option<oneshot::Sender<()>>,
}

impl CommandSynthesizer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            voices: HashMap::new(),
            stop: None,
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self {
            program: config.command.clone(),
            args: config.args.clone(),
            voices: config.voices.clone(),
            stop: None,
        }
    }

    fn command(&self, text: &str, voice_tag: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(voice) = self.voices.get(voice_tag) {
            cmd.arg("-v").arg(voice);
        }
        cmd.arg(text).kill_on_drop(true);
        cmd
    }
}

impl SpeechSynthesizer for CommandSynthesizer {
    fn speak(&mut self, text: &str, voice_tag: &str, sink: OutputSink) {
        self.cancel();

        let mut child = match self.command(text, voice_tag).spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to spawn '{}': {}", self.program, e);
                sink.failed(e.to_string());
                return;
            }
        };

        let (stop_tx, mut stop_rx) = oneshot::channel();
        self.stop = Some(stop_tx);
        tokio::spawn(async move {
            sink.started();
            tokio::select! {
                status = child.wait() => match status {
                    Ok(status) if status.success() => sink.ended(),
                    Ok(status) => sink.failed(format!("speech process exited with {status}")),
                    Err(e) => sink.failed(e.to_string()),
                },
                _ = &mut stop_rx => {
                    let _ = child.kill().await;
                }
            }
        });
    }

    fn cancel(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}
