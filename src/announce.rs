//! Spoken narration of appointment search results.
//!
//! Runs after the check-in dialogue has handed the voice engines back; the
//! caller is expected to hold a [`VoiceLease`](crate::kernel::lease::VoiceLease)
//! while speaking these lines.

use chrono::{FixedOffset, Local, Offset};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::kernel::event::{Event, OutputEvent, OutputSignal, UtteranceId};
use crate::kernel::lease::VoiceLease;
use crate::kernel::time::{DialogueTiming, Generation};
use crate::language::{PhraseBank, SupportedLanguage};
use crate::ports::{OutputSink, SpeechSynthesizer};
use crate::services::Appointment;

const DATE_FORMAT: &str = "%b %-d, %Y, %-I:%M %p";

#[derive(Debug, Clone, Copy)]
pub struct Announcer {
    bank: PhraseBank,
    offset: FixedOffset,
}

impl Announcer {
    /// Dates are read out in `offset`.
    pub fn new(offset: FixedOffset) -> Self {
        Self {
            bank: PhraseBank::new(),
            offset,
        }
    }

    /// Uses the kiosk's local UTC offset.
    pub fn local() -> Self {
        Self::new(Local::now().offset().fix())
    }

    /// Lines to speak, in order.
    pub fn narrate(&self, language: SupportedLanguage, appointments: &[Appointment]) -> Vec<String> {
        let profile = self.bank.lookup(language);
        if appointments.is_empty() {
            return vec![profile.no_appointments.to_string()];
        }

        let mut lines = Vec::with_capacity(appointments.len() + 2);
        lines.push((profile.found_appointments)(appointments.len()));
        for (idx, appointment) in appointments.iter().enumerate() {
            let date = appointment
                .start_utc
                .with_timezone(&self.offset)
                .format(DATE_FORMAT)
                .to_string();
            lines.push(
                (profile.appointment_details)(
                    idx,
                    &date,
                    &appointment.staff,
                    appointment.notes.as_deref().filter(|n| !n.trim().is_empty()),
                )
                .trim_end()
                .to_string(),
            );
        }
        lines.push(profile.checked_in.to_string());
        lines
    }

    pub fn narrate_failure(&self, language: SupportedLanguage) -> String {
        self.bank.lookup(language).search_failed.to_string()
    }

    /// Says `lines` in the language's voice, each one only after the engine
    /// reported the previous one finished. An engine that never reports is
    /// cut off after the same estimate the dialogue watchdog uses.
    ///
    /// Returns how many lines the engine reported as ended.
    pub async fn speak(
        &self,
        engine: &mut dyn SpeechSynthesizer,
        lease: &VoiceLease,
        language: SupportedLanguage,
        lines: &[String],
        timing: &DialogueTiming,
    ) -> usize {
        let voice_tag = self.bank.lookup(language).voice_tag;
        let generation = Generation::new();
        let mut ended = 0;

        for (idx, line) in lines.iter().enumerate() {
            let utterance = UtteranceId(idx as u64 + 1);
            debug!(owner = lease.owner(), utterance = utterance.0, "Announcing");
            // One channel per line; an engine that drops its sink closes it.
            let (tx, mut rx) = mpsc::unbounded_channel();
            engine.speak(line, voice_tag, OutputSink::new(tx, generation, utterance));

            let finished = async {
                while let Some(event) = rx.recv().await {
                    let Event::Output(OutputEvent { signal, .. }) = event else {
                        continue;
                    };
                    match signal {
                        OutputSignal::Started => {}
                        OutputSignal::Ended => return true,
                        OutputSignal::Failed(reason) => {
                            warn!(utterance = utterance.0, "Announcement failed: {}", reason);
                            return false;
                        }
                    }
                }
                false
            };
            match tokio::time::timeout(timing.watchdog_for(line), finished).await {
                Ok(true) => ended += 1,
                Ok(false) => {}
                Err(_) => {
                    warn!(utterance = utterance.0, "No end-of-announcement signal; moving on");
                    engine.cancel();
                }
            }
        }
        ended
    }
}

impl Default for Announcer {
    fn default() -> Self {
        Self::local()
    }
}
