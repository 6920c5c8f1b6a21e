use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{FixedOffset, TimeZone, Utc};
use kiosk_voice::announce::Announcer;
use kiosk_voice::kernel::time::DialogueTiming;
use kiosk_voice::language::{CapturedName, PhraseBank};
use kiosk_voice::ports::{OutputSink, SpeechSynthesizer};
use kiosk_voice::services::search::MAX_NAME_LEN;
use kiosk_voice::services::{validate_name, Appointment};
use kiosk_voice::{Error, SupportedLanguage, VoiceArbiter};
use tokio::task::JoinHandle;

fn appointment(staff: &str, notes: Option<&str>, hour: u32) -> Appointment {
    Appointment {
        id: format!("appt-{hour}"),
        start_utc: Utc.with_ymd_and_hms(2025, 3, 5, hour, 30, 0).unwrap(),
        staff: staff.to_string(),
        notes: notes.map(str::to_string),
        department: None,
        service_name: None,
    }
}

fn utc() -> Announcer {
    Announcer::new(FixedOffset::east_opt(0).unwrap())
}

#[test]
fn test_no_appointments() {
    let lines = utc().narrate(SupportedLanguage::En, &[]);
    assert_eq!(
        lines,
        vec![PhraseBank::new().lookup(SupportedLanguage::En).no_appointments]
    );
}

#[test]
fn test_narrates_each_appointment_then_checks_in() {
    let lines = utc().narrate(
        SupportedLanguage::En,
        &[
            appointment("Dr. Lee", Some("Bring forms"), 14),
            appointment("Dr. Kim", None, 9),
        ],
    );
    assert_eq!(
        lines,
        vec![
            "Found 2 appointments.",
            "Appointment 1: Mar 5, 2025, 2:30 PM with Dr. Lee. Notes: Bring forms.",
            "Appointment 2: Mar 5, 2025, 9:30 AM with Dr. Kim.",
            "You are now checked in. Thank you!",
        ]
    );
}

#[test]
fn test_dates_follow_kiosk_offset() {
    let pacific = Announcer::new(FixedOffset::west_opt(8 * 3600).unwrap());
    let lines = pacific.narrate(SupportedLanguage::Es, &[appointment("Dra. Ruiz", None, 2)]);
    assert_eq!(lines[0], "Se encontró 1 cita.");
    assert!(lines[1].contains("Mar 4, 2025, 6:30 PM"), "{}", lines[1]);
}

#[test]
fn test_failure_narration_is_localised() {
    let announcer = utc();
    assert!(announcer
        .narrate_failure(SupportedLanguage::En)
        .starts_with("Sorry, there was an error searching for appointments"));
    assert_eq!(
        announcer.narrate_failure(SupportedLanguage::Zh),
        PhraseBank::new().lookup(SupportedLanguage::Zh).search_failed
    );
}

#[test]
fn test_search_name_validation() {
    let trimmed = validate_name(&CapturedName {
        first_name: "  Maria ".into(),
        last_name: "Garcia\t".into(),
    })
    .unwrap();
    assert_eq!(trimmed.first_name, "Maria");
    assert_eq!(trimmed.last_name, "Garcia");

    let empty = CapturedName {
        first_name: "Maria".into(),
        last_name: "   ".into(),
    };
    assert!(matches!(validate_name(&empty), Err(Error::Search(_))));

    let long = CapturedName {
        first_name: "a".repeat(MAX_NAME_LEN + 1),
        last_name: "Garcia".into(),
    };
    assert!(validate_name(&long).is_err());

    let longest = CapturedName {
        first_name: "a".repeat(MAX_NAME_LEN),
        last_name: "Garcia".into(),
    };
    assert!(validate_name(&longest).is_ok());
}

#[test]
fn test_appointment_wire_format() {
    let json = r#"[{"id":"a1","startUtc":"2025-03-05T14:30:00Z","staff":"Dr. Lee","notes":null,"serviceName":"Checkup"}]"#;
    let parsed: Vec<Appointment> = serde_json::from_str(json).unwrap();
    assert_eq!(parsed[0].staff, "Dr. Lee");
    assert_eq!(parsed[0].service_name.as_deref(), Some("Checkup"));
    assert_eq!(parsed[0].department, None);

    let body = serde_json::to_value(CapturedName {
        first_name: "Maria".into(),
        last_name: "Garcia".into(),
    })
    .unwrap();
    assert_eq!(body, serde_json::json!({"firstName": "Maria", "lastName": "Garcia"}));
}

/// Speaks each line for 100ms, or forever when `hang` is set.
#[derive(Default)]
struct Loudspeaker {
    said: Arc<Mutex<Vec<(String, String)>>>,
    busy: Arc<AtomicBool>,
    overlaps: Arc<AtomicUsize>,
    cancels: usize,
    hang: bool,
    task: Option<JoinHandle<()>>,
}

impl SpeechSynthesizer for Loudspeaker {
    fn speak(&mut self, text: &str, voice_tag: &str, sink: OutputSink) {
        if self.busy.swap(true, Ordering::SeqCst) {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        self.said
            .lock()
            .unwrap()
            .push((voice_tag.to_string(), text.to_string()));
        let busy = Arc::clone(&self.busy);
        let hang = self.hang;
        self.task = Some(tokio::spawn(async move {
            sink.started();
            if hang {
                std::future::pending::<()>().await;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
            busy.store(false, Ordering::SeqCst);
            sink.ended();
        }));
    }

    fn cancel(&mut self) {
        self.cancels += 1;
        self.busy.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_results_are_spoken_one_after_another() {
    let announcer = utc();
    let lines = announcer.narrate(
        SupportedLanguage::Es,
        &[appointment("Dra. Ruiz", None, 9), appointment("Dr. Kim", None, 10)],
    );
    let arbiter = VoiceArbiter::new();
    let lease = arbiter.try_acquire("announcer").unwrap();
    let mut speaker = Loudspeaker::default();

    let ended = announcer
        .speak(&mut speaker, &lease, SupportedLanguage::Es, &lines, &DialogueTiming::default())
        .await;

    assert_eq!(ended, lines.len());
    assert_eq!(speaker.overlaps.load(Ordering::SeqCst), 0);
    let said = speaker.said.lock().unwrap().clone();
    let texts: Vec<_> = said.iter().map(|(_, text)| text.clone()).collect();
    assert_eq!(texts, lines);
    assert!(said.iter().all(|(voice, _)| voice == "es-US"));
}

#[tokio::test(start_paused = true)]
async fn test_silent_engine_does_not_stall_the_announcement() {
    let announcer = utc();
    let lines = vec![announcer.narrate_failure(SupportedLanguage::En), "second".to_string()];
    let arbiter = VoiceArbiter::new();
    let lease = arbiter.try_acquire("announcer").unwrap();
    let mut speaker = Loudspeaker {
        hang: true,
        ..Loudspeaker::default()
    };

    let ended = announcer
        .speak(&mut speaker, &lease, SupportedLanguage::En, &lines, &DialogueTiming::default())
        .await;

    assert_eq!(ended, 0);
    assert_eq!(speaker.said.lock().unwrap().len(), 2);
    assert_eq!(speaker.cancels, 2, "each stuck line is cut off");
    assert_eq!(speaker.overlaps.load(Ordering::SeqCst), 0);
}
