mod common;

use std::time::Duration;

use common::{heard, name, Answer, FakeSynthesizer, Kiosk, Microphone, Speaker};
use kiosk_voice::engines::{UnavailableRecognizer, UnavailableSynthesizer};
use kiosk_voice::language::PhraseBank;
use kiosk_voice::{DialoguePhase, Driver, Error, KioskConfig, SupportedLanguage, VoiceArbiter};
use std::sync::Arc;

#[tokio::test(start_paused = true)]
async fn test_full_english_check_in() {
    let kiosk = Kiosk::start(vec![heard("English"), heard("Maria Garcia"), heard("yes")]);
    kiosk.handle.start_check_in().unwrap();

    let done = kiosk.wait_for(DialoguePhase::Completed).await;
    assert!(!done.is_listening);
    assert!(!done.is_speaking);
    assert_eq!(done.selected_language, SupportedLanguage::En);
    assert_eq!(done.captured_name, None, "the name does not outlive the session");

    // Let the spawned search land.
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(kiosk.search.calls(), vec![name("Maria", "Garcia")]);
    assert_eq!(kiosk.arbiter.holder(), None, "lease released on completion");
    assert_eq!(kiosk.mic.overlaps(), 0);

    let english = PhraseBank::new().lookup(SupportedLanguage::En);
    let lines = kiosk.speaker.lines();
    assert_eq!(lines.last().map(|(_, text)| text.as_str()), Some(english.searching));

    let snapshot = kiosk.stop().await;
    assert_eq!(snapshot.overlap_instants, 0);
    assert_eq!(snapshot.phase_stats.completed, 1);
    assert_eq!(snapshot.searches, 1);
}

#[tokio::test(start_paused = true)]
async fn test_lease_is_held_for_the_session() {
    let kiosk = Kiosk::start(vec![]);
    kiosk.handle.start_check_in().unwrap();
    kiosk.wait_for(DialoguePhase::SelectingLanguage).await;
    assert_eq!(kiosk.arbiter.holder().as_deref(), Some("check-in"));

    kiosk.handle.cancel_check_in().unwrap();
    kiosk.wait_for(DialoguePhase::Idle).await;
    assert_eq!(kiosk.arbiter.holder(), None);
    kiosk.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_start_refused_while_another_consumer_holds_the_voice() {
    let kiosk = Kiosk::start(vec![]);
    let announcer = kiosk.arbiter.try_acquire("announcer").unwrap();

    kiosk.handle.start_check_in().unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(kiosk.handle.status().phase, DialoguePhase::Idle);
    assert_eq!(kiosk.speaker.count(), 0);

    drop(announcer);
    kiosk.handle.start_check_in().unwrap();
    kiosk.wait_for(DialoguePhase::SelectingLanguage).await;
    kiosk.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_recognition_follows_selected_language() {
    let kiosk = Kiosk::start(vec![heard("中文"), heard("Wei Zhang"), heard("yes")]);
    kiosk.handle.start_check_in().unwrap();
    kiosk.wait_for(DialoguePhase::Completed).await;

    // Chinese falls back to English recognition for the name.
    assert_eq!(kiosk.mic.languages(), vec!["en-US", "en-US", "en-US"]);
    let voices: Vec<_> = kiosk.speaker.lines().into_iter().map(|(voice, _)| voice).collect();
    assert!(voices[3..].iter().all(|v| v == "zh-CN"), "{voices:?}");

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(kiosk.search.calls(), vec![name("Wei", "Zhang")]);
    kiosk.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_cancel_in_each_phase_leaves_ports_idle() {
    let scripts: [(Vec<Answer>, DialoguePhase); 3] = [
        (vec![], DialoguePhase::SelectingLanguage),
        (vec![heard("English")], DialoguePhase::AwaitingName),
        (vec![heard("English"), heard("Maria Garcia")], DialoguePhase::ConfirmingName),
    ];

    for (answers, phase) in scripts {
        let kiosk = Kiosk::start(answers);
        kiosk.handle.start_check_in().unwrap();
        kiosk.wait_for(phase).await;

        kiosk.handle.cancel_check_in().unwrap();
        let idle = kiosk.wait_for(DialoguePhase::Idle).await;
        assert!(!idle.is_listening, "listening after cancel in {phase:?}");
        assert!(!idle.is_speaking, "speaking after cancel in {phase:?}");
        assert_eq!(idle.captured_name, None);

        // Nothing scheduled before the cancel may run afterwards.
        let spoken = kiosk.speaker.count();
        let starts = kiosk.mic.starts();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(kiosk.handle.status().phase, DialoguePhase::Idle);
        assert_eq!(kiosk.speaker.count(), spoken);
        assert_eq!(kiosk.mic.starts(), starts);
        assert!(kiosk.search.calls().is_empty());

        let snapshot = kiosk.stop().await;
        assert_eq!(snapshot.phase_stats.cancelled, 1);
        assert_eq!(snapshot.overlap_instants, 0);
    }
}

#[tokio::test(start_paused = true)]
async fn test_check_in_can_restart_after_cancel() {
    let kiosk = Kiosk::start(vec![heard("English")]);
    kiosk.handle.start_check_in().unwrap();
    kiosk.wait_for(DialoguePhase::AwaitingName).await;
    kiosk.handle.cancel_check_in().unwrap();
    kiosk.wait_for(DialoguePhase::Idle).await;

    kiosk.handle.start_check_in().unwrap();
    let status = kiosk.wait_for(DialoguePhase::SelectingLanguage).await;
    assert_eq!(status.selected_language, SupportedLanguage::En);
    kiosk.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_silent_speech_engine_is_covered_by_watchdog() {
    let speaker = Speaker::default();
    let kiosk = Kiosk::launch(
        Box::new(FakeSynthesizer::hanging(speaker.clone())),
        speaker,
        Microphone::scripted(vec![heard("English")]),
    );
    kiosk.handle.start_check_in().unwrap();

    kiosk.wait_for(DialoguePhase::AwaitingName).await;
    assert_eq!(kiosk.mic.overlaps(), 0);

    let snapshot = kiosk.stop().await;
    assert!(snapshot.utterance_stats.watchdog_expired >= 3);
    assert_eq!(snapshot.overlap_instants, 0);
}

#[tokio::test(start_paused = true)]
async fn test_recognition_errors_never_stall_language_selection() {
    let kiosk = Kiosk::start(vec![Answer::Fail, Answer::Silence, heard("English")]);
    kiosk.handle.start_check_in().unwrap();
    kiosk.wait_for(DialoguePhase::AwaitingName).await;

    // Name prompt, then the fourth attempt.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(kiosk.mic.starts(), 4);
    assert!(kiosk.handle.status().is_listening);
    kiosk.stop().await;
}

#[tokio::test]
async fn test_unsupported_input_fails_fast() {
    let (driver, handle) = Driver::new(
        &KioskConfig::default(),
        Box::new(UnavailableSynthesizer),
        Box::new(UnavailableRecognizer),
        Arc::new(common::FakeSearch::default()),
        VoiceArbiter::new(),
    );
    assert!(!handle.status().is_voice_supported);
    assert!(matches!(handle.start_check_in(), Err(Error::VoiceUnavailable)));
    drop(driver);

    // Once the driver is gone commands report it.
    assert!(matches!(handle.cancel_check_in(), Err(Error::ChannelClosed)));
}
