use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use kiosk_voice::announce::Announcer;
use kiosk_voice::config::OutputEngineKind;
use kiosk_voice::kernel::time::DialogueTiming;
use kiosk_voice::engines::{
    CommandSynthesizer, ConsoleRecognizer, ConsoleSynthesizer, UnavailableRecognizer,
};
use kiosk_voice::ports::{SpeechRecognizer, SpeechSynthesizer};
use kiosk_voice::services::HttpAppointmentSearch;
use kiosk_voice::{CheckInStatus, Driver, KioskConfig, SearchReport, VoiceArbiter};

/// Voice check-in for the front-desk kiosk
#[derive(Parser)]
#[command(name = "kiosk-voice", version, about)]
struct Cli {
    /// TOML config file
    #[arg(short, long, env = "KIOSK_CONFIG")]
    config: Option<PathBuf>,

    /// Speech output engine (overrides the config file)
    #[arg(long, value_enum)]
    engine: Option<OutputEngineKind>,

    /// Appointment search URL (overrides the config file)
    #[arg(long, env = "KIOSK_SEARCH_ENDPOINT")]
    search_endpoint: Option<String>,

    /// Run as if the runtime had no speech recognition
    #[arg(long)]
    no_voice_input: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn,kiosk_voice=info",
        1 => "info,kiosk_voice=debug",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => KioskConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => KioskConfig::default(),
    };
    if let Some(engine) = cli.engine {
        config.output.engine = engine;
    }
    if let Some(endpoint) = cli.search_endpoint {
        config.search.endpoint = endpoint;
    }
    config.validate()?;

    let (line_tx, line_rx) = mpsc::unbounded_channel();
    let synthesizer = build_synthesizer(&config);
    let recognizer: Box<dyn SpeechRecognizer> = if cli.no_voice_input {
        Box::new(UnavailableRecognizer)
    } else {
        Box::new(ConsoleRecognizer::new(
            line_rx,
            Duration::from_millis(config.input.listen_timeout_ms),
        ))
    };
    let search = HttpAppointmentSearch::new(
        config.search.endpoint.clone(),
        Duration::from_millis(config.search.timeout_ms),
    )?;

    let arbiter = VoiceArbiter::new();
    let (report_tx, report_rx) = mpsc::unbounded_channel();
    let (driver, handle) = Driver::new(
        &config,
        synthesizer,
        recognizer,
        Arc::new(search),
        arbiter.clone(),
    );
    let driver = driver.with_results(report_tx);

    let shutdown = CancellationToken::new();
    let driver_task = tokio::spawn(driver.run(shutdown.clone()));
    let announcer_task = tokio::spawn(announce_results(
        report_rx,
        arbiter,
        Announcer::local(),
        build_synthesizer(&config),
        config.timing(),
    ));
    let status_task = tokio::spawn(watch_phase(handle.subscribe()));

    println!("Commands: /start  /cancel  /status  /quit. Anything else is heard as speech.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match line.trim() {
                    "/start" => {
                        if let Err(e) = handle.start_check_in() {
                            println!("Cannot start check-in: {e}");
                        }
                    }
                    "/cancel" => handle.cancel_check_in()?,
                    "/status" => println!("{}", serde_json::to_string(&handle.status())?),
                    "/quit" => break,
                    _ => {
                        // Nobody listening is the same as speaking to an idle kiosk.
                        let _ = line_tx.send(line);
                    }
                }
            }
        }
    }

    info!("Shutting down");
    shutdown.cancel();
    let snapshot = driver_task.await?;
    announcer_task.abort();
    status_task.abort();
    info!(
        transitions = snapshot.phase_stats.transitions,
        completed = snapshot.phase_stats.completed,
        cancelled = snapshot.phase_stats.cancelled,
        overlap_instants = snapshot.overlap_instants,
        "Session telemetry"
    );
    Ok(())
}

fn build_synthesizer(config: &KioskConfig) -> Box<dyn SpeechSynthesizer> {
    match config.output.engine {
        OutputEngineKind::Console => Box::new(ConsoleSynthesizer::new(config.timing.speech_ms_per_char)),
        OutputEngineKind::Command => Box::new(CommandSynthesizer::from_config(&config.output)),
    }
}

/// Reads search results aloud once the dialogue has given up the voice.
async fn announce_results(
    mut reports: mpsc::UnboundedReceiver<SearchReport>,
    arbiter: VoiceArbiter,
    announcer: Announcer,
    mut engine: Box<dyn SpeechSynthesizer>,
    timing: DialogueTiming,
) {
    while let Some(report) = reports.recv().await {
        let lease = arbiter.acquire("announcer").await;
        let lines = match &report.outcome {
            Ok(found) => announcer.narrate(report.language, found),
            Err(e) => {
                warn!("Search failed for session {:?}: {}", report.session, e);
                vec![announcer.narrate_failure(report.language)]
            }
        };
        let spoken = announcer
            .speak(engine.as_mut(), &lease, report.language, &lines, &timing)
            .await;
        if spoken < lines.len() {
            warn!(spoken, total = lines.len(), "Announcement cut short");
        }
    }
}

async fn watch_phase(mut status: watch::Receiver<CheckInStatus>) {
    let mut last = status.borrow().phase;
    while status.changed().await.is_ok() {
        let phase = status.borrow_and_update().phase;
        if phase != last {
            println!("-- {phase:?}");
            last = phase;
        }
    }
}
