use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pathsense::annunciation::{AnnunciationPlan, Decision};
use pathsense::overlay::LogOverlay;
use pathsense::session::annunciator_for;
use pathsense::speech::{BASELINE_RATE, speech_channel};
use pathsense::{
    Arbiter, AssistMode, AssistSession, Config, Detection, FrameGeometry, ImageDirSource,
    LogSpeech, MonotonicClock, SceneSummary, SessionSettings, Utterance, WarningSet,
    WsDetectionChannel, classify_batch,
};

/// pathsense - spoken obstacle and scene alerts from a live camera feed
#[derive(Parser)]
#[command(name = "pathsense", version, about)]
struct Cli {
    /// Assistance mode
    #[arg(short, long, value_enum)]
    mode: Option<AssistMode>,

    /// Detector WebSocket URL
    #[arg(long)]
    detector: Option<String>,

    /// Directory of frames to replay as the camera
    #[arg(long)]
    frames: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log utterances instead of speaking them
    #[arg(long, env = "PATHSENSE_DISABLE_VOICE")]
    disable_voice: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run an assistance session (default)
    Run,
    /// Classify a saved detection batch and show what would be spoken
    Classify {
        /// JSON file holding a detection batch
        path: PathBuf,
        /// Source frame width in pixels
        #[arg(long)]
        width: u32,
        /// Source frame height in pixels
        #[arg(long)]
        height: u32,
    },
    /// Speak a line through the configured voice
    TestTts {
        /// Text to speak
        #[arg(default_value = "Obstacle ahead, move left or right")]
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,pathsense=info",
        1 => "info,pathsense=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;

    if let Some(mode) = cli.mode {
        config.mode = mode;
    }
    if let Some(url) = cli.detector {
        config.detector_url = url;
    }
    if cli.frames.is_some() {
        config.capture.frames_dir = cli.frames;
    }
    if cli.disable_voice {
        tracing::info!("voice explicitly disabled via --disable-voice");
        config.speech.enabled = false;
    }
    tracing::debug!(?config, "loaded configuration");

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run_session(config).await,
        Command::Classify {
            path,
            width,
            height,
        } => classify(&path, FrameGeometry::new(width, height)),
        Command::TestTts { text } => test_tts(&config, text).await,
    }
}

/// Run a session until Ctrl-C
async fn run_session(config: Config) -> anyhow::Result<()> {
    let frames_dir = config
        .capture
        .frames_dir
        .clone()
        .ok_or_else(|| anyhow::anyhow!("frames directory required (--frames or PATHSENSE_FRAMES_DIR)"))?;

    let source = ImageDirSource::open(&frames_dir)?;
    let channel = WsDetectionChannel::new(config.detector_url.clone(), config.mode);
    let speech = speech_channel(&config.speech);
    let annunciator = annunciator_for(
        config.mode,
        speech,
        Arc::new(MonotonicClock::new()),
        config.annunciation.clone(),
    );

    let (session, handle) = AssistSession::new(
        channel,
        source,
        annunciator,
        Box::new(LogOverlay),
        SessionSettings::from(&config),
    );

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.shutdown().await;
        }
    });

    tracing::info!(
        mode = %config.mode,
        detector = %config.detector_url,
        "pathsense ready - press Ctrl-C to stop"
    );

    let stats = session.run().await?;
    tracing::debug!(?stats, "session finished");

    Ok(())
}

/// Print the zones, summary and planned speech for a saved batch
fn classify(path: &Path, frame: FrameGeometry) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(path)?;
    let batch: Vec<Detection> = serde_json::from_str(&content)?;

    let Some(classified) = classify_batch(&batch, frame) else {
        anyhow::bail!("frame width and height must be non-zero");
    };

    println!("Detections ({}):", classified.len());
    for d in &classified {
        println!(
            "  {:<16} {:<7} {}",
            d.label(),
            d.zone.position,
            d.zone.proximity
        );
    }

    let summary = SceneSummary::from_detections(&classified);
    let warnings = WarningSet::from_detections(&classified);
    println!("\nSummary:  {}", summary.to_text());
    if warnings.is_empty() {
        println!("Warnings: (none)");
    } else {
        println!("Warnings:");
        for warning in warnings.iter() {
            let tag = if warning.is_urgent() { "urgent" } else { "" };
            println!("  {:<7} {}", tag, warning.text());
        }
    }

    let arbiter = Arbiter::new(Arc::new(LogSpeech), Arc::new(MonotonicClock::new()));
    if let Decision::Speak(AnnunciationPlan {
        urgent,
        warnings,
        narration,
    }) = arbiter.plan(&classified)
    {
        println!("\nSpoken ({}):", if urgent { "urgent" } else { "calm" });
        if let Some(w) = warnings {
            println!("  now        @{:.2}x  {}", w.rate, w.text);
        }
        if let Some(n) = narration {
            println!(
                "  +{:<4}ms    @{:.2}x  {}",
                n.delay.as_millis(),
                n.utterance.rate,
                n.utterance.text
            );
        }
    }

    Ok(())
}

/// Speak a test line
async fn test_tts(config: &Config, text: String) -> anyhow::Result<()> {
    println!("Speaking: {text}");

    let speech = speech_channel(&config.speech);
    let completion = speech.speak(Utterance::new(text, BASELINE_RATE))?;
    let outcome = completion.await?;

    println!("Outcome: {outcome:?}");
    Ok(())
}
