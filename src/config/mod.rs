//! Configuration management for pathsense
//!
//! Layered in order: built-in defaults, the TOML config file, environment
//! variables, then CLI flags (applied by the binary).

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use crate::annunciation::ArbiterSettings;
use crate::capture::DEFAULT_JPEG_QUALITY;
use crate::mode::AssistMode;
use crate::speech::{DEFAULT_REQUEST_TIMEOUT, TtsProvider};
use crate::{Error, Result};

use file::ConfigFile;

/// Default detector endpoint
pub const DEFAULT_DETECTOR_URL: &str = "ws://localhost:5000/ws";

/// pathsense configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Active assistance mode
    pub mode: AssistMode,

    /// Detector WebSocket URL
    pub detector_url: String,

    /// Frame capture configuration
    pub capture: CaptureConfig,

    /// Speech output configuration
    pub speech: SpeechConfig,

    /// Arbiter timings and rates (walking mode)
    pub annunciation: ArbiterSettings,
}

/// Frame capture configuration
#[derive(Debug, Clone, Default)]
pub struct CaptureConfig {
    /// Overrides the mode's capture period
    pub period: Option<Duration>,

    /// JPEG quality for outbound frames (1-100)
    pub jpeg_quality: u8,

    /// Directory of frames to replay
    pub frames_dir: Option<PathBuf>,
}

/// Speech output configuration
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    /// Speak through a TTS engine; when false utterances are only logged
    pub enabled: bool,

    /// TTS backend
    pub provider: TtsProvider,

    /// TTS voice identifier
    pub voice: String,

    /// TTS model
    pub model: String,

    /// Speed multiplier applied under each utterance's rate (0.25 to 4.0)
    pub base_speed: f32,

    /// Bound on one synthesis request
    pub request_timeout: Duration,

    /// `OpenAI`-compatible API base, when not the public API
    pub base_url: Option<String>,

    /// `OpenAI` API key
    pub openai_api_key: Option<String>,

    /// `ElevenLabs` API key
    pub elevenlabs_api_key: Option<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: TtsProvider::OpenAI,
            voice: "alloy".to_string(),
            model: "tts-1".to_string(),
            base_speed: 1.0,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            base_url: None,
            openai_api_key: None,
            elevenlabs_api_key: None,
        }
    }
}

impl SpeechConfig {
    /// API key for the selected provider
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        match self.provider {
            TtsProvider::OpenAI => self.openai_api_key.as_deref(),
            TtsProvider::ElevenLabs => self.elevenlabs_api_key.as_deref(),
        }
        .filter(|key| !key.is_empty())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: AssistMode::default(),
            detector_url: DEFAULT_DETECTOR_URL.to_string(),
            capture: CaptureConfig {
                jpeg_quality: DEFAULT_JPEG_QUALITY,
                ..CaptureConfig::default()
            },
            speech: SpeechConfig::default(),
            annunciation: ArbiterSettings::default(),
        }
    }
}

impl Config {
    /// Load configuration from the config file and process environment
    ///
    /// # Errors
    ///
    /// Returns error if an environment override or the result is invalid
    pub fn load() -> Result<Self> {
        let mut config = Self::default();
        config.apply_file(file::load_config_file());
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay values present in a config file
    pub fn apply_file(&mut self, file: ConfigFile) {
        if let Some(url) = file.detector.url {
            self.detector_url = url;
        }

        let capture = file.capture;
        if let Some(mode) = capture.mode {
            self.mode = mode;
        }
        if let Some(ms) = capture.period_ms {
            self.capture.period = Some(Duration::from_millis(ms));
        }
        if let Some(quality) = capture.jpeg_quality {
            self.capture.jpeg_quality = quality;
        }
        if capture.frames_dir.is_some() {
            self.capture.frames_dir = capture.frames_dir;
        }

        let speech = file.speech;
        if let Some(enabled) = speech.enabled {
            self.speech.enabled = enabled;
        }
        if let Some(provider) = speech.provider {
            self.speech.provider = provider;
        }
        if let Some(voice) = speech.voice {
            self.speech.voice = voice;
        }
        if let Some(model) = speech.model {
            self.speech.model = model;
        }
        if let Some(speed) = speech.speed {
            self.speech.base_speed = speed;
        }
        if let Some(ms) = speech.timeout_ms {
            self.speech.request_timeout = Duration::from_millis(ms);
        }
        if speech.base_url.is_some() {
            self.speech.base_url = speech.base_url;
        }
        if speech.openai_api_key.is_some() {
            self.speech.openai_api_key = speech.openai_api_key;
        }
        if speech.elevenlabs_api_key.is_some() {
            self.speech.elevenlabs_api_key = speech.elevenlabs_api_key;
        }

        let annunciation = file.annunciation;
        if let Some(ms) = annunciation.debounce_ms {
            self.annunciation.debounce = Duration::from_millis(ms);
        }
        if let Some(ms) = annunciation.summary_delay_ms {
            self.annunciation.summary_delay = Duration::from_millis(ms);
        }
        if let Some(rate) = annunciation.warning_rate {
            self.annunciation.warning_rate = rate;
        }
        if let Some(rate) = annunciation.urgent_summary_rate {
            self.annunciation.urgent_summary_rate = rate;
        }
        if let Some(rate) = annunciation.calm_summary_rate {
            self.annunciation.calm_summary_rate = rate;
        }
    }

    /// Overlay environment variables, read through `var`
    ///
    /// # Errors
    ///
    /// Returns error if a variable holds an unparseable value
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(mode) = var("PATHSENSE_MODE") {
            self.mode = mode.parse()?;
        }
        if let Some(url) = var("PATHSENSE_DETECTOR_URL") {
            self.detector_url = url;
        }
        if let Some(dir) = var("PATHSENSE_FRAMES_DIR") {
            self.capture.frames_dir = Some(PathBuf::from(dir));
        }
        if let Some(quality) = var("PATHSENSE_JPEG_QUALITY") {
            self.capture.jpeg_quality = parse_env("PATHSENSE_JPEG_QUALITY", &quality)?;
        }
        if let Some(enabled) = var("PATHSENSE_SPEECH") {
            self.speech.enabled = !(enabled == "0" || enabled.eq_ignore_ascii_case("false"));
        }
        if let Some(provider) = var("PATHSENSE_TTS_PROVIDER") {
            self.speech.provider = provider.parse()?;
        }
        if let Some(voice) = var("PATHSENSE_TTS_VOICE") {
            self.speech.voice = voice;
        }
        if let Some(model) = var("PATHSENSE_TTS_MODEL") {
            self.speech.model = model;
        }
        if let Some(speed) = var("PATHSENSE_TTS_SPEED") {
            self.speech.base_speed = parse_env("PATHSENSE_TTS_SPEED", &speed)?;
        }
        if let Some(url) = var("PATHSENSE_TTS_URL") {
            self.speech.base_url = Some(url);
        }
        if let Some(key) = var("OPENAI_API_KEY") {
            self.speech.openai_api_key = Some(key);
        }
        if let Some(key) = var("ELEVENLABS_API_KEY") {
            self.speech.elevenlabs_api_key = Some(key);
        }
        Ok(())
    }

    /// Check values that would break the pipeline
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` describing the first invalid value
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.capture.jpeg_quality) {
            return Err(Error::Config(format!(
                "jpeg quality must be 1-100, got {}",
                self.capture.jpeg_quality
            )));
        }
        if self.capture.period.is_some_and(|p| p.is_zero()) {
            return Err(Error::Config("capture period must be positive".to_string()));
        }
        if self.speech.base_speed.is_nan() || self.speech.base_speed <= 0.0 {
            return Err(Error::Config(format!(
                "speech speed must be positive, got {}",
                self.speech.base_speed
            )));
        }
        if self.speech.request_timeout.is_zero() {
            return Err(Error::Config("speech timeout must be positive".to_string()));
        }
        if self.detector_url.is_empty() {
            return Err(Error::Config("detector URL required".to_string()));
        }
        Ok(())
    }

    /// Interval between captured frames
    #[must_use]
    pub fn capture_period(&self) -> Duration {
        self.capture
            .period
            .unwrap_or_else(|| self.mode.capture_period())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("invalid value for {key}: {value}")))
}
