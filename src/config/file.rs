//! TOML configuration file loading
//!
//! Supports `~/.config/pathsense/config.toml` as a persistent config source.
//! All fields are optional: the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::mode::AssistMode;
use crate::speech::TtsProvider;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Detector connection
    #[serde(default)]
    pub detector: DetectorFileConfig,

    /// Frame capture
    #[serde(default)]
    pub capture: CaptureFileConfig,

    /// Speech output
    #[serde(default)]
    pub speech: SpeechFileConfig,

    /// Annunciation timings and rates
    #[serde(default)]
    pub annunciation: AnnunciationFileConfig,
}

/// Detector connection configuration
#[derive(Debug, Default, Deserialize)]
pub struct DetectorFileConfig {
    /// WebSocket URL (e.g. "ws://localhost:5000/ws")
    pub url: Option<String>,
}

/// Frame capture configuration
#[derive(Debug, Default, Deserialize)]
pub struct CaptureFileConfig {
    /// Assistance mode ("walking", "objects", "currency")
    pub mode: Option<AssistMode>,

    /// Override the mode's capture period
    pub period_ms: Option<u64>,

    /// JPEG quality for outbound frames (1-100)
    pub jpeg_quality: Option<u8>,

    /// Directory of frames to replay
    pub frames_dir: Option<PathBuf>,
}

/// Speech output configuration
#[derive(Debug, Default, Deserialize)]
pub struct SpeechFileConfig {
    /// Enable spoken output
    pub enabled: Option<bool>,

    /// TTS provider ("openai", "elevenlabs")
    pub provider: Option<TtsProvider>,

    /// TTS voice identifier (e.g. "alloy")
    pub voice: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub model: Option<String>,

    /// Base speed multiplier
    pub speed: Option<f32>,

    /// Bound on one synthesis request
    pub timeout_ms: Option<u64>,

    /// `OpenAI`-compatible API base (e.g. "http://localhost:8880/v1")
    pub base_url: Option<String>,

    pub openai_api_key: Option<String>,
    pub elevenlabs_api_key: Option<String>,
}

/// Annunciation configuration
#[derive(Debug, Default, Deserialize)]
pub struct AnnunciationFileConfig {
    pub debounce_ms: Option<u64>,
    pub summary_delay_ms: Option<u64>,
    pub warning_rate: Option<f32>,
    pub urgent_summary_rate: Option<f32>,
    pub calm_summary_rate: Option<f32>,
}

/// Load the TOML config file from the standard path
///
/// Returns `ConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> ConfigFile {
    config_file_path().map_or_else(ConfigFile::default, |path| load_config_file_from(&path))
}

/// Load a TOML config file from an explicit path
///
/// Returns `ConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file_from(path: &Path) -> ConfigFile {
    if !path.exists() {
        return ConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                ConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            ConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/pathsense/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("pathsense").join("config.toml"))
}
