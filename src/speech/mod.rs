//! Speech channel
//!
//! A single voice shared by the whole process. Utterances queue behind the
//! one currently playing; `cancel_current` stops it and drops the queue.
//! Annunciators drive the channel but never own the voice.

mod engine;
mod playback;
mod tts;

use std::sync::Arc;

use tokio::sync::oneshot;

use crate::Result;
use crate::config::SpeechConfig;

pub use engine::{TtsSpeech, TtsVoice, Voice};
pub use playback::{AudioPlayback, PlaybackEnd};
pub use tts::{DEFAULT_OPENAI_URL, DEFAULT_REQUEST_TIMEOUT, TextToSpeech, TtsProvider};

/// Rate for hazard warnings (slower, clearer)
pub const WARNING_RATE: f32 = 0.95;

/// Baseline speaking rate
pub const BASELINE_RATE: f32 = 1.0;

/// Rate for non-urgent narration
pub const CALM_SUMMARY_RATE: f32 = 1.05;

/// A request to speak one piece of text
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    /// Speed multiplier, 1.0 is the voice's normal pace
    pub rate: f32,
}

impl Utterance {
    #[must_use]
    pub fn new(text: impl Into<String>, rate: f32) -> Self {
        Self {
            text: text.into(),
            rate,
        }
    }
}

/// How an utterance ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtteranceOutcome {
    /// Spoken to the end
    Finished,
    /// Stopped or dropped by `cancel_current`
    Cancelled,
    /// The engine could not speak it
    Failed,
}

/// Resolves once the utterance has ended
pub type Completion = oneshot::Receiver<UtteranceOutcome>;

/// Single-voice speech output
pub trait SpeechChannel: Send + Sync {
    /// Queue an utterance behind whatever is currently speaking
    ///
    /// # Errors
    ///
    /// Returns error if the channel can no longer accept utterances
    fn speak(&self, utterance: Utterance) -> Result<Completion>;

    /// Stop the current utterance and drop everything queued
    ///
    /// Safe to call at any time, including when nothing is speaking.
    fn cancel_current(&self);
}

/// Speech channel used when no voice is available
///
/// Logs each utterance and reports it finished immediately, so the rest of
/// the pipeline keeps its timing behaviour.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSpeech;

impl SpeechChannel for LogSpeech {
    fn speak(&self, utterance: Utterance) -> Result<Completion> {
        tracing::info!(text = %utterance.text, rate = utterance.rate, "speak");

        let (tx, rx) = oneshot::channel();
        let _ = tx.send(UtteranceOutcome::Finished);
        Ok(rx)
    }

    fn cancel_current(&self) {
        tracing::trace!("cancel speech");
    }
}

/// Build the speech channel described by `config`
///
/// Falls back to [`LogSpeech`] when speech is disabled, no API key is
/// configured, or the engine cannot start, so a missing voice never stops
/// the pipeline. Must be called from within a tokio runtime.
#[must_use]
pub fn speech_channel(config: &SpeechConfig) -> Arc<dyn SpeechChannel> {
    if !config.enabled {
        tracing::info!("speech disabled, utterances will be logged");
        return Arc::new(LogSpeech);
    }

    let Some(api_key) = config.api_key() else {
        tracing::warn!(provider = ?config.provider, "no TTS API key, utterances will be logged");
        return Arc::new(LogSpeech);
    };

    let tts = match config.provider {
        TtsProvider::OpenAI => TextToSpeech::new_openai(
            api_key.to_string(),
            config.voice.clone(),
            config.base_speed,
            config.model.clone(),
        ),
        TtsProvider::ElevenLabs => TextToSpeech::new_elevenlabs(
            api_key.to_string(),
            config.voice.clone(),
            config.model.clone(),
        ),
    };

    let tts = tts
        .and_then(|tts| tts.with_timeout(config.request_timeout))
        .map(|tts| match &config.base_url {
            Some(url) => tts.with_base_url(url.as_str()),
            None => tts,
        });

    match tts.and_then(TtsSpeech::spawn) {
        Ok(speech) => {
            tracing::info!(provider = ?config.provider, voice = %config.voice, "speech ready");
            Arc::new(speech)
        }
        Err(e) => {
            tracing::warn!(error = %e, "speech unavailable, utterances will be logged");
            Arc::new(LogSpeech)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_speech_completes_immediately() {
        let completion = LogSpeech.speak(Utterance::new("hello", BASELINE_RATE)).unwrap();
        assert_eq!(completion.await.unwrap(), UtteranceOutcome::Finished);
    }
}
