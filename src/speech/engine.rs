//! Network TTS speech channel
//!
//! A dedicated worker thread owns the audio device and plays queued
//! utterances in order. Cancellation bumps a generation counter: queued
//! utterances from an older generation are dropped, a synthesis request in
//! flight is abandoned, and the one playing stops at its next poll.

use async_trait::async_trait;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, watch};

use super::playback::{AudioPlayback, PlaybackEnd};
use super::tts::TextToSpeech;
use super::{Completion, SpeechChannel, Utterance, UtteranceOutcome};
use crate::{Error, Result};

/// Synthesis and playback used by the speech worker
///
/// Runs on the worker thread only, so implementations need not be `Send`.
#[async_trait(?Send)]
pub trait Voice {
    /// Render text to audio bytes
    async fn synthesize(&self, text: &str, rate: f32) -> Result<Vec<u8>>;

    /// Play rendered audio, stopping early once `interrupted` returns true
    fn play(&self, audio: &[u8], interrupted: &dyn Fn() -> bool) -> Result<PlaybackEnd>;
}

/// TTS API plus the default output device
pub struct TtsVoice {
    tts: TextToSpeech,
    playback: Option<AudioPlayback>,
}

impl TtsVoice {
    /// Open the output device; without one every utterance fails
    #[must_use]
    pub fn new(tts: TextToSpeech) -> Self {
        let playback = match AudioPlayback::new() {
            Ok(playback) => Some(playback),
            Err(e) => {
                tracing::warn!(error = %e, "no audio output, utterances will fail");
                None
            }
        };

        Self { tts, playback }
    }
}

#[async_trait(?Send)]
impl Voice for TtsVoice {
    async fn synthesize(&self, text: &str, rate: f32) -> Result<Vec<u8>> {
        self.tts.synthesize(text, rate).await
    }

    fn play(&self, audio: &[u8], interrupted: &dyn Fn() -> bool) -> Result<PlaybackEnd> {
        self.playback
            .as_ref()
            .ok_or_else(|| Error::Audio("no output device".to_string()))?
            .play_mp3(audio, interrupted)
    }
}

struct Queued {
    utterance: Utterance,
    generation: u64,
    done: oneshot::Sender<UtteranceOutcome>,
}

/// Speech channel backed by a worker thread and a [`Voice`]
pub struct TtsSpeech {
    queue: mpsc::UnboundedSender<Queued>,
    generation: watch::Sender<u64>,
}

impl TtsSpeech {
    /// Start the speech worker for a TTS API and the default output device
    ///
    /// # Errors
    ///
    /// Returns error if called outside a tokio runtime or the worker thread
    /// cannot be spawned
    pub fn spawn(tts: TextToSpeech) -> Result<Self> {
        Self::spawn_with(move || TtsVoice::new(tts))
    }

    /// Start the speech worker with a voice built on the worker thread
    ///
    /// Synthesis requests run on the calling tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns error if called outside a tokio runtime or the worker thread
    /// cannot be spawned
    pub fn spawn_with<V, F>(make_voice: F) -> Result<Self>
    where
        V: Voice + 'static,
        F: FnOnce() -> V + Send + 'static,
    {
        let handle = Handle::try_current()
            .map_err(|e| Error::Speech(format!("speech worker needs a tokio runtime: {e}")))?;
        let (queue, rx) = mpsc::unbounded_channel();
        let (generation, current) = watch::channel(0);

        std::thread::Builder::new()
            .name("pathsense-speech".to_string())
            .spawn(move || {
                let voice = make_voice();
                run_worker(&voice, &handle, rx, &current);
            })
            .map_err(|e| Error::Speech(format!("failed to start speech worker: {e}")))?;

        Ok(Self { queue, generation })
    }
}

impl SpeechChannel for TtsSpeech {
    fn speak(&self, utterance: Utterance) -> Result<Completion> {
        let (done, completion) = oneshot::channel();
        let queued = Queued {
            utterance,
            generation: *self.generation.borrow(),
            done,
        };

        self.queue
            .send(queued)
            .map_err(|_| Error::Speech("speech worker stopped".to_string()))?;

        Ok(completion)
    }

    fn cancel_current(&self) {
        self.generation.send_modify(|generation| *generation += 1);
    }
}

fn run_worker<V: Voice>(
    voice: &V,
    handle: &Handle,
    mut rx: mpsc::UnboundedReceiver<Queued>,
    current: &watch::Receiver<u64>,
) {
    while let Some(Queued {
        utterance,
        generation,
        done,
    }) = rx.blocking_recv()
    {
        let outcome = speak_one(voice, handle, current, generation, &utterance);

        tracing::debug!(text = %utterance.text, ?outcome, "utterance ended");
        let _ = done.send(outcome);
    }

    tracing::debug!("speech worker stopped");
}

fn speak_one<V: Voice>(
    voice: &V,
    handle: &Handle,
    current: &watch::Receiver<u64>,
    generation: u64,
    utterance: &Utterance,
) -> UtteranceOutcome {
    let stale = || *current.borrow() != generation;
    if stale() {
        return UtteranceOutcome::Cancelled;
    }

    let mut cancelled = current.clone();
    let synthesized = handle.block_on(async {
        tokio::select! {
            result = voice.synthesize(&utterance.text, utterance.rate) => Some(result),
            _ = cancelled.wait_for(|g| *g != generation) => None,
        }
    });

    let audio = match synthesized {
        Some(Ok(audio)) => audio,
        Some(Err(e)) => {
            tracing::warn!(error = %e, "speech synthesis failed");
            return UtteranceOutcome::Failed;
        }
        None => return UtteranceOutcome::Cancelled,
    };

    // cancelled between synthesis and playback
    if stale() {
        return UtteranceOutcome::Cancelled;
    }

    match voice.play(&audio, &stale) {
        Ok(PlaybackEnd::Completed) => UtteranceOutcome::Finished,
        Ok(PlaybackEnd::Interrupted) => UtteranceOutcome::Cancelled,
        Err(e) => {
            tracing::warn!(error = %e, "speech playback failed");
            UtteranceOutcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::*;
    use crate::speech::BASELINE_RATE;

    /// Voice driven by the text it is given
    ///
    /// "hang" never finishes synthesizing, "broken" fails to synthesize and
    /// "long" plays until interrupted.
    #[derive(Clone, Default)]
    struct ScriptedVoice {
        started: Arc<Mutex<Vec<String>>>,
        played: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait(?Send)]
    impl Voice for ScriptedVoice {
        async fn synthesize(&self, text: &str, _rate: f32) -> Result<Vec<u8>> {
            match text {
                "hang" => std::future::pending().await,
                "broken" => Err(Error::Tts("synthesis rejected".to_string())),
                _ => Ok(text.as_bytes().to_vec()),
            }
        }

        fn play(&self, audio: &[u8], interrupted: &dyn Fn() -> bool) -> Result<PlaybackEnd> {
            let text = String::from_utf8_lossy(audio).into_owned();
            self.started.lock().unwrap().push(text.clone());

            if text == "long" {
                for _ in 0..1000 {
                    if interrupted() {
                        return Ok(PlaybackEnd::Interrupted);
                    }
                    std::thread::sleep(Duration::from_millis(5));
                }
            }

            self.played.lock().unwrap().push(text);
            Ok(PlaybackEnd::Completed)
        }
    }

    fn say(speech: &TtsSpeech, text: &str) -> Completion {
        speech.speak(Utterance::new(text, BASELINE_RATE)).unwrap()
    }

    async fn outcome(completion: Completion) -> UtteranceOutcome {
        tokio::time::timeout(Duration::from_secs(5), completion)
            .await
            .expect("utterance did not end")
            .expect("worker dropped the utterance")
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_utterances_play_in_order() {
        let voice = ScriptedVoice::default();
        let speech = TtsSpeech::spawn_with({
            let voice = voice.clone();
            move || voice
        })
        .unwrap();

        let first = say(&speech, "first");
        let second = say(&speech, "second");
        let third = say(&speech, "third");

        assert_eq!(outcome(first).await, UtteranceOutcome::Finished);
        assert_eq!(outcome(second).await, UtteranceOutcome::Finished);
        assert_eq!(outcome(third).await, UtteranceOutcome::Finished);
        assert_eq!(*voice.played.lock().unwrap(), ["first", "second", "third"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_cancel_abandons_synthesis_and_drops_queue() {
        let voice = ScriptedVoice::default();
        let speech = TtsSpeech::spawn_with({
            let voice = voice.clone();
            move || voice
        })
        .unwrap();

        let stuck = say(&speech, "hang");
        let queued = say(&speech, "queued");
        speech.cancel_current();
        let urgent = say(&speech, "urgent");

        assert_eq!(outcome(stuck).await, UtteranceOutcome::Cancelled);
        assert_eq!(outcome(queued).await, UtteranceOutcome::Cancelled);
        assert_eq!(outcome(urgent).await, UtteranceOutcome::Finished);
        assert_eq!(*voice.played.lock().unwrap(), ["urgent"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_cancel_interrupts_playback() {
        let voice = ScriptedVoice::default();
        let speech = TtsSpeech::spawn_with({
            let voice = voice.clone();
            move || voice
        })
        .unwrap();

        let long = say(&speech, "long");
        for _ in 0..400 {
            if !voice.started.lock().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        speech.cancel_current();

        assert_eq!(outcome(long).await, UtteranceOutcome::Cancelled);
        assert!(voice.played.lock().unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failure_does_not_stop_worker() {
        let voice = ScriptedVoice::default();
        let speech = TtsSpeech::spawn_with({
            let voice = voice.clone();
            move || voice
        })
        .unwrap();

        assert_eq!(outcome(say(&speech, "broken")).await, UtteranceOutcome::Failed);
        assert_eq!(outcome(say(&speech, "after")).await, UtteranceOutcome::Finished);
    }

    #[test]
    fn test_spawn_needs_runtime() {
        let result = TtsSpeech::spawn_with(ScriptedVoice::default);
        assert!(matches!(result, Err(Error::Speech(_))));
    }
}
