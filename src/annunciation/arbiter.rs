//! Annunciation arbiter for walking assistance
//!
//! For every batch the arbiter decides whether to speak at all, then emits
//! hazard warnings first and the scene narration after a short delay.
//!
//! - Urgent batches (any warning mentioning an obstacle) always speak and
//!   pre-empt whatever is playing.
//! - Other batches are dropped if the scene is unchanged since the last
//!   narration, or if that narration finished less than the debounce window
//!   ago.
//! - Memory of the last narration is only updated once it has actually been
//!   spoken to the end.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use super::{Annunciator, Clock};
use crate::detection::{ClassifiedDetection, Detection, FrameGeometry, classify_batch};
use crate::scene::{NO_OBJECT, SceneSummary, WarningSet};
use crate::speech::{
    BASELINE_RATE, CALM_SUMMARY_RATE, SpeechChannel, Utterance, UtteranceOutcome, WARNING_RATE,
};

/// Default minimum gap between non-urgent narrations
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1200);

/// Default gap between the warning and the narration that follows it
pub const DEFAULT_SUMMARY_DELAY: Duration = Duration::from_millis(500);

/// Timing and rate policy for the arbiter
#[derive(Debug, Clone, PartialEq)]
pub struct ArbiterSettings {
    /// Non-urgent batches within this window of the last narration are dropped
    pub debounce: Duration,
    /// Delay before narrating when warnings were spoken first
    pub summary_delay: Duration,
    /// Rate for warnings
    pub warning_rate: f32,
    /// Rate for narration of an urgent batch
    pub urgent_summary_rate: f32,
    /// Rate for narration of a non-urgent batch
    pub calm_summary_rate: f32,
}

impl Default for ArbiterSettings {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            summary_delay: DEFAULT_SUMMARY_DELAY,
            warning_rate: WARNING_RATE,
            urgent_summary_rate: BASELINE_RATE,
            calm_summary_rate: CALM_SUMMARY_RATE,
        }
    }
}

/// What the arbiter remembers between batches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnunciationState {
    pub last_summary: Option<SceneSummary>,
    pub last_summary_at: Option<Duration>,
    pub last_spoken_text: Option<String>,
    pub last_spoken_at: Option<Duration>,
}

/// Narration scheduled after the warnings
#[derive(Debug, Clone, PartialEq)]
pub struct Narration {
    pub utterance: Utterance,
    /// Delay from dispatch until the narration is requested
    pub delay: Duration,
    /// Summary recorded once the narration finishes
    pub summary: SceneSummary,
    /// Full text recorded as last spoken
    pub spoken_text: String,
}

/// Speech to emit for one batch
#[derive(Debug, Clone, PartialEq)]
pub struct AnnunciationPlan {
    pub urgent: bool,
    /// Spoken immediately after pre-empting current speech
    pub warnings: Option<Utterance>,
    pub narration: Option<Narration>,
}

/// Outcome of arbitrating one batch
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Nothing is spoken and no state changes
    Suppressed,
    Speak(AnnunciationPlan),
}

/// Arbitrates the speech channel for walking assistance
pub struct Arbiter {
    speech: Arc<dyn SpeechChannel>,
    clock: Arc<dyn Clock>,
    settings: ArbiterSettings,
    state: Arc<Mutex<AnnunciationState>>,
    pending: Option<JoinHandle<()>>,
}

impl Arbiter {
    /// Create an arbiter with default timings
    #[must_use]
    pub fn new(speech: Arc<dyn SpeechChannel>, clock: Arc<dyn Clock>) -> Self {
        Self::with_settings(speech, clock, ArbiterSettings::default())
    }

    #[must_use]
    pub fn with_settings(
        speech: Arc<dyn SpeechChannel>,
        clock: Arc<dyn Clock>,
        settings: ArbiterSettings,
    ) -> Self {
        Self {
            speech,
            clock,
            settings,
            state: Arc::new(Mutex::new(AnnunciationState::default())),
            pending: None,
        }
    }

    /// Snapshot of the remembered state
    #[must_use]
    pub fn state(&self) -> AnnunciationState {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Decide what to say for a classified batch, without speaking
    #[must_use]
    pub fn plan(&self, detections: &[ClassifiedDetection]) -> Decision {
        let summary = SceneSummary::from_detections(detections);
        let warnings = WarningSet::from_detections(detections);
        let urgent = warnings.has_urgent();

        if !urgent && self.is_debounced(&summary) {
            return Decision::Suppressed;
        }

        let warning_utterance = (!warnings.is_empty())
            .then(|| Utterance::new(warnings.to_text(), self.settings.warning_rate));

        let summary_text = summary.to_text();
        let narration = if summary_text == NO_OBJECT {
            // Warnings always come with detections, so this is an empty scene
            warnings.is_empty().then(|| Narration {
                utterance: Utterance::new(NO_OBJECT, BASELINE_RATE),
                delay: Duration::ZERO,
                spoken_text: NO_OBJECT.to_string(),
                summary: summary.clone(),
            })
        } else {
            let rate = if urgent {
                self.settings.urgent_summary_rate
            } else {
                self.settings.calm_summary_rate
            };
            let (delay, spoken_text) = if warnings.is_empty() {
                (Duration::ZERO, summary_text.clone())
            } else {
                (
                    self.settings.summary_delay,
                    format!("{}; {summary_text}", warnings.to_text()),
                )
            };

            Some(Narration {
                utterance: Utterance::new(summary_text, rate),
                delay,
                spoken_text,
                summary: summary.clone(),
            })
        };

        Decision::Speak(AnnunciationPlan {
            urgent,
            warnings: warning_utterance,
            narration,
        })
    }

    /// Decide and speak for a classified batch
    pub fn arbitrate(&mut self, detections: &[ClassifiedDetection]) -> Decision {
        let decision = self.plan(detections);

        match &decision {
            Decision::Suppressed => {
                tracing::trace!(detections = detections.len(), "batch debounced");
            }
            Decision::Speak(plan) => self.dispatch(plan.clone()),
        }

        decision
    }

    fn is_debounced(&self, summary: &SceneSummary) -> bool {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        let repeated = state.last_summary.as_ref() == Some(summary);
        let recent = state
            .last_summary_at
            .is_some_and(|at| self.clock.now().saturating_sub(at) < self.settings.debounce);

        repeated || recent
    }

    fn dispatch(&mut self, plan: AnnunciationPlan) {
        self.abort_pending();
        self.speech.cancel_current();

        tracing::debug!(
            urgent = plan.urgent,
            warnings = ?plan.warnings.as_ref().map(|u| u.text.as_str()),
            narration = ?plan.narration.as_ref().map(|n| n.utterance.text.as_str()),
            "annunciating"
        );

        if let Some(warnings) = plan.warnings {
            // Warning completion is not tracked, only the narration updates state
            if let Err(e) = self.speech.speak(warnings) {
                tracing::warn!(error = %e, "failed to speak warnings");
            }
        }

        if let Some(narration) = plan.narration {
            let speech = Arc::clone(&self.speech);
            let clock = Arc::clone(&self.clock);
            let state = Arc::clone(&self.state);

            self.pending = Some(tokio::spawn(async move {
                narrate(speech.as_ref(), clock.as_ref(), &state, narration).await;
            }));
        }
    }

    fn abort_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

async fn narrate(
    speech: &dyn SpeechChannel,
    clock: &dyn Clock,
    state: &Mutex<AnnunciationState>,
    narration: Narration,
) {
    if !narration.delay.is_zero() {
        tokio::time::sleep(narration.delay).await;
    }

    let completion = match speech.speak(narration.utterance) {
        Ok(completion) => completion,
        Err(e) => {
            tracing::warn!(error = %e, "failed to speak narration");
            return;
        }
    };

    match completion.await {
        Ok(UtteranceOutcome::Finished) => {
            let now = clock.now();
            let mut state = state.lock().unwrap_or_else(|e| e.into_inner());
            state.last_summary = Some(narration.summary);
            state.last_summary_at = Some(now);
            state.last_spoken_text = Some(narration.spoken_text);
            state.last_spoken_at = Some(now);
        }
        Ok(outcome) => tracing::debug!(?outcome, "narration not completed"),
        Err(_) => tracing::debug!("speech channel dropped narration"),
    }
}

impl Annunciator for Arbiter {
    fn annunciate(&mut self, batch: &[Detection], frame: FrameGeometry) {
        let Some(detections) = classify_batch(batch, frame) else {
            tracing::trace!("frame not ready, skipping batch");
            return;
        };

        self.arbitrate(&detections);
    }

    fn silence(&mut self) {
        self.abort_pending();
        self.speech.cancel_current();
    }
}

impl Drop for Arbiter {
    fn drop(&mut self) {
        self.abort_pending();
    }
}
