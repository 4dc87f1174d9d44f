//! Label narration for object and currency modes

use std::sync::Arc;

use super::Annunciator;
use crate::detection::{Detection, FrameGeometry};
use crate::speech::{BASELINE_RATE, SpeechChannel, Utterance};

/// Whether a narrator repeats itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatPolicy {
    /// Speak every non-empty batch
    Always,
    /// Stay quiet while the labels are unchanged
    MuteRepeats,
}

/// Speaks the labels of each batch, comma separated, in detector order
pub struct LabelNarrator {
    speech: Arc<dyn SpeechChannel>,
    policy: RepeatPolicy,
    last_spoken: Option<String>,
}

impl LabelNarrator {
    #[must_use]
    pub fn new(speech: Arc<dyn SpeechChannel>, policy: RepeatPolicy) -> Self {
        Self {
            speech,
            policy,
            last_spoken: None,
        }
    }

    /// Text last handed to the speech channel
    #[must_use]
    pub fn last_spoken(&self) -> Option<&str> {
        self.last_spoken.as_deref()
    }
}

impl Annunciator for LabelNarrator {
    fn annunciate(&mut self, batch: &[Detection], _frame: FrameGeometry) {
        if batch.is_empty() {
            return;
        }

        let text = batch
            .iter()
            .map(|d| d.label.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        if self.policy == RepeatPolicy::MuteRepeats && self.last_spoken.as_deref() == Some(&text) {
            tracing::trace!(%text, "labels unchanged");
            return;
        }

        self.speech.cancel_current();
        if let Err(e) = self.speech.speak(Utterance::new(text.clone(), BASELINE_RATE)) {
            tracing::warn!(error = %e, "failed to speak labels");
        }
        self.last_spoken = Some(text);
    }

    fn silence(&mut self) {
        self.speech.cancel_current();
    }
}
