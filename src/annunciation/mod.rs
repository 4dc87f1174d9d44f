//! Annunciation: turning detection batches into speech
//!
//! Each assistance mode has an [`Annunciator`] that receives every batch
//! from the detection channel, in arrival order, and decides what the
//! single shared voice should say.

mod arbiter;
mod clock;
mod narrator;

use crate::detection::{Detection, FrameGeometry};

pub use arbiter::{
    AnnunciationPlan, AnnunciationState, Arbiter, ArbiterSettings, Decision, Narration,
};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use narrator::{LabelNarrator, RepeatPolicy};

/// Receives detection batches and drives the speech channel
pub trait Annunciator: Send {
    /// Handle one batch, classified against the frame current at arrival
    fn annunciate(&mut self, batch: &[Detection], frame: FrameGeometry);

    /// Stop all speech now, including anything scheduled
    fn silence(&mut self);
}
