//! Assistance session
//!
//! Owns the detection channel for its lifetime and multiplexes three
//! triggers on one task: the capture timer, batch arrival, and control
//! commands. Batches are handled one at a time in arrival order, so the
//! annunciator never sees concurrent calls.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::Result;
use crate::annunciation::{
    Annunciator, Arbiter, ArbiterSettings, Clock, LabelNarrator, RepeatPolicy,
};
use crate::capture::{DEFAULT_JPEG_QUALITY, FrameSource, capture_frame};
use crate::channel::DetectionChannel;
use crate::config::Config;
use crate::detection::Detection;
use crate::mode::AssistMode;
use crate::overlay::{self, OverlayRenderer, Viewport};
use crate::speech::SpeechChannel;

/// Commands accepted by a running session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Stop speaking now (e.g. the app went to the background)
    Silence,
    /// Tear the session down
    Shutdown,
}

/// Handle for controlling a running session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Control>,
}

impl SessionHandle {
    /// Stop current and scheduled speech
    pub async fn silence(&self) {
        let _ = self.tx.send(Control::Silence).await;
    }

    /// Ask the session to tear down
    pub async fn shutdown(&self) {
        let _ = self.tx.send(Control::Shutdown).await;
    }
}

/// Session tuning
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub mode: AssistMode,
    /// Interval between captured frames
    pub capture_period: Duration,
    /// JPEG quality for outbound frames
    pub jpeg_quality: u8,
    /// Overlay surface; defaults to the frame size
    pub viewport: Option<Viewport>,
}

impl SessionSettings {
    #[must_use]
    pub const fn for_mode(mode: AssistMode) -> Self {
        Self {
            mode,
            capture_period: mode.capture_period(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            viewport: None,
        }
    }
}

impl From<&Config> for SessionSettings {
    fn from(config: &Config) -> Self {
        Self {
            mode: config.mode,
            capture_period: config.capture_period(),
            jpeg_quality: config.capture.jpeg_quality,
            viewport: None,
        }
    }
}

/// Counters reported when a session ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames_sent: u64,
    /// Capture ticks where the source was not ready, the channel was down
    /// or the send failed
    pub frames_skipped: u64,
    pub batches_received: u64,
}

/// Build the annunciator for a mode
#[must_use]
pub fn annunciator_for(
    mode: AssistMode,
    speech: Arc<dyn SpeechChannel>,
    clock: Arc<dyn Clock>,
    settings: ArbiterSettings,
) -> Box<dyn Annunciator> {
    match mode {
        AssistMode::Walking => Box::new(Arbiter::with_settings(speech, clock, settings)),
        AssistMode::Objects => Box::new(LabelNarrator::new(speech, RepeatPolicy::Always)),
        AssistMode::Currency => Box::new(LabelNarrator::new(speech, RepeatPolicy::MuteRepeats)),
    }
}

/// A running assistance pipeline
pub struct AssistSession<C, S> {
    channel: C,
    source: S,
    annunciator: Box<dyn Annunciator>,
    overlay: Box<dyn OverlayRenderer>,
    settings: SessionSettings,
    control: mpsc::Receiver<Control>,
    stats: SessionStats,
}

impl<C: DetectionChannel, S: FrameSource> AssistSession<C, S> {
    /// Create a session and the handle that controls it
    #[must_use]
    pub fn new(
        channel: C,
        source: S,
        annunciator: Box<dyn Annunciator>,
        overlay: Box<dyn OverlayRenderer>,
        settings: SessionSettings,
    ) -> (Self, SessionHandle) {
        let (tx, control) = mpsc::channel(8);

        let session = Self {
            channel,
            source,
            annunciator,
            overlay,
            settings,
            control,
            stats: SessionStats::default(),
        };

        (session, SessionHandle { tx })
    }

    /// Run until shutdown is requested or every handle is dropped
    ///
    /// # Errors
    ///
    /// Returns error if the detection channel cannot connect
    pub async fn run(mut self) -> Result<SessionStats> {
        self.channel.connect().await?;

        tracing::info!(
            mode = %self.settings.mode,
            period_ms = u64::try_from(self.settings.capture_period.as_millis()).unwrap_or(u64::MAX),
            "session started"
        );

        let mut ticker = tokio::time::interval(self.settings.capture_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut inbound_open = true;

        loop {
            tokio::select! {
                biased;

                control = self.control.recv() => match control {
                    Some(Control::Silence) => {
                        tracing::debug!("silence requested");
                        self.annunciator.silence();
                    }
                    Some(Control::Shutdown) | None => {
                        tracing::info!("shutdown requested");
                        break;
                    }
                },
                batch = self.channel.next_batch(), if inbound_open => match batch {
                    Some(batch) => self.on_batch(&batch),
                    None => {
                        // Stalled channel: keep capturing, keep state
                        tracing::warn!("detection channel closed, no further batches");
                        inbound_open = false;
                    }
                },
                _ = ticker.tick() => self.on_tick().await,
            }
        }

        self.teardown().await;
        Ok(self.stats)
    }

    async fn on_tick(&mut self) {
        if !self.channel.is_connected() {
            tracing::trace!("detection channel down, frame not sent");
            self.stats.frames_skipped += 1;
            return;
        }

        let frame = match capture_frame(&mut self.source, self.settings.jpeg_quality) {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                tracing::trace!("frame not ready");
                self.stats.frames_skipped += 1;
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "frame capture failed");
                self.stats.frames_skipped += 1;
                return;
            }
        };

        match self.channel.send_frame(&frame).await {
            Ok(()) => {
                self.stats.frames_sent += 1;
                tracing::trace!(
                    width = frame.geometry.width,
                    height = frame.geometry.height,
                    "frame sent"
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to send frame");
                self.stats.frames_skipped += 1;
            }
        }
    }

    fn on_batch(&mut self, batch: &[Detection]) {
        self.stats.batches_received += 1;
        let frame = self.source.geometry();
        tracing::debug!(detections = batch.len(), "batch received");

        let viewport = self.settings.viewport.unwrap_or_else(|| frame.into());
        self.overlay
            .render(&overlay::layout(self.settings.mode, batch, frame, viewport));

        self.annunciator.annunciate(batch, frame);
    }

    async fn teardown(&mut self) {
        self.annunciator.silence();

        if let Err(e) = self.channel.disconnect().await {
            tracing::warn!(error = %e, "detection channel disconnect failed");
        }

        tracing::info!(
            frames_sent = self.stats.frames_sent,
            frames_skipped = self.stats.frames_skipped,
            batches = self.stats.batches_received,
            "session stopped"
        );
    }
}
