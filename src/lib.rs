//! pathsense - spoken obstacle and scene alerts from a live camera feed
//!
//! Frames are streamed to a remote object detector; each returned batch of
//! detections is classified into coarse zones and turned into prioritized
//! speech on a single shared voice.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  frames   ┌──────────────────┐
//! │ Frame source │──────────▶│ Detection channel│──▶ remote detector
//! └──────────────┘           └────────┬─────────┘
//!                                     │ batches
//!                     ┌───────────────▼───────────────┐
//!                     │ Zone classifier               │
//!                     └───────┬───────────────┬───────┘
//!                             │               │
//!                 ┌───────────▼───┐   ┌───────▼────────┐
//!                 │ Scene summary │   │ Warnings       │   Overlay
//!                 └───────────┬───┘   └───────┬────────┘
//!                     ┌───────▼───────────────▼───────┐
//!                     │ Annunciation arbiter          │
//!                     └───────────────┬───────────────┘
//!                                     ▼
//!                               Speech channel
//! ```

pub mod annunciation;
pub mod capture;
pub mod channel;
pub mod config;
pub mod detection;
pub mod error;
pub mod mode;
pub mod overlay;
pub mod scene;
pub mod session;
pub mod speech;

pub use annunciation::{Annunciator, Arbiter, ArbiterSettings, Clock, Decision, MonotonicClock};
pub use capture::{EncodedFrame, FrameSource, ImageDirSource};
pub use channel::{DetectionChannel, WsDetectionChannel};
pub use config::Config;
pub use detection::{
    BoundingBox, ClassifiedDetection, Detection, FrameGeometry, Position, Proximity, Zone,
    classify_batch,
};
pub use error::{Error, Result};
pub use mode::AssistMode;
pub use scene::{SceneSummary, Warning, WarningSet};
pub use session::{AssistSession, SessionHandle, SessionSettings, SessionStats};
pub use speech::{LogSpeech, SpeechChannel, Utterance, UtteranceOutcome};
