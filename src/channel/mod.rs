//! Detection channel
//!
//! Bidirectional event stream to the remote detector: frames go out, one
//! detection batch comes back per processed frame. Sends and arrivals are
//! not paired; a new frame may leave before the previous batch returns.

mod websocket;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::capture::EncodedFrame;
use crate::detection::Detection;
use crate::mode::AssistMode;

pub use websocket::WsDetectionChannel;

/// JSON envelope for every message on the channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Envelope {
    /// Outbound frame for a mode
    #[must_use]
    pub fn frame(mode: AssistMode, frame: &EncodedFrame) -> Self {
        Self {
            event: mode.frame_event().to_string(),
            data: serde_json::Value::String(frame.data_url.clone()),
        }
    }
}

/// Trait for detection channel transports
#[async_trait]
pub trait DetectionChannel: Send {
    /// Open the connection
    async fn connect(&mut self) -> Result<()>;

    /// Close the connection
    async fn disconnect(&mut self) -> Result<()>;

    /// Send one encoded frame
    async fn send_frame(&mut self, frame: &EncodedFrame) -> Result<()>;

    /// Wait for the next detection batch
    ///
    /// Returns `None` once the inbound stream has ended. Must be cancel safe.
    async fn next_batch(&mut self) -> Option<Vec<Detection>>;

    /// Check if connected
    ///
    /// False before `connect`, after `disconnect`, and once `next_batch`
    /// has reported the end of the inbound stream.
    fn is_connected(&self) -> bool;
}

/// Decode the payload of an inbound detections event
///
/// Anything that does not parse is an empty batch.
#[must_use]
pub fn parse_detections(mode: AssistMode, data: serde_json::Value) -> Vec<Detection> {
    #[derive(Deserialize)]
    struct Wrapped {
        #[serde(default)]
        detections: Vec<Detection>,
    }

    let parsed = if mode.wraps_detections() {
        serde_json::from_value::<Wrapped>(data).map(|w| w.detections)
    } else {
        serde_json::from_value::<Vec<Detection>>(data)
    };

    parsed.unwrap_or_else(|e| {
        tracing::debug!(error = %e, "malformed detection batch");
        Vec::new()
    })
}

/// Decode an inbound text message into a batch for `mode`
///
/// Returns `None` for messages that are not this mode's detections event.
#[must_use]
pub fn decode_message(mode: AssistMode, text: &str) -> Option<Vec<Detection>> {
    let envelope: Envelope = match serde_json::from_str(text) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::debug!(error = %e, "unreadable channel message");
            return None;
        }
    };

    if envelope.event != mode.detections_event() {
        tracing::trace!(event = %envelope.event, "ignoring event");
        return None;
    }

    Some(parse_detections(mode, envelope.data))
}
