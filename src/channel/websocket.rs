//! WebSocket detection channel

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use super::{DetectionChannel, Envelope, decode_message};
use crate::capture::EncodedFrame;
use crate::detection::Detection;
use crate::mode::AssistMode;
use crate::{Error, Result};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Detection channel over a WebSocket carrying JSON envelopes
pub struct WsDetectionChannel {
    url: String,
    mode: AssistMode,
    sink: Option<SplitSink<WsStream, Message>>,
    stream: Option<SplitStream<WsStream>>,
}

impl WsDetectionChannel {
    /// Create an unconnected channel
    ///
    /// * `url`  - detector endpoint, e.g. `ws://localhost:5000/ws`
    /// * `mode` - selects the event names used on the wire
    #[must_use]
    pub const fn new(url: String, mode: AssistMode) -> Self {
        Self {
            url,
            mode,
            sink: None,
            stream: None,
        }
    }
}

#[async_trait]
impl DetectionChannel for WsDetectionChannel {
    async fn connect(&mut self) -> Result<()> {
        let (ws, _response) = connect_async(self.url.as_str()).await.map_err(|e| {
            Error::Channel(format!("failed to connect to detector at {}: {e}", self.url))
        })?;

        let (sink, stream) = ws.split();
        self.sink = Some(sink);
        self.stream = Some(stream);

        tracing::info!(url = %self.url, mode = %self.mode, "connected to detector");
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.stream = None;
        if let Some(mut sink) = self.sink.take() {
            sink.close().await?;
            tracing::info!(url = %self.url, "disconnected from detector");
        }
        Ok(())
    }

    async fn send_frame(&mut self, frame: &EncodedFrame) -> Result<()> {
        let sink = self
            .sink
            .as_mut()
            .ok_or_else(|| Error::Channel("not connected".to_string()))?;

        let text = serde_json::to_string(&Envelope::frame(self.mode, frame))?;
        sink.send(Message::Text(text)).await?;
        Ok(())
    }

    async fn next_batch(&mut self) -> Option<Vec<Detection>> {
        let stream = self.stream.as_mut()?;

        while let Some(message) = stream.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    if let Some(batch) = decode_message(self.mode, &text) {
                        return Some(batch);
                    }
                }
                Ok(Message::Close(frame)) => {
                    tracing::info!(?frame, "detector closed the channel");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "detector channel error");
                    break;
                }
            }
        }

        // Without an inbound side the socket is dead, stop sending into it
        self.stream = None;
        self.sink = None;
        None
    }

    fn is_connected(&self) -> bool {
        self.sink.is_some()
    }
}
