//! Shared test utilities

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::DynamicImage;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use pathsense::speech::Completion;
use pathsense::{
    BoundingBox, Detection, DetectionChannel, EncodedFrame, FrameGeometry, FrameSource,
    SpeechChannel, Utterance, UtteranceOutcome,
};

/// Something that happened on a [`RecordingSpeech`]
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechEvent {
    Speak {
        text: String,
        rate: f32,
        /// Offset from when the channel was created
        at: Duration,
    },
    Cancel {
        at: Duration,
    },
}

/// Speech channel that records every request
///
/// Utterances finish immediately unless the channel is holding, in which
/// case they stay pending until released or cancelled.
pub struct RecordingSpeech {
    origin: Instant,
    events: Mutex<Vec<SpeechEvent>>,
    hold: AtomicBool,
    pending: Mutex<Vec<oneshot::Sender<UtteranceOutcome>>>,
}

impl RecordingSpeech {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            origin: Instant::now(),
            events: Mutex::new(Vec::new()),
            hold: AtomicBool::new(false),
            pending: Mutex::new(Vec::new()),
        })
    }

    /// A channel whose utterances never finish on their own
    pub fn holding() -> Arc<Self> {
        let speech = Self::new();
        speech.hold.store(true, Ordering::SeqCst);
        speech
    }

    /// Finish every pending utterance
    pub fn release_all(&self) {
        for tx in self.pending.lock().unwrap().drain(..) {
            let _ = tx.send(UtteranceOutcome::Finished);
        }
    }

    pub fn events(&self) -> Vec<SpeechEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Spoken text, rate and request time, in request order
    pub fn spoken(&self) -> Vec<(String, f32, Duration)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SpeechEvent::Speak { text, rate, at } => Some((text, rate, at)),
                SpeechEvent::Cancel { .. } => None,
            })
            .collect()
    }

    pub fn spoken_texts(&self) -> Vec<String> {
        self.spoken().into_iter().map(|(text, _, _)| text).collect()
    }

    pub fn cancel_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, SpeechEvent::Cancel { .. }))
            .count()
    }
}

impl SpeechChannel for RecordingSpeech {
    fn speak(&self, utterance: Utterance) -> pathsense::Result<Completion> {
        self.events.lock().unwrap().push(SpeechEvent::Speak {
            text: utterance.text,
            rate: utterance.rate,
            at: self.origin.elapsed(),
        });

        let (tx, rx) = oneshot::channel();
        if self.hold.load(Ordering::SeqCst) {
            self.pending.lock().unwrap().push(tx);
        } else {
            let _ = tx.send(UtteranceOutcome::Finished);
        }
        Ok(rx)
    }

    fn cancel_current(&self) {
        self.events.lock().unwrap().push(SpeechEvent::Cancel {
            at: self.origin.elapsed(),
        });

        for tx in self.pending.lock().unwrap().drain(..) {
            let _ = tx.send(UtteranceOutcome::Cancelled);
        }
    }
}

/// Speech channel that refuses every utterance
pub struct BrokenSpeech;

impl SpeechChannel for BrokenSpeech {
    fn speak(&self, _utterance: Utterance) -> pathsense::Result<Completion> {
        Err(pathsense::Error::Speech("voice unavailable".to_string()))
    }

    fn cancel_current(&self) {}
}

/// Observations shared with a [`ScriptedChannel`] after it moves into a session
#[derive(Clone, Default)]
pub struct ChannelSpy {
    pub sent: Arc<Mutex<Vec<EncodedFrame>>>,
    pub connected: Arc<AtomicBool>,
    pub disconnects: Arc<AtomicUsize>,
}

impl ChannelSpy {
    pub fn frames_sent(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

/// Detection channel fed from a test through an mpsc sender
///
/// Dropping the sender ends the inbound stream and drops the connection.
pub struct ScriptedChannel {
    batches: mpsc::UnboundedReceiver<Vec<Detection>>,
    spy: ChannelSpy,
}

impl ScriptedChannel {
    pub fn new() -> (Self, mpsc::UnboundedSender<Vec<Detection>>, ChannelSpy) {
        let (tx, batches) = mpsc::unbounded_channel();
        let spy = ChannelSpy::default();
        let channel = Self {
            batches,
            spy: spy.clone(),
        };
        (channel, tx, spy)
    }
}

#[async_trait]
impl DetectionChannel for ScriptedChannel {
    async fn connect(&mut self) -> pathsense::Result<()> {
        self.spy.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&mut self) -> pathsense::Result<()> {
        self.spy.connected.store(false, Ordering::SeqCst);
        self.spy.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn send_frame(&mut self, frame: &EncodedFrame) -> pathsense::Result<()> {
        self.spy.sent.lock().unwrap().push(frame.clone());
        Ok(())
    }

    async fn next_batch(&mut self) -> Option<Vec<Detection>> {
        let batch = self.batches.recv().await;
        if batch.is_none() {
            self.spy.connected.store(false, Ordering::SeqCst);
        }
        batch
    }

    fn is_connected(&self) -> bool {
        self.spy.is_connected()
    }
}

/// Frame source producing blank frames of a fixed size
pub struct BlankSource {
    geometry: FrameGeometry,
}

impl BlankSource {
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            geometry: FrameGeometry::new(width, height),
        }
    }

    /// A camera that has not produced a frame yet
    pub const fn unready() -> Self {
        Self::new(0, 0)
    }
}

impl FrameSource for BlankSource {
    fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    fn grab(&mut self) -> pathsense::Result<Option<DynamicImage>> {
        if !self.geometry.is_ready() {
            return Ok(None);
        }
        Ok(Some(DynamicImage::new_rgb8(
            self.geometry.width,
            self.geometry.height,
        )))
    }
}

/// Detection with a box given as `[x1, y1, x2, y2]`
pub fn detection(label: &str, [x1, y1, x2, y2]: [f64; 4]) -> Detection {
    Detection::new(label, BoundingBox::new(x1, y1, x2, y2))
}

/// Let spawned tasks run without moving the paused clock far
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
