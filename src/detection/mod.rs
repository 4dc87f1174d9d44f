//! Detection data model
//!
//! Detections arrive from the remote detector in source-frame pixel
//! coordinates. They are classified against the geometry of the frame that
//! is current when the batch arrives.

mod zone;

use serde::{Deserialize, Serialize};

pub use zone::{
    FAR_RATIO, LEFT_ZONE_RATIO, NEAR_RATIO, Position, Proximity, RIGHT_ZONE_RATIO,
    VERY_NEAR_RATIO, Zone,
};

/// Axis-aligned box `(x1, y1, x2, y2)` in source-frame pixels
///
/// Serialized as a four element array, matching the detector wire format.
/// `x2 >= x1` and `y2 >= y1` are expected but not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    #[must_use]
    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from([x1, y1, x2, y2]: [f64; 4]) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// One object reported by the detector for a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Class label (e.g. "person", "chair")
    pub label: String,

    /// Bounding box in source-frame pixels
    #[serde(rename = "box")]
    pub bbox: BoundingBox,

    /// Detector confidence, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl Detection {
    #[must_use]
    pub fn new(label: impl Into<String>, bbox: BoundingBox) -> Self {
        Self {
            label: label.into(),
            bbox,
            confidence: None,
        }
    }
}

/// Dimensions of the current video frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FrameGeometry {
    pub width: u32,
    pub height: u32,
}

impl FrameGeometry {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether the frame has usable dimensions
    ///
    /// Zero width or height means the capture source has not produced a
    /// frame yet.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// A detection paired with its zone
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedDetection {
    pub detection: Detection,
    pub zone: Zone,
}

impl ClassifiedDetection {
    #[must_use]
    pub fn label(&self) -> &str {
        &self.detection.label
    }
}

/// Classify a whole batch against the current frame
///
/// Returns `None` when the frame is not ready, in which case the caller
/// skips this cycle.
#[must_use]
pub fn classify_batch(batch: &[Detection], frame: FrameGeometry) -> Option<Vec<ClassifiedDetection>> {
    if !frame.is_ready() {
        return None;
    }

    batch
        .iter()
        .map(|detection| {
            Zone::classify(&detection.bbox, frame).map(|zone| ClassifiedDetection {
                detection: detection.clone(),
                zone,
            })
        })
        .collect()
}
