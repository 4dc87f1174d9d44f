//! Spatial zone classification
//!
//! Maps a bounding box onto a coarse horizontal position and a proximity
//! bucket derived from how much of the frame height the box covers.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{BoundingBox, FrameGeometry};

/// Box centers left of this fraction of the frame width are `Left`
pub const LEFT_ZONE_RATIO: f64 = 0.33;

/// Box centers right of this fraction of the frame width are `Right`
pub const RIGHT_ZONE_RATIO: f64 = 0.66;

/// Relative height above which an object is `VeryNear`
pub const VERY_NEAR_RATIO: f64 = 0.65;

/// Relative height above which an object is `Near`
pub const NEAR_RATIO: f64 = 0.45;

/// Relative height above which an object is `Far`
pub const FAR_RATIO: f64 = 0.25;

/// Horizontal position of an object relative to the viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Left,
    Center,
    Right,
}

impl Position {
    /// Classify from the horizontal box extent
    ///
    /// Centers sitting exactly on a threshold resolve to `Center`.
    #[must_use]
    pub fn from_extent(x1: f64, x2: f64, frame_width: f64) -> Self {
        let center = (x1 + x2) / 2.0;

        if center < frame_width * LEFT_ZONE_RATIO {
            Self::Left
        } else if center > frame_width * RIGHT_ZONE_RATIO {
            Self::Right
        } else {
            Self::Center
        }
    }

    /// Spoken / wire form
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Proximity bucket, estimated from relative box height
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Proximity {
    #[serde(rename = "very near")]
    VeryNear,
    #[serde(rename = "near")]
    Near,
    #[serde(rename = "far")]
    Far,
    #[serde(rename = "very far")]
    VeryFar,
}

impl Proximity {
    /// Classify from the vertical box extent
    ///
    /// Thresholds are strict: a ratio of exactly 0.45 is `Far`, not `Near`.
    #[must_use]
    pub fn from_extent(y1: f64, y2: f64, frame_height: f64) -> Self {
        let rel_height = (y2 - y1) / frame_height;

        if rel_height > VERY_NEAR_RATIO {
            Self::VeryNear
        } else if rel_height > NEAR_RATIO {
            Self::Near
        } else if rel_height > FAR_RATIO {
            Self::Far
        } else {
            Self::VeryFar
        }
    }

    /// Spoken / wire form
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VeryNear => "very near",
            Self::Near => "near",
            Self::Far => "far",
            Self::VeryFar => "very far",
        }
    }
}

impl fmt::Display for Proximity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Position and proximity of one detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Zone {
    pub position: Position,
    pub proximity: Proximity,
}

impl Zone {
    /// Classify a box against the frame it was detected in
    ///
    /// Returns `None` while the frame geometry is not known yet (zero width
    /// or height).
    #[must_use]
    pub fn classify(bbox: &BoundingBox, frame: FrameGeometry) -> Option<Self> {
        if !frame.is_ready() {
            return None;
        }

        Some(Self {
            position: Position::from_extent(bbox.x1, bbox.x2, f64::from(frame.width)),
            proximity: Proximity::from_extent(bbox.y1, bbox.y2, f64::from(frame.height)),
        })
    }
}
