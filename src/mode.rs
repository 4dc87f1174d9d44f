//! Assistance modes
//!
//! Each mode talks to its own detector endpoint on the shared channel and
//! has its own capture cadence and annunciation policy.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use crate::Error;

/// Which assistant is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AssistMode {
    /// Obstacle warnings and scene narration while walking
    #[default]
    Walking,
    /// Name every detected object
    Objects,
    /// Name currency notes, once per change
    Currency,
}

impl AssistMode {
    /// Default interval between captured frames
    #[must_use]
    pub const fn capture_period(self) -> Duration {
        match self {
            Self::Walking => Duration::from_millis(1500),
            Self::Objects => Duration::from_millis(1200),
            Self::Currency => Duration::from_millis(1000),
        }
    }

    /// Event name for outbound frames
    #[must_use]
    pub const fn frame_event(self) -> &'static str {
        match self {
            Self::Walking => "frame",
            Self::Objects => "object_frame",
            Self::Currency => "currency_frame",
        }
    }

    /// Event name for inbound detection batches
    #[must_use]
    pub const fn detections_event(self) -> &'static str {
        match self {
            Self::Walking => "detections",
            Self::Objects => "object_detections",
            Self::Currency => "currency_detections",
        }
    }

    /// Whether inbound batches are wrapped as `{"detections": [...]}`
    #[must_use]
    pub const fn wraps_detections(self) -> bool {
        matches!(self, Self::Currency)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Walking => "walking",
            Self::Objects => "objects",
            Self::Currency => "currency",
        }
    }
}

impl fmt::Display for AssistMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for AssistMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "walking" => Ok(Self::Walking),
            "objects" => Ok(Self::Objects),
            "currency" => Ok(Self::Currency),
            other => Err(Error::Config(format!("unknown mode: {other}"))),
        }
    }
}
