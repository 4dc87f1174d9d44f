//! Hazard warnings derived from zones

use std::sync::LazyLock;

use regex::Regex;

use crate::detection::{ClassifiedDetection, Position, Proximity, Zone};

/// Any warning text matching this is spoken without debounce
static URGENT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("very near|Obstacle").expect("valid regex"));

/// A spoken hazard warning
///
/// Urgency is read from the rendered text, so any future phrasing that
/// mentions an obstacle is urgent as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Warning {
    text: String,
}

impl Warning {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Warning for a zone, if the zone is hazardous
    #[must_use]
    pub fn for_zone(zone: Zone) -> Option<Self> {
        let text = match (zone.proximity, zone.position) {
            (Proximity::VeryNear, Position::Center) => "Obstacle ahead, move left or right",
            (Proximity::VeryNear, Position::Left) => "Obstacle on left, move right",
            (Proximity::VeryNear, Position::Right) => "Obstacle on right, move left",
            (Proximity::Near, Position::Center) => "Obstacle ahead, caution",
            _ => return None,
        };

        Some(Self::new(text))
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn is_urgent(&self) -> bool {
        URGENT_PATTERN.is_match(&self.text)
    }
}

/// De-duplicated warnings, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarningSet {
    warnings: Vec<Warning>,
}

impl WarningSet {
    /// Derive the warnings for a classified batch
    #[must_use]
    pub fn from_detections(detections: &[ClassifiedDetection]) -> Self {
        let mut set = Self::default();
        for warning in detections.iter().filter_map(|d| Warning::for_zone(d.zone)) {
            set.insert(warning);
        }
        set
    }

    /// Add a warning unless an identical one is present
    ///
    /// Returns `true` if the warning was new.
    pub fn insert(&mut self, warning: Warning) -> bool {
        if self.warnings.contains(&warning) {
            return false;
        }
        self.warnings.push(warning);
        true
    }

    #[must_use]
    pub fn contains(&self, text: &str) -> bool {
        self.warnings.iter().any(|w| w.text == text)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Warning> {
        self.warnings.iter()
    }

    /// Whether at least one warning bypasses debounce
    #[must_use]
    pub fn has_urgent(&self) -> bool {
        self.warnings.iter().any(Warning::is_urgent)
    }

    /// Spoken form: warnings joined by `"; "`
    #[must_use]
    pub fn to_text(&self) -> String {
        self.warnings
            .iter()
            .map(Warning::text)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{BoundingBox, Detection};

    fn classified(position: Position, proximity: Proximity) -> ClassifiedDetection {
        ClassifiedDetection {
            detection: Detection::new("box", BoundingBox::new(0.0, 0.0, 0.0, 0.0)),
            zone: Zone {
                position,
                proximity,
            },
        }
    }

    #[test]
    fn test_zone_phrasing() {
        let cases = [
            (Position::Center, Proximity::VeryNear, Some("Obstacle ahead, move left or right")),
            (Position::Left, Proximity::VeryNear, Some("Obstacle on left, move right")),
            (Position::Right, Proximity::VeryNear, Some("Obstacle on right, move left")),
            (Position::Center, Proximity::Near, Some("Obstacle ahead, caution")),
            (Position::Left, Proximity::Near, None),
            (Position::Right, Proximity::Near, None),
            (Position::Center, Proximity::Far, None),
            (Position::Center, Proximity::VeryFar, None),
        ];

        for (position, proximity, expected) in cases {
            let warning = Warning::for_zone(Zone {
                position,
                proximity,
            });
            assert_eq!(warning.as_ref().map(Warning::text), expected);
        }
    }

    #[test]
    fn test_single_very_near_center() {
        let set = WarningSet::from_detections(&[classified(Position::Center, Proximity::VeryNear)]);

        assert_eq!(set.len(), 1);
        assert!(set.contains("Obstacle ahead, move left or right"));
    }

    #[test]
    fn test_identical_warnings_collapse() {
        let set = WarningSet::from_detections(&[
            classified(Position::Left, Proximity::VeryNear),
            classified(Position::Left, Proximity::VeryNear),
        ]);

        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let set = WarningSet::from_detections(&[
            classified(Position::Right, Proximity::VeryNear),
            classified(Position::Center, Proximity::Near),
            classified(Position::Right, Proximity::VeryNear),
        ]);

        assert_eq!(
            set.to_text(),
            "Obstacle on right, move left; Obstacle ahead, caution"
        );
    }

    #[test]
    fn test_urgency_follows_text() {
        assert!(Warning::new("Obstacle ahead, caution").is_urgent());
        assert!(Warning::new("stairs very near").is_urgent());
        assert!(!Warning::new("Curb ahead").is_urgent());
        assert!(!WarningSet::default().has_urgent());
    }
}
