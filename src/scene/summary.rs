//! Canonical scene summary

use crate::detection::ClassifiedDetection;

/// Spoken text for an empty scene
pub const NO_OBJECT: &str = "no object";

/// Sorted `label:position:proximity` entries for one batch
///
/// Two batches holding the same multiset of triples compare equal no matter
/// how the detector ordered them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SceneSummary {
    entries: Vec<String>,
}

impl SceneSummary {
    /// Summarize a classified batch
    #[must_use]
    pub fn from_detections(detections: &[ClassifiedDetection]) -> Self {
        let mut entries: Vec<String> = detections
            .iter()
            .map(|d| {
                format!(
                    "{}:{}:{}",
                    d.label(),
                    d.zone.position,
                    d.zone.proximity
                )
            })
            .collect();
        entries.sort();

        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Narration text: entries joined by `"; "`, or `"no object"`
    #[must_use]
    pub fn to_text(&self) -> String {
        if self.entries.is_empty() {
            NO_OBJECT.to_string()
        } else {
            self.entries.join("; ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{BoundingBox, Detection, Position, Proximity, Zone};

    fn classified(label: &str, position: Position, proximity: Proximity) -> ClassifiedDetection {
        ClassifiedDetection {
            detection: Detection::new(label, BoundingBox::new(0.0, 0.0, 0.0, 0.0)),
            zone: Zone {
                position,
                proximity,
            },
        }
    }

    #[test]
    fn test_summary_is_order_independent() {
        let person = classified("person", Position::Left, Proximity::Near);
        let car = classified("car", Position::Center, Proximity::Far);

        let a = SceneSummary::from_detections(&[person.clone(), car.clone()]);
        let b = SceneSummary::from_detections(&[car, person]);

        assert_eq!(a, b);
        assert_eq!(a.entries(), ["car:center:far", "person:left:near"]);
    }

    #[test]
    fn test_summary_keeps_duplicates() {
        let chair = classified("chair", Position::Right, Proximity::VeryFar);
        let summary = SceneSummary::from_detections(&[chair.clone(), chair]);

        assert_eq!(summary.len(), 2);
        assert_eq!(summary.to_text(), "chair:right:very far; chair:right:very far");
    }

    #[test]
    fn test_empty_summary_text() {
        let summary = SceneSummary::from_detections(&[]);

        assert!(summary.is_empty());
        assert_eq!(summary.to_text(), NO_OBJECT);
    }
}
