//! On-screen overlay layout
//!
//! Boxes are scaled from source-frame pixels to the rendered viewport.
//! Walking captions reuse the zone classifier so the overlay never
//! disagrees with what is spoken.

use crate::detection::{Detection, FrameGeometry, Zone};
use crate::mode::AssistMode;

/// Size of the surface the overlay is drawn on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl From<FrameGeometry> for Viewport {
    fn from(frame: FrameGeometry) -> Self {
        Self::new(f64::from(frame.width), f64::from(frame.height))
    }
}

/// One box to draw, in viewport coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub caption: String,
    /// Where the caption's baseline starts
    pub caption_at: (f64, f64),
}

/// Lay out a batch for drawing
///
/// Returns nothing while the frame geometry is unknown.
#[must_use]
pub fn layout(
    mode: AssistMode,
    batch: &[Detection],
    frame: FrameGeometry,
    viewport: Viewport,
) -> Vec<OverlayBox> {
    if !frame.is_ready() {
        return Vec::new();
    }

    let scale_x = viewport.width / f64::from(frame.width);
    let scale_y = viewport.height / f64::from(frame.height);
    let caption_offset = if mode == AssistMode::Currency { 25.0 } else { 20.0 };

    batch
        .iter()
        .map(|detection| {
            let x = detection.bbox.x1 * scale_x;
            let y = detection.bbox.y1 * scale_y;

            let caption = match (mode, Zone::classify(&detection.bbox, frame)) {
                (AssistMode::Walking, Some(zone)) => format!(
                    "{} • {} • {}",
                    detection.label, zone.position, zone.proximity
                ),
                _ => detection.label.clone(),
            };

            OverlayBox {
                x,
                y,
                width: detection.bbox.width() * scale_x,
                height: detection.bbox.height() * scale_y,
                caption,
                caption_at: (x + 5.0, y + caption_offset),
            }
        })
        .collect()
}

/// Draws overlay boxes
pub trait OverlayRenderer: Send {
    fn render(&mut self, boxes: &[OverlayBox]);
}

/// Renderer that traces the layout instead of drawing it
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOverlay;

impl OverlayRenderer for LogOverlay {
    fn render(&mut self, boxes: &[OverlayBox]) {
        for b in boxes {
            tracing::trace!(
                caption = %b.caption,
                x = b.x,
                y = b.y,
                width = b.width,
                height = b.height,
                "overlay box"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::BoundingBox;

    fn chair() -> Detection {
        Detection::new("chair", BoundingBox::new(400.0, 300.0, 500.0, 600.0))
    }

    #[test]
    fn test_boxes_scale_to_viewport() {
        let boxes = layout(
            AssistMode::Objects,
            &[chair()],
            FrameGeometry::new(1000, 800),
            Viewport::new(500.0, 400.0),
        );

        let b = &boxes[0];
        assert!((b.x - 200.0).abs() < f64::EPSILON);
        assert!((b.y - 150.0).abs() < f64::EPSILON);
        assert!((b.width - 50.0).abs() < f64::EPSILON);
        assert!((b.height - 150.0).abs() < f64::EPSILON);
        assert_eq!(b.caption, "chair");
        assert_eq!(b.caption_at, (205.0, 170.0));
    }

    #[test]
    fn test_walking_caption_uses_zone() {
        let frame = FrameGeometry::new(1000, 800);
        let boxes = layout(AssistMode::Walking, &[chair()], frame, frame.into());

        assert_eq!(boxes[0].caption, "chair • center • far");
    }

    #[test]
    fn test_currency_caption_offset() {
        let frame = FrameGeometry::new(1000, 800);
        let boxes = layout(AssistMode::Currency, &[chair()], frame, frame.into());

        assert_eq!(boxes[0].caption_at, (405.0, 325.0));
    }

    #[test]
    fn test_unready_frame_draws_nothing() {
        let boxes = layout(
            AssistMode::Walking,
            &[chair()],
            FrameGeometry::default(),
            Viewport::new(100.0, 100.0),
        );
        assert!(boxes.is_empty());
    }
}
