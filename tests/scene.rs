//! Scene integration tests
//!
//! Wire message in, zones, summary and warnings out.

use pathsense::channel::decode_message;
use pathsense::{
    AssistMode, FrameGeometry, Position, Proximity, SceneSummary, WarningSet, classify_batch,
};

mod common;
use common::detection;

const FRAME: FrameGeometry = FrameGeometry::new(1000, 800);

#[test]
fn test_wire_batch_to_speech_text() {
    let text = r#"{"event":"detections","data":[
        {"label":"person","confidence":0.91,"box":[400,100,600,700]},
        {"label":"bicycle","confidence":0.72,"box":[750,500,900,700]},
        {"label":"bench","box":[0,500,250,550]}
    ]}"#;

    let batch = decode_message(AssistMode::Walking, text).unwrap();
    let classified = classify_batch(&batch, FRAME).unwrap();

    let zones: Vec<_> = classified
        .iter()
        .map(|d| (d.label(), d.zone.position, d.zone.proximity))
        .collect();
    assert_eq!(
        zones,
        [
            ("person", Position::Center, Proximity::VeryNear),
            ("bicycle", Position::Right, Proximity::VeryFar),
            ("bench", Position::Left, Proximity::VeryFar),
        ]
    );

    let summary = SceneSummary::from_detections(&classified);
    assert_eq!(
        summary.to_text(),
        "bench:left:very far; bicycle:right:very far; person:center:very near"
    );

    let warnings = WarningSet::from_detections(&classified);
    assert_eq!(warnings.to_text(), "Obstacle ahead, move left or right");
    assert!(warnings.has_urgent());
    assert!(warnings.iter().all(|w| w.is_urgent()));
}

#[test]
fn test_summary_ignores_detector_order() {
    let car = detection("car", [0.0, 0.0, 200.0, 560.0]);
    let person = detection("person", [400.0, 100.0, 600.0, 700.0]);

    let forward = classify_batch(&[car.clone(), person.clone()], FRAME).unwrap();
    let reversed = classify_batch(&[person, car], FRAME).unwrap();

    let summary = SceneSummary::from_detections(&forward);
    assert_eq!(summary, SceneSummary::from_detections(&reversed));
    assert_eq!(
        summary.to_text(),
        "car:left:very near; person:center:very near"
    );

    // Warnings keep first-seen order
    assert_eq!(
        WarningSet::from_detections(&forward).to_text(),
        "Obstacle on left, move right; Obstacle ahead, move left or right"
    );
    assert_eq!(
        WarningSet::from_detections(&reversed).to_text(),
        "Obstacle ahead, move left or right; Obstacle on left, move right"
    );
}

#[test]
fn test_duplicate_hazards_warn_once() {
    let batch = [
        detection("pole", [450.0, 0.0, 470.0, 600.0]),
        detection("person", [480.0, 50.0, 560.0, 700.0]),
    ];
    let classified = classify_batch(&batch, FRAME).unwrap();

    let warnings = WarningSet::from_detections(&classified);
    assert_eq!(warnings.len(), 1);
    assert!(warnings.contains("Obstacle ahead, move left or right"));

    // Both detections still appear in the summary
    assert_eq!(SceneSummary::from_detections(&classified).len(), 2);
}

#[test]
fn test_near_center_caution() {
    let batch = [detection("chair", [450.0, 200.0, 550.0, 600.0])];
    let classified = classify_batch(&batch, FRAME).unwrap();

    assert_eq!(classified[0].zone.proximity, Proximity::Near);
    assert_eq!(
        WarningSet::from_detections(&classified).to_text(),
        "Obstacle ahead, caution"
    );
}

#[test]
fn test_near_side_objects_do_not_warn() {
    let batch = [
        detection("door", [0.0, 200.0, 200.0, 600.0]),
        detection("sign", [800.0, 200.0, 950.0, 600.0]),
    ];
    let classified = classify_batch(&batch, FRAME).unwrap();

    assert!(
        classified
            .iter()
            .all(|d| d.zone.proximity == Proximity::Near)
    );
    assert!(WarningSet::from_detections(&classified).is_empty());
}

#[test]
fn test_empty_scene() {
    let classified = classify_batch(&[], FRAME).unwrap();

    let summary = SceneSummary::from_detections(&classified);
    assert!(summary.is_empty());
    assert_eq!(summary.to_text(), "no object");
    assert!(WarningSet::from_detections(&classified).is_empty());
}

#[test]
fn test_unready_frame_yields_nothing() {
    let batch = [detection("person", [0.0, 0.0, 10.0, 10.0])];

    assert!(classify_batch(&batch, FrameGeometry::new(0, 800)).is_none());
    assert!(classify_batch(&batch, FrameGeometry::new(1000, 0)).is_none());
}
