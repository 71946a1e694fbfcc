#![allow(clippy::float_cmp)]

use super::*;
use store::Viewport;

fn camera(scale: f64) -> Camera {
    Camera::new(Viewport { pan_x: 0.0, pan_y: 0.0, scale }, 800.0, 600.0)
}

// --- label_step ---

#[test]
fn step_is_smallest_with_enough_pitch() {
    assert_eq!(label_step(800.0), 0.1);
    assert_eq!(label_step(400.0), 0.2);
    assert_eq!(label_step(120.0), 1.0);
    assert_eq!(label_step(80.0), 1.0);
    assert_eq!(label_step(79.0), 2.0);
    assert_eq!(label_step(10.0), 10.0);
}

#[test]
fn step_saturates_at_largest_rung() {
    assert_eq!(label_step(0.01), 1000.0);
}

// --- format_label ---

#[test]
fn origin_label_is_suppressed() {
    assert_eq!(format_label(0.0, 1.0), None);
    assert_eq!(format_label(0.0005, 0.1), None);
    assert_eq!(format_label(-0.0009, 0.1), None);
}

#[test]
fn decimals_follow_step() {
    assert_eq!(format_label(0.5, 0.5).as_deref(), Some("0.5m"));
    assert_eq!(format_label(-1.5, 0.5).as_deref(), Some("-1.5m"));
    assert_eq!(format_label(2.0, 1.0).as_deref(), Some("2m"));
    assert_eq!(format_label(-20.0, 10.0).as_deref(), Some("-20m"));
}

// --- plan ---

#[test]
fn lines_every_meter_aligned_to_origin() {
    let grid = plan(&camera(100.0));
    // Origin x = 400 with 100 px pitch.
    assert_eq!(grid.vertical, vec![0.0, 100.0, 200.0, 300.0, 400.0, 500.0, 600.0, 700.0]);
    // Origin y = 480.
    assert_eq!(grid.horizontal, vec![80.0, 180.0, 280.0, 380.0, 480.0, 580.0]);
}

#[test]
fn labels_skip_zero_and_stay_on_canvas() {
    let grid = plan(&camera(100.0));
    assert_eq!(grid.label_step, 1.0);
    assert!(grid.labels.iter().all(|l| l.text != "0m"));
    assert!(grid.labels.iter().any(|l| l.text == "-4m"));
    assert!(grid.labels.iter().any(|l| l.text == "4m"));
    for label in &grid.labels {
        assert!(label.at.x >= 0.0 && label.at.x <= 800.0);
        assert!(label.at.y >= 0.0 && label.at.y <= 600.0);
    }
}

#[test]
fn y_labels_cover_visible_range() {
    let grid = plan(&camera(100.0));
    let y_labels: Vec<&str> = grid
        .labels
        .iter()
        .filter(|l| l.at.x == 375.0)
        .map(|l| l.text.as_str())
        .collect();
    // World y spans -1.2 .. 4.8 on a 600 px canvas.
    assert_eq!(y_labels, vec!["-1m", "1m", "2m", "3m", "4m"]);
}

#[test]
fn origin_marker_tracks_pan() {
    let cam = Camera::new(Viewport { pan_x: 30.0, pan_y: -10.0, scale: 50.0 }, 800.0, 600.0);
    assert_eq!(plan(&cam).origin, Point::new(430.0, 470.0));
}
