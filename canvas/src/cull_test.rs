use super::*;
use store::Viewport;

fn camera() -> Camera {
    // Origin at (400, 480), 100 px per meter: visible x is -4..4, y is -1.2..4.8.
    Camera::new(Viewport { pan_x: 0.0, pan_y: 0.0, scale: 100.0 }, 800.0, 600.0)
}

#[allow(clippy::cast_precision_loss)]
fn line_of_points(n: usize) -> PointSet {
    let xy = (0..n).flat_map(|i| [i as f32 * 0.00001, 1.0]).collect();
    let sid = (0..n).map(|i| i32::from(i % 2 == 1)).collect();
    PointSet::new(xy, sid)
}

// =============================================================
// Culling
// =============================================================

#[test]
fn cull_keeps_margin_band() {
    let points = PointSet::new(vec![0.0, 1.0, 4.4, 1.0, 4.6, 1.0, 0.0, -1.6, 0.0, -1.8], vec![1, 2, 3, 4, 5]);

    let culled = cull_to_viewport(&points, &camera());

    // x = 4.4 is 40 px off the right edge; 4.6 is 60 px. y = -1.6 is 40 px below; -1.8 is 60 px.
    assert_eq!(culled.xy, vec![0.0, 1.0, 4.4, 1.0, 0.0, -1.6]);
    assert_eq!(culled.sid, vec![1, 2, 4]);
}

#[test]
fn cull_does_not_touch_source() {
    let points = PointSet::new(vec![100.0, 100.0, 0.0, 0.0], vec![]);
    let before = points.clone();

    let culled = cull_to_viewport(&points, &camera());

    assert_eq!(points, before);
    assert_eq!(culled.len(), 1);
    assert!(culled.sid.is_empty());
}

// =============================================================
// Decimation
// =============================================================

#[test]
fn step_is_ceiling_of_ratio() {
    assert_eq!(decimation_step(100_000, 10_000), 10);
    assert_eq!(decimation_step(100_001, 10_000), 11);
    assert_eq!(decimation_step(5, 10), 1);
}

#[test]
fn hundred_thousand_points_decimate_to_ten_thousand() {
    let points = line_of_points(100_000);
    let reduced = decimate(&points, 10_000);
    assert_eq!(reduced.len(), 10_000);
    assert_eq!(reduced.sid.len(), 10_000);
}

#[test]
fn decimation_keeps_every_nth_with_tags() {
    let points = line_of_points(10);
    let reduced = decimate(&points, 4);
    // step = ceil(10 / 4) = 3 -> indices 0, 3, 6, 9
    assert_eq!(reduced.len(), 4);
    assert_eq!(reduced.sid, vec![0, 1, 0, 1]);
}

#[test]
fn under_cap_is_unchanged() {
    let points = line_of_points(10);
    assert_eq!(decimate(&points, 10), points);
}

// =============================================================
// reduce
// =============================================================

#[test]
fn reduce_borrows_outside_performance_mode() {
    let points = PointSet::new(vec![100.0, 100.0], vec![]);
    let out = reduce(&points, &camera(), false, 1);
    assert!(matches!(out, Cow::Borrowed(_)));
    assert_eq!(out.len(), 1);
}

#[test]
fn reduce_culls_then_decimates() {
    let mut xy = line_of_points(40).xy;
    xy.extend_from_slice(&[100.0, 100.0]);
    let points = PointSet::new(xy, vec![]);

    let out = reduce(&points, &camera(), true, 10);

    // 40 visible, off-screen one dropped, then step 4.
    assert_eq!(out.len(), 10);
}
