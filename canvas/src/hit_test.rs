use super::*;
use store::Viewport;
use wire::{Pose, Sensor};

// =============================================================
// Helpers
// =============================================================

fn camera() -> Camera {
    // Origin at (400, 480), 100 px per meter.
    Camera::new(Viewport { pan_x: 0.0, pan_y: 0.0, scale: 100.0 }, 800.0, 600.0)
}

fn square(x0: f32, y0: f32, size: f32) -> Polygon {
    Polygon(vec![[x0, y0], [x0 + size, y0], [x0 + size, y0 + size], [x0, y0 + size]])
}

fn sensor_at_pose(id: &str, tx: f32, ty: f32) -> Sensor {
    Sensor::new(id).with_pose(Pose { tx, ty, theta_deg: 0.0 })
}

fn sensors(list: Vec<Sensor>) -> SensorMap {
    list.into_iter().map(|s| (s.id.clone(), s)).collect()
}

// =============================================================
// point_in_polygon
// =============================================================

#[test]
fn inside_and_outside_square() {
    let sq = square(0.0, 0.0, 2.0);
    assert!(point_in_polygon(Point::new(1.0, 1.0), sq.vertices()));
    assert!(!point_in_polygon(Point::new(3.0, 1.0), sq.vertices()));
    assert!(!point_in_polygon(Point::new(1.0, -0.5), sq.vertices()));
}

#[test]
fn concave_notch_is_outside() {
    // U shape opening upwards.
    let u = [[0.0, 0.0], [3.0, 0.0], [3.0, 3.0], [2.0, 3.0], [2.0, 1.0], [1.0, 1.0], [1.0, 3.0], [0.0, 3.0]];
    assert!(point_in_polygon(Point::new(0.5, 2.0), &u));
    assert!(!point_in_polygon(Point::new(1.5, 2.0), &u));
    assert!(point_in_polygon(Point::new(1.5, 0.5), &u));
}

#[test]
fn degenerate_polygon_contains_nothing() {
    assert!(!point_in_polygon(Point::new(0.0, 0.0), &[[-1.0, -1.0], [1.0, 1.0]]));
}

// =============================================================
// Individual pickers
// =============================================================

#[test]
fn sensor_pick_radius_is_twelve_pixels() {
    let map = sensors(vec![sensor_at_pose("a", 1.0, 0.0)]);
    // Sensor a projects to (500, 480).
    assert_eq!(sensor_at(&camera(), Point::new(511.0, 480.0), &map), Some(SensorId::new("a")));
    assert_eq!(sensor_at(&camera(), Point::new(513.0, 480.0), &map), None);
}

#[test]
fn vertex_pick_radius_is_eight_pixels() {
    let sq = square(0.0, 0.0, 1.0);
    // Vertex 1 = (1, 0) projects to (500, 480).
    assert_eq!(vertex_at(&camera(), Point::new(505.0, 485.0), &sq), Some(1));
    assert_eq!(vertex_at(&camera(), Point::new(509.0, 480.0), &sq), None);
}

#[test]
fn include_wins_over_exclude() {
    let mask = WorldMask { include: vec![square(0.0, 0.0, 2.0)], exclude: vec![square(0.0, 0.0, 2.0)] };
    assert_eq!(roi_at(Point::new(1.0, 1.0), &mask), Some((RoiKind::Include, 0)));
}

#[test]
fn exclude_found_when_no_include_matches() {
    let mask = WorldMask { include: vec![square(5.0, 5.0, 1.0)], exclude: vec![square(0.0, 0.0, 2.0)] };
    assert_eq!(roi_at(Point::new(1.0, 1.0), &mask), Some((RoiKind::Exclude, 0)));
}

// =============================================================
// hit_test priority
// =============================================================

#[test]
fn sensor_beats_polygon_underneath() {
    let map = sensors(vec![sensor_at_pose("s", 1.0, 1.0)]);
    let mask = WorldMask { include: vec![square(0.0, 0.0, 2.0)], exclude: vec![] };
    let screen = camera().world_to_screen(Point::new(1.0, 1.0));

    let hit = hit_test(&camera(), screen, &map, &mask, &Selection::None);

    assert_eq!(hit, Hit::Sensor(SensorId::new("s")));
}

#[test]
fn vertex_only_considered_for_selected_polygon() {
    let mask = WorldMask { include: vec![square(0.0, 0.0, 2.0)], exclude: vec![] };
    let corner = camera().world_to_screen(Point::new(2.0, 2.0));
    let nudge = Point::new(corner.x - 3.0, corner.y + 3.0);

    let unselected = hit_test(&camera(), nudge, &SensorMap::new(), &mask, &Selection::None);
    assert_eq!(unselected, Hit::Roi { kind: RoiKind::Include, index: 0 });

    let selected = Selection::Roi { kind: RoiKind::Include, index: 0 };
    let hit = hit_test(&camera(), nudge, &SensorMap::new(), &mask, &selected);
    assert_eq!(hit, Hit::Vertex { kind: RoiKind::Include, roi: 0, vertex: 2 });
}

#[test]
fn vertex_selection_still_picks_sibling_vertices() {
    let mask = WorldMask { include: vec![square(0.0, 0.0, 2.0)], exclude: vec![] };
    let selection = Selection::Vertex { kind: RoiKind::Include, roi: 0, vertex: 0 };
    let screen = camera().world_to_screen(Point::new(0.0, 2.0));

    let hit = hit_test(&camera(), screen, &SensorMap::new(), &mask, &selection);

    assert_eq!(hit, Hit::Vertex { kind: RoiKind::Include, roi: 0, vertex: 3 });
}

#[test]
fn empty_space_is_empty() {
    let hit = hit_test(&camera(), Point::new(10.0, 10.0), &SensorMap::new(), &WorldMask::default(), &Selection::None);
    assert_eq!(hit, Hit::Empty);
}

#[test]
fn stale_selection_index_is_ignored() {
    let selection = Selection::Roi { kind: RoiKind::Exclude, index: 4 };
    let hit = hit_test(&camera(), Point::new(10.0, 10.0), &SensorMap::new(), &WorldMask::default(), &selection);
    assert_eq!(hit, Hit::Empty);
}
