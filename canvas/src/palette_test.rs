use super::*;

#[test]
fn colors_follow_first_seen_order() {
    let mut palette = SensorPalette::new();
    assert_eq!(palette.color(7), "#e74c3c");
    assert_eq!(palette.color(2), "#3498db");
    assert_eq!(palette.color(7), "#e74c3c");
    assert_eq!(palette.len(), 2);
}

#[test]
fn palette_wraps_after_fifteen_tags() {
    let mut palette = SensorPalette::new();
    for tag in 0..15 {
        palette.color(tag);
    }
    assert_eq!(palette.color(15), SENSOR_COLORS[0]);
    assert_eq!(palette.color(16), SENSOR_COLORS[1]);
}

#[test]
fn roi_styles_differ_by_kind_and_selection() {
    let include = roi_style(RoiKind::Include, false);
    let include_sel = roi_style(RoiKind::Include, true);
    let exclude = roi_style(RoiKind::Exclude, false);

    assert_eq!(include.stroke, "#27ae60");
    assert_eq!(include_sel.stroke, "#1e8449");
    assert_eq!(exclude.stroke, "#e74c3c");
    assert_ne!(include.fill, include_sel.fill);
}
