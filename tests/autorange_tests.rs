use std::rc::Rc;

use chart_core::autorange::{
    crosses, polyline_intersections, reset_baseline, widen_extents, EdgeIntersections,
};
use chart_core::scales::ChartScale;
use chart_core::transform::PlotTransform;
use chart_core::{
    AccessorScaleBinding, AutorangeMode, Axis, Dataset, LinePlot, PlotRenderer, SharedScale,
};
use glam::DVec2;

/// x domain [0, 5] over 100px, y domain [0, 10] over 100px (inverted).
fn view_transform() -> PlotTransform {
    PlotTransform::new(
        ChartScale::new_linear((0.0, 5.0), (0.0, 100.0)),
        ChartScale::new_linear((0.0, 10.0), (100.0, 0.0)),
    )
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn test_right_edge_intersection_is_midpoint() {
    let transform = view_transform();
    let points = [
        Some(transform.data_to_screen(DVec2::new(0.0, 0.0))),
        Some(transform.data_to_screen(DVec2::new(10.0, 10.0))),
    ];
    let mut out = EdgeIntersections::default();
    polyline_intersections(&points, &transform, &mut out);

    assert_eq!(out.right.len(), 1);
    assert_close(out.right[0].x, 100.0);
    assert_close(out.right[0].y, 5.0);
    assert!(out.left.is_empty());
    assert!(out.top.is_empty());
    // Starting exactly on the bottom edge and moving up counts as a crossing.
    assert_eq!(out.bottom.len(), 1);
    assert_close(out.bottom[0].x, 0.0);

    let included = out.included_values(Axis::Y);
    assert_eq!(included.len(), 1);
    assert_close(included[0], 5.0);
}

#[test]
fn test_crossing_is_half_open() {
    // Landing on the boundary counts, leaving from it does not (increasing direction).
    assert!(crosses(0.0, 5.0, 5.0));
    assert!(!crosses(5.0, 10.0, 5.0));
    // Decreasing direction: leaving from the boundary counts, landing on it does not.
    assert!(crosses(5.0, 0.0, 5.0));
    assert!(!crosses(10.0, 5.0, 5.0));
    // Both on one side.
    assert!(!crosses(1.0, 2.0, 5.0));
    assert!(!crosses(7.0, 6.0, 5.0));
}

#[test]
fn test_left_and_top_crossings() {
    let transform = view_transform();
    // From (-5, 5) to (2.5, 15) in data units.
    let points = [
        Some(transform.data_to_screen(DVec2::new(-5.0, 5.0))),
        Some(transform.data_to_screen(DVec2::new(2.5, 15.0))),
    ];
    let mut out = EdgeIntersections::default();
    polyline_intersections(&points, &transform, &mut out);

    assert_eq!(out.left.len(), 1);
    assert_close(out.left[0].y, 5.0 + 10.0 * 5.0 / 7.5);
    assert_eq!(out.top.len(), 1);
    assert_close(out.top[0].x, -5.0 + 7.5 * 0.5);
    assert!(out.right.is_empty());
    assert!(out.bottom.is_empty());

    let xs = out.included_values(Axis::X);
    assert_eq!(xs.len(), 1);
    assert_close(xs[0], -1.25);
}

#[test]
fn test_undefined_points_break_the_scan() {
    let transform = view_transform();
    let points = [
        Some(transform.data_to_screen(DVec2::new(0.0, 0.0))),
        None,
        Some(transform.data_to_screen(DVec2::new(10.0, 10.0))),
        Some(DVec2::new(f64::NAN, 0.0)),
    ];
    let mut out = EdgeIntersections::default();
    polyline_intersections(&points, &transform, &mut out);
    assert!(out.is_empty());
}

#[test]
fn test_category_scale_yields_no_intersections() {
    let transform = PlotTransform::new(
        ChartScale::new_category(["a", "b"], (0.0, 100.0)),
        ChartScale::new_linear((0.0, 10.0), (100.0, 0.0)),
    );
    let points = [Some(DVec2::new(-50.0, 50.0)), Some(DVec2::new(150.0, 50.0))];
    let mut out = EdgeIntersections::default();
    polyline_intersections(&points, &transform, &mut out);
    assert!(out.is_empty());
}

#[test]
fn test_widen_extents_union() {
    let widened = widen_extents(&[Some((2.0, 8.0))], &[0.0, 1.0, 9.0]);
    assert_eq!(widened, vec![Some((0.0, 9.0))]);
}

#[test]
fn test_widen_empty_extent_takes_included_bounds() {
    let widened = widen_extents(&[None, Some((4.0, 5.0))], &[3.0, -1.0]);
    assert_eq!(widened, vec![Some((-1.0, 3.0)), Some((-1.0, 5.0))]);
}

#[test]
fn test_widen_without_included_values_is_identity() {
    let extents = vec![Some((2.0, 8.0)), None];
    assert_eq!(widen_extents(&extents, &[]), extents);
    assert_eq!(widen_extents(&extents, &[f64::NAN]), extents);
}

#[test]
fn test_reset_baseline() {
    assert_eq!(reset_baseline((5.0, 10.0)), 5.0);
    assert_eq!(reset_baseline((-10.0, -5.0)), -5.0);
    assert_eq!(reset_baseline((-3.0, 4.0)), 0.0);
    // Reversed domains behave the same.
    assert_eq!(reset_baseline((10.0, 5.0)), 5.0);
    assert_eq!(reset_baseline((0.0, 7.0)), 0.0);
}

fn pair_plot(x_scale: &SharedScale, y_scale: &SharedScale) -> LinePlot<(f64, f64)> {
    let mut plot = LinePlot::new();
    plot.set_x(AccessorScaleBinding::new(
        |r: &(f64, f64), _, _| r.0.into(),
        x_scale.clone(),
    ));
    plot.set_y(AccessorScaleBinding::new(
        |r: &(f64, f64), _, _| r.1.into(),
        y_scale.clone(),
    ));
    plot.add_dataset(Dataset::shared(vec![(0.0, 0.0), (10.0, 10.0)]));
    plot
}

#[test]
fn test_smooth_autorange_includes_edge_crossing() {
    let x_scale = ChartScale::new_linear((0.0, 5.0), (0.0, 100.0)).shared();
    let y_scale = ChartScale::new_linear((0.0, 10.0), (100.0, 0.0)).shared();
    let mut plot = pair_plot(&x_scale, &y_scale);
    plot.set_autorange_mode(AutorangeMode::Y);
    plot.set_autorange_smooth(true);

    assert!(!y_scale.borrow().snaps_domain());
    // Only (0, 0) lies inside the x view; the crossing at the right edge adds y = 5.
    let extents = plot.extents_for(Axis::Y);
    assert_eq!(extents.len(), 1);
    let (lo, hi) = extents[0].unwrap();
    assert_close(lo, 0.0);
    assert_close(hi, 5.0);

    assert!(plot.autorange());
    let (d0, d1) = y_scale.borrow().domain().unwrap();
    assert_close(d0, 0.0);
    assert_close(d1, 5.0);
}

#[test]
fn test_non_smooth_autorange_uses_visible_rows_only() {
    let x_scale = ChartScale::new_linear((0.0, 5.0), (0.0, 100.0)).shared();
    let y_scale = ChartScale::new_linear((0.0, 10.0), (100.0, 0.0)).shared();
    let mut plot = pair_plot(&x_scale, &y_scale);
    plot.set_autorange_mode(AutorangeMode::Y);

    assert!(y_scale.borrow().snaps_domain());
    assert_eq!(plot.extents_for(Axis::Y), vec![Some((0.0, 0.0))]);
    // The x axis is not autoranged, so every row counts.
    assert_eq!(plot.extents_for(Axis::X), vec![Some((0.0, 10.0))]);
}

#[test]
fn test_autorange_without_mode_is_noop() {
    let x_scale = ChartScale::new_linear((0.0, 5.0), (0.0, 100.0)).shared();
    let y_scale = ChartScale::new_linear((0.0, 10.0), (100.0, 0.0)).shared();
    let plot = pair_plot(&x_scale, &y_scale);

    assert!(!plot.autorange());
    assert_eq!(y_scale.borrow().domain(), Some((0.0, 10.0)));
    assert_eq!(x_scale.borrow().domain(), Some((0.0, 5.0)));
}

#[test]
fn test_smooth_autorange_on_category_axis_is_unchanged() {
    let x_scale = ChartScale::new_category(["a", "b", "c"], (0.0, 90.0)).shared();
    let y_scale = ChartScale::new_linear((0.0, 10.0), (100.0, 0.0)).shared();
    let mut plot: LinePlot<(&'static str, f64)> = LinePlot::new();
    plot.set_x(AccessorScaleBinding::new(|r: &(&'static str, f64), _, _| r.0.into(), x_scale));
    plot.set_y(AccessorScaleBinding::new(
        |r: &(&'static str, f64), _, _| r.1.into(),
        y_scale,
    ));
    plot.add_dataset(Dataset::shared(vec![("a", 1.0), ("b", 20.0), ("c", 3.0)]));
    plot.set_autorange_mode(AutorangeMode::Y);
    plot.set_autorange_smooth(true);

    assert!(plot.edge_intersections().is_empty());
    assert_eq!(plot.extents_for(Axis::Y), vec![Some((1.0, 20.0))]);
}

#[test]
fn test_extents_are_per_dataset() {
    let x_scale = ChartScale::new_linear((0.0, 5.0), (0.0, 100.0)).shared();
    let y_scale = ChartScale::new_linear((0.0, 10.0), (100.0, 0.0)).shared();
    let mut plot = pair_plot(&x_scale, &y_scale);
    let empty: Rc<Dataset<(f64, f64)>> = Dataset::shared(Vec::new());
    plot.add_dataset(empty);

    assert_eq!(plot.extents_for(Axis::Y), vec![Some((0.0, 10.0)), None]);
}
