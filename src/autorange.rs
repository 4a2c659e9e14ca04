//! Domain fitting helpers for smooth autoranging.
//!
//! Pure functions, independent of plots and datasets, so they can be tested
//! on their own.

use glam::DVec2;

use crate::data_types::{Axis, Extent};
use crate::transform::{Edges, PlotTransform};

/// Points where a line crosses each boundary of the view.
///
/// Left/right crossings hold the boundary pixel as `x` and the crossing's
/// y in domain units; top/bottom crossings hold the x in domain units and
/// the boundary pixel as `y`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EdgeIntersections {
    pub left: Vec<DVec2>,
    pub right: Vec<DVec2>,
    pub top: Vec<DVec2>,
    pub bottom: Vec<DVec2>,
}

impl EdgeIntersections {
    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty() && self.top.is_empty() && self.bottom.is_empty()
    }

    /// Domain values that the autoranged axis has to include.
    ///
    /// Fitting y looks at where the line leaves through the left and right
    /// edges; fitting x at the top and bottom edges.
    pub fn included_values(&self, axis: Axis) -> Vec<f64> {
        match axis {
            Axis::Y => self.left.iter().chain(&self.right).map(|p| p.y).collect(),
            Axis::X => self.top.iter().chain(&self.bottom).map(|p| p.x).collect(),
        }
    }
}

/// Half-open crossing test: `prev` strictly before the boundary and `curr` at or
/// past it, or the reverse. A point exactly on the boundary counts as past it.
pub fn crosses(prev: f64, curr: f64, boundary: f64) -> bool {
    (prev < boundary) == (boundary <= curr)
}

/// Records every boundary crossed by the pixel segment `prev -> curr`.
///
/// Crossing coordinates are interpolated linearly along the segment and
/// inverted back to domain units through `transform`.
pub fn segment_intersections(
    prev: DVec2,
    curr: DVec2,
    edges: &Edges,
    transform: &PlotTransform,
    out: &mut EdgeIntersections,
) {
    let delta = curr - prev;

    for (boundary, bucket) in [(edges.left, &mut out.left), (edges.right, &mut out.right)] {
        if crosses(prev.x, curr.x, boundary) {
            let dy = (boundary - prev.x) * delta.y / delta.x;
            if let Some(y) = transform.y_scale.invert(prev.y + dy) {
                bucket.push(DVec2::new(boundary, y));
            }
        }
    }

    for (boundary, bucket) in [(edges.top, &mut out.top), (edges.bottom, &mut out.bottom)] {
        if crosses(prev.y, curr.y, boundary) {
            let dx = (boundary - prev.y) * delta.x / delta.y;
            if let Some(x) = transform.x_scale.invert(prev.x + dx) {
                bucket.push(DVec2::new(x, boundary));
            }
        }
    }
}

/// Intersections of a polyline (pixel points, in row order) with the view edges.
///
/// Pairs involving an undefined point are skipped. Returns nothing unless both
/// scales are continuous.
pub fn polyline_intersections(
    points: &[Option<DVec2>],
    transform: &PlotTransform,
    out: &mut EdgeIntersections,
) {
    let Some(edges) = transform.edges() else {
        return;
    };
    for pair in points.windows(2) {
        if let (Some(prev), Some(curr)) = (defined(pair[0]), defined(pair[1])) {
            segment_intersections(prev, curr, &edges, transform, out);
        }
    }
}

fn defined(point: Option<DVec2>) -> Option<DVec2> {
    point.filter(|p| !p.x.is_nan() && !p.y.is_nan())
}

/// Widens every extent so it also covers `included`.
///
/// An empty extent becomes exactly `[min(included), max(included)]`. With no
/// included values the extents are returned unchanged.
pub fn widen_extents(extents: &[Extent], included: &[f64]) -> Vec<Extent> {
    let bounds = included
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(None, |acc: Extent, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        });
    let Some((min_included, max_included)) = bounds else {
        return extents.to_vec();
    };
    extents
        .iter()
        .map(|extent| match extent {
            None => Some((min_included, max_included)),
            Some((lo, hi)) => Some((min_included.min(*lo), max_included.max(*hi))),
        })
        .collect()
}

/// Domain value an animated line sweeps in from: zero when the domain spans it,
/// otherwise the domain bound closest to zero.
pub fn reset_baseline(domain: (f64, f64)) -> f64 {
    let max = domain.0.max(domain.1);
    let min = domain.0.min(domain.1);
    if max < 0.0 {
        max
    } else if min > 0.0 {
        min
    } else {
        0.0
    }
}
