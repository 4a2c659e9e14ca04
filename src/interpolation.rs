//! Curve fitting from ordered pixel points to path commands.
//!
//! The named curves follow the classic SVG line interpolators: straight
//! segments, three step variants, uniform B-splines (basis), bundled
//! B-splines, cardinal Hermite splines and monotone cubic interpolation.

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use d3rs::shape::PathBuilder;
use eyre::{eyre, Result};
use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::path::PathData;

/// Closed set of built-in curves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CurveKind {
    #[default]
    Linear,
    LinearClosed,
    /// Step at the midpoint between points.
    Step,
    StepBefore,
    StepAfter,
    Basis,
    BasisOpen,
    BasisClosed,
    Bundle,
    Cardinal,
    CardinalOpen,
    CardinalClosed,
    Monotone,
}

impl CurveKind {
    pub const ALL: [CurveKind; 13] = [
        Self::Linear,
        Self::LinearClosed,
        Self::Step,
        Self::StepBefore,
        Self::StepAfter,
        Self::Basis,
        Self::BasisOpen,
        Self::BasisClosed,
        Self::Bundle,
        Self::Cardinal,
        Self::CardinalOpen,
        Self::CardinalClosed,
        Self::Monotone,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::LinearClosed => "linear-closed",
            Self::Step => "step",
            Self::StepBefore => "step-before",
            Self::StepAfter => "step-after",
            Self::Basis => "basis",
            Self::BasisOpen => "basis-open",
            Self::BasisClosed => "basis-closed",
            Self::Bundle => "bundle",
            Self::Cardinal => "cardinal",
            Self::CardinalOpen => "cardinal-open",
            Self::CardinalClosed => "cardinal-closed",
            Self::Monotone => "monotone",
        }
    }

    /// Closed curves loop back to their first point.
    pub fn is_closed(self) -> bool {
        matches!(
            self,
            Self::LinearClosed | Self::BasisClosed | Self::CardinalClosed
        )
    }

    /// Appends one sub-path through `points` to `b`.
    pub fn trace(self, b: PathBuilder, points: &[DVec2], tension: f64) -> PathBuilder {
        if points.is_empty() {
            return b;
        }
        match self {
            Self::Linear => linear(b, points),
            Self::LinearClosed => linear_closed(b, points),
            Self::Step => step(b, points),
            Self::StepBefore => step_before(b, points),
            Self::StepAfter => step_after(b, points),
            Self::Basis => basis(b, points),
            Self::BasisOpen => basis_open(b, points),
            Self::BasisClosed => basis_closed(b, points),
            Self::Bundle => bundle(b, points, tension),
            Self::Cardinal => cardinal(b, points, tension),
            Self::CardinalOpen => cardinal_open(b, points, tension),
            Self::CardinalClosed => cardinal_closed(b, points, tension),
            Self::Monotone => monotone(b, points),
        }
    }

    pub fn interpolate(self, points: &[DVec2], tension: f64) -> PathData {
        self.trace(PathBuilder::new(), points, tension).into()
    }
}

impl fmt::Display for CurveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CurveKind {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| {
                tracing::warn!(name = s, "rejected interpolator name");
                eyre!("unknown interpolator `{}`", s)
            })
    }
}

/// User-supplied curve. Receives the builder and one run of defined points, and
/// appends that sub-path starting with its own `move_to`.
#[derive(Clone)]
pub struct CustomCurve(Rc<dyn Fn(PathBuilder, &[DVec2]) -> PathBuilder>);

impl CustomCurve {
    pub fn new(f: impl Fn(PathBuilder, &[DVec2]) -> PathBuilder + 'static) -> Self {
        Self(Rc::new(f))
    }
}

impl fmt::Debug for CustomCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomCurve(..)")
    }
}

#[derive(Clone, Debug)]
pub enum Interpolator {
    Named(CurveKind),
    Custom(CustomCurve),
}

impl Interpolator {
    pub fn custom(f: impl Fn(PathBuilder, &[DVec2]) -> PathBuilder + 'static) -> Self {
        Self::Custom(CustomCurve::new(f))
    }

    pub fn kind(&self) -> Option<CurveKind> {
        match self {
            Self::Named(kind) => Some(*kind),
            Self::Custom(_) => None,
        }
    }

    pub fn trace(&self, b: PathBuilder, points: &[DVec2], tension: f64) -> PathBuilder {
        match self {
            Self::Named(kind) => kind.trace(b, points, tension),
            Self::Custom(curve) => (curve.0)(b, points),
        }
    }

    pub fn interpolate(&self, points: &[DVec2], tension: f64) -> PathData {
        self.trace(PathBuilder::new(), points, tension).into()
    }
}

impl Default for Interpolator {
    fn default() -> Self {
        Self::Named(CurveKind::Linear)
    }
}

impl From<CurveKind> for Interpolator {
    fn from(kind: CurveKind) -> Self {
        Self::Named(kind)
    }
}

impl FromStr for Interpolator {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        s.parse().map(Self::Named)
    }
}

/// `PathBuilder` in terms of `DVec2` points.
trait PointBuilder {
    fn move_pt(self, p: DVec2) -> Self;
    fn line_pt(self, p: DVec2) -> Self;
    fn quad_pt(self, ctrl: DVec2, to: DVec2) -> Self;
    fn cubic_pt(self, ctrl1: DVec2, ctrl2: DVec2, to: DVec2) -> Self;
}

impl PointBuilder for PathBuilder {
    fn move_pt(self, p: DVec2) -> Self {
        self.move_to(p.x, p.y)
    }

    fn line_pt(self, p: DVec2) -> Self {
        self.line_to(p.x, p.y)
    }

    fn quad_pt(self, ctrl: DVec2, to: DVec2) -> Self {
        self.quadratic_curve_to(ctrl.x, ctrl.y, to.x, to.y)
    }

    fn cubic_pt(self, ctrl1: DVec2, ctrl2: DVec2, to: DVec2) -> Self {
        self.cubic_curve_to(ctrl1.x, ctrl1.y, ctrl2.x, ctrl2.y, to.x, to.y)
    }
}

fn line_through(b: PathBuilder, points: &[DVec2]) -> PathBuilder {
    points.iter().fold(b, |b, &p| b.line_pt(p))
}

fn linear(b: PathBuilder, points: &[DVec2]) -> PathBuilder {
    let b = b.move_pt(points[0]);
    if points.len() == 1 {
        b.close_path()
    } else {
        line_through(b, &points[1..])
    }
}

fn linear_closed(b: PathBuilder, points: &[DVec2]) -> PathBuilder {
    line_through(b.move_pt(points[0]), &points[1..]).close_path()
}

fn step(b: PathBuilder, points: &[DVec2]) -> PathBuilder {
    let mut b = b.move_pt(points[0]);
    let mut prev = points[0];
    for &p in &points[1..] {
        b = b
            .horizontal_line_to((prev.x + p.x) / 2.0)
            .vertical_line_to(p.y);
        prev = p;
    }
    if points.len() > 1 {
        b = b.horizontal_line_to(prev.x);
    }
    b
}

fn step_before(b: PathBuilder, points: &[DVec2]) -> PathBuilder {
    points[1..].iter().fold(b.move_pt(points[0]), |b, &p| {
        b.vertical_line_to(p.y).horizontal_line_to(p.x)
    })
}

fn step_after(b: PathBuilder, points: &[DVec2]) -> PathBuilder {
    points[1..].iter().fold(b.move_pt(points[0]), |b, &p| {
        b.horizontal_line_to(p.x).vertical_line_to(p.y)
    })
}

const BASIS_1: [f64; 4] = [0.0, 2.0 / 3.0, 1.0 / 3.0, 0.0];
const BASIS_2: [f64; 4] = [0.0, 1.0 / 3.0, 2.0 / 3.0, 0.0];
const BASIS_3: [f64; 4] = [0.0, 1.0 / 6.0, 2.0 / 3.0, 1.0 / 6.0];

/// Sliding window of the last four control points of a B-spline.
struct BasisWindow {
    x: [f64; 4],
    y: [f64; 4],
}

impl BasisWindow {
    fn shift_in(&mut self, p: DVec2) {
        self.x.rotate_left(1);
        self.y.rotate_left(1);
        self.x[3] = p.x;
        self.y[3] = p.y;
    }

    fn dot(&self, weights: &[f64; 4]) -> DVec2 {
        DVec2::new(dot4(weights, &self.x), dot4(weights, &self.y))
    }

    fn bezier(&self, b: PathBuilder) -> PathBuilder {
        b.cubic_pt(self.dot(&BASIS_1), self.dot(&BASIS_2), self.dot(&BASIS_3))
    }
}

fn dot4(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3]
}

fn basis(b: PathBuilder, points: &[DVec2]) -> PathBuilder {
    let n = points.len();
    if n < 3 {
        return linear(b, points);
    }
    let p0 = points[0];
    let mut window = BasisWindow {
        x: [p0.x, p0.x, p0.x, points[1].x],
        y: [p0.y, p0.y, p0.y, points[1].y],
    };
    let mut b = b.move_pt(p0).line_pt(window.dot(&BASIS_3));
    // The last point is repeated so the spline reaches it.
    for i in 2..=n {
        window.shift_in(points[i.min(n - 1)]);
        b = window.bezier(b);
    }
    b.line_pt(points[n - 1])
}

fn basis_open(b: PathBuilder, points: &[DVec2]) -> PathBuilder {
    if points.len() < 4 {
        return linear(b, points);
    }
    let mut window = BasisWindow {
        x: [0.0, points[0].x, points[1].x, points[2].x],
        y: [0.0, points[0].y, points[1].y, points[2].y],
    };
    let mut b = b.move_pt(window.dot(&BASIS_3));
    for &p in &points[3..] {
        window.shift_in(p);
        b = window.bezier(b);
    }
    b
}

fn basis_closed(b: PathBuilder, points: &[DVec2]) -> PathBuilder {
    let n = points.len();
    let mut window = BasisWindow {
        x: [0.0; 4],
        y: [0.0; 4],
    };
    for i in 0..4 {
        window.x[i] = points[i % n].x;
        window.y[i] = points[i % n].y;
    }
    let mut b = b.move_pt(window.dot(&BASIS_3));
    for i in 4..n + 4 {
        window.shift_in(points[i % n]);
        b = window.bezier(b);
    }
    b
}

/// Pulls every point toward the straight line between the endpoints, then fits a basis spline.
fn bundle(b: PathBuilder, points: &[DVec2], tension: f64) -> PathBuilder {
    let n = points.len() - 1;
    if n == 0 {
        return basis(b, points);
    }
    let start = points[0];
    let delta = points[n] - start;
    let bundled: Vec<DVec2> = points
        .iter()
        .enumerate()
        .map(|(i, &p)| {
            let t = i as f64 / n as f64;
            tension * p + (1.0 - tension) * (start + t * delta)
        })
        .collect();
    basis(b, &bundled)
}

fn cardinal_tangents(points: &[DVec2], tension: f64) -> Vec<DVec2> {
    let a = (1.0 - tension) / 2.0;
    points.windows(3).map(|w| a * (w[2] - w[0])).collect()
}

fn cardinal(b: PathBuilder, points: &[DVec2], tension: f64) -> PathBuilder {
    if points.len() < 3 {
        return linear(b, points);
    }
    hermite(
        b.move_pt(points[0]),
        points,
        &cardinal_tangents(points, tension),
    )
}

fn cardinal_open(b: PathBuilder, points: &[DVec2], tension: f64) -> PathBuilder {
    let n = points.len();
    if n < 4 {
        return linear(b, points);
    }
    hermite(
        b.move_pt(points[1]),
        &points[1..n - 1],
        &cardinal_tangents(points, tension),
    )
}

fn cardinal_closed(b: PathBuilder, points: &[DVec2], tension: f64) -> PathBuilder {
    let n = points.len();
    if n < 3 {
        return linear_closed(b, points);
    }
    let mut looped = points.to_vec();
    looped.push(points[0]);
    let mut padded = Vec::with_capacity(n + 3);
    padded.push(points[n - 1]);
    padded.extend_from_slice(&looped);
    padded.push(points[1]);

    hermite(
        b.move_pt(points[0]),
        &looped,
        &cardinal_tangents(&padded, tension),
    )
}

/// Cubic Hermite segments through `points` with the given tangents.
///
/// With two more points than tangents, the first and last segments are quadratic.
/// Each segment after the first cubic starts with the previous segment's control
/// point mirrored about their shared point, i.e. `p + t`.
fn hermite(b: PathBuilder, points: &[DVec2], tangents: &[DVec2]) -> PathBuilder {
    if tangents.is_empty()
        || (points.len() != tangents.len() && points.len() != tangents.len() + 2)
    {
        return line_through(b, points);
    }
    let quad = points.len() != tangents.len();
    let mut b = b;
    let mut p0 = points[0];
    let mut p = points[1];
    let t0 = tangents[0];
    let mut t = t0;
    let mut pi = 1;

    if quad {
        b = b.quad_pt(p - t0 * 2.0 / 3.0, p);
        p0 = points[1];
        pi = 2;
    }

    if tangents.len() > 1 {
        t = tangents[1];
        p = points[pi];
        pi += 1;
        b = b.cubic_pt(p0 + t0, p - t, p);
        for &ti in &tangents[2..] {
            let mirrored = p + t;
            p = points[pi];
            t = ti;
            b = b.cubic_pt(mirrored, p - t, p);
            pi += 1;
        }
    }

    if quad {
        b = b.quad_pt(p + t * 2.0 / 3.0, points[pi]);
    }
    b
}

const MONOTONE_EPSILON: f64 = 1e-6;

fn slope(p0: DVec2, p1: DVec2) -> f64 {
    (p1.y - p0.y) / (p1.x - p0.x)
}

fn finite_differences(points: &[DVec2]) -> Vec<f64> {
    let j = points.len() - 1;
    let mut m = vec![0.0; points.len()];
    let mut d = slope(points[0], points[1]);
    m[0] = d;
    for i in 1..j {
        let next = slope(points[i], points[i + 1]);
        m[i] = (d + next) / 2.0;
        d = next;
    }
    m[j] = d;
    m
}

/// Fritsch-Carlson tangents keeping the interpolant monotone between points.
fn monotone_tangents(points: &[DVec2]) -> Vec<DVec2> {
    let mut m = finite_differences(points);
    let j = points.len() - 1;
    for i in 0..j {
        let d = slope(points[i], points[i + 1]);
        if d.abs() < MONOTONE_EPSILON {
            m[i] = 0.0;
            m[i + 1] = 0.0;
        } else {
            let a = m[i] / d;
            let b = m[i + 1] / d;
            let s = a * a + b * b;
            if s > 9.0 {
                let s = d * 3.0 / s.sqrt();
                m[i] = s * a;
                m[i + 1] = s * b;
            }
        }
    }
    (0..=j)
        .map(|i| {
            let span = points[(i + 1).min(j)].x - points[i.saturating_sub(1)].x;
            let s = span / (6.0 * (1.0 + m[i] * m[i]));
            DVec2::new(nan_to_zero(s), nan_to_zero(m[i] * s))
        })
        .collect()
}

fn nan_to_zero(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v
    }
}

fn monotone(b: PathBuilder, points: &[DVec2]) -> PathBuilder {
    if points.len() < 3 {
        return linear(b, points);
    }
    hermite(b.move_pt(points[0]), points, &monotone_tangents(points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathCommand;

    fn pts(raw: &[(f64, f64)]) -> Vec<DVec2> {
        raw.iter().map(|&(x, y)| DVec2::new(x, y)).collect()
    }

    fn svg(kind: CurveKind, raw: &[(f64, f64)]) -> String {
        kind.interpolate(&pts(raw), 0.7).to_string()
    }

    #[test]
    fn test_step_variants() {
        let raw = [(0.0, 0.0), (2.0, 4.0), (4.0, 2.0)];
        assert_eq!(svg(CurveKind::Step, &raw), "M0,0 H1 V4 H3 V2 H4");
        assert_eq!(svg(CurveKind::StepBefore, &raw), "M0,0 V4 H2 V2 H4");
        assert_eq!(svg(CurveKind::StepAfter, &raw), "M0,0 H2 V4 H4 V2");
    }

    #[test]
    fn test_linear_closed() {
        assert_eq!(
            svg(CurveKind::LinearClosed, &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]),
            "M0,0 L1,0 L1,1 Z"
        );
    }

    #[test]
    fn test_short_inputs_fall_back_to_linear() {
        let two = [(0.0, 0.0), (6.0, 3.0)];
        for kind in [
            CurveKind::Basis,
            CurveKind::Cardinal,
            CurveKind::Monotone,
            CurveKind::BasisOpen,
            CurveKind::CardinalOpen,
        ] {
            assert_eq!(svg(kind, &two), "M0,0 L6,3", "{}", kind);
        }
    }

    #[test]
    fn test_basis_three_points() {
        let path = CurveKind::Basis.interpolate(&pts(&[(0.0, 0.0), (6.0, 6.0), (12.0, 0.0)]), 0.7);
        let out = path.commands();
        assert_eq!(out[0], PathCommand::MoveTo { x: 0.0, y: 0.0 });
        assert_eq!(out.len(), 5);
        assert_eq!(out[4], PathCommand::LineTo { x: 12.0, y: 0.0 });
        // Second bezier ends at (p1 + 4 p2 + p2) / 6
        if let PathCommand::CubicCurveTo { x, y, .. } = out[3] {
            assert!((x - 11.0).abs() < 1e-9);
            assert!((y - 1.0).abs() < 1e-9);
        } else {
            panic!("expected cubic, got {:?}", out[3]);
        }
    }

    #[test]
    fn test_cardinal_three_points_is_quadratic() {
        let path = CurveKind::Cardinal.interpolate(&pts(&[(0.0, 0.0), (6.0, 6.0), (12.0, 0.0)]), 0.5);
        // tangent = 0.25 * (12, 0) = (3, 0)
        assert_eq!(
            path.commands(),
            &[
                PathCommand::MoveTo { x: 0.0, y: 0.0 },
                PathCommand::QuadraticCurveTo {
                    x1: 4.0,
                    y1: 6.0,
                    x: 6.0,
                    y: 6.0
                },
                PathCommand::QuadraticCurveTo {
                    x1: 8.0,
                    y1: 6.0,
                    x: 12.0,
                    y: 0.0
                },
            ]
        );
    }

    #[test]
    fn test_hermite_mirrors_previous_control_point() {
        let points = pts(&[(0.0, 0.0), (10.0, 0.0), (20.0, 10.0), (30.0, 0.0)]);
        let tangents = pts(&[(1.0, 1.0), (2.0, 0.0), (0.0, 3.0), (1.0, -1.0)]);
        let path: PathData = hermite(PathBuilder::new().move_pt(points[0]), &points, &tangents).into();
        let out = path.commands();
        assert_eq!(out.len(), 4);
        // (10, 0) + (2, 0)
        assert_eq!(
            out[2],
            PathCommand::CubicCurveTo {
                x1: 12.0,
                y1: 0.0,
                x2: 20.0,
                y2: 7.0,
                x: 20.0,
                y: 10.0
            }
        );
        // (20, 10) + (0, 3)
        assert_eq!(
            out[3],
            PathCommand::CubicCurveTo {
                x1: 20.0,
                y1: 13.0,
                x2: 29.0,
                y2: 1.0,
                x: 30.0,
                y: 0.0
            }
        );
    }

    #[test]
    fn test_cardinal_closed_returns_to_start() {
        let path = CurveKind::CardinalClosed.interpolate(
            &pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]),
            0.5,
        );
        assert_eq!(path.len(), 1 + 1 + 3);
        match path.commands().last() {
            Some(PathCommand::CubicCurveTo { x, y, .. }) => assert_eq!((*x, *y), (0.0, 0.0)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_monotone_flat_run_has_flat_tangents() {
        let t = monotone_tangents(&pts(&[(0.0, 1.0), (1.0, 1.0), (2.0, 1.0), (3.0, 5.0)]));
        assert_eq!(t[0].y, 0.0);
        assert_eq!(t[1].y, 0.0);
        assert_eq!(t.len(), 4);
    }

    #[test]
    fn test_monotone_never_overshoots_control_points() {
        let raw = [(0.0, 0.0), (1.0, 10.0), (2.0, 10.5), (3.0, 30.0)];
        let path = CurveKind::Monotone.interpolate(&pts(&raw), 0.7);
        for cmd in path.commands() {
            if let PathCommand::CubicCurveTo { y1, y2, .. } = *cmd {
                assert!(y1 >= 0.0 && y2 <= 30.0);
            }
        }
    }

    #[test]
    fn test_bundle_with_full_tension_is_basis() {
        let raw = pts(&[(0.0, 0.0), (5.0, 9.0), (10.0, -3.0), (15.0, 4.0)]);
        assert_eq!(
            CurveKind::Bundle.interpolate(&raw, 1.0),
            CurveKind::Basis.interpolate(&raw, 1.0)
        );
    }

    #[test]
    fn test_parse_names() {
        for kind in CurveKind::ALL {
            assert_eq!(kind.name().parse::<CurveKind>().unwrap(), kind);
        }
        assert!("catmull-rom".parse::<CurveKind>().is_err());
        assert!(CurveKind::BasisClosed.is_closed());
        assert!(!CurveKind::Bundle.is_closed());
    }

    #[test]
    fn test_custom_curve() {
        let interp = Interpolator::custom(|b, points| {
            let last = points[points.len() - 1];
            b.move_pt(points[0]).line_pt(last)
        });
        let out = interp.interpolate(&pts(&[(0.0, 0.0), (1.0, 5.0), (2.0, 2.0)]), 0.7);
        assert_eq!(out.to_string(), "M0,0 L2,2");
        assert!(interp.kind().is_none());
    }
}
