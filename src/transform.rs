//! Transform helper for coordinate projection

use crate::scales::ChartScale;
use glam::DVec2;

/// Pixel positions of the four boundaries of the current view.
///
/// `top` is the pixel of the y-domain's second endpoint and `bottom` of its first,
/// whichever way the range runs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edges {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

#[derive(Clone, Debug)]
pub struct PlotTransform {
    pub x_scale: ChartScale,
    pub y_scale: ChartScale,
}

impl PlotTransform {
    pub fn new(x_scale: ChartScale, y_scale: ChartScale) -> Self {
        Self { x_scale, y_scale }
    }

    /// Both scales are quantitative.
    pub fn is_continuous(&self) -> bool {
        self.x_scale.is_continuous() && self.y_scale.is_continuous()
    }

    pub fn data_to_screen(&self, point: DVec2) -> DVec2 {
        DVec2::new(self.x_scale.map(point.x), self.y_scale.map(point.y))
    }

    pub fn screen_to_data(&self, point: DVec2) -> Option<DVec2> {
        Some(DVec2::new(
            self.x_scale.invert(point.x)?,
            self.y_scale.invert(point.y)?,
        ))
    }

    /// Boundaries projected from the current domains. `None` unless both scales are continuous.
    pub fn edges(&self) -> Option<Edges> {
        let (x0, x1) = self.x_scale.domain()?;
        let (y0, y1) = self.y_scale.domain()?;
        Some(Edges {
            left: self.x_scale.map(x0),
            right: self.x_scale.map(x1),
            top: self.y_scale.map(y1),
            bottom: self.y_scale.map(y0),
        })
    }

    /// Whether a pixel position lies inside both scale ranges (inclusive).
    pub fn contains_screen(&self, point: DVec2) -> bool {
        in_range(point.x, self.x_scale.range()) && in_range(point.y, self.y_scale.range())
    }
}

pub fn in_range(value: f64, (a, b): (f64, f64)) -> bool {
    a.min(b) <= value && value <= a.max(b)
}
