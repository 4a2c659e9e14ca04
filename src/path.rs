//! Declarative path descriptions handed to the rendering backend.

use std::fmt;

use d3rs::shape::{Path, PathBuilder};
use glam::DVec2;

use crate::interpolation::Interpolator;

pub use d3rs::shape::PathCommand;

/// Finished path in absolute pixel coordinates, possibly made of several sub-paths.
#[derive(Clone, Debug, Default)]
pub struct PathData(Path);

impl PathData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[PathCommand] {
        self.0.commands()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.commands().len()
    }

    /// Number of sub-paths, i.e. `MoveTo` commands.
    pub fn segment_count(&self) -> usize {
        self.commands()
            .iter()
            .filter(|c| matches!(c, PathCommand::MoveTo { .. }))
            .count()
    }

    /// Bounding box as `(min_x, min_y, max_x, max_y)`, control points included.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        self.0.bounds()
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl From<Path> for PathData {
    fn from(path: Path) -> Self {
        Self(path)
    }
}

impl From<PathBuilder> for PathData {
    fn from(builder: PathBuilder) -> Self {
        Self(builder.build())
    }
}

impl PartialEq for PathData {
    fn eq(&self, other: &Self) -> bool {
        self.commands() == other.commands()
    }
}

/// SVG path-data text, e.g. `M0,0 L10,5`.
impl fmt::Display for PathData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_svg_string())
    }
}

/// Builds a path from projected points, breaking it wherever a point is undefined.
///
/// Each maximal run of defined points is interpolated on its own and becomes one sub-path.
pub struct LineGenerator<'a> {
    interpolator: &'a Interpolator,
    tension: f64,
}

impl<'a> LineGenerator<'a> {
    pub fn new(interpolator: &'a Interpolator, tension: f64) -> Self {
        Self {
            interpolator,
            tension,
        }
    }

    pub fn generate(&self, points: impl IntoIterator<Item = Option<DVec2>>) -> PathData {
        let mut builder = PathBuilder::new();
        let mut run: Vec<DVec2> = Vec::new();
        for point in points {
            match point.filter(|p| !p.x.is_nan() && !p.y.is_nan()) {
                Some(p) => run.push(p),
                None => builder = self.flush(&mut run, builder),
            }
        }
        self.flush(&mut run, builder).into()
    }

    fn flush(&self, run: &mut Vec<DVec2>, builder: PathBuilder) -> PathBuilder {
        if run.is_empty() {
            return builder;
        }
        let builder = self.interpolator.trace(builder, run.as_slice(), self.tension);
        run.clear();
        builder
    }
}
