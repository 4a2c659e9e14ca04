//! Draw steps produced by plots and the seam to the external executor that paints them.

use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::component::Surface;
use crate::data_types::Dataset;
use crate::path::PathData;

/// Attribute holding the path geometry.
pub const PATH_ATTR: &str = "d";

#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    Number(f64),
    Text(String),
    Path(PathData),
}

impl AttrValue {
    pub fn as_path(&self) -> Option<&PathData> {
        match self {
            Self::Path(p) => Some(p),
            _ => None,
        }
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Per-row attribute accessor.
pub type RowAttr<R> = Rc<dyn Fn(&R, usize, &Dataset<R>) -> AttrValue>;

/// How a user defines an attribute: one value for everything, or one per row.
pub enum AttrSource<R> {
    Constant(AttrValue),
    PerRow(RowAttr<R>),
}

impl<R> AttrSource<R> {
    pub fn per_row(f: impl Fn(&R, usize, &Dataset<R>) -> AttrValue + 'static) -> Self {
        Self::PerRow(Rc::new(f))
    }

    pub fn evaluate(&self, row: &R, index: usize, dataset: &Dataset<R>) -> AttrValue {
        match self {
            Self::Constant(v) => v.clone(),
            Self::PerRow(f) => f(row, index, dataset),
        }
    }
}

impl<R> Clone for AttrSource<R> {
    fn clone(&self) -> Self {
        match self {
            Self::Constant(v) => Self::Constant(v.clone()),
            Self::PerRow(f) => Self::PerRow(f.clone()),
        }
    }
}

/// Attribute evaluated once for a drawn element, i.e. the whole row slice of a dataset.
pub type Projector<R> = Rc<dyn Fn(&[R], usize, &Dataset<R>) -> Option<AttrValue>>;

pub type AttrToProjector<R> = BTreeMap<String, Projector<R>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimatorKey {
    Main,
    Reset,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EasingMode {
    #[default]
    Linear,
    ExpIn,
    ExpOut,
    ExpInOut,
    CubicInOut,
}

/// Timing of an animated transition; the curve itself is applied by the executor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Animator {
    pub step_duration: Duration,
    pub easing: EasingMode,
    pub max_total_duration: Duration,
}

impl Animator {
    /// Applies the final attributes immediately.
    pub const NULL: Animator = Animator {
        step_duration: Duration::ZERO,
        easing: EasingMode::Linear,
        max_total_duration: Duration::ZERO,
    };

    pub const MAX_DURATION: Duration = Duration::from_millis(600);

    pub fn easing(step_duration: Duration, easing: EasingMode, max_total_duration: Duration) -> Self {
        Self {
            step_duration,
            easing,
            max_total_duration,
        }
    }

    pub fn is_null(&self) -> bool {
        self.step_duration.is_zero() && self.max_total_duration.is_zero()
    }
}

impl Default for Animator {
    fn default() -> Self {
        Self::NULL
    }
}

/// Attribute projectors paired with the animator that transitions to them.
pub struct DrawStep<R> {
    pub attr_to_projector: AttrToProjector<R>,
    pub animator: Animator,
}

impl<R> DrawStep<R> {
    /// Evaluates every projector against one dataset. Attributes that yield nothing are omitted.
    pub fn resolve(&self, dataset: &Dataset<R>, index: usize) -> DrawCommand {
        let rows = dataset.data();
        let attrs = self
            .attr_to_projector
            .iter()
            .filter_map(|(name, projector)| {
                projector(&*rows, index, dataset).map(|v| (name.clone(), v))
            })
            .collect();
        DrawCommand {
            attrs,
            animator: self.animator,
        }
    }
}

/// A resolved draw step: concrete attribute values for one drawn element.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawCommand {
    pub attrs: BTreeMap<String, AttrValue>,
    pub animator: Animator,
}

impl DrawCommand {
    pub fn path(&self) -> Option<&PathData> {
        self.attrs.get(PATH_ATTR).and_then(AttrValue::as_path)
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }
}

/// Paints draw commands with their timing. Implemented by the rendering backend.
pub trait DrawExecutor {
    /// `element` identifies the drawn element within the component (the dataset index for plots).
    fn execute(&mut self, surface: &Surface, element: usize, commands: &[DrawCommand]);
}

#[derive(Clone, Debug, PartialEq)]
pub struct DrawBatch {
    pub surface: Surface,
    pub element: usize,
    pub commands: Vec<DrawCommand>,
}

/// Executor that keeps every batch it receives, for headless use and tests.
#[derive(Clone, Debug, Default)]
pub struct DrawRecorder {
    pub batches: Vec<DrawBatch>,
}

impl DrawRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.batches.clear();
    }
}

impl DrawExecutor for DrawRecorder {
    fn execute(&mut self, surface: &Surface, element: usize, commands: &[DrawCommand]) {
        self.batches.push(DrawBatch {
            surface: surface.clone(),
            element,
            commands: commands.to_vec(),
        });
    }
}
