use std::rc::Rc;

use super::data::Value;
use super::dataset::Dataset;
use crate::scales::SharedScale;

/// Maps a row (with its index and owning dataset) to a datum.
pub type Accessor<R> = Rc<dyn Fn(&R, usize, &Dataset<R>) -> Value>;

/// An accessor paired with the scale that takes its output to pixel space.
///
/// Without a scale the accessor output is used as a pixel value directly.
pub struct AccessorScaleBinding<R> {
    pub accessor: Accessor<R>,
    pub scale: Option<SharedScale>,
}

impl<R> Clone for AccessorScaleBinding<R> {
    fn clone(&self) -> Self {
        Self {
            accessor: self.accessor.clone(),
            scale: self.scale.clone(),
        }
    }
}

impl<R> AccessorScaleBinding<R> {
    pub fn new(
        accessor: impl Fn(&R, usize, &Dataset<R>) -> Value + 'static,
        scale: SharedScale,
    ) -> Self {
        Self {
            accessor: Rc::new(accessor),
            scale: Some(scale),
        }
    }

    pub fn unscaled(accessor: impl Fn(&R, usize, &Dataset<R>) -> Value + 'static) -> Self {
        Self {
            accessor: Rc::new(accessor),
            scale: None,
        }
    }

    /// Every row maps to the same datum.
    pub fn constant(value: Value, scale: Option<SharedScale>) -> Self {
        Self {
            accessor: Rc::new(move |_: &R, _: usize, _: &Dataset<R>| value.clone()),
            scale,
        }
    }

    pub fn value(&self, row: &R, index: usize, dataset: &Dataset<R>) -> Value {
        (self.accessor)(row, index, dataset)
    }

    /// Pixel position of a row, or `None` when the scale cannot map the datum.
    pub fn scaled(&self, row: &R, index: usize, dataset: &Dataset<R>) -> Option<f64> {
        let value = self.value(row, index, dataset);
        match &self.scale {
            Some(scale) => scale.borrow().scale(&value),
            None => value.as_f64(),
        }
    }
}

impl<R> std::fmt::Debug for AccessorScaleBinding<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessorScaleBinding")
            .field("scale", &self.scale)
            .finish_non_exhaustive()
    }
}
