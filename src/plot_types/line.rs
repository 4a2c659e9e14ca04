use std::any::Any;
use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use glam::DVec2;
use tracing::{debug, trace};

use super::{PlotEntity, PlotRenderer};
use crate::autorange::{polyline_intersections, reset_baseline, widen_extents, EdgeIntersections};
use crate::component::{Component, Surface};
use crate::data_types::{
    extent_of, AccessorScaleBinding, AutorangeMode, Axis, Dataset, Extent, LinePlotConfig,
    ListenerId,
};
use crate::interpolation::Interpolator;
use crate::path::LineGenerator;
use crate::rendering::{
    Animator, AnimatorKey, AttrSource, AttrToProjector, AttrValue, DrawCommand, DrawExecutor,
    DrawStep, EasingMode, Projector, PATH_ATTR,
};
use crate::theme::ChartTheme;
use crate::transform::{in_range, PlotTransform};

/// Pixel coordinate of a row along one axis.
type CoordProjector<R> = Rc<dyn Fn(&R, usize, &Dataset<R>) -> Option<f64>>;

#[derive(Debug, Default)]
struct DirtyFlags {
    needs_render: Cell<bool>,
    data_changed: Cell<bool>,
}

impl DirtyFlags {
    fn data_updated(&self) {
        self.data_changed.set(true);
        self.needs_render.set(true);
    }
}

/// Line plot type
///
/// Draws one interpolated path per dataset. Rows are opaque; the x and y
/// bindings turn them into pixel positions.
pub struct LinePlot<R> {
    datasets: Vec<(Rc<Dataset<R>>, ListenerId)>,
    x: Option<AccessorScaleBinding<R>>,
    y: Option<AccessorScaleBinding<R>>,
    interpolator: Interpolator,
    tension: f64,
    autorange_mode: AutorangeMode,
    autorange_smooth: bool,
    animated: bool,
    attrs: BTreeMap<String, AttrSource<R>>,
    animators: BTreeMap<AnimatorKey, Animator>,
    flags: Rc<DirtyFlags>,
}

impl<R: 'static> LinePlot<R> {
    pub fn new() -> Self {
        let theme = ChartTheme::default();
        let mut attrs = BTreeMap::new();
        attrs.insert(
            "stroke".to_string(),
            AttrSource::Constant(theme.series_color(0).into()),
        );
        attrs.insert(
            "stroke-width".to_string(),
            AttrSource::Constant(theme.line_width.into()),
        );

        let mut animators = BTreeMap::new();
        animators.insert(
            AnimatorKey::Main,
            Animator::easing(Animator::MAX_DURATION, EasingMode::ExpInOut, Animator::MAX_DURATION),
        );
        animators.insert(AnimatorKey::Reset, Animator::NULL);

        Self {
            datasets: Vec::new(),
            x: None,
            y: None,
            interpolator: Interpolator::default(),
            tension: 0.7,
            autorange_mode: AutorangeMode::None,
            autorange_smooth: false,
            animated: false,
            attrs,
            animators,
            flags: Rc::new(DirtyFlags::default()),
        }
    }

    pub fn with_config(config: &LinePlotConfig) -> Self {
        let mut plot = Self::new();
        plot.apply_config(config);
        plot
    }

    /// Applies every field of `config` through the regular setters.
    pub fn apply_config(&mut self, config: &LinePlotConfig) {
        self.set_interpolator(config.interpolation);
        self.set_tension(config.tension);
        self.set_autorange_mode(config.autorange_mode);
        self.set_autorange_smooth(config.autorange_smooth);
        self.set_animated(config.animated);
        self.set_attr("stroke", AttrSource::Constant(config.stroke.as_str().into()));
        self.set_attr("stroke-width", AttrSource::Constant(config.stroke_width.into()));
    }

    // --- datasets ---

    /// Returns false if the dataset is already drawn by this plot.
    pub fn add_dataset(&mut self, dataset: Rc<Dataset<R>>) -> bool {
        if self.datasets.iter().any(|(d, _)| Rc::ptr_eq(d, &dataset)) {
            return false;
        }
        let flags = self.flags.clone();
        let listener = dataset.on_update(move |_| flags.data_updated());
        self.datasets.push((dataset, listener));
        self.flags.data_updated();
        true
    }

    pub fn remove_dataset(&mut self, dataset: &Rc<Dataset<R>>) -> bool {
        let Some(pos) = self.datasets.iter().position(|(d, _)| Rc::ptr_eq(d, dataset)) else {
            return false;
        };
        let (removed, listener) = self.datasets.remove(pos);
        removed.off_update(listener);
        self.flags.data_updated();
        true
    }

    pub fn datasets(&self) -> Vec<Rc<Dataset<R>>> {
        self.datasets.iter().map(|(d, _)| d.clone()).collect()
    }

    // --- bindings ---

    pub fn x(&self) -> Option<&AccessorScaleBinding<R>> {
        self.x.as_ref()
    }

    pub fn y(&self) -> Option<&AccessorScaleBinding<R>> {
        self.y.as_ref()
    }

    pub fn binding(&self, axis: Axis) -> Option<&AccessorScaleBinding<R>> {
        match axis {
            Axis::X => self.x.as_ref(),
            Axis::Y => self.y.as_ref(),
        }
    }

    pub fn set_x(&mut self, binding: AccessorScaleBinding<R>) {
        self.set_binding(Axis::X, binding);
    }

    pub fn set_y(&mut self, binding: AccessorScaleBinding<R>) {
        self.set_binding(Axis::Y, binding);
    }

    pub fn set_binding(&mut self, axis: Axis, binding: AccessorScaleBinding<R>) {
        match axis {
            Axis::X => self.x = Some(binding),
            Axis::Y => self.y = Some(binding),
        }
        self.sync_snapping();
        self.mark_for_render();
    }

    pub fn autorange_mode(&self) -> AutorangeMode {
        self.autorange_mode
    }

    pub fn set_autorange_mode(&mut self, mode: AutorangeMode) {
        self.autorange_mode = mode;
        self.sync_snapping();
    }

    pub fn autorange_smooth(&self) -> bool {
        self.autorange_smooth
    }

    pub fn set_autorange_smooth(&mut self, smooth: bool) {
        self.autorange_smooth = smooth;
        self.sync_snapping();
    }

    /// Smooth mode turns nice rounding off on the autoranged scale, normal mode turns it on.
    fn sync_snapping(&self) {
        let Some(axis) = self.autorange_mode.axis() else {
            return;
        };
        let Some(scale) = self.binding(axis).and_then(|b| b.scale.as_ref()) else {
            return;
        };
        let mut scale = scale.borrow_mut();
        if scale.is_continuous() {
            scale.set_snaps_domain(!self.autorange_smooth);
        }
    }

    // --- appearance ---

    pub fn interpolator(&self) -> &Interpolator {
        &self.interpolator
    }

    pub fn set_interpolator(&mut self, interpolator: impl Into<Interpolator>) {
        self.interpolator = interpolator.into();
        self.mark_for_render();
    }

    /// Parses a named curve, leaving the current interpolator in place on failure.
    pub fn set_interpolator_name(&mut self, name: &str) -> eyre::Result<()> {
        let interpolator: Interpolator = name.parse()?;
        self.set_interpolator(interpolator);
        Ok(())
    }

    pub fn tension(&self) -> f64 {
        self.tension
    }

    pub fn set_tension(&mut self, tension: f64) {
        self.tension = tension;
        self.mark_for_render();
    }

    pub fn animated(&self) -> bool {
        self.animated
    }

    pub fn set_animated(&mut self, animated: bool) {
        self.animated = animated;
    }

    pub fn attr(&self, name: &str) -> Option<&AttrSource<R>> {
        self.attrs.get(name)
    }

    pub fn set_attr(&mut self, name: impl Into<String>, source: AttrSource<R>) {
        self.attrs.insert(name.into(), source);
        self.mark_for_render();
    }

    /// Unset keys resolve to the null animator.
    pub fn animator(&self, key: AnimatorKey) -> Animator {
        self.animators.get(&key).copied().unwrap_or(Animator::NULL)
    }

    pub fn set_animator(&mut self, key: AnimatorKey, animator: Animator) {
        self.animators.insert(key, animator);
    }

    // --- render state ---

    pub fn mark_for_render(&self) {
        self.flags.needs_render.set(true);
    }

    pub fn animate_on_next_render(&self) -> bool {
        self.animated && self.flags.data_changed.get()
    }

    /// Resolves the draw steps against every dataset, one command list per dataset.
    pub fn draw_commands(&self) -> Vec<Vec<DrawCommand>> {
        let steps = self.generate_draw_steps();
        self.datasets
            .iter()
            .map(|(dataset, _)| steps.iter().map(|step| step.resolve(dataset, 0)).collect())
            .collect()
    }

    pub fn render_to(&mut self, surface: &Surface, executor: &mut dyn DrawExecutor) {
        let commands = self.draw_commands();
        trace!(datasets = commands.len(), "rendering line plot");
        for (element, commands) in commands.iter().enumerate() {
            executor.execute(surface, element, commands);
        }
        self.flags.data_changed.set(false);
        self.flags.needs_render.set(false);
    }

    // --- projection ---

    /// Both scales, when both bindings have one.
    pub fn transform(&self) -> Option<PlotTransform> {
        let x_scale = self.x.as_ref()?.scale.as_ref()?.borrow().clone();
        let y_scale = self.y.as_ref()?.scale.as_ref()?.borrow().clone();
        Some(PlotTransform::new(x_scale, y_scale))
    }

    /// Pixel position of every row; `None` for undefined rows.
    pub fn projected_points(&self, dataset: &Dataset<R>) -> Vec<Option<DVec2>> {
        let (Some(x), Some(y)) = (&self.x, &self.y) else {
            return vec![None; dataset.len()];
        };
        let rows = dataset.data();
        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                let px = x.scaled(row, i, dataset)?;
                let py = y.scaled(row, i, dataset)?;
                (!px.is_nan() && !py.is_nan()).then(|| DVec2::new(px, py))
            })
            .collect()
    }

    /// Where each dataset's polyline leaves the current view.
    ///
    /// Empty unless both scales are continuous.
    pub fn edge_intersections(&self) -> EdgeIntersections {
        let mut out = EdgeIntersections::default();
        let Some(transform) = self.transform() else {
            return out;
        };
        if !transform.is_continuous() {
            return out;
        }
        for (dataset, _) in &self.datasets {
            let points = self.projected_points(dataset);
            polyline_intersections(&points, &transform, &mut out);
        }
        out
    }

    /// Fits the autoranged scale's domain to the current extents.
    ///
    /// Returns false when no axis is autoranged or it has no scale.
    pub fn autorange(&self) -> bool {
        let Some(axis) = self.autorange_mode.axis() else {
            return false;
        };
        let Some(scale) = self.binding(axis).and_then(|b| b.scale.clone()) else {
            return false;
        };
        let extents = self.extents_for(axis);
        scale.borrow_mut().auto_domain(&extents);
        debug!(?axis, domain = ?scale.borrow().domain(), "autoranged");
        true
    }

    fn base_extents(&self, axis: Axis) -> Vec<Extent> {
        let Some(binding) = self.binding(axis) else {
            return vec![None; self.datasets.len()];
        };
        let filter = if self.autorange_mode.targets(axis) {
            self.binding(axis.other())
                .filter(|b| b.scale.is_some())
        } else {
            None
        };
        self.datasets
            .iter()
            .map(|(dataset, _)| {
                let rows = dataset.data();
                extent_of(
                    rows.iter()
                        .enumerate()
                        .filter(|(i, row)| {
                            filter.map_or(true, |other| other_axis_in_view(other, row, *i, dataset))
                        })
                        .filter_map(|(i, row)| binding.value(row, i, dataset).as_f64()),
                )
            })
            .collect()
    }

    fn scaled_projector(binding: &AccessorScaleBinding<R>) -> CoordProjector<R> {
        let binding = binding.clone();
        Rc::new(move |row: &R, i: usize, dataset: &Dataset<R>| binding.scaled(row, i, dataset))
    }

    /// Every point starts on the reset baseline of the y domain.
    fn reset_y_projector(y: &AccessorScaleBinding<R>) -> CoordProjector<R> {
        let pixel = match &y.scale {
            Some(scale) => {
                let scale = scale.borrow();
                match scale.domain() {
                    Some(domain) => scale.map(reset_baseline(domain)),
                    None => scale.range().0,
                }
            }
            None => 0.0,
        };
        Rc::new(move |_: &R, _: usize, _: &Dataset<R>| Some(pixel))
    }

    /// Path projector for the whole line.
    ///
    /// Definedness always follows the real bindings, so the reset path breaks
    /// exactly where the final path does.
    fn construct_line_projector(
        &self,
        x_projector: CoordProjector<R>,
        y_projector: CoordProjector<R>,
    ) -> Option<Projector<R>> {
        let x = self.x.clone()?;
        let y = self.y.clone()?;
        let interpolator = self.interpolator.clone();
        let tension = self.tension;
        let projector: Projector<R> = Rc::new(move |rows: &[R], _: usize, dataset: &Dataset<R>| {
            let points = rows.iter().enumerate().map(|(i, row)| {
                let px = x.scaled(row, i, dataset)?;
                let py = y.scaled(row, i, dataset)?;
                if px.is_nan() || py.is_nan() {
                    return None;
                }
                Some(DVec2::new(x_projector(row, i, dataset)?, y_projector(row, i, dataset)?))
            });
            let path = LineGenerator::new(&interpolator, tension).generate(points);
            (!path.is_empty()).then_some(AttrValue::Path(path))
        });
        Some(projector)
    }

    /// Whole-line attributes, each evaluated against the first row.
    fn generate_attr_to_projector(&self) -> AttrToProjector<R> {
        let mut projectors: AttrToProjector<R> = BTreeMap::new();
        for (name, source) in &self.attrs {
            let source = source.clone();
            let projector: Projector<R> = Rc::new(move |rows: &[R], index: usize, dataset: &Dataset<R>| {
                rows.first().map(|row| source.evaluate(row, index, dataset))
            });
            projectors.insert(name.clone(), projector);
        }
        if let (Some(x), Some(y)) = (&self.x, &self.y) {
            if let Some(path) =
                self.construct_line_projector(Self::scaled_projector(x), Self::scaled_projector(y))
            {
                projectors.insert(PATH_ATTR.to_string(), path);
            }
        }
        projectors
    }
}

fn other_axis_in_view<R>(
    other: &AccessorScaleBinding<R>,
    row: &R,
    index: usize,
    dataset: &Dataset<R>,
) -> bool {
    let Some(scale) = &other.scale else {
        return true;
    };
    let range = scale.borrow().range();
    other
        .scaled(row, index, dataset)
        .is_some_and(|pixel| in_range(pixel, range))
}

impl<R: 'static> PlotRenderer for LinePlot<R> {
    type Row = R;

    fn generate_draw_steps(&self) -> Vec<DrawStep<R>> {
        let mut steps = Vec::with_capacity(2);
        if self.animate_on_next_render() {
            let mut attr_to_projector = self.generate_attr_to_projector();
            if let (Some(x), Some(y)) = (&self.x, &self.y) {
                if let Some(path) = self.construct_line_projector(
                    Self::scaled_projector(x),
                    Self::reset_y_projector(y),
                ) {
                    attr_to_projector.insert(PATH_ATTR.to_string(), path);
                }
            }
            steps.push(DrawStep {
                attr_to_projector,
                animator: self.animator(AnimatorKey::Reset),
            });
        }
        steps.push(DrawStep {
            attr_to_projector: self.generate_attr_to_projector(),
            animator: self.animator(AnimatorKey::Main),
        });
        steps
    }

    fn extents_for(&self, axis: Axis) -> Vec<Extent> {
        let extents = self.base_extents(axis);
        if !self.autorange_smooth || !self.autorange_mode.targets(axis) {
            return extents;
        }
        let included = self.edge_intersections().included_values(axis);
        let widened = widen_extents(&extents, &included);
        if widened != extents {
            debug!(?axis, ?extents, ?widened, "widened extents to edge crossings");
        }
        widened
    }

    fn entities(&self) -> Vec<PlotEntity> {
        self.datasets
            .iter()
            .enumerate()
            .flat_map(|(dataset_index, (dataset, _))| {
                self.projected_points(dataset)
                    .into_iter()
                    .enumerate()
                    .filter_map(move |(index, point)| {
                        point.map(|position| PlotEntity {
                            dataset_index,
                            index,
                            position,
                        })
                    })
            })
            .collect()
    }

    fn entity_visible_on_plot(&self, entity: &PlotEntity) -> bool {
        match self.transform() {
            Some(transform) => transform.contains_screen(entity.position),
            None => true,
        }
    }
}

impl<R: 'static> Component for LinePlot<R> {
    fn render(&mut self, surface: &Surface, executor: &mut dyn DrawExecutor) {
        self.render_to(surface, executor);
    }

    fn detached(&mut self) {
        self.mark_for_render();
    }

    fn needs_render(&self) -> bool {
        self.flags.needs_render.get()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<R: 'static> Default for LinePlot<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Drop for LinePlot<R> {
    fn drop(&mut self) {
        for (dataset, listener) in &self.datasets {
            dataset.off_update(*listener);
        }
    }
}

impl<R> std::fmt::Debug for LinePlot<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinePlot")
            .field("datasets", &self.datasets.len())
            .field("interpolator", &self.interpolator)
            .field("tension", &self.tension)
            .field("autorange_mode", &self.autorange_mode)
            .field("autorange_smooth", &self.autorange_smooth)
            .field("animated", &self.animated)
            .finish_non_exhaustive()
    }
}
