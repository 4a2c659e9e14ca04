// Plot types module

pub mod line;

pub use line::LinePlot;

use crate::data_types::{Axis, Extent};
use crate::rendering::DrawStep;
use glam::DVec2;

/// A drawn data point, addressed by dataset and row.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlotEntity {
    pub dataset_index: usize,
    pub index: usize,
    /// Pixel position.
    pub position: DVec2,
}

/// Trait for plot types rendered from datasets
pub trait PlotRenderer {
    type Row;

    /// Ordered draw steps for the next render.
    fn generate_draw_steps(&self) -> Vec<DrawStep<Self::Row>>;

    /// Per-dataset data extents along `axis`, as fed to the scale's auto domain.
    fn extents_for(&self, axis: Axis) -> Vec<Extent>;

    fn entities(&self) -> Vec<PlotEntity>;

    fn entity_visible_on_plot(&self, entity: &PlotEntity) -> bool;

    /// Nearest visible entity by horizontal distance, then vertical distance.
    fn entity_nearest(&self, query: DVec2) -> Option<PlotEntity> {
        nearest_entity(
            self.entities()
                .into_iter()
                .filter(|e| self.entity_visible_on_plot(e)),
            query,
        )
    }
}

/// Picks the entity with the smallest x distance to `query`, breaking ties by y distance.
/// The first candidate wins a full tie.
pub fn nearest_entity(
    entities: impl IntoIterator<Item = PlotEntity>,
    query: DVec2,
) -> Option<PlotEntity> {
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut closest = None;
    for entity in entities {
        let x_dist = (query.x - entity.position.x).abs();
        let y_dist = (query.y - entity.position.y).abs();
        if x_dist < min_x || (x_dist == min_x && y_dist < min_y) {
            closest = Some(entity);
            min_x = x_dist;
            min_y = y_dist;
        }
    }
    closest
}
