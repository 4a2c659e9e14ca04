//! chart_core: component composition and line plot geometry for declarative charts

pub mod autorange;
pub mod component;
pub mod container;
pub mod data_types;
pub mod interpolation;
pub mod path;
pub mod plot_types;
pub mod rendering;
pub mod scales;
pub mod theme;
pub mod transform;

pub use component::{AttachState, Component, ComponentId, Surface};
pub use container::ComponentTree;
pub use data_types::{AccessorScaleBinding, AutorangeMode, Axis, Dataset, LinePlotConfig, Value};
pub use interpolation::{CurveKind, Interpolator};
pub use plot_types::{LinePlot, PlotEntity, PlotRenderer};
pub use rendering::{DrawCommand, DrawExecutor, DrawRecorder, DrawStep};
pub use scales::{ChartScale, SharedScale};
