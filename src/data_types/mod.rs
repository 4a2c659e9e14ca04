pub mod axis;
pub mod binding;
pub mod data;
pub mod dataset;
pub mod plot_configs;

// Re-export everything for compatibility
pub use axis::*;
pub use binding::*;
pub use data::*;
pub use dataset::*;
pub use plot_configs::*;
