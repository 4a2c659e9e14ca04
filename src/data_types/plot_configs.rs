use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};

use super::axis::AutorangeMode;
use crate::interpolation::CurveKind;
use crate::theme::ChartTheme;

/// Serializable settings for a line plot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LinePlotConfig {
    pub interpolation: CurveKind,
    /// Used by the cardinal and bundle curves.
    pub tension: f64,
    pub autorange_mode: AutorangeMode,
    pub autorange_smooth: bool,
    pub animated: bool,
    pub stroke: String,
    pub stroke_width: f64,
}

impl Default for LinePlotConfig {
    fn default() -> Self {
        let theme = ChartTheme::default();
        Self {
            interpolation: CurveKind::Linear,
            tension: 0.7,
            autorange_mode: AutorangeMode::None,
            autorange_smooth: false,
            animated: false,
            stroke: theme.series_color(0).to_string(),
            stroke_width: theme.line_width,
        }
    }
}

impl LinePlotConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).wrap_err("invalid line plot config")
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).wrap_err("failed to serialize line plot config")
    }
}
