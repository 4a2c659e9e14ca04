/// Default series colours, in assignment order.
pub const DEFAULT_PALETTE: [&str; 10] = [
    "#5279c7", "#fd373e", "#63c261", "#fad419", "#2c2b6f",
    "#ff7939", "#db2e65", "#99ce50", "#962565", "#06cccc",
];

#[derive(Clone, Debug, PartialEq)]
pub struct ChartTheme {
    pub palette: Vec<String>,
    pub line_width: f64,
}

impl ChartTheme {
    /// Colour for the n-th series, cycling through the palette.
    pub fn series_color(&self, index: usize) -> &str {
        if self.palette.is_empty() {
            return DEFAULT_PALETTE[0];
        }
        &self.palette[index % self.palette.len()]
    }
}

impl Default for ChartTheme {
    fn default() -> Self {
        Self {
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
            line_width: 2.0,
        }
    }
}
