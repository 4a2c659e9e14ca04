//! Scales taking data values to pixel space.

use crate::data_types::{Extent, Value};
use d3rs::scale::{LinearScale, LogScale, Scale as D3Scale};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::warn;

/// Scales are shared between plots, so mutations (domain, snapping) are seen by all users.
pub type SharedScale = Rc<RefCell<ChartScale>>;

/// A d3 continuous scale plus the snapping flag used by automatic domains.
#[derive(Clone, Debug, PartialEq)]
pub struct Continuous<S> {
    scale: S,
    snaps_domain: bool,
}

impl<S> Continuous<S> {
    fn new(scale: S) -> Self {
        Self {
            scale,
            snaps_domain: true,
        }
    }
}

/// Ordinal scale placing each category at the centre of an equal band.
#[derive(Clone, Debug, PartialEq)]
pub struct CategoryScale {
    domain: Vec<String>,
    range: (f64, f64),
}

#[derive(Clone, Debug, PartialEq)]
pub enum ChartScale {
    Linear(Continuous<LinearScale>),
    Log(Continuous<LogScale>),
    Category(CategoryScale),
}

impl ChartScale {
    pub fn new_linear(domain: (f64, f64), range: (f64, f64)) -> Self {
        let (min, max) = pad_degenerate(domain.0, domain.1);
        let scale = LinearScale::new()
            .domain(min, max)
            .range(range.0, range.1);
        Self::Linear(Continuous::new(scale))
    }

    /// Log scale. The domain must be positive and ascending; otherwise `[1, 10]` is used.
    pub fn new_log(domain: (f64, f64), range: (f64, f64)) -> Self {
        let scale = LogScale::new().range(range.0, range.1);
        let scale = if valid_log_domain(domain.0, domain.1) {
            scale.domain(domain.0, domain.1)
        } else {
            warn!(?domain, "invalid log domain, using [1, 10]");
            scale
        };
        Self::Log(Continuous::new(scale))
    }

    pub fn new_category<S: Into<String>>(
        domain: impl IntoIterator<Item = S>,
        range: (f64, f64),
    ) -> Self {
        Self::Category(CategoryScale {
            domain: domain.into_iter().map(Into::into).collect(),
            range,
        })
    }

    pub fn shared(self) -> SharedScale {
        Rc::new(RefCell::new(self))
    }

    /// Quantitative scales support `invert` and domain snapping.
    pub fn is_continuous(&self) -> bool {
        !matches!(self, Self::Category(_))
    }

    /// Maps a datum to pixels. `None` when the datum has the wrong kind for this scale.
    pub fn scale(&self, value: &Value) -> Option<f64> {
        match (self, value) {
            (Self::Category(c), Value::Category(name)) => {
                let idx = c.domain.iter().position(|d| d == name)?;
                let step = (c.range.1 - c.range.0) / c.domain.len() as f64;
                Some(c.range.0 + step * (idx as f64 + 0.5))
            }
            (Self::Category(_), Value::Number(_)) => None,
            (_, Value::Number(v)) => Some(self.map(*v)),
            (_, Value::Category(_)) => None,
        }
    }

    /// Numeric mapping for continuous scales. NaN for categories and non-positive log input.
    pub fn map(&self, value: f64) -> f64 {
        match self {
            Self::Linear(s) => s.scale.scale(value),
            Self::Log(s) if value > 0.0 => s.scale.scale(value),
            Self::Log(_) | Self::Category(_) => f64::NAN,
        }
    }

    /// Pixel back to domain units. Only continuous scales with a non-empty range invert.
    pub fn invert(&self, pixel: f64) -> Option<f64> {
        let (r0, r1) = self.range();
        if r0 == r1 {
            return None;
        }
        match self {
            Self::Linear(s) => s.scale.invert(pixel),
            Self::Log(s) => s.scale.invert(pixel),
            Self::Category(_) => None,
        }
    }

    pub fn range(&self) -> (f64, f64) {
        match self {
            Self::Linear(s) => D3Scale::range(&s.scale),
            Self::Log(s) => D3Scale::range(&s.scale),
            Self::Category(c) => c.range,
        }
    }

    /// Numeric domain endpoints, in the order they were set.
    pub fn domain(&self) -> Option<(f64, f64)> {
        match self {
            Self::Linear(s) => Some(D3Scale::domain(&s.scale)),
            Self::Log(s) => Some(D3Scale::domain(&s.scale)),
            Self::Category(_) => None,
        }
    }

    pub fn categories(&self) -> Option<&[String]> {
        match self {
            Self::Category(c) => Some(&c.domain),
            _ => None,
        }
    }

    /// Round tick values inside the domain. Empty for category scales.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        match self {
            Self::Linear(s) => s.scale.ticks(count),
            Self::Log(s) => s.scale.ticks(count),
            Self::Category(_) => Vec::new(),
        }
    }

    /// A log scale ignores domains that are not positive and ascending.
    pub fn update_domain(&mut self, min: f64, max: f64) {
        match self {
            Self::Linear(s) => {
                let (min, max) = pad_degenerate(min, max);
                s.scale = s.scale.domain(min, max);
            }
            Self::Log(s) if valid_log_domain(min, max) => s.scale = s.scale.domain(min, max),
            Self::Log(_) => warn!(min, max, "ignoring invalid log domain"),
            Self::Category(_) => {}
        }
    }

    /// Whether automatic domains are rounded outward to nice values.
    pub fn snaps_domain(&self) -> bool {
        match self {
            Self::Linear(s) => s.snaps_domain,
            Self::Log(s) => s.snaps_domain,
            Self::Category(_) => false,
        }
    }

    /// No-op on category scales.
    pub fn set_snaps_domain(&mut self, snaps: bool) {
        match self {
            Self::Linear(s) => s.snaps_domain = snaps,
            Self::Log(s) => s.snaps_domain = snaps,
            Self::Category(_) => {}
        }
    }

    /// Fits the domain to the union of `extents`, keeping the current domain when all are empty.
    pub fn auto_domain(&mut self, extents: &[Extent]) {
        let union = extents.iter().flatten().fold(None, |acc: Extent, &(lo, hi)| match acc {
            None => Some((lo, hi)),
            Some((a, b)) => Some((a.min(lo), b.max(hi))),
        });
        let Some((min, max)) = union else {
            return;
        };
        match self {
            Self::Linear(s) if s.snaps_domain => {
                let (min, max) = pad_degenerate(min, max);
                s.scale = s.scale.domain(min, max).nice(None);
            }
            _ => self.update_domain(min, max),
        }
    }
}

fn pad_degenerate(min: f64, max: f64) -> (f64, f64) {
    if (max - min).abs() < f64::EPSILON {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    }
}

fn valid_log_domain(min: f64, max: f64) -> bool {
    min > 0.0 && min < max
}
