use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Axis management types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub fn other(self) -> Self {
        match self {
            Self::X => Self::Y,
            Self::Y => Self::X,
        }
    }
}

/// Which axis (if any) gets its domain fitted to the visible data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutorangeMode {
    #[default]
    None,
    X,
    Y,
}

impl AutorangeMode {
    pub fn axis(self) -> Option<Axis> {
        match self {
            Self::None => None,
            Self::X => Some(Axis::X),
            Self::Y => Some(Axis::Y),
        }
    }

    pub fn targets(self, axis: Axis) -> bool {
        self.axis() == Some(axis)
    }
}

impl FromStr for AutorangeMode {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(Self::None),
            "x" => Ok(Self::X),
            "y" => Ok(Self::Y),
            other => Err(eyre!("unknown autorange mode `{}`", other)),
        }
    }
}

/// Data-space `(min, max)` of one dataset along one axis.
/// `None` when the dataset contributes no value (empty, or everything filtered out).
pub type Extent = Option<(f64, f64)>;

/// Computes the extent of a set of values, ignoring NaN.
pub fn extent_of(values: impl IntoIterator<Item = f64>) -> Extent {
    values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_of_skips_nan() {
        assert_eq!(extent_of([3.0, f64::NAN, -1.0, 2.0]), Some((-1.0, 3.0)));
        assert_eq!(extent_of(Vec::<f64>::new()), None);
        assert_eq!(extent_of([f64::NAN]), None);
    }

    #[test]
    fn test_autorange_mode_parse() {
        assert_eq!("y".parse::<AutorangeMode>().unwrap(), AutorangeMode::Y);
        assert!("z".parse::<AutorangeMode>().is_err());
        assert!(AutorangeMode::X.targets(Axis::X));
        assert!(!AutorangeMode::None.targets(Axis::Y));
    }
}
