use serde::{Deserialize, Serialize};

/// A single datum produced by an accessor, before it goes through a scale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Category(String),
}

impl Value {
    /// Numeric view of the datum. Categories have none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Category(_) => None,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Number(v as f64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Category(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Category(v)
    }
}
