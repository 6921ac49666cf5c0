use std::fmt;

use ndarray::Array2;

/// A 2-D grid of intensity samples, shape = (rows, columns).
///
/// Rows follow the slit (spatial) axis, columns the wavelength axis. Values
/// are unbounded: dark subtraction can leave them negative.
pub type IntensityArray = Array2<f64>;

/// Per-row horizontal displacement (in columns) relative to a reference row.
pub type ShiftProfile = Vec<f64>;

/// Degree-1 fit of a shift profile against row index.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TrendModel {
    pub slope: f64,
    pub intercept: f64,
}

impl TrendModel {
    pub fn constant(value: f64) -> Self {
        Self {
            slope: 0.0,
            intercept: value,
        }
    }

    /// Shift predicted for `row`.
    pub fn predict(&self, row: usize) -> f64 {
        self.intercept + self.slope * row as f64
    }
}

/// Scalar value stored in a calibration frame header.
#[derive(Clone, Debug, PartialEq)]
pub enum HeaderValue {
    Str(String),
    Int(i64),
    Float(f64),
}

impl HeaderValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{s}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for HeaderValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for HeaderValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for HeaderValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

/// Ordered keyword/value metadata attached to a calibration frame when it
/// is persisted. Keywords are stored upper-cased.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameHeader {
    entries: Vec<(String, HeaderValue)>,
}

impl FrameHeader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a keyword, keeping the original position on replace.
    pub fn insert(&mut self, key: &str, value: impl Into<HeaderValue>) {
        let key = key.to_ascii_uppercase();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&HeaderValue> {
        let key = key.to_ascii_uppercase();
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
