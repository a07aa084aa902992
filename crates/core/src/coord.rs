use std::fmt;

use serde::{Deserialize, Serialize};

/// A row or column number as supplied by a caller.
///
/// Automation hosts hand coordinates over as JSON numbers, as numeric strings
/// ("4"), or occasionally as integral floats (4.0). All three are accepted
/// here; anything else is rejected when the coordinate is parsed, before it
/// reaches range resolution or the mutator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coord {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Coord {
    /// Parse into a non-negative index. Zero is allowed (it is the
    /// "unspecified" sentinel for range ends and the append trigger for rows).
    pub fn parse(&self) -> Option<usize> {
        match self {
            Coord::Int(n) => usize::try_from(*n).ok(),
            Coord::Float(f) => {
                if f.is_finite() && f.fract() == 0.0 && *f >= 0.0 && *f <= u32::MAX as f64 {
                    Some(*f as usize)
                } else {
                    None
                }
            }
            Coord::Text(s) => s.trim().parse::<usize>().ok(),
        }
    }
}

impl From<usize> for Coord {
    fn from(n: usize) -> Self {
        Coord::Int(n as i64)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coord::Int(n) => write!(f, "{n}"),
            Coord::Float(n) => write!(f, "{n}"),
            Coord::Text(s) => write!(f, "{s:?}"),
        }
    }
}
