//! Rectangular cell ranges: partially specified on input, fully bound after
//! resolution against a sheet's extents.
//!
//! All coordinates are 1-based and both ends are inclusive.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::coord::Coord;
use crate::error::GridError;

/// Populated extents of a sheet. `(0, 0)` for a sheet with no cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetExtents {
    pub max_row: usize,
    pub max_col: usize,
}

impl SheetExtents {
    pub fn new(max_row: usize, max_col: usize) -> Self {
        Self { max_row, max_col }
    }
}

/// A range as a caller supplies it: any bound may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_row: Option<Coord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_col: Option<Coord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_row: Option<Coord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_col: Option<Coord>,
}

impl RangeSpec {
    /// The whole populated area of whatever sheet it is resolved against.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn from_bounds(
        start_row: Option<usize>,
        start_col: Option<usize>,
        end_row: Option<usize>,
        end_col: Option<usize>,
    ) -> Self {
        Self {
            start_row: start_row.map(Coord::from),
            start_col: start_col.map(Coord::from),
            end_row: end_row.map(Coord::from),
            end_col: end_col.map(Coord::from),
        }
    }

    /// Validate every supplied bound as a non-negative integer.
    ///
    /// This is the only place a range can fail; once bounds are numeric,
    /// resolution always succeeds.
    pub fn bounds(&self) -> Result<RangeBounds, GridError> {
        fn check(name: &str, coord: &Option<Coord>) -> Result<Option<usize>, GridError> {
            match coord {
                None => Ok(None),
                Some(c) => c.parse().map(Some).ok_or_else(|| {
                    GridError::InvalidRange(format!("{name} must be a non-negative integer, got {c}"))
                }),
            }
        }

        Ok(RangeBounds {
            start_row: check("start_row", &self.start_row)?,
            start_col: check("start_col", &self.start_col)?,
            end_row: check("end_row", &self.end_row)?,
            end_col: check("end_col", &self.end_col)?,
        })
    }
}

/// Numeric but still partial bounds. Zero means "unspecified".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeBounds {
    pub start_row: Option<usize>,
    pub start_col: Option<usize>,
    pub end_row: Option<usize>,
    pub end_col: Option<usize>,
}

impl RangeBounds {
    /// Bind missing bounds: starts default to 1, ends to the sheet extents.
    ///
    /// No clamping happens. An end past the extents is kept, so callers read
    /// empty cells out there.
    pub fn resolve(&self, extents: SheetExtents) -> ResolvedRange {
        let start = |b: Option<usize>| b.filter(|&n| n > 0).unwrap_or(1);
        let end = |b: Option<usize>, max: usize| b.filter(|&n| n > 0).unwrap_or(max);

        ResolvedRange {
            start_row: start(self.start_row),
            start_col: start(self.start_col),
            end_row: end(self.end_row, extents.max_row),
            end_col: end(self.end_col, extents.max_col),
        }
    }
}

/// A fully bound range. Empty when an end lies before its start, which is
/// what an empty sheet resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRange {
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
}

impl ResolvedRange {
    pub fn rows(&self) -> RangeInclusive<usize> {
        self.start_row..=self.end_row
    }

    pub fn cols(&self) -> RangeInclusive<usize> {
        self.start_col..=self.end_col
    }

    pub fn is_empty(&self) -> bool {
        self.end_row < self.start_row || self.end_col < self.start_col
    }

    pub fn row_count(&self) -> usize {
        (self.end_row + 1).saturating_sub(self.start_row)
    }

    pub fn col_count(&self) -> usize {
        (self.end_col + 1).saturating_sub(self.start_col)
    }
}
