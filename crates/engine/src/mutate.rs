//! Batched cell writes against one sheet.
//!
//! A batch goes through three phases: every entry is parsed and validated,
//! the requested mode is resolved once into a [`ResolvedMode`], and only then
//! are cells written. A batch that fails validation leaves the sheet as it
//! was.

use std::fmt;
use std::str::FromStr;

use gridbook_core::{Coord, GridError};
use serde::{Deserialize, Serialize};

use crate::cell::CellValue;
use crate::sheet::Sheet;
use crate::style::{apply_style, StyleSpec};
use crate::workbook::Workbook;

/// Requested write mode, as sent by the host (`w`, `a`, `i`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteMode {
    #[serde(rename = "w")]
    Overwrite,
    #[serde(rename = "a")]
    Append,
    #[serde(rename = "i")]
    Insert,
}

impl WriteMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteMode::Overwrite => "w",
            WriteMode::Append => "a",
            WriteMode::Insert => "i",
        }
    }
}

impl FromStr for WriteMode {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "w" => Ok(WriteMode::Overwrite),
            "a" => Ok(WriteMode::Append),
            "i" => Ok(WriteMode::Insert),
            other => Err(GridError::InvalidMode(other.to_string())),
        }
    }
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Largest integer magnitude an f64 holds without rounding (2^53).
const MAX_EXACT_INT: u64 = 1 << 53;

/// A cell value as it arrives from the host. Integers too wide for a
/// spreadsheet number are stored as text so their digits survive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UpdateValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
}

impl From<&UpdateValue> for CellValue {
    fn from(value: &UpdateValue) -> Self {
        match value {
            UpdateValue::Bool(b) => CellValue::Bool(*b),
            UpdateValue::Int(n) if n.unsigned_abs() <= MAX_EXACT_INT => CellValue::Number(*n as f64),
            UpdateValue::Int(n) => CellValue::Text(n.to_string()),
            UpdateValue::UInt(n) if *n <= MAX_EXACT_INT => CellValue::Number(*n as f64),
            UpdateValue::UInt(n) => CellValue::Text(n.to_string()),
            UpdateValue::Float(f) => CellValue::Number(*f),
            UpdateValue::Text(s) => CellValue::Text(s.clone()),
        }
    }
}

impl From<&str> for UpdateValue {
    fn from(s: &str) -> Self {
        UpdateValue::Text(s.to_string())
    }
}

/// One entry of an update batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateSpec {
    pub cell_row: Coord,
    pub cell_col: Coord,
    pub cell_value: UpdateValue,
}

impl UpdateSpec {
    pub fn new(row: usize, col: usize, value: impl Into<UpdateValue>) -> Self {
        Self {
            cell_row: Coord::from(row),
            cell_col: Coord::from(col),
            cell_value: value.into(),
        }
    }
}

/// The mode actually used for a batch, with its target row bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ResolvedMode {
    /// Every entry writes at its own row.
    Overwrite,
    /// Every entry writes into `row`, one past the last populated row.
    Append { row: usize },
    /// A blank row is opened at `row` and every entry writes into it.
    Insert { row: usize },
}

impl ResolvedMode {
    /// The mode the batch was effectively applied under.
    pub fn write_mode(&self) -> WriteMode {
        match self {
            ResolvedMode::Overwrite => WriteMode::Overwrite,
            ResolvedMode::Append { .. } => WriteMode::Append,
            ResolvedMode::Insert { .. } => WriteMode::Insert,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MutationReport {
    pub mode: ResolvedMode,
    /// `(row, col)` of each write, in batch order.
    pub touched: Vec<(usize, usize)>,
    pub inserted_row: Option<usize>,
}

/// An entry with its coordinates parsed. Rows may still be 0 here.
#[derive(Debug, Clone, Copy)]
struct ParsedEntry {
    row: usize,
    col: usize,
}

fn parse_entries(batch: &[UpdateSpec]) -> Result<Vec<ParsedEntry>, GridError> {
    if batch.is_empty() {
        return Err(GridError::InvalidBatch("update batch is empty".into()));
    }

    batch
        .iter()
        .enumerate()
        .map(|(i, spec)| {
            let row = spec.cell_row.parse().ok_or_else(|| {
                GridError::InvalidBatch(format!(
                    "entry {i}: cell_row must be a non-negative integer, got {}",
                    spec.cell_row
                ))
            })?;
            let col = spec
                .cell_col
                .parse()
                .filter(|&c| c >= 1)
                .ok_or_else(|| {
                    GridError::InvalidBatch(format!(
                        "entry {i}: cell_col must be a positive integer, got {}",
                        spec.cell_col
                    ))
                })?;
            Ok(ParsedEntry { row, col })
        })
        .collect()
}

/// Decide the effective mode for a batch. Runs once, before any write.
fn resolve_mode(
    sheet: &Sheet,
    entries: &[ParsedEntry],
    mode: WriteMode,
) -> Result<ResolvedMode, GridError> {
    let first_row = entries[0].row;
    let append_row = sheet.max_row() + 1;

    match mode {
        WriteMode::Overwrite if first_row == 0 => {
            log::info!(
                "overwrite batch on '{}' starts at row 0, appending at row {append_row}",
                sheet.name
            );
            Ok(ResolvedMode::Append { row: append_row })
        }
        WriteMode::Overwrite => {
            if let Some(i) = entries.iter().position(|e| e.row == 0) {
                return Err(GridError::InvalidBatch(format!(
                    "entry {i}: cell_row must be a positive integer in overwrite mode"
                )));
            }
            Ok(ResolvedMode::Overwrite)
        }
        WriteMode::Append => Ok(ResolvedMode::Append { row: append_row }),
        WriteMode::Insert => {
            if first_row == 0 {
                return Err(GridError::InvalidBatch(
                    "insert mode needs a positive cell_row".into(),
                ));
            }
            if let Some(i) = entries.iter().position(|e| e.row != first_row) {
                return Err(GridError::InvalidBatch(format!(
                    "entry {i}: insert batches must share one row, expected {first_row}, got {}",
                    entries[i].row
                )));
            }
            Ok(ResolvedMode::Insert { row: first_row })
        }
    }
}

/// Apply an update batch to one sheet.
pub fn mutate(
    sheet: &mut Sheet,
    batch: &[UpdateSpec],
    mode: WriteMode,
) -> Result<MutationReport, GridError> {
    let entries = parse_entries(batch)?;
    let resolved = resolve_mode(sheet, &entries, mode)?;

    let inserted_row = match resolved {
        ResolvedMode::Insert { row } => {
            sheet.insert_rows(row, 1);
            Some(row)
        }
        _ => None,
    };

    let touched: Vec<(usize, usize)> = entries
        .iter()
        .zip(batch)
        .map(|(entry, spec)| {
            let row = match resolved {
                ResolvedMode::Overwrite => entry.row,
                ResolvedMode::Append { row } | ResolvedMode::Insert { row } => row,
            };
            sheet.set_value(row, entry.col, CellValue::from(&spec.cell_value));
            (row, entry.col)
        })
        .collect();

    log::debug!(
        "mutated '{}': {:?}, {} cell(s)",
        sheet.name,
        resolved,
        touched.len()
    );

    Ok(MutationReport { mode: resolved, touched, inserted_row })
}

/// One mutating transaction: value writes on a named sheet, then the
/// optional style pass over every touched cell.
pub fn apply(
    workbook: &mut Workbook,
    sheet_name: &str,
    batch: &[UpdateSpec],
    mode: WriteMode,
    style: Option<&StyleSpec>,
) -> Result<MutationReport, GridError> {
    let sheet = workbook.require_sheet_mut(sheet_name)?;
    let report = mutate(sheet, batch, mode)?;
    apply_style(sheet, &report.touched, style);
    Ok(report)
}
