use gridbook_core::SheetExtents;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::cell::{Cell, CellFormat, CellValue};

/// One named grid of cells.
///
/// Rows and columns are 1-based, matching what users see in A1 notation and
/// what automation hosts send. Only populated cells are stored; a cell that
/// holds nothing but a style still counts toward the extents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    cells: FxHashMap<(usize, usize), Cell>,
}

impl Sheet {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            cells: FxHashMap::default(),
        }
    }

    /// Current populated extents, `(0, 0)` when the sheet is empty.
    pub fn extents(&self) -> SheetExtents {
        let (max_row, max_col) = self
            .cells
            .keys()
            .fold((0, 0), |(mr, mc), &(r, c)| (mr.max(r), mc.max(c)));
        SheetExtents { max_row, max_col }
    }

    pub fn max_row(&self) -> usize {
        self.extents().max_row
    }

    pub fn max_col(&self) -> usize {
        self.extents().max_col
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    pub fn get_value(&self, row: usize, col: usize) -> CellValue {
        self.cells
            .get(&(row, col))
            .map(|c| c.value.clone())
            .unwrap_or_default()
    }

    /// Textual value of a cell; "" for anything never written.
    pub fn get_text(&self, row: usize, col: usize) -> String {
        self.cells
            .get(&(row, col))
            .map(|c| c.value.to_text())
            .unwrap_or_default()
    }

    pub fn set_value(&mut self, row: usize, col: usize, value: CellValue) {
        debug_assert!(row >= 1 && col >= 1, "cell coordinates are 1-based");
        let cell = self.cells.entry((row, col)).or_insert_with(Cell::new);
        cell.value = value;
    }

    pub fn get_format(&self, row: usize, col: usize) -> CellFormat {
        self.cells
            .get(&(row, col))
            .map(|c| c.format.clone())
            .unwrap_or_default()
    }

    pub fn set_format(&mut self, row: usize, col: usize, format: CellFormat) {
        debug_assert!(row >= 1 && col >= 1, "cell coordinates are 1-based");
        let cell = self.cells.entry((row, col)).or_insert_with(Cell::new);
        cell.format = format;
    }

    pub fn cells_iter(&self) -> impl Iterator<Item = (&(usize, usize), &Cell)> {
        self.cells.iter()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Insert rows at the specified position, shifting existing rows down.
    /// Values and styles move together.
    pub fn insert_rows(&mut self, at_row: usize, count: usize) {
        if count == 0 {
            return;
        }

        // Collect all cells that need to be shifted
        let cells_to_shift: Vec<_> = self
            .cells
            .iter()
            .filter(|((r, _), _)| *r >= at_row)
            .map(|((r, c), cell)| ((*r, *c), cell.clone()))
            .collect();

        // Remove old positions
        for ((r, c), _) in &cells_to_shift {
            self.cells.remove(&(*r, *c));
        }

        // Insert at new positions (shifted down)
        for ((r, c), cell) in cells_to_shift {
            self.cells.insert((r + count, c), cell);
        }
    }
}
