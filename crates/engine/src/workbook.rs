use gridbook_core::{GridError, SheetSelector};
use serde::{Deserialize, Serialize};

use crate::sheet::Sheet;

/// The in-memory grid: sheets in the order the source file lists them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sheets(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get(index)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Add an empty sheet. Returns its index, or None if the name is taken.
    pub fn add_sheet_named(&mut self, name: &str) -> Option<usize> {
        if self.sheet_by_name(name).is_some() {
            return None;
        }
        self.sheets.push(Sheet::new(name));
        Some(self.sheets.len() - 1)
    }

    pub fn sheet_by_name(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_by_name_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }

    /// Resolve a selector into the sheets it visits, in visiting order.
    pub fn select(&self, selector: &SheetSelector) -> Result<Vec<&Sheet>, GridError> {
        match selector {
            SheetSelector::Named(name) => self
                .sheet_by_name(name)
                .map(|s| vec![s])
                .ok_or_else(|| GridError::SheetNotFound(name.clone())),
            SheetSelector::AllInEnumerationOrder => Ok(self.sheets.iter().collect()),
        }
    }

    /// Mutable access to one named sheet.
    pub fn require_sheet_mut(&mut self, name: &str) -> Result<&mut Sheet, GridError> {
        self.sheet_by_name_mut(name)
            .ok_or_else(|| GridError::SheetNotFound(name.to_string()))
    }
}
