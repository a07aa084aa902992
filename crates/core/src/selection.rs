use serde::{Deserialize, Serialize};

/// Which sheets an operation visits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetSelector {
    /// Exactly one sheet, by name.
    Named(String),
    /// Every sheet, in the workbook's own order.
    AllInEnumerationOrder,
}

impl SheetSelector {
    /// A missing or empty name selects every sheet.
    pub fn from_name(name: Option<&str>) -> Self {
        match name {
            Some(n) if !n.is_empty() => SheetSelector::Named(n.to_string()),
            _ => SheetSelector::AllInEnumerationOrder,
        }
    }
}

impl Default for SheetSelector {
    fn default() -> Self {
        SheetSelector::AllInEnumerationOrder
    }
}
