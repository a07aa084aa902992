pub mod cell;
pub mod mutate;
pub mod reader;
pub mod search;
pub mod sheet;
pub mod style;
pub mod workbook;

#[cfg(test)]
pub mod harness;

pub use gridbook_core::{error, GridError, RangeSpec, SheetSelector};
