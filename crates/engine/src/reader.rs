//! Tabular projection: a sheet region becomes an ordered list of records,
//! one per row, keyed by header text or by `col_<n>`.

use gridbook_core::{GridError, RangeSpec, ResolvedRange, SheetSelector};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::sheet::Sheet;
use crate::workbook::Workbook;

/// Options that apply uniformly to every sheet in one read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadOptions {
    /// Key columns by the header row's text instead of `col_<n>`.
    pub index_by_name: bool,
    /// Row holding the column headers. Only used with `index_by_name`.
    pub header_row: usize,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self { index_by_name: true, header_row: 1 }
    }
}

/// One row projected to column key → text.
///
/// Keys keep column order. A repeated header keeps its first position and
/// takes the later column's value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: String, value: String) {
        self.fields.insert(key, Value::String(value));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str().unwrap_or_default()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k.into(), v.into());
        }
        record
    }
}

/// Records for one selected sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRecords {
    /// `sheet_index_<n>`, n being the position in the selection order.
    pub key: String,
    pub sheet_name: String,
    pub range: ResolvedRange,
    pub records: Vec<Record>,
}

/// Result of a read: sheets in selection order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadResult {
    pub sheets: Vec<SheetRecords>,
}

impl ReadResult {
    pub fn get(&self, key: &str) -> Option<&[Record]> {
        self.sheets
            .iter()
            .find(|s| s.key == key)
            .map(|s| s.records.as_slice())
    }

    pub fn record_count(&self) -> usize {
        self.sheets.iter().map(|s| s.records.len()).sum()
    }
}

impl Serialize for ReadResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sheets.len()))?;
        for sheet in &self.sheets {
            map.serialize_entry(&sheet.key, &sheet.records)?;
        }
        map.end()
    }
}

/// Project the selected sheets' regions into records.
///
/// The range is resolved separately against each sheet's own extents. The
/// header row is not skipped: start at row 2 to leave it out.
pub fn read(
    workbook: &Workbook,
    selector: &SheetSelector,
    range: &RangeSpec,
    options: &ReadOptions,
) -> Result<ReadResult, GridError> {
    let bounds = range.bounds()?;
    let sheets = workbook.select(selector)?;

    let mut result = ReadResult::default();
    for (index, sheet) in sheets.into_iter().enumerate() {
        let resolved = bounds.resolve(sheet.extents());
        log::debug!(
            "read '{}': rows {}..={} cols {}..={}",
            sheet.name, resolved.start_row, resolved.end_row, resolved.start_col, resolved.end_col
        );

        let keys = column_keys(sheet, &resolved, options);
        let records = resolved
            .rows()
            .map(|row| {
                resolved
                    .cols()
                    .zip(keys.iter())
                    .map(|(col, key)| (key.clone(), sheet.get_text(row, col)))
                    .collect::<Record>()
            })
            .collect();

        result.sheets.push(SheetRecords {
            key: format!("sheet_index_{index}"),
            sheet_name: sheet.name.clone(),
            range: resolved,
            records,
        });
    }

    Ok(result)
}

/// Key list for one sheet, built once and shared by every row.
fn column_keys(sheet: &Sheet, range: &ResolvedRange, options: &ReadOptions) -> Vec<String> {
    let header_row = options.header_row.max(1);
    range
        .cols()
        .map(|col| {
            if options.index_by_name {
                sheet.get_text(header_row, col)
            } else {
                format!("col_{col}")
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::{sample_book, sheet_from_rows};
    use crate::cell::CellValue;

    fn employee() -> SheetSelector {
        SheetSelector::Named("Employee".into())
    }

    #[test]
    fn test_keys_by_header_name() {
        let wb = Workbook::from_sheets(vec![sheet_from_rows(
            "S",
            &[&["name", "year"], &["Ann", "2001"]],
        )]);
        let result = read(&wb, &SheetSelector::AllInEnumerationOrder, &RangeSpec::all(), &ReadOptions::default()).unwrap();
        let records = result.get("sheet_index_0").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].keys().collect::<Vec<_>>(), vec!["name", "year"]);
        assert_eq!(records[1].get("year"), Some("2001"));
    }

    #[test]
    fn test_keys_by_column_index() {
        let wb = Workbook::from_sheets(vec![sheet_from_rows(
            "S",
            &[&["name", "year"], &["Ann", "2001"]],
        )]);
        let options = ReadOptions { index_by_name: false, ..Default::default() };
        let result = read(&wb, &SheetSelector::AllInEnumerationOrder, &RangeSpec::all(), &options).unwrap();
        let records = result.get("sheet_index_0").unwrap();
        assert_eq!(records[0].keys().collect::<Vec<_>>(), vec!["col_1", "col_2"]);
        assert_eq!(records[0].get("col_1"), Some("name"));
        assert_eq!(records[1].get("col_2"), Some("2001"));
    }

    #[test]
    fn test_header_row_is_not_skipped() {
        let wb = sample_book();
        let result = read(&wb, &employee(), &RangeSpec::all(), &ReadOptions::default()).unwrap();
        let records = result.get("sheet_index_0").unwrap();
        assert_eq!(records.len(), 5);
        assert_eq!(records[0].get("employee_name"), Some("employee_name"));
        assert_eq!(records[3].get("employee_name"), Some("Sandy Cole"));
    }

    #[test]
    fn test_start_row_two_skips_header() {
        let wb = sample_book();
        let range = RangeSpec::from_bounds(Some(2), None, None, None);
        let result = read(&wb, &employee(), &range, &ReadOptions::default()).unwrap();
        let records = result.get("sheet_index_0").unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].get("department"), Some("Accounting"));
        assert_eq!(records[0].get("year_joined"), Some("1999"));
    }

    #[test]
    fn test_single_cell_region_by_index() {
        let wb = sample_book();
        let range = RangeSpec::from_bounds(Some(4), Some(1), Some(4), Some(1));
        let options = ReadOptions { index_by_name: false, ..Default::default() };
        let result = read(&wb, &employee(), &range, &options).unwrap();
        let records = result.get("sheet_index_0").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0], [("col_1", "D333444")].into_iter().collect::<Record>());
    }

    #[test]
    fn test_region_keys_use_absolute_columns() {
        let wb = sample_book();
        let range = RangeSpec::from_bounds(Some(2), Some(3), Some(3), Some(3));
        let options = ReadOptions { index_by_name: false, ..Default::default() };
        let result = read(&wb, &employee(), &range, &options).unwrap();
        let records = result.get("sheet_index_0").unwrap();
        assert_eq!(records[0].keys().collect::<Vec<_>>(), vec!["col_3"]);
        assert_eq!(records[1].get("col_3"), Some("Engineering"));
    }

    #[test]
    fn test_all_sheets_resolve_independently() {
        let wb = sample_book();
        let result = read(&wb, &SheetSelector::AllInEnumerationOrder, &RangeSpec::all(), &ReadOptions::default()).unwrap();
        assert_eq!(result.sheets.len(), 2);
        assert_eq!(result.sheets[0].sheet_name, "Employee");
        assert_eq!(result.sheets[0].range.end_col, 4);
        assert_eq!(result.sheets[1].key, "sheet_index_1");
        assert_eq!(result.sheets[1].range.end_col, 2);
        let cities = result.get("sheet_index_1").unwrap();
        assert_eq!(cities[1].get("city_code"), Some("408"));
        assert_eq!(cities[1].len(), 2);
    }

    #[test]
    fn test_sheet_index_follows_selection_not_workbook() {
        let wb = sample_book();
        let result = read(&wb, &SheetSelector::Named("City".into()), &RangeSpec::all(), &ReadOptions::default()).unwrap();
        assert_eq!(result.sheets.len(), 1);
        assert_eq!(result.sheets[0].key, "sheet_index_0");
        assert_eq!(result.sheets[0].sheet_name, "City");
    }

    #[test]
    fn test_cells_beyond_extents_read_empty() {
        let wb = sample_book();
        let range = RangeSpec::from_bounds(Some(5), Some(2), Some(7), Some(2));
        let options = ReadOptions { index_by_name: false, ..Default::default() };
        let result = read(&wb, &SheetSelector::Named("City".into()), &range, &options).unwrap();
        let records = result.get("sheet_index_0").unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].get("col_2"), Some("916"));
        assert_eq!(records[2].get("col_2"), Some(""));
    }

    #[test]
    fn test_custom_header_row() {
        let wb = Workbook::from_sheets(vec![sheet_from_rows(
            "S",
            &[&["Report", ""], &["id", "total"], &["1", "9.5"]],
        )]);
        let options = ReadOptions { index_by_name: true, header_row: 2 };
        let range = RangeSpec::from_bounds(Some(3), None, None, None);
        let result = read(&wb, &SheetSelector::AllInEnumerationOrder, &range, &options).unwrap();
        let records = result.get("sheet_index_0").unwrap();
        assert_eq!(records[0].get("total"), Some("9.5"));
    }

    #[test]
    fn test_duplicate_headers_keep_last_value() {
        let wb = Workbook::from_sheets(vec![sheet_from_rows(
            "S",
            &[&["k", "k"], &["first", "second"]],
        )]);
        let result = read(&wb, &SheetSelector::AllInEnumerationOrder, &RangeSpec::all(), &ReadOptions::default()).unwrap();
        let records = result.get("sheet_index_0").unwrap();
        assert_eq!(records[1].len(), 1);
        assert_eq!(records[1].get("k"), Some("second"));
    }

    #[test]
    fn test_duplicate_header_keeps_first_position() {
        let wb = Workbook::from_sheets(vec![sheet_from_rows(
            "S",
            &[&["k", "m", "k"], &["first", "mid", "last"]],
        )]);
        let range = RangeSpec::from_bounds(Some(2), None, None, None);
        let result = read(&wb, &SheetSelector::AllInEnumerationOrder, &range, &ReadOptions::default()).unwrap();
        let record = &result.get("sheet_index_0").unwrap()[0];
        assert_eq!(record.iter().collect::<Vec<_>>(), vec![("k", "last"), ("m", "mid")]);
    }

    #[test]
    fn test_full_width_row() {
        let width = 16_384;
        let mut sheet = Sheet::new("Wide");
        for c in 1..=width {
            sheet.set_value(1, c, CellValue::Text(format!("h{c}")));
            sheet.set_value(2, c, CellValue::Text(format!("v{c}")));
        }
        let wb = Workbook::from_sheets(vec![sheet]);
        let range = RangeSpec::from_bounds(Some(2), None, None, None);
        let result = read(&wb, &SheetSelector::AllInEnumerationOrder, &range, &ReadOptions::default()).unwrap();
        let record = &result.get("sheet_index_0").unwrap()[0];
        assert_eq!(record.len(), width);
        assert_eq!(record.keys().next(), Some("h1"));
        assert_eq!(record.get("h16384"), Some("v16384"));
    }

    #[test]
    fn test_missing_sheet_is_an_error() {
        let wb = sample_book();
        let err = read(&wb, &SheetSelector::Named("Nope".into()), &RangeSpec::all(), &ReadOptions::default()).unwrap_err();
        assert!(matches!(err, GridError::SheetNotFound(_)));
    }

    #[test]
    fn test_serializes_as_ordered_map() {
        let wb = sample_book();
        let range = RangeSpec::from_bounds(Some(2), None, Some(2), Some(2));
        let result = read(&wb, &SheetSelector::AllInEnumerationOrder, &range, &ReadOptions::default()).unwrap();
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(
            json,
            r#"{"sheet_index_0":[{"employee_id":"D111222","employee_name":"John Smith"}],"sheet_index_1":[{"city_name":"San Jose","city_code":"408"}]}"#
        );
    }
}
