//! Test fixtures: small workbooks built from string tables.
//!
//! `sample_book()` mirrors the two-sheet employee/city workbook the reader,
//! mutator and search tests share.

use crate::cell::CellValue;
use crate::sheet::Sheet;
use crate::workbook::Workbook;

/// Build a sheet from rows of text. Numeric-looking strings become numbers so
/// the text projection is exercised; "" leaves the cell unset.
pub fn sheet_from_rows(name: &str, rows: &[&[&str]]) -> Sheet {
    let mut sheet = Sheet::new(name);
    for (r, row) in rows.iter().enumerate() {
        for (c, text) in row.iter().enumerate() {
            if text.is_empty() {
                continue;
            }
            let value = match text.parse::<f64>() {
                Ok(n) => CellValue::Number(n),
                Err(_) => CellValue::Text(text.to_string()),
            };
            sheet.set_value(r + 1, c + 1, value);
        }
    }
    sheet
}

pub fn sample_book() -> Workbook {
    let employee = sheet_from_rows(
        "Employee",
        &[
            &["employee_id", "employee_name", "department", "year_joined"],
            &["D111222", "John Smith", "Accounting", "1999"],
            &["D222333", "Mo Abou", "Engineering", "2008"],
            &["D333444", "Sandy Cole", "HR", "2015"],
            &["D444555", "Olivia ", "Engineering", "2003"],
        ],
    );
    let city = sheet_from_rows(
        "City",
        &[
            &["city_name", "city_code"],
            &["San Jose", "408"],
            &["Dublin", "925"],
            &["San Ramon", "925"],
            &["Sacramento", "916"],
        ],
    );
    Workbook::from_sheets(vec![employee, city])
}

/// A single sheet with `rows` rows of `r<row>c<col>` text across `cols` columns.
pub fn numbered_sheet(name: &str, rows: usize, cols: usize) -> Sheet {
    let mut sheet = Sheet::new(name);
    for r in 1..=rows {
        for c in 1..=cols {
            sheet.set_value(r, c, CellValue::Text(format!("r{r}c{c}")));
        }
    }
    sheet
}
