//! Excel load (via calamine) and xlsx save (via rust_xlsxwriter).
//!
//! Loading accepts anything calamine opens (xlsx, xlsm, xls, xlsb, ods);
//! formatting is only recovered from xlsx/xlsm archives. Saving always
//! writes xlsx.

use std::io::Write;
use std::path::Path;
use std::time::Instant;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use gridbook_core::GridError;
use gridbook_engine::cell::{color_to_rgb, CellFormat, CellValue};
use gridbook_engine::sheet::Sheet;
use gridbook_engine::workbook::Workbook;
use rust_xlsxwriter::{Color, Format, FormatUnderline, Workbook as XlsxWorkbook, Worksheet};

use crate::xlsx_styles;

/// Excel's grid limits, 1-based.
const MAX_ROWS: usize = 1_048_576;
const MAX_COLS: usize = 16_384;

/// Number format attached to date-time cells on save.
pub const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Load a workbook from disk.
pub fn load(path: &Path) -> Result<Workbook, GridError> {
    let start_time = Instant::now();
    let display = path.display().to_string();

    let mut source: Sheets<_> =
        open_workbook_auto(path).map_err(|e| GridError::file_access(&display, e))?;
    let sheet_names: Vec<String> = source.sheet_names().to_vec();

    let mut sheets = Vec::with_capacity(sheet_names.len());
    for sheet_name in &sheet_names {
        let range = source
            .worksheet_range(sheet_name)
            .map_err(|e| GridError::file_access(&display, format!("sheet '{}': {}", sheet_name, e)))?;

        let mut sheet = Sheet::new(sheet_name);
        // Range start offset (data may not begin at A1)
        let (data_start_row, data_start_col) = range.start().unwrap_or((0, 0));

        for (row_idx, row) in range.rows().enumerate() {
            let target_row = data_start_row as usize + row_idx + 1;
            for (col_idx, cell) in row.iter().enumerate() {
                let target_col = data_start_col as usize + col_idx + 1;
                let value = match cell {
                    Data::Empty => continue,
                    Data::String(s) if s.is_empty() => continue,
                    Data::String(s) => CellValue::Text(s.clone()),
                    Data::Float(n) => CellValue::Number(*n),
                    Data::Int(n) => CellValue::Number(*n as f64),
                    Data::Bool(b) => CellValue::Bool(*b),
                    Data::Error(e) => CellValue::Error(e.to_string()),
                    // 1900 date system assumed
                    Data::DateTime(dt) => CellValue::DateTime(dt.as_f64()),
                    Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
                };
                sheet.set_value(target_row, target_col, value);
            }
        }
        sheets.push(sheet);
    }

    let mut workbook = Workbook::from_sheets(sheets);
    if is_xlsx_archive(path) {
        import_formatting(path, &sheet_names, &mut workbook);
    }

    log::debug!(
        "loaded {} ({} sheet(s)) in {}ms",
        display,
        workbook.sheet_count(),
        start_time.elapsed().as_millis()
    );
    Ok(workbook)
}

fn is_xlsx_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_ascii_lowercase().as_str(), "xlsx" | "xlsm"))
        .unwrap_or(false)
}

/// Overlay recovered formats. Failure only costs formatting, never the load.
fn import_formatting(path: &Path, sheet_names: &[String], workbook: &mut Workbook) {
    let (table, sheet_styles) = match xlsx_styles::parse_xlsx_styles(path, sheet_names) {
        Ok(data) => data,
        Err(e) => {
            log::warn!("formatting not imported from {}: {}", path.display(), e);
            return;
        }
    };
    if table.is_empty() {
        return;
    }

    for (name, styles) in sheet_names.iter().zip(&sheet_styles) {
        let Some(sheet) = workbook.sheet_by_name_mut(name) else {
            continue;
        };
        for &(row, col, style_id) in &styles.cell_styles {
            match table.get(style_id) {
                Some(format) if !format.is_default() => sheet.set_format(row, col, format.clone()),
                _ => {}
            }
        }
    }
}

/// Serialize a workbook to xlsx bytes.
pub fn to_xlsx_bytes(workbook: &Workbook) -> Result<Vec<u8>, String> {
    let mut xlsx_workbook = XlsxWorkbook::new();

    for sheet in workbook.sheets() {
        let worksheet = xlsx_workbook.add_worksheet();
        worksheet
            .set_name(&sheet.name)
            .map_err(|e| format!("Failed to create sheet '{}': {}", sheet.name, e))?;
        export_sheet_cells(sheet, worksheet)?;
    }

    xlsx_workbook
        .save_to_buffer()
        .map_err(|e| format!("Failed to build XLSX file: {}", e))
}

fn export_sheet_cells(sheet: &Sheet, worksheet: &mut Worksheet) -> Result<usize, String> {
    let mut cells_exported = 0;

    for (&(row, col), cell) in sheet.cells_iter() {
        if row > MAX_ROWS || col > MAX_COLS {
            return Err(format!(
                "cell ({}, {}) on '{}' is outside the xlsx grid",
                row, col, sheet.name
            ));
        }
        let row32 = (row - 1) as u32;
        let col16 = (col - 1) as u16;
        let format = build_excel_format(&cell.format);
        let write_err = |e: rust_xlsxwriter::XlsxError| {
            format!("Failed to write cell ({}, {}): {}", row, col, e)
        };

        match &cell.value {
            CellValue::Empty => {
                if cell.format.is_default() {
                    continue;
                }
                worksheet.write_blank(row32, col16, &format).map_err(write_err)?;
            }
            CellValue::Text(s) | CellValue::Error(s) => {
                worksheet
                    .write_string_with_format(row32, col16, s, &format)
                    .map_err(write_err)?;
            }
            CellValue::Number(n) => {
                worksheet
                    .write_number_with_format(row32, col16, *n, &format)
                    .map_err(write_err)?;
            }
            CellValue::Bool(b) => {
                worksheet
                    .write_boolean_with_format(row32, col16, *b, &format)
                    .map_err(write_err)?;
            }
            CellValue::DateTime(serial) => {
                let format = format.set_num_format(DATETIME_FORMAT);
                worksheet
                    .write_number_with_format(row32, col16, *serial, &format)
                    .map_err(write_err)?;
            }
        }
        cells_exported += 1;
    }

    Ok(cells_exported)
}

fn build_excel_format(cell_format: &CellFormat) -> Format {
    let mut format = Format::new();

    if cell_format.bold {
        format = format.set_bold();
    }
    if cell_format.italic {
        format = format.set_italic();
    }
    if cell_format.underline {
        format = format.set_underline(FormatUnderline::Single);
    }
    if let Some(color) = cell_format.font_color {
        format = format.set_font_color(Color::RGB(color_to_rgb(color)));
    }
    // Solid pattern fill
    if let Some(color) = cell_format.background_color {
        format = format.set_background_color(Color::RGB(color_to_rgb(color)));
    }

    format
}

/// Write a workbook to `dest` atomically: the bytes go to a temp file in the
/// destination directory, which then replaces `dest`.
pub fn save(workbook: &Workbook, dest: &Path) -> Result<(), GridError> {
    let display = dest.display().to_string();
    let bytes = to_xlsx_bytes(workbook).map_err(|e| GridError::write(&display, e))?;

    let dir = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| GridError::write(&display, e))?;
    tmp.write_all(&bytes).map_err(|e| GridError::write(&display, e))?;
    tmp.as_file().sync_all().map_err(|e| GridError::write(&display, e))?;
    tmp.persist(dest).map_err(|e| GridError::write(&display, e.error))?;

    log::info!("saved {} ({} bytes)", display, bytes.len());
    Ok(())
}
