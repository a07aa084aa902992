// File-level read / mutate / search against real xlsx files.

use std::path::{Path, PathBuf};

use gridbook_core::{GridError, RangeSpec, SheetSelector};
use gridbook_engine::mutate::{UpdateSpec, WriteMode};
use gridbook_engine::reader::ReadOptions;
use gridbook_engine::search::{SearchMatch, SearchOptions};
use gridbook_engine::style::StyleSpec;
use gridbook_io::{default_destination, mutate_file, read_file, search_file, MutateRequest};
use rust_xlsxwriter::{Color, Format, Workbook};

/// Employee + City workbook written the way a third-party tool would.
fn write_fixture(dir: &Path) -> PathBuf {
    let path = dir.join("Employee.xlsx");
    let mut wb = Workbook::new();

    let employee = wb.add_worksheet().set_name("Employee").unwrap();
    let rows: [(&str, &str, &str, f64); 4] = [
        ("D111222", "John Smith", "Accounting", 1999.0),
        ("D222333", "Mo Abou", "Engineering", 2008.0),
        ("D333444", "Sandy Cole", "HR", 2015.0),
        ("D444555", "Nicole Ray", "Engineering", 2003.0),
    ];
    for (c, h) in ["employee_id", "employee_name", "department", "year_joined"].iter().enumerate() {
        employee.write_string(0, c as u16, *h).unwrap();
    }
    for (r, (id, name, dept, year)) in rows.iter().enumerate() {
        let r = r as u32 + 1;
        employee.write_string(r, 0, *id).unwrap();
        employee.write_string(r, 1, *name).unwrap();
        employee.write_string(r, 2, *dept).unwrap();
        employee.write_number(r, 3, *year).unwrap();
    }
    let red = Format::new().set_font_color(Color::RGB(0xFF0000)).set_italic();
    employee.write_string_with_format(5, 0, "footer", &red).unwrap();

    let city = wb.add_worksheet().set_name("City").unwrap();
    city.write_string(0, 0, "city_name").unwrap();
    city.write_string(0, 1, "city_code").unwrap();
    city.write_string(1, 0, "Dublin").unwrap();
    city.write_number(1, 1, 925.0).unwrap();

    wb.save(&path).unwrap();
    path
}

fn employee() -> SheetSelector {
    SheetSelector::Named("Employee".into())
}

fn request<'a>(src: &'a Path, dest: Option<&'a Path>, updates: &'a [UpdateSpec], mode: WriteMode) -> MutateRequest<'a> {
    MutateRequest { src, dest, sheet_name: "Employee", updates, style: None, mode }
}

#[test]
fn read_by_name_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_fixture(dir.path());

    let range = RangeSpec::from_bounds(Some(2), None, Some(3), None);
    let result = read_file(&src, &employee(), &range, &ReadOptions::default()).unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "sheet_index_0": [
                {"employee_id": "D111222", "employee_name": "John Smith", "department": "Accounting", "year_joined": "1999"},
                {"employee_id": "D222333", "employee_name": "Mo Abou", "department": "Engineering", "year_joined": "2008"}
            ]
        })
    );
}

#[test]
fn overwrite_then_read_back_from_destination() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_fixture(dir.path());
    let updates = vec![UpdateSpec::new(4, 1, "D999000")];

    let outcome = mutate_file(&request(&src, None, &updates, WriteMode::Overwrite)).unwrap();
    assert_eq!(outcome.dest, default_destination(&src));
    assert_eq!(outcome.dest.file_name().unwrap(), "Employee_updated.xlsx");

    let range = RangeSpec::from_bounds(Some(4), Some(1), Some(4), Some(1));
    let options = ReadOptions { index_by_name: false, ..Default::default() };
    let result = read_file(&outcome.dest, &employee(), &range, &options).unwrap();
    assert_eq!(result.get("sheet_index_0").unwrap()[0].get("col_1"), Some("D999000"));

    // The source keeps its old value.
    let result = read_file(&src, &employee(), &range, &options).unwrap();
    assert_eq!(result.get("sheet_index_0").unwrap()[0].get("col_1"), Some("D333444"));
}

#[test]
fn source_bytes_are_untouched_by_mutate() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_fixture(dir.path());
    let before = std::fs::read(&src).unwrap();

    let dest = dir.path().join("out.xlsx");
    let updates = vec![UpdateSpec::new(0, 1, "D555666"), UpdateSpec::new(0, 2, "New Person")];
    let outcome = mutate_file(&request(&src, Some(&dest), &updates, WriteMode::Append)).unwrap();
    assert_eq!(outcome.dest, dest);

    assert_eq!(std::fs::read(&src).unwrap(), before);
    let found = search_file(&dest, &employee(), "New Person", &RangeSpec::all(), SearchOptions::parse("x")).unwrap();
    assert_eq!(found, vec![SearchMatch { row: 7, col: 2 }]);
}

#[test]
fn insert_keeps_existing_styles_and_applies_new_ones() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_fixture(dir.path());
    let dest = dir.path().join("styled.xlsx");

    let style: StyleSpec =
        serde_json::from_str(r#"{"fontColor": "006100", "bgColor": "C6EFCE", "bold": true}"#).unwrap();
    let updates = vec![UpdateSpec::new(2, 1, "D000111"), UpdateSpec::new(2, 2, "Ada Start")];
    let mut req = request(&src, Some(&dest), &updates, WriteMode::Insert);
    req.style = Some(&style);
    mutate_file(&req).unwrap();

    let wb = gridbook_io::xlsx::load(&dest).unwrap();
    let sheet = wb.sheet_by_name("Employee").unwrap();
    assert_eq!(sheet.get_text(2, 2), "Ada Start");
    assert_eq!(sheet.get_text(3, 2), "John Smith");

    let inserted = sheet.get_format(2, 1);
    assert!(inserted.bold);
    assert_eq!(inserted.font_color, Some([0x00, 0x61, 0x00, 255]));
    assert_eq!(inserted.background_color, Some([0xC6, 0xEF, 0xCE, 255]));

    // The italic red footer moved down one row with its style.
    let footer = sheet.get_format(7, 1);
    assert_eq!(sheet.get_text(7, 1), "footer");
    assert!(footer.italic);
    assert_eq!(footer.font_color, Some([0xFF, 0x00, 0x00, 255]));
}

#[test]
fn failed_batch_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_fixture(dir.path());
    let dest = dir.path().join("never.xlsx");

    let updates = vec![UpdateSpec::new(3, 1, "a"), UpdateSpec::new(4, 1, "b")];
    let err = mutate_file(&request(&src, Some(&dest), &updates, WriteMode::Insert)).unwrap_err();
    assert!(matches!(err, GridError::InvalidBatch(_)));
    assert!(!dest.exists());

    let mut req = request(&src, Some(&dest), &updates, WriteMode::Overwrite);
    req.sheet_name = "Payroll";
    let err = mutate_file(&req).unwrap_err();
    assert!(matches!(err, GridError::SheetNotFound(_)));
    assert!(!dest.exists());
}

#[test]
fn destination_equal_to_source_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_fixture(dir.path());
    let updates = vec![UpdateSpec::new(2, 1, "x")];
    let err = mutate_file(&request(&src, Some(&src), &updates, WriteMode::Overwrite)).unwrap_err();
    assert!(matches!(err, GridError::Write { .. }));
}

#[test]
fn search_all_sheets_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_fixture(dir.path());

    let found = search_file(
        &src,
        &SheetSelector::AllInEnumerationOrder,
        "Cole",
        &RangeSpec::all(),
        SearchOptions::default(),
    )
    .unwrap();
    assert_eq!(found, vec![SearchMatch { row: 4, col: 2 }]);

    let found = search_file(&src, &SheetSelector::AllInEnumerationOrder, "cole", &RangeSpec::all(), SearchOptions::parse("i"))
        .unwrap();
    assert_eq!(found, vec![SearchMatch { row: 4, col: 2 }, SearchMatch { row: 5, col: 2 }]);

    let found = search_file(&src, &SheetSelector::AllInEnumerationOrder, "925", &RangeSpec::all(), SearchOptions::parse("x"))
        .unwrap();
    assert_eq!(found, vec![SearchMatch { row: 2, col: 2 }]);
}

#[test]
fn missing_source_is_file_access_error() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("absent.xlsx");
    let err = read_file(&src, &SheetSelector::default(), &RangeSpec::all(), &ReadOptions::default()).unwrap_err();
    assert!(matches!(err, GridError::FileAccess { .. }));
    assert!(err.to_string().starts_with("Error accessing excel file ["));
}
