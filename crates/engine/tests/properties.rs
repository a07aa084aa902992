// Property-based tests for range resolution, batch mutation and search.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use gridbook_core::{RangeSpec, SheetExtents, SheetSelector};
use gridbook_engine::cell::CellValue;
use gridbook_engine::mutate::{mutate, ResolvedMode, UpdateSpec, WriteMode};
use gridbook_engine::search::{search, SearchOptions};
use gridbook_engine::sheet::Sheet;
use gridbook_engine::workbook::Workbook;
use proptest::prelude::*;

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

fn filled_sheet(rows: usize, cols: usize) -> Sheet {
    let mut sheet = Sheet::new("P");
    for r in 1..=rows {
        for c in 1..=cols {
            sheet.set_value(r, c, CellValue::Text(format!("r{r}c{c}")));
        }
    }
    sheet
}

/// Cell text: a few words from a tiny vocabulary so matches are common.
fn arb_text() -> impl Strategy<Value = String> {
    prop::collection::vec(prop_oneof!["cole", "Cole", "nicole", "san", "jose", "-", "42"], 0..4)
        .prop_map(|words| words.join(" "))
}

proptest! {
    #![proptest_config(config())]
    #[test]
    fn starts_only_resolve_to_extents(
        start_row in 0usize..50,
        start_col in 0usize..50,
        max_row in 0usize..500,
        max_col in 0usize..50,
    ) {
        let spec = RangeSpec::from_bounds(Some(start_row), Some(start_col), None, None);
        let resolved = spec.bounds().unwrap().resolve(SheetExtents::new(max_row, max_col));
        prop_assert_eq!(resolved.end_row, max_row);
        prop_assert_eq!(resolved.end_col, max_col);
        prop_assert_eq!(resolved.start_row, start_row.max(1));
        prop_assert_eq!(resolved.start_col, start_col.max(1));
    }
}

proptest! {
    #![proptest_config(config())]
    #[test]
    fn append_fills_exactly_one_new_row(
        rows in 0usize..30,
        cols in 1usize..6,
        width in 1usize..6,
    ) {
        let mut sheet = filled_sheet(rows, cols);
        let before = sheet.cell_count();
        let batch: Vec<UpdateSpec> = (1..=width)
            .map(|c| UpdateSpec::new(1, c, format!("new{c}").as_str()))
            .collect();

        let report = mutate(&mut sheet, &batch, WriteMode::Append).unwrap();

        prop_assert_eq!(report.mode, ResolvedMode::Append { row: rows + 1 });
        prop_assert_eq!(sheet.max_row(), rows + 1);
        prop_assert_eq!(sheet.cell_count(), before + width);
        for c in 1..=width {
            prop_assert_eq!(sheet.get_text(rows + 1, c), format!("new{c}"));
        }
    }
}

proptest! {
    #![proptest_config(config())]
    #[test]
    fn insert_shifts_everything_at_or_below(
        rows in 1usize..30,
        cols in 1usize..5,
        at_seed in 0usize..1000,
    ) {
        let at = at_seed % rows + 1;
        let mut sheet = filled_sheet(rows, cols);
        let batch = vec![UpdateSpec::new(at, 1, "ins")];

        mutate(&mut sheet, &batch, WriteMode::Insert).unwrap();

        prop_assert_eq!(sheet.max_row(), rows + 1);
        prop_assert_eq!(sheet.get_text(at, 1), "ins");
        for r in 1..=rows {
            let target = if r >= at { r + 1 } else { r };
            for c in 1..=cols {
                prop_assert_eq!(sheet.get_text(target, c), format!("r{r}c{c}"));
            }
        }
    }
}

proptest! {
    #![proptest_config(config())]
    #[test]
    fn match_policies_nest(
        cells in prop::collection::vec(arb_text(), 1..20),
        token in prop_oneof!["cole", "Cole", "san jose", "-", "42"],
        ignore_case in any::<bool>(),
    ) {
        let mut sheet = Sheet::new("P");
        for (i, text) in cells.iter().enumerate() {
            if !text.is_empty() {
                sheet.set_value(i + 1, 1, CellValue::Text(text.clone()));
            }
        }
        let wb = Workbook::from_sheets(vec![sheet]);
        let run = |flags: &str| {
            let mut opts = SearchOptions::parse(flags);
            opts.ignore_case = ignore_case;
            search(&wb, &SheetSelector::AllInEnumerationOrder, &token, &RangeSpec::all(), opts).unwrap()
        };

        let substring = run("");
        let whole_word = run("w");
        let exact = run("x");

        prop_assert!(whole_word.iter().all(|m| substring.contains(m)));
        prop_assert!(exact.iter().all(|m| substring.contains(m)));
        // Scan order is row-major
        prop_assert!(substring.windows(2).all(|w| w[0].row < w[1].row));
    }
}
