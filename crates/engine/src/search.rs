//! Region search over one or all sheets.

use gridbook_core::{GridError, RangeSpec, SheetSelector};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::workbook::Workbook;

/// Match flags parsed from an option string such as `"ix"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// `i`
    pub ignore_case: bool,
    /// `w`
    pub whole_word: bool,
    /// `x`, wins over `w`
    pub exact: bool,
}

impl SearchOptions {
    /// Unknown characters are ignored.
    pub fn parse(options: &str) -> Self {
        let mut parsed = SearchOptions::default();
        for ch in options.chars() {
            match ch {
                'i' => parsed.ignore_case = true,
                'w' => parsed.whole_word = true,
                'x' => parsed.exact = true,
                other => log::debug!("ignoring unknown search option {other:?}"),
            }
        }
        parsed
    }
}

/// How a cell's text is compared with the token.
#[derive(Debug, Clone)]
enum MatchPolicy {
    Exact(String),
    WholeWord(Regex),
    Substring(String),
}

impl MatchPolicy {
    fn build(token: &str, options: SearchOptions) -> Result<Self, GridError> {
        let token = if options.ignore_case {
            token.to_lowercase()
        } else {
            token.to_string()
        };

        if options.exact {
            Ok(MatchPolicy::Exact(token))
        } else if options.whole_word {
            let pattern = format!(r"\b{}\b", regex::escape(&token));
            Regex::new(&pattern)
                .map(MatchPolicy::WholeWord)
                .map_err(|e| GridError::InvalidSearchOptions(e.to_string()))
        } else {
            Ok(MatchPolicy::Substring(token))
        }
    }

    fn matches(&self, text: &str) -> bool {
        match self {
            MatchPolicy::Exact(token) => text == token,
            MatchPolicy::WholeWord(re) => re.is_match(text),
            MatchPolicy::Substring(token) => text.contains(token.as_str()),
        }
    }
}

/// One matching cell, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMatch {
    #[serde(rename = "row_no")]
    pub row: usize,
    #[serde(rename = "col_no")]
    pub col: usize,
}

/// Scan the selected sheets for `token`.
///
/// Sheets are visited in selection order and each region row by row, so the
/// result is in scan order. Matches from different sheets carry no sheet
/// label and may repeat coordinates.
pub fn search(
    workbook: &Workbook,
    selector: &SheetSelector,
    token: &str,
    range: &RangeSpec,
    options: SearchOptions,
) -> Result<Vec<SearchMatch>, GridError> {
    let bounds = range.bounds()?;
    let policy = MatchPolicy::build(token, options)?;
    let sheets = workbook.select(selector)?;

    let mut matches = Vec::new();
    for sheet in sheets {
        let resolved = bounds.resolve(sheet.extents());
        log::debug!(
            "search '{}': {}x{} cells",
            sheet.name,
            resolved.row_count(),
            resolved.col_count()
        );

        for row in resolved.rows() {
            for col in resolved.cols() {
                let mut text = sheet.get_text(row, col);
                if options.ignore_case {
                    text = text.to_lowercase();
                }
                if policy.matches(&text) {
                    matches.push(SearchMatch { row, col });
                }
            }
        }
    }

    Ok(matches)
}
