//! Task files for `gridbook run`.
//!
//! A task file carries one operation with the same parameter names automation
//! playbooks already use (`op`, `src`, `updates_matrix`, `cell_style`, ...).
//! Both TOML and JSON are accepted; the extension picks the parser, and files
//! without a known extension are tried as JSON, then TOML.

use std::path::{Path, PathBuf};

use gridbook_core::{RangeSpec, SheetSelector};
use gridbook_engine::mutate::{UpdateSpec, WriteMode};
use gridbook_engine::reader::ReadOptions;
use gridbook_engine::search::SearchOptions;
use gridbook_engine::style::{lenient_style, StyleSpec};
use serde::Deserialize;

use crate::CliError;

fn default_true() -> bool {
    true
}

fn default_header_row() -> usize {
    1
}

/// Raw task file contents.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskFile {
    /// `r`, `w`, `a`, `i` or `search`
    pub op: String,
    pub src: PathBuf,
    #[serde(default)]
    pub dest: Option<PathBuf>,
    #[serde(default)]
    pub sheet_name: Option<String>,
    #[serde(default = "default_true")]
    pub index_by_name: bool,
    #[serde(default = "default_header_row")]
    pub header_row: usize,
    #[serde(default)]
    pub read_range: Option<RangeSpec>,
    #[serde(default)]
    pub updates_matrix: Vec<UpdateSpec>,
    #[serde(default, deserialize_with = "lenient_style")]
    pub cell_style: Option<StyleSpec>,
    #[serde(default)]
    pub search_token: Option<String>,
    #[serde(default)]
    pub search_range: Option<RangeSpec>,
    #[serde(default)]
    pub search_options: String,
}

/// A validated task, ready to run.
#[derive(Debug, Clone)]
pub enum Task {
    Read {
        src: PathBuf,
        selector: SheetSelector,
        range: RangeSpec,
        options: ReadOptions,
    },
    Mutate {
        src: PathBuf,
        dest: Option<PathBuf>,
        sheet_name: String,
        updates: Vec<UpdateSpec>,
        style: Option<StyleSpec>,
        mode: WriteMode,
    },
    Search {
        src: PathBuf,
        selector: SheetSelector,
        token: String,
        range: RangeSpec,
        options: SearchOptions,
    },
}

impl TaskFile {
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CliError::io(format!("cannot read task file {}: {}", path.display(), e)))?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let parsed = match ext.as_deref() {
            Some("toml") => toml::from_str(&content).map_err(|e| e.to_string()),
            Some("json") => serde_json::from_str(&content).map_err(|e| e.to_string()),
            _ => serde_json::from_str(&content).or_else(|_| toml::from_str(&content).map_err(|e| e.to_string())),
        };
        parsed.map_err(|e| CliError::args(format!("invalid task file {}: {}", path.display(), e)))
    }

    /// Validate the operation and resolve relative paths against `base_dir`.
    pub fn into_task(self, base_dir: &Path) -> Result<Task, CliError> {
        let resolve = |p: PathBuf| if p.is_relative() { base_dir.join(p) } else { p };
        let src = resolve(self.src);

        match self.op.trim() {
            "r" => Ok(Task::Read {
                src,
                selector: SheetSelector::from_name(self.sheet_name.as_deref()),
                range: self.read_range.unwrap_or_default(),
                options: ReadOptions {
                    index_by_name: self.index_by_name,
                    header_row: self.header_row,
                },
            }),
            op @ ("w" | "a" | "i") => {
                let sheet_name = require_sheet_name(self.sheet_name)?;
                let mode = op.parse::<WriteMode>().map_err(CliError::from)?;
                Ok(Task::Mutate {
                    src,
                    dest: self.dest.map(resolve),
                    sheet_name,
                    updates: self.updates_matrix,
                    style: self.cell_style,
                    mode,
                })
            }
            "search" => {
                let token = self
                    .search_token
                    .ok_or_else(|| CliError::args("search_token has to be specified for 'search' operation"))?;
                Ok(Task::Search {
                    src,
                    selector: SheetSelector::from_name(self.sheet_name.as_deref()),
                    token,
                    range: self.search_range.unwrap_or_default(),
                    options: SearchOptions::parse(&self.search_options),
                })
            }
            other => Err(CliError::args(format!(
                "invalid op '{}': valid ops are 'r', 'w', 'i', 'a' and 'search'",
                other
            ))),
        }
    }
}

/// Mutations always name their sheet.
pub fn require_sheet_name(name: Option<String>) -> Result<String, CliError> {
    match name {
        Some(n) if !n.is_empty() => Ok(n),
        _ => Err(CliError::args("sheet_name has to be specified for 'w', 'i', and 'a' operation")),
    }
}
