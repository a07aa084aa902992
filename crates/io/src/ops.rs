//! File-level operations: load, run one engine operation, and for mutations
//! save once to a separate destination.

use std::path::{Path, PathBuf};

use gridbook_core::{GridError, RangeSpec, SheetSelector};
use gridbook_engine::mutate::{self, MutationReport, UpdateSpec, WriteMode};
use gridbook_engine::reader::{self, ReadOptions, ReadResult};
use gridbook_engine::search::{self, SearchMatch, SearchOptions};
use gridbook_engine::style::StyleSpec;

use crate::xlsx;

pub fn read_file(
    src: &Path,
    selector: &SheetSelector,
    range: &RangeSpec,
    options: &ReadOptions,
) -> Result<ReadResult, GridError> {
    let workbook = xlsx::load(src)?;
    reader::read(&workbook, selector, range, options)
}

pub fn search_file(
    src: &Path,
    selector: &SheetSelector,
    token: &str,
    range: &RangeSpec,
    options: SearchOptions,
) -> Result<Vec<SearchMatch>, GridError> {
    let workbook = xlsx::load(src)?;
    search::search(&workbook, selector, token, range, options)
}

/// Everything one mutating call needs.
#[derive(Debug, Clone)]
pub struct MutateRequest<'a> {
    pub src: &'a Path,
    /// Defaults to [`default_destination`] of `src`.
    pub dest: Option<&'a Path>,
    pub sheet_name: &'a str,
    pub updates: &'a [UpdateSpec],
    pub style: Option<&'a StyleSpec>,
    pub mode: WriteMode,
}

#[derive(Debug, Clone)]
pub struct MutateOutcome {
    pub dest: PathBuf,
    pub report: MutationReport,
}

/// `dir/book.xlsx` → `dir/book_updated.xlsx`.
pub fn default_destination(src: &Path) -> PathBuf {
    let stem = src
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match src.extension() {
        Some(ext) => format!("{}_updated.{}", stem, ext.to_string_lossy()),
        None => format!("{}_updated", stem),
    };
    src.with_file_name(name)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Load `src`, apply the batch and style, and write the result to the
/// destination. The source file is never written; on any error nothing is
/// written at all.
pub fn mutate_file(request: &MutateRequest<'_>) -> Result<MutateOutcome, GridError> {
    let dest = request
        .dest
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_destination(request.src));
    if same_file(request.src, &dest) {
        return Err(GridError::write(
            dest.display().to_string(),
            "destination must differ from the source file",
        ));
    }

    let mut workbook = xlsx::load(request.src)?;
    let report = mutate::apply(
        &mut workbook,
        request.sheet_name,
        request.updates,
        request.mode,
        request.style,
    )?;
    xlsx::save(&workbook, &dest)?;

    Ok(MutateOutcome { dest, report })
}
