// gridbook CLI - range reads, batched cell updates and searches over
// spreadsheet files, with JSON results for automation hosts.

mod config;
mod exit_codes;

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Args, Parser, Subcommand};
use gridbook_core::{GridError, RangeSpec, SheetSelector};
use gridbook_engine::mutate::{UpdateSpec, WriteMode};
use gridbook_engine::reader::ReadOptions;
use gridbook_engine::search::SearchOptions;
use gridbook_engine::style::StyleSpec;
use serde::Serialize;
use serde_json::{Map, Value};

use config::{require_sheet_name, Task, TaskFile};
use exit_codes::{grid_exit_code, EXIT_ERROR, EXIT_FILE_ACCESS, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "gridbook")]
#[command(about = "Read, update and search spreadsheet ranges (JSON results on stdout)")]
#[command(version)]
struct Cli {
    /// More logging on stderr (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Region bounds. Omitted starts default to 1, omitted ends (or 0) to the
/// sheet's populated extent.
#[derive(Args, Debug, Clone, Default)]
struct RangeArgs {
    #[arg(long, value_name = "ROW")]
    start_row: Option<usize>,
    #[arg(long, value_name = "COL")]
    start_col: Option<usize>,
    #[arg(long, value_name = "ROW")]
    end_row: Option<usize>,
    #[arg(long, value_name = "COL")]
    end_col: Option<usize>,
}

impl RangeArgs {
    fn to_spec(&self) -> RangeSpec {
        RangeSpec::from_bounds(self.start_row, self.start_col, self.end_row, self.end_col)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Read a region into records, one per row
    #[command(after_help = "\
Examples:
  gridbook read Employee.xlsx --sheet Employee --start-row 2
  gridbook read Employee.xlsx --by-index --start-row 4 --end-row 4 --start-col 1 --end-col 1")]
    Read {
        /// Source workbook
        src: PathBuf,

        /// Sheet to read (default: every sheet, in workbook order)
        #[arg(long, short = 's', env = "GRIDBOOK_SHEET")]
        sheet: Option<String>,

        /// Key columns as col_<n> instead of by header text
        #[arg(long)]
        by_index: bool,

        /// Row holding the column headers
        #[arg(long, default_value_t = 1, value_name = "ROW")]
        header_row: usize,

        #[command(flatten)]
        range: RangeArgs,
    },

    /// Apply a batch of cell updates and save to a new file
    #[command(after_help = "\
Modes:
  w  overwrite each entry at its own cell_row (a first cell_row of 0 appends)
  a  append all entries to one new row after the last populated row
  i  insert a blank row at the first entry's cell_row and write into it

Examples:
  gridbook mutate Employee.xlsx -s Employee -m a \\
      --updates '[{\"cell_row\":0,\"cell_col\":1,\"cell_value\":\"D555666\"}]'
  gridbook mutate Employee.xlsx -s Employee -m w --updates @updates.json \\
      --style '{\"bold\":true,\"bgColor\":\"C6EFCE\"}' --dest out.xlsx")]
    Mutate {
        /// Source workbook (never modified)
        src: PathBuf,

        /// Sheet to update
        #[arg(long, short = 's', env = "GRIDBOOK_SHEET")]
        sheet: Option<String>,

        /// Write mode: w, a or i
        #[arg(long, short = 'm', default_value = "w")]
        mode: String,

        /// JSON list of {cell_row, cell_col, cell_value}; @FILE reads a file, - reads stdin
        #[arg(long, short = 'u')]
        updates: String,

        /// JSON style for every written cell (fontColor, bgColor, bold, italic, underline).
        /// An unusable style is logged and skipped; the values are still written.
        #[arg(long)]
        style: Option<String>,

        /// Destination (default: <stem>_updated.<ext> next to the source)
        #[arg(long, short = 'o')]
        dest: Option<PathBuf>,
    },

    /// Find cells whose text matches a token
    #[command(after_help = "\
Options string:
  i  ignore case
  w  whole word
  x  exact cell match (wins over w)

Examples:
  gridbook search Employee.xlsx Cole --options ix
  gridbook search Employee.xlsx 925 --sheet City --start-row 2")]
    Search {
        /// Source workbook
        src: PathBuf,

        /// Text to look for
        token: String,

        /// Match flags, any of i, w, x
        #[arg(long, default_value = "")]
        options: String,

        /// Sheet to search (default: every sheet, in workbook order)
        #[arg(long, short = 's', env = "GRIDBOOK_SHEET")]
        sheet: Option<String>,

        #[command(flatten)]
        range: RangeArgs,
    },

    /// Run one operation described by a TOML or JSON task file
    Run {
        /// Task file (.toml or .json)
        task: PathBuf,
    },
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_FILE_ACCESS, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<GridError> for CliError {
    fn from(err: GridError) -> Self {
        let hint = match &err {
            GridError::InvalidMode(_) => Some("use --mode w, a or i".to_string()),
            GridError::Write { .. } => Some("pass --dest with a writable path other than the source".to_string()),
            _ => None,
        };
        Self { code: grid_exit_code(&err), message: err.to_string(), hint }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Read { src, sheet, by_index, header_row, range } => cmd_read(
            &src,
            SheetSelector::from_name(sheet.as_deref()),
            range.to_spec(),
            ReadOptions { index_by_name: !by_index, header_row },
        ),
        Commands::Mutate { src, sheet, mode, updates, style, dest } => {
            cmd_mutate_args(&src, sheet, &mode, &updates, style.as_deref(), dest.as_deref())
        }
        Commands::Search { src, token, options, sheet, range } => cmd_search(
            &src,
            SheetSelector::from_name(sheet.as_deref()),
            &token,
            range.to_spec(),
            SearchOptions::parse(&options),
        ),
        Commands::Run { task } => cmd_run(&task),
    };

    let (code, body) = match result {
        Ok(body) => (EXIT_SUCCESS, body),
        Err(CliError { code, message, hint }) => {
            eprintln!("error: {}", message);
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            (code, failure_body(&message))
        }
    };

    match serde_json::to_string(&body) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::from(code)
        }
        Err(e) => {
            eprintln!("error: cannot serialize result: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .target(env_logger::Target::Stderr)
        .try_init();
}

// ============================================================================
// Result envelope
// ============================================================================

/// `{"changed": ..., <payload fields>}`
fn success_body(changed: bool, payload: impl Serialize) -> Result<Value, CliError> {
    let mut body = Map::new();
    body.insert("changed".to_string(), Value::Bool(changed));
    match serde_json::to_value(payload) {
        Ok(Value::Object(fields)) => body.extend(fields),
        Ok(Value::Null) => {}
        Ok(other) => {
            body.insert("result".to_string(), other);
        }
        Err(e) => {
            return Err(CliError {
                code: EXIT_ERROR,
                message: format!("cannot serialize result: {}", e),
                hint: None,
            })
        }
    }
    Ok(Value::Object(body))
}

/// `{"failed": true, "msg": ...}`
fn failure_body(message: &str) -> Value {
    let mut body = Map::new();
    body.insert("failed".to_string(), Value::Bool(true));
    body.insert("msg".to_string(), Value::String(message.to_string()));
    Value::Object(body)
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_read(
    src: &Path,
    selector: SheetSelector,
    range: RangeSpec,
    options: ReadOptions,
) -> Result<Value, CliError> {
    let result = gridbook_io::read_file(src, &selector, &range, &options)?;
    log::info!("read {} record(s) from {}", result.record_count(), src.display());
    success_body(false, &result)
}

fn cmd_search(
    src: &Path,
    selector: SheetSelector,
    token: &str,
    range: RangeSpec,
    options: SearchOptions,
) -> Result<Value, CliError> {
    let list = gridbook_io::search_file(src, &selector, token, &range, options)?;
    log::info!("{} match(es) for {:?} in {}", list.len(), token, src.display());

    #[derive(Serialize)]
    struct SearchPayload<'a> {
        list: &'a [gridbook_engine::search::SearchMatch],
    }
    success_body(false, SearchPayload { list: &list })
}

fn cmd_mutate_args(
    src: &Path,
    sheet: Option<String>,
    mode: &str,
    updates: &str,
    style: Option<&str>,
    dest: Option<&Path>,
) -> Result<Value, CliError> {
    let sheet_name = require_sheet_name(sheet)?;
    let mode: WriteMode = mode.parse()?;
    let updates: Vec<UpdateSpec> = parse_json_arg("--updates", updates)?;
    let style = match style {
        Some(arg) => parse_style_arg(arg)?,
        None => None,
    };
    cmd_mutate(src, dest, &sheet_name, &updates, style.as_ref(), mode)
}

fn cmd_mutate(
    src: &Path,
    dest: Option<&Path>,
    sheet_name: &str,
    updates: &[UpdateSpec],
    style: Option<&StyleSpec>,
    mode: WriteMode,
) -> Result<Value, CliError> {
    let request = gridbook_io::MutateRequest { src, dest, sheet_name, updates, style, mode };
    let outcome = gridbook_io::mutate_file(&request)?;

    #[derive(Serialize)]
    struct MutatePayload {
        dest: String,
        mode: WriteMode,
        cells_written: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        inserted_row: Option<usize>,
    }
    success_body(
        true,
        MutatePayload {
            dest: outcome.dest.display().to_string(),
            mode: outcome.report.mode.write_mode(),
            cells_written: outcome.report.touched.len(),
            inserted_row: outcome.report.inserted_row,
        },
    )
}

fn cmd_run(task_path: &Path) -> Result<Value, CliError> {
    let base_dir = task_path.parent().unwrap_or_else(|| Path::new("."));
    let task = TaskFile::load(task_path)?.into_task(base_dir)?;
    log::debug!("running task {:?}", task);

    match task {
        Task::Read { src, selector, range, options } => cmd_read(&src, selector, range, options),
        Task::Mutate { src, dest, sheet_name, updates, style, mode } => {
            cmd_mutate(&src, dest.as_deref(), &sheet_name, &updates, style.as_ref(), mode)
        }
        Task::Search { src, selector, token, range, options } => {
            cmd_search(&src, selector, &token, range, options)
        }
    }
}

/// Inline text, `@path` for a file, or `-` for stdin.
fn read_arg_source(flag: &str, arg: &str) -> Result<String, CliError> {
    if arg == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| CliError::io(format!("cannot read {} from stdin: {}", flag, e)))?;
        Ok(buf)
    } else if let Some(path) = arg.strip_prefix('@') {
        std::fs::read_to_string(path)
            .map_err(|e| CliError::io(format!("cannot read {} file {}: {}", flag, path, e)))
    } else {
        Ok(arg.to_string())
    }
}

fn parse_json_arg<T: serde::de::DeserializeOwned>(flag: &str, arg: &str) -> Result<T, CliError> {
    let content = read_arg_source(flag, arg)?;
    serde_json::from_str(&content).map_err(|e| {
        CliError::args(format!("invalid JSON for {}: {}", flag, e))
            .with_hint("pass inline JSON, @FILE or - for stdin")
    })
}

/// A bad style never blocks the value writes: it is logged and dropped.
fn parse_style_arg(arg: &str) -> Result<Option<StyleSpec>, CliError> {
    let content = read_arg_source("--style", arg)?;
    match serde_json::from_str::<Value>(&content) {
        Ok(value) => Ok(StyleSpec::from_value(value)),
        Err(e) => {
            log::warn!("ignoring --style: invalid JSON: {}", e);
            Ok(None)
        }
    }
}
