use chrono::{NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};

/// Cell formatting carried through a load/mutate/save cycle.
///
/// Only the attributes the grid can read back and write out are modeled:
/// three font flags, the font color and a solid background fill.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CellFormat {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    /// RGBA
    pub font_color: Option<[u8; 4]>,
    /// RGBA, rendered as a solid pattern fill
    pub background_color: Option<[u8; 4]>,
}

impl CellFormat {
    pub fn is_default(&self) -> bool {
        *self == CellFormat::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Excel serial date (1900 system)
    DateTime(f64),
    /// Excel error token, e.g. `#DIV/0!`
    Error(String),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Textual projection used by reads and searches.
    ///
    /// Lossy: the native type is dropped. Empty cells project to "".
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Bool(b) => if *b { "TRUE".to_string() } else { "FALSE".to_string() },
            CellValue::DateTime(serial) => format_serial_datetime(*serial),
            CellValue::Error(e) => e.clone(),
        }
    }
}

/// Integers print without a decimal part; everything else uses the shortest
/// round-tripping representation.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Render an Excel serial as `YYYY-MM-DD HH:MM:SS`.
pub fn format_serial_datetime(serial: f64) -> String {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).and_then(|d| d.and_hms_opt(0, 0, 0));
    let millis = (serial * 86_400_000.0).round();
    let converted = if millis.is_finite() && millis.abs() < i64::MAX as f64 {
        epoch.and_then(|e| TimeDelta::try_milliseconds(millis as i64).and_then(|d| e.checked_add_signed(d)))
    } else {
        None
    };
    match converted {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => format_number(serial),
    }
}

/// Parse `RRGGBB` or `AARRGGBB` (optionally `#`-prefixed) into RGBA.
pub fn parse_hex_color(hex: &str) -> Option<[u8; 4]> {
    let s = hex.trim().trim_start_matches('#');
    if !s.is_ascii() {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).ok();

    match s.len() {
        8 => Some([byte(2)?, byte(4)?, byte(6)?, byte(0)?]),
        6 => Some([byte(0)?, byte(2)?, byte(4)?, 255]),
        _ => None,
    }
}

/// RGBA back to `RRGGBB` as xlsx writers expect it.
pub fn color_to_rgb(color: [u8; 4]) -> u32 {
    let [r, g, b, _] = color;
    ((r as u32) << 16) | ((g as u32) << 8) | (b as u32)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub value: CellValue,
    pub format: CellFormat,
}

impl Cell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: CellValue) -> Self {
        Self { value, format: CellFormat::default() }
    }
}
