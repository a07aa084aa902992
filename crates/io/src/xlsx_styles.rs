//! XLSX style recovery: fonts and fills from styles.xml, per-cell style IDs
//! from worksheet XML.
//!
//! calamine gives values only, so this reads the archive a second time for the
//! formatting the grid tracks: bold, italic, underline, font color and solid
//! background fill. Everything else in styles.xml is skipped.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Read, Seek};
use std::path::Path;

use gridbook_engine::cell::CellFormat;
use zip::ZipArchive;

/// cellXfs index → resolved format.
#[derive(Debug, Default)]
pub struct StyleTable {
    pub styles: Vec<CellFormat>,
}

impl StyleTable {
    pub fn get(&self, id: usize) -> Option<&CellFormat> {
        self.styles.get(id)
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

/// `(row, col, style_id)` triples for one worksheet, 1-based.
#[derive(Debug, Default)]
pub struct SheetStyles {
    pub cell_styles: Vec<(usize, usize, usize)>,
}

#[derive(Debug, Clone, Default)]
struct ParsedFont {
    bold: bool,
    italic: bool,
    underline: bool,
    color: Option<[u8; 4]>,
}

#[derive(Debug, Clone, Default)]
struct ParsedFill {
    solid: bool,
    color: Option<[u8; 4]>,
}

#[derive(Debug, Default)]
struct XfEntry {
    font_id: Option<usize>,
    fill_id: Option<usize>,
}

/// Standard palette entries for `indexed="N"` colors. Only the primaries and
/// the two system colors are mapped.
fn indexed_color(idx: u8) -> Option<[u8; 4]> {
    let rgb: [u8; 3] = match idx {
        0 | 8 | 64 => [0, 0, 0],
        1 | 9 | 65 => [255, 255, 255],
        2 | 10 => [255, 0, 0],
        3 | 11 => [0, 255, 0],
        4 | 12 => [0, 0, 255],
        5 | 13 => [255, 255, 0],
        6 | 14 => [255, 0, 255],
        7 | 15 => [0, 255, 255],
        _ => return None,
    };
    Some([rgb[0], rgb[1], rgb[2], 255])
}

/// `<color rgb=".."/>` / `<fgColor indexed=".."/>`. Theme colors are not
/// resolved.
fn parse_color(e: &BytesStart) -> Option<[u8; 4]> {
    let mut rgb = None;
    let mut indexed = None;
    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"rgb" => rgb = Some(String::from_utf8_lossy(&attr.value).to_string()),
            b"indexed" => {
                indexed = std::str::from_utf8(&attr.value)
                    .ok()
                    .and_then(|s| s.parse::<u8>().ok());
            }
            _ => {}
        }
    }

    if let Some(hex) = rgb {
        return gridbook_engine::cell::parse_hex_color(&hex);
    }
    indexed.and_then(indexed_color)
}

fn attr_usize(e: &BytesStart, key: &[u8]) -> Option<usize> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| std::str::from_utf8(&a.value).ok().and_then(|s| s.parse().ok()))
}

fn attr_string(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}

/// A flag element such as `<b/>` is on unless it says `val="0"`/`"false"`.
fn flag_on(e: &BytesStart) -> bool {
    !matches!(attr_string(e, b"val").as_deref(), Some("0") | Some("false"))
}

/// Parse styles.xml into a StyleTable.
pub fn parse_styles_xml(xml: &str) -> StyleTable {
    let fonts = parse_fonts(xml);
    let fills = parse_fills(xml);
    let styles = parse_cell_xfs(xml)
        .iter()
        .map(|xf| resolve_xf(xf, &fonts, &fills))
        .collect();
    StyleTable { styles }
}

fn parse_fonts(xml: &str) -> Vec<ParsedFont> {
    let mut fonts = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut depth = 0; // 0 = outside, 1 = inside <fonts>, 2 = inside <font>
    let mut current = ParsedFont::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"fonts" if depth == 0 => depth = 1,
                b"font" if depth == 1 => {
                    depth = 2;
                    current = ParsedFont::default();
                }
                b"color" if depth == 2 => current.color = parse_color(e),
                _ => {}
            },
            Ok(Event::Empty(ref e)) if depth == 2 => match e.name().as_ref() {
                b"b" => current.bold = flag_on(e),
                b"i" => current.italic = flag_on(e),
                b"u" => {
                    current.underline = !matches!(attr_string(e, b"val").as_deref(), Some("none"));
                }
                b"color" => current.color = parse_color(e),
                _ => {}
            },
            Ok(Event::Empty(ref e)) if depth == 1 && e.name().as_ref() == b"font" => {
                fonts.push(ParsedFont::default());
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"font" if depth == 2 => {
                    fonts.push(std::mem::take(&mut current));
                    depth = 1;
                }
                b"fonts" if depth == 1 => break,
                _ => {}
            },
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    fonts
}

fn parse_fills(xml: &str) -> Vec<ParsedFill> {
    let mut fills = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut depth = 0; // 0 = outside, 1 = inside <fills>, 2 = inside <fill>
    let mut in_pattern_fill = false;
    let mut current = ParsedFill::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"fills" if depth == 0 => depth = 1,
                b"fill" if depth == 1 => {
                    depth = 2;
                    current = ParsedFill::default();
                }
                b"patternFill" if depth == 2 => {
                    in_pattern_fill = true;
                    current.solid = attr_string(e, b"patternType").as_deref() == Some("solid");
                }
                b"fgColor" if in_pattern_fill => current.color = parse_color(e),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"patternFill" if depth == 2 => {
                    current.solid = attr_string(e, b"patternType").as_deref() == Some("solid");
                }
                b"fgColor" if in_pattern_fill => current.color = parse_color(e),
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"patternFill" => in_pattern_fill = false,
                b"fill" if depth == 2 => {
                    fills.push(std::mem::take(&mut current));
                    depth = 1;
                    in_pattern_fill = false;
                }
                b"fills" if depth == 1 => break,
                _ => {}
            },
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    fills
}

fn parse_cell_xfs(xml: &str) -> Vec<XfEntry> {
    let mut entries = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut in_cell_xfs = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"cellXfs" => in_cell_xfs = true,
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if in_cell_xfs && e.name().as_ref() == b"xf" =>
            {
                entries.push(XfEntry {
                    font_id: attr_usize(e, b"fontId"),
                    fill_id: attr_usize(e, b"fillId"),
                });
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"cellXfs" => break,
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    entries
}

fn resolve_xf(xf: &XfEntry, fonts: &[ParsedFont], fills: &[ParsedFill]) -> CellFormat {
    let mut format = CellFormat::default();

    if let Some(font) = xf.font_id.and_then(|id| fonts.get(id)) {
        format.bold = font.bold;
        format.italic = font.italic;
        format.underline = font.underline;
        // The workbook default font color is black; keep it implicit.
        format.font_color = font.color.filter(|c| *c != [0, 0, 0, 255]);
    }

    if let Some(fill) = xf.fill_id.and_then(|id| fills.get(id)) {
        if fill.solid {
            format.background_color = fill.color;
        }
    }

    format
}

/// Collect `s="N"` references from a worksheet. Style 0 is the default and
/// is skipped.
pub fn parse_sheet_styles(xml: &str) -> SheetStyles {
    let mut cell_styles = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) if e.name().as_ref() == b"c" => {
                let style_id = attr_usize(e, b"s").filter(|&s| s > 0);
                let cell_ref = attr_string(e, b"r");
                if let (Some(style_id), Some(cell_ref)) = (style_id, cell_ref) {
                    if let Some((row, col)) = parse_cell_ref(&cell_ref) {
                        cell_styles.push((row, col, style_id));
                    }
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    SheetStyles { cell_styles }
}

/// Parse a cell reference like "B5" into 1-based (row, col) = (5, 2).
pub fn parse_cell_ref(r: &str) -> Option<(usize, usize)> {
    let split = r.find(|c: char| c.is_ascii_digit())?;
    let (col_part, row_part) = r.split_at(split);
    // Widest column is XFD
    if col_part.is_empty() || col_part.len() > 3 || !col_part.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let col = col_part.chars().try_fold(0usize, |acc, ch| {
        acc.checked_mul(26)?
            .checked_add(ch.to_ascii_uppercase() as usize - 'A' as usize + 1)
    })?;
    let row: usize = row_part.parse().ok().filter(|&r| r > 0)?;

    Some((row, col))
}

/// Read the style table and per-sheet style references from an xlsx file.
/// `sheet_names` must be in workbook order; the result has one entry each.
pub fn parse_xlsx_styles(
    path: &Path,
    sheet_names: &[String],
) -> Result<(StyleTable, Vec<SheetStyles>), String> {
    let file = std::fs::File::open(path)
        .map_err(|e| format!("Failed to open XLSX file for styles: {}", e))?;
    let mut archive = ZipArchive::new(file)
        .map_err(|e| format!("Failed to read XLSX as ZIP for styles: {}", e))?;

    let table = match read_zip_file(&mut archive, "xl/styles.xml") {
        Ok(xml) => parse_styles_xml(&xml),
        Err(_) => return Ok((StyleTable::default(), sheet_names.iter().map(|_| SheetStyles::default()).collect())),
    };

    let workbook_xml = read_zip_file(&mut archive, "xl/workbook.xml").unwrap_or_default();
    let rels_xml = read_zip_file(&mut archive, "xl/_rels/workbook.xml.rels").unwrap_or_default();
    let paths = resolve_worksheet_paths(&workbook_xml, &rels_xml, sheet_names);

    let sheets = paths
        .iter()
        .map(|ws_path| match ws_path {
            Some(p) => read_zip_file(&mut archive, p)
                .map(|xml| parse_sheet_styles(&xml))
                .unwrap_or_default(),
            None => SheetStyles::default(),
        })
        .collect();

    Ok((table, sheets))
}

fn read_zip_file<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<String, String> {
    let mut file = archive
        .by_name(path)
        .map_err(|e| format!("File '{}' not found in XLSX: {}", path, e))?;
    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| format!("Failed to read '{}': {}", path, e))?;
    Ok(content)
}

/// Map sheet names to their worksheet part via workbook.xml and its rels.
fn resolve_worksheet_paths(
    workbook_xml: &str,
    rels_xml: &str,
    sheet_names: &[String],
) -> Vec<Option<String>> {
    let mut name_to_rid: HashMap<String, String> = HashMap::new();
    let mut reader = Reader::from_str(workbook_xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if e.name().as_ref() == b"sheet" => {
                if let (Some(name), Some(rid)) = (attr_string(e, b"name"), attr_string(e, b"r:id")) {
                    name_to_rid.insert(unescape_xml(&name), rid);
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    let mut rid_to_target: HashMap<String, String> = HashMap::new();
    let mut reader = Reader::from_str(rels_xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.name().as_ref() == b"Relationship" =>
            {
                if let (Some(id), Some(target)) = (attr_string(e, b"Id"), attr_string(e, b"Target")) {
                    rid_to_target.insert(id, target);
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    sheet_names
        .iter()
        .map(|name| {
            let target = rid_to_target.get(name_to_rid.get(name)?)?;
            Some(match target.strip_prefix('/') {
                Some(absolute) => absolute.to_string(),
                None => format!("xl/{}", target),
            })
        })
        .collect()
}

/// Unescape the 5 predefined XML entities.
fn unescape_xml(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
