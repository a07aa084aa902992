//! Style patches applied to the cells a batch touched.
//!
//! A [`StyleSpec`] is what the host sends. It is resolved once into a
//! [`StylePatch`], which is then merged into each touched cell's existing
//! format. Nothing here fails: unusable fields are logged and skipped.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::cell::{parse_hex_color, CellFormat};
use crate::sheet::Sheet;

/// A font flag that is set, cleared or left alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TriState {
    #[default]
    Unset,
    On,
    Off,
}

impl TriState {
    /// The flag value after applying this state to `current`.
    pub fn apply(self, current: bool) -> bool {
        match self {
            TriState::Unset => current,
            TriState::On => true,
            TriState::Off => false,
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, TriState::Unset)
    }

    fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => TriState::Unset,
            Value::Bool(b) => TriState::from(*b),
            Value::String(s) if s.eq_ignore_ascii_case("true") => TriState::On,
            Value::String(s) if s.eq_ignore_ascii_case("false") => TriState::Off,
            other => {
                log::warn!("ignoring style flag {other}: expected true or false");
                TriState::Unset
            }
        }
    }
}

impl From<bool> for TriState {
    fn from(b: bool) -> Self {
        if b {
            TriState::On
        } else {
            TriState::Off
        }
    }
}

impl<'de> Deserialize<'de> for TriState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(TriState::from_value(&raw))
    }
}

impl Serialize for TriState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TriState::Unset => serializer.serialize_none(),
            TriState::On => serializer.serialize_bool(true),
            TriState::Off => serializer.serialize_bool(false),
        }
    }
}

/// Colors are kept as given; anything that isn't a string is dropped here.
fn lenient_color<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => {
            log::warn!("ignoring color {other}: expected an RRGGBB string");
            None
        }
    })
}

/// Style requested for a batch, in the host's wire names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleSpec {
    #[serde(
        rename = "fontColor",
        alias = "font_color",
        deserialize_with = "lenient_color",
        skip_serializing_if = "Option::is_none"
    )]
    pub font_color: Option<String>,
    #[serde(
        rename = "bgColor",
        alias = "bg_color",
        deserialize_with = "lenient_color",
        skip_serializing_if = "Option::is_none"
    )]
    pub bg_color: Option<String>,
    #[serde(skip_serializing_if = "TriState::is_unset")]
    pub bold: TriState,
    #[serde(skip_serializing_if = "TriState::is_unset")]
    pub italic: TriState,
    #[serde(skip_serializing_if = "TriState::is_unset")]
    pub underline: TriState,
}

/// Deserialize an optional style without ever failing: a style that is not
/// an object is logged and dropped.
pub fn lenient_style<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<StyleSpec>, D::Error> {
    Ok(StyleSpec::from_value(Value::deserialize(deserializer)?))
}

impl StyleSpec {
    /// Build a spec from loose JSON. Null means no style; anything other
    /// than an object is logged and treated the same way.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Object(_) => match serde_json::from_value(value) {
                Ok(spec) => Some(spec),
                Err(e) => {
                    log::warn!("ignoring style: {e}");
                    None
                }
            },
            other => {
                log::warn!("ignoring style {other}: expected an object");
                None
            }
        }
    }

    /// Parse colors and settle every field into a patch.
    pub fn resolve(&self) -> StylePatch {
        StylePatch {
            font_color: resolve_color("fontColor", self.font_color.as_deref()),
            background_color: resolve_color("bgColor", self.bg_color.as_deref()),
            bold: self.bold,
            italic: self.italic,
            underline: self.underline,
        }
    }
}

fn resolve_color(field: &str, raw: Option<&str>) -> Option<[u8; 4]> {
    let raw = raw?;
    let color = parse_hex_color(raw);
    if color.is_none() {
        log::warn!("ignoring {field} {raw:?}: expected RRGGBB or AARRGGBB");
    }
    color
}

/// A resolved style: what to change, and only that.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StylePatch {
    pub font_color: Option<[u8; 4]>,
    pub background_color: Option<[u8; 4]>,
    pub bold: TriState,
    pub italic: TriState,
    pub underline: TriState,
}

impl StylePatch {
    pub fn is_noop(&self) -> bool {
        *self == StylePatch::default()
    }

    /// Merge into an existing format. Color and flags land in one font, so
    /// setting a flag never drops a color set in the same patch or before it.
    pub fn apply_to(&self, base: &CellFormat) -> CellFormat {
        CellFormat {
            bold: self.bold.apply(base.bold),
            italic: self.italic.apply(base.italic),
            underline: self.underline.apply(base.underline),
            font_color: self.font_color.or(base.font_color),
            background_color: self.background_color.or(base.background_color),
        }
    }
}

/// Style every touched cell. Returns how many cells were restyled.
pub fn apply_style(sheet: &mut Sheet, touched: &[(usize, usize)], spec: Option<&StyleSpec>) -> usize {
    let Some(spec) = spec else {
        return 0;
    };
    let patch = spec.resolve();
    if patch.is_noop() {
        return 0;
    }

    for &(row, col) in touched {
        let format = patch.apply_to(&sheet.get_format(row, col));
        sheet.set_format(row, col, format);
    }
    log::debug!("styled {} cell(s) on '{}'", touched.len(), sheet.name);
    touched.len()
}
