//! Filament color lookup
//!
//! The color table maps a material family (the detailed filament type on the
//! tag, e.g. `PLA Basic`) to the colors sold in that family. Entries carry the
//! primary RGB, an optional secondary RGB for dual-color spools, a display
//! name and the vendor's color code.
//!
//! Two JSON shapes are accepted:
//!
//! ```json
//! { "PLA Basic": [ { "hex": "FFFFFF", "name": "Jade White", "code": "10100" } ] }
//! { "PLA Basic": { "FFFFFF": { "name": "Jade White", "code": "10100" } } }
//! ```
//!
//! Dual-color entries use `"RRGGBB;RRGGBB"` as the hex value.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::SpoolRecord;

/// Maximum RGB distance accepted for a nearest-color match by default.
///
/// Zero means only exact matches resolve.
pub const DEFAULT_TOLERANCE: f64 = 0.0;

#[derive(Debug, Error)]
pub enum ColorTableError {
    #[error("Failed to read color table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid color table JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid color '{hex}' in family '{family}'")]
    InvalidHex { family: String, hex: String },
}

/// An opaque RGB triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `RRGGBB`, with or without a leading `#`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        let bytes = hex::decode(hex).ok()?;
        match bytes.as_slice() {
            [r, g, b] => Some(Self::new(*r, *g, *b)),
            _ => None,
        }
    }

    pub fn hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Euclidean distance in RGB space
    pub fn distance(&self, other: &Rgb) -> f64 {
        let dr = f64::from(self.r) - f64::from(other.r);
        let dg = f64::from(self.g) - f64::from(other.g);
        let db = f64::from(self.b) - f64::from(other.b);
        (dr * dr + dg * dg + db * db).sqrt()
    }
}

/// A color with alpha, as stored on the tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb(&self) -> Rgb {
        Rgb::new(self.r, self.g, self.b)
    }

    /// `RRGGBBAA`
    pub fn hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
    }
}

/// One color in a material family
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorEntry {
    pub name: String,
    pub code: String,
    pub primary: Rgb,
    pub secondary: Option<Rgb>,
}

impl ColorEntry {
    /// Hex key as written in the table (`RRGGBB` or `RRGGBB;RRGGBB`)
    pub fn hex(&self) -> String {
        match &self.secondary {
            Some(second) => format!("{};{}", self.primary.hex(), second.hex()),
            None => self.primary.hex(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFamily {
    List(Vec<RawListEntry>),
    Map(BTreeMap<String, RawMapEntry>),
}

#[derive(Deserialize)]
struct RawListEntry {
    hex: String,
    name: String,
    code: String,
}

#[derive(Deserialize)]
struct RawMapEntry {
    name: String,
    code: String,
}

/// Material family → colors, loaded once and read-only afterwards
#[derive(Debug, Clone, Default)]
pub struct ColorTable {
    families: BTreeMap<String, Vec<ColorEntry>>,
}

impl ColorTable {
    /// Parse a table from JSON text
    pub fn from_json(json: &str) -> Result<Self, ColorTableError> {
        let raw: BTreeMap<String, RawFamily> = serde_json::from_str(json)?;

        let mut families = BTreeMap::new();
        for (family, entries) in raw {
            let pairs: Vec<(String, String, String)> = match entries {
                RawFamily::List(list) => list.into_iter().map(|e| (e.hex, e.name, e.code)).collect(),
                RawFamily::Map(map) => map.into_iter().map(|(hex, e)| (hex, e.name, e.code)).collect(),
            };

            let mut colors = Vec::with_capacity(pairs.len());
            for (hex, name, code) in pairs {
                let (primary, secondary) =
                    parse_entry_hex(&hex).ok_or_else(|| ColorTableError::InvalidHex {
                        family: family.clone(),
                        hex: hex.clone(),
                    })?;
                colors.push(ColorEntry {
                    name,
                    code,
                    primary,
                    secondary,
                });
            }
            families.insert(family, colors);
        }

        tracing::debug!(families = families.len(), "loaded color table");
        Ok(Self { families })
    }

    /// Read and parse a table file
    pub fn load(path: &Path) -> Result<Self, ColorTableError> {
        let json = fs::read_to_string(path).map_err(|source| ColorTableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Colors of a family, matched exactly first and then ignoring ASCII case
    pub fn family(&self, name: &str) -> Option<&[ColorEntry]> {
        self.families
            .get(name)
            .or_else(|| {
                self.families
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v)
            })
            .map(Vec::as_slice)
    }

    pub fn families(&self) -> impl Iterator<Item = (&str, &[ColorEntry])> {
        self.families.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}

fn parse_entry_hex(hex: &str) -> Option<(Rgb, Option<Rgb>)> {
    match hex.split_once(';') {
        Some((first, second)) => Some((Rgb::from_hex(first)?, Some(Rgb::from_hex(second)?))),
        None => Some((Rgb::from_hex(hex)?, None)),
    }
}

/// Outcome of a color lookup
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "match", rename_all = "snake_case")]
pub enum ColorResolution<'a> {
    /// The table has this exact color
    Exact { family: String, entry: &'a ColorEntry },
    /// Closest color in the family within the tolerance
    Nearest {
        family: String,
        entry: &'a ColorEntry,
        distance: f64,
    },
    /// No match; raw values preserved as decoded
    Unknown {
        family: Option<String>,
        rgba: Option<Rgba>,
        secondary: Option<Rgba>,
    },
}

impl ColorResolution<'_> {
    pub fn entry(&self) -> Option<&ColorEntry> {
        match self {
            Self::Exact { entry, .. } | Self::Nearest { entry, .. } => Some(entry),
            Self::Unknown { .. } => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown { .. })
    }
}

/// Resolves decoded colors against a [`ColorTable`]
#[derive(Debug, Clone, Copy)]
pub struct ColorResolver<'a> {
    table: &'a ColorTable,
    tolerance: f64,
}

impl<'a> ColorResolver<'a> {
    pub fn new(table: &'a ColorTable) -> Self {
        Self {
            table,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Accept nearest-color matches up to this RGB distance
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance.max(0.0);
        self
    }

    /// Resolve a decoded record, keyed by detailed type then base filament type
    pub fn resolve_record(&self, record: &SpoolRecord) -> ColorResolution<'a> {
        let family = [&record.material_detail, &record.filament_type]
            .into_iter()
            .flatten()
            .find(|name| self.table.family(name).is_some())
            .or(record.material_detail.as_ref())
            .or(record.filament_type.as_ref());

        self.resolve(
            family.map(String::as_str),
            record.color_rgba,
            record.secondary_color_rgba,
        )
    }

    /// Resolve a family and color
    ///
    /// Exact dual-color match, then exact primary match, then nearest primary
    /// within the tolerance. Anything else is [`ColorResolution::Unknown`].
    pub fn resolve(
        &self,
        family: Option<&str>,
        rgba: Option<Rgba>,
        secondary: Option<Rgba>,
    ) -> ColorResolution<'a> {
        let unknown = || ColorResolution::Unknown {
            family: family.map(str::to_string),
            rgba,
            secondary,
        };

        let (Some(name), Some(color)) = (family, rgba) else {
            return unknown();
        };
        let Some(entries) = self.table.family(name) else {
            tracing::debug!(family = name, "material family not in color table");
            return unknown();
        };

        let primary = color.rgb();
        let second = secondary.map(|c| c.rgb());

        if let Some(second) = second {
            if let Some(entry) = entries
                .iter()
                .find(|e| e.primary == primary && e.secondary == Some(second))
            {
                return ColorResolution::Exact {
                    family: name.to_string(),
                    entry,
                };
            }
        }

        let exact = entries
            .iter()
            .filter(|e| e.primary == primary)
            .min_by_key(|e| e.secondary.is_some());
        if let Some(entry) = exact {
            return ColorResolution::Exact {
                family: name.to_string(),
                entry,
            };
        }

        let nearest = entries
            .iter()
            .map(|e| (e, e.primary.distance(&primary)))
            .min_by(|a, b| a.1.total_cmp(&b.1));
        match nearest {
            Some((entry, distance)) if distance <= self.tolerance => {
                tracing::debug!(family = name, color = %entry.name, distance, "nearest color match");
                ColorResolution::Nearest {
                    family: name.to_string(),
                    entry,
                    distance,
                }
            }
            _ => unknown(),
        }
    }
}
