//! Bambu Lab spool tag memory layout
//!
//! Every decoded field lives at a fixed block, offset and width. The table is
//! pure data; [`crate::record`] interprets it.

/// Semantic fields stored on a spool tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    MaterialVariantId,
    MaterialId,
    FilamentType,
    DetailedFilamentType,
    Color,
    SpoolWeight,
    FilamentDiameter,
    DryingTemperature,
    DryingTime,
    BedTemperatureType,
    BedTemperature,
    HotendMaxTemperature,
    HotendMinTemperature,
    XCamInfo,
    NozzleDiameter,
    TrayUid,
    SpoolWidth,
    ProductionDateTime,
    ShortProductionDate,
    FilamentLength,
    ColorFormatId,
    ColorCount,
    SecondaryColor,
}

/// How a field's bytes are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// NUL-padded ASCII text
    Ascii,
    /// Little-endian u16
    U16Le,
    /// Little-endian u16 fixed point, value = raw / divisor
    Fixed16Le { divisor: u16 },
    /// Little-endian IEEE-754 single
    F32Le,
    /// Four bytes in R, G, B, A order
    Rgba,
    /// Four bytes in A, B, G, R order
    Abgr,
    /// Opaque bytes shown as hex
    Hex,
}

impl Encoding {
    /// Width in bytes, or `None` when the encoding accepts any width
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            Encoding::Ascii | Encoding::Hex => None,
            Encoding::U16Le | Encoding::Fixed16Le { .. } => Some(2),
            Encoding::F32Le | Encoding::Rgba | Encoding::Abgr => Some(4),
        }
    }
}

/// Location and encoding of one field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    pub field: Field,
    pub block: usize,
    pub offset: usize,
    pub width: usize,
    pub encoding: Encoding,
}

const fn at(field: Field, block: usize, offset: usize, width: usize, encoding: Encoding) -> FieldLayout {
    FieldLayout {
        field,
        block,
        offset,
        width,
        encoding,
    }
}

/// Field table for Bambu Lab MIFARE Classic 1K spool tags
pub const SPOOL_LAYOUT: &[FieldLayout] = &[
    at(Field::MaterialVariantId, 1, 0, 8, Encoding::Ascii),
    at(Field::MaterialId, 1, 8, 8, Encoding::Ascii),
    at(Field::FilamentType, 2, 0, 16, Encoding::Ascii),
    at(Field::DetailedFilamentType, 4, 0, 16, Encoding::Ascii),
    at(Field::Color, 5, 0, 4, Encoding::Rgba),
    at(Field::SpoolWeight, 5, 4, 2, Encoding::U16Le),
    at(Field::FilamentDiameter, 5, 8, 4, Encoding::F32Le),
    at(Field::DryingTemperature, 6, 0, 2, Encoding::U16Le),
    at(Field::DryingTime, 6, 2, 2, Encoding::U16Le),
    at(Field::BedTemperatureType, 6, 4, 2, Encoding::U16Le),
    at(Field::BedTemperature, 6, 6, 2, Encoding::U16Le),
    at(Field::HotendMaxTemperature, 6, 8, 2, Encoding::U16Le),
    at(Field::HotendMinTemperature, 6, 10, 2, Encoding::U16Le),
    at(Field::XCamInfo, 8, 0, 12, Encoding::Hex),
    at(Field::NozzleDiameter, 8, 12, 4, Encoding::F32Le),
    at(Field::TrayUid, 9, 0, 16, Encoding::Hex),
    at(Field::SpoolWidth, 10, 4, 2, Encoding::Fixed16Le { divisor: 100 }),
    at(Field::ProductionDateTime, 12, 0, 16, Encoding::Ascii),
    at(Field::ShortProductionDate, 13, 0, 16, Encoding::Ascii),
    at(Field::FilamentLength, 14, 4, 2, Encoding::U16Le),
    at(Field::ColorFormatId, 16, 0, 2, Encoding::U16Le),
    at(Field::ColorCount, 16, 2, 2, Encoding::U16Le),
    at(Field::SecondaryColor, 16, 4, 4, Encoding::Abgr),
];

/// Layout entry for a field
pub fn layout_of(field: Field) -> Option<&'static FieldLayout> {
    SPOOL_LAYOUT.iter().find(|l| l.field == field)
}

/// Blocks that carry at least one field
pub fn data_blocks() -> Vec<usize> {
    let mut blocks: Vec<usize> = SPOOL_LAYOUT.iter().map(|l| l.block).collect();
    blocks.dedup();
    blocks
}
