//! Spool record decoding
//!
//! Reads every field of [`SPOOL_LAYOUT`](crate::layout::SPOOL_LAYOUT) out of a
//! [`TagDump`]. A field is `None` only when its bytes are missing from the dump
//! (block absent or unread); values that are merely implausible are returned
//! as decoded.

use byteorder::{LittleEndian as LE, ReadBytesExt};
use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use crate::colors::Rgba;
use crate::dump::TagDump;
use crate::layout::{layout_of, Encoding, Field};

/// A decoded field value before it is placed in a typed record slot
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Unsigned(u16),
    Decimal(f64),
    Float(f32),
    Color(Rgba),
    Bytes(Vec<u8>),
}

impl Encoding {
    /// Decode bytes already cut to the field's width
    ///
    /// Returns `None` if fewer bytes than the encoding needs were supplied.
    pub fn decode(&self, bytes: &[u8]) -> Option<FieldValue> {
        let mut reader = bytes;
        let value = match self {
            Encoding::Ascii => FieldValue::Text(decode_ascii(bytes)),
            Encoding::U16Le => FieldValue::Unsigned(reader.read_u16::<LE>().ok()?),
            Encoding::Fixed16Le { divisor } => {
                let raw = reader.read_u16::<LE>().ok()?;
                FieldValue::Decimal(f64::from(raw) / f64::from((*divisor).max(1)))
            }
            Encoding::F32Le => FieldValue::Float(reader.read_f32::<LE>().ok()?),
            Encoding::Rgba => {
                let [r, g, b, a] = four_bytes(bytes)?;
                FieldValue::Color(Rgba::new(r, g, b, a))
            }
            Encoding::Abgr => {
                let [a, b, g, r] = four_bytes(bytes)?;
                FieldValue::Color(Rgba::new(r, g, b, a))
            }
            Encoding::Hex => FieldValue::Bytes(bytes.to_vec()),
        };
        Some(value)
    }
}

fn four_bytes(bytes: &[u8]) -> Option<[u8; 4]> {
    bytes.get(..4)?.try_into().ok()
}

/// Decode NUL-padded ASCII, escaping anything non-printable as `\xNN`
pub fn decode_ascii(bytes: &[u8]) -> String {
    let end = bytes
        .iter()
        .rposition(|b| *b != 0)
        .map_or(0, |last| last + 1);

    let mut out = String::with_capacity(end);
    for &b in &bytes[..end] {
        if b.is_ascii_graphic() || b == b' ' {
            out.push(char::from(b));
        } else {
            out.push_str(&format!("\\x{:02x}", b));
        }
    }
    out
}

/// Read one field from a dump
pub fn read_field(dump: &TagDump, field: Field) -> Option<FieldValue> {
    let layout = layout_of(field)?;
    let bytes = dump.block(layout.block)?.range(layout.offset, layout.width)?;
    layout.encoding.decode(bytes)
}

fn text(dump: &TagDump, field: Field) -> Option<String> {
    match read_field(dump, field)? {
        FieldValue::Text(s) => Some(s),
        _ => None,
    }
}

fn unsigned(dump: &TagDump, field: Field) -> Option<u16> {
    match read_field(dump, field)? {
        FieldValue::Unsigned(v) => Some(v),
        _ => None,
    }
}

fn decimal(dump: &TagDump, field: Field) -> Option<f64> {
    match read_field(dump, field)? {
        FieldValue::Decimal(v) => Some(v),
        _ => None,
    }
}

fn float(dump: &TagDump, field: Field) -> Option<f32> {
    match read_field(dump, field)? {
        FieldValue::Float(v) => Some(v),
        _ => None,
    }
}

fn color(dump: &TagDump, field: Field) -> Option<Rgba> {
    match read_field(dump, field)? {
        FieldValue::Color(c) => Some(c),
        _ => None,
    }
}

fn hex_bytes(dump: &TagDump, field: Field) -> Option<String> {
    match read_field(dump, field)? {
        FieldValue::Bytes(b) => Some(hex::encode_upper(b)),
        _ => None,
    }
}

/// Recommended hotend temperature window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TemperatureRange {
    pub min: u16,
    pub max: u16,
}

/// Production date with an optional time of day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProductionTimestamp {
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
}

impl ProductionTimestamp {
    /// Parse `YYYY_MM_DD_HH_MM`; hour and minute may be missing
    ///
    /// Returns `None` for blank, all-zero or out-of-range dates.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw
            .trim_matches(|c: char| c == '\0' || c.is_whitespace())
            .split(['_', '-', ' ', ':'])
            .filter(|p| !p.is_empty())
            .map(|p| p.parse::<u32>().ok());

        let year = parts.next()??;
        let month = parts.next()??;
        let day = parts.next()??;
        let date = NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)?;

        let time = match (parts.next().flatten(), parts.next().flatten()) {
            (Some(hour), Some(minute)) => NaiveTime::from_hms_opt(hour, minute, 0),
            (Some(hour), None) => NaiveTime::from_hms_opt(hour, 0, 0),
            _ => None,
        };

        Some(Self { date, time })
    }
}

impl std::fmt::Display for ProductionTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.time {
            Some(time) => write!(f, "{} {}", self.date.format("%Y-%m-%d"), time.format("%H:%M")),
            None => write!(f, "{}", self.date.format("%Y-%m-%d")),
        }
    }
}

/// Everything decoded from a spool tag
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpoolRecord {
    /// Material variant, e.g. `A00-K0`
    pub material_variant_id: Option<String>,
    /// Material code, e.g. `GFA00`
    pub material_code: Option<String>,
    /// Base filament type, e.g. `PLA`
    pub filament_type: Option<String>,
    /// Detailed filament type, e.g. `PLA Basic`
    pub material_detail: Option<String>,
    pub color_rgba: Option<Rgba>,
    pub spool_weight_g: Option<u16>,
    pub filament_diameter_mm: Option<f32>,
    pub dry_temperature_c: Option<u16>,
    pub dry_time_h: Option<u16>,
    pub bed_temperature_type: Option<u16>,
    pub bed_temperature_c: Option<u16>,
    pub nozzle_temperature_range_c: Option<TemperatureRange>,
    pub xcam_info: Option<String>,
    pub nozzle_diameter_mm: Option<f32>,
    pub tray_uid: Option<String>,
    pub spool_width_mm: Option<f64>,
    pub production_datetime_raw: Option<String>,
    pub production_timestamp: Option<ProductionTimestamp>,
    pub short_production_date: Option<String>,
    pub filament_length_m: Option<u16>,
    pub color_format_id: Option<u16>,
    pub color_count: Option<u16>,
    /// Second color of a multi-color spool, only when `color_count > 1`
    pub secondary_color_rgba: Option<Rgba>,
}

impl SpoolRecord {
    pub fn decode(dump: &TagDump) -> Self {
        let nozzle_temperature_range_c = match (
            unsigned(dump, Field::HotendMinTemperature),
            unsigned(dump, Field::HotendMaxTemperature),
        ) {
            (Some(min), Some(max)) => Some(TemperatureRange { min, max }),
            _ => None,
        };

        let production_datetime_raw = text(dump, Field::ProductionDateTime);
        let production_timestamp = production_datetime_raw
            .as_deref()
            .and_then(ProductionTimestamp::parse);

        let color_count = unsigned(dump, Field::ColorCount);
        let secondary_color_rgba = match color_count {
            Some(count) if count > 1 => color(dump, Field::SecondaryColor),
            _ => None,
        };

        Self {
            material_variant_id: text(dump, Field::MaterialVariantId),
            material_code: text(dump, Field::MaterialId),
            filament_type: text(dump, Field::FilamentType),
            material_detail: text(dump, Field::DetailedFilamentType),
            color_rgba: color(dump, Field::Color),
            spool_weight_g: unsigned(dump, Field::SpoolWeight),
            filament_diameter_mm: float(dump, Field::FilamentDiameter),
            dry_temperature_c: unsigned(dump, Field::DryingTemperature),
            dry_time_h: unsigned(dump, Field::DryingTime),
            bed_temperature_type: unsigned(dump, Field::BedTemperatureType),
            bed_temperature_c: unsigned(dump, Field::BedTemperature),
            nozzle_temperature_range_c,
            xcam_info: hex_bytes(dump, Field::XCamInfo),
            nozzle_diameter_mm: float(dump, Field::NozzleDiameter),
            tray_uid: hex_bytes(dump, Field::TrayUid),
            spool_width_mm: decimal(dump, Field::SpoolWidth),
            production_datetime_raw,
            production_timestamp,
            short_production_date: text(dump, Field::ShortProductionDate),
            filament_length_m: unsigned(dump, Field::FilamentLength),
            color_format_id: unsigned(dump, Field::ColorFormatId),
            color_count,
            secondary_color_rgba,
        }
    }

    /// Whether nothing at all could be decoded
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dump::{assemble, Block, DumpFormat, BLOCK_SIZE, TAG_CAPACITY};
    use crate::layout::{FieldLayout, SPOOL_LAYOUT};

    /// Write a value at its layout position
    fn put(image: &mut [u8], field: Field, value: &[u8]) {
        let layout: &FieldLayout = layout_of(field).unwrap();
        let start = layout.block * BLOCK_SIZE + layout.offset;
        image[start..start + value.len()].copy_from_slice(value);
    }

    fn ascii(s: &str, width: usize) -> Vec<u8> {
        let mut bytes = s.as_bytes().to_vec();
        bytes.resize(width, 0);
        bytes
    }

    fn sample_record() -> SpoolRecord {
        SpoolRecord {
            material_variant_id: Some("A00-K0".to_string()),
            material_code: Some("GFA00".to_string()),
            filament_type: Some("PLA".to_string()),
            material_detail: Some("PLA Basic".to_string()),
            color_rgba: Some(Rgba::new(0xC1, 0x2E, 0x1F, 0xFF)),
            spool_weight_g: Some(1000),
            filament_diameter_mm: Some(1.75),
            dry_temperature_c: Some(55),
            dry_time_h: Some(8),
            bed_temperature_type: Some(1),
            bed_temperature_c: Some(35),
            nozzle_temperature_range_c: Some(TemperatureRange { min: 190, max: 230 }),
            xcam_info: Some("34218813F401E8030000AF3F".to_string()),
            nozzle_diameter_mm: Some(0.2),
            tray_uid: Some("5F2F38A5C8364A47A2F3C4A6E87B8E21".to_string()),
            spool_width_mm: Some(66.25),
            production_datetime_raw: Some("2024_03_15_10_42".to_string()),
            production_timestamp: ProductionTimestamp::parse("2024_03_15_10_42"),
            short_production_date: Some("24_03_15".to_string()),
            filament_length_m: Some(330),
            color_format_id: Some(2),
            color_count: Some(2),
            secondary_color_rgba: Some(Rgba::new(0x00, 0x56, 0xB8, 0xFF)),
        }
    }

    /// Lay a record out as a full binary image
    fn encode(record: &SpoolRecord) -> Vec<u8> {
        let mut image = vec![0u8; TAG_CAPACITY * BLOCK_SIZE];
        let s = |v: &Option<String>, f: Field| ascii(v.as_deref().unwrap(), layout_of(f).unwrap().width);
        let u = |v: Option<u16>| v.unwrap().to_le_bytes();

        put(&mut image, Field::MaterialVariantId, &s(&record.material_variant_id, Field::MaterialVariantId));
        put(&mut image, Field::MaterialId, &s(&record.material_code, Field::MaterialId));
        put(&mut image, Field::FilamentType, &s(&record.filament_type, Field::FilamentType));
        put(&mut image, Field::DetailedFilamentType, &s(&record.material_detail, Field::DetailedFilamentType));

        let c = record.color_rgba.unwrap();
        put(&mut image, Field::Color, &[c.r, c.g, c.b, c.a]);
        put(&mut image, Field::SpoolWeight, &u(record.spool_weight_g));
        put(&mut image, Field::FilamentDiameter, &record.filament_diameter_mm.unwrap().to_le_bytes());

        put(&mut image, Field::DryingTemperature, &u(record.dry_temperature_c));
        put(&mut image, Field::DryingTime, &u(record.dry_time_h));
        put(&mut image, Field::BedTemperatureType, &u(record.bed_temperature_type));
        put(&mut image, Field::BedTemperature, &u(record.bed_temperature_c));
        let range = record.nozzle_temperature_range_c.unwrap();
        put(&mut image, Field::HotendMaxTemperature, &range.max.to_le_bytes());
        put(&mut image, Field::HotendMinTemperature, &range.min.to_le_bytes());

        put(&mut image, Field::XCamInfo, &hex::decode(record.xcam_info.as_deref().unwrap()).unwrap());
        put(&mut image, Field::NozzleDiameter, &record.nozzle_diameter_mm.unwrap().to_le_bytes());
        put(&mut image, Field::TrayUid, &hex::decode(record.tray_uid.as_deref().unwrap()).unwrap());

        let width = (record.spool_width_mm.unwrap() * 100.0).round() as u16;
        put(&mut image, Field::SpoolWidth, &width.to_le_bytes());
        put(&mut image, Field::ProductionDateTime, &s(&record.production_datetime_raw, Field::ProductionDateTime));
        put(&mut image, Field::ShortProductionDate, &s(&record.short_production_date, Field::ShortProductionDate));
        put(&mut image, Field::FilamentLength, &u(record.filament_length_m));

        put(&mut image, Field::ColorFormatId, &u(record.color_format_id));
        put(&mut image, Field::ColorCount, &u(record.color_count));
        let c2 = record.secondary_color_rgba.unwrap();
        put(&mut image, Field::SecondaryColor, &[c2.a, c2.b, c2.g, c2.r]);

        image
    }

    #[test]
    fn test_record_roundtrip() {
        let record = sample_record();
        let dump = assemble(&encode(&record), DumpFormat::Proxmark).unwrap();

        assert_eq!(SpoolRecord::decode(&dump), record);
    }

    #[test]
    fn test_primary_color_document_order() {
        let mut image = vec![0u8; 6 * BLOCK_SIZE];
        put(&mut image, Field::Color, &[255, 0, 0, 255]);
        let dump = assemble(&image, DumpFormat::Proxmark).unwrap();

        let record = SpoolRecord::decode(&dump);
        assert_eq!(record.color_rgba, Some(Rgba::new(255, 0, 0, 255)));
    }

    #[test]
    fn test_truncated_dump_fields_absent_not_zero() {
        let mut image = encode(&sample_record());
        image.truncate(5 * BLOCK_SIZE + 7);
        let dump = assemble(&image, DumpFormat::Proxmark).unwrap();
        let record = SpoolRecord::decode(&dump);

        assert!(dump.is_truncated());
        assert_eq!(record.material_detail.as_deref(), Some("PLA Basic"));
        assert_eq!(record.color_rgba, None);
        assert_eq!(record.spool_weight_g, None);
        assert_eq!(record.dry_temperature_c, None);
        assert_eq!(record.production_timestamp, None);
        assert_eq!(record.filament_length_m, None);
        assert_eq!(record.secondary_color_rgba, None);
    }

    #[test]
    fn test_every_layout_field_absent_without_blocks() {
        let mut dump = crate::dump::TagDump::new(DumpFormat::Flipper);
        dump.insert(0, Block::new([0xFF; BLOCK_SIZE]));

        for layout in SPOOL_LAYOUT {
            assert_eq!(read_field(&dump, layout.field), None, "{:?}", layout.field);
        }
        assert!(SpoolRecord::decode(&dump).is_empty());
    }

    #[test]
    fn test_unread_bytes_make_field_absent() {
        let mut bytes = [0u8; BLOCK_SIZE];
        bytes[4..6].copy_from_slice(&1000u16.to_le_bytes());
        let mut dump = crate::dump::TagDump::new(DumpFormat::Flipper);
        dump.insert(5, Block::with_unread(bytes, 0b0000_0000_0000_0001));

        let record = SpoolRecord::decode(&dump);
        assert_eq!(record.color_rgba, None);
        assert_eq!(record.spool_weight_g, Some(1000));
    }

    #[test]
    fn test_single_color_skips_secondary() {
        let mut image = encode(&sample_record());
        put(&mut image, Field::ColorCount, &1u16.to_le_bytes());
        let dump = assemble(&image, DumpFormat::Proxmark).unwrap();

        let record = SpoolRecord::decode(&dump);
        assert_eq!(record.color_count, Some(1));
        assert_eq!(record.secondary_color_rgba, None);
    }

    #[test]
    fn test_short_input_does_not_decode() {
        assert_eq!(Encoding::U16Le.decode(&[0x01]), None);
        assert_eq!(Encoding::F32Le.decode(&[0, 0, 0]), None);
        assert_eq!(Encoding::Abgr.decode(&[1, 2, 3]), None);
        assert_eq!(
            Encoding::Abgr.decode(&[0xFF, 0xB8, 0x56, 0x00]),
            Some(FieldValue::Color(Rgba::new(0x00, 0x56, 0xB8, 0xFF)))
        );
        assert_eq!(
            Encoding::Fixed16Le { divisor: 100 }.decode(&6625u16.to_le_bytes()),
            Some(FieldValue::Decimal(66.25))
        );
    }

    #[test]
    fn test_decode_ascii_degrades() {
        assert_eq!(decode_ascii(b"PLA\0\0\0"), "PLA");
        assert_eq!(decode_ascii(b"PL\xE9A\0"), "PL\\xe9A");
        assert_eq!(decode_ascii(b"\0\0\0"), "");
        assert_eq!(decode_ascii(b"PLA 'Silk' \\ \"x\""), "PLA 'Silk' \\ \"x\"");
        assert_eq!(decode_ascii(b"A\tB\0C\0"), "A\\x09B\\x00C");
    }

    #[test]
    fn test_zero_values_are_present() {
        let image = vec![0u8; TAG_CAPACITY * BLOCK_SIZE];
        let dump = assemble(&image, DumpFormat::Proxmark).unwrap();
        let record = SpoolRecord::decode(&dump);

        assert_eq!(record.spool_weight_g, Some(0));
        assert_eq!(record.color_rgba, Some(Rgba::new(0, 0, 0, 0)));
        assert_eq!(record.spool_width_mm, Some(0.0));
        // An all-zero date is not a date
        assert_eq!(record.production_datetime_raw.as_deref(), Some(""));
        assert_eq!(record.production_timestamp, None);
    }

    #[test]
    fn test_production_timestamp_parse() {
        let ts = ProductionTimestamp::parse("2024_03_15_10_42").unwrap();
        assert_eq!(ts.date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(ts.time, NaiveTime::from_hms_opt(10, 42, 0));
        assert_eq!(ts.to_string(), "2024-03-15 10:42");

        let partial = ProductionTimestamp::parse("2024_03_15").unwrap();
        assert_eq!(partial.time, None);
        assert_eq!(partial.to_string(), "2024-03-15");

        let bad_time = ProductionTimestamp::parse("2024_03_15_99_00").unwrap();
        assert_eq!(bad_time.time, None);

        assert_eq!(ProductionTimestamp::parse("0000_00_00_00_00"), None);
        assert_eq!(ProductionTimestamp::parse("2024_13_01_00_00"), None);
        assert_eq!(ProductionTimestamp::parse(""), None);
        assert_eq!(ProductionTimestamp::parse("garbage"), None);
    }
}
