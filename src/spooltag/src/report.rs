//! Human-readable and JSON reports
//!
//! Absent fields are always printed as [`NOT_PRESENT`], never as zero or
//! blank, so a missing block cannot be mistaken for a decoded zero.

use std::fmt::Write;

use serde::Serialize;

use crate::colors::{ColorResolution, Rgba};
use crate::dump::{DumpFormat, DumpIssue, TagDump, TagHeader};
use crate::layout;
use crate::record::SpoolRecord;

/// Marker printed for absent fields
pub const NOT_PRESENT: &str = "not present";

/// One decoded dump ready for output
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub source: String,
    pub format: DumpFormat,
    pub header: &'a TagHeader,
    pub uid: Option<String>,
    pub blocks_present: usize,
    /// Field-carrying blocks missing from the dump
    pub missing_blocks: Vec<usize>,
    pub issues: &'a [DumpIssue],
    pub record: &'a SpoolRecord,
    pub color: ColorResolution<'a>,
}

impl<'a> Report<'a> {
    pub fn new(
        source: impl Into<String>,
        dump: &'a TagDump,
        record: &'a SpoolRecord,
        color: ColorResolution<'a>,
    ) -> Self {
        Self {
            source: source.into(),
            format: dump.format,
            header: &dump.header,
            uid: dump.uid(),
            blocks_present: dump.block_count(),
            missing_blocks: layout::data_blocks()
                .into_iter()
                .filter(|index| dump.block(*index).is_none())
                .collect(),
            issues: &dump.issues,
            record,
            color,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let r = self.record;

        let _ = writeln!(out, "Parsed {} ({})", self.source, self.format);
        line(&mut out, "UID", self.uid.as_deref());
        line(&mut out, "ATQA", self.header.atqa.as_deref());
        line(&mut out, "SAK", self.header.sak.as_deref());
        line(&mut out, "Card Type", self.header.card_type.as_deref());
        line(&mut out, "Blocks Present", Some(self.blocks_present));
        if !self.missing_blocks.is_empty() {
            let missing: Vec<String> = self.missing_blocks.iter().map(usize::to_string).collect();
            line(&mut out, "Missing Data Blocks", Some(missing.join(", ")));
        }
        out.push('\n');

        line(&mut out, "Material Variant ID", r.material_variant_id.as_deref());
        line(&mut out, "Material ID", r.material_code.as_deref());
        line(&mut out, "Filament Type", r.filament_type.as_deref());
        line(&mut out, "Detailed Filament Type", r.material_detail.as_deref());
        line(&mut out, "Color RGBA", r.color_rgba.as_ref().map(Rgba::hex));
        self.render_color(&mut out);
        if r.color_count.is_some_and(|n| n > 1) {
            line(&mut out, "Second Color RGBA", r.secondary_color_rgba.as_ref().map(Rgba::hex));
        }
        line(&mut out, "Color Count", r.color_count);
        line(&mut out, "Color Format ID", r.color_format_id.map(|id| format!("{:04X}", id)));
        out.push('\n');

        line(&mut out, "Spool Weight", r.spool_weight_g.map(|w| format!("{} g", w)));
        line(&mut out, "Filament Diameter", r.filament_diameter_mm.map(|d| format!("{:.2} mm", d)));
        line(&mut out, "Filament Length", r.filament_length_m.map(|l| format!("{} m", l)));
        line(&mut out, "Spool Width", r.spool_width_mm.map(|w| format!("{:.2} mm", w)));
        line(&mut out, "Nozzle Diameter", r.nozzle_diameter_mm.map(|d| format!("{:.2} mm", d)));
        out.push('\n');

        line(&mut out, "Drying Temperature", r.dry_temperature_c.map(|t| format!("{} °C", t)));
        line(&mut out, "Drying Time", r.dry_time_h.map(|t| format!("{} h", t)));
        line(&mut out, "Bed Temperature Type", r.bed_temperature_type);
        line(&mut out, "Bed Temperature", r.bed_temperature_c.map(|t| format!("{} °C", t)));
        line(
            &mut out,
            "Hotend Temperature",
            r.nozzle_temperature_range_c
                .map(|range| format!("{}-{} °C", range.min, range.max)),
        );
        out.push('\n');

        line(&mut out, "Production Date", self.production_date());
        line(&mut out, "Short Production Date", r.short_production_date.as_deref());
        line(&mut out, "Tray UID", r.tray_uid.as_deref());
        line(&mut out, "X-Cam Info", r.xcam_info.as_deref());

        if !self.issues.is_empty() {
            out.push('\n');
            let _ = writeln!(out, "Warnings:");
            for issue in self.issues {
                let _ = writeln!(out, "  - {}", issue);
            }
        }

        out
    }

    fn render_color(&self, out: &mut String) {
        match &self.color {
            ColorResolution::Exact { entry, .. } => {
                line(out, "Color Name", Some(&entry.name));
                line(out, "Color Code", Some(&entry.code));
            }
            ColorResolution::Nearest { entry, distance, .. } => {
                line(
                    out,
                    "Color Name",
                    Some(format!("{} (nearest, distance {:.1})", entry.name, distance)),
                );
                line(out, "Color Code", Some(&entry.code));
            }
            ColorResolution::Unknown { family, .. } => {
                let name = match family {
                    Some(family) => format!("unknown ({} not matched in color table)", family),
                    None => "unknown (no material type)".to_string(),
                };
                line(out, "Color Name", Some(name));
                line(out, "Color Code", Some("unknown"));
            }
        }
    }

    /// Parsed timestamp, or the raw string when it does not parse
    fn production_date(&self) -> Option<String> {
        let r = self.record;
        match (&r.production_timestamp, &r.production_datetime_raw) {
            (Some(ts), _) => Some(ts.to_string()),
            (None, Some(raw)) if !raw.is_empty() => Some(format!("{} (unparsed)", raw)),
            _ => None,
        }
    }
}

fn line<T: std::fmt::Display>(out: &mut String, label: &str, value: Option<T>) {
    let _ = match value {
        Some(value) => writeln!(out, "{:<24}{}", format!("{}:", label), value),
        None => writeln!(out, "{:<24}{}", format!("{}:", label), NOT_PRESENT),
    };
}
