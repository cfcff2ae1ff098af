//! Dump decode command handlers

use anyhow::{bail, Context, Result};
use spooltag::{ColorResolver, ColorTable, DumpFormat, Report};
use std::fs;
use std::path::Path;

use crate::cli::OutputFormat;
use crate::file_utils;

/// Decode options shared by every file in a run
#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    pub format: Option<DumpFormat>,
    pub tolerance: f64,
    pub output: OutputFormat,
}

/// Decode a single dump, or every dump below a directory
///
/// In directory mode a failing file is reported and skipped; the command
/// still fails at the end if any file could not be decoded.
pub fn handle(path: &Path, table: &ColorTable, options: DecodeOptions) -> Result<()> {
    if !path.is_dir() {
        print!("{}", render_file(path, table, options, false)?);
        return Ok(());
    }

    let files = file_utils::collect_dump_files(path)?;
    if files.is_empty() {
        bail!("No dump files found under {}", path.display());
    }

    let mut failures = 0;
    for (i, file) in files.iter().enumerate() {
        match render_file(file, table, options, true) {
            Ok(text) => {
                if i > 0 && options.output == OutputFormat::Text {
                    println!();
                }
                print!("{}", text);
            }
            Err(e) => {
                eprintln!("Error: {:#}", e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!("{} of {} dumps failed to decode", failures, files.len());
    }
    Ok(())
}

/// Decode one file and render its report
///
/// `compact` selects one JSON document per line, for directory runs.
fn render_file(
    path: &Path,
    table: &ColorTable,
    options: DecodeOptions,
    compact: bool,
) -> Result<String> {
    let content = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let (dump, record) = spooltag::decode(path, &content, options.format)
        .with_context(|| format!("Failed to decode {}", path.display()))?;

    let color = ColorResolver::new(table)
        .with_tolerance(options.tolerance)
        .resolve_record(&record);
    let report = Report::new(path.display().to_string(), &dump, &record, color);

    let rendered = match options.output {
        OutputFormat::Text => report.render_text(),
        OutputFormat::Json if compact => serde_json::to_string(&report)? + "\n",
        OutputFormat::Json => report.to_json()? + "\n",
    };
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = "Filetype: Flipper NFC device
Version: 4
UID: 75 88 6B 1D
Mifare Classic type: 1K
Block 0: 75 88 6B 1D 8B 08 04 00 04 5B 13 6F 5F 57 7D 90
Block 4: 50 4C 41 20 42 61 73 69 63 00 00 00 00 00 00 00
Block 5: C1 2E 1F FF E8 03 00 00 00 00 E0 3F 00 00 00 00
Block 6: 37 00 08 00 01 00 23 00 E6 00 BE 00 00 00 00 00
";

    fn options(output: OutputFormat) -> DecodeOptions {
        DecodeOptions {
            format: None,
            tolerance: spooltag::DEFAULT_TOLERANCE,
            output,
        }
    }

    #[test]
    fn test_render_text_with_bundled_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("red.nfc");
        fs::write(&path, DUMP).unwrap();
        let table = crate::commands::load_color_table(None).unwrap();

        let text = render_file(&path, &table, options(OutputFormat::Text), false).unwrap();
        assert!(text.contains("Detailed Filament Type: PLA Basic"));
        assert!(text.contains("Color Name:             Red"));
        assert!(text.contains("Color Code:             10200"));
        assert!(text.contains("Hotend Temperature:     190-230 °C"));
        assert!(text.contains("Filament Length:        not present"));
    }

    #[test]
    fn test_render_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("red.nfc");
        fs::write(&path, DUMP).unwrap();
        let table = ColorTable::default();

        let json = render_file(&path, &table, options(OutputFormat::Json), false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["record"]["dry_temperature_c"], 55);
        assert_eq!(value["color"]["match"], "unknown");
        assert_eq!(value["color"]["rgba"]["r"], 0xC1);
    }

    #[test]
    fn test_unrecognized_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "hello").unwrap();

        let err = render_file(&path, &ColorTable::default(), options(OutputFormat::Text), false)
            .unwrap_err();
        assert!(format!("{:#}", err).contains("Unrecognized dump format"));
    }

    #[test]
    fn test_directory_with_one_bad_dump_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("good.nfc"), DUMP).unwrap();
        fs::write(dir.path().join("empty.bin"), b"").unwrap();

        let result = handle(dir.path(), &ColorTable::default(), options(OutputFormat::Json));
        assert!(result.is_err());
    }
}
