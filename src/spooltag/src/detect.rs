//! Dump format detection
//!
//! An explicit hint always wins. Otherwise the file extension is checked,
//! then the leading content, then the size.

use std::path::Path;

use crate::dump::{flipper, proxmark, DumpError, DumpFormat, BLOCK_SIZE};

/// Extensions written by each capture tool
const EXTENSIONS: &[(&str, DumpFormat)] = &[
    ("nfc", DumpFormat::Flipper),
    ("bin", DumpFormat::Proxmark),
    ("dump", DumpFormat::Proxmark),
    ("json", DumpFormat::Proxmark),
];

/// Lines inspected when sniffing for a textual dump
const SNIFF_LINES: usize = 32;

/// Extensions recognized as dump files
pub fn dump_extensions() -> impl Iterator<Item = &'static str> {
    EXTENSIONS.iter().map(|(ext, _)| *ext)
}

/// Pick the decoding strategy for a dump
pub fn detect(
    path: &Path,
    content: &[u8],
    hint: Option<DumpFormat>,
) -> Result<DumpFormat, DumpError> {
    if let Some(format) = hint {
        tracing::debug!(%format, "using explicit format");
        return Ok(format);
    }

    if let Some(format) = from_extension(path) {
        tracing::debug!(%format, path = %path.display(), "format from extension");
        return Ok(format);
    }

    if let Some(format) = from_content(content) {
        tracing::debug!(%format, "format from content signature");
        return Ok(format);
    }

    if !content.is_empty() && content.len() % BLOCK_SIZE == 0 {
        tracing::debug!(len = content.len(), "size is a whole number of blocks, assuming binary");
        return Ok(DumpFormat::Proxmark);
    }

    Err(DumpError::UnrecognizedFormat(path.display().to_string()))
}

fn from_extension(path: &Path) -> Option<DumpFormat> {
    let ext = path.extension()?.to_str()?;
    EXTENSIONS
        .iter()
        .find(|(known, _)| ext.eq_ignore_ascii_case(known))
        .map(|(_, format)| *format)
}

fn from_content(content: &[u8]) -> Option<DumpFormat> {
    if proxmark::looks_like_json(content) {
        return Some(DumpFormat::Proxmark);
    }

    let text = std::str::from_utf8(content).ok()?;
    let textual = text
        .lines()
        .take(SNIFF_LINES)
        .any(|line| line.trim() == flipper::FILETYPE_SIGNATURE || flipper::is_block_line(line));
    textual.then_some(DumpFormat::Flipper)
}
