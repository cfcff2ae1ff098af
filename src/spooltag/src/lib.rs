//! # spooltag
//!
//! Filament spool RFID tag decoder.
//!
//! This library provides functionality to:
//! - Detect and assemble Flipper Zero (`.nfc`) and Proxmark3 (`.bin`, `.json`) dumps
//! - Decode the Bambu Lab spool memory layout (material, color, weight, dates, temperatures)
//! - Resolve colors against a material/color lookup table
//! - Render text or JSON reports
//!
//! ## Example
//!
//! ```no_run
//! use std::fs;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let path = Path::new("spool.nfc");
//! let content = fs::read(path)?;
//! let table = spooltag::ColorTable::load(Path::new("filament_colors.json"))?;
//!
//! let (dump, record) = spooltag::decode(path, &content, None)?;
//! let color = spooltag::ColorResolver::new(&table).resolve_record(&record);
//!
//! println!("{}", spooltag::Report::new("spool.nfc", &dump, &record, color).render_text());
//! # Ok(())
//! # }
//! ```

pub mod colors;
pub mod detect;
pub mod dump;
pub mod layout;
pub mod record;
pub mod report;

use std::path::Path;

#[doc(inline)]
pub use colors::{
    ColorEntry, ColorResolution, ColorResolver, ColorTable, ColorTableError, Rgb, Rgba,
    DEFAULT_TOLERANCE,
};
#[doc(inline)]
pub use detect::detect;
#[doc(inline)]
pub use dump::{
    assemble, Block, DumpError, DumpFormat, DumpIssue, TagDump, TagHeader, BLOCK_SIZE,
    TAG_CAPACITY,
};
#[doc(inline)]
pub use layout::{Encoding, Field, FieldLayout, SPOOL_LAYOUT};
#[doc(inline)]
pub use record::{ProductionTimestamp, SpoolRecord, TemperatureRange};
#[doc(inline)]
pub use report::{Report, NOT_PRESENT};

/// Detect, assemble and decode a dump in one step
pub fn decode(
    path: &Path,
    content: &[u8],
    hint: Option<DumpFormat>,
) -> Result<(TagDump, SpoolRecord), DumpError> {
    let format = detect(path, content, hint)?;
    let dump = assemble(content, format)?;
    let record = SpoolRecord::decode(&dump);
    Ok((dump, record))
}
