//! Command handlers for the spooltag CLI
//!
//! Each subcommand has its own module with handler functions.

pub mod colors;
pub mod configure;
pub mod decode;

use anyhow::{Context, Result};
use spooltag::ColorTable;
use std::path::Path;

/// Color table compiled into the binary
const BUNDLED_COLORS_JSON: &str = include_str!("../../../../share/filament_colors.json");

/// Load the color table from `path`, or the bundled table when no path is given
///
/// A table that cannot be read or parsed is fatal.
pub fn load_color_table(path: Option<&Path>) -> Result<ColorTable> {
    match path {
        Some(path) => ColorTable::load(path)
            .with_context(|| format!("Failed to load color table {}", path.display())),
        None => ColorTable::from_json(BUNDLED_COLORS_JSON).context("Bundled color table is invalid"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_table_loads() {
        let table = load_color_table(None).unwrap();
        assert!(!table.is_empty());
        let pla = table.family("PLA Basic").unwrap();
        assert!(pla.iter().any(|e| e.name == "Jade White" && e.code == "10100"));
    }

    #[test]
    fn test_missing_table_is_fatal() {
        let err = load_color_table(Some(Path::new("/nonexistent/colors.json"))).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to load color table"));
    }
}
