//! Color table listing

use anyhow::{Context, Result};
use spooltag::{ColorEntry, ColorTable};
use std::fmt::Write;

/// Print the table, or a single family when `material` is given
pub fn list(table: &ColorTable, material: Option<&str>) -> Result<()> {
    print!("{}", render(table, material)?);
    Ok(())
}

fn render(table: &ColorTable, material: Option<&str>) -> Result<String> {
    let mut out = String::new();

    match material {
        Some(name) => {
            let entries = table
                .family(name)
                .with_context(|| format!("Material '{}' not found in color table", name))?;
            render_family(&mut out, name, entries);
        }
        None => {
            for (name, entries) in table.families() {
                render_family(&mut out, name, entries);
            }
        }
    }

    Ok(out)
}

fn render_family(out: &mut String, name: &str, entries: &[ColorEntry]) {
    let _ = writeln!(out, "{} ({} colors)", name, entries.len());
    for entry in entries {
        let _ = writeln!(out, "  {:<14} {:<8} {}", entry.hex(), entry.code, entry.name);
    }
}
