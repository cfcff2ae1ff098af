//! Configuration command handlers
//!
//! Handles the `configure` subcommand for setting up spooltag CLI defaults.

use crate::config::Config;
use anyhow::{bail, Result};
use std::path::PathBuf;

/// Handle the configure command
///
/// # Arguments
/// * `colors_json` - Optional color table to use by default
/// * `tolerance` - Optional default nearest-color tolerance
/// * `show` - If true, show current configuration
pub fn handle(colors_json: Option<PathBuf>, tolerance: Option<f64>, show: bool) -> Result<()> {
    let mut config = Config::load()?;

    if show {
        show_config(&config);
        return Ok(());
    }

    if colors_json.is_none() && tolerance.is_none() {
        show_usage();
        return Ok(());
    }

    apply(&mut config, colors_json, tolerance)?;
    config.save()?;

    if let Ok(path) = Config::config_path() {
        println!("Config saved to: {}", path.display());
    }

    Ok(())
}

/// Update configuration values, validating them first
fn apply(config: &mut Config, colors_json: Option<PathBuf>, tolerance: Option<f64>) -> Result<()> {
    if let Some(tolerance) = tolerance {
        if !tolerance.is_finite() || tolerance < 0.0 {
            bail!("Tolerance must be a non-negative number, got {}", tolerance);
        }
        config.set_tolerance(tolerance);
        println!("Tolerance configured: {}", tolerance);
    }

    if let Some(path) = colors_json {
        // Fail now rather than on the next decode
        super::load_color_table(Some(&path))?;
        println!("Color table configured: {}", path.display());
        config.set_colors_json(path);
    }

    Ok(())
}

/// Display current configuration
fn show_config(config: &Config) {
    match config.get_colors_json() {
        Some(path) => println!("Color table: {}", path.display()),
        None => println!("Color table: bundled"),
    }

    match config.get_tolerance() {
        Some(tolerance) => println!("Tolerance: {}", tolerance),
        None => println!("Tolerance: {} (default)", spooltag::DEFAULT_TOLERANCE),
    }

    if let Ok(path) = Config::config_path() {
        println!("Config file: {}", path.display());
    }
}

/// Show usage help for the configure command
fn show_usage() {
    println!("Usage: spooltag configure --colors-json PATH");
    println!("   or: spooltag configure --tolerance DISTANCE");
    println!("   or: spooltag configure --show");
}
