//! CLI argument definitions for spooltag
//!
//! This module contains all clap-derived structs and enums for CLI parsing.

mod core;

pub use self::core::{Cli, Commands, FormatArg, OutputFormat};
