//! Core CLI definitions

use clap::{Parser, Subcommand};
use spooltag::DumpFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "spooltag")]
#[command(about = "Filament spool RFID tag dump decoder", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Dump format override
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FormatArg {
    /// Flipper Zero .nfc text dump
    Flipper,
    /// Proxmark3 binary or JSON dump
    Proxmark,
}

impl From<FormatArg> for DumpFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Flipper => DumpFormat::Flipper,
            FormatArg::Proxmark => DumpFormat::Proxmark,
        }
    }
}

/// Output format for decode reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Decode a tag dump (or every dump under a directory)
    #[command(visible_alias = "d")]
    Decode {
        /// Dump file or directory of dumps
        path: PathBuf,

        /// Dump format (detected from extension and content if omitted)
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,

        /// Path to filament colors JSON file (bundled table if omitted)
        #[arg(long, env = "SPOOLTAG_COLORS_JSON")]
        colors_json: Option<PathBuf>,

        /// Output format: text (default), json
        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,

        /// Accept the nearest table color within this RGB distance
        #[arg(short, long)]
        tolerance: Option<f64>,
    },

    /// List the filament color table
    #[command(visible_alias = "c")]
    Colors {
        /// Only show this material family (e.g. "PLA Basic")
        #[arg(short, long)]
        material: Option<String>,

        /// Path to filament colors JSON file (bundled table if omitted)
        #[arg(long, env = "SPOOLTAG_COLORS_JSON")]
        colors_json: Option<PathBuf>,
    },

    /// Configure default settings
    Configure {
        /// Set default filament colors JSON file
        #[arg(long)]
        colors_json: Option<PathBuf>,

        /// Set default nearest-color tolerance
        #[arg(long)]
        tolerance: Option<f64>,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_decode_args() {
        let cli = Cli::try_parse_from([
            "spooltag", "decode", "tag.nfc", "--format", "proxmark", "-o", "json",
        ])
        .unwrap();

        match cli.command {
            Commands::Decode {
                path,
                format,
                output,
                tolerance,
                ..
            } => {
                assert_eq!(path, PathBuf::from("tag.nfc"));
                assert_eq!(format.map(DumpFormat::from), Some(DumpFormat::Proxmark));
                assert_eq!(output, OutputFormat::Json);
                assert_eq!(tolerance, None);
            }
            _ => panic!("expected decode command"),
        }
    }

    #[test]
    fn test_unknown_format_rejected() {
        let result = Cli::try_parse_from(["spooltag", "decode", "tag.nfc", "--format", "eml"]);
        assert!(result.is_err());
    }
}
