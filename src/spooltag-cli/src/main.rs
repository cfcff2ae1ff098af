mod cli;
mod commands;
mod config;
mod file_utils;

use anyhow::Result;
use clap::Parser;
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::*;

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spooltag=warn,spooltag_cli=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Decode {
            path,
            format,
            colors_json,
            output,
            tolerance,
        } => {
            let config = Config::load()?;
            let table = commands::load_color_table(
                colors_json.as_deref().or_else(|| config.get_colors_json()),
            )?;
            let options = commands::decode::DecodeOptions {
                format: format.map(Into::into),
                tolerance: tolerance
                    .or_else(|| config.get_tolerance())
                    .unwrap_or(spooltag::DEFAULT_TOLERANCE),
                output,
            };
            tracing::debug!(?options, "decoding {}", path.display());
            commands::decode::handle(&path, &table, options)?;
        }

        Commands::Colors {
            material,
            colors_json,
        } => {
            let config = Config::load()?;
            let table = commands::load_color_table(
                colors_json.as_deref().or_else(|| config.get_colors_json()),
            )?;
            commands::colors::list(&table, material.as_deref())?;
        }

        Commands::Configure {
            colors_json,
            tolerance,
            show,
        } => {
            commands::configure::handle(colors_json, tolerance, show)?;
        }
    }

    Ok(())
}
