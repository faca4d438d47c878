//! GLOSSIS mesh-to-raster converter.
//!
//! Converts UGRID domain files into interpolated GeoTIFFs, either from a
//! local path or from an object storage prefix, and prints a JSON summary
//! of what was written.

mod config;
mod discover;
mod run;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::ConverterConfig;
use mesh_raster::{DomainPolicy, LayerType, TimestepSelection};
use storage::ObjectStorage;

#[derive(Parser, Debug)]
#[command(name = "converter")]
#[command(about = "Convert UGRID ocean model output into GeoTIFF rasters")]
struct Args {
    /// Configuration file path (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Local domain file or directory (skips object storage)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output directory for local runs
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Object prefix holding domain files
    #[arg(long)]
    input_prefix: Option<String>,

    /// Object prefix rasters are uploaded under
    #[arg(long)]
    output_prefix: Option<String>,

    /// Force a layer (waterlevel or currents)
    #[arg(short, long)]
    layer: Option<String>,

    /// Timestep to rasterize: "latest" or a zero-based index
    #[arg(short, long)]
    timestep: Option<String>,

    /// Convert every domain file instead of only the first
    #[arg(long)]
    each_domain: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting mesh-to-raster converter");

    let mut config = ConverterConfig::load(args.config.as_deref())?;
    apply_args(&mut config, &args)?;
    info!(
        width = config.conversion.width,
        height = config.conversion.height,
        crs = %config.conversion.crs,
        layer = ?config.conversion.layer,
        policy = ?config.conversion.domain_policy,
        "Loaded configuration"
    );

    let summary = match &args.input {
        Some(input) => {
            let files = discover::find_local_domains(input, &config.conversion.domain_suffix)?;
            let outputs = run::run_local(files, args.output.clone(), config.conversion).await?;
            serde_json::to_string_pretty(&outputs)?
        }
        None => {
            let storage = ObjectStorage::new(&config.storage)?;
            let outputs = run::run_remote(&storage, &config).await?;
            serde_json::to_string_pretty(&outputs)?
        }
    };

    println!("{}", summary);
    Ok(())
}

/// Command-line flags take precedence over the file and the environment.
fn apply_args(config: &mut ConverterConfig, args: &Args) -> Result<()> {
    if let Some(layer) = &args.layer {
        let layer = LayerType::parse(layer).with_context(|| format!("Unknown layer '{}'", layer))?;
        config.conversion.layer = Some(layer);
    }
    if let Some(timestep) = &args.timestep {
        let timestep = TimestepSelection::parse(timestep)
            .with_context(|| format!("Invalid timestep '{}'", timestep))?;
        config.conversion.timestep = timestep;
    }
    if args.each_domain {
        config.conversion.domain_policy = DomainPolicy::Each;
    }
    if let Some(prefix) = &args.input_prefix {
        config.input_prefix = prefix.clone();
    }
    if let Some(prefix) = &args.output_prefix {
        config.output_prefix = prefix.clone();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_override_config() {
        let args = Args::parse_from([
            "converter",
            "--layer",
            "currents",
            "--timestep",
            "3",
            "--each-domain",
            "--output-prefix",
            "rasters/currents",
        ]);
        let mut config = ConverterConfig::default();
        apply_args(&mut config, &args).unwrap();

        assert_eq!(config.conversion.layer, Some(LayerType::Currents));
        assert_eq!(config.conversion.timestep, TimestepSelection::Index(3));
        assert_eq!(config.conversion.domain_policy, DomainPolicy::Each);
        assert_eq!(config.output_prefix, "rasters/currents");
    }

    #[test]
    fn test_bad_layer_rejected() {
        let args = Args::parse_from(["converter", "--layer", "salinity"]);
        let mut config = ConverterConfig::default();
        assert!(apply_args(&mut config, &args).is_err());
    }
}
