//! CoverageJSON command-line tool
//!
//! Encodes result trees (JSON) into CoverageJSON and decodes CoverageJSON
//! documents into labeled datasets. Documents are written to stdout; logs go
//! to stderr.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use covjson::{Decoder, Encoder, EncoderConfig, GroupingAxes, ResultTree};

/// CoverageJSON encoder/decoder
#[derive(Parser, Debug)]
#[command(name = "covjson")]
#[command(about = "Convert result trees to CoverageJSON and back", long_about = None)]
struct Cli {
    /// Encoder configuration file (YAML)
    #[arg(short, long, global = true, env = "COVJSON_CONFIG")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, global = true, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Pretty-print the output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encode a result tree into a CoverageJSON document
    Encode {
        /// Result tree JSON file
        input: PathBuf,

        /// Axes that split coverages: date, date_level or date_number_step
        #[arg(short, long)]
        grouping: Option<GroupingAxes>,

        /// Parameter catalog file (YAML)
        #[arg(long, env = "COVJSON_CATALOG")]
        catalog: Option<PathBuf>,
    },

    /// Decode a CoverageJSON document into a labeled dataset
    Decode {
        /// CoverageJSON file
        input: PathBuf,
    },
}

fn main() {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            error!(error = %format!("{:#}", e), "covjson failed");
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<String> {
    match cli.command {
        Commands::Encode {
            ref input,
            grouping,
            ref catalog,
        } => {
            let config = resolve_config(cli.config.as_deref(), grouping, catalog.clone())?;
            encode_file(input, config, cli.pretty)
        }
        Commands::Decode { ref input } => decode_file(input, cli.pretty),
    }
}

/// Layer configuration: YAML file first, then command-line overrides.
fn resolve_config(
    path: Option<&Path>,
    grouping: Option<GroupingAxes>,
    catalog: Option<PathBuf>,
) -> Result<EncoderConfig> {
    let mut config = match path {
        Some(path) => EncoderConfig::load(path)
            .with_context(|| format!("Failed to load encoder config from {:?}", path))?,
        None => EncoderConfig::default(),
    };

    if let Some(grouping) = grouping {
        config.grouping = grouping;
    }
    if catalog.is_some() {
        config.parameter_catalog = catalog;
    }
    Ok(config)
}

fn encode_file(input: &Path, config: EncoderConfig, pretty: bool) -> Result<String> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read result tree from {:?}", input))?;
    let tree: ResultTree = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse result tree from {:?}", input))?;

    let grouping = config.grouping;
    let encoder = Encoder::from_config(config).context("Failed to load parameter catalog")?;
    let doc = encoder
        .from_tree(&tree)
        .with_context(|| format!("Failed to encode {:?}", input))?;

    info!(
        input = ?input,
        grouping = %grouping,
        coverages = doc.coverages.len(),
        "Encoded result tree"
    );

    let json = if pretty {
        doc.to_json_pretty()?
    } else {
        doc.to_json()?
    };
    Ok(json)
}

fn decode_file(input: &Path, pretty: bool) -> Result<String> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read CoverageJSON from {:?}", input))?;
    let decoder = Decoder::from_json(&content)
        .with_context(|| format!("Failed to parse CoverageJSON from {:?}", input))?;
    let dataset = decoder
        .to_dataset()
        .with_context(|| format!("Failed to export {:?} to a labeled dataset", input))?;

    info!(
        input = ?input,
        datetimes = dataset.n_datetimes(),
        points = dataset.n_points(),
        variables = dataset.data_vars.len(),
        "Decoded document"
    );

    let json = if pretty {
        serde_json::to_string_pretty(&dataset)?
    } else {
        serde_json::to_string(&dataset)?
    };
    Ok(json)
}
