//! Vendure schema tool
//!
//! Assembles the GraphQL schema for one API surface from a TOML config and
//! prints it, for client code generation and schema review.
//!
//! Usage:
//!   vendure-schema --config vendure.toml --api shop --format info

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;
use vendure_schema::ApiType;
use vendure_schema_cli::{OutputFormat, SchemaConfigFile, render};

#[derive(Parser, Debug)]
#[command(name = "vendure-schema")]
#[command(about = "Print the assembled Vendure GraphQL schema")]
struct Args {
    /// Path to the TOML config
    #[arg(short, long, default_value = "vendure.toml")]
    config: PathBuf,

    /// API surface to build: admin or shop
    #[arg(short, long, default_value = "admin")]
    api: ApiType,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Sdl)]
    format: OutputFormat,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = SchemaConfigFile::load(&args.config)?;
    let rendered = render(&config, args.api, args.format)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {} schema to {}", args.api, path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
