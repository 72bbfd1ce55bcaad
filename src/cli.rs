use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, info};
use std::path::PathBuf;

use crate::collector::RouteCollector;
use crate::config::{GeneratorConfig, CONFIG_FILE_NAME};
use crate::openapi_builder::OpenApiBuilder;
use crate::scaffold::init_project;
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use crate::session::ResolutionSession;

/// Generate OpenAPI documentation from annotated TypeScript route handlers
#[derive(Parser, Debug)]
#[command(name = "openapi-from-typescript")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a starter configuration file and documentation viewer page
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },
    /// Scan the project and generate the OpenAPI document
    Generate {
        /// Path to the configuration file
        #[arg(short = 'c', long = "config", default_value = CONFIG_FILE_NAME)]
        config: PathBuf,

        /// Output format
        #[arg(short = 'f', long = "format", value_enum, default_value = "json")]
        format: OutputFormat,

        /// Output file path (overrides the configured outputFile)
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Run the selected subcommand.
pub fn run(args: CliArgs) -> Result<()> {
    match args.command {
        Command::Init { force } => {
            info!("Initializing project scaffolding...");
            init_project(&std::env::current_dir()?, force)
        }
        Command::Generate { config, format, output } => generate(&config, format, output),
    }
}

/// The full scan-resolve-assemble-write pipeline.
fn generate(config_path: &PathBuf, format: OutputFormat, output: Option<PathBuf>) -> Result<()> {
    info!("Starting OpenAPI document generation...");

    // Step 1: configuration (the only fatal input)
    let config = GeneratorConfig::load(config_path)?;

    // Step 2: collect routes, resolving referenced types as they appear
    info!("Collecting routes from {}...", config.api_dir);
    let mut session = ResolutionSession::new();
    let collector = RouteCollector::new(&config);
    let routes = collector.collect(&mut session);
    info!("Collected {} routes", routes.len());

    if routes.is_empty() {
        log::warn!("No routes found under {}", config.api_dir);
    }
    debug!("Resolved {} named schemas", session.schemas().len());

    // Step 3: assemble the document
    info!("Assembling document...");
    let builder = OpenApiBuilder::new(&config);
    let document = builder.build(&routes, &session);

    // Step 4: serialize
    let content = match format {
        OutputFormat::Json => serialize_json(&document)?,
        OutputFormat::Yaml => serialize_yaml(&document)?,
    };

    // Step 5: write
    let output_path = output.unwrap_or_else(|| PathBuf::from(&config.output_file));
    write_to_file(&content, &output_path)?;
    info!("Wrote OpenAPI document to {}", output_path.display());

    info!("Summary:");
    info!("  - Routes: {}", routes.len());
    info!("  - Schemas: {}", session.schemas().len());

    Ok(())
}
