//! Command-line tool for generating OpenAPI documentation from TypeScript
//! web projects.
//!
//! The binary analyzes a project's route-handler files, resolves the type and
//! schema names referenced in their annotation blocks, and writes a complete
//! OpenAPI document.
//!
//! # Usage
//!
//! ```bash
//! openapi-from-typescript init
//! openapi-from-typescript generate
//! ```
//!
//! # Examples
//!
//! Generate with a non-default configuration file:
//! ```bash
//! openapi-from-typescript generate -c config/openapi.config.json
//! ```
//!
//! Generate YAML output:
//! ```bash
//! openapi-from-typescript generate -f yaml -o openapi.yaml
//! ```
//!
//! Enable verbose logging:
//! ```bash
//! openapi-from-typescript generate -v
//! ```

mod annotations;
mod cli;
mod collector;
mod config;
mod openapi_builder;
mod parser;
mod resolver;
mod scaffold;
mod scanner;
mod schema;
mod serializer;
mod session;
mod symbols;
mod syntax;

use anyhow::Result;
use clap::Parser;
use log::info;

fn main() -> Result<()> {
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("openapi-from-typescript starting...");

    cli::run(args)?;

    info!("Done");

    Ok(())
}
