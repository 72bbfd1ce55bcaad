//! OpenAPI generator for TypeScript web projects.
//!
//! This library recovers API shape information from source code that never
//! wrote it down explicitly: it walks a project's route-handler files, reads
//! the structured annotations attached to each exported handler, resolves the
//! referenced type and schema names by static analysis, and assembles a
//! complete OpenAPI document.
//!
//! # Architecture
//!
//! The modules cooperate as a pipeline:
//!
//! 1. [`scanner`] - Recursively scans directories for candidate source files
//! 2. [`syntax`] / [`parser`] - Parses source text into a bounded syntax tree
//! 3. [`annotations`] - Extracts `@tag`-style directives from handler comments
//! 4. [`resolver`] - Resolves type/schema names into normalized schemas:
//!    structural types ([`resolver::typescript`]) and builder-DSL chains
//!    ([`resolver::zod`]), composed with configurable fallback
//! 5. [`collector`] - Walks the API tree and assembles route definitions
//! 6. [`openapi_builder`] - Merges routes, schemas and response templates
//!    into the output document
//! 7. [`serializer`] - Serializes the document to JSON or YAML
//!
//! Per-run state (schema cache, cycle detection, file caches) lives in a
//! [`session::ResolutionSession`] constructed fresh for every generation run.
//!
//! # Example Usage
//!
//! ```no_run
//! use openapi_from_typescript::collector::RouteCollector;
//! use openapi_from_typescript::config::GeneratorConfig;
//! use openapi_from_typescript::openapi_builder::OpenApiBuilder;
//! use openapi_from_typescript::serializer::serialize_json;
//! use openapi_from_typescript::session::ResolutionSession;
//! use std::path::Path;
//!
//! let config = GeneratorConfig::load(Path::new("openapi.config.json")).unwrap();
//!
//! let mut session = ResolutionSession::new();
//! let collector = RouteCollector::new(&config);
//! let routes = collector.collect(&mut session);
//!
//! let builder = OpenApiBuilder::new(&config);
//! let document = builder.build(&routes, &session);
//!
//! let json = serialize_json(&document).unwrap();
//! println!("{}", json);
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module which provides the `init`
//! and `generate` subcommands.

pub mod annotations;
pub mod cli;
pub mod collector;
pub mod config;
pub mod openapi_builder;
pub mod parser;
pub mod resolver;
pub mod scaffold;
pub mod scanner;
pub mod schema;
pub mod serializer;
pub mod session;
pub mod symbols;
pub mod syntax;
