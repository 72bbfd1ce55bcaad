//! Generator configuration loaded from a JSON document.
//!
//! The configuration file doubles as the base of the emitted document: keys
//! like `openapi`, `info` and `components` pass through, while the
//! generator-internal keys are stripped before emission. A missing or
//! malformed configuration is fatal — there is no meaningful default for the
//! API and schema roots.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::{debug, info};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "openapi.config.json";

/// Keys consumed by the generator itself, removed from the output document.
const INTERNAL_KEYS: &[&str] = &[
    "apiDir",
    "schemaDir",
    "schemaType",
    "includeOpenApiRoutes",
    "outputFile",
    "docsUrl",
    "defaultResponseSet",
    "responseSets",
    "errorConfig",
    "basePath",
];

/// Which resolver runs first when a type name is looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SchemaMode {
    /// Structural types first (interfaces, type aliases, enums).
    #[default]
    Typescript,
    /// Builder-DSL schemas first.
    Zod,
}

/// The loaded configuration document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorConfig {
    /// Root of the route-handler tree.
    #[serde(default = "default_api_dir")]
    pub api_dir: String,
    /// Root of the type/schema declarations.
    #[serde(default = "default_schema_dir")]
    pub schema_dir: String,
    /// Resolver precedence.
    #[serde(default)]
    pub schema_type: SchemaMode,
    /// When true, only handlers annotated with `@openapi` are collected.
    #[serde(default)]
    pub include_open_api_routes: bool,
    /// Where the generated document is written.
    #[serde(default = "default_output_file")]
    pub output_file: String,
    /// Path the viewer page is served from; informational only.
    #[serde(default)]
    pub docs_url: Option<String>,
    /// Response-set name applied to every route, or `"none"`.
    #[serde(default = "default_response_set_name")]
    pub default_response_set: String,
    /// Named, ordered lists of status codes.
    #[serde(default)]
    pub response_sets: IndexMap<String, Vec<String>>,
    /// Reusable error-response factory.
    #[serde(default)]
    pub error_config: Option<ErrorConfig>,
    /// First server URL of the emitted document.
    #[serde(default = "default_base_path")]
    pub base_path: String,
    /// Output document version string.
    #[serde(default = "default_openapi_version")]
    pub openapi: String,
    /// Pass-through info block.
    #[serde(default)]
    pub info: Value,
    /// Pass-through components (pre-seeded security schemes).
    #[serde(default)]
    pub components: Value,
    /// The raw document as loaded, kept as the base of the output.
    #[serde(skip)]
    pub raw: Value,
}

/// Template-based error response generation: `template` is cloned per code
/// and `{{NAME}}` placeholders are substituted from the code's variables.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ErrorConfig {
    #[serde(default)]
    pub template: Value,
    #[serde(default)]
    pub codes: IndexMap<String, ErrorCodeConfig>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ErrorCodeConfig {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub http_status: Option<Value>,
    #[serde(default)]
    pub variables: IndexMap<String, String>,
}

fn default_api_dir() -> String {
    "./src/app/api".to_string()
}

fn default_schema_dir() -> String {
    "./src".to_string()
}

fn default_output_file() -> String {
    "openapi.json".to_string()
}

fn default_response_set_name() -> String {
    "none".to_string()
}

fn default_base_path() -> String {
    "/".to_string()
}

fn default_openapi_version() -> String {
    "3.0.0".to_string()
}

impl GeneratorConfig {
    /// Loads and validates the configuration document.
    ///
    /// # Errors
    ///
    /// Fails if the file is missing, unreadable or not valid JSON. These are
    /// the only fatal inputs of a generation run.
    pub fn load(path: &Path) -> Result<GeneratorConfig> {
        debug!("Loading configuration from {}", path.display());

        let content = fs::read_to_string(path).with_context(|| {
            format!(
                "Missing configuration file: {} (run the init command to create one)",
                path.display()
            )
        })?;

        let raw: Value = serde_json::from_str(&content)
            .with_context(|| format!("Malformed configuration file: {}", path.display()))?;

        let mut config: GeneratorConfig = serde_json::from_value(raw.clone())
            .with_context(|| format!("Invalid configuration file: {}", path.display()))?;
        config.raw = raw;

        info!("Configuration loaded from {}", path.display());
        debug!(
            "apiDir={} schemaDir={} schemaType={:?}",
            config.api_dir, config.schema_dir, config.schema_type
        );

        Ok(config)
    }

    /// Parses a configuration from an in-memory JSON value.
    pub fn from_value(raw: Value) -> Result<GeneratorConfig> {
        let mut config: GeneratorConfig =
            serde_json::from_value(raw.clone()).context("Invalid configuration document")?;
        config.raw = raw;
        Ok(config)
    }

    pub fn api_dir_path(&self) -> PathBuf {
        PathBuf::from(&self.api_dir)
    }

    pub fn schema_dir_path(&self) -> PathBuf {
        PathBuf::from(&self.schema_dir)
    }

    /// Whether the configured default response set is active.
    pub fn default_response_set_names(&self) -> Vec<String> {
        if self.default_response_set.eq_ignore_ascii_case("none") {
            Vec::new()
        } else {
            self.default_response_set
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(String::from)
                .collect()
        }
    }

    /// The raw document minus generator-internal keys: the base the
    /// assembler builds on.
    pub fn base_document(&self) -> Value {
        let mut base = self.raw.clone();
        if let Some(map) = base.as_object_mut() {
            for key in INTERNAL_KEYS {
                map.remove(*key);
            }
        }
        base
    }
}
