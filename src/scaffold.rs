//! Project scaffolding for the `init` subcommand.
//!
//! Thin I/O glue: writes a starter configuration document and a static
//! viewer page pointing at the generated document. Dependency installation
//! is left to the user's package manager.

use crate::config::CONFIG_FILE_NAME;
use crate::serializer::write_to_file;
use anyhow::{bail, Result};
use log::info;
use std::path::Path;

const STARTER_CONFIG: &str = r#"{
  "apiDir": "./src/app/api",
  "schemaDir": "./src",
  "schemaType": "typescript",
  "includeOpenApiRoutes": false,
  "outputFile": "public/openapi.json",
  "docsUrl": "/api-docs",
  "defaultResponseSet": "none",
  "responseSets": {
    "common": ["400", "401", "500"],
    "auth": ["401", "403"]
  },
  "errorConfig": {
    "template": {
      "type": "object",
      "properties": {
        "message": { "type": "string", "example": "{{ERROR_MESSAGE}}" },
        "statusCode": { "type": "number", "example": "{{httpStatus}}" }
      }
    },
    "codes": {
      "400": { "description": "Bad request", "variables": { "ERROR_MESSAGE": "Invalid request payload" } },
      "401": { "description": "Unauthorized", "variables": { "ERROR_MESSAGE": "Missing or invalid credentials" } },
      "403": { "description": "Forbidden", "variables": { "ERROR_MESSAGE": "Insufficient permissions" } },
      "500": { "description": "Internal server error", "variables": { "ERROR_MESSAGE": "Unexpected server error" } }
    }
  },
  "basePath": "/api",
  "openapi": "3.0.0",
  "info": {
    "title": "API documentation",
    "version": "1.0.0"
  },
  "components": {
    "securitySchemes": {
      "bearerAuth": { "type": "http", "scheme": "bearer", "bearerFormat": "JWT" },
      "basicAuth": { "type": "http", "scheme": "basic" },
      "apiKeyAuth": { "type": "apiKey", "in": "header", "name": "X-API-Key" }
    }
  }
}
"#;

const VIEWER_PAGE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <title>API documentation</title>
  <meta name="viewport" content="width=device-width, initial-scale=1" />
</head>
<body>
  <div id="api-docs"></div>
  <script src="https://cdn.jsdelivr.net/npm/swagger-ui-dist/swagger-ui-bundle.js"></script>
  <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/swagger-ui-dist/swagger-ui.css" />
  <script>
    window.onload = () => {
      SwaggerUIBundle({ url: "/openapi.json", dom_id: "#api-docs" });
    };
  </script>
</body>
</html>
"##;

/// Writes the starter configuration and viewer page into `target_dir`.
///
/// Refuses to overwrite an existing configuration unless `force` is set.
pub fn init_project(target_dir: &Path, force: bool) -> Result<()> {
    let config_path = target_dir.join(CONFIG_FILE_NAME);
    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists: {} (use --force to overwrite)",
            config_path.display()
        );
    }

    write_to_file(STARTER_CONFIG, &config_path)?;
    info!("Wrote starter configuration to {}", config_path.display());

    let viewer_path = target_dir.join("public/api-docs.html");
    write_to_file(VIEWER_PAGE, &viewer_path)?;
    info!("Wrote viewer page to {}", viewer_path.display());

    info!("Install a documentation viewer with your package manager if you want a richer UI");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use tempfile::TempDir;

    #[test]
    fn init_writes_loadable_config_and_viewer() {
        let dir = TempDir::new().unwrap();
        init_project(dir.path(), false).unwrap();

        let config = GeneratorConfig::load(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config.api_dir, "./src/app/api");
        assert!(config.response_sets.contains_key("common"));
        assert!(config.error_config.is_some());

        assert!(dir.path().join("public/api-docs.html").exists());
    }

    #[test]
    fn init_refuses_to_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        init_project(dir.path(), false).unwrap();

        let result = init_project(dir.path(), false);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("already exists"));

        assert!(init_project(dir.path(), true).is_ok());
    }
}
