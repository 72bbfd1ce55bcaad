//! Final document assembly.
//!
//! The builder merges collected route definitions into the base document
//! derived from the configuration (internal keys already stripped), injects
//! the session's resolved schemas as `components.schemas`, and synthesizes
//! the reusable `components.responses` table from the declarative response
//! sets and the error-template configuration.

use crate::collector::{default_status_description, ResponseSpec, RouteDefinition};
use crate::config::GeneratorConfig;
use crate::session::ResolutionSession;
use indexmap::IndexMap;
use log::debug;
use serde_json::{json, Map, Value};

/// Prefix for response references in the emitted document.
pub const RESPONSE_REF_PREFIX: &str = "#/components/responses/";

pub struct OpenApiBuilder<'a> {
    config: &'a GeneratorConfig,
}

impl<'a> OpenApiBuilder<'a> {
    pub fn new(config: &'a GeneratorConfig) -> Self {
        OpenApiBuilder { config }
    }

    /// Builds the complete output document.
    pub fn build(&self, routes: &[RouteDefinition], session: &ResolutionSession) -> Value {
        debug!("Assembling document from {} routes", routes.len());

        let base = self.config.base_document();
        let base_map = base.as_object().cloned().unwrap_or_default();

        let mut doc = Map::new();
        doc.insert(
            "openapi".to_string(),
            base_map
                .get("openapi")
                .cloned()
                .unwrap_or_else(|| Value::String(self.config.openapi.clone())),
        );
        doc.insert(
            "info".to_string(),
            base_map.get("info").cloned().unwrap_or_else(|| {
                json!({"title": "API documentation", "version": "1.0.0"})
            }),
        );
        doc.insert(
            "servers".to_string(),
            base_map
                .get("servers")
                .cloned()
                .unwrap_or_else(|| json!([{"url": self.config.base_path}])),
        );
        for (key, value) in &base_map {
            if matches!(key.as_str(), "openapi" | "info" | "servers" | "components" | "paths") {
                continue;
            }
            doc.insert(key.clone(), value.clone());
        }

        doc.insert("paths".to_string(), self.build_paths(routes));
        doc.insert(
            "components".to_string(),
            self.build_components(base_map.get("components"), session),
        );

        Value::Object(doc)
    }

    /// Groups routes by template and applies the deterministic final
    /// ordering: first operation's tag, then segment count, then template.
    fn build_paths(&self, routes: &[RouteDefinition]) -> Value {
        let mut grouped: IndexMap<String, Vec<&RouteDefinition>> = IndexMap::new();
        for route in routes {
            grouped.entry(route.path.clone()).or_default().push(route);
        }

        let mut templates: Vec<&String> = grouped.keys().collect();
        templates.sort_by(|a, b| {
            let tag_a = first_tag(&grouped[*a]);
            let tag_b = first_tag(&grouped[*b]);
            let segments_a = a.split('/').filter(|s| !s.is_empty()).count();
            let segments_b = b.split('/').filter(|s| !s.is_empty()).count();
            tag_a
                .cmp(&tag_b)
                .then(segments_a.cmp(&segments_b))
                .then(a.cmp(b))
        });

        let mut paths = Map::new();
        for template in templates {
            let mut item = Map::new();
            for route in &grouped[template] {
                item.insert(route.method.as_str().to_string(), self.build_operation(route));
            }
            paths.insert(template.clone(), Value::Object(item));
        }
        Value::Object(paths)
    }

    fn build_operation(&self, route: &RouteDefinition) -> Value {
        let mut operation = Map::new();

        if let Some(tag) = &route.tag {
            operation.insert("tags".to_string(), json!([tag]));
        }
        if let Some(summary) = &route.summary {
            operation.insert("summary".to_string(), Value::String(summary.clone()));
        }
        if let Some(description) = &route.description {
            operation.insert("description".to_string(), Value::String(description.clone()));
        }
        operation.insert(
            "operationId".to_string(),
            Value::String(route.operation_id.clone()),
        );
        if route.deprecated {
            operation.insert("deprecated".to_string(), Value::Bool(true));
        }
        if let Some(auth) = &route.security {
            let mut requirement = Map::new();
            requirement.insert(self.scheme_for_auth(auth), json!([]));
            operation.insert(
                "security".to_string(),
                Value::Array(vec![Value::Object(requirement)]),
            );
        }

        if !route.parameters.is_empty() {
            let params: Vec<Value> = route
                .parameters
                .iter()
                .map(|param| {
                    let mut schema = param.schema.clone();
                    let description = schema.description.take();
                    let mut entry = Map::new();
                    entry.insert("name".to_string(), Value::String(param.name.clone()));
                    entry.insert(
                        "in".to_string(),
                        Value::String(param.location.as_str().to_string()),
                    );
                    if let Some(description) = description {
                        entry.insert("description".to_string(), Value::String(description));
                    }
                    entry.insert("required".to_string(), Value::Bool(param.required));
                    entry.insert("schema".to_string(), schema.to_value());
                    if let Some(example) = &param.example {
                        entry.insert("example".to_string(), example.clone());
                    }
                    Value::Object(entry)
                })
                .collect();
            operation.insert("parameters".to_string(), Value::Array(params));
        }

        if let Some(body) = &route.request_body {
            let mut request_body = Map::new();
            if let Some(description) = &body.description {
                request_body.insert("description".to_string(), Value::String(description.clone()));
            }
            request_body.insert("required".to_string(), Value::Bool(true));
            let mut content = Map::new();
            content.insert(
                body.content_type.clone(),
                json!({"schema": body.schema.to_value()}),
            );
            request_body.insert("content".to_string(), Value::Object(content));
            operation.insert("requestBody".to_string(), Value::Object(request_body));
        }

        let mut responses = Map::new();
        for (status, spec) in &route.responses {
            let value = match spec {
                ResponseSpec::Reference(code) => {
                    json!({"$ref": format!("{}{}", RESPONSE_REF_PREFIX, code)})
                }
                ResponseSpec::Inline { description, schema } => {
                    let mut entry = Map::new();
                    entry.insert("description".to_string(), Value::String(description.clone()));
                    if let Some(schema) = schema {
                        entry.insert(
                            "content".to_string(),
                            json!({"application/json": {"schema": schema.to_value()}}),
                        );
                    }
                    Value::Object(entry)
                }
            };
            responses.insert(status.clone(), value);
        }
        operation.insert("responses".to_string(), Value::Object(responses));

        Value::Object(operation)
    }

    fn build_components(&self, seeded: Option<&Value>, session: &ResolutionSession) -> Value {
        let mut components = seeded
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        // schemas: config-seeded entries first, generated ones after
        let mut schemas = components
            .get("schemas")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        for (name, schema) in session.schemas() {
            if !schemas.contains_key(name) {
                schemas.insert(name.clone(), schema.to_value());
            }
        }
        if !schemas.is_empty() {
            components.insert("schemas".to_string(), Value::Object(schemas));
        }

        // responses: seeded entries first, then one generated entry per code
        let mut responses = components
            .get("responses")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        for (code, entry) in self.generated_responses() {
            if !responses.contains_key(&code) {
                responses.insert(code, entry);
            }
        }
        if !responses.is_empty() {
            components.insert("responses".to_string(), Value::Object(responses));
        }

        Value::Object(components)
    }

    /// One reusable response per status code named by the error configuration
    /// or any response set, built from the error template with placeholder
    /// substitution.
    fn generated_responses(&self) -> Vec<(String, Value)> {
        let mut codes: Vec<String> = Vec::new();
        if let Some(error_config) = &self.config.error_config {
            for code in error_config.codes.keys() {
                if !codes.contains(code) {
                    codes.push(code.clone());
                }
            }
        }
        for set_codes in self.config.response_sets.values() {
            for code in set_codes {
                if !codes.contains(code) {
                    codes.push(code.clone());
                }
            }
        }

        codes
            .into_iter()
            .map(|code| {
                let entry = self.error_response_for(&code);
                (code, entry)
            })
            .collect()
    }

    fn error_response_for(&self, code: &str) -> Value {
        let error_config = match &self.config.error_config {
            Some(error_config) => error_config,
            None => {
                return json!({"description": default_status_description(code)});
            }
        };
        let code_config = error_config.codes.get(code);
        let description = code_config
            .map(|c| c.description.clone())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| default_status_description(code).to_string());

        if error_config.template.is_null() {
            return json!({"description": description});
        }

        let mut variables: IndexMap<String, String> = IndexMap::new();
        if let Some(code_config) = code_config {
            for (key, value) in &code_config.variables {
                variables.insert(key.clone(), value.clone());
            }
            let http_status = match &code_config.http_status {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                _ => code.to_string(),
            };
            variables.entry("httpStatus".to_string()).or_insert(http_status);
        } else {
            variables.insert("httpStatus".to_string(), code.to_string());
        }
        variables
            .entry("description".to_string())
            .or_insert_with(|| description.clone());

        let schema = substitute_placeholders(&error_config.template, &variables);
        json!({
            "description": description,
            "content": {"application/json": {"schema": schema}}
        })
    }

    /// Maps an `@auth` kind to a security-scheme name, preferring a matching
    /// scheme seeded in the configuration's components.
    fn scheme_for_auth(&self, kind: &str) -> String {
        if let Some(schemes) = self
            .config
            .components
            .get("securitySchemes")
            .and_then(Value::as_object)
        {
            for (name, scheme) in schemes {
                let scheme_type = scheme.get("type").and_then(Value::as_str).unwrap_or("");
                let http_scheme = scheme.get("scheme").and_then(Value::as_str).unwrap_or("");
                let matches = match kind {
                    "bearer" => scheme_type == "http" && http_scheme == "bearer",
                    "basic" => scheme_type == "http" && http_scheme == "basic",
                    "apikey" => scheme_type == "apiKey",
                    other => name == other,
                };
                if matches {
                    return name.clone();
                }
            }
        }
        match kind {
            "bearer" => "bearerAuth".to_string(),
            "basic" => "basicAuth".to_string(),
            "apikey" => "apiKeyAuth".to_string(),
            other => other.to_string(),
        }
    }
}

fn first_tag<'r>(routes: &[&'r RouteDefinition]) -> String {
    routes
        .first()
        .and_then(|route| route.tag.clone())
        .unwrap_or_default()
}

/// Deep-substitutes `{{NAME}}` markers in every string of a template value.
fn substitute_placeholders(template: &Value, variables: &IndexMap<String, String>) -> Value {
    match template {
        Value::String(text) => {
            let mut result = text.clone();
            for (key, value) in variables {
                result = result.replace(&format!("{{{{{}}}}}", key), value);
            }
            Value::String(result)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| substitute_placeholders(item, variables))
                .collect(),
        ),
        Value::Object(map) => {
            let mut substituted = Map::new();
            for (key, value) in map {
                substituted.insert(key.clone(), substitute_placeholders(value, variables));
            }
            Value::Object(substituted)
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{HttpMethod, ParameterLocation, RouteParameter};
    use crate::schema::NormalizedSchema;
    use pretty_assertions::assert_eq;

    fn route(path: &str, method: HttpMethod, tag: Option<&str>) -> RouteDefinition {
        let mut responses = IndexMap::new();
        responses.insert(
            method.default_status().to_string(),
            ResponseSpec::Inline {
                description: "Successful response".to_string(),
                schema: None,
            },
        );
        RouteDefinition {
            path: path.to_string(),
            method,
            operation_id: crate::collector::operation_id(method, path),
            summary: None,
            description: None,
            tag: tag.map(String::from),
            security: None,
            parameters: Vec::new(),
            request_body: None,
            responses,
            deprecated: false,
        }
    }

    fn build(routes: &[RouteDefinition], config_value: serde_json::Value) -> Value {
        let config = GeneratorConfig::from_value(config_value).unwrap();
        let session = ResolutionSession::new();
        OpenApiBuilder::new(&config).build(routes, &session)
    }

    #[test]
    fn paths_sort_by_tag_then_segment_count() {
        let routes = vec![
            route("/zebras/{id}/notes", HttpMethod::Get, Some("Zebras")),
            route("/zebras", HttpMethod::Get, Some("Zebras")),
            route("/apples/{id}", HttpMethod::Get, Some("Apples")),
            route("/untagged", HttpMethod::Get, None),
        ];
        let doc = build(&routes, serde_json::json!({}));
        let keys: Vec<_> = doc["paths"].as_object().unwrap().keys().cloned().collect();
        // empty tag sorts first, then Apples, then Zebras (short path first)
        assert_eq!(keys, vec!["/untagged", "/apples/{id}", "/zebras", "/zebras/{id}/notes"]);
    }

    #[test]
    fn methods_accumulate_under_one_template() {
        let routes = vec![
            route("/orders", HttpMethod::Get, Some("Orders")),
            route("/orders", HttpMethod::Post, Some("Orders")),
        ];
        let doc = build(&routes, serde_json::json!({}));
        let item = doc["paths"]["/orders"].as_object().unwrap();
        assert!(item.contains_key("get"));
        assert!(item.contains_key("post"));
    }

    #[test]
    fn servers_synthesized_from_base_path() {
        let doc = build(&[], serde_json::json!({"basePath": "/api/v1"}));
        assert_eq!(doc["servers"], serde_json::json!([{"url": "/api/v1"}]));
    }

    #[test]
    fn internal_keys_never_reach_output() {
        let doc = build(
            &[],
            serde_json::json!({
                "apiDir": "./x",
                "schemaDir": "./y",
                "responseSets": {"auth": ["401"]},
                "defaultResponseSet": "auth",
                "info": {"title": "T", "version": "0.1.0"}
            }),
        );
        let map = doc.as_object().unwrap();
        assert!(!map.contains_key("apiDir"));
        assert!(!map.contains_key("schemaDir"));
        assert!(!map.contains_key("responseSets"));
        assert!(!map.contains_key("defaultResponseSet"));
        assert_eq!(doc["info"]["title"], "T");
    }

    #[test]
    fn response_set_codes_get_component_entries() {
        let doc = build(
            &[],
            serde_json::json!({"responseSets": {"auth": ["401", "403"]}}),
        );
        let responses = doc["components"]["responses"].as_object().unwrap();
        assert!(responses.contains_key("401"));
        assert!(responses.contains_key("403"));
        assert_eq!(responses["401"]["description"], "Unauthorized");
    }

    #[test]
    fn error_template_substitutes_placeholders() {
        let doc = build(
            &[],
            serde_json::json!({
                "errorConfig": {
                    "template": {
                        "type": "object",
                        "properties": {
                            "message": {"type": "string", "example": "{{ERROR_MESSAGE}}"},
                            "status": {"type": "number", "example": "{{httpStatus}}"}
                        }
                    },
                    "codes": {
                        "401": {
                            "description": "Authentication required",
                            "variables": {"ERROR_MESSAGE": "Missing bearer token"}
                        }
                    }
                }
            }),
        );
        let entry = &doc["components"]["responses"]["401"];
        assert_eq!(entry["description"], "Authentication required");
        let schema = &entry["content"]["application/json"]["schema"];
        assert_eq!(schema["properties"]["message"]["example"], "Missing bearer token");
        assert_eq!(schema["properties"]["status"]["example"], "401");
    }

    #[test]
    fn security_scheme_resolved_from_seeded_components() {
        let mut secured = route("/private", HttpMethod::Get, None);
        secured.security = Some("bearer".to_string());
        let doc = build(
            &[secured],
            serde_json::json!({
                "components": {
                    "securitySchemes": {
                        "jwt": {"type": "http", "scheme": "bearer"}
                    }
                }
            }),
        );
        assert_eq!(
            doc["paths"]["/private"]["get"]["security"],
            serde_json::json!([{"jwt": []}])
        );
    }

    #[test]
    fn security_scheme_falls_back_to_canonical_names() {
        let mut secured = route("/private", HttpMethod::Get, None);
        secured.security = Some("apikey".to_string());
        let doc = build(&[secured], serde_json::json!({}));
        assert_eq!(
            doc["paths"]["/private"]["get"]["security"],
            serde_json::json!([{"apiKeyAuth": []}])
        );
    }

    #[test]
    fn parameter_description_moves_to_parameter_level() {
        let mut described = NormalizedSchema::string();
        described.description = Some("the order id".to_string());
        let mut with_param = route("/orders/{id}", HttpMethod::Get, None);
        with_param.parameters.push(RouteParameter {
            name: "id".to_string(),
            location: ParameterLocation::Path,
            required: true,
            schema: described,
            example: None,
        });
        let doc = build(&[with_param], serde_json::json!({}));
        let param = &doc["paths"]["/orders/{id}"]["get"]["parameters"][0];
        assert_eq!(param["description"], "the order id");
        assert_eq!(param["schema"], serde_json::json!({"type": "string"}));
    }
}
