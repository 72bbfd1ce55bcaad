//! Route collection: walking the API tree and assembling route definitions.
//!
//! The collector finds recognized route-handler files, extracts the exported
//! HTTP-verb bindings and their annotation blocks, derives each route's URL
//! template from its file location, and resolves every referenced type name
//! through the two resolvers in the configured fallback order. All resolution
//! state lives in the shared [`ResolutionSession`].

use crate::annotations::DirectiveRecord;
use crate::config::{GeneratorConfig, SchemaMode};
use crate::resolver::typescript::TypeScriptResolver;
use crate::resolver::zod::ZodResolver;
use crate::resolver::{deref_schema, resolve_with_fallback, NameResolver};
use crate::scanner::is_route_file;
use crate::schema::{NormalizedSchema, ObjectShape, SchemaKind};
use crate::session::ResolutionSession;
use crate::syntax::Decl;
use indexmap::IndexMap;
use log::{debug, warn};
use serde_json::{json, Value};
use std::path::Path;

/// HTTP methods recognized as exported handler names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
}

impl HttpMethod {
    pub fn from_export_name(name: &str) -> Option<HttpMethod> {
        match name {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "DELETE" => Some(HttpMethod::Delete),
            "PATCH" => Some(HttpMethod::Patch),
            "OPTIONS" => Some(HttpMethod::Options),
            "HEAD" => Some(HttpMethod::Head),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Delete => "delete",
            HttpMethod::Patch => "patch",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
        }
    }

    /// Default success status code for the method.
    pub fn default_status(&self) -> &'static str {
        match self {
            HttpMethod::Post => "201",
            HttpMethod::Delete => "204",
            _ => "200",
        }
    }

    fn accepts_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterLocation {
    Path,
    Query,
}

impl ParameterLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
        }
    }
}

/// One parameter of a route operation.
#[derive(Debug, Clone)]
pub struct RouteParameter {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub schema: NormalizedSchema,
    pub example: Option<Value>,
}

/// The request body of a mutating operation.
#[derive(Debug, Clone)]
pub struct RequestBodySpec {
    pub content_type: String,
    pub schema: NormalizedSchema,
    pub description: Option<String>,
}

/// One entry of a route's response map.
#[derive(Debug, Clone)]
pub enum ResponseSpec {
    /// `$ref` into the shared `components.responses` table.
    Reference(String),
    Inline {
        description: String,
        schema: Option<NormalizedSchema>,
    },
}

/// One HTTP operation on one URL template. Created once per discovered
/// handler, immutable afterwards, consumed by the assembler.
#[derive(Debug, Clone)]
pub struct RouteDefinition {
    pub path: String,
    pub method: HttpMethod,
    pub operation_id: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tag: Option<String>,
    /// Auth kind from `@auth` (bearer/basic/apikey).
    pub security: Option<String>,
    pub parameters: Vec<RouteParameter>,
    pub request_body: Option<RequestBodySpec>,
    pub responses: IndexMap<String, ResponseSpec>,
    pub deprecated: bool,
}

/// Walks the API tree and produces route definitions.
pub struct RouteCollector<'a> {
    config: &'a GeneratorConfig,
    ts_resolver: TypeScriptResolver,
    zod_resolver: ZodResolver,
}

impl<'a> RouteCollector<'a> {
    pub fn new(config: &'a GeneratorConfig) -> Self {
        RouteCollector {
            config,
            ts_resolver: TypeScriptResolver::new(),
            zod_resolver: ZodResolver::new(),
        }
    }

    /// Collects every route under the configured API directory.
    pub fn collect(&self, session: &mut ResolutionSession) -> Vec<RouteDefinition> {
        let api_dir = self.config.api_dir_path();
        let files = session.source_files(&api_dir);
        let route_files: Vec<_> = files
            .iter()
            .filter(|path| is_route_file(path))
            .cloned()
            .collect();
        debug!("Found {} route files under {}", route_files.len(), api_dir.display());

        let mut routes = Vec::new();
        for path in route_files {
            if !session.mark_route_processed(&path) {
                continue;
            }
            let parsed = match session.parsed(&path) {
                Some(parsed) => parsed,
                None => continue,
            };
            let template = derive_route_path(&api_dir, &path);
            for item in &parsed.module.items {
                if !item.exported {
                    continue;
                }
                let method = match &item.decl {
                    Decl::Function(f) => HttpMethod::from_export_name(&f.name),
                    Decl::Const(c) => HttpMethod::from_export_name(&c.name),
                    _ => None,
                };
                let method = match method {
                    Some(method) => method,
                    None => continue,
                };
                let record = DirectiveRecord::parse(item.doc.as_deref().unwrap_or(""));
                if self.config.include_open_api_routes && !record.openapi {
                    continue;
                }
                routes.push(self.build_route(&template, method, &record, session));
            }
        }
        routes
    }

    fn resolvers(&self) -> [&dyn NameResolver; 2] {
        match self.config.schema_type {
            SchemaMode::Typescript => [&self.ts_resolver, &self.zod_resolver],
            SchemaMode::Zod => [&self.zod_resolver, &self.ts_resolver],
        }
    }

    /// Resolves a referenced name, returning the component name to `$ref`
    /// and the resolved schema. `None` when neither resolver knows the name.
    fn resolve_component(
        &self,
        name: &str,
        session: &mut ResolutionSession,
    ) -> Option<(String, NormalizedSchema)> {
        let root = self.config.schema_dir_path();
        let schema = resolve_with_fallback(&self.resolvers(), name, &root, session)?;
        let component = if session.has_schema(name) {
            name.to_string()
        } else if let SchemaKind::Reference(target) = &schema.kind {
            target.clone()
        } else {
            name.to_string()
        };
        Some((component, schema))
    }

    fn build_route(
        &self,
        template: &str,
        method: HttpMethod,
        record: &DirectiveRecord,
        session: &mut ResolutionSession,
    ) -> RouteDefinition {
        let template_params = template_param_names(template);
        if !template_params.is_empty() && record.path_params.is_none() {
            debug!(
                "Route {} {} has path parameters but no declared path-parameter type",
                method.as_str(),
                template
            );
        }

        let parameters = self.assemble_parameters(record, &template_params, session);
        let request_body = self.assemble_request_body(method, record, session);
        let responses = self.assemble_responses(method, record, session);

        RouteDefinition {
            path: template.to_string(),
            method,
            operation_id: operation_id(method, template),
            summary: record.summary.clone(),
            description: record.description.clone(),
            tag: record.tag.clone(),
            security: record.auth.clone(),
            parameters,
            request_body,
            responses,
            deprecated: record.deprecated,
        }
    }

    /// Declared path/query schema properties become individual parameter
    /// entries; template parameters without a declared schema get a
    /// synthesized default.
    fn assemble_parameters(
        &self,
        record: &DirectiveRecord,
        template_params: &[String],
        session: &mut ResolutionSession,
    ) -> Vec<RouteParameter> {
        let mut parameters = Vec::new();
        let mut covered: Vec<String> = Vec::new();

        if let Some(type_name) = &record.path_params {
            if let Some(shape) = self.resolve_object_shape(type_name, session) {
                for (name, schema) in &shape.properties {
                    covered.push(name.clone());
                    parameters.push(RouteParameter {
                        name: name.clone(),
                        location: ParameterLocation::Path,
                        required: true,
                        schema: schema.clone(),
                        example: None,
                    });
                }
            }
        }

        for name in template_params {
            if covered.contains(name) {
                continue;
            }
            let (schema, example) = synthesized_param_schema(name);
            parameters.push(RouteParameter {
                name: name.clone(),
                location: ParameterLocation::Path,
                required: true,
                schema,
                example: Some(example),
            });
        }

        if let Some(type_name) = &record.params {
            if let Some(shape) = self.resolve_object_shape(type_name, session) {
                for (name, schema) in &shape.properties {
                    parameters.push(RouteParameter {
                        name: name.clone(),
                        location: ParameterLocation::Query,
                        required: shape.required.contains(name),
                        schema: schema.clone(),
                        example: None,
                    });
                }
            }
        }

        parameters
    }

    fn resolve_object_shape(
        &self,
        name: &str,
        session: &mut ResolutionSession,
    ) -> Option<ObjectShape> {
        let (_, schema) = self.resolve_component(name, session)?;
        let concrete = deref_schema(&schema, session);
        match concrete.object_shape() {
            Some(shape) => Some(shape.clone()),
            None => {
                debug!("Parameter type {} did not resolve to an object", name);
                None
            }
        }
    }

    fn assemble_request_body(
        &self,
        method: HttpMethod,
        record: &DirectiveRecord,
        session: &mut ResolutionSession,
    ) -> Option<RequestBodySpec> {
        if !method.accepts_body() {
            return None;
        }
        let type_name = record.body.as_ref()?;
        let content_type = record
            .content_type
            .clone()
            .unwrap_or_else(|| infer_content_type(type_name).to_string());

        let schema = match self.resolve_component(type_name, session) {
            Some((component, schema)) => {
                if content_type == "multipart/form-data" {
                    rewrite_multipart_schema(&schema, session)
                } else {
                    NormalizedSchema::reference(component)
                }
            }
            None => {
                debug!("Request body type {} not found; using open schema", type_name);
                NormalizedSchema::untyped_object()
            }
        };

        Some(RequestBodySpec {
            content_type,
            schema,
            description: record.body_description.clone(),
        })
    }

    /// Responses assemble with precedence: explicit success entry, named
    /// response-set `$ref`s, ad hoc `@add` entries.
    fn assemble_responses(
        &self,
        method: HttpMethod,
        record: &DirectiveRecord,
        session: &mut ResolutionSession,
    ) -> IndexMap<String, ResponseSpec> {
        let mut responses: IndexMap<String, ResponseSpec> = IndexMap::new();

        // (a) success entry
        let status = record
            .response
            .as_ref()
            .and_then(|response| response.status.clone())
            .unwrap_or_else(|| method.default_status().to_string());
        let description = record
            .response
            .as_ref()
            .and_then(|response| response.description.clone())
            .or_else(|| record.response_description.clone())
            .unwrap_or_else(|| success_description(&status).to_string());
        let schema = match &record.response {
            Some(response) if status != "204" => {
                Some(match self.resolve_component(&response.type_name, session) {
                    Some((component, _)) => NormalizedSchema::reference(component),
                    None => {
                        debug!(
                            "Response type {} not found; using open schema",
                            response.type_name
                        );
                        NormalizedSchema::untyped_object()
                    }
                })
            }
            _ => None,
        };
        responses.insert(status, ResponseSpec::Inline { description, schema });

        // (b) response sets
        let set_names = record
            .response_sets
            .clone()
            .unwrap_or_else(|| self.config.default_response_set_names());
        for set_name in &set_names {
            match self.config.response_sets.get(set_name) {
                Some(codes) => {
                    for code in codes {
                        responses
                            .entry(code.clone())
                            .or_insert_with(|| ResponseSpec::Reference(code.clone()));
                    }
                }
                None => warn!("Unknown response set: {}", set_name),
            }
        }

        // (c) ad hoc additions
        for extra in &record.extra_responses {
            let spec = match &extra.schema {
                Some(schema_name) => {
                    let schema = match self.resolve_component(schema_name, session) {
                        Some((component, _)) => NormalizedSchema::reference(component),
                        None => NormalizedSchema::untyped_object(),
                    };
                    ResponseSpec::Inline {
                        description: default_status_description(&extra.status).to_string(),
                        schema: Some(schema),
                    }
                }
                None => ResponseSpec::Reference(extra.status.clone()),
            };
            responses.entry(extra.status.clone()).or_insert(spec);
        }

        responses
    }
}

/// Derives the URL template from a route file's location: the directory path
/// relative to the API root, with `[param]`/`[...param]` segments becoming
/// `{param}` and parenthesized group segments dropped.
pub fn derive_route_path(api_dir: &Path, route_file: &Path) -> String {
    let parent = route_file.parent().unwrap_or(route_file);
    let relative = parent.strip_prefix(api_dir).unwrap_or(parent);

    let mut segments = Vec::new();
    for component in relative.components() {
        let segment = component.as_os_str().to_string_lossy();
        if segment.is_empty() || (segment.starts_with('(') && segment.ends_with(')')) {
            continue;
        }
        if segment.starts_with('[') && segment.ends_with(']') {
            let inner = segment.trim_start_matches('[').trim_end_matches(']');
            let name = inner.trim_start_matches("...");
            segments.push(format!("{{{}}}", name));
        } else {
            segments.push(segment.to_string());
        }
    }

    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Names of the `{param}` placeholders in a URL template.
pub fn template_param_names(template: &str) -> Vec<String> {
    template
        .split('/')
        .filter(|segment| segment.starts_with('{') && segment.ends_with('}'))
        .map(|segment| segment[1..segment.len() - 1].to_string())
        .collect()
}

/// Deterministic operation id from method + path:
/// `GET /orders/{id}` → `getOrdersById`.
pub fn operation_id(method: HttpMethod, template: &str) -> String {
    let mut id = method.as_str().to_string();
    for segment in template.split('/').filter(|s| !s.is_empty()) {
        if segment.starts_with('{') && segment.ends_with('}') {
            id.push_str("By");
            id.push_str(&pascal_case(&segment[1..segment.len() - 1]));
        } else {
            id.push_str(&pascal_case(segment));
        }
    }
    id
}

fn pascal_case(text: &str) -> String {
    text.split(|c: char| c == '-' || c == '_' || c == '.')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// Type inferred from the parameter name: id-like names are numbers.
fn synthesized_param_schema(name: &str) -> (NormalizedSchema, Value) {
    let lowered = name.to_lowercase();
    if lowered == "id" || lowered.ends_with("id") {
        (NormalizedSchema::number(), json!(123))
    } else {
        (NormalizedSchema::string(), json!("abc"))
    }
}

/// Multipart detection from the body type name.
fn infer_content_type(type_name: &str) -> &'static str {
    let lowered = type_name.to_lowercase();
    if lowered.contains("formdata") || lowered.contains("fileupload") || lowered.contains("multipart")
    {
        "multipart/form-data"
    } else {
        "application/json"
    }
}

/// Multipart bodies are inlined with file-shaped properties rewritten to
/// binary strings.
fn rewrite_multipart_schema(
    schema: &NormalizedSchema,
    session: &ResolutionSession,
) -> NormalizedSchema {
    let concrete = deref_schema(schema, session);
    let shape = match concrete.object_shape() {
        Some(shape) => shape.clone(),
        None => return concrete,
    };
    let mut rewritten = ObjectShape {
        required: shape.required.clone(),
        ..Default::default()
    };
    for (name, property) in &shape.properties {
        let is_file_reference =
            matches!(&property.kind, SchemaKind::Reference(target) if target == "File");
        let property = if name.to_lowercase().contains("file") || is_file_reference {
            let mut binary = NormalizedSchema::string();
            binary.format = Some("binary".to_string());
            binary.description = property.description.clone();
            binary
        } else {
            property.clone()
        };
        rewritten.properties.insert(name.clone(), property);
    }
    NormalizedSchema::object(rewritten)
}

fn success_description(status: &str) -> &'static str {
    match status {
        "201" => "Created",
        "202" => "Accepted",
        "204" => "No content",
        _ => "Successful response",
    }
}

/// Human-readable default description for a status code.
pub fn default_status_description(status: &str) -> &'static str {
    match status {
        "200" => "Successful response",
        "201" => "Created",
        "202" => "Accepted",
        "204" => "No content",
        "400" => "Bad request",
        "401" => "Unauthorized",
        "403" => "Forbidden",
        "404" => "Not found",
        "409" => "Conflict",
        "410" => "Gone",
        "422" => "Unprocessable entity",
        "429" => "Too many requests",
        "500" => "Internal server error",
        "502" => "Bad gateway",
        "503" => "Service unavailable",
        _ => "Response",
    }
}
