//! Builder-DSL schema resolution: interpreting `z.*` call chains.
//!
//! Structurally parallel to the structural resolver — same cache and
//! cycle-breaking discipline through the session — but semantically its own
//! interpreter: a declared constant's call-expression tree (factory call plus
//! chained refinements and compositions) is walked recursively into a
//! [`NormalizedSchema`].
//!
//! Two phases:
//! 1. a pre-scan, run at most once per resolver instance, that maps
//!    `type T = z.infer<typeof s>` aliases to their underlying schema names;
//! 2. per-name resolution, preferring route-handler files (schemas are often
//!    colocated with handlers) before the full scan of the schema root.
//!
//! Bare-identifier property values are treated as references to other named
//! schemas and are unconditionally marked required, even when the referenced
//! chain is optional at its declaration site — see DESIGN.md.

use super::{deref_schema, literal_value_to_json, NameResolver};
use crate::schema::{
    collapse_union, NormalizedSchema, ObjectShape, Primitive, SchemaKind,
};
use crate::scanner::is_route_file;
use crate::session::ResolutionSession;
use crate::syntax::{Expr, LiteralValue};
use log::{debug, warn};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Default)]
pub struct ZodResolver {
    /// `alias type name → schema constant name`, built by the pre-scan.
    aliases: RefCell<Option<HashMap<String, String>>>,
}

impl ZodResolver {
    pub fn new() -> Self {
        ZodResolver::default()
    }

    fn alias_target(
        &self,
        name: &str,
        root: &Path,
        session: &mut ResolutionSession,
    ) -> Option<String> {
        let mut aliases = self.aliases.borrow_mut();
        if aliases.is_none() {
            *aliases = Some(scan_infer_aliases(root, session));
        }
        aliases.as_ref().unwrap().get(name).cloned()
    }
}

impl NameResolver for ZodResolver {
    fn resolve(
        &self,
        name: &str,
        root: &Path,
        session: &mut ResolutionSession,
    ) -> Option<NormalizedSchema> {
        if session.has_schema(name) {
            return Some(NormalizedSchema::reference(name));
        }
        if let Some(target) = self.alias_target(name, root, session) {
            if target != name {
                debug!("Alias {} redirects to schema {}", name, target);
                resolve_builder_name(&target, root, session)?;
                return Some(NormalizedSchema::reference(target));
            }
        }
        resolve_builder_name(name, root, session)
    }
}

/// Resolves a declared schema constant by name. Returns `None` when no such
/// constant exists or its initializer is not a recognizable builder chain —
/// the caller then falls back to the structural resolver.
pub(crate) fn resolve_builder_name(
    name: &str,
    root: &Path,
    session: &mut ResolutionSession,
) -> Option<NormalizedSchema> {
    if session.has_schema(name) {
        return Some(NormalizedSchema::reference(name));
    }
    if session.builder_in_progress(name) {
        return Some(NormalizedSchema::reference(name));
    }
    let init = find_const_init(name, root, session)?;
    if matches!(chain_root(&init), ChainRoot::Other) {
        debug!("Constant {} is not a builder chain", name);
        return None;
    }

    session.begin_builder(name);
    let schema = interpret(&init, root, session);
    session.finish_builder(name);

    session.register_schema(name, schema.clone());
    Some(schema)
}

/// Interprets a constant initializer when the caller already located the
/// declaration (the structural resolver's exported-constant path).
pub(crate) fn interpret_const_init(
    init: &Expr,
    root: &Path,
    session: &mut ResolutionSession,
) -> Option<NormalizedSchema> {
    if matches!(chain_root(init), ChainRoot::Other) {
        return None;
    }
    Some(interpret(init, root, session))
}

// ---- lookup -----------------------------------------------------------

/// Candidate files under the root, route-handler files first.
fn ordered_candidates(root: &Path, session: &mut ResolutionSession) -> Vec<PathBuf> {
    let files = session.source_files(root);
    let (route_files, others): (Vec<_>, Vec<_>) =
        files.iter().cloned().partition(|path| is_route_file(path));
    route_files.into_iter().chain(others).collect()
}

fn find_const_init(name: &str, root: &Path, session: &mut ResolutionSession) -> Option<Expr> {
    for path in ordered_candidates(root, session) {
        let parsed = match session.parsed(&path) {
            Some(parsed) => parsed,
            None => continue,
        };
        for item in &parsed.module.items {
            if let crate::syntax::Decl::Const(decl) = &item.decl {
                if decl.name == name {
                    if let Some(init) = &decl.init {
                        return Some(init.clone());
                    }
                }
            }
        }
    }
    None
}

/// Builds the inferred-alias map: `export type T = z.infer<typeof s>`.
fn scan_infer_aliases(root: &Path, session: &mut ResolutionSession) -> HashMap<String, String> {
    use crate::syntax::{Decl, TypeExpr};
    let mut aliases = HashMap::new();
    for path in ordered_candidates(root, session) {
        let parsed = match session.parsed(&path) {
            Some(parsed) => parsed,
            None => continue,
        };
        for item in &parsed.module.items {
            if let Decl::TypeAlias(alias) = &item.decl {
                if let TypeExpr::Named { name, args } = &alias.ty {
                    if (name == "z.infer" || name == "zod.infer") && args.len() == 1 {
                        if let Some(TypeExpr::TypeQuery(target)) = args.first() {
                            aliases
                                .entry(alias.name.clone())
                                .or_insert_with(|| target.clone());
                        }
                    }
                }
            }
        }
    }
    debug!("Inferred-alias pre-scan found {} aliases", aliases.len());
    aliases
}

// ---- interpretation ---------------------------------------------------

enum ChainRoot {
    /// The innermost call is a `z.*` factory.
    Factory,
    /// The chain starts from another named schema.
    Ref,
    Other,
}

fn chain_root(expr: &Expr) -> ChainRoot {
    match expr {
        Expr::Call { callee, .. } => match callee.as_ref() {
            Expr::Member { obj, .. } => {
                if is_factory_namespace(obj) {
                    ChainRoot::Factory
                } else {
                    chain_root(obj)
                }
            }
            Expr::Ident(name) if is_factory_name(name) => ChainRoot::Factory,
            _ => ChainRoot::Other,
        },
        Expr::Ident(_) => ChainRoot::Ref,
        _ => ChainRoot::Other,
    }
}

fn is_factory_namespace(expr: &Expr) -> bool {
    match expr {
        Expr::Ident(name) => name == "z" || name == "zod",
        Expr::Member { obj, prop } => prop == "coerce" && is_factory_namespace(obj),
        _ => false,
    }
}

fn is_factory_name(name: &str) -> bool {
    matches!(
        name,
        "object"
            | "string"
            | "number"
            | "boolean"
            | "array"
            | "union"
            | "literal"
            | "record"
            | "set"
            | "tuple"
            | "lazy"
            | "intersection"
            | "discriminatedUnion"
            | "nativeEnum"
            | "instanceof"
            | "preprocess"
            | "date"
            | "bigint"
            | "any"
            | "unknown"
    )
}

/// Interprets a builder-chain expression into a schema. Unknown shapes
/// degrade to an untyped object schema with a diagnostic.
fn interpret(expr: &Expr, root: &Path, session: &mut ResolutionSession) -> NormalizedSchema {
    match expr {
        Expr::Call { callee, args } => match callee.as_ref() {
            Expr::Member { obj, prop } => {
                if is_factory_namespace(obj) {
                    factory_call(prop, args, root, session).unwrap_or_else(|| {
                        warn!("Unknown builder factory z.{}; using open schema", prop);
                        NormalizedSchema::untyped_object()
                    })
                } else {
                    let base = interpret_value(obj, root, session);
                    apply_refinement(base, prop, args, root, session)
                }
            }
            // a date construction call maps to a date-time string
            Expr::Ident(name) if name == "Date" => NormalizedSchema::date_time(),
            Expr::Ident(name) => factory_call(name, args, root, session).unwrap_or_else(|| {
                debug!("Call to {} is not a builder factory; using open schema", name);
                NormalizedSchema::untyped_object()
            }),
            _ => {
                debug!("Unrecognized call shape; using open schema");
                NormalizedSchema::untyped_object()
            }
        },
        other => interpret_value(other, root, session),
    }
}

/// Interprets an expression appearing where a schema value is expected:
/// a bare identifier is a reference to another named schema.
fn interpret_value(expr: &Expr, root: &Path, session: &mut ResolutionSession) -> NormalizedSchema {
    match expr {
        Expr::Ident(name) => {
            if ensure_resolved(name, root, session) {
                NormalizedSchema::reference(name)
            } else {
                debug!("Schema reference {} not found; using open schema", name);
                NormalizedSchema::untyped_object()
            }
        }
        Expr::Call { .. } => interpret(expr, root, session),
        _ => {
            debug!("Unrecognized schema value; using open schema");
            NormalizedSchema::untyped_object()
        }
    }
}

/// Resolves a referenced schema name if it is not already cached or on the
/// in-progress set. Returns whether a reference to it is meaningful.
fn ensure_resolved(name: &str, root: &Path, session: &mut ResolutionSession) -> bool {
    if session.has_schema(name) || session.builder_in_progress(name) {
        return true;
    }
    resolve_builder_name(name, root, session).is_some()
}

fn factory_call(
    name: &str,
    args: &[Expr],
    root: &Path,
    session: &mut ResolutionSession,
) -> Option<NormalizedSchema> {
    let schema = match name {
        "object" | "looseObject" | "strictObject" => match args.first() {
            Some(entries @ Expr::Object(_)) => object_from_entries(entries, root, session),
            _ => NormalizedSchema::untyped_object(),
        },
        "string" => NormalizedSchema::string(),
        "number" => NormalizedSchema::number(),
        "boolean" => NormalizedSchema::boolean(),
        "date" => NormalizedSchema::date_time(),
        "bigint" => {
            let mut schema = NormalizedSchema::integer();
            schema.format = Some("int64".to_string());
            schema
        }
        "any" | "unknown" => NormalizedSchema::untyped_object(),
        "null" | "undefined" | "void" | "never" => NormalizedSchema::null(),
        "literal" => match args.first() {
            Some(Expr::Literal(LiteralValue::Null)) => NormalizedSchema::null(),
            Some(Expr::Literal(literal)) => {
                NormalizedSchema::literal(literal_value_to_json(literal))
            }
            _ => NormalizedSchema::untyped_object(),
        },
        "array" => match args.first() {
            Some(inner) => NormalizedSchema::array(interpret_value(inner, root, session)),
            None => NormalizedSchema::array(NormalizedSchema::untyped_object()),
        },
        "set" => {
            let mut schema = match args.first() {
                Some(inner) => NormalizedSchema::array(interpret_value(inner, root, session)),
                None => NormalizedSchema::array(NormalizedSchema::untyped_object()),
            };
            schema.unique_items = true;
            schema
        }
        "enum" => enum_from_arg(args.first())?,
        "nativeEnum" => match args.first() {
            Some(Expr::Ident(enum_name)) => {
                let resolver = super::typescript::TypeScriptResolver::new();
                match resolver.resolve(enum_name, root, session) {
                    Some(_) => NormalizedSchema::reference(enum_name),
                    None => NormalizedSchema::untyped_object(),
                }
            }
            other => enum_from_arg(other)?,
        },
        "record" => {
            let value_schema = match args.last() {
                Some(value) => interpret_value(value, root, session),
                None => NormalizedSchema::untyped_object(),
            };
            let mut shape = ObjectShape::default();
            shape.additional_properties = Some(Box::new(value_schema));
            NormalizedSchema::object(shape)
        }
        "union" => match args.first() {
            Some(Expr::Array(members)) => {
                let resolved = members
                    .iter()
                    .map(|member| interpret_value(member, root, session))
                    .collect();
                collapse_union(resolved)
            }
            _ => NormalizedSchema::untyped_object(),
        },
        "intersection" => {
            let members = args
                .iter()
                .take(2)
                .map(|arg| interpret_value(arg, root, session))
                .collect();
            NormalizedSchema::all_of(members)
        }
        "discriminatedUnion" => {
            let tag = match args.first() {
                Some(Expr::Literal(LiteralValue::Str(tag))) => Some(tag.clone()),
                _ => None,
            };
            let variants = match args.get(1) {
                Some(Expr::Array(variants)) => variants
                    .iter()
                    .map(|variant| interpret_value(variant, root, session))
                    .collect(),
                _ => Vec::new(),
            };
            let mut schema = NormalizedSchema::one_of(variants);
            schema.discriminator = tag;
            schema
        }
        "tuple" => match args.first() {
            // approximated by the first slot's schema
            Some(Expr::Array(slots)) => match slots.first() {
                Some(first) => NormalizedSchema::array(interpret_value(first, root, session)),
                None => NormalizedSchema::array(NormalizedSchema::untyped_object()),
            },
            _ => NormalizedSchema::array(NormalizedSchema::untyped_object()),
        },
        "lazy" => match args.first() {
            Some(Expr::Arrow(body)) => match body.as_ref() {
                Expr::Ident(target) => {
                    ensure_resolved(target, root, session);
                    NormalizedSchema::reference(target)
                }
                Expr::Call { .. } => interpret(body, root, session),
                _ => NormalizedSchema::untyped_object(),
            },
            Some(other) => interpret_value(other, root, session),
            None => NormalizedSchema::untyped_object(),
        },
        "instanceof" => match args.first() {
            Some(Expr::Ident(class)) if class == "File" || class == "Blob" => {
                let mut schema = NormalizedSchema::string();
                schema.format = Some("binary".to_string());
                schema
            }
            _ => NormalizedSchema::untyped_object(),
        },
        "preprocess" => match args.get(1) {
            Some(inner) => interpret_value(inner, root, session),
            None => NormalizedSchema::untyped_object(),
        },
        "optional" | "nullable" => {
            let mut schema = match args.first() {
                Some(inner) => interpret_value(inner, root, session),
                None => NormalizedSchema::untyped_object(),
            };
            schema.nullable = true;
            schema
        }
        _ => return None,
    };
    Some(schema)
}

fn enum_from_arg(arg: Option<&Expr>) -> Option<NormalizedSchema> {
    let values: Vec<Value> = match arg {
        Some(Expr::Array(elems)) => elems
            .iter()
            .filter_map(|elem| match elem {
                Expr::Literal(literal) => Some(literal_value_to_json(literal)),
                _ => None,
            })
            .collect(),
        Some(Expr::Object(entries)) => entries
            .iter()
            .filter_map(|(_, value)| match value {
                Expr::Literal(literal) => Some(literal_value_to_json(literal)),
                _ => None,
            })
            .collect(),
        _ => return Some(NormalizedSchema::untyped_object()),
    };
    let primitive = match values.first() {
        Some(Value::Number(_)) => Primitive::Number,
        _ => Primitive::String,
    };
    Some(NormalizedSchema::enum_of(primitive, values))
}

/// Builds an object schema from `z.object({...})` entries. A key is omitted
/// from `required` when its value chain carries an optional/nullable/nullish
/// marker anywhere; bare references are always required.
fn object_from_entries(
    entries: &Expr,
    root: &Path,
    session: &mut ResolutionSession,
) -> NormalizedSchema {
    let entries = match entries {
        Expr::Object(entries) => entries,
        _ => return NormalizedSchema::untyped_object(),
    };
    let mut shape = ObjectShape::default();
    for (key, value) in entries {
        let property = interpret_value(value, root, session);
        if !chain_has_optional(value) {
            shape.required.push(key.clone());
        }
        shape.properties.insert(key.clone(), property);
    }
    NormalizedSchema::object(shape)
}

/// Whether any call in the chain is an optional/nullable/nullish marker,
/// walking from the outermost call inward.
fn chain_has_optional(expr: &Expr) -> bool {
    match expr {
        Expr::Call { callee, .. } => match callee.as_ref() {
            Expr::Member { obj, prop } => {
                matches!(prop.as_str(), "optional" | "nullable" | "nullish")
                    || chain_has_optional(obj)
            }
            other => chain_has_optional(other),
        },
        Expr::Member { obj, .. } => chain_has_optional(obj),
        _ => false,
    }
}

/// Applies one chained refinement call to the accumulated schema.
fn apply_refinement(
    mut schema: NormalizedSchema,
    name: &str,
    args: &[Expr],
    root: &Path,
    session: &mut ResolutionSession,
) -> NormalizedSchema {
    match name {
        "optional" | "nullable" | "nullish" => schema.nullable = true,
        "describe" => {
            if let Some(Expr::Literal(LiteralValue::Str(text))) = args.first() {
                schema.description = Some(text.clone());
            }
        }
        "deprecated" => schema.deprecated = true,
        "default" => {
            if let Some(value) = args.first().and_then(literal_expr_to_json) {
                schema.default = Some(value);
            }
        }
        "min" | "gte" => {
            if let Some(value) = first_number(args) {
                apply_min(&mut schema, value, false);
            }
        }
        "max" | "lte" => {
            if let Some(value) = first_number(args) {
                apply_max(&mut schema, value, false);
            }
        }
        "gt" => {
            if let Some(value) = first_number(args) {
                apply_min(&mut schema, value, true);
            }
        }
        "lt" => {
            if let Some(value) = first_number(args) {
                apply_max(&mut schema, value, true);
            }
        }
        "length" => {
            if let Some(value) = first_number(args) {
                apply_min(&mut schema, value, false);
                apply_max(&mut schema, value, false);
            }
        }
        "int" => {
            if matches!(schema.kind, SchemaKind::Primitive(Primitive::Number)) {
                schema.kind = SchemaKind::Primitive(Primitive::Integer);
            }
        }
        "positive" => apply_min(&mut schema, 0.0, true),
        "nonnegative" => apply_min(&mut schema, 0.0, false),
        "negative" => apply_max(&mut schema, 0.0, true),
        "nonpositive" => apply_max(&mut schema, 0.0, false),
        "email" | "uuid" | "cuid" | "cuid2" | "ulid" | "ip" => {
            schema.format = Some(name.to_string());
        }
        "url" | "uri" => schema.format = Some("uri".to_string()),
        "datetime" => schema.format = Some("date-time".to_string()),
        "regex" => match args.first() {
            Some(Expr::Regex(pattern)) => schema.pattern = Some(pattern.clone()),
            Some(Expr::Literal(LiteralValue::Str(pattern))) => {
                schema.pattern = Some(pattern.clone())
            }
            _ => {}
        },
        "startsWith" => {
            if let Some(Expr::Literal(LiteralValue::Str(prefix))) = args.first() {
                schema.pattern = Some(format!("^{}", escape_pattern(prefix)));
            }
        }
        "endsWith" => {
            if let Some(Expr::Literal(LiteralValue::Str(suffix))) = args.first() {
                schema.pattern = Some(format!("{}$", escape_pattern(suffix)));
            }
        }
        "includes" => {
            if let Some(Expr::Literal(LiteralValue::Str(fragment))) = args.first() {
                schema.pattern = Some(escape_pattern(fragment));
            }
        }
        "or" => {
            let rhs = match args.first() {
                Some(rhs) => interpret_value(rhs, root, session),
                None => return schema,
            };
            return collapse_union(vec![schema, rhs]);
        }
        "and" => {
            let rhs = match args.first() {
                Some(rhs) => interpret_value(rhs, root, session),
                None => return schema,
            };
            return NormalizedSchema::all_of(vec![schema, rhs]);
        }
        "extend" => {
            let extension = match args.first() {
                Some(entries) => object_from_entries(entries, root, session),
                None => return schema,
            };
            let mut base = deref_schema(&schema, session);
            if base.is_object() {
                base.merge_object(&extension);
                return base;
            }
            return extension;
        }
        "merge" => {
            let rhs = match args.first() {
                Some(rhs) => interpret_value(rhs, root, session),
                None => return schema,
            };
            let rhs = deref_schema(&rhs, session);
            let mut base = deref_schema(&schema, session);
            if base.is_object() && rhs.is_object() {
                base.merge_object(&rhs);
                return base;
            }
            return NormalizedSchema::all_of(vec![schema, rhs]);
        }
        "pick" | "omit" => {
            return project_entries(schema, args.first(), name == "pick", session);
        }
        // validation and shape-preserving hooks with no schema effect
        "refine" | "superRefine" | "transform" | "passthrough" | "strict" | "strip"
        | "trim" | "toLowerCase" | "toUpperCase" | "brand" | "readonly" | "catch"
        | "pipe" | "openapi" => {}
        other => debug!("Ignoring unknown refinement .{}()", other),
    }
    schema
}

/// `.pick({a: true})` / `.omit({a: true})` on an object schema.
fn project_entries(
    schema: NormalizedSchema,
    keys: Option<&Expr>,
    keep: bool,
    session: &ResolutionSession,
) -> NormalizedSchema {
    let names: Vec<String> = match keys {
        Some(Expr::Object(entries)) => entries
            .iter()
            .filter(|(_, value)| !matches!(value, Expr::Literal(LiteralValue::Bool(false))))
            .map(|(key, _)| key.clone())
            .collect(),
        _ => return schema,
    };
    let base = deref_schema(&schema, session);
    let shape = match base.object_shape() {
        Some(shape) => shape,
        None => return schema,
    };
    let mut projected = ObjectShape::default();
    for (prop_name, prop_schema) in &shape.properties {
        if names.contains(prop_name) == keep {
            projected
                .properties
                .insert(prop_name.clone(), prop_schema.clone());
        }
    }
    projected.required = shape
        .required
        .iter()
        .filter(|name| names.contains(*name) == keep)
        .cloned()
        .collect();
    NormalizedSchema::object(projected)
}

fn apply_min(schema: &mut NormalizedSchema, value: f64, exclusive: bool) {
    match &schema.kind {
        SchemaKind::Primitive(Primitive::String) => schema.min_length = Some(value as u64),
        SchemaKind::Primitive(Primitive::Number) | SchemaKind::Primitive(Primitive::Integer) => {
            schema.minimum = Some(value);
            schema.exclusive_minimum = exclusive;
        }
        SchemaKind::Array(_) => schema.min_items = Some(value as u64),
        // a bound irrelevant to the current kind is a no-op
        _ => {}
    }
}

fn apply_max(schema: &mut NormalizedSchema, value: f64, exclusive: bool) {
    match &schema.kind {
        SchemaKind::Primitive(Primitive::String) => schema.max_length = Some(value as u64),
        SchemaKind::Primitive(Primitive::Number) | SchemaKind::Primitive(Primitive::Integer) => {
            schema.maximum = Some(value);
            schema.exclusive_maximum = exclusive;
        }
        SchemaKind::Array(_) => schema.max_items = Some(value as u64),
        _ => {}
    }
}

fn first_number(args: &[Expr]) -> Option<f64> {
    match args.first() {
        Some(Expr::Literal(LiteralValue::Num(value))) => Some(*value),
        _ => None,
    }
}

/// Literal defaults: strings, numbers, booleans, null and shallow
/// objects/arrays of those.
fn literal_expr_to_json(expr: &Expr) -> Option<Value> {
    match expr {
        Expr::Literal(literal) => Some(literal_value_to_json(literal)),
        Expr::Array(elems) => {
            let values: Vec<Value> = elems
                .iter()
                .filter_map(|elem| match elem {
                    Expr::Literal(literal) => Some(literal_value_to_json(literal)),
                    _ => None,
                })
                .collect();
            Some(Value::Array(values))
        }
        Expr::Object(entries) => {
            let mut map = serde_json::Map::new();
            for (key, value) in entries {
                if let Expr::Literal(literal) = value {
                    map.insert(key.clone(), literal_value_to_json(literal));
                }
            }
            Some(Value::Object(map))
        }
        _ => None,
    }
}

/// Escapes regex metacharacters in a literal fragment before inserting it
/// into a pattern.
fn escape_pattern(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for ch in fragment.chars() {
        if matches!(
            ch,
            '.' | '^' | '$' | '*' | '+' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|' | '\\'
                | '/'
        ) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
