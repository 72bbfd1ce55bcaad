//! Structural type resolution: interfaces, type aliases and enums.
//!
//! Given a type name and a scan root, the resolver locates the declaration
//! across the directory tree, builds a symbol table for the pass, and
//! recursively converts the type expression into a [`NormalizedSchema`].
//! Self- and mutually-referential types are broken into `Reference` nodes via
//! the session's in-progress set; every resolved name lands in the session's
//! shared schema table.
//!
//! Resolution never fails: a missing declaration or an unrecognized type
//! shape degrades to an untyped object schema and a debug diagnostic.

use super::{deref_schema, literal_value_to_json, NameResolver};
use crate::schema::{collapse_union, NormalizedSchema, ObjectShape, Primitive};
use crate::session::ResolutionSession;
use crate::symbols::SymbolTable;
use crate::syntax::{Decl, EnumDecl, KeywordType, LiteralValue, Member, TypeExpr};
use log::debug;
use std::path::Path;

#[derive(Default)]
pub struct TypeScriptResolver;

impl TypeScriptResolver {
    pub fn new() -> Self {
        TypeScriptResolver
    }

    /// Resolves a name, degrading to an untyped object schema when the
    /// declaration cannot be found anywhere under `root`.
    pub fn resolve_named(
        &self,
        name: &str,
        root: &Path,
        session: &mut ResolutionSession,
    ) -> NormalizedSchema {
        match self.resolve(name, root, session) {
            Some(schema) => schema,
            None => {
                debug!("Type {} not found under {}; using open schema", name, root.display());
                NormalizedSchema::untyped_object()
            }
        }
    }

    /// Resolves `name` against an already-built symbol table. Registers the
    /// result in the session unless `register` is false (the Pick/Omit base
    /// path, which must not leak a synthetic view into the component table).
    fn resolve_in_table(
        &self,
        name: &str,
        table: &SymbolTable,
        root: &Path,
        session: &mut ResolutionSession,
        register: bool,
    ) -> NormalizedSchema {
        if session.has_schema(name) {
            return NormalizedSchema::reference(name);
        }
        if session.type_in_progress(name) {
            return NormalizedSchema::reference(name);
        }
        let symbol = match table.get(name) {
            Some(symbol) => symbol,
            None => {
                debug!("Type {} not in symbol table; using open schema", name);
                return NormalizedSchema::untyped_object();
            }
        };

        session.begin_type(name);
        let schema = self.decl_to_schema(symbol.decl(), table, root, session);
        session.finish_type(name);

        if register {
            session.register_schema(name, schema.clone());
        }
        schema
    }

    fn decl_to_schema(
        &self,
        decl: &Decl,
        table: &SymbolTable,
        root: &Path,
        session: &mut ResolutionSession,
    ) -> NormalizedSchema {
        match decl {
            Decl::Interface(iface) => {
                let mut schema = NormalizedSchema::untyped_object();
                // inherited members first, own members layered on top
                for base in &iface.extends {
                    let resolved = self.resolve_in_table(base, table, root, session, true);
                    let resolved = deref_schema(&resolved, session);
                    if resolved.is_object() {
                        schema.merge_object(&resolved);
                    } else {
                        debug!("extends base {} did not resolve to an object", base);
                    }
                }
                let own = self.members_to_object(&iface.members, table, root, session);
                schema.merge_object(&own);
                schema
            }
            Decl::TypeAlias(alias) => self.type_to_schema(&alias.ty, table, root, session),
            Decl::Enum(decl) => enum_to_schema(decl),
            Decl::Const(decl) => match &decl.init {
                Some(init) => super::zod::interpret_const_init(init, root, session)
                    .unwrap_or_else(|| {
                        debug!("Constant {} is not a recognizable schema", decl.name);
                        NormalizedSchema::untyped_object()
                    }),
                None => NormalizedSchema::untyped_object(),
            },
            Decl::Function(_) => NormalizedSchema::untyped_object(),
        }
    }

    fn members_to_object(
        &self,
        members: &[Member],
        table: &SymbolTable,
        root: &Path,
        session: &mut ResolutionSession,
    ) -> NormalizedSchema {
        let mut shape = ObjectShape::default();
        for member in members {
            let mut property = self.type_to_schema(&member.ty, table, root, session);
            if let Some(comment) = &member.comment {
                property.description = Some(comment.clone());
            }
            if !member.optional {
                shape.required.push(member.name.clone());
            }
            shape.properties.insert(member.name.clone(), property);
        }
        NormalizedSchema::object(shape)
    }

    fn type_to_schema(
        &self,
        ty: &TypeExpr,
        table: &SymbolTable,
        root: &Path,
        session: &mut ResolutionSession,
    ) -> NormalizedSchema {
        match ty {
            TypeExpr::Keyword(keyword) => keyword_to_schema(*keyword),
            TypeExpr::Literal(literal) => literal_to_schema(literal),
            TypeExpr::Array(inner) => {
                NormalizedSchema::array(self.type_to_schema(inner, table, root, session))
            }
            TypeExpr::Union(members) => {
                let resolved = members
                    .iter()
                    .map(|member| self.type_to_schema(member, table, root, session))
                    .collect();
                collapse_union(resolved)
            }
            TypeExpr::Intersection(members) => {
                let resolved: Vec<NormalizedSchema> = members
                    .iter()
                    .map(|member| self.type_to_schema(member, table, root, session))
                    .collect();
                self.merge_intersection(resolved, session)
            }
            TypeExpr::Object(members) => self.members_to_object(members, table, root, session),
            TypeExpr::Tuple(elems) => match elems.first() {
                // heterogeneous tuples are approximated by their first slot
                Some(first) => {
                    NormalizedSchema::array(self.type_to_schema(first, table, root, session))
                }
                None => NormalizedSchema::array(NormalizedSchema::untyped_object()),
            },
            TypeExpr::Named { name, args } => {
                self.named_to_schema(name, args, table, root, session)
            }
            TypeExpr::TypeQuery(_) | TypeExpr::Unknown => {
                debug!("Unrecognized type shape; using open schema");
                NormalizedSchema::untyped_object()
            }
        }
    }

    /// Merges intersection members: object members are layered in order
    /// (last object wins for conflicting keys); when no member is an object
    /// the members pass through as `allOf`.
    fn merge_intersection(
        &self,
        members: Vec<NormalizedSchema>,
        session: &ResolutionSession,
    ) -> NormalizedSchema {
        let concrete: Vec<NormalizedSchema> =
            members.iter().map(|m| deref_schema(m, session)).collect();
        if !concrete.iter().any(|m| m.is_object()) {
            return NormalizedSchema::all_of(members);
        }
        let mut merged = NormalizedSchema::untyped_object();
        for member in &concrete {
            if member.is_object() {
                merged.merge_object(member);
            }
        }
        merged
    }

    fn named_to_schema(
        &self,
        name: &str,
        args: &[TypeExpr],
        table: &SymbolTable,
        root: &Path,
        session: &mut ResolutionSession,
    ) -> NormalizedSchema {
        match name {
            "Array" | "ReadonlyArray" => match args.first() {
                Some(inner) => {
                    NormalizedSchema::array(self.type_to_schema(inner, table, root, session))
                }
                None => NormalizedSchema::array(NormalizedSchema::untyped_object()),
            },
            "Set" => {
                let mut schema = match args.first() {
                    Some(inner) => {
                        NormalizedSchema::array(self.type_to_schema(inner, table, root, session))
                    }
                    None => NormalizedSchema::array(NormalizedSchema::untyped_object()),
                };
                schema.unique_items = true;
                schema
            }
            "Record" => {
                // the value type is the last argument
                let value_schema = match args.last() {
                    Some(value) => self.type_to_schema(value, table, root, session),
                    None => NormalizedSchema::untyped_object(),
                };
                let mut shape = ObjectShape::default();
                shape.additional_properties = Some(Box::new(value_schema));
                NormalizedSchema::object(shape)
            }
            // the optionality/mutability distinction is not representable
            "Partial" | "Required" | "Readonly" | "NonNullable" | "Promise" | "Awaited" => {
                match args.first() {
                    Some(inner) => self.type_to_schema(inner, table, root, session),
                    None => NormalizedSchema::untyped_object(),
                }
            }
            "Pick" => self.project_keys(args, table, root, session, true),
            "Omit" => self.project_keys(args, table, root, session, false),
            "Date" => NormalizedSchema::date_time(),
            "z.infer" | "zod.infer" => match args.first() {
                Some(TypeExpr::TypeQuery(target)) => {
                    match super::zod::resolve_builder_name(target, root, session) {
                        Some(_) => NormalizedSchema::reference(target),
                        None => NormalizedSchema::untyped_object(),
                    }
                }
                _ => NormalizedSchema::untyped_object(),
            },
            _ => {
                if table.get(name).is_some() {
                    self.resolve_in_table(name, table, root, session, true);
                    NormalizedSchema::reference(name)
                } else {
                    debug!("Referenced type {} not found; using open schema", name);
                    NormalizedSchema::untyped_object()
                }
            }
        }
    }

    /// `Pick<T, Keys>` / `Omit<T, Keys>`: resolves the base without
    /// registering it as a standalone component and projects its properties.
    fn project_keys(
        &self,
        args: &[TypeExpr],
        table: &SymbolTable,
        root: &Path,
        session: &mut ResolutionSession,
        keep: bool,
    ) -> NormalizedSchema {
        let base = match args.first() {
            Some(TypeExpr::Named { name, args }) if args.is_empty() => {
                self.resolve_in_table(name, table, root, session, false)
            }
            Some(other) => self.type_to_schema(other, table, root, session),
            None => return NormalizedSchema::untyped_object(),
        };
        let base = deref_schema(&base, session);
        let keys = args.get(1).map(literal_keys).unwrap_or_default();

        let shape = match base.object_shape() {
            Some(shape) => shape,
            None => {
                debug!("Pick/Omit base did not resolve to an object");
                return NormalizedSchema::untyped_object();
            }
        };
        let mut projected = ObjectShape::default();
        for (prop_name, prop_schema) in &shape.properties {
            if keys.contains(prop_name) == keep {
                projected
                    .properties
                    .insert(prop_name.clone(), prop_schema.clone());
            }
        }
        projected.required = shape
            .required
            .iter()
            .filter(|name| keys.contains(*name) == keep)
            .cloned()
            .collect();
        NormalizedSchema::object(projected)
    }
}

impl NameResolver for TypeScriptResolver {
    fn resolve(
        &self,
        name: &str,
        root: &Path,
        session: &mut ResolutionSession,
    ) -> Option<NormalizedSchema> {
        if session.has_schema(name) {
            return Some(NormalizedSchema::reference(name));
        }
        if session.type_in_progress(name) {
            return Some(NormalizedSchema::reference(name));
        }
        let table = SymbolTable::build(root, session);
        table.get(name)?;
        Some(self.resolve_in_table(name, &table, root, session, true))
    }
}

fn keyword_to_schema(keyword: KeywordType) -> NormalizedSchema {
    match keyword {
        KeywordType::String => NormalizedSchema::string(),
        KeywordType::Number => NormalizedSchema::number(),
        KeywordType::Boolean => NormalizedSchema::boolean(),
        KeywordType::BigInt => {
            let mut schema = NormalizedSchema::integer();
            schema.format = Some("int64".to_string());
            schema
        }
        KeywordType::Null | KeywordType::Undefined | KeywordType::Void => NormalizedSchema::null(),
        KeywordType::Any
        | KeywordType::Unknown
        | KeywordType::Object
        | KeywordType::Never => NormalizedSchema::untyped_object(),
    }
}

fn literal_to_schema(literal: &LiteralValue) -> NormalizedSchema {
    if let LiteralValue::Str(text) = literal {
        if is_datetime_literal(text) {
            return NormalizedSchema::date_time();
        }
    }
    match literal {
        LiteralValue::Null => NormalizedSchema::null(),
        other => NormalizedSchema::literal(literal_value_to_json(other)),
    }
}

fn enum_to_schema(decl: &EnumDecl) -> NormalizedSchema {
    let numeric = decl
        .members
        .iter()
        .any(|member| matches!(member.value, Some(LiteralValue::Num(_))));
    let values = decl
        .members
        .iter()
        .map(|member| match &member.value {
            Some(value) => literal_value_to_json(value),
            None => serde_json::Value::String(member.name.clone()),
        })
        .collect();
    let primitive = if numeric { Primitive::Number } else { Primitive::String };
    NormalizedSchema::enum_of(primitive, values)
}

/// Extracts the string keys of a `Pick`/`Omit` key argument: a single string
/// literal or a union of them.
fn literal_keys(keys: &TypeExpr) -> Vec<String> {
    match keys {
        TypeExpr::Literal(LiteralValue::Str(key)) => vec![key.clone()],
        TypeExpr::Union(members) => members
            .iter()
            .filter_map(|member| match member {
                TypeExpr::Literal(LiteralValue::Str(key)) => Some(key.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// `2024-01-15T10:30:00Z`-shaped literals map to date-time strings.
fn is_datetime_literal(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() >= 16
        && bytes[..4].iter().all(|b| b.is_ascii_digit())
        && bytes[4] == b'-'
        && bytes[5].is_ascii_digit()
        && bytes[6].is_ascii_digit()
        && bytes[7] == b'-'
        && bytes[8].is_ascii_digit()
        && bytes[9].is_ascii_digit()
        && bytes[10] == b'T'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn project(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, content).unwrap();
        }
        dir
    }

    fn resolve(files: &[(&str, &str)], name: &str) -> (NormalizedSchema, ResolutionSession) {
        let dir = project(files);
        let mut session = ResolutionSession::new();
        let resolver = TypeScriptResolver::new();
        let schema = resolver.resolve_named(name, dir.path(), &mut session);
        (schema, session)
    }

    #[test]
    fn required_list_reflects_optional_markers() {
        let (schema, _) = resolve(
            &[("types.ts", "export interface Form { a: string; b?: number }")],
            "Form",
        );
        let shape = schema.object_shape().unwrap();
        assert_eq!(shape.required, vec!["a"]);
        assert_eq!(shape.properties.len(), 2);
    }

    #[test]
    fn literal_union_collapses_to_enum() {
        let (schema, _) = resolve(
            &[("types.ts", r#"export type Status = "a" | "b" | "c";"#)],
            "Status",
        );
        assert_eq!(
            schema.to_value(),
            json!({"type": "string", "enum": ["a", "b", "c"]})
        );
    }

    #[test]
    fn literal_plus_null_collapses_to_nullable() {
        let (schema, _) = resolve(
            &[("types.ts", r#"export type Maybe = "foo" | null;"#)],
            "Maybe",
        );
        assert_eq!(
            schema.to_value(),
            json!({"type": "string", "enum": ["foo"], "nullable": true})
        );
    }

    #[test]
    fn mixed_union_becomes_one_of() {
        let (schema, _) = resolve(
            &[("types.ts", "export type Id = string | number;")],
            "Id",
        );
        assert!(matches!(schema.kind, SchemaKind::OneOf(ref members) if members.len() == 2));
    }

    #[test]
    fn nested_type_becomes_reference_and_registers() {
        let (schema, session) = resolve(
            &[(
                "types.ts",
                "export interface User { profile: Profile }\ninterface Profile { bio: string }",
            )],
            "User",
        );
        let shape = schema.object_shape().unwrap();
        assert_eq!(
            shape.properties["profile"],
            NormalizedSchema::reference("Profile")
        );
        assert!(session.schema("Profile").is_some());
    }

    #[test]
    fn self_referential_type_resolves_finitely() {
        let (schema, _) = resolve(
            &[(
                "types.ts",
                "export interface Comment { id: number; replies: Comment[] }",
            )],
            "Comment",
        );
        let shape = schema.object_shape().unwrap();
        match &shape.properties["replies"].kind {
            SchemaKind::Array(items) => {
                assert_eq!(**items, NormalizedSchema::reference("Comment"));
            }
            other => panic!("expected array of references, got {other:?}"),
        }
    }

    #[test]
    fn extends_merges_inherited_members_first() {
        let (schema, _) = resolve(
            &[(
                "types.ts",
                "interface Base { id: number; kind: string }\nexport interface Admin extends Base { kind: \"admin\"; level: number }",
            )],
            "Admin",
        );
        let shape = schema.object_shape().unwrap();
        let names: Vec<_> = shape.properties.keys().cloned().collect();
        assert_eq!(names, vec!["id", "kind", "level"]);
        // own member overrides the inherited one
        assert_eq!(
            shape.properties["kind"].to_value(),
            json!({"type": "string", "enum": ["admin"]})
        );
    }

    #[test]
    fn pick_projects_only_named_keys() {
        let (schema, session) = resolve(
            &[(
                "types.ts",
                "interface Base { id: number; name: string; role: string }\nexport type Slim = Pick<Base, \"id\" | \"name\">;",
            )],
            "Slim",
        );
        let shape = schema.object_shape().unwrap();
        let names: Vec<_> = shape.properties.keys().cloned().collect();
        assert_eq!(names, vec!["id", "name"]);
        assert_eq!(shape.required, vec!["id", "name"]);
        // the base must not leak into the component table
        assert!(session.schema("Base").is_none());
    }

    #[test]
    fn omit_subtracts_named_keys() {
        let (schema, session) = resolve(
            &[(
                "types.ts",
                "interface Base { id: number; name: string; role: string }\nexport type Slim = Omit<Base, \"role\">;",
            )],
            "Slim",
        );
        let shape = schema.object_shape().unwrap();
        let names: Vec<_> = shape.properties.keys().cloned().collect();
        assert_eq!(names, vec!["id", "name"]);
        assert!(session.schema("Base").is_none());
    }

    #[test]
    fn record_maps_to_additional_properties() {
        let (schema, _) = resolve(
            &[("types.ts", "export type Counts = Record<string, number>;")],
            "Counts",
        );
        let shape = schema.object_shape().unwrap();
        assert_eq!(
            shape.additional_properties.as_deref(),
            Some(&NormalizedSchema::number())
        );
    }

    #[test]
    fn string_enum_declaration() {
        let (schema, _) = resolve(
            &[("types.ts", r#"export enum Role { Admin = "admin", User = "user" }"#)],
            "Role",
        );
        assert_eq!(
            schema.to_value(),
            json!({"type": "string", "enum": ["admin", "user"]})
        );
    }

    #[test]
    fn numeric_enum_declaration() {
        let (schema, _) = resolve(
            &[("types.ts", "export enum Level { Low = 1, High = 10 }")],
            "Level",
        );
        assert_eq!(schema.to_value(), json!({"type": "number", "enum": [1, 10]}));
    }

    #[test]
    fn enum_members_without_values_use_names() {
        let (schema, _) = resolve(
            &[("types.ts", "export enum Color { Red, Green }")],
            "Color",
        );
        assert_eq!(
            schema.to_value(),
            json!({"type": "string", "enum": ["Red", "Green"]})
        );
    }

    #[test]
    fn intersection_merges_object_members() {
        let (schema, _) = resolve(
            &[(
                "types.ts",
                "interface A { id: number }\ninterface B { name: string }\nexport type AB = A & B;",
            )],
            "AB",
        );
        let shape = schema.object_shape().unwrap();
        assert_eq!(shape.properties.len(), 2);
        assert_eq!(shape.required, vec!["id", "name"]);
    }

    #[test]
    fn non_object_intersection_passes_through_as_all_of() {
        let (schema, _) = resolve(
            &[("types.ts", "export type Weird = string & number;")],
            "Weird",
        );
        assert!(matches!(schema.kind, SchemaKind::AllOf(ref members) if members.len() == 2));
    }

    #[test]
    fn missing_type_degrades_to_open_schema() {
        let (schema, _) = resolve(&[("types.ts", "export const unrelated = 1;")], "Nope");
        assert_eq!(schema, NormalizedSchema::untyped_object());
    }

    #[test]
    fn missing_nested_type_degrades_locally() {
        let (schema, _) = resolve(
            &[("types.ts", "export interface Box { content: Mystery }")],
            "Box",
        );
        let shape = schema.object_shape().unwrap();
        assert_eq!(shape.properties["content"], NormalizedSchema::untyped_object());
    }

    #[test]
    fn trailing_comment_becomes_description() {
        let (schema, _) = resolve(
            &[(
                "types.ts",
                "export interface P {\n  id: number // the identifier\n}",
            )],
            "P",
        );
        let shape = schema.object_shape().unwrap();
        assert_eq!(
            shape.properties["id"].description.as_deref(),
            Some("the identifier")
        );
    }

    #[test]
    fn date_type_maps_to_date_time_string() {
        let (schema, _) = resolve(
            &[("types.ts", "export interface Evt { at: Date }")],
            "Evt",
        );
        let shape = schema.object_shape().unwrap();
        assert_eq!(
            shape.properties["at"].to_value(),
            json!({"type": "string", "format": "date-time"})
        );
    }

    #[test]
    fn array_generic_and_suffix_agree() {
        let (generic, _) = resolve(
            &[("types.ts", "export type A = Array<string>;")],
            "A",
        );
        let (suffix, _) = resolve(&[("types.ts", "export type A = string[];")], "A");
        assert_eq!(generic, suffix);
    }

    #[test]
    fn partial_passes_through_unchanged() {
        let (partial, session) = resolve(
            &[(
                "types.ts",
                "interface Base { id: number }\nexport type Loose = Partial<Base>;",
            )],
            "Loose",
        );
        // the optionality distinction is not represented: Partial<Base> is Base
        assert_eq!(partial, NormalizedSchema::reference("Base"));
        assert!(session.schema("Base").unwrap().is_object());
    }

    #[test]
    fn resolution_is_cached_across_lookups() {
        let dir = project(&[("types.ts", "export interface User { id: number }")]);
        let mut session = ResolutionSession::new();
        let resolver = TypeScriptResolver::new();

        let first = resolver.resolve_named("User", dir.path(), &mut session);
        let second = resolver.resolve_named("User", dir.path(), &mut session);

        assert!(first.is_object());
        // the second lookup returns a pointer to the cached component
        assert_eq!(second, NormalizedSchema::reference("User"));
    }
}
