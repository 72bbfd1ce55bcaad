//! Name resolution: turning a referenced type/schema name into a
//! [`NormalizedSchema`].
//!
//! Two resolvers implement the same capability over genuinely different input
//! grammars: [`typescript::TypeScriptResolver`] walks structural type
//! declarations, [`zod::ZodResolver`] interprets builder-DSL call chains.
//! The route collector composes them in the order configured by
//! `schemaType`, falling back to the second when the first returns nothing.

pub mod typescript;
pub mod zod;

use crate::schema::{NormalizedSchema, SchemaKind};
use crate::session::ResolutionSession;
use crate::syntax::LiteralValue;
use serde_json::Value;
use std::path::Path;

/// The shared resolution capability.
///
/// `resolve` returns `None` when the name is not something this resolver
/// understands (letting the caller fall back to the other resolver), and a
/// degraded best-effort schema for anything it does claim — resolution never
/// fails hard.
pub trait NameResolver {
    fn resolve(
        &self,
        name: &str,
        root: &Path,
        session: &mut ResolutionSession,
    ) -> Option<NormalizedSchema>;
}

/// Tries each resolver in order, returning the first non-`None` result.
pub fn resolve_with_fallback(
    resolvers: &[&dyn NameResolver],
    name: &str,
    root: &Path,
    session: &mut ResolutionSession,
) -> Option<NormalizedSchema> {
    resolvers
        .iter()
        .find_map(|resolver| resolver.resolve(name, root, session))
}

/// Converts a syntax-level literal into its JSON value.
pub(crate) fn literal_value_to_json(literal: &LiteralValue) -> Value {
    match literal {
        LiteralValue::Str(text) => Value::String(text.clone()),
        LiteralValue::Num(num) => {
            if num.fract() == 0.0 && num.abs() < i64::MAX as f64 {
                Value::from(*num as i64)
            } else {
                serde_json::Number::from_f64(*num)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        LiteralValue::Bool(b) => Value::Bool(*b),
        LiteralValue::Null => Value::Null,
    }
}

/// Follows `Reference` nodes into the session's schema table, so callers that
/// need a concrete shape (object merging, parameter explosion) can look
/// through pointers. Unresolvable references are returned as-is; depth is
/// bounded to survive reference loops.
pub fn deref_schema(schema: &NormalizedSchema, session: &ResolutionSession) -> NormalizedSchema {
    let mut current = schema.clone();
    for _ in 0..8 {
        match &current.kind {
            SchemaKind::Reference(name) => match session.schema(name) {
                Some(target) => {
                    let next = target.clone();
                    if matches!(&next.kind, SchemaKind::Reference(n) if n == name) {
                        break;
                    }
                    current = next;
                }
                None => break,
            },
            _ => break,
        }
    }
    current
}
