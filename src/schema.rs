//! The normalized schema model shared by both name resolvers.
//!
//! `NormalizedSchema` is the tagged intermediate representation every
//! resolution produces; the assembler serializes it into the output
//! document's schema objects. Reference nodes always serialize as `$ref`
//! pointers into the shared component table — recursive and repeated types
//! are never expanded inline.

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Prefix for schema references in the emitted document.
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// A resolved schema: structural kind plus the metadata accumulated while
/// interpreting type expressions or builder chains.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSchema {
    pub kind: SchemaKind,
    pub nullable: bool,
    pub description: Option<String>,
    pub deprecated: bool,
    pub format: Option<String>,
    pub pattern: Option<String>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: bool,
    pub exclusive_maximum: bool,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: bool,
    pub default: Option<Value>,
    pub example: Option<Value>,
    /// Discriminator property name for discriminated unions.
    pub discriminator: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    Primitive(Primitive),
    Object(ObjectShape),
    Array(Box<NormalizedSchema>),
    Enum(EnumShape),
    OneOf(Vec<NormalizedSchema>),
    AllOf(Vec<NormalizedSchema>),
    /// A pointer to a named schema in the shared component table.
    Reference(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    String,
    Number,
    Integer,
    Boolean,
    Null,
}

impl Primitive {
    pub fn type_name(self) -> Option<&'static str> {
        match self {
            Primitive::String => Some("string"),
            Primitive::Number => Some("number"),
            Primitive::Integer => Some("integer"),
            Primitive::Boolean => Some("boolean"),
            // 3.0 has no null type; nullability carries the information
            Primitive::Null => None,
        }
    }
}

/// An object schema: properties in declaration order plus the required list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectShape {
    pub properties: IndexMap<String, NormalizedSchema>,
    pub required: Vec<String>,
    pub additional_properties: Option<Box<NormalizedSchema>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumShape {
    pub primitive: Primitive,
    pub values: Vec<Value>,
}

impl NormalizedSchema {
    pub fn new(kind: SchemaKind) -> Self {
        NormalizedSchema {
            kind,
            nullable: false,
            description: None,
            deprecated: false,
            format: None,
            pattern: None,
            minimum: None,
            maximum: None,
            exclusive_minimum: false,
            exclusive_maximum: false,
            min_length: None,
            max_length: None,
            min_items: None,
            max_items: None,
            unique_items: false,
            default: None,
            example: None,
            discriminator: None,
        }
    }

    pub fn primitive(primitive: Primitive) -> Self {
        Self::new(SchemaKind::Primitive(primitive))
    }

    pub fn string() -> Self {
        Self::primitive(Primitive::String)
    }

    pub fn number() -> Self {
        Self::primitive(Primitive::Number)
    }

    pub fn integer() -> Self {
        Self::primitive(Primitive::Integer)
    }

    pub fn boolean() -> Self {
        Self::primitive(Primitive::Boolean)
    }

    pub fn null() -> Self {
        let mut schema = Self::primitive(Primitive::Null);
        schema.nullable = true;
        schema
    }

    /// A date-time string.
    pub fn date_time() -> Self {
        let mut schema = Self::string();
        schema.format = Some("date-time".to_string());
        schema
    }

    /// The untyped-object fallback every unresolvable or unrecognized input
    /// degrades to.
    pub fn untyped_object() -> Self {
        Self::new(SchemaKind::Object(ObjectShape::default()))
    }

    pub fn object(shape: ObjectShape) -> Self {
        Self::new(SchemaKind::Object(shape))
    }

    pub fn array(items: NormalizedSchema) -> Self {
        Self::new(SchemaKind::Array(Box::new(items)))
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Self::new(SchemaKind::Reference(name.into()))
    }

    pub fn one_of(members: Vec<NormalizedSchema>) -> Self {
        Self::new(SchemaKind::OneOf(members))
    }

    pub fn all_of(members: Vec<NormalizedSchema>) -> Self {
        Self::new(SchemaKind::AllOf(members))
    }

    pub fn enum_of(primitive: Primitive, values: Vec<Value>) -> Self {
        Self::new(SchemaKind::Enum(EnumShape { primitive, values }))
    }

    /// A single-value enum for a literal type.
    pub fn literal(value: Value) -> Self {
        let primitive = match &value {
            Value::String(_) => Primitive::String,
            Value::Bool(_) => Primitive::Boolean,
            Value::Number(_) => Primitive::Number,
            _ => return Self::null(),
        };
        Self::enum_of(primitive, vec![value])
    }

    pub fn is_object(&self) -> bool {
        matches!(self.kind, SchemaKind::Object(_))
    }

    pub fn object_shape(&self) -> Option<&ObjectShape> {
        match &self.kind {
            SchemaKind::Object(shape) => Some(shape),
            _ => None,
        }
    }

    pub fn object_shape_mut(&mut self) -> Option<&mut ObjectShape> {
        match &mut self.kind {
            SchemaKind::Object(shape) => Some(shape),
            _ => None,
        }
    }

    /// Layers `other`'s properties and required list on top of this object.
    /// Conflicting property names take `other`'s schema. No-op unless both
    /// sides are objects.
    pub fn merge_object(&mut self, other: &NormalizedSchema) {
        let other_shape = match other.object_shape() {
            Some(shape) => shape.clone(),
            None => return,
        };
        if let Some(shape) = self.object_shape_mut() {
            for (name, schema) in other_shape.properties {
                shape.properties.insert(name, schema);
            }
            for name in other_shape.required {
                if !shape.required.contains(&name) {
                    shape.required.push(name);
                }
            }
            if other_shape.additional_properties.is_some() {
                shape.additional_properties = other_shape.additional_properties;
            }
        }
    }

    /// Serializes to the output document's schema-object form.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        match &self.kind {
            SchemaKind::Reference(name) => {
                let reference = Value::String(format!("{}{}", SCHEMA_REF_PREFIX, name));
                // `$ref` cannot carry sibling fields in the 3.0 dialect
                if self.has_metadata() {
                    let mut inner = Map::new();
                    inner.insert("$ref".to_string(), reference);
                    map.insert("allOf".to_string(), Value::Array(vec![Value::Object(inner)]));
                    self.write_metadata(&mut map);
                } else {
                    map.insert("$ref".to_string(), reference);
                }
                return Value::Object(map);
            }
            SchemaKind::Primitive(primitive) => {
                if let Some(name) = primitive.type_name() {
                    map.insert("type".to_string(), Value::String(name.to_string()));
                }
            }
            SchemaKind::Object(shape) => {
                map.insert("type".to_string(), Value::String("object".to_string()));
                if !shape.properties.is_empty() {
                    let mut props = Map::new();
                    for (name, schema) in &shape.properties {
                        props.insert(name.clone(), schema.to_value());
                    }
                    map.insert("properties".to_string(), Value::Object(props));
                }
                if !shape.required.is_empty() {
                    map.insert(
                        "required".to_string(),
                        Value::Array(
                            shape
                                .required
                                .iter()
                                .map(|r| Value::String(r.clone()))
                                .collect(),
                        ),
                    );
                }
                if let Some(additional) = &shape.additional_properties {
                    map.insert("additionalProperties".to_string(), additional.to_value());
                }
            }
            SchemaKind::Array(items) => {
                map.insert("type".to_string(), Value::String("array".to_string()));
                map.insert("items".to_string(), items.to_value());
            }
            SchemaKind::Enum(shape) => {
                if let Some(name) = shape.primitive.type_name() {
                    map.insert("type".to_string(), Value::String(name.to_string()));
                }
                map.insert("enum".to_string(), Value::Array(shape.values.clone()));
            }
            SchemaKind::OneOf(members) => {
                map.insert(
                    "oneOf".to_string(),
                    Value::Array(members.iter().map(|m| m.to_value()).collect()),
                );
                if let Some(discriminator) = &self.discriminator {
                    let mut disc = Map::new();
                    disc.insert(
                        "propertyName".to_string(),
                        Value::String(discriminator.clone()),
                    );
                    map.insert("discriminator".to_string(), Value::Object(disc));
                }
            }
            SchemaKind::AllOf(members) => {
                map.insert(
                    "allOf".to_string(),
                    Value::Array(members.iter().map(|m| m.to_value()).collect()),
                );
            }
        }
        self.write_metadata(&mut map);
        Value::Object(map)
    }

    fn has_metadata(&self) -> bool {
        self.nullable
            || self.deprecated
            || self.description.is_some()
            || self.format.is_some()
            || self.pattern.is_some()
            || self.minimum.is_some()
            || self.maximum.is_some()
            || self.min_length.is_some()
            || self.max_length.is_some()
            || self.min_items.is_some()
            || self.max_items.is_some()
            || self.unique_items
            || self.default.is_some()
            || self.example.is_some()
    }

    fn write_metadata(&self, map: &mut Map<String, Value>) {
        if let Some(format) = &self.format {
            map.insert("format".to_string(), Value::String(format.clone()));
        }
        if let Some(pattern) = &self.pattern {
            map.insert("pattern".to_string(), Value::String(pattern.clone()));
        }
        if let Some(minimum) = self.minimum {
            map.insert("minimum".to_string(), number_value(minimum));
            if self.exclusive_minimum {
                map.insert("exclusiveMinimum".to_string(), Value::Bool(true));
            }
        }
        if let Some(maximum) = self.maximum {
            map.insert("maximum".to_string(), number_value(maximum));
            if self.exclusive_maximum {
                map.insert("exclusiveMaximum".to_string(), Value::Bool(true));
            }
        }
        if let Some(min_length) = self.min_length {
            map.insert("minLength".to_string(), Value::from(min_length));
        }
        if let Some(max_length) = self.max_length {
            map.insert("maxLength".to_string(), Value::from(max_length));
        }
        if let Some(min_items) = self.min_items {
            map.insert("minItems".to_string(), Value::from(min_items));
        }
        if let Some(max_items) = self.max_items {
            map.insert("maxItems".to_string(), Value::from(max_items));
        }
        if self.unique_items {
            map.insert("uniqueItems".to_string(), Value::Bool(true));
        }
        if self.nullable {
            map.insert("nullable".to_string(), Value::Bool(true));
        }
        if let Some(description) = &self.description {
            map.insert("description".to_string(), Value::String(description.clone()));
        }
        if self.deprecated {
            map.insert("deprecated".to_string(), Value::Bool(true));
        }
        if let Some(default) = &self.default {
            map.insert("default".to_string(), default.clone());
        }
        if let Some(example) = &self.example {
            map.insert("example".to_string(), example.clone());
        }
    }
}

impl Serialize for NormalizedSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// Emits integral floats as JSON integers so bounds read as `5`, not `5.0`.
fn number_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::from(value as i64)
    } else {
        serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// Collapses resolved union members following the shared union rule: null
/// members fold into nullability, a lone remaining member absorbs the flag,
/// single-value enums of one primitive kind merge into a combined enum, and
/// anything else becomes `oneOf`.
pub fn collapse_union(members: Vec<NormalizedSchema>) -> NormalizedSchema {
    let mut nullable = false;
    let mut rest: Vec<NormalizedSchema> = Vec::new();
    for member in members {
        if matches!(member.kind, SchemaKind::Primitive(Primitive::Null)) {
            nullable = true;
        } else {
            rest.push(member);
        }
    }

    if rest.is_empty() {
        return NormalizedSchema::null();
    }
    if rest.len() == 1 {
        let mut single = rest.into_iter().next().unwrap();
        single.nullable |= nullable;
        return single;
    }

    let merged_enum = merge_literal_members(&rest);
    let mut schema = match merged_enum {
        Some(enum_schema) => enum_schema,
        None => NormalizedSchema::one_of(rest),
    };
    schema.nullable = nullable;
    schema
}

/// Merges members into one enum when each is a single-value enum of the same
/// primitive kind.
fn merge_literal_members(members: &[NormalizedSchema]) -> Option<NormalizedSchema> {
    let mut primitive: Option<Primitive> = None;
    let mut values = Vec::new();
    for member in members {
        let shape = match &member.kind {
            SchemaKind::Enum(shape) if shape.values.len() == 1 => shape,
            _ => return None,
        };
        match primitive {
            None => primitive = Some(shape.primitive),
            Some(existing) if existing == shape.primitive => {}
            Some(_) => return None,
        }
        let value = shape.values[0].clone();
        if !values.contains(&value) {
            values.push(value);
        }
    }
    Some(NormalizedSchema::enum_of(primitive?, values))
}
