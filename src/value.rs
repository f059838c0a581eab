//! Values the emitted routines operate on, and the hand-written bridge from
//! user types.
//!
//! Records are positional: field `i` is the `i`-th declared property. Routines
//! never look fields up by name at write time.

use serde_json::{Map, Value as Json};

use crate::error::CodecError;
use crate::schema::{Primitive, SchemaModel, TypeShape};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Value {
    #[default]
    Null,
    Int(i64),
    Str(String),
    Object(Record),
    List(Vec<Value>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub type_name: String,
    pub fields: Vec<Value>,
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "int",
            Value::Str(_) => "string",
            Value::Object(_) => "object",
            Value::List(_) => "list",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record)
    }
}

impl Record {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self { type_name: type_name.into(), fields: Vec::new() }
    }

    pub fn field(mut self, value: impl Into<Value>) -> Self {
        self.fields.push(value.into());
        self
    }
}

pub(crate) fn mismatch(expected: impl ToString, found: &Value) -> CodecError {
    CodecError::Mismatch { expected: expected.to_string(), found: found.kind() }
}

// ————————————————————————————————————————————————————————————————————————————
// TYPED BRIDGE
// ————————————————————————————————————————————————————————————————————————————

/// A Rust type with a fixed [`TypeShape`]. Implemented here for the primitive
/// and container types, and by hand for user records.
///
/// ```
/// use json_prebake::{CodecError, FieldReader, Record, Shaped, TypeShape, Value};
///
/// struct Chapter { name: Option<String>, page_begin: i64 }
///
/// impl Shaped for Chapter {
///     fn shape() -> TypeShape {
///         TypeShape::object("Chapter").with_nullable(false)
///     }
///     fn to_value(&self) -> Value {
///         Record::new("Chapter")
///             .field(self.name.to_value())
///             .field(self.page_begin.to_value())
///             .into()
///     }
///     fn from_value(value: Value) -> Result<Self, CodecError> {
///         let mut fields = FieldReader::open(value, "Chapter")?;
///         Ok(Chapter { name: fields.next()?, page_begin: fields.next()? })
///     }
/// }
/// ```
pub trait Shaped: Sized {
    fn shape() -> TypeShape;
    fn to_value(&self) -> Value;
    fn from_value(value: Value) -> Result<Self, CodecError>;
}

impl Shaped for i64 {
    fn shape() -> TypeShape {
        TypeShape::int()
    }

    fn to_value(&self) -> Value {
        Value::Int(*self)
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Int(i) => Ok(i),
            other => Err(mismatch("int", &other)),
        }
    }
}

impl Shaped for String {
    fn shape() -> TypeShape {
        TypeShape::string()
    }

    fn to_value(&self) -> Value {
        Value::Str(self.clone())
    }

    /// A JSON `null` string only fits `Option<String>`.
    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl<T: Shaped> Shaped for Vec<T> {
    fn shape() -> TypeShape {
        TypeShape::List { element: Box::new(T::shape()), nullable: false }
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(Shaped::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(mismatch(Self::shape(), &other)),
        }
    }
}

/// `None` is `null`. Wrapping an `i64` does not make ints nullable: writing
/// `None::<i64>` is a mismatch.
impl<T: Shaped> Shaped for Option<T> {
    fn shape() -> TypeShape {
        T::shape().with_nullable(true)
    }

    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// Reads a record's fields back in declaration order.
#[derive(Debug)]
pub struct FieldReader {
    type_name: String,
    fields: std::vec::IntoIter<Value>,
}

impl FieldReader {
    pub fn open(value: Value, type_name: &str) -> Result<Self, CodecError> {
        match value {
            Value::Object(record) if record.type_name == type_name => Ok(Self {
                type_name: record.type_name,
                fields: record.fields.into_iter(),
            }),
            other => Err(mismatch(type_name, &other)),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next<T: Shaped>(&mut self) -> Result<T, CodecError> {
        match self.fields.next() {
            Some(value) => T::from_value(value),
            None => Err(CodecError::Mismatch {
                expected: format!("another `{}` field", self.type_name),
                found: "end of record",
            }),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// PLAIN JSON BRIDGE
// ————————————————————————————————————————————————————————————————————————————

/// Converts standard JSON into a positional [`Value`] of `shape`. Object keys
/// are matched against declared property names; missing keys read as `null`.
pub fn from_json(json: &Json, shape: &TypeShape, model: &SchemaModel) -> Result<Value, CodecError> {
    let unexpected = |expected: &TypeShape| CodecError::Mismatch {
        expected: expected.to_string(),
        found: json_kind(json),
    };
    match (shape, json) {
        (_, Json::Null) if shape.is_nullable() => Ok(Value::Null),
        (TypeShape::Primitive(Primitive::Int), Json::Number(n)) => {
            n.as_i64().map(Value::Int).ok_or_else(|| unexpected(shape))
        }
        (TypeShape::Primitive(Primitive::String), Json::String(s)) => Ok(Value::Str(s.clone())),
        (TypeShape::List { element, .. }, Json::Array(items)) => items
            .iter()
            .map(|item| from_json(item, element, model))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        (TypeShape::Object { name, .. }, Json::Object(map)) => {
            let decl = model.get(name).ok_or_else(|| unexpected(shape))?;
            let mut record = Record::new(name.clone());
            for property in &decl.properties {
                let field = map.get(&property.name).unwrap_or(&Json::Null);
                record.fields.push(from_json(field, &property.effective_shape(), model)?);
            }
            Ok(Value::Object(record))
        }
        _ => Err(unexpected(shape)),
    }
}

/// Converts a positional [`Value`] back into standard JSON, naming record
/// fields from their declarations.
pub fn to_json(value: &Value, model: &SchemaModel) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Int(i) => Json::from(*i),
        Value::Str(s) => Json::from(s.clone()),
        Value::List(items) => Json::Array(items.iter().map(|v| to_json(v, model)).collect()),
        Value::Object(record) => {
            let decl = model.get(&record.type_name);
            let mut map = Map::new();
            for (i, field) in record.fields.iter().enumerate() {
                let key = decl
                    .and_then(|d| d.properties.get(i))
                    .map(|p| p.name.clone())
                    .unwrap_or_else(|| format!("field{i}"));
                map.insert(key, to_json(field, model));
            }
            Json::Object(map)
        }
    }
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
