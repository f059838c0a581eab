use std::path::PathBuf;

use thiserror::Error;

use crate::runtime::ParseError;
use crate::schema::{Direction, TypeShape};

/// Generation-time problems with a shape. Scoped to one routine or call site;
/// everything else in the session still generates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("type expression `{expr}` is not a supported shape (int, string, list<T> or a declared type)")]
    Unsupported { expr: String },
    #[error("type `{name}` is not found or not declared serializable")]
    Undeclared { name: String },
    #[error("type `{name}` contains itself through non-nullable properties and has no finite default value")]
    UnboundedDefault { name: String },
}

/// Problems building a [`crate::schema::SchemaModel`], from code or from a
/// schema document.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid schema document ({origin}): {message}")]
    Document { origin: String, message: String },
    #[error("`{name}` is not a valid identifier")]
    InvalidIdentifier { name: String },
    #[error("type `{name}` is declared more than once")]
    DuplicateType { name: String },
    #[error("type `{type_name}` declares property `{property}` more than once")]
    DuplicateProperty { type_name: String, property: String },
}

/// Call-time failures of a generated codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("value mismatch: expected {expected}, found {found}")]
    Mismatch { expected: String, found: &'static str },
    #[error("no {direction} entry point for `{shape}`")]
    NoEntry { shape: TypeShape, direction: Direction },
    #[error("value nested deeper than {limit} levels")]
    DepthLimit { limit: usize },
}
