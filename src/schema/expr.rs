//! Type expressions: `int`, `string`, `list<T>`, `Name`, each optionally
//! suffixed with `?` (nullable, the default) or `!` (not null).
use once_cell::sync::Lazy;
use regex::Regex;

use super::TypeShape;
use crate::error::LoadError;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

/// Scalar names that look like types but have no codec.
const UNSUPPORTED_NAMES: &[&str] = &[
    "bool", "boolean", "byte", "char", "date", "decimal", "double", "float", "long", "map",
    "object", "short", "uint",
];

pub fn is_identifier(text: &str) -> bool {
    IDENTIFIER.is_match(text)
}

pub(crate) fn check_identifier(text: &str) -> Result<(), LoadError> {
    if is_identifier(text) {
        Ok(())
    } else {
        Err(LoadError::InvalidIdentifier { name: text.to_string() })
    }
}

/// Parses a type expression. Never fails: anything not understood becomes
/// [`TypeShape::Unsupported`] holding the trimmed text.
pub fn parse(text: &str) -> TypeShape {
    let text = text.trim();
    parse_inner(text).unwrap_or_else(|| TypeShape::Unsupported(text.to_string()))
}

fn parse_inner(text: &str) -> Option<TypeShape> {
    let (body, nullable) = if let Some(body) = text.strip_suffix('?') {
        (body.trim_end(), true)
    } else if let Some(body) = text.strip_suffix('!') {
        (body.trim_end(), false)
    } else {
        (text, true)
    };

    if let Some(open) = body.find('<') {
        let inner = body.strip_suffix('>')?;
        let head = inner[..open].trim();
        if head != "list" {
            return None;
        }
        let element = parse_inner(inner[open + 1..].trim())?;
        return Some(TypeShape::List { element: Box::new(element), nullable });
    }

    if !is_identifier(body) {
        return None;
    }
    match body {
        "int" => Some(TypeShape::int()),
        "string" => Some(TypeShape::string()),
        "list" => None,
        name if UNSUPPORTED_NAMES.contains(&name) => None,
        name => Some(TypeShape::Object { name: name.to_string(), nullable }),
    }
}
