//! Schema documents: the JSON form of a [`SchemaModel`] plus its call sites.
//!
//! ```json
//! {
//!   "types": [{ "name": "Person", "properties": [{ "name": "Age", "type": "int" }] }],
//!   "calls": [{ "serialize": "Person" }, { "deserialize": "list<Person>" }],
//!   "options": { "emit_unused_stubs": true }
//! }
//! ```
use std::path::Path;

use serde::Deserialize;

use super::{Direction, Property, SchemaModel, TypeDecl, expr};
use crate::codec::GeneratorOptions;
use crate::error::LoadError;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDocument {
    #[serde(default)]
    pub types: Vec<TypeDoc>,
    #[serde(default)]
    pub calls: Vec<CallDoc>,
    #[serde(default)]
    pub options: Option<GeneratorOptions>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeDoc {
    pub name: String,
    #[serde(default)]
    pub properties: Vec<PropertyDoc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertyDoc {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default = "default_true")]
    pub item_nullable: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallDoc {
    Serialize(String),
    Deserialize(String),
}

fn default_true() -> bool {
    true
}

impl SchemaDocument {
    pub fn from_json(src: &str, origin: &str) -> Result<Self, LoadError> {
        crate::path_de::from_str_with_path(src, origin)
    }

    pub fn read(path: &Path) -> Result<Self, LoadError> {
        let src = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&src, &path.to_string_lossy())
    }

    /// Adds this document's types and call sites to `model`, in document order.
    pub fn merge_into(self, model: &mut SchemaModel) -> Result<(), LoadError> {
        for ty in self.types {
            let mut decl = TypeDecl::new(ty.name);
            for p in ty.properties {
                let mut property = Property::new(p.name, expr::parse(&p.ty));
                property.nullable = p.nullable;
                property.list_item_nullable = p.item_nullable;
                decl = decl.property(property);
            }
            model.declare(decl)?;
        }
        for call in self.calls {
            let (direction, text) = match call {
                CallDoc::Serialize(text) => (Direction::Serialize, text),
                CallDoc::Deserialize(text) => (Direction::Deserialize, text),
            };
            model.invoke(direction, expr::parse(&text));
        }
        Ok(())
    }
}

/// Loads and merges documents in order. Options are combined: a flag set by any
/// document stays set.
pub fn load_documents<I, P>(paths: I) -> Result<(SchemaModel, GeneratorOptions), LoadError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut model = SchemaModel::new();
    let mut options = GeneratorOptions::default();
    for path in paths {
        let doc = SchemaDocument::read(path.as_ref())?;
        if let Some(doc_options) = &doc.options {
            options = options.merge(doc_options);
        }
        doc.merge_into(&mut model)?;
    }
    Ok((model, options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TypeShape;

    const BOOKS: &str = r#"{
        "types": [
            { "name": "Book", "properties": [
                { "name": "Title", "type": "string" },
                { "name": "Authors", "type": "list<Person>", "item_nullable": false },
                { "name": "Price", "type": "int" }
            ] },
            { "name": "Person", "properties": [
                { "name": "Name", "type": "string", "nullable": false }
            ] }
        ],
        "calls": [ { "serialize": "Book" }, { "deserialize": "list<Person>!" } ],
        "options": { "emit_unused_stubs": true }
    }"#;

    #[test]
    fn loads_types_calls_and_options() {
        let doc = SchemaDocument::from_json(BOOKS, "books.json").unwrap();
        assert_eq!(doc.options.as_ref().map(|o| o.emit_unused_stubs), Some(true));

        let mut model = SchemaModel::new();
        doc.merge_into(&mut model).unwrap();
        let book = model.get("Book").unwrap();
        assert_eq!(book.properties.len(), 3);
        assert!(!book.properties[1].list_item_nullable);
        assert_eq!(book.properties[1].shape, TypeShape::list(TypeShape::object("Person")));

        assert_eq!(model.calls().len(), 2);
        assert_eq!(model.calls()[0].direction, Direction::Serialize);
        assert_eq!(
            model.calls()[1].shape,
            TypeShape::List { element: Box::new(TypeShape::object("Person")), nullable: false }
        );
    }

    #[test]
    fn syntax_errors_carry_the_json_path() {
        let src = r#"{ "types": [ { "name": "A", "properties": [ { "name": "x" } ] } ] }"#;
        let err = SchemaDocument::from_json(src, "bad.json").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("bad.json"), "{message}");
        assert!(message.contains("types[0].properties[0]"), "{message}");
    }

    #[test]
    fn invalid_identifiers_are_rejected() {
        let src = r#"{ "types": [ { "name": "Not A Name" } ] }"#;
        let doc = SchemaDocument::from_json(src, "x.json").unwrap();
        let err = doc.merge_into(&mut SchemaModel::new()).unwrap_err();
        assert!(matches!(err, LoadError::InvalidIdentifier { .. }));
    }
}
