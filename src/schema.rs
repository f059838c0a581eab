//! Schema model: the declared serializable types and the call sites that need
//! entry points.
//!
//! A model is assembled once (in code, or from schema documents via [`file`])
//! and only read afterwards. Objects reference their declaration by name, which
//! is what lets a type mention itself.
pub mod expr;
pub mod file;

use std::fmt;

use indexmap::IndexMap;

use crate::error::LoadError;

// ————————————————————————————————————————————————————————————————————————————
// SHAPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Int,
    String,
}

/// Shape of a serializable value. Identity includes nullability because the
/// null check is part of the emitted routine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeShape {
    Primitive(Primitive),
    Object { name: String, nullable: bool },
    List { element: Box<TypeShape>, nullable: bool },
    /// Anything outside the supported set, kept verbatim for diagnostics.
    Unsupported(String),
}

impl TypeShape {
    pub fn int() -> Self {
        TypeShape::Primitive(Primitive::Int)
    }

    pub fn string() -> Self {
        TypeShape::Primitive(Primitive::String)
    }

    /// Nullable reference to a declared type.
    pub fn object(name: impl Into<String>) -> Self {
        TypeShape::Object { name: name.into(), nullable: true }
    }

    /// Nullable list.
    pub fn list(element: TypeShape) -> Self {
        TypeShape::List { element: Box::new(element), nullable: true }
    }

    /// Ints are never nullable and strings always are; only objects and lists
    /// carry the flag.
    pub fn with_nullable(self, nullable: bool) -> Self {
        match self {
            TypeShape::Object { name, .. } => TypeShape::Object { name, nullable },
            TypeShape::List { element, .. } => TypeShape::List { element, nullable },
            other => other,
        }
    }

    pub fn is_nullable(&self) -> bool {
        match self {
            TypeShape::Primitive(Primitive::Int) => false,
            TypeShape::Primitive(Primitive::String) => true,
            TypeShape::Object { nullable, .. } | TypeShape::List { nullable, .. } => *nullable,
            TypeShape::Unsupported(_) => true,
        }
    }

    /// Objects and lists get routines of their own; primitives are inlined.
    pub fn is_composite(&self) -> bool {
        matches!(self, TypeShape::Object { .. } | TypeShape::List { .. })
    }

    /// The object at the bottom of a (possibly empty) chain of lists.
    pub fn root_object(&self) -> Option<&str> {
        match self {
            TypeShape::Object { name, .. } => Some(name),
            TypeShape::List { element, .. } => element.root_object(),
            _ => None,
        }
    }

    /// The first unsupported expression anywhere in the shape.
    pub fn unsupported_part(&self) -> Option<&str> {
        match self {
            TypeShape::Unsupported(expr) => Some(expr),
            TypeShape::List { element, .. } => element.unsupported_part(),
            _ => None,
        }
    }
}

impl fmt::Display for TypeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeShape::Primitive(Primitive::Int) => f.write_str("int"),
            TypeShape::Primitive(Primitive::String) => f.write_str("string"),
            TypeShape::Object { name, nullable } => {
                f.write_str(name)?;
                if !nullable { f.write_str("!")?; }
                Ok(())
            }
            TypeShape::List { element, nullable } => {
                write!(f, "list<{element}>")?;
                if !nullable { f.write_str("!")?; }
                Ok(())
            }
            TypeShape::Unsupported(expr) => f.write_str(expr),
        }
    }
}

impl std::str::FromStr for TypeShape {
    type Err = std::convert::Infallible;

    /// Never fails: unknown syntax becomes [`TypeShape::Unsupported`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(expr::parse(s))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// DECLARATIONS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub shape: TypeShape,
    pub nullable: bool,
    /// Only meaningful when `shape` is a list.
    pub list_item_nullable: bool,
}

impl Property {
    pub fn new(name: impl Into<String>, shape: TypeShape) -> Self {
        Self { name: name.into(), shape, nullable: true, list_item_nullable: true }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn items_not_null(mut self) -> Self {
        self.list_item_nullable = false;
        self
    }

    /// The shape as the property uses it: its own nullability on the outside,
    /// and for lists the element narrowed by `list_item_nullable`.
    pub fn effective_shape(&self) -> TypeShape {
        match &self.shape {
            TypeShape::List { element, .. } => {
                let element_nullable = element.is_nullable() && self.list_item_nullable;
                TypeShape::List {
                    element: Box::new(element.as_ref().clone().with_nullable(element_nullable)),
                    nullable: self.nullable,
                }
            }
            other => other.clone().with_nullable(self.nullable),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub name: String,
    /// Declaration order is emission order.
    pub properties: Vec<Property>,
}

impl TypeDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), properties: Vec::new() }
    }

    pub fn property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Serialize,
    Deserialize,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Serialize => f.write_str("serialize"),
            Direction::Deserialize => f.write_str("deserialize"),
        }
    }
}

/// One observed `Serialize<T>` / `Deserialize<T>` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub direction: Direction,
    pub shape: TypeShape,
}

// ————————————————————————————————————————————————————————————————————————————
// MODEL
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Default)]
pub struct SchemaModel {
    types: IndexMap<String, TypeDecl>,
    calls: Vec<CallSite>,
}

impl SchemaModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, decl: TypeDecl) -> Result<(), LoadError> {
        expr::check_identifier(&decl.name)?;
        if self.types.contains_key(&decl.name) {
            return Err(LoadError::DuplicateType { name: decl.name });
        }
        for (i, property) in decl.properties.iter().enumerate() {
            expr::check_identifier(&property.name)?;
            if decl.properties[..i].iter().any(|p| p.name == property.name) {
                return Err(LoadError::DuplicateProperty {
                    type_name: decl.name.clone(),
                    property: property.name.clone(),
                });
            }
        }
        self.types.insert(decl.name.clone(), decl);
        Ok(())
    }

    /// Builder-style [`SchemaModel::declare`].
    pub fn with_type(mut self, decl: TypeDecl) -> Result<Self, LoadError> {
        self.declare(decl)?;
        Ok(self)
    }

    pub fn invoke(&mut self, direction: Direction, shape: TypeShape) {
        self.calls.push(CallSite { direction, shape });
    }

    /// Records both directions for `shape`.
    pub fn invoke_both(&mut self, shape: TypeShape) {
        self.invoke(Direction::Serialize, shape.clone());
        self.invoke(Direction::Deserialize, shape);
    }

    pub fn get(&self, name: &str) -> Option<&TypeDecl> {
        self.types.get(name)
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Declarations in the order they were discovered.
    pub fn types(&self) -> impl Iterator<Item = &TypeDecl> {
        self.types.values()
    }

    pub fn calls(&self) -> &[CallSite] {
        &self.calls
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_shape_applies_property_flags() {
        let p = Property::new("Friends", TypeShape::list(TypeShape::object("Person")))
            .not_null()
            .items_not_null();
        assert_eq!(
            p.effective_shape(),
            TypeShape::List {
                element: Box::new(TypeShape::Object { name: "Person".into(), nullable: false }),
                nullable: false,
            }
        );

        let p = Property::new("Age", TypeShape::int());
        assert_eq!(p.effective_shape(), TypeShape::int());
        assert!(!p.effective_shape().is_nullable());
    }

    #[test]
    fn item_flag_cannot_make_non_nullable_elements_nullable() {
        let p = Property::new("Ids", TypeShape::list(TypeShape::int()));
        let TypeShape::List { element, .. } = p.effective_shape() else {
            panic!("expected a list");
        };
        assert_eq!(*element, TypeShape::int());
    }

    #[test]
    fn rejects_duplicates() {
        let mut model = SchemaModel::new();
        model.declare(TypeDecl::new("A")).unwrap();
        assert!(matches!(
            model.declare(TypeDecl::new("A")),
            Err(LoadError::DuplicateType { .. })
        ));

        let decl = TypeDecl::new("B")
            .property(Property::new("x", TypeShape::int()))
            .property(Property::new("x", TypeShape::string()));
        assert!(matches!(model.declare(decl), Err(LoadError::DuplicateProperty { .. })));
    }

    #[test]
    fn declaration_order_is_kept() {
        let model = SchemaModel::new()
            .with_type(TypeDecl::new("Zeta")).unwrap()
            .with_type(TypeDecl::new("Alpha")).unwrap();
        let names: Vec<_> = model.types().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Zeta", "Alpha"]);
    }

    #[test]
    fn root_object_walks_lists() {
        let shape = TypeShape::list(TypeShape::list(TypeShape::object("Person")));
        assert_eq!(shape.root_object(), Some("Person"));
        assert_eq!(TypeShape::int().root_object(), None);
    }
}
