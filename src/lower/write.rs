use super::{RoutineResolver, check_resolvable};
use crate::error::SchemaError;
use crate::ir::{ValuePath, WriteNode};
use crate::schema::{Direction, SchemaModel, TypeShape};

/// Builds the tree describing how to print a value of one shape.
pub struct WriteTreeBuilder<'a, R: ?Sized> {
    model: &'a SchemaModel,
    resolver: &'a mut R,
}

impl<'a, R: RoutineResolver + ?Sized> WriteTreeBuilder<'a, R> {
    pub fn new(model: &'a SchemaModel, resolver: &'a mut R) -> Self {
        Self { model, resolver }
    }

    /// Expands `shape` bound at `accessor`. Object properties are emitted in
    /// declaration order; composite children become calls.
    pub fn build_write_tree(
        &mut self,
        shape: &TypeShape,
        accessor: ValuePath,
    ) -> Result<WriteNode, SchemaError> {
        let model = self.model;
        match shape {
            TypeShape::Primitive(kind) => Ok(WriteNode::PrimitiveWrite { kind: *kind, value: accessor }),
            TypeShape::Object { name, nullable } => {
                let decl = model
                    .get(name)
                    .ok_or_else(|| SchemaError::Undeclared { name: name.clone() })?;
                let mut properties = Vec::with_capacity(decl.properties.len());
                for (slot, property) in decl.properties.iter().enumerate() {
                    let subtree = self.child(&property.effective_shape(), ValuePath::Field(slot))?;
                    properties.push((property.name.clone(), subtree));
                }
                Ok(WriteNode::ObjectWrite { value: accessor, nullable: *nullable, properties })
            }
            TypeShape::List { element, nullable } => {
                let element = self.child(element, ValuePath::Element)?;
                Ok(WriteNode::ListWrite { value: accessor, nullable: *nullable, element: Box::new(element) })
            }
            TypeShape::Unsupported(expr) => Err(SchemaError::Unsupported { expr: expr.clone() }),
        }
    }

    fn child(&mut self, shape: &TypeShape, accessor: ValuePath) -> Result<WriteNode, SchemaError> {
        if !shape.is_composite() {
            return self.build_write_tree(shape, accessor);
        }
        check_resolvable(self.model, shape)?;
        let routine = self.resolver.resolve(shape, Direction::Serialize);
        Ok(WriteNode::Call { routine, value: accessor })
    }
}
