use super::{RoutineResolver, check_resolvable};
use crate::error::SchemaError;
use crate::ir::{Append, Assign, ReadExpr, ReadNode};
use crate::schema::{Direction, Primitive, SchemaModel, TypeShape};

/// Builds the tree describing how to consume one value of a shape from the
/// shared cursor.
pub struct ReadTreeBuilder<'a, R: ?Sized> {
    model: &'a SchemaModel,
    resolver: &'a mut R,
}

impl<'a, R: RoutineResolver + ?Sized> ReadTreeBuilder<'a, R> {
    pub fn new(model: &'a SchemaModel, resolver: &'a mut R) -> Self {
        Self { model, resolver }
    }

    pub fn build_read_tree(&mut self, shape: &TypeShape) -> Result<ReadNode, SchemaError> {
        let model = self.model;
        match shape {
            TypeShape::Object { name, nullable } => {
                let decl = model
                    .get(name)
                    .ok_or_else(|| SchemaError::Undeclared { name: name.clone() })?;
                let mut properties = Vec::with_capacity(decl.properties.len());
                for (slot, property) in decl.properties.iter().enumerate() {
                    let expr = self.expr(&property.effective_shape())?;
                    properties.push((property.name.clone(), Assign { slot, expr }));
                }
                Ok(ReadNode::ObjectRead { type_name: name.clone(), nullable: *nullable, properties })
            }
            TypeShape::List { element, nullable } => {
                let expr = self.expr(element)?;
                Ok(ReadNode::ListRead { nullable: *nullable, element: Append { expr } })
            }
            other => self.expr(other).map(ReadNode::Expr),
        }
    }

    fn expr(&mut self, shape: &TypeShape) -> Result<ReadExpr, SchemaError> {
        match shape {
            TypeShape::Primitive(Primitive::Int) => Ok(ReadExpr::PrimitiveReadInt),
            TypeShape::Primitive(Primitive::String) => Ok(ReadExpr::PrimitiveReadString),
            TypeShape::Unsupported(expr) => Err(SchemaError::Unsupported { expr: expr.clone() }),
            composite => {
                check_resolvable(self.model, composite)?;
                Ok(ReadExpr::Call(self.resolver.resolve(composite, Direction::Deserialize)))
            }
        }
    }
}
