//! Schema → instruction trees, one builder per direction.
//!
//! Builders expand exactly one shape. Composite children (objects, lists) are
//! never expanded in place: they are resolved to a routine through a
//! [`RoutineResolver`] and referenced with a call, which is what keeps one
//! routine per distinct shape.
pub mod read;
pub mod write;

pub use read::ReadTreeBuilder;
pub use write::WriteTreeBuilder;

use crate::error::SchemaError;
use crate::ir::RoutineId;
use crate::schema::{Direction, SchemaModel, TypeShape};

/// Hands out routine ids for composite shapes, emitting routines on first use.
pub trait RoutineResolver {
    fn resolve(&mut self, shape: &TypeShape, direction: Direction) -> RoutineId;
}

/// Whether `shape` can have a routine at all: no unsupported parts and the
/// object at the bottom of any list chain is declared.
pub fn check_resolvable(model: &SchemaModel, shape: &TypeShape) -> Result<(), SchemaError> {
    if let Some(expr) = shape.unsupported_part() {
        return Err(SchemaError::Unsupported { expr: expr.to_string() });
    }
    if let Some(name) = shape.root_object() {
        if !model.is_declared(name) {
            return Err(SchemaError::Undeclared { name: name.to_string() });
        }
    }
    Ok(())
}
