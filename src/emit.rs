//! Routine emission and the per-session dedup cache.
//!
//! Every distinct (shape, direction) pair gets at most one routine. The id is
//! reserved before the body is built, so a shape that reaches itself again
//! (directly or through lists/other objects) resolves to its own routine and
//! becomes a true recursive call instead of an endless expansion.

use indexmap::IndexMap;

use crate::codec::Diagnostic;
use crate::error::SchemaError;
use crate::ir::{ReadExpr, ReadNode, RoutineId, ValuePath, WriteInstr};
use crate::lower::{ReadTreeBuilder, RoutineResolver, WriteTreeBuilder};
use crate::optimize::optimize;
use crate::schema::{Direction, Primitive, SchemaModel, TypeShape};
use crate::value::{Record, Value};

// ————————————————————————————————————————————————————————————————————————————
// ROUTINES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routine {
    pub id: RoutineId,
    pub shape: TypeShape,
    pub direction: Direction,
    /// Declared property count when `shape` is an object.
    pub field_count: Option<usize>,
    pub body: RoutineBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutineBody {
    Write(Vec<WriteInstr>),
    Read(ReadProgram),
    /// Inert placeholder: writes nothing, reads the default value.
    Stub(StubReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubReason {
    /// The shape could not be turned into a tree.
    Schema(SchemaError),
    /// Declared but never requested; emitted only when asked for.
    Unused,
    /// Reserved and still being built.
    Pending,
}

/// Executable form of a read tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadProgram {
    Scalar(ReadOp),
    Object {
        type_name: String,
        nullable: bool,
        /// Declaration order; the lookup is a linear scan, first match wins.
        fields: Vec<FieldRead>,
        /// Starting value of each slot, used for properties missing from input.
        defaults: Vec<Value>,
    },
    List {
        nullable: bool,
        element: ReadOp,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRead {
    pub name: String,
    pub slot: usize,
    pub op: ReadOp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOp {
    Int,
    Str,
    Call(RoutineId),
}

impl From<ReadExpr> for ReadOp {
    fn from(expr: ReadExpr) -> Self {
        match expr {
            ReadExpr::PrimitiveReadInt => ReadOp::Int,
            ReadExpr::PrimitiveReadString => ReadOp::Str,
            ReadExpr::Call(id) => ReadOp::Call(id),
        }
    }
}

impl Routine {
    pub fn is_stub(&self) -> bool {
        matches!(self.body, RoutineBody::Stub(_))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// CACHE
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheEntry {
    pub write: Option<RoutineId>,
    pub read: Option<RoutineId>,
}

impl CacheEntry {
    pub fn get(&self, direction: Direction) -> Option<RoutineId> {
        match direction {
            Direction::Serialize => self.write,
            Direction::Deserialize => self.read,
        }
    }

    fn slot(&mut self, direction: Direction) -> &mut Option<RoutineId> {
        match direction {
            Direction::Serialize => &mut self.write,
            Direction::Deserialize => &mut self.read,
        }
    }
}

/// Shape → routine ids. Lives for one session only.
#[derive(Debug, Clone, Default)]
pub struct RoutineCache {
    entries: IndexMap<TypeShape, CacheEntry>,
}

impl RoutineCache {
    pub fn get(&self, shape: &TypeShape, direction: Direction) -> Option<RoutineId> {
        self.entries.get(shape).and_then(|e| e.get(direction))
    }

    fn insert(&mut self, shape: TypeShape, direction: Direction, id: RoutineId) {
        *self.entries.entry(shape).or_default().slot(direction) = Some(id);
    }

    /// Whether any routine exists for object `name`, at either nullability.
    pub fn covers_object(&self, name: &str) -> bool {
        self.entries.keys().any(|shape| matches!(shape, TypeShape::Object { name: n, .. } if n == name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// EMITTER
// ————————————————————————————————————————————————————————————————————————————

pub struct Emitter<'m> {
    model: &'m SchemaModel,
    cache: RoutineCache,
    routines: Vec<Routine>,
    diagnostics: Vec<Diagnostic>,
}

impl<'m> Emitter<'m> {
    pub fn new(model: &'m SchemaModel) -> Self {
        Self { model, cache: RoutineCache::default(), routines: Vec::new(), diagnostics: Vec::new() }
    }

    /// Returns the routine for `shape`, building it on first request. A shape
    /// that cannot be built gets a stub and a warning.
    pub fn emit(&mut self, shape: &TypeShape, direction: Direction) -> RoutineId {
        if let Some(id) = self.cache.get(shape, direction) {
            tracing::trace!(%shape, %direction, routine = %id, "routine cache hit");
            return id;
        }
        let id = self.reserve(shape, direction, StubReason::Pending);

        let body = match direction {
            Direction::Serialize => self.lower_write(shape).map(RoutineBody::Write),
            Direction::Deserialize => self.lower_read(shape).map(RoutineBody::Read),
        };
        let body = body.unwrap_or_else(|error| {
            tracing::warn!(%shape, %direction, %error, "substituting stub routine");
            self.diagnostics.push(Diagnostic::warning(
                format!("{direction} routine for `{shape}`"),
                error.clone(),
            ));
            RoutineBody::Stub(StubReason::Schema(error))
        });
        tracing::debug!(%shape, %direction, routine = %id, stub = matches!(body, RoutineBody::Stub(_)), "routine defined");
        self.routines[id.index()].body = body;
        id
    }

    /// Registers an inert routine for `shape` without building anything.
    pub fn stub(&mut self, shape: &TypeShape, direction: Direction, reason: StubReason) -> RoutineId {
        match self.cache.get(shape, direction) {
            Some(id) => id,
            None => self.reserve(shape, direction, reason),
        }
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn cache(&self) -> &RoutineCache {
        &self.cache
    }

    pub fn finish(self) -> (Vec<Routine>, RoutineCache, Vec<Diagnostic>) {
        (self.routines, self.cache, self.diagnostics)
    }

    fn reserve(&mut self, shape: &TypeShape, direction: Direction, reason: StubReason) -> RoutineId {
        let id = RoutineId::new(self.routines.len());
        let field_count = match shape {
            TypeShape::Object { name, .. } => self.model.get(name).map(|decl| decl.properties.len()),
            _ => None,
        };
        self.routines.push(Routine {
            id,
            shape: shape.clone(),
            direction,
            field_count,
            body: RoutineBody::Stub(reason),
        });
        self.cache.insert(shape.clone(), direction, id);
        id
    }

    fn lower_write(&mut self, shape: &TypeShape) -> Result<Vec<WriteInstr>, SchemaError> {
        let model = self.model;
        let tree = WriteTreeBuilder::new(model, self).build_write_tree(shape, ValuePath::Arg)?;
        Ok(optimize(tree.flatten()))
    }

    fn lower_read(&mut self, shape: &TypeShape) -> Result<ReadProgram, SchemaError> {
        let model = self.model;
        let tree = ReadTreeBuilder::new(model, self).build_read_tree(shape)?;
        Ok(match tree {
            ReadNode::Expr(expr) => ReadProgram::Scalar(expr.into()),
            ReadNode::ListRead { nullable, element } => {
                ReadProgram::List { nullable, element: element.expr.into() }
            }
            ReadNode::ObjectRead { type_name, nullable, properties } => {
                let Value::Object(record) = default_value(model, &shape.clone().with_nullable(false))? else {
                    return Err(SchemaError::Undeclared { name: type_name });
                };
                let fields = properties
                    .into_iter()
                    .map(|(name, assign)| FieldRead { name, slot: assign.slot, op: assign.expr.into() })
                    .collect();
                ReadProgram::Object { type_name, nullable, fields, defaults: record.fields }
            }
        })
    }
}

impl RoutineResolver for Emitter<'_> {
    fn resolve(&mut self, shape: &TypeShape, direction: Direction) -> RoutineId {
        self.emit(shape, direction)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// DEFAULTS
// ————————————————————————————————————————————————————————————————————————————

/// The value a shape takes when input is empty, `null`, or omits it: `null`
/// for anything nullable, `0`, an empty list, or a record of field defaults.
pub fn default_value(model: &SchemaModel, shape: &TypeShape) -> Result<Value, SchemaError> {
    let mut visiting = Vec::new();
    default_inner(model, shape, &mut visiting)
}

fn default_inner<'m>(
    model: &'m SchemaModel,
    shape: &TypeShape,
    visiting: &mut Vec<&'m str>,
) -> Result<Value, SchemaError> {
    match shape {
        _ if shape.is_nullable() => Ok(Value::Null),
        TypeShape::Primitive(Primitive::Int) => Ok(Value::Int(0)),
        TypeShape::List { .. } => Ok(Value::List(Vec::new())),
        TypeShape::Object { name, .. } => {
            let decl = model
                .get(name)
                .ok_or_else(|| SchemaError::Undeclared { name: name.clone() })?;
            if visiting.contains(&decl.name.as_str()) {
                return Err(SchemaError::UnboundedDefault { name: name.clone() });
            }
            visiting.push(&decl.name);
            let mut record = Record::new(name.clone());
            for property in &decl.properties {
                record.fields.push(default_inner(model, &property.effective_shape(), visiting)?);
            }
            visiting.pop();
            Ok(Value::Object(record))
        }
        // strings and unsupported shapes are nullable
        TypeShape::Primitive(Primitive::String) | TypeShape::Unsupported(_) => Ok(Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Property, TypeDecl};

    fn model() -> SchemaModel {
        SchemaModel::new()
            .with_type(
                TypeDecl::new("Person")
                    .property(Property::new("Name", TypeShape::string()))
                    .property(Property::new("Age", TypeShape::int())),
            )
            .unwrap()
            .with_type(
                TypeDecl::new("Team")
                    .property(Property::new("Lead", TypeShape::object("Person")).not_null())
                    .property(Property::new("Members", TypeShape::list(TypeShape::object("Person"))).not_null()),
            )
            .unwrap()
            .with_type(
                TypeDecl::new("Node")
                    .property(Property::new("Children", TypeShape::list(TypeShape::object("Node")))),
            )
            .unwrap()
            .with_type(
                TypeDecl::new("Ouroboros")
                    .property(Property::new("Tail", TypeShape::object("Ouroboros")).not_null()),
            )
            .unwrap()
    }

    #[test]
    fn second_request_hits_the_cache() {
        let model = model();
        let mut emitter = Emitter::new(&model);
        let a = emitter.emit(&TypeShape::object("Person"), Direction::Serialize);
        let b = emitter.emit(&TypeShape::object("Person"), Direction::Serialize);
        let c = emitter.emit(&TypeShape::object("Person"), Direction::Deserialize);
        assert_eq!(a, b);
        assert_ne!(a, c);
        let (routines, cache, diagnostics) = emitter.finish();
        assert_eq!(routines.len(), 2);
        assert_eq!(cache.len(), 1);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn write_routine_is_optimized() {
        let model = model();
        let mut emitter = Emitter::new(&model);
        let id = emitter.emit(&TypeShape::object("Person"), Direction::Serialize);
        let (routines, _, _) = emitter.finish();
        assert_eq!(
            routines[id.index()].body,
            RoutineBody::Write(vec![
                WriteInstr::NullGuard(ValuePath::Arg),
                WriteInstr::Literal("{\n\"Name\": ".into()),
                WriteInstr::Str(ValuePath::Field(0)),
                WriteInstr::Literal(",\n\"Age\": ".into()),
                WriteInstr::Int(ValuePath::Field(1)),
                WriteInstr::Literal("\n}".into()),
            ])
        );
    }

    #[test]
    fn recursive_shapes_call_themselves() {
        let model = model();
        let mut emitter = Emitter::new(&model);
        let node = emitter.emit(&TypeShape::object("Node"), Direction::Deserialize);
        let (routines, _, diagnostics) = emitter.finish();
        assert!(diagnostics.is_empty());
        assert_eq!(routines.len(), 2);

        let RoutineBody::Read(ReadProgram::Object { fields, .. }) = &routines[node.index()].body else {
            panic!("expected an object program");
        };
        let ReadOp::Call(children) = fields[0].op else {
            panic!("expected a call");
        };
        assert_eq!(
            routines[children.index()].body,
            RoutineBody::Read(ReadProgram::List { nullable: true, element: ReadOp::Call(node) })
        );
    }

    #[test]
    fn non_nullable_self_reference_becomes_a_stub() {
        let model = model();
        let mut emitter = Emitter::new(&model);
        let id = emitter.emit(&TypeShape::object("Ouroboros"), Direction::Deserialize);
        let (routines, _, diagnostics) = emitter.finish();
        assert_eq!(
            routines[id.index()].body,
            RoutineBody::Stub(StubReason::Schema(SchemaError::UnboundedDefault { name: "Ouroboros".into() }))
        );
        // the non-null `Tail` shape gets its own routine, stubbed as well
        assert_eq!(routines.len(), 2);
        assert!(routines.iter().all(Routine::is_stub));
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn defaults_follow_nullability() {
        let model = model();
        assert_eq!(default_value(&model, &TypeShape::object("Team")).unwrap(), Value::Null);
        assert_eq!(
            default_value(&model, &TypeShape::object("Team").with_nullable(false)).unwrap(),
            Value::Object(
                Record::new("Team")
                    .field(Record::new("Person").field(Value::Null).field(Value::Int(0)))
                    .field(Value::List(vec![]))
            )
        );
    }
}
