//! Sessions and the codecs they produce.
//!
//! A [`Session`] is one generation run over an immutable [`SchemaModel`]:
//! construct, [`Session::run`], discard. Every call site in the model gets an
//! entry in the resulting [`Codec`], keyed by its [`TypeShape`]; routines are
//! shared between entries through the session's dedup cache.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::emit::{Emitter, Routine, StubReason, default_value};
use crate::error::{CodecError, SchemaError};
use crate::exec::Machine;
use crate::ir::RoutineId;
use crate::listing::Listing;
use crate::lower::check_resolvable;
use crate::runtime::Cursor;
use crate::schema::{Direction, SchemaModel, TypeShape};
use crate::value::{Shaped, Value};

// ————————————————————————————————————————————————————————————————————————————
// OPTIONS & DIAGNOSTICS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorOptions {
    /// Give declared types that no call site uses inert entries, so tooling
    /// can still see them.
    pub emit_unused_stubs: bool,
}

impl GeneratorOptions {
    /// Flags set on either side stay set.
    pub fn merge(self, other: &Self) -> Self {
        Self { emit_unused_stubs: self.emit_unused_stubs || other.emit_unused_stubs }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// A call site got no entry.
    Error,
    /// A routine was replaced by a stub.
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// What was being generated, e.g. "serialize call site for `Person`".
    pub subject: String,
    pub error: SchemaError,
}

impl Diagnostic {
    pub fn error(subject: impl Into<String>, error: SchemaError) -> Self {
        Self { severity: Severity::Error, subject: subject.into(), error }
    }

    pub fn warning(subject: impl Into<String>, error: SchemaError) -> Self {
        Self { severity: Severity::Warning, subject: subject.into(), error }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.subject, self.error)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// SESSION
// ————————————————————————————————————————————————————————————————————————————

pub struct Session<'m> {
    model: &'m SchemaModel,
    options: GeneratorOptions,
}

pub struct Generation {
    pub codec: Codec,
    pub diagnostics: Vec<Diagnostic>,
}

impl Generation {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Warning)
    }
}

impl<'m> Session<'m> {
    pub fn new(model: &'m SchemaModel, options: GeneratorOptions) -> Self {
        Self { model, options }
    }

    /// Generates routines for every call site, in discovery order.
    pub fn run(self) -> Generation {
        let model = self.model;
        let _span = tracing::debug_span!("session", calls = model.calls().len()).entered();

        let mut emitter = Emitter::new(model);
        let mut entries: IndexMap<TypeShape, Entry> = IndexMap::new();

        for call in model.calls() {
            if let Err(error) = check_resolvable(model, &call.shape) {
                tracing::error!(shape = %call.shape, direction = %call.direction, %error, "call site has no entry");
                emitter.report(Diagnostic::error(
                    format!("{} call site for `{}`", call.direction, call.shape),
                    error,
                ));
                continue;
            }
            let id = emitter.emit(&call.shape, call.direction);
            entries
                .entry(call.shape.clone())
                .or_insert_with(|| Entry::new(default_value(model, &call.shape).unwrap_or_default()))
                .set(call.direction, id);
        }

        if self.options.emit_unused_stubs {
            for decl in model.types() {
                if emitter.cache().covers_object(&decl.name) {
                    continue;
                }
                tracing::debug!(type_name = %decl.name, "stubbing unused type");
                let shape = TypeShape::object(decl.name.clone());
                let mut entry = Entry::new(Value::Null);
                entry.write = Some(emitter.stub(&shape, Direction::Serialize, StubReason::Unused));
                entry.read = Some(emitter.stub(&shape, Direction::Deserialize, StubReason::Unused));
                entries.insert(shape, entry);
            }
        }

        let (routines, cache, diagnostics) = emitter.finish();
        tracing::debug!(routines = routines.len(), shapes = cache.len(), entries = entries.len(), "session finished");
        Generation { codec: Codec { routines, entries }, diagnostics }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// CODEC
// ————————————————————————————————————————————————————————————————————————————

/// Entry points for one call-site shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub write: Option<RoutineId>,
    pub read: Option<RoutineId>,
    /// Result of deserializing empty input.
    pub default: Value,
}

impl Entry {
    fn new(default: Value) -> Self {
        Self { write: None, read: None, default }
    }

    fn set(&mut self, direction: Direction, id: RoutineId) {
        match direction {
            Direction::Serialize => self.write = Some(id),
            Direction::Deserialize => self.read = Some(id),
        }
    }

    pub fn get(&self, direction: Direction) -> Option<RoutineId> {
        match direction {
            Direction::Serialize => self.write,
            Direction::Deserialize => self.read,
        }
    }
}

/// Precompiled routines plus the dispatch table. Immutable; share it freely
/// between threads.
#[derive(Debug, Clone)]
pub struct Codec {
    routines: Vec<Routine>,
    entries: IndexMap<TypeShape, Entry>,
}

impl Codec {
    pub fn serialize(&self, shape: &TypeShape, value: &Value) -> Result<String, CodecError> {
        let id = self.entry_point(shape, Direction::Serialize)?;
        let mut out = String::new();
        Machine::new(&self.routines).write(id, value, &mut out)?;
        Ok(out)
    }

    /// Empty or whitespace-only input yields the shape's default value.
    pub fn deserialize(&self, shape: &TypeShape, input: &str) -> Result<Value, CodecError> {
        let id = self.entry_point(shape, Direction::Deserialize)?;
        if input.bytes().all(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n')) {
            return Ok(self.entries[shape].default.clone());
        }
        let mut cursor = Cursor::new(input);
        Machine::new(&self.routines).read(id, &mut cursor)
    }

    pub fn serialize_as<T: Shaped>(&self, value: &T) -> Result<String, CodecError> {
        self.serialize(&T::shape(), &value.to_value())
    }

    pub fn deserialize_as<T: Shaped>(&self, input: &str) -> Result<T, CodecError> {
        T::from_value(self.deserialize(&T::shape(), input)?)
    }

    pub fn entry(&self, shape: &TypeShape) -> Option<&Entry> {
        self.entries.get(shape)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&TypeShape, &Entry)> {
        self.entries.iter()
    }

    pub fn routine(&self, id: RoutineId) -> Option<&Routine> {
        self.routines.get(id.index())
    }

    pub fn routines(&self) -> &[Routine] {
        &self.routines
    }

    /// Routines emitted for `direction`, stubs included.
    pub fn routine_count(&self, direction: Direction) -> usize {
        self.routines.iter().filter(|r| r.direction == direction).count()
    }

    pub fn stub_count(&self) -> usize {
        self.routines.iter().filter(|r| r.is_stub()).count()
    }

    pub fn listing(&self) -> Listing<'_> {
        Listing::new(self)
    }

    fn entry_point(&self, shape: &TypeShape, direction: Direction) -> Result<RoutineId, CodecError> {
        self.entries
            .get(shape)
            .and_then(|entry| entry.get(direction))
            .ok_or_else(|| CodecError::NoEntry { shape: shape.clone(), direction })
    }
}
