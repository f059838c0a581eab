//! Runs emitted routines.
//!
//! Routines are plain data in one table; calls between them are indices into
//! it. Writers append to one caller-owned buffer, readers share one cursor.

use crate::emit::{ReadOp, ReadProgram, Routine, RoutineBody};
use crate::error::CodecError;
use crate::ir::{RoutineId, ValuePath, WriteInstr};
use crate::runtime::{Cursor, Expected, MAX_DEPTH, NULL_LITERAL, write_int, write_str};
use crate::schema::{Direction, TypeShape};
use crate::value::{Record, Value, mismatch};

#[derive(Debug, Clone, Copy)]
pub struct Machine<'c> {
    routines: &'c [Routine],
}

enum Flow {
    Continue,
    Return,
}

impl<'c> Machine<'c> {
    pub fn new(routines: &'c [Routine]) -> Self {
        Self { routines }
    }

    fn routine(&self, id: RoutineId) -> &'c Routine {
        &self.routines[id.index()]
    }

    // ————————————————————————————————————————————————————————————————————————
    // WRITE
    // ————————————————————————————————————————————————————————————————————————

    pub fn write(&self, id: RoutineId, value: &Value, out: &mut String) -> Result<(), CodecError> {
        self.write_at(id, value, out, 0)
    }

    fn write_at(&self, id: RoutineId, value: &Value, out: &mut String, depth: usize) -> Result<(), CodecError> {
        let routine = self.routine(id);
        let instrs = match &routine.body {
            RoutineBody::Write(instrs) => instrs,
            RoutineBody::Stub(_) => return Ok(()),
            RoutineBody::Read(_) => return Err(wrong_direction(routine, Direction::Serialize)),
        };
        if depth >= MAX_DEPTH {
            return Err(CodecError::DepthLimit { limit: MAX_DEPTH });
        }
        check_argument(routine, value)?;
        self.run_block(instrs, value, None, out, depth + 1).map(|_| ())
    }

    fn run_block(
        &self,
        instrs: &[WriteInstr],
        arg: &Value,
        item: Option<&Value>,
        out: &mut String,
        depth: usize,
    ) -> Result<Flow, CodecError> {
        for instr in instrs {
            match instr {
                WriteInstr::Literal(text) => out.push_str(text),
                WriteInstr::NullGuard(path) => {
                    if resolve(*path, arg, item)?.is_null() {
                        out.push_str(NULL_LITERAL);
                        return Ok(Flow::Return);
                    }
                }
                WriteInstr::Int(path) => match resolve(*path, arg, item)? {
                    Value::Int(i) => write_int(out, *i),
                    other => return Err(mismatch("int", other)),
                },
                WriteInstr::Str(path) => match resolve(*path, arg, item)? {
                    Value::Str(s) => write_str(out, Some(s)),
                    Value::Null => write_str(out, None),
                    other => return Err(mismatch("string", other)),
                },
                WriteInstr::Call(routine, path) => self.write_at(*routine, resolve(*path, arg, item)?, out, depth)?,
                WriteInstr::Each { list, body, separator, terminator } => {
                    let items = match resolve(*list, arg, item)? {
                        Value::List(items) => items,
                        other => return Err(mismatch("list", other)),
                    };
                    for (i, element) in items.iter().enumerate() {
                        if let Flow::Return = self.run_block(body, arg, Some(element), out, depth)? {
                            return Ok(Flow::Return);
                        }
                        out.push_str(if i + 1 < items.len() { separator } else { terminator });
                    }
                }
            }
        }
        Ok(Flow::Continue)
    }

    // ————————————————————————————————————————————————————————————————————————
    // READ
    // ————————————————————————————————————————————————————————————————————————

    pub fn read(&self, id: RoutineId, cursor: &mut Cursor<'_>) -> Result<Value, CodecError> {
        self.read_at(id, cursor, 0)
    }

    fn read_at(&self, id: RoutineId, cursor: &mut Cursor<'_>, depth: usize) -> Result<Value, CodecError> {
        let routine = self.routine(id);
        match &routine.body {
            RoutineBody::Read(_) if depth >= MAX_DEPTH => {
                cursor.skip_whitespace();
                Err(cursor.error(Expected::DepthLimit).into())
            }
            RoutineBody::Read(program) => self.run_program(program, cursor, depth + 1),
            RoutineBody::Stub(_) => {
                cursor.skip_value()?;
                Ok(Value::Null)
            }
            RoutineBody::Write(_) => Err(wrong_direction(routine, Direction::Deserialize)),
        }
    }

    fn run_program(&self, program: &ReadProgram, cursor: &mut Cursor<'_>, depth: usize) -> Result<Value, CodecError> {
        cursor.skip_whitespace();
        match program {
            ReadProgram::Scalar(op) => self.run_op(*op, cursor, depth),
            ReadProgram::Object { type_name, nullable, fields, defaults } => {
                let mut record = Record { type_name: type_name.clone(), fields: defaults.clone() };
                if cursor.eat_null() {
                    return Ok(if *nullable { Value::Null } else { Value::Object(record) });
                }
                cursor.expect('{')?;
                loop {
                    cursor.skip_whitespace();
                    if cursor.is_exhausted() {
                        return Err(cursor.error(Expected::ContentOr('}')).into());
                    }
                    if cursor.eat(b'}') {
                        break;
                    }
                    let name = cursor.read_string()?;
                    cursor.skip_whitespace();
                    cursor.expect(':')?;
                    match fields.iter().find(|field| field.name == name) {
                        Some(field) => record.fields[field.slot] = self.run_op(field.op, cursor, depth)?,
                        None => {
                            tracing::trace!(type_name = %type_name, property = name, "skipping unknown property");
                            cursor.skip_value()?;
                        }
                    }
                    cursor.skip_whitespace();
                    cursor.eat(b',');
                }
                Ok(Value::Object(record))
            }
            ReadProgram::List { nullable, element } => {
                if cursor.eat_null() {
                    return Ok(if *nullable { Value::Null } else { Value::List(Vec::new()) });
                }
                cursor.expect('[')?;
                let mut items = Vec::new();
                loop {
                    cursor.skip_whitespace();
                    if cursor.is_exhausted() {
                        return Err(cursor.error(Expected::ContentOr(']')).into());
                    }
                    if cursor.eat(b']') {
                        break;
                    }
                    items.push(self.run_op(*element, cursor, depth)?);
                    cursor.skip_whitespace();
                    cursor.eat(b',');
                }
                Ok(Value::List(items))
            }
        }
    }

    fn run_op(&self, op: ReadOp, cursor: &mut Cursor<'_>, depth: usize) -> Result<Value, CodecError> {
        cursor.skip_whitespace();
        match op {
            ReadOp::Int => {
                if cursor.eat_null() {
                    return Ok(Value::Int(0));
                }
                Ok(Value::Int(cursor.read_int()?))
            }
            ReadOp::Str => {
                if cursor.eat_null() {
                    return Ok(Value::Null);
                }
                Ok(Value::Str(cursor.read_string()?.to_owned()))
            }
            ReadOp::Call(id) => self.read_at(id, cursor, depth),
        }
    }
}

fn resolve<'v>(path: ValuePath, arg: &'v Value, item: Option<&'v Value>) -> Result<&'v Value, CodecError> {
    match path {
        ValuePath::Arg => Ok(arg),
        ValuePath::Element => item.ok_or_else(|| mismatch("a list element", arg)),
        ValuePath::Field(slot) => match arg {
            Value::Object(record) => record.fields.get(slot).ok_or_else(|| CodecError::Mismatch {
                expected: format!("field {slot} of `{}`", record.type_name),
                found: "end of record",
            }),
            other => Err(mismatch("object", other)),
        },
    }
}

/// Top-level check of a routine argument. Nested values are checked as the
/// instructions reach them.
fn check_argument(routine: &Routine, value: &Value) -> Result<(), CodecError> {
    let shape = &routine.shape;
    match (shape, value) {
        (_, Value::Null) if !shape.is_nullable() => Err(mismatch(shape, value)),
        (_, Value::Null) => Ok(()),
        (TypeShape::Object { name, .. }, Value::Object(record)) => {
            if record.type_name != *name {
                return Err(CodecError::Mismatch { expected: shape.to_string(), found: "object of another type" });
            }
            match routine.field_count {
                Some(count) if record.fields.len() != count => Err(CodecError::Mismatch {
                    expected: format!("{count} fields of `{name}`"),
                    found: "record with a different field count",
                }),
                _ => Ok(()),
            }
        }
        (TypeShape::Object { .. }, other) => Err(mismatch(shape, other)),
        (TypeShape::List { .. }, Value::List(_)) => Ok(()),
        (TypeShape::List { .. }, other) => Err(mismatch(shape, other)),
        _ => Ok(()),
    }
}

fn wrong_direction(routine: &Routine, direction: Direction) -> CodecError {
    CodecError::NoEntry { shape: routine.shape.clone(), direction }
}
