//! Human-readable dump of a codec: its entry points and every routine.

use std::fmt::{self, Display, Formatter};

use crate::codec::Codec;
use crate::emit::{ReadOp, ReadProgram, Routine, RoutineBody, StubReason};
use crate::ir::WriteInstr;

pub struct Listing<'c> {
    codec: &'c Codec,
}

impl<'c> Listing<'c> {
    pub fn new(codec: &'c Codec) -> Self {
        Self { codec }
    }
}

impl Display for Listing<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "entries:")?;
        for (shape, entry) in self.codec.entries() {
            let write = entry.write.map(|id| id.to_string()).unwrap_or_else(|| "-".into());
            let read = entry.read.map(|id| id.to_string()).unwrap_or_else(|| "-".into());
            writeln!(f, "  {shape}: write {write}, read {read}")?;
        }
        writeln!(f, "routines:")?;
        for routine in self.codec.routines() {
            write_routine(f, routine)?;
        }
        Ok(())
    }
}

fn write_routine(f: &mut Formatter<'_>, routine: &Routine) -> fmt::Result {
    write!(f, "  {} {} {}", routine.id, routine.direction, routine.shape)?;
    match &routine.body {
        RoutineBody::Stub(StubReason::Schema(error)) => writeln!(f, " [stub: {error}]"),
        RoutineBody::Stub(StubReason::Unused) => writeln!(f, " [stub: unused]"),
        RoutineBody::Stub(StubReason::Pending) => writeln!(f, " [stub: pending]"),
        RoutineBody::Write(instrs) => {
            writeln!(f)?;
            write_instrs(f, instrs, 2)
        }
        RoutineBody::Read(program) => {
            writeln!(f)?;
            write_program(f, program)
        }
    }
}

fn write_instrs(f: &mut Formatter<'_>, instrs: &[WriteInstr], depth: usize) -> fmt::Result {
    let pad = "  ".repeat(depth);
    for instr in instrs {
        match instr {
            WriteInstr::Literal(text) => writeln!(f, "{pad}literal {text:?}")?,
            WriteInstr::NullGuard(path) => writeln!(f, "{pad}null-guard {path}")?,
            WriteInstr::Int(path) => writeln!(f, "{pad}int {path}")?,
            WriteInstr::Str(path) => writeln!(f, "{pad}str {path}")?,
            WriteInstr::Call(id, path) => writeln!(f, "{pad}call {id} {path}")?,
            WriteInstr::Each { list, body, separator, terminator } => {
                writeln!(f, "{pad}each {list} sep {separator:?} end {terminator:?}")?;
                write_instrs(f, body, depth + 1)?;
            }
        }
    }
    Ok(())
}

fn write_program(f: &mut Formatter<'_>, program: &ReadProgram) -> fmt::Result {
    match program {
        ReadProgram::Scalar(op) => writeln!(f, "    {}", op_name(*op)),
        ReadProgram::List { nullable, element } => {
            writeln!(f, "    list{} of {}", nullable_mark(*nullable), op_name(*element))
        }
        ReadProgram::Object { type_name, nullable, fields, .. } => {
            writeln!(f, "    object {type_name}{}", nullable_mark(*nullable))?;
            for field in fields {
                writeln!(f, "      {:?} -> slot {}: {}", field.name, field.slot, op_name(field.op))?;
            }
            Ok(())
        }
    }
}

fn op_name(op: ReadOp) -> String {
    match op {
        ReadOp::Int => "int".into(),
        ReadOp::Str => "str".into(),
        ReadOp::Call(id) => format!("call {id}"),
    }
}

fn nullable_mark(nullable: bool) -> &'static str {
    if nullable { " (nullable)" } else { "" }
}
