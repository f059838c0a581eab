// Instruction trees built from the schema, before optimization and emission.
// No routine keeps a tree: write trees are flattened into `WriteInstr`
// sequences and read trees are lowered into `emit::ReadProgram`.

use std::fmt;

use crate::schema::Primitive;

/// Index of an emitted routine within one session's routine table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoutineId(u32);

impl RoutineId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for RoutineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Which value a write instruction reads. Composite children always live in
/// routines of their own, so paths never go deeper than one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValuePath {
    /// The routine argument.
    Arg,
    /// Field `slot` of the routine argument.
    Field(usize),
    /// The current element of the enclosing `Each`.
    Element,
}

impl fmt::Display for ValuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValuePath::Arg => f.write_str("value"),
            ValuePath::Field(slot) => write!(f, "value.{slot}"),
            ValuePath::Element => f.write_str("item"),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// WRITE SIDE
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteNode {
    Literal(String),
    Call { routine: RoutineId, value: ValuePath },
    PrimitiveWrite { kind: Primitive, value: ValuePath },
    ObjectWrite {
        value: ValuePath,
        nullable: bool,
        properties: Vec<(String, WriteNode)>,
    },
    ListWrite {
        value: ValuePath,
        nullable: bool,
        element: Box<WriteNode>,
    },
}

/// Flat, in-order write instructions. Only `Each` nests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteInstr {
    Literal(String),
    /// Writes `null` and returns from the routine when the value is null.
    NullGuard(ValuePath),
    Int(ValuePath),
    Str(ValuePath),
    Call(RoutineId, ValuePath),
    /// Runs `body` per element; `separator` follows every element but the
    /// last, which is followed by `terminator`.
    Each {
        list: ValuePath,
        body: Vec<WriteInstr>,
        separator: String,
        terminator: String,
    },
}

impl WriteNode {
    /// Expands the tree into wire-format instructions.
    pub fn flatten(self) -> Vec<WriteInstr> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into(self, out: &mut Vec<WriteInstr>) {
        match self {
            WriteNode::Literal(text) => out.push(WriteInstr::Literal(text)),
            WriteNode::Call { routine, value } => out.push(WriteInstr::Call(routine, value)),
            WriteNode::PrimitiveWrite { kind: Primitive::Int, value } => out.push(WriteInstr::Int(value)),
            WriteNode::PrimitiveWrite { kind: Primitive::String, value } => out.push(WriteInstr::Str(value)),
            WriteNode::ObjectWrite { value, nullable, properties } => {
                if nullable {
                    out.push(WriteInstr::NullGuard(value));
                }
                out.push(WriteInstr::Literal("{\n".into()));
                let last = properties.len().saturating_sub(1);
                for (i, (name, subtree)) in properties.into_iter().enumerate() {
                    out.push(WriteInstr::Literal(format!("\"{name}\": ")));
                    subtree.flatten_into(out);
                    out.push(WriteInstr::Literal(if i < last { ",\n" } else { "\n" }.into()));
                }
                out.push(WriteInstr::Literal("}".into()));
            }
            WriteNode::ListWrite { value, nullable, element } => {
                if nullable {
                    out.push(WriteInstr::NullGuard(value));
                }
                out.push(WriteInstr::Literal("[\n".into()));
                out.push(WriteInstr::Each {
                    list: value,
                    body: element.flatten(),
                    separator: ",\n".into(),
                    terminator: "\n".into(),
                });
                out.push(WriteInstr::Literal("]".into()));
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// READ SIDE
// ————————————————————————————————————————————————————————————————————————————

/// Produces one value from the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadExpr {
    PrimitiveReadInt,
    PrimitiveReadString,
    Call(RoutineId),
}

/// Binds a read value to field `slot` of the object under construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assign {
    pub slot: usize,
    pub expr: ReadExpr,
}

/// Pushes a read value onto the list under construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Append {
    pub expr: ReadExpr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadNode {
    Expr(ReadExpr),
    ObjectRead {
        type_name: String,
        nullable: bool,
        properties: Vec<(String, Assign)>,
    },
    ListRead {
        nullable: bool,
        element: Append,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(text: &str) -> WriteInstr {
        WriteInstr::Literal(text.into())
    }

    #[test]
    fn object_flattens_in_declared_order() {
        let tree = WriteNode::ObjectWrite {
            value: ValuePath::Arg,
            nullable: true,
            properties: vec![
                ("A".into(), WriteNode::PrimitiveWrite { kind: Primitive::Int, value: ValuePath::Field(0) }),
                ("B".into(), WriteNode::PrimitiveWrite { kind: Primitive::String, value: ValuePath::Field(1) }),
            ],
        };
        assert_eq!(
            tree.flatten(),
            vec![
                WriteInstr::NullGuard(ValuePath::Arg),
                lit("{\n"),
                lit("\"A\": "),
                WriteInstr::Int(ValuePath::Field(0)),
                lit(",\n"),
                lit("\"B\": "),
                WriteInstr::Str(ValuePath::Field(1)),
                lit("\n"),
                lit("}"),
            ]
        );
    }

    #[test]
    fn empty_non_null_object_is_just_braces() {
        let tree = WriteNode::ObjectWrite { value: ValuePath::Arg, nullable: false, properties: vec![] };
        assert_eq!(tree.flatten(), vec![lit("{\n"), lit("}")]);
    }

    #[test]
    fn list_flattens_to_each() {
        let tree = WriteNode::ListWrite {
            value: ValuePath::Arg,
            nullable: false,
            element: Box::new(WriteNode::Call { routine: RoutineId::new(3), value: ValuePath::Element }),
        };
        let flat = tree.flatten();
        assert_eq!(flat.len(), 3);
        assert_eq!(
            flat[1],
            WriteInstr::Each {
                list: ValuePath::Arg,
                body: vec![WriteInstr::Call(RoutineId::new(3), ValuePath::Element)],
                separator: ",\n".into(),
                terminator: "\n".into(),
            }
        );
    }
}
