//! Literal-run coalescing.
//!
//! A peephole pass over flattened write instructions: every maximal run of
//! `Literal`s becomes one literal with the concatenated text. Non-literal
//! instructions keep their relative order; `Each` bodies are optimized on their
//! own since a loop boundary always ends a run.

use crate::ir::WriteInstr;

pub fn optimize(instrs: Vec<WriteInstr>) -> Vec<WriteInstr> {
    let mut out = Vec::with_capacity(instrs.len());
    let mut run: Option<String> = None;

    for instr in instrs {
        match instr {
            WriteInstr::Literal(text) => {
                // empty text has no effect
                if !text.is_empty() {
                    run.get_or_insert_with(String::new).push_str(&text);
                }
            }
            WriteInstr::Each { list, body, separator, terminator } => {
                flush(&mut run, &mut out);
                out.push(WriteInstr::Each { list, body: optimize(body), separator, terminator });
            }
            other => {
                flush(&mut run, &mut out);
                out.push(other);
            }
        }
    }
    flush(&mut run, &mut out);
    out
}

fn flush(run: &mut Option<String>, out: &mut Vec<WriteInstr>) {
    if let Some(text) = run.take() {
        out.push(WriteInstr::Literal(text));
    }
}

/// Number of literal instructions, `Each` bodies included.
pub fn literal_count(instrs: &[WriteInstr]) -> usize {
    instrs
        .iter()
        .map(|instr| match instr {
            WriteInstr::Literal(_) => 1,
            WriteInstr::Each { body, .. } => literal_count(body),
            _ => 0,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{RoutineId, ValuePath};

    fn lit(text: &str) -> WriteInstr {
        WriteInstr::Literal(text.into())
    }

    #[test]
    fn merges_runs_between_non_literals() {
        let input = vec![
            WriteInstr::NullGuard(ValuePath::Arg),
            lit("{\n"),
            lit("\"A\": "),
            WriteInstr::Int(ValuePath::Field(0)),
            lit(",\n"),
            lit("\"B\": "),
            WriteInstr::Str(ValuePath::Field(1)),
            lit("\n"),
            lit("}"),
        ];
        assert_eq!(
            optimize(input),
            vec![
                WriteInstr::NullGuard(ValuePath::Arg),
                lit("{\n\"A\": "),
                WriteInstr::Int(ValuePath::Field(0)),
                lit(",\n\"B\": "),
                WriteInstr::Str(ValuePath::Field(1)),
                lit("\n}"),
            ]
        );
    }

    #[test]
    fn does_not_merge_across_loops() {
        let input = vec![
            lit("[\n"),
            WriteInstr::Each {
                list: ValuePath::Arg,
                body: vec![lit("a"), lit(""), lit("b"), WriteInstr::Call(RoutineId::new(0), ValuePath::Element)],
                separator: ",\n".into(),
                terminator: "\n".into(),
            },
            lit("]"),
        ];
        let out = optimize(input);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0], lit("[\n"));
        assert_eq!(out[2], lit("]"));
        let WriteInstr::Each { body, .. } = &out[1] else {
            panic!("expected a loop");
        };
        assert_eq!(body, &vec![lit("ab"), WriteInstr::Call(RoutineId::new(0), ValuePath::Element)]);
    }

    #[test]
    fn non_literals_keep_their_order() {
        let input = vec![
            WriteInstr::Int(ValuePath::Field(2)),
            WriteInstr::Str(ValuePath::Field(0)),
            lit("x"),
            WriteInstr::Int(ValuePath::Field(1)),
        ];
        assert_eq!(optimize(input.clone()), input);
        assert_eq!(literal_count(&input), 1);
    }
}
