#![no_main]

use std::rc::Rc;

use arbitrary::Arbitrary;
use imath_runtime::{EvaluationSession, MathStorage, ResultCell, SequentialIdGenerator};
use libfuzzer_sys::fuzz_target;

const NAMES: [&str; 4] = ["a", "b", "x_1", "y_{2}"];

#[derive(Arbitrary, Debug)]
enum Op {
    Define { name: u8, value: i16 },
    DefineFrom { name: u8, from: u8, offset: i8 },
    Use { names: Vec<u8> },
    Drop(u8),
    Toggle(u8),
}

fn name(index: u8) -> &'static str {
    NAMES[usize::from(index) % NAMES.len()]
}

impl Op {
    fn latex(&self) -> Option<String> {
        match self {
            Op::Define { name: n, value } => Some(format!("{} := {value}", name(*n))),
            Op::DefineFrom { name: n, from, offset } => {
                Some(format!("{} := {} + {offset}", name(*n), name(*from)))
            }
            Op::Use { names } => {
                let terms: Vec<_> = names.iter().take(8).map(|n| name(*n)).collect();
                (!terms.is_empty()).then(|| terms.join(" + "))
            }
            Op::Drop(_) | Op::Toggle(_) => None,
        }
    }
}

fuzz_target!(|ops: Vec<Op>| {
    let storage = Rc::new(MathStorage::with_id_generator(SequentialIdGenerator::new()));
    let mut sessions: Vec<EvaluationSession> = Vec::new();

    for op in ops.iter().take(64) {
        match op {
            Op::Drop(i) if !sessions.is_empty() => {
                let index = usize::from(*i) % sessions.len();
                sessions.remove(index);
            }
            Op::Toggle(i) if !sessions.is_empty() => {
                let index = usize::from(*i) % sessions.len();
                sessions[index].toggle_result();
            }
            _ => {
                if let Some(latex) = op.latex() {
                    sessions.push(EvaluationSession::new(latex, ResultCell::new(), true, &storage));
                }
            }
        }
    }

    drop(sessions);
    for (id, _) in storage.variables() {
        assert_eq!(storage.listener_count(&id), 0);
    }
});
