//! End-to-end: scan a document for math, evaluate every span in order, and
//! follow edits.
//!
//! Validates:
//! 1. Spans found by the delimiter scanner evaluate in document order.
//! 2. A trailing `=` controls result visibility.
//! 3. Replacing a definition's session updates every dependent.
//! 4. Deleting a span leaves its variable defined but stops its updates.

#![forbid(unsafe_code)]

use std::rc::Rc;

use imath_runtime::{EvaluationSession, MathStorage, ResultCell, SequentialIdGenerator};
use imath_text::{DelimiterScanner, Delimiters, MathNode};

// ── Helpers ─────────────────────────────────────────────────────────────

struct Document {
    storage: Rc<MathStorage>,
    nodes: Vec<(MathNode, EvaluationSession, ResultCell)>,
}

impl Document {
    fn load(text: &str, delimiters: &Delimiters) -> Self {
        let storage = Rc::new(MathStorage::with_id_generator(SequentialIdGenerator::new()));
        let scanner = DelimiterScanner::new(delimiters).unwrap();
        let nodes = scanner
            .scan(text)
            .iter()
            .map(|span| {
                let node = MathNode::from(span);
                let cell = ResultCell::new();
                let session =
                    EvaluationSession::new(node.latex.clone(), cell.clone(), node.evaluate, &storage);
                (node, session, cell)
            })
            .collect();
        Self { storage, nodes }
    }

    fn texts(&self) -> Vec<String> {
        self.nodes.iter().map(|(_, _, cell)| cell.text()).collect()
    }

    fn edit(&mut self, index: usize, latex: &str) {
        let (node, session, _) = &mut self.nodes[index];
        node.latex = latex.to_string();
        session.dispose();
        let cell = ResultCell::new();
        let replacement = EvaluationSession::new(latex, cell.clone(), node.evaluate, &self.storage);
        self.nodes[index].1 = replacement;
        self.nodes[index].2 = cell;
    }
}

const DOC: &str = "Let $a := 3$ and $b := a^2$. Then $$a + b =$$ and $\\frac{b}{a}=$.";

// ── Scenarios ───────────────────────────────────────────────────────────

#[test]
fn spans_evaluate_in_document_order() {
    let doc = Document::load(DOC, &Delimiters::Dollar);
    assert_eq!(doc.nodes.len(), 4);
    assert_eq!(doc.texts(), ["=3", "=9", "=12", "=3"]);
}

#[test]
fn trailing_equals_controls_visibility() {
    let doc = Document::load(DOC, &Delimiters::Dollar);
    let visible: Vec<bool> = doc.nodes.iter().map(|(_, _, c)| c.visible()).collect();
    assert_eq!(visible, [false, false, true, true]);
}

#[test]
fn editing_a_definition_updates_dependents() {
    let mut doc = Document::load(DOC, &Delimiters::Dollar);
    doc.edit(0, "a := 4");
    assert_eq!(doc.texts(), ["=4", "=16", "=20", "=4"]);
    assert_eq!(doc.storage.len(), 2);
}

#[test]
fn deleted_span_keeps_its_variable() {
    let mut doc = Document::load(DOC, &Delimiters::Dollar);
    let (_, removed, _) = doc.nodes.remove(1);
    drop(removed);
    assert_eq!(doc.storage.len(), 2);

    doc.edit(0, "a := 5");
    // `b` is no longer recomputed from `a`.
    assert_eq!(doc.texts(), ["=5", "=14", "=1.8"]);
}

#[test]
fn bracket_delimiters_drive_the_same_pipeline() {
    let text = r"Given \(r := 2\), the area is \[\pi r^2 =\]";
    let doc = Document::load(text, &Delimiters::Bracket);
    assert_eq!(doc.texts(), ["=2", "=12.5664"]);
}
