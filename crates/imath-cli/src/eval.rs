#![forbid(unsafe_code)]

//! `imath eval`: evaluate every delimited expression in a document.
//!
//! All spans are loaded before anything is printed, so a result reflects
//! definitions that appear later in the document.

use std::io::{Read, Write};
use std::ops::Range;
use std::rc::Rc;

use clap::Args;
use imath_runtime::{EvaluationSession, MathStorage, ResultCell};
use imath_text::{DelimiterScanner, DisplayMode, MathNode, MathOptions};
use serde::Serialize;
use tracing::info;

use crate::error::Result;

#[derive(Debug, Clone, Args)]
pub struct EvalArgs {
    /// Document to read, or `-` for stdin.
    pub input: String,

    /// Print a JSON report instead of text.
    #[arg(long)]
    pub json: bool,
}

/// One evaluated span.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpanReport {
    pub range: Range<usize>,
    pub source: String,
    pub latex: String,
    pub display: DisplayMode,
    /// Displayed result text, e.g. `=4` or `=Error`.
    pub result: String,
    pub value: Option<f64>,
    /// The result is shown next to the math (the source ended in `=`).
    pub visible: bool,
}

pub fn run_eval(args: &EvalArgs, options: &MathOptions, out: &mut impl Write) -> Result<()> {
    let text = read_input(&args.input)?;
    let reports = evaluate_document(&text, options)?;
    info!(message = "eval.done", input = %args.input, spans = reports.len());

    if args.json {
        serde_json::to_writer_pretty(&mut *out, &reports)?;
        writeln!(out)?;
    } else {
        for report in &reports {
            writeln!(out, "{}\t{}", report.source, report.result)?;
        }
    }
    Ok(())
}

/// Scan `text`, start one session per span, and report every span once all
/// of them are live.
///
/// With evaluation switched off no session is started and every result is
/// empty.
pub fn evaluate_document(text: &str, options: &MathOptions) -> Result<Vec<SpanReport>> {
    let scanner = DelimiterScanner::new(&options.delimiters)?;
    let storage = Rc::new(MathStorage::new());

    let live: Vec<_> = scanner
        .scan(text)
        .into_iter()
        .map(|span| {
            let node = MathNode::from(&span);
            let cell = ResultCell::new();
            let session = options.evaluation.then(|| {
                EvaluationSession::new(node.latex.clone(), cell.clone(), node.evaluate, &storage)
            });
            (span.range, node, session, cell)
        })
        .collect();

    Ok(live
        .iter()
        .map(|(range, node, session, cell)| SpanReport {
            range: range.clone(),
            source: node.to_source(&options.delimiters),
            latex: node.latex.clone(),
            display: node.display,
            result: cell.text(),
            value: session.as_ref().and_then(EvaluationSession::value),
            visible: cell.visible(),
        })
        .collect())
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        Ok(std::fs::read_to_string(input)?)
    }
}
