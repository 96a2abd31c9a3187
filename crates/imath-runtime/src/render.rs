#![forbid(unsafe_code)]

//! Displayed result text and the targets it is written to.

use std::cell::RefCell;
use std::rc::Rc;

/// Marker shown in place of a value when evaluation failed.
pub const ERROR_MARKER: &str = "Error";

/// Results with more fractional digits than this are rounded for display.
const MAX_EXACT_FRACTION_DIGITS: usize = 5;

/// Rounded results keep this many fractional digits.
const ROUNDED_FRACTION_DIGITS: usize = 4;

/// Text shown next to an evaluated expression: `=4`, `=6.2832`, `=Error`.
///
/// Values print in their shortest round-trip form unless that form has more
/// than five fractional digits, in which case they are rounded to four.
#[must_use]
pub fn format_result(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_nan() => format!("={ERROR_MARKER}"),
        None => format!("={ERROR_MARKER}"),
        Some(v) if v.is_infinite() => {
            if v > 0.0 {
                "=Infinity".to_string()
            } else {
                "=-Infinity".to_string()
            }
        }
        Some(v) => {
            let exact = shortest(v);
            let fraction_digits = exact.split_once('.').map_or(0, |(_, frac)| frac.len());
            if fraction_digits > MAX_EXACT_FRACTION_DIGITS {
                format!("={v:.prec$}", prec = ROUNDED_FRACTION_DIGITS)
            } else {
                format!("={exact}")
            }
        }
    }
}

/// Shortest round-trip decimal; exponent form outside `[1e-6, 1e21)`.
fn shortest(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    let abs = v.abs();
    if (1e-6..1e21).contains(&abs) {
        return v.to_string();
    }
    let sci = format!("{v:e}");
    match sci.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => sci,
    }
}

/// Where a session writes its displayed result.
pub trait ResultSink {
    /// Show `text`, or hide it when `visible` is false.
    fn render(&mut self, text: &str, visible: bool);
}

impl<F: FnMut(&str, bool)> ResultSink for F {
    fn render(&mut self, text: &str, visible: bool) {
        self(text, visible);
    }
}

/// Last rendered state of a [`ResultCell`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    pub visible: bool,
    /// Number of renders so far.
    pub renders: u64,
}

/// A shared, inspectable sink.
///
/// Clones share the same state, so the host keeps one handle and gives the
/// session another.
#[derive(Debug, Clone, Default)]
pub struct ResultCell {
    inner: Rc<RefCell<Rendered>>,
}

impl ResultCell {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn text(&self) -> String {
        self.inner.borrow().text.clone()
    }

    #[must_use]
    pub fn visible(&self) -> bool {
        self.inner.borrow().visible
    }

    #[must_use]
    pub fn snapshot(&self) -> Rendered {
        self.inner.borrow().clone()
    }
}

impl ResultSink for ResultCell {
    fn render(&mut self, text: &str, visible: bool) {
        let mut inner = self.inner.borrow_mut();
        inner.text.clear();
        inner.text.push_str(text);
        inner.visible = visible;
        inner.renders += 1;
    }
}
