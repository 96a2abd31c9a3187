#![forbid(unsafe_code)]

//! Host-facing configuration for math nodes.
//!
//! [`MathOptions::default()`] matches the stock behavior: `$…$` / `$$…$$`
//! delimiters, display-only nodes (no evaluation), and raw LaTeX as the
//! plain-text rendering.

use crate::delimiters::DisplayMode;

/// Options shared by every math node of one editor session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MathOptions {
    /// Evaluate nodes and register their variables.
    pub evaluation: bool,
    /// Which delimiters mark math in plain text.
    pub delimiters: Delimiters,
    /// How a node is flattened to plain text.
    pub render_text_mode: RenderTextMode,
}

impl MathOptions {
    /// Options with evaluation switched on.
    #[must_use]
    pub fn evaluating() -> Self {
        Self {
            evaluation: true,
            ..Self::default()
        }
    }
}

/// Delimiter flavor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Delimiters {
    /// `$…$` inline, `$$…$$` block.
    #[default]
    Dollar,
    /// `\(…\)` inline, `\[…\]` block.
    Bracket,
    /// User-supplied patterns; capture group 1 is the LaTeX source.
    Custom(CustomDelimiters),
}

/// Patterns and literal delimiters for [`Delimiters::Custom`].
///
/// A missing regex disables that display mode. Missing literals fall back to
/// `$` (inline) and `$$` (block).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CustomDelimiters {
    pub inline_regex: Option<String>,
    pub block_regex: Option<String>,
    pub inline_start: Option<String>,
    pub inline_end: Option<String>,
    pub block_start: Option<String>,
    pub block_end: Option<String>,
}

/// Which side of a delimited span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Start,
    End,
}

impl Delimiters {
    /// Literal delimiter text for a display mode and side.
    #[must_use]
    pub fn literal(&self, mode: DisplayMode, side: Side) -> &str {
        match (self, mode, side) {
            (Self::Dollar, DisplayMode::Inline, _) => "$",
            (Self::Dollar, DisplayMode::Block, _) => "$$",
            (Self::Bracket, DisplayMode::Inline, Side::Start) => r"\(",
            (Self::Bracket, DisplayMode::Inline, Side::End) => r"\)",
            (Self::Bracket, DisplayMode::Block, Side::Start) => r"\[",
            (Self::Bracket, DisplayMode::Block, Side::End) => r"\]",
            (Self::Custom(custom), mode, side) => {
                let (configured, fallback) = match (mode, side) {
                    (DisplayMode::Inline, Side::Start) => (&custom.inline_start, "$"),
                    (DisplayMode::Inline, Side::End) => (&custom.inline_end, "$"),
                    (DisplayMode::Block, Side::Start) => (&custom.block_start, "$$"),
                    (DisplayMode::Block, Side::End) => (&custom.block_end, "$$"),
                };
                configured.as_deref().unwrap_or(fallback)
            }
        }
    }
}

/// Plain-text flattening of a math node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RenderTextMode {
    /// The LaTeX source without delimiters.
    #[default]
    RawLatex,
    /// Nothing.
    None,
    /// A fixed placeholder string.
    Placeholder(String),
}
