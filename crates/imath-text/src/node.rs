#![forbid(unsafe_code)]

//! Plain-text model of a math node.
//!
//! The host editor owns the real node; this type carries the three
//! attributes the core cares about and the text conversions the host needs
//! (flattening, re-delimiting, and the backspace "unwrap" behavior).

use std::borrow::Cow;

use crate::delimiters::{DisplayMode, MathSpan};
use crate::options::{Delimiters, MathOptions, RenderTextMode, Side};

/// Source shown when a node carries no LaTeX.
const FALLBACK_LATEX: &str = "x";

/// A math node's attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MathNode {
    pub latex: String,
    /// Show the evaluated result next to the rendered math.
    pub evaluate: bool,
    pub display: DisplayMode,
}

impl Default for MathNode {
    fn default() -> Self {
        Self {
            latex: "x_1".to_string(),
            evaluate: false,
            display: DisplayMode::Inline,
        }
    }
}

impl From<&MathSpan> for MathNode {
    fn from(span: &MathSpan) -> Self {
        Self {
            latex: span.latex.clone(),
            evaluate: span.show_result,
            display: span.display,
        }
    }
}

impl MathNode {
    #[must_use]
    pub fn new(latex: impl Into<String>, display: DisplayMode) -> Self {
        Self {
            latex: latex.into(),
            evaluate: false,
            display,
        }
    }

    fn source(&self) -> &str {
        if self.latex.is_empty() {
            FALLBACK_LATEX
        } else {
            &self.latex
        }
    }

    /// Plain-text flattening according to [`MathOptions::render_text_mode`].
    #[must_use]
    pub fn render_text<'a>(&'a self, options: &'a MathOptions) -> Cow<'a, str> {
        match &options.render_text_mode {
            RenderTextMode::None => Cow::Borrowed(""),
            RenderTextMode::Placeholder(text) => Cow::Borrowed(text),
            RenderTextMode::RawLatex => Cow::Borrowed(self.source()),
        }
    }

    /// The LaTeX wrapped in the delimiters for this node's display mode.
    #[must_use]
    pub fn to_source(&self, delimiters: &Delimiters) -> String {
        format!(
            "{}{}{}",
            delimiters.literal(self.display, Side::Start),
            self.source(),
            delimiters.literal(self.display, Side::End)
        )
    }

    /// Text that replaces the node when backspace is pressed right after it.
    ///
    /// The node turns back into its delimited source minus the final
    /// character, so the user is editing the closing delimiter.
    #[must_use]
    pub fn unwrap_for_backspace(&self, delimiters: &Delimiters) -> String {
        let end = delimiters.literal(self.display, Side::End);
        let trimmed_end = end
            .char_indices()
            .next_back()
            .map_or("", |(idx, _)| &end[..idx]);
        format!(
            "{}{}{}",
            delimiters.literal(self.display, Side::Start),
            self.latex,
            trimmed_end
        )
    }
}
