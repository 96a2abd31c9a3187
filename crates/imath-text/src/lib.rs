#![forbid(unsafe_code)]

//! Text layer for imath: variable-name canonicalization, expression
//! preprocessing, and delimiter scanning.
//!
//! Nothing in this crate evaluates arithmetic or holds session state; every
//! function is a pure transformation of strings.

pub mod delimiters;
pub mod node;
pub mod options;
pub mod preprocess;
pub mod variable_name;

pub use delimiters::{DelimiterScanner, DisplayMode, MathSpan};
pub use node::MathNode;
pub use options::{CustomDelimiters, Delimiters, MathOptions, RenderTextMode};
pub use preprocess::{PI_PLACEHOLDER, Preprocessed, preprocess, substitute_aliases};
pub use variable_name::{Spelling, aliases_for, canonicalize};
