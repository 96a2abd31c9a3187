#![forbid(unsafe_code)]

//! Normalization of raw expression text before arithmetic evaluation.
//!
//! # Pipeline
//!
//! ```text
//! "A := x_1 = 3\pi"                 raw node text
//!   → replace \pi / \pi{} with {PI}   (reserved placeholder)
//!   → split off "lhs :=" assignment   (defines = "…")
//!   → keep the last non-empty `=` segment
//!   → canonicalize                     (x_1 → x_{1})
//! ```
//!
//! Alias substitution ([`substitute_aliases`]) is the final step, applied by
//! the caller once it knows which aliases the current session has defined.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::variable_name::canonicalize;

/// Placeholder substituted for `\pi`. The formula engine binds it to π.
pub const PI_PLACEHOLDER: &str = "{PI}";

static PI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\pi(\{\})?").expect("pi pattern is valid"));

static ASSIGNMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*)\s*:=\s*").expect("assignment pattern is valid"));

/// Result of [`preprocess`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preprocessed {
    /// Canonicalized expression text, ready for alias substitution.
    pub expression: String,
    /// Raw left-hand side of a `:=` assignment, if any (not yet canonicalized).
    pub defines: Option<String>,
}

/// Normalize raw node text into an evaluable expression.
#[must_use]
pub fn preprocess(latex: &str) -> Preprocessed {
    let replaced = PI.replace_all(latex, PI_PLACEHOLDER);
    let mut text: &str = replaced.trim();

    let mut defines = None;
    if let Some(caps) = ASSIGNMENT.captures(text) {
        let whole = caps.get(0).map_or(0, |m| m.end());
        let lhs = caps.get(1).map_or("", |m| m.as_str()).trim();
        if !lhs.is_empty() {
            defines = Some(lhs.to_string());
        }
        text = &text[whole..];
        trace!(message = "preprocess.assignment", lhs);
    }

    let expression = canonicalize(select_rhs(text));
    Preprocessed {
        expression,
        defines,
    }
}

/// Pick the segment after the last `=`.
///
/// `a = b = 5` selects `5`. A trailing `=` (`a + 1 =`) selects the segment
/// before it, so "show the result" notation evaluates the left side.
#[must_use]
pub fn select_rhs(text: &str) -> &str {
    let mut segments = text.rsplit('=');
    let last = segments.next().unwrap_or("");
    if !last.is_empty() {
        return last;
    }
    segments.next().unwrap_or(last)
}

/// Replace every whole-token occurrence of `alias` in `text` with `replacement`.
///
/// A match must not touch an ASCII letter on either side, so the alias `a`
/// leaves `ab`, `ba` and generated identifiers untouched.
#[must_use]
pub fn replace_whole_token<'a>(text: &'a str, alias: &str, replacement: &str) -> Cow<'a, str> {
    if alias.is_empty() || !text.contains(alias) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut replaced = false;
    let mut copied = 0;
    let mut from = 0;
    while let Some(offset) = text[from..].find(alias) {
        let start = from + offset;
        let end = start + alias.len();
        let before_ok = text[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_ascii_alphabetic());
        let after_ok = text[end..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_ascii_alphabetic());

        if before_ok && after_ok {
            out.push_str(&text[copied..start]);
            out.push_str(replacement);
            copied = end;
            from = end;
            replaced = true;
        } else {
            from = start + text[start..].chars().next().map_or(1, char::len_utf8);
        }
    }

    if !replaced {
        return Cow::Borrowed(text);
    }
    out.push_str(&text[copied..]);
    Cow::Owned(out)
}

/// Apply [`replace_whole_token`] for every `(alias, replacement)` pair, in order.
///
/// Each pair sees the output of the previous one, so the first alias to claim
/// a span of text wins.
#[must_use]
pub fn substitute_aliases<'p, I>(text: &str, aliases: I) -> String
where
    I: IntoIterator<Item = (&'p str, &'p str)>,
{
    let mut current = text.to_string();
    for (alias, replacement) in aliases {
        if let Cow::Owned(next) = replace_whole_token(&current, alias, replacement) {
            current = next;
        }
    }
    current
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn plain_expression_passes_through() {
        let pre = preprocess("2+2");
        assert_eq!(pre.expression, "2+2");
        assert_eq!(pre.defines, None);
    }

    #[test]
    fn pi_is_replaced() {
        assert_eq!(preprocess(r"\pi * 2").expression, "{PI} * 2");
        assert_eq!(preprocess(r"2\pi{}").expression, "2{PI}");
    }

    #[test]
    fn whole_expression_is_canonicalized() {
        assert_eq!(preprocess("x_1 + y^2").expression, "x_{1} + y^{2}");
        assert_eq!(preprocess(r"\frac{b}{a}").expression, r"\frac{b}{a}");
        // Without spaces the script is taken as the name's superscript.
        assert_eq!(preprocess("x^2+1").expression, "x+1^{2}");
    }

    #[test]
    fn lone_pi_loses_placeholder_braces() {
        // The canonicalizer unwraps a fully braced text.
        assert_eq!(preprocess(r"\pi").expression, "PI");
    }

    #[test]
    fn assignment_is_split_off() {
        let pre = preprocess("a := 5");
        assert_eq!(pre.defines.as_deref(), Some("a"));
        assert_eq!(pre.expression, "5");
    }

    #[test]
    fn assignment_without_spaces() {
        let pre = preprocess("x_1:=2*3");
        assert_eq!(pre.defines.as_deref(), Some("x_1"));
        assert_eq!(pre.expression, "2*3");
    }

    #[test]
    fn empty_assignment_target_defines_nothing() {
        let pre = preprocess(":= 5");
        assert_eq!(pre.defines, None);
        assert_eq!(pre.expression, "5");
    }

    #[test]
    fn last_equation_segment_wins() {
        assert_eq!(preprocess("a = b = 5").expression, "5");
        assert_eq!(preprocess("y := 2x = 4").expression, "4");
    }

    #[test]
    fn trailing_equals_selects_previous_segment() {
        assert_eq!(preprocess("a + 1 =").expression, "a + 1");
        assert_eq!(select_rhs("a="), "a");
        assert_eq!(select_rhs("="), "");
        assert_eq!(select_rhs(""), "");
    }

    #[test]
    fn expression_scripts_are_canonicalized() {
        assert_eq!(preprocess("x_1 + 1").expression, "x_{1} + 1");
    }

    #[test]
    fn whole_token_replacement() {
        assert_eq!(replace_whole_token("a + ab + ba + a", "a", "Q"), "Q + ab + ba + Q");
        assert_eq!(replace_whole_token("2a", "a", "Q"), "2Q");
        assert_eq!(replace_whole_token("x_{1}+x_{1}", "x_{1}", "Q"), "Q+Q");
    }

    #[test]
    fn whole_token_replacement_borrows_when_unchanged() {
        assert!(matches!(replace_whole_token("abc", "b", "Q"), Cow::Borrowed(_)));
        assert!(matches!(replace_whole_token("abc", "", "Q"), Cow::Borrowed(_)));
        assert!(matches!(replace_whole_token("abc", "z", "Q"), Cow::Borrowed(_)));
    }

    #[test]
    fn overlapping_candidates_are_retried() {
        // Every candidate position touches another letter.
        assert_eq!(replace_whole_token("aaa", "aa", "Q"), "aaa");
        assert_eq!(replace_whole_token("ba,a", "a", "Q"), "ba,Q");
    }

    #[test]
    fn substitution_order_is_respected() {
        let out = substitute_aliases("x_{1} + y", [("x_{1}", "AAA"), ("y", "BBB")]);
        assert_eq!(out, "AAA + BBB");
    }

    #[traced_test]
    #[test]
    fn assignment_is_traced() {
        let _ = preprocess("b := 1");
        assert!(logs_contain("preprocess.assignment"));
    }
}
