#![forbid(unsafe_code)]

//! Canonical spellings of LaTeX variable names.
//!
//! A variable such as `x_1` can be typed in several equivalent ways
//! (`x_1`, `x_{1}`, `{x_1}`, `\color{red}x_{1}`). Every spelling reduces to
//! one canonical *alias*, which the variable store uses as its lookup key.
//!
//! # Architecture
//!
//! ```text
//! raw text → strip enclosing braces → strip color wrappers
//!          → split into zones (main, sub, sup, trailing)
//!          → reassemble: main + _{sub} + ^{sup} + " " + trailing
//!
//! The trailing text is scanned again as a name of its own, in a loop, so
//! `a + b_1` becomes `a + b_{1}`.
//! ```
//!
//! # Invariants
//!
//! 1. [`canonicalize`] is idempotent for well-formed names.
//! 2. The first entry of [`aliases_for`] always equals [`canonicalize`].
//! 3. The scanner never panics, even on unbalanced braces.
//! 4. Stack use is constant however many spaces or wrapping braces the
//!    input has.

use std::sync::LazyLock;

use regex::Regex;

static COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\color\{[A-Za-z0-9_]*\}").expect("color pattern is valid"));

static TEXT_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\textcolor\{[A-Za-z0-9_]*\}").expect("textcolor pattern is valid")
});

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// How sub- and superscripts are written in the reassembled name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Spelling {
    /// Scripts are always braced: `x_{1}`.
    #[default]
    Braced,
    /// Single-token scripts drop their braces: `x_1`, `x_\alpha`.
    Compact,
}

/// Canonical (braced) spelling of a variable name.
///
/// ```
/// use imath_text::variable_name::canonicalize;
///
/// assert_eq!(canonicalize("x_1"), "x_{1}");
/// assert_eq!(canonicalize("{\\color{red}x_{1}}"), "x_{1}");
/// ```
#[must_use]
pub fn canonicalize(raw: &str) -> String {
    variable_name(raw, Spelling::Braced)
}

/// Both alias spellings for a variable name: `[braced, compact]`.
///
/// Defining `x_1` registers `x_{1}` and `x_1`, so either spelling used
/// later in an expression resolves to the same variable.
#[must_use]
pub fn aliases_for(raw: &str) -> [String; 2] {
    [
        variable_name(raw, Spelling::Braced),
        variable_name(raw, Spelling::Compact),
    ]
}

/// Reduce `raw` to its canonical name in the requested spelling.
#[must_use]
pub fn variable_name(raw: &str, spelling: Spelling) -> String {
    let mut text = strip_outer_braces(raw).to_string();
    while let Some(wrapper) = [&*COLOR, &*TEXT_COLOR]
        .into_iter()
        .find(|wrapper| wrapper.is_match(&text))
    {
        let stripped = strip_outer_braces(&wrapper.replace_all(&text, " ")).to_string();
        text = stripped;
    }
    Zones::split(&text).assemble(spelling)
}

/// Trim, then peel every brace group that wraps the whole text.
fn strip_outer_braces(text: &str) -> &str {
    let mut text = text.trim();
    while let Some(inner) = strip_enclosing_braces(text) {
        text = inner.trim();
    }
    text
}

/// Return the text between a leading `{` and the `}` that closes it, if that
/// closing brace is the last character of `text`.
///
/// `{a}` yields `a`, while `{a}+{b}` yields `None` because the first group
/// closes before the end.
#[must_use]
pub fn strip_enclosing_braces(text: &str) -> Option<&str> {
    if text.len() < 2 || !text.starts_with('{') || !text.ends_with('}') {
        return None;
    }

    let mut depth = 0i32;
    let mut escaped = false;
    for (idx, ch) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return (idx == text.len() - 1).then(|| &text[1..idx]);
                }
            }
            _ => {}
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Zone scanner
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Zone {
    Main,
    Sub,
    Sup,
}

/// One name as captured by the scanner, plus the unscanned text after it.
#[derive(Debug, Default, PartialEq, Eq)]
struct Zones<'a> {
    main: String,
    sub: String,
    sup: String,
    trailing: &'a str,
}

impl<'a> Zones<'a> {
    /// Scan `text` character by character, routing each character into a zone.
    ///
    /// Zone rules:
    /// - `_` / `^` at depth 0 in the main zone open the sub/sup zone.
    /// - A script zone falls back to main once depth is 0 and no command
    ///   name is being read (`x_1` captures `1`, `x_{12}` captures `{12}`).
    /// - A space at depth 0, or a second command at depth 0, ends the name;
    ///   the rest is left in `trailing` for the next scan.
    fn split(text: &'a str) -> Self {
        let text = text.trim();
        let mut zones = Self::default();
        let mut zone = Zone::Main;
        let mut depth = 0i32;
        let mut prev_backslash = false;
        let mut in_command = false;

        for (idx, ch) in text.char_indices() {
            let mut keep = true;

            if ch == '\\' {
                if !prev_backslash && depth == 0 {
                    in_command = true;
                }
                prev_backslash = !prev_backslash;
            } else {
                prev_backslash = false;
            }

            if ch == ' ' && depth == 0 {
                in_command = false;
            }

            if !prev_backslash {
                match ch {
                    '_' if depth == 0 && zone == Zone::Main => {
                        zone = Zone::Sub;
                        keep = false;
                    }
                    '^' if depth == 0 && zone == Zone::Main => {
                        zone = Zone::Sup;
                        keep = false;
                    }
                    '{' => depth += 1,
                    '}' => {
                        depth -= 1;
                        if depth == 0 {
                            in_command = false;
                        }
                    }
                    _ => {}
                }
            }

            if zone == Zone::Main && depth == 0 {
                if ch == ' ' {
                    zones.trailing = &text[idx + 1..];
                    break;
                } else if ch == '\\' && !zones.main.is_empty() {
                    zones.trailing = &text[idx..];
                    break;
                }
            }

            if keep {
                zones.push(zone, ch);
                if zone != Zone::Main && depth == 0 && !in_command {
                    zone = Zone::Main;
                }
            }
        }

        zones
    }

    fn push(&mut self, zone: Zone, ch: char) {
        match zone {
            Zone::Main => self.main.push(ch),
            Zone::Sub => self.sub.push(ch),
            Zone::Sup => self.sup.push(ch),
        }
    }

    /// Join this name and every name after it, separated by single spaces.
    /// Only the first name uses `spelling`; the rest are braced.
    fn assemble(self, spelling: Spelling) -> String {
        let mut out = String::new();
        let mut zones = self;
        let mut spelling = spelling;
        loop {
            zones.push_name(&mut out, spelling);
            if zones.trailing.is_empty() {
                return out;
            }
            out.push(' ');
            zones = Zones::split(zones.trailing);
            spelling = Spelling::Braced;
        }
    }

    fn push_name(&self, out: &mut String, spelling: Spelling) {
        let sub = strip_enclosing_braces(&self.sub).unwrap_or(&self.sub);
        let sup = strip_enclosing_braces(&self.sup).unwrap_or(&self.sup);

        out.push_str(&self.main);
        if !sub.is_empty() {
            push_script(out, '_', sub.trim(), spelling);
        }
        if !sup.is_empty() {
            push_script(out, '^', sup.trim(), spelling);
        }
    }
}

fn push_script(out: &mut String, marker: char, script: &str, spelling: Spelling) {
    out.push(marker);
    if spelling == Spelling::Compact && is_single_token(script) {
        out.push_str(script);
    } else {
        out.push('{');
        out.push_str(script);
        out.push('}');
    }
}

/// One character, or one command name such as `\alpha`.
fn is_single_token(script: &str) -> bool {
    let mut chars = script.chars();
    match (chars.next(), chars.next()) {
        (Some(_), None) => true,
        (Some('\\'), Some(_)) => script[1..].chars().all(|c| c.is_ascii_alphabetic()),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
