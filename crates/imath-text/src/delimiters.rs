#![forbid(unsafe_code)]

//! Locating delimited math in plain text.
//!
//! The scanner finds `$…$`/`$$…$$` (or `\(…\)`/`\[…\]`, or custom patterns)
//! and reports each occurrence as a [`MathSpan`]. It never edits the text;
//! turning spans into document nodes is the host's job.
//!
//! # Rules
//!
//! - Block spans are found first; inline spans only between them.
//! - Dollar inline: the opening `$` is not preceded by `$` and not followed by
//!   `$`, whitespace, `,` or `.`. The content may contain `\$` but no bare `$`,
//!   and must not end in `\`, whitespace, `(`, `[` or `"`. This keeps prices
//!   like `$5 and $6` from being read as math.
//! - Dollar block: content must not start with whitespace or end with `\`.
//! - A trailing `=` in the content requests that the evaluated result be
//!   shown; the `=` is removed from [`MathSpan::latex`].

use std::ops::Range;

use regex::Regex;

use crate::options::Delimiters;

/// Inline (`$x$`) or block (`$$x$$`) math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DisplayMode {
    #[default]
    Inline,
    Block,
}

/// One delimited math occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathSpan {
    /// Byte range of the whole match, delimiters included.
    pub range: Range<usize>,
    /// LaTeX source with any trailing `=` removed.
    pub latex: String,
    pub display: DisplayMode,
    /// The source ended in `=`.
    pub show_result: bool,
}

#[derive(Debug, Clone)]
enum Matcher {
    DollarInline,
    DollarBlock,
    Pattern(Regex),
}

/// A compiled scanner for one [`Delimiters`] configuration.
#[derive(Debug, Clone)]
pub struct DelimiterScanner {
    inline: Option<Matcher>,
    block: Option<Matcher>,
}

impl DelimiterScanner {
    /// Compile the scanner. Fails only for invalid custom patterns.
    pub fn new(delimiters: &Delimiters) -> Result<Self, regex::Error> {
        let (inline, block) = match delimiters {
            Delimiters::Dollar => (Some(Matcher::DollarInline), Some(Matcher::DollarBlock)),
            Delimiters::Bracket => (
                Some(Matcher::Pattern(Regex::new(r"\\\((.*?[^\\])\\\)")?)),
                Some(Matcher::Pattern(Regex::new(r"\\\[(.*?[^\\])\\\]")?)),
            ),
            Delimiters::Custom(custom) => (
                custom
                    .inline_regex
                    .as_deref()
                    .map(Regex::new)
                    .transpose()?
                    .map(Matcher::Pattern),
                custom
                    .block_regex
                    .as_deref()
                    .map(Regex::new)
                    .transpose()?
                    .map(Matcher::Pattern),
            ),
        };
        Ok(Self { inline, block })
    }

    /// All math spans in `text`, ordered by position and non-overlapping.
    #[must_use]
    pub fn scan(&self, text: &str) -> Vec<MathSpan> {
        let mut spans = Vec::new();

        let blocks = self
            .block
            .as_ref()
            .map(|m| m.find_all(text, 0..text.len()))
            .unwrap_or_default();

        let mut gap_start = 0;
        for (range, latex) in blocks {
            if let Some(inline) = &self.inline {
                let found = inline.find_all(text, gap_start..range.start);
                collect(&mut spans, text, found, DisplayMode::Inline);
            }
            gap_start = range.end;
            collect(&mut spans, text, vec![(range, latex)], DisplayMode::Block);
        }
        if let Some(inline) = &self.inline {
            let found = inline.find_all(text, gap_start..text.len());
            collect(&mut spans, text, found, DisplayMode::Inline);
        }

        spans
    }
}

/// Convenience wrapper: compile and scan in one call.
pub fn scan(text: &str, delimiters: &Delimiters) -> Result<Vec<MathSpan>, regex::Error> {
    Ok(DelimiterScanner::new(delimiters)?.scan(text))
}

fn collect(
    out: &mut Vec<MathSpan>,
    text: &str,
    found: Vec<(Range<usize>, Range<usize>)>,
    display: DisplayMode,
) {
    for (range, latex_range) in found {
        let raw = &text[latex_range];
        if raw.is_empty() {
            continue;
        }
        let latex = match display {
            DisplayMode::Inline => raw.trim(),
            DisplayMode::Block => raw,
        };
        let (latex, show_result) = match latex.strip_suffix('=') {
            Some(stripped) => (stripped, true),
            None => (latex, false),
        };
        out.push(MathSpan {
            range,
            latex: latex.to_string(),
            display,
            show_result,
        });
    }
}

// ---------------------------------------------------------------------------
// Matchers
// ---------------------------------------------------------------------------

impl Matcher {
    /// `(whole match, latex)` byte ranges inside `window`.
    fn find_all(&self, text: &str, window: Range<usize>) -> Vec<(Range<usize>, Range<usize>)> {
        let mut found = Vec::new();
        if window.start >= window.end {
            return found;
        }
        match self {
            Self::Pattern(re) => {
                let slice = &text[window.clone()];
                for caps in re.captures_iter(slice) {
                    let Some(whole) = caps.get(0) else { continue };
                    let latex = caps.get(1).map_or(whole.start()..whole.start(), |m| m.range());
                    found.push((
                        window.start + whole.start()..window.start + whole.end(),
                        window.start + latex.start..window.start + latex.end,
                    ));
                }
            }
            Self::DollarInline | Self::DollarBlock => {
                let mut at = window.start;
                while at < window.end {
                    let matched = if matches!(self, Self::DollarBlock) {
                        match_dollar_block(text, at, window.end)
                    } else {
                        match_dollar_inline(text, at, window.end)
                    };
                    match matched {
                        Some((whole, latex)) => {
                            at = whole.end;
                            found.push((whole, latex));
                        }
                        None => at += text[at..].chars().next().map_or(1, char::len_utf8),
                    }
                }
            }
        }
        found
    }
}

/// `$$content$$` starting exactly at `at`.
fn match_dollar_block(text: &str, at: usize, limit: usize) -> Option<(Range<usize>, Range<usize>)> {
    let rest = &text[at..limit];
    if !rest.starts_with("$$") {
        return None;
    }
    let body_start = at + 2;
    if text[body_start..limit].chars().next().is_some_and(char::is_whitespace) {
        return None;
    }

    let mut cursor = body_start;
    loop {
        let tail = &text[cursor..limit];
        if tail.starts_with("$$") {
            let escaped = cursor > body_start && text[..cursor].ends_with('\\');
            if !escaped {
                return Some((at..cursor + 2, body_start..cursor));
            }
        }
        let ch = tail.chars().next()?;
        if ch == '\n' {
            return None;
        }
        cursor += ch.len_utf8();
    }
}

/// `$content$` starting exactly at `at`.
fn match_dollar_inline(text: &str, at: usize, limit: usize) -> Option<(Range<usize>, Range<usize>)> {
    if !text[at..limit].starts_with('$') || text[..at].ends_with('$') {
        return None;
    }
    let body_start = at + 1;
    match text[body_start..limit].chars().next() {
        None => return None,
        Some(c) if c == '$' || c == ',' || c == '.' || c.is_whitespace() => return None,
        Some(_) => {}
    }

    let mut cursor = body_start;
    let mut last: Option<char> = None;
    loop {
        let tail = &text[cursor..limit];
        let ch = tail.chars().next()?;
        if ch == '$' {
            let closable = last.is_some_and(|c| {
                !(c == '\\' || c.is_whitespace() || matches!(c, '(' | '[' | '"'))
            });
            return closable.then(|| (at..cursor + 1, body_start..cursor));
        }
        if ch == '\\' && tail[1..].starts_with('$') {
            cursor += 2;
            last = Some('$');
            continue;
        }
        cursor += ch.len_utf8();
        last = Some(ch);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
