#![forbid(unsafe_code)]

//! Tokenizer for LaTeX-flavored arithmetic.
//!
//! Whitespace and the LaTeX spacing commands (`\,` `\;` `\:` `\!` `\ `,
//! `\quad`, `\qquad`) are dropped, as are the `\left`/`\right` sizing
//! prefixes. Everything else becomes a [`SpannedToken`].

use logos::Logos;

use crate::error::{EvalError, Result};

/// Letter commands that carry no arithmetic meaning.
const IGNORED_COMMANDS: &[&str] = &["left", "right", "quad", "qquad"];

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"\\[,;:! ]")]
pub enum Token {
    #[regex(r"[0-9]+(\.[0-9]+)?")]
    #[regex(r"\.[0-9]+")]
    Number,
    /// A maximal run of ASCII letters.
    #[regex(r"[A-Za-z]+")]
    Symbol,
    /// `\name`; the lexeme keeps the backslash.
    #[regex(r"\\[A-Za-z]+")]
    Command,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("^")]
    Caret,
    #[token("_")]
    Underscore,
    #[token("!")]
    Bang,
    #[token("|")]
    Pipe,
    #[token(",")]
    Comma,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpannedToken {
    pub token: Token,
    pub lexeme: String,
    pub start: usize,
    pub end: usize,
}

impl SpannedToken {
    /// Command name without the leading backslash, or `""` for
    /// non-command tokens.
    #[must_use]
    pub fn command_name(&self) -> &str {
        match self.token {
            Token::Command => &self.lexeme[1..],
            _ => "",
        }
    }
}

pub fn tokenize(input: &str) -> Result<Vec<SpannedToken>> {
    let mut lex = Token::lexer(input);
    let mut out = Vec::new();
    while let Some(res) = lex.next() {
        let span = lex.span();
        let Ok(token) = res else {
            return Err(EvalError::UnexpectedChar {
                text: lex.slice().to_string(),
                offset: span.start,
            });
        };
        if token == Token::Command && IGNORED_COMMANDS.contains(&&lex.slice()[1..]) {
            continue;
        }
        out.push(SpannedToken {
            token,
            lexeme: lex.slice().to_string(),
            start: span.start,
            end: span.end,
        });
    }
    Ok(out)
}
