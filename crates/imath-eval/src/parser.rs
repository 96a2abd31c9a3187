#![forbid(unsafe_code)]

//! Recursive-descent parser over the token stream.
//!
//! Precedence, loosest first:
//!
//! ```text
//! expr    := mul (('+' | '-') mul)*
//! mul     := unary ((op unary) | pow)*        op: * / \cdot \times \div
//! unary   := ('+' | '-') unary | pow
//! pow     := postfix ('^' exponent '!'*)?
//! postfix := primary '!'*
//! primary := number | symbol | group | '|' expr '|' | command
//! ```
//!
//! The second `mul` alternative is implicit multiplication (`2x`, `3\sqrt{2}`).
//! Because `unary` sits above `pow`, `-2^2` is `-(2^2)`.

use crate::ast::{BinOp, Expr, Func};
use crate::error::{EvalError, Result};
use crate::lexer::{SpannedToken, Token};

/// Deepest nesting of groups and signs accepted before giving up.
pub const MAX_DEPTH: usize = 256;

/// Longest token stream accepted.
///
/// Operator chains (`1+1+…`, `x!!!…`) are built in loops and never reach the
/// depth guard, so the tree is bounded by size instead: the node count is
/// linear in the token count, and a tree is never taller than its node count.
pub const MAX_TOKENS: usize = 1024;

pub(crate) fn parse(tokens: &[SpannedToken]) -> Result<Expr> {
    if tokens.len() > MAX_TOKENS {
        return Err(EvalError::TooLong {
            tokens: tokens.len(),
            limit: MAX_TOKENS,
        });
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        abs_depth: 0,
        depth: 0,
    };
    let expr = parser.parse_expr()?;
    match parser.peek() {
        None => Ok(expr),
        Some(tok) => Err(unexpected(tok, "end of input")),
    }
}

struct Parser<'a> {
    tokens: &'a [SpannedToken],
    pos: usize,
    /// Open `|…|` groups; a `|` closes instead of opening while this is > 0.
    abs_depth: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_add_sub()
    }

    fn parse_add_sub(&mut self) -> Result<Expr> {
        let mut node = self.parse_mul_div()?;
        loop {
            let op = if self.consume(Token::Plus) {
                BinOp::Add
            } else if self.consume(Token::Minus) {
                BinOp::Sub
            } else {
                break;
            };
            let rhs = self.parse_mul_div()?;
            node = Expr::binary(op, node, rhs);
        }
        Ok(node)
    }

    fn parse_mul_div(&mut self) -> Result<Expr> {
        let mut node = self.parse_unary()?;
        loop {
            if let Some(op) = self.explicit_mul_op() {
                self.pos += 1;
                let rhs = self.parse_unary()?;
                node = Expr::binary(op, node, rhs);
            } else if self.starts_operand() {
                let rhs = self.parse_pow()?;
                node = Expr::binary(BinOp::Mul, node, rhs);
            } else {
                break;
            }
        }
        Ok(node)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        self.nested(|p| {
            if p.consume(Token::Plus) {
                p.parse_unary()
            } else if p.consume(Token::Minus) {
                p.parse_unary().map(|inner| Expr::Neg(Box::new(inner)))
            } else {
                p.parse_pow()
            }
        })
    }

    fn parse_pow(&mut self) -> Result<Expr> {
        let base = self.parse_postfix()?;
        if !self.consume(Token::Caret) {
            return Ok(base);
        }
        let exponent = self.parse_exponent()?;
        let mut node = Expr::binary(BinOp::Pow, base, exponent);
        while self.consume(Token::Bang) {
            node = Expr::Factorial(Box::new(node));
        }
        Ok(node)
    }

    /// `{expr}` or a signed single operand; right-associative through
    /// [`Self::parse_unary`].
    fn parse_exponent(&mut self) -> Result<Expr> {
        if self.consume(Token::LBrace) {
            return self.parse_group(Token::RBrace, "}");
        }
        self.parse_unary()
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let mut node = self.parse_primary()?;
        while self.consume(Token::Bang) {
            node = Expr::Factorial(Box::new(node));
        }
        Ok(node)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        self.nested(Self::parse_primary_inner)
    }

    fn parse_primary_inner(&mut self) -> Result<Expr> {
        let Some(tok) = self.next() else {
            return Err(EvalError::UnexpectedEnd {
                expected: "operand",
            });
        };
        match tok.token {
            Token::Number => tok
                .lexeme
                .parse::<f64>()
                .map(Expr::Number)
                .map_err(|_| unexpected(tok, "number")),
            Token::Symbol => Ok(Expr::Symbol(tok.lexeme.clone())),
            Token::LParen => self.parse_group(Token::RParen, ")"),
            Token::LBracket => self.parse_group(Token::RBracket, "]"),
            Token::LBrace => self.parse_group(Token::RBrace, "}"),
            Token::Pipe => {
                self.abs_depth += 1;
                let inner = self.parse_expr();
                self.abs_depth -= 1;
                let inner = inner?;
                self.expect(Token::Pipe, "|")?;
                Ok(Expr::Abs(Box::new(inner)))
            }
            Token::Command => self.parse_command(tok),
            _ => Err(unexpected(tok, "operand")),
        }
    }

    fn parse_group(&mut self, close: Token, expected: &'static str) -> Result<Expr> {
        let saved_abs = std::mem::replace(&mut self.abs_depth, 0);
        let inner = self.parse_expr();
        self.abs_depth = saved_abs;
        let inner = inner?;
        self.expect(close, expected)?;
        Ok(inner)
    }

    fn parse_command(&mut self, tok: &SpannedToken) -> Result<Expr> {
        match tok.command_name() {
            "frac" | "dfrac" | "tfrac" => {
                let numerator = self.parse_argument()?;
                let denominator = self.parse_argument()?;
                Ok(Expr::binary(BinOp::Div, numerator, denominator))
            }
            "sqrt" => {
                let degree = if self.consume(Token::LBracket) {
                    Some(Box::new(self.parse_group(Token::RBracket, "]")?))
                } else {
                    None
                };
                let radicand = Box::new(self.parse_argument()?);
                Ok(Expr::Root { degree, radicand })
            }
            "abs" => Ok(Expr::Abs(Box::new(self.parse_argument()?))),
            "log" => {
                let base = if self.consume(Token::Underscore) {
                    self.parse_argument()?
                } else {
                    Expr::Number(10.0)
                };
                let power = self.parse_function_power()?;
                let mut args = self.parse_function_arguments()?;
                if args.len() != 1 {
                    return Err(EvalError::Arity {
                        function: "log",
                        expected: "1",
                        got: args.len(),
                    });
                }
                let arg = args.remove(0);
                let call = Expr::Log {
                    base: Box::new(base),
                    arg: Box::new(arg),
                };
                Ok(apply_power(call, power))
            }
            name => {
                let Some(func) = Func::from_command(name) else {
                    return Err(EvalError::UnknownCommand {
                        name: name.to_string(),
                    });
                };
                let power = self.parse_function_power()?;
                let args = self.parse_function_arguments()?;
                check_arity(func, args.len())?;
                Ok(apply_power(Expr::Call { func, args }, power))
            }
        }
    }

    /// `\sin^2 x` squares the result.
    fn parse_function_power(&mut self) -> Result<Option<Expr>> {
        if self.consume(Token::Caret) {
            self.parse_exponent().map(Some)
        } else {
            Ok(None)
        }
    }

    /// `(a, b)`, `{a, b}`, or a single unparenthesized operand (`\sin x^2`).
    fn parse_function_arguments(&mut self) -> Result<Vec<Expr>> {
        let close = match self.peek_token() {
            Some(Token::LParen) => (Token::RParen, ")"),
            Some(Token::LBrace) => (Token::RBrace, "}"),
            _ => return Ok(vec![self.parse_unary()?]),
        };
        self.pos += 1;

        let saved_abs = std::mem::replace(&mut self.abs_depth, 0);
        let args = self.parse_argument_list(close);
        self.abs_depth = saved_abs;
        args
    }

    fn parse_argument_list(&mut self, (close, expected): (Token, &'static str)) -> Result<Vec<Expr>> {
        let mut args = vec![self.parse_expr()?];
        while self.consume(Token::Comma) {
            args.push(self.parse_expr()?);
        }
        self.expect(close, expected)?;
        Ok(args)
    }

    /// A braced group or a single primary, as taken by `\frac` and `\sqrt`.
    fn parse_argument(&mut self) -> Result<Expr> {
        if self.consume(Token::LBrace) {
            return self.parse_group(Token::RBrace, "}");
        }
        self.parse_primary()
    }

    // -----------------------------------------------------------------------
    // Token helpers
    // -----------------------------------------------------------------------

    /// Run `f` one level deeper. Every recursive path passes through here.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.depth += 1;
        let result = if self.depth > MAX_DEPTH {
            Err(EvalError::NestingTooDeep { limit: MAX_DEPTH })
        } else {
            f(self)
        };
        self.depth -= 1;
        result
    }

    fn explicit_mul_op(&self) -> Option<BinOp> {
        let tok = self.peek()?;
        match tok.token {
            Token::Star => Some(BinOp::Mul),
            Token::Slash => Some(BinOp::Div),
            Token::Command => match tok.command_name() {
                "cdot" | "times" => Some(BinOp::Mul),
                "div" => Some(BinOp::Div),
                _ => None,
            },
            _ => None,
        }
    }

    fn starts_operand(&self) -> bool {
        let Some(tok) = self.peek() else {
            return false;
        };
        match tok.token {
            Token::Number | Token::Symbol | Token::LParen | Token::LBracket | Token::LBrace => true,
            Token::Pipe => self.abs_depth == 0,
            Token::Command => self.explicit_mul_op().is_none(),
            _ => false,
        }
    }

    fn peek(&self) -> Option<&'a SpannedToken> {
        self.tokens.get(self.pos)
    }

    fn peek_token(&self) -> Option<Token> {
        self.peek().map(|t| t.token)
    }

    fn next(&mut self) -> Option<&'a SpannedToken> {
        let tok = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(tok)
    }

    fn consume(&mut self, token: Token) -> bool {
        if self.peek_token() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token, expected: &'static str) -> Result<()> {
        match self.next() {
            Some(tok) if tok.token == token => Ok(()),
            Some(tok) => Err(unexpected(tok, expected)),
            None => Err(EvalError::UnexpectedEnd { expected }),
        }
    }
}

fn unexpected(tok: &SpannedToken, expected: &'static str) -> EvalError {
    EvalError::UnexpectedToken {
        found: tok.lexeme.clone(),
        expected,
        offset: tok.start,
    }
}

fn check_arity(func: Func, got: usize) -> Result<()> {
    let ok = if func.is_variadic() { got >= 1 } else { got == 1 };
    if ok {
        Ok(())
    } else {
        Err(EvalError::Arity {
            function: func.name(),
            expected: if func.is_variadic() { "at least 1" } else { "1" },
            got,
        })
    }
}

fn apply_power(call: Expr, power: Option<Expr>) -> Expr {
    match power {
        Some(exponent) => Expr::binary(BinOp::Pow, call, exponent),
        None => call,
    }
}
