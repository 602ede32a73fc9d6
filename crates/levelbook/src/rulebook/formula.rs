//! Restricted arithmetic expressions for XP→level formulas.
//!
//! A formula is user data, never code. The grammar admits numeric
//! literals, the free variable `xp`, the operators `+ - * /`,
//! parentheses, and the functions `floor`, `ceil`, `min`, `max`.
//! Anything else is rejected at parse time, before the config is saved.

use crate::error::{LevelbookError, Result};

/// Config field name reported when a formula is rejected.
pub const FORMULA_FIELD: &str = "xp_level_formula";

/// Hard cap on formula source length.
const MAX_SOURCE_LEN: usize = 512;

/// Hard cap on expression nesting.
const MAX_DEPTH: usize = 64;

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Xp,
    Func(Func),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Comma,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Self::Number(n) => format!("number {n}"),
            Self::Xp => "'xp'".to_string(),
            Self::Func(f) => format!("'{}'", f.name()),
            Self::Plus => "'+'".to_string(),
            Self::Minus => "'-'".to_string(),
            Self::Star => "'*'".to_string(),
            Self::Slash => "'/'".to_string(),
            Self::LParen => "'('".to_string(),
            Self::RParen => "')'".to_string(),
            Self::Comma => "','".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Func {
    Floor,
    Ceil,
    Min,
    Max,
}

impl Func {
    fn name(self) -> &'static str {
        match self {
            Self::Floor => "floor",
            Self::Ceil => "ceil",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    fn arity(self) -> usize {
        match self {
            Self::Floor | Self::Ceil => 1,
            Self::Min | Self::Max => 2,
        }
    }
}

fn formula_err(reason: impl Into<String>) -> LevelbookError {
    LevelbookError::rulebook(FORMULA_FIELD, reason)
}

fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(pos, ch)) = chars.peek() {
        match ch {
            c if c.is_ascii_whitespace() => {
                chars.next();
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            c if c.is_ascii_digit() => {
                let mut text = String::new();
                let mut seen_dot = false;
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_ascii_digit() {
                        text.push(c);
                        chars.next();
                    } else if c == '.' && !seen_dot {
                        seen_dot = true;
                        text.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value: f64 = text
                    .parse()
                    .map_err(|_| formula_err(format!("invalid number '{text}'")))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut text = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        text.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                match text.as_str() {
                    "xp" => tokens.push(Token::Xp),
                    "floor" => tokens.push(Token::Func(Func::Floor)),
                    "ceil" => tokens.push(Token::Func(Func::Ceil)),
                    "min" => tokens.push(Token::Func(Func::Min)),
                    "max" => tokens.push(Token::Func(Func::Max)),
                    other => return Err(formula_err(format!("unknown identifier '{other}'"))),
                }
            }
            other => {
                return Err(formula_err(format!(
                    "unexpected character '{other}' at offset {pos}"
                )));
            }
        }
    }

    Ok(tokens)
}

// ---------------------------------------------------------------------------
// Parser (recursive descent)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Expr {
    Number(f64),
    Xp,
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Call(Func, Vec<Expr>),
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token, what: &str) -> Result<()> {
        match self.peek() {
            Some(t) if t == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(t) => Err(formula_err(format!("expected {what}, found {}", t.describe()))),
            None => Err(formula_err(format!(
                "expected {what}, found end of formula"
            ))),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    let rhs = self.parse_term()?;
                    lhs = Expr::Add(Box::new(lhs), Box::new(rhs));
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    let rhs = self.parse_term()?;
                    lhs = Expr::Sub(Box::new(lhs), Box::new(rhs));
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    let rhs = self.parse_unary()?;
                    lhs = Expr::Mul(Box::new(lhs), Box::new(rhs));
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let rhs = self.parse_unary()?;
                    lhs = Expr::Div(Box::new(lhs), Box::new(rhs));
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        // Every nesting level passes through here, so one guard bounds
        // recursion for parens, calls, and minus chains alike.
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(formula_err("formula is nested too deeply"));
        }
        let expr = if matches!(self.peek(), Some(Token::Minus)) {
            self.pos += 1;
            Expr::Neg(Box::new(self.parse_unary()?))
        } else {
            self.parse_primary()?
        };
        self.depth -= 1;
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Xp) => Ok(Expr::Xp),
            Some(Token::LParen) => {
                let inner = self.parse_expr()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(inner)
            }
            Some(Token::Func(func)) => {
                self.expect(&Token::LParen, "'(' after function name")?;
                let mut args = vec![self.parse_expr()?];
                while matches!(self.peek(), Some(Token::Comma)) {
                    self.pos += 1;
                    args.push(self.parse_expr()?);
                }
                self.expect(&Token::RParen, "')'")?;
                if args.len() != func.arity() {
                    return Err(formula_err(format!(
                        "{} takes {} argument(s), found {}",
                        func.name(),
                        func.arity(),
                        args.len()
                    )));
                }
                Ok(Expr::Call(func, args))
            }
            Some(other) => Err(formula_err(format!("unexpected {}", other.describe()))),
            None => Err(formula_err("unexpected end of formula")),
        }
    }
}

// ---------------------------------------------------------------------------
// Formula
// ---------------------------------------------------------------------------

/// A parsed XP→level formula, ready for repeated evaluation.
#[derive(Debug, Clone)]
pub struct Formula {
    root: Expr,
}

impl Formula {
    /// Parse a formula from its source string.
    ///
    /// # Errors
    ///
    /// Returns a rulebook error naming `xp_level_formula` when the source
    /// is empty, too long, too deeply nested, or not in the grammar.
    pub fn parse(source: &str) -> Result<Self> {
        let trimmed = source.trim();
        if trimmed.is_empty() {
            return Err(formula_err("formula is empty"));
        }
        if trimmed.len() > MAX_SOURCE_LEN {
            return Err(formula_err(format!(
                "formula exceeds {MAX_SOURCE_LEN} characters"
            )));
        }

        let tokens = tokenize(trimmed)?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
        };
        let root = parser.parse_expr()?;

        if parser.pos != parser.tokens.len() {
            return Err(formula_err(format!(
                "unexpected trailing {}",
                parser.tokens[parser.pos].describe()
            )));
        }

        Ok(Self { root })
    }

    /// Evaluate at the given XP total.
    ///
    /// # Errors
    ///
    /// Division by zero and non-finite results are rulebook errors, never
    /// panics.
    pub fn eval(&self, xp: u64) -> Result<f64> {
        let value = eval_expr(&self.root, xp as f64)?;
        if !value.is_finite() {
            return Err(formula_err(format!("result is not finite at xp = {xp}")));
        }
        Ok(value)
    }

    /// Evaluate to an integer level: floored, clamped to at least 1.
    pub fn eval_level(&self, xp: u64) -> Result<u32> {
        let value = self.eval(xp)?.floor();
        if value < 1.0 {
            return Ok(1);
        }
        if value >= u32::MAX as f64 {
            return Ok(u32::MAX);
        }
        Ok(value as u32)
    }
}

fn eval_expr(expr: &Expr, xp: f64) -> Result<f64> {
    Ok(match expr {
        Expr::Number(n) => *n,
        Expr::Xp => xp,
        Expr::Neg(inner) => -eval_expr(inner, xp)?,
        Expr::Add(a, b) => eval_expr(a, xp)? + eval_expr(b, xp)?,
        Expr::Sub(a, b) => eval_expr(a, xp)? - eval_expr(b, xp)?,
        Expr::Mul(a, b) => eval_expr(a, xp)? * eval_expr(b, xp)?,
        Expr::Div(a, b) => {
            let divisor = eval_expr(b, xp)?;
            if divisor == 0.0 {
                return Err(formula_err("division by zero"));
            }
            eval_expr(a, xp)? / divisor
        }
        // Arity is enforced at parse time, so the arg indexes hold.
        Expr::Call(func, args) => match func {
            Func::Floor => eval_expr(&args[0], xp)?.floor(),
            Func::Ceil => eval_expr(&args[0], xp)?.ceil(),
            Func::Min => eval_expr(&args[0], xp)?.min(eval_expr(&args[1], xp)?),
            Func::Max => eval_expr(&args[0], xp)?.max(eval_expr(&args[1], xp)?),
        },
    })
}
