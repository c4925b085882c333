//! Arithmetic DSL used by game-design formulas stored in catalogs.
//!
//! Grammar (lowest to highest precedence):
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := '-' unary | power
//! power   := atom ('^' unary)?
//! atom    := number | ident | ident '(' args ')' | '(' expr ')'
//! ```
//!
//! Identifiers are matched as whole tokens against the variable map, so a
//! variable named `Power` never collides with `UserPower`.

use std::collections::BTreeSet;

use crate::error::FormulaError;
use crate::formula::variables::Variables;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Round,
    RoundUp,
    RoundDown,
    Floor,
    Min,
    Max,
    Ln,
}

impl Function {
    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "ROUND" => Some(Self::Round),
            "ROUNDUP" => Some(Self::RoundUp),
            "ROUNDDOWN" => Some(Self::RoundDown),
            "FLOOR" => Some(Self::Floor),
            "MIN" => Some(Self::Min),
            "MAX" => Some(Self::Max),
            "LN" => Some(Self::Ln),
            _ => None,
        }
    }

    fn check_arity(self, name: &str, got: usize) -> Result<(), FormulaError> {
        let (ok, expected) = match self {
            Self::Round | Self::RoundUp | Self::RoundDown | Self::Floor => {
                ((1..=2).contains(&got), "1 or 2")
            }
            Self::Min | Self::Max => (got >= 1, "at least 1"),
            Self::Ln => (got == 1, "1"),
        };
        if ok {
            Ok(())
        } else {
            Err(FormulaError::Arity {
                name: name.to_string(),
                expected,
                got,
            })
        }
    }

    fn apply(self, args: &[f64]) -> f64 {
        let digits_factor = || 10f64.powi(args.get(1).copied().unwrap_or(0.0) as i32);
        match self {
            Self::Round => {
                let factor = digits_factor();
                (args[0] * factor).round() / factor
            }
            Self::RoundUp => {
                let factor = digits_factor();
                args[0].signum() * (args[0].abs() * factor).ceil() / factor
            }
            Self::RoundDown => {
                let factor = digits_factor();
                (args[0] * factor).trunc() / factor
            }
            Self::Floor => match args.get(1) {
                Some(significance) if *significance != 0.0 => {
                    (args[0] / significance).floor() * significance
                }
                _ => args[0].floor(),
            },
            Self::Min => args.iter().copied().fold(f64::INFINITY, f64::min),
            Self::Max => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Self::Ln => args[0].ln(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(f64),
    Variable(String),
    Neg(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(Function, Vec<Expr>),
}

impl Expr {
    fn eval(&self, variables: &Variables) -> Result<f64, FormulaError> {
        match self {
            Expr::Number(value) => Ok(*value),
            Expr::Variable(name) => variables
                .get(name)
                .copied()
                .ok_or_else(|| FormulaError::UnknownVariable(name.clone())),
            Expr::Neg(inner) => Ok(-inner.eval(variables)?),
            Expr::Binary(op, left, right) => {
                let l = left.eval(variables)?;
                let r = right.eval(variables)?;
                Ok(match op {
                    BinaryOp::Add => l + r,
                    BinaryOp::Sub => l - r,
                    BinaryOp::Mul => l * r,
                    BinaryOp::Div => l / r,
                    BinaryOp::Pow => l.powf(r),
                })
            }
            Expr::Call(function, args) => {
                let values = args
                    .iter()
                    .map(|arg| arg.eval(variables))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(function.apply(&values))
            }
        }
    }

    fn collect_variables<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            Expr::Number(_) => {}
            Expr::Variable(name) => {
                out.insert(name.as_str());
            }
            Expr::Neg(inner) => inner.collect_variables(out),
            Expr::Binary(_, left, right) => {
                left.collect_variables(out);
                right.collect_variables(out);
            }
            Expr::Call(_, args) => args.iter().for_each(|arg| arg.collect_variables(out)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Op(char),
    LParen,
    RParen,
    Comma,
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

fn tokenize(source: &str) -> Result<Vec<(usize, Token)>, FormulaError> {
    let syntax = |offset: usize, message: String| FormulaError::Syntax {
        formula: source.to_string(),
        offset,
        message,
    };

    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();
    while let Some(&(offset, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c.is_ascii_digit() || c == '.' {
            let mut end = offset;
            while let Some(&(i, d)) = chars.peek() {
                if d.is_ascii_digit() || d == '.' {
                    end = i + d.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            let text = &source[offset..end];
            let value = text
                .parse::<f64>()
                .map_err(|_| syntax(offset, format!("invalid number '{text}'")))?;
            tokens.push((offset, Token::Number(value)));
        } else if is_ident_start(c) {
            let mut end = offset;
            while let Some(&(i, d)) = chars.peek() {
                if is_ident_continue(d) {
                    end = i + d.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push((offset, Token::Ident(source[offset..end].to_string())));
        } else {
            let token = match c {
                '+' | '-' | '*' | '/' | '^' => Token::Op(c),
                '(' => Token::LParen,
                ')' => Token::RParen,
                ',' => Token::Comma,
                other => return Err(syntax(offset, format!("unexpected character '{other}'"))),
            };
            tokens.push((offset, token));
            chars.next();
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<(usize, Token)>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, message: impl Into<String>) -> FormulaError {
        let offset = self
            .tokens
            .get(self.pos)
            .map(|(offset, _)| *offset)
            .unwrap_or(self.source.len());
        FormulaError::Syntax {
            formula: self.source.to_string(),
            offset,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, token)| token)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(_, token)| token.clone());
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), FormulaError> {
        if self.peek() == Some(&expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected {expected:?}")))
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, FormulaError> {
        let mut left = self.parse_term()?;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek().cloned() {
            self.pos += 1;
            let right = self.parse_term()?;
            let op = if op == '+' { BinaryOp::Add } else { BinaryOp::Sub };
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, FormulaError> {
        let mut left = self.parse_unary()?;
        while let Some(Token::Op(op @ ('*' | '/'))) = self.peek().cloned() {
            self.pos += 1;
            let right = self.parse_unary()?;
            let op = if op == '*' { BinaryOp::Mul } else { BinaryOp::Div };
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, FormulaError> {
        match self.peek() {
            Some(Token::Op('-')) => {
                self.pos += 1;
                Ok(Expr::Neg(Box::new(self.parse_unary()?)))
            }
            Some(Token::Op('+')) => {
                self.pos += 1;
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Result<Expr, FormulaError> {
        let base = self.parse_atom()?;
        if let Some(Token::Op('^')) = self.peek() {
            self.pos += 1;
            let exponent = self.parse_unary()?;
            return Ok(Expr::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn parse_atom(&mut self) -> Result<Expr, FormulaError> {
        match self.next() {
            Some(Token::Number(value)) => Ok(Expr::Number(value)),
            Some(Token::Ident(name)) => {
                if self.peek() != Some(&Token::LParen) {
                    return Ok(Expr::Variable(name));
                }
                let function = Function::from_name(&name)
                    .ok_or_else(|| FormulaError::DisallowedFunction(name.clone()))?;
                self.pos += 1;
                let mut args = Vec::new();
                if self.peek() != Some(&Token::RParen) {
                    loop {
                        args.push(self.parse_expr()?);
                        if self.peek() == Some(&Token::Comma) {
                            self.pos += 1;
                        } else {
                            break;
                        }
                    }
                }
                self.expect(Token::RParen)?;
                function.check_arity(&name, args.len())?;
                Ok(Expr::Call(function, args))
            }
            Some(Token::LParen) => {
                let inner = self.parse_expr()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(token) => {
                self.pos -= 1;
                Err(self.error(format!("unexpected token {token:?}")))
            }
            None => Err(self.error("unexpected end of formula")),
        }
    }
}

/// A formula parsed once and evaluable any number of times.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFormula {
    source: String,
    expr: Expr,
}

impl CompiledFormula {
    pub fn compile(source: &str) -> Result<Self, FormulaError> {
        let tokens = tokenize(source)?;
        let mut parser = Parser {
            source,
            tokens,
            pos: 0,
        };
        let expr = parser.parse_expr()?;
        if parser.pos < parser.tokens.len() {
            return Err(parser.error("trailing input"));
        }
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Names of every variable the formula references.
    pub fn variables(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.expr.collect_variables(&mut out);
        out
    }

    pub fn evaluate(&self, variables: &Variables) -> Result<f64, FormulaError> {
        let value = self.expr.eval(variables)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(FormulaError::NonNumeric(self.source.clone()))
        }
    }
}

/// Compile and evaluate in one step.
pub fn evaluate(formula: &str, variables: &Variables) -> Result<f64, FormulaError> {
    CompiledFormula::compile(formula)?.evaluate(variables)
}
