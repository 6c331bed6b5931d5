//! Arithmetic expression tool.
//!
//! Parses a restricted arithmetic grammar into a typed expression tree and
//! evaluates it, instead of handing the string to any general evaluator.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{MnemoError, Result};
use crate::tool::{Tool, ToolOutput};

/// Evaluate an arithmetic expression.
///
/// Accepts numeric literals, `+ - * / ^` (with `**` and the Unicode
/// `− × ÷` aliases), unary minus, and parentheses. Anything else, including
/// identifiers and calls, is rejected with `InvalidExpression` carrying the
/// offending fragment.
pub fn evaluate(input: &str) -> Result<f64> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.expression()?;
    parser.expect_end()?;
    eval(&expr)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Debug, PartialEq)]
enum Expr {
    Number(f64),
    Neg(Box<Expr>),
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&ch) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' {
                        literal.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| MnemoError::InvalidExpression(literal.clone()))?;
                tokens.push(Token::Number(value));
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' | '\u{2212}' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                // `**` also spells power
                if chars.peek() == Some(&'*') {
                    chars.next();
                    tokens.push(Token::Caret);
                } else {
                    tokens.push(Token::Star);
                }
            }
            '\u{d7}' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' | '\u{f7}' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '^' => {
                chars.next();
                tokens.push(Token::Caret);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut fragment = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        fragment.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                return Err(MnemoError::InvalidExpression(fragment));
            }
            other => {
                return Err(MnemoError::InvalidExpression(other.to_string()));
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect_end(&self) -> Result<()> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(MnemoError::InvalidExpression(describe(token))),
        }
    }

    // expression := term (('+' | '-') term)*
    fn expression(&mut self) -> Result<Expr> {
        let mut lhs = self.term()?;
        while let Some(op) = match self.peek() {
            Some(Token::Plus) => Some(BinOp::Add),
            Some(Token::Minus) => Some(BinOp::Sub),
            _ => None,
        } {
            self.next();
            let rhs = self.term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    // term := unary (('*' | '/') unary)*
    fn term(&mut self) -> Result<Expr> {
        let mut lhs = self.unary()?;
        while let Some(op) = match self.peek() {
            Some(Token::Star) => Some(BinOp::Mul),
            Some(Token::Slash) => Some(BinOp::Div),
            _ => None,
        } {
            self.next();
            let rhs = self.unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    // unary := '-' unary | power
    // Power binds tighter than unary minus, so `-2^2` is `-(2^2)`.
    fn unary(&mut self) -> Result<Expr> {
        if matches!(self.peek(), Some(Token::Minus)) {
            self.next();
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        self.power()
    }

    // power := atom ('^' unary)?   right-associative
    fn power(&mut self) -> Result<Expr> {
        let base = self.atom()?;
        if matches!(self.peek(), Some(Token::Caret)) {
            self.next();
            let exponent = self.unary()?;
            return Ok(Expr::Binary {
                op: BinOp::Pow,
                lhs: Box::new(base),
                rhs: Box::new(exponent),
            });
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Expr> {
        match self.next() {
            Some(Token::Number(value)) => Ok(Expr::Number(value)),
            Some(Token::LParen) => {
                let inner = self.expression()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    Some(token) => Err(MnemoError::InvalidExpression(describe(&token))),
                    None => Err(MnemoError::InvalidExpression("end of input".into())),
                }
            }
            Some(token) => Err(MnemoError::InvalidExpression(describe(&token))),
            None => Err(MnemoError::InvalidExpression("end of input".into())),
        }
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Number(value) => format!("{value}"),
        Token::Plus => "+".into(),
        Token::Minus => "-".into(),
        Token::Star => "*".into(),
        Token::Slash => "/".into(),
        Token::Caret => "^".into(),
        Token::LParen => "(".into(),
        Token::RParen => ")".into(),
    }
}

fn eval(expr: &Expr) -> Result<f64> {
    match expr {
        Expr::Number(value) => Ok(*value),
        Expr::Neg(inner) => Ok(-eval(inner)?),
        Expr::Binary { op, lhs, rhs } => {
            let lhs = eval(lhs)?;
            let rhs = eval(rhs)?;
            match op {
                BinOp::Add => Ok(lhs + rhs),
                BinOp::Sub => Ok(lhs - rhs),
                BinOp::Mul => Ok(lhs * rhs),
                BinOp::Div => {
                    if rhs == 0.0 {
                        Err(MnemoError::Arithmetic("division by zero".into()))
                    } else {
                        Ok(lhs / rhs)
                    }
                }
                BinOp::Pow => Ok(lhs.powf(rhs)),
            }
        }
    }
}

pub struct MathCalculatorTool;

#[async_trait]
impl Tool for MathCalculatorTool {
    fn name(&self) -> &str {
        "math_calculator"
    }

    fn description(&self) -> &str {
        "Evaluate an arithmetic expression. Expects {\"expression\": string}."
    }

    fn parameters(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "Arithmetic expression using numbers, + - * / ^ and parentheses"
                }
            },
            "required": ["expression"]
        }))
    }

    async fn call(&self, input: Value) -> Result<Value> {
        let expression = input
            .get("expression")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                MnemoError::InvalidInput("missing `expression` for math_calculator".into())
            })?;

        let output = match evaluate(expression) {
            Ok(value) => ToolOutput::Numeric { value },
            Err(err) => ToolOutput::Error {
                message: format!("Math Error: {err}"),
            },
        };
        Ok(output.into_value())
    }
}
