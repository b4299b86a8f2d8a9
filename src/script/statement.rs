use super::{Expr, Order};
use serde::{Deserialize, Serialize};
use std::fmt;

const INDENT: &str = "    ";

/// A statement in the generated script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Expr(Expr),
    Assign {
        target: Expr,
        value: Expr,
    },
    If {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    Try {
        body: Vec<Stmt>,
        handlers: Vec<Handler>,
    },
    /// `raise` on its own re-raises the active exception.
    Raise(Option<Expr>),
    Import(String),
    Comment(String),
    Blank,
}

/// An `except` clause of a [`Stmt::Try`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Handler {
    pub exception: String,
    pub binding: Option<String>,
    pub body: Vec<Stmt>,
}

impl Stmt {
    pub fn expr(expr: Expr) -> Self {
        Stmt::Expr(expr)
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        Stmt::Assign { target, value }
    }

    pub fn if_else(test: Expr, body: Vec<Stmt>, orelse: Vec<Stmt>) -> Self {
        Stmt::If { test, body, orelse }
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Stmt::Comment(text.into())
    }
}

/// Renders a sequence of statements at a given indentation depth.
///
/// Every statement ends with a line break. Each line of a multi-line expression
/// is indented to the statement's depth.
pub struct StatementBlock<'a> {
    pub statements: &'a [Stmt],
    pub depth: usize,
}

impl<'a> StatementBlock<'a> {
    pub fn new(statements: &'a [Stmt]) -> Self {
        Self {
            statements,
            depth: 0,
        }
    }

    fn nested(&self, statements: &'a [Stmt]) -> StatementBlock<'a> {
        StatementBlock {
            statements,
            depth: self.depth + 1,
        }
    }

    fn fmt_body(&self, f: &mut fmt::Formatter<'_>, body: &'a [Stmt]) -> fmt::Result {
        if body.is_empty() {
            writeln!(f, "{}pass", INDENT.repeat(self.depth + 1))
        } else {
            write!(f, "{}", self.nested(body))
        }
    }

    fn fmt_statement(&self, f: &mut fmt::Formatter<'_>, stmt: &'a Stmt) -> fmt::Result {
        let pad = INDENT.repeat(self.depth);
        match stmt {
            Stmt::Expr(expr) => write_indented(f, &pad, &expr.render_in(Order::None)),
            Stmt::Assign { target, value } => write_indented(
                f,
                &pad,
                &format!(
                    "{} = {}",
                    target.render_in(Order::None),
                    value.render_in(Order::None)
                ),
            ),
            Stmt::If { test, body, orelse } => {
                writeln!(f, "{}if {}:", pad, test.render_in(Order::None))?;
                self.fmt_body(f, body)?;
                if !orelse.is_empty() {
                    writeln!(f, "{}else:", pad)?;
                    self.fmt_body(f, orelse)?;
                }
                Ok(())
            }
            Stmt::Try { body, handlers } => {
                writeln!(f, "{}try:", pad)?;
                self.fmt_body(f, body)?;
                for handler in handlers {
                    match &handler.binding {
                        Some(name) => writeln!(f, "{}except {} as {}:", pad, handler.exception, name)?,
                        None => writeln!(f, "{}except {}:", pad, handler.exception)?,
                    }
                    self.fmt_body(f, &handler.body)?;
                }
                Ok(())
            }
            Stmt::Raise(None) => writeln!(f, "{}raise", pad),
            Stmt::Raise(Some(expr)) => {
                write_indented(f, &pad, &format!("raise {}", expr.render_in(Order::None)))
            }
            Stmt::Import(module) => writeln!(f, "{}import {}", pad, module),
            Stmt::Comment(text) => {
                // A lone carriage return also ends a line for Python.
                for line in text.lines().flat_map(|l| l.split('\r')) {
                    writeln!(f, "{}# {}", pad, line)?;
                }
                Ok(())
            }
            Stmt::Blank => writeln!(f),
        }
    }
}

fn write_indented(f: &mut fmt::Formatter<'_>, pad: &str, code: &str) -> fmt::Result {
    for line in code.lines() {
        writeln!(f, "{}{}", pad, line)?;
    }
    Ok(())
}

impl fmt::Display for StatementBlock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in self.statements {
            self.fmt_statement(f, stmt)?;
        }
        Ok(())
    }
}

/// Renders statements at the top level.
pub fn render_statements(statements: &[Stmt]) -> String {
    StatementBlock::new(statements).to_string()
}
