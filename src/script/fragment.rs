use super::{Expr, Order, Stmt, render_statements};
use serde::{Deserialize, Serialize};

/// What a single block emits: a value for a parent socket, or statements for a chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Fragment {
    Value(Expr),
    Statements(Vec<Stmt>),
}

impl Fragment {
    /// Renders the fragment to script text.
    pub fn render(&self) -> GeneratedFragment {
        match self {
            Fragment::Value(expr) => GeneratedFragment::Expression {
                code: expr.to_string(),
                order: expr.order(),
            },
            Fragment::Statements(statements) => {
                GeneratedFragment::Statements(render_statements(statements))
            }
        }
    }

    /// Turns the fragment into statements, wrapping a value as an expression statement.
    pub fn into_statements(self) -> Vec<Stmt> {
        match self {
            Fragment::Value(expr) => vec![Stmt::Expr(expr)],
            Fragment::Statements(statements) => statements,
        }
    }
}

/// A rendered fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedFragment {
    /// A standalone expression tagged with its order for later embedding.
    Expression { code: String, order: Order },
    /// Complete statement lines, each terminated by a line break.
    Statements(String),
}

impl GeneratedFragment {
    pub fn code(&self) -> &str {
        match self {
            GeneratedFragment::Expression { code, .. } => code,
            GeneratedFragment::Statements(code) => code,
        }
    }
}
