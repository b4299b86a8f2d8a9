use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Binding strength of an expression, tightest first.
///
/// When an expression is embedded in another, the embedding position states the
/// order it requires. An expression that binds no tighter than that is wrapped in
/// parentheses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Order {
    Atomic,
    Collection,
    StringConversion,
    Member,
    FunctionCall,
    Exponentiation,
    Unary,
    Multiplicative,
    Additive,
    BitwiseShift,
    BitwiseAnd,
    BitwiseXor,
    BitwiseOr,
    Relational,
    LogicalNot,
    LogicalAnd,
    LogicalOr,
    Conditional,
    Lambda,
    None,
}

impl Order {
    /// Returns `true` if an expression of this order must be parenthesized when
    /// placed in a position that requires `outer`.
    pub fn needs_parens_in(self, outer: Order) -> bool {
        if outer > self {
            return false;
        }
        // Attribute access and calls chain left to right: `a.b().c`.
        if self.is_postfix() && outer.is_postfix() {
            return false;
        }
        // Two atoms or two unconstrained positions never need wrapping.
        !(outer == self && matches!(outer, Order::Atomic | Order::None))
    }

    fn is_postfix(self) -> bool {
        matches!(self, Order::Member | Order::FunctionCall)
    }
}

/// Quote character used when rendering a string literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quote {
    Single,
    Double,
}

impl Quote {
    fn as_char(self) -> char {
        match self {
            Quote::Single => '\'',
            Quote::Double => '"',
        }
    }
}

/// An expression in the generated script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    // Literals
    Str { value: String, quote: Quote },
    Number(f64),
    Null,
    /// An f-string whose template is written by an emitter, never by a user.
    Format(String),
    Dict(Vec<(String, Expr)>),

    // Names and access
    Name(String),
    Attr { target: Box<Expr>, name: String },
    Call { callee: Box<Expr>, args: Vec<Expr> },

    // Operators
    Not(Box<Expr>),

    /// Pre-rendered code with an explicit order, for emitters outside the standard catalog.
    Raw { code: String, order: Order },
}

impl Expr {
    /// A double-quoted string literal.
    pub fn str(value: impl Into<String>) -> Self {
        Expr::Str {
            value: value.into(),
            quote: Quote::Double,
        }
    }

    /// A single-quoted string literal.
    pub fn single(value: impl Into<String>) -> Self {
        Expr::Str {
            value: value.into(),
            quote: Quote::Single,
        }
    }

    pub fn number(value: f64) -> Self {
        Expr::Number(value)
    }

    /// A dotted name such as `serial_controller.is_connected`, split into attribute accesses.
    pub fn path(dotted: &str) -> Self {
        let mut parts = dotted.split('.');
        let head = Expr::Name(parts.next().unwrap_or_default().to_string());
        parts.fold(head, |target, name| target.attr(name))
    }

    /// Parses dropdown values such as `"9600"` or `"1.5"` into numbers, keeping
    /// anything non-numeric as a string literal.
    pub fn numeric_or_str(text: &str) -> Self {
        match text.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Expr::Number(n),
            _ => Expr::str(text),
        }
    }

    pub fn attr(self, name: &str) -> Self {
        Expr::Attr {
            target: Box::new(self),
            name: name.to_string(),
        }
    }

    pub fn call(self, args: Vec<Expr>) -> Self {
        Expr::Call {
            callee: Box::new(self),
            args,
        }
    }

    /// Shorthand for `self.name(args)`.
    pub fn method(self, name: &str, args: Vec<Expr>) -> Self {
        self.attr(name).call(args)
    }

    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }

    pub fn raw(code: impl Into<String>, order: Order) -> Self {
        Expr::Raw {
            code: code.into(),
            order,
        }
    }

    /// The binding strength of this expression when embedded elsewhere.
    pub fn order(&self) -> Order {
        match self {
            Expr::Str { .. }
            | Expr::Number(_)
            | Expr::Null
            | Expr::Format(_)
            | Expr::Dict(_)
            | Expr::Name(_) => Order::Atomic,
            Expr::Attr { .. } => Order::Member,
            Expr::Call { .. } => Order::FunctionCall,
            Expr::Not(_) => Order::LogicalNot,
            Expr::Raw { order, .. } => *order,
        }
    }

    /// Renders this expression for a position that requires `outer`.
    pub fn render_in(&self, outer: Order) -> String {
        if self.order().needs_parens_in(outer) {
            format!("({})", self)
        } else {
            self.to_string()
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Str { value, quote } => write_string_literal(f, value, *quote),
            Expr::Number(n) => write_number(f, *n),
            Expr::Null => write!(f, "None"),
            Expr::Format(template) => write!(f, "f\"{}\"", template.replace('"', "\\\"")),
            Expr::Dict(entries) => {
                if entries.is_empty() {
                    return write!(f, "{{}}");
                }
                let body = entries
                    .iter()
                    .map(|(key, value)| {
                        format!(
                            "    {}: {}",
                            Expr::single(key.as_str()),
                            value.render_in(Order::None)
                        )
                    })
                    .join(",\n");
                write!(f, "{{\n{}\n}}", body)
            }
            Expr::Name(name) => write!(f, "{}", name),
            Expr::Attr { target, name } => {
                write!(f, "{}.{}", target.render_in(Order::Member), name)
            }
            Expr::Call { callee, args } => write!(
                f,
                "{}({})",
                callee.render_in(Order::FunctionCall),
                args.iter().map(|arg| arg.render_in(Order::None)).join(", ")
            ),
            Expr::Not(operand) => write!(f, "not {}", operand.render_in(Order::LogicalNot)),
            Expr::Raw { code, .. } => write!(f, "{}", code),
        }
    }
}

fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.is_nan() {
        write!(f, "float('nan')")
    } else if n.is_infinite() {
        let sign = if n < 0.0 { "-" } else { "" };
        write!(f, "float('{}inf')", sign)
    } else if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        write!(f, "{}", n as i64)
    } else {
        write!(f, "{}", n)
    }
}

fn write_string_literal(f: &mut fmt::Formatter<'_>, value: &str, quote: Quote) -> fmt::Result {
    let q = quote.as_char();
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push(q);
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c if c == q => {
                escaped.push('\\');
                escaped.push(c);
            }
            c => escaped.push(c),
        }
    }
    escaped.push(q);
    f.write_str(&escaped)
}
