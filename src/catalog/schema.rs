use crate::script::Expr;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type tags carried by value sockets and block outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    String,
    Number,
    SerialConfig,
    #[serde(rename = "device_address")]
    DeviceAddress,
    Serial,
    #[serde(rename = "text")]
    Text,
}

impl TypeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::String => "String",
            TypeTag::Number => "Number",
            TypeTag::SerialConfig => "SerialConfig",
            TypeTag::DeviceAddress => "device_address",
            TypeTag::Serial => "Serial",
            TypeTag::Text => "text",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns `true` if a producer with `output` may plug into a socket with `check`.
///
/// `None` on either side accepts anything.
pub fn types_compatible(output: Option<&[TypeTag]>, check: Option<&[TypeTag]>) -> bool {
    match (output, check) {
        (Some(output), Some(check)) => output.iter().any(|tag| check.contains(tag)),
        _ => true,
    }
}

pub(crate) fn describe_tags(tags: Option<&[TypeTag]>) -> String {
    match tags {
        Some(tags) => tags.iter().join(", "),
        None => "any".to_string(),
    }
}

/// A typed value input on a block.
#[derive(Debug, Clone, PartialEq)]
pub struct Socket {
    pub name: String,
    /// Accepted type tags. `None` accepts any producer.
    pub check: Option<Vec<TypeTag>>,
    /// Substituted when nothing is connected.
    pub default: Expr,
}

impl Socket {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            check: None,
            default: Expr::Null,
        }
    }

    pub fn check(mut self, tags: &[TypeTag]) -> Self {
        self.check = Some(tags.to_vec());
        self
    }

    pub fn default(mut self, default: Expr) -> Self {
        self.default = default;
        self
    }

    pub fn accepts(&self, tag: TypeTag) -> bool {
        self.check.as_ref().is_none_or(|check| check.contains(&tag))
    }
}

/// A selectable entry of a dropdown field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DropdownOption {
    pub label: String,
    pub value: String,
}

impl DropdownOption {
    pub fn new(label: &str, value: &str) -> Self {
        Self {
            label: label.to_string(),
            value: value.to_string(),
        }
    }

    /// An option whose label and value are the same string.
    pub fn same(value: &str) -> Self {
        Self::new(value, value)
    }
}

/// The value held by a field of a block instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(t) => t.trim().parse().ok(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                write!(f, "{}", *n as i64)
            }
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(t) => f.write_str(t),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

/// The editor widget of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldWidget {
    /// A dropdown. A `dynamic` dropdown gets its options from a live feed at
    /// runtime, so any value is accepted when loading.
    Dropdown {
        options: Vec<DropdownOption>,
        dynamic: bool,
    },
    /// A numeric field with inclusive bounds; values are rounded to `precision`.
    Number {
        default: f64,
        min: f64,
        max: f64,
        precision: f64,
    },
    Text {
        default: String,
    },
}

impl FieldWidget {
    pub fn dropdown(options: &[(&str, &str)]) -> Self {
        FieldWidget::Dropdown {
            options: options
                .iter()
                .map(|(label, value)| DropdownOption::new(label, value))
                .collect(),
            dynamic: false,
        }
    }

    pub fn dynamic_dropdown(options: &[&str]) -> Self {
        FieldWidget::Dropdown {
            options: options.iter().map(|v| DropdownOption::same(v)).collect(),
            dynamic: true,
        }
    }

    pub fn default_value(&self) -> FieldValue {
        match self {
            FieldWidget::Dropdown { options, .. } => options
                .first()
                .map(|o| FieldValue::Text(o.value.clone()))
                .unwrap_or_else(|| FieldValue::Text(String::new())),
            FieldWidget::Number { default, .. } => FieldValue::Number(*default),
            FieldWidget::Text { default } => FieldValue::Text(default.clone()),
        }
    }

    /// Checks a new value against the widget, returning the value to store.
    ///
    /// `current_options` replaces the declared options of a dropdown whose list
    /// was refreshed on the instance.
    pub fn validate(
        &self,
        value: FieldValue,
        current_options: Option<&[DropdownOption]>,
    ) -> Result<FieldValue, String> {
        match self {
            FieldWidget::Dropdown { options, dynamic } => {
                let text = value.to_string();
                if *dynamic {
                    return Ok(FieldValue::Text(text));
                }
                let options = current_options.unwrap_or(options);
                if options.iter().any(|o| o.value == text) {
                    Ok(FieldValue::Text(text))
                } else {
                    Err(format!(
                        "'{}' is not one of [{}]",
                        text,
                        options.iter().map(|o| &o.value).join(", ")
                    ))
                }
            }
            FieldWidget::Number {
                min,
                max,
                precision,
                ..
            } => {
                let n = value
                    .as_number()
                    .filter(|n| n.is_finite())
                    .ok_or_else(|| format!("'{}' is not a number", value))?;
                let rounded = if *precision > 0.0 {
                    (n / precision).round() * precision
                } else {
                    n
                };
                Ok(FieldValue::Number(rounded.clamp(*min, *max)))
            }
            FieldWidget::Text { .. } => Ok(FieldValue::Text(value.to_string())),
        }
    }
}

/// A named field on a block.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub widget: FieldWidget,
}

/// One argument of a block's display template.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Value(Socket),
    Field(FieldSpec),
}

impl Input {
    pub fn name(&self) -> &str {
        match self {
            Input::Value(socket) => &socket.name,
            Input::Field(field) => &field.name,
        }
    }
}

/// How a block connects to its neighbours.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Plugs into a value socket. `None` output accepts any socket.
    Value { output: Option<Vec<TypeTag>> },
    /// Stacks in a statement chain.
    Statement { previous: bool, next: bool },
}

/// The static description of a block kind.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockSchema {
    pub kind: String,
    /// Display text with `%1`, `%2`, ... standing for the inputs in order.
    pub template: String,
    pub inputs: Vec<Input>,
    pub shape: Shape,
}

impl BlockSchema {
    pub fn value(kind: &str, template: &str, output: &[TypeTag]) -> Self {
        Self {
            kind: kind.to_string(),
            template: template.to_string(),
            inputs: Vec::new(),
            shape: Shape::Value {
                output: Some(output.to_vec()),
            },
        }
    }

    pub fn statement(kind: &str, template: &str) -> Self {
        Self {
            kind: kind.to_string(),
            template: template.to_string(),
            inputs: Vec::new(),
            shape: Shape::Statement {
                previous: true,
                next: true,
            },
        }
    }

    pub fn socket(mut self, socket: Socket) -> Self {
        self.inputs.push(Input::Value(socket));
        self
    }

    pub fn field(mut self, name: &str, widget: FieldWidget) -> Self {
        self.inputs.push(Input::Field(FieldSpec {
            name: name.to_string(),
            widget,
        }));
        self
    }

    pub fn sockets(&self) -> impl Iterator<Item = &Socket> {
        self.inputs.iter().filter_map(|input| match input {
            Input::Value(socket) => Some(socket),
            Input::Field(_) => None,
        })
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.inputs.iter().filter_map(|input| match input {
            Input::Field(field) => Some(field),
            Input::Value(_) => None,
        })
    }

    pub fn find_socket(&self, name: &str) -> Option<&Socket> {
        self.sockets().find(|s| s.name == name)
    }

    pub fn find_field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields().find(|f| f.name == name)
    }

    pub fn output(&self) -> Option<Option<&[TypeTag]>> {
        match &self.shape {
            Shape::Value { output } => Some(output.as_deref()),
            Shape::Statement { .. } => None,
        }
    }

    pub fn is_statement(&self) -> bool {
        matches!(self.shape, Shape::Statement { .. })
    }

    pub fn has_previous(&self) -> bool {
        matches!(self.shape, Shape::Statement { previous: true, .. })
    }

    pub fn has_next(&self) -> bool {
        matches!(self.shape, Shape::Statement { next: true, .. })
    }

    /// Number of `%N` placeholders in the template.
    pub fn placeholder_count(&self) -> usize {
        let bytes = self.template.as_bytes();
        bytes
            .iter()
            .enumerate()
            .filter(|(i, b)| {
                **b == b'%' && bytes.get(i + 1).is_some_and(|next| next.is_ascii_digit())
            })
            .count()
    }
}
