//! Typed property values, value types, valid ranges, and coercion of client
//! input into typed values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single typed property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<serde_json::Value>),
}

impl PropertyValue {
    /// Numeric view; integers widen to floats.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
            Self::List(v) => write!(f, "{}", serde_json::Value::Array(v.clone())),
        }
    }
}

/// Declared type of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Bool,
    Integer,
    Float,
    String,
    /// A string restricted to the listed variants.
    Enum(&'static [&'static str]),
    /// A JSON array; never writable.
    List,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("a boolean"),
            Self::Integer => f.write_str("an integer"),
            Self::Float => f.write_str("a number"),
            Self::String => f.write_str("a string"),
            Self::Enum(variants) => write!(f, "one of [{}]", variants.join(", ")),
            Self::List => f.write_str("a read-only list"),
        }
    }
}

/// Inclusive numeric bounds for a property.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueRange {
    Integer { min: i64, max: i64 },
    Float { min: f64, max: f64 },
}

impl ValueRange {
    /// Whether `value` lies inside the bounds. Non-numeric values never do.
    #[must_use]
    pub fn contains(&self, value: &PropertyValue) -> bool {
        match *self {
            Self::Integer { min, max } => value.as_i64().is_some_and(|v| (min..=max).contains(&v)),
            Self::Float { min, max } => value.as_f64().is_some_and(|v| (min..=max).contains(&v)),
        }
    }
}

impl fmt::Display for ValueRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer { min, max } => write!(f, "[{min}, {max}]"),
            Self::Float { min, max } => write!(f, "[{min}, {max}]"),
        }
    }
}

/// A client-supplied value before coercion to a [`ValueType`].
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// Raw request body text, e.g. `75.5`, `"3"`, or `true`.
    Text(String),
    /// A JSON argument, e.g. from a wrapper-function call.
    Json(serde_json::Value),
    /// An already-typed value produced inside the core.
    Typed(PropertyValue),
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(v) => f.write_str(v),
            Self::Json(v) => write!(f, "{v}"),
            Self::Typed(v) => write!(f, "{v}"),
        }
    }
}

impl ValueType {
    /// The zero value of this type.
    #[must_use]
    pub fn zero(self) -> PropertyValue {
        match self {
            Self::Bool => PropertyValue::Bool(false),
            Self::Integer => PropertyValue::Int(0),
            Self::Float => PropertyValue::Float(0.0),
            Self::String | Self::Enum(_) => PropertyValue::String(String::new()),
            Self::List => PropertyValue::List(Vec::new()),
        }
    }

    /// Whether `value` is a value of this type.
    #[must_use]
    pub fn admits(self, value: &PropertyValue) -> bool {
        match (self, value) {
            (Self::Bool, PropertyValue::Bool(_))
            | (Self::Integer, PropertyValue::Int(_))
            | (Self::Float, PropertyValue::Float(_))
            | (Self::String, PropertyValue::String(_))
            | (Self::List, PropertyValue::List(_)) => true,
            (Self::Enum(variants), PropertyValue::String(v)) => variants.contains(&v.as_str()),
            _ => false,
        }
    }

    /// Coerce `input` to this type, or `None` if it cannot be represented.
    #[must_use]
    pub fn coerce(self, input: &Input) -> Option<PropertyValue> {
        match input {
            Input::Text(text) => self.coerce_text(text),
            Input::Json(json) => self.coerce_json(json),
            Input::Typed(value) => self.coerce_typed(value),
        }
    }

    /// Body text has surrounding whitespace and one pair of double quotes
    /// stripped before parsing.
    fn coerce_text(self, text: &str) -> Option<PropertyValue> {
        let trimmed = text.trim();
        let unquoted = trimmed
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .map_or(trimmed, str::trim);

        match self {
            Self::Bool => match unquoted.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Some(PropertyValue::Bool(true)),
                "false" | "0" | "no" => Some(PropertyValue::Bool(false)),
                _ => None,
            },
            Self::Integer => unquoted.parse().ok().map(PropertyValue::Int),
            Self::Float => unquoted
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(PropertyValue::Float),
            Self::String => Some(PropertyValue::String(unquoted.to_string())),
            Self::Enum(variants) => variants
                .contains(&unquoted)
                .then(|| PropertyValue::String(unquoted.to_string())),
            Self::List => None,
        }
    }

    fn coerce_json(self, json: &serde_json::Value) -> Option<PropertyValue> {
        use serde_json::Value;

        match (self, json) {
            (Self::List, _) => None,
            (_, Value::String(text)) => self.coerce_text(text),
            (Self::Bool, Value::Bool(v)) => Some(PropertyValue::Bool(*v)),
            (Self::Integer, Value::Number(n)) => n.as_i64().map(PropertyValue::Int),
            (Self::Float, Value::Number(n)) => n
                .as_f64()
                .filter(|v| v.is_finite())
                .map(PropertyValue::Float),
            _ => None,
        }
    }

    fn coerce_typed(self, value: &PropertyValue) -> Option<PropertyValue> {
        match (self, value) {
            (Self::Bool, PropertyValue::Bool(_))
            | (Self::Integer, PropertyValue::Int(_))
            | (Self::String, PropertyValue::String(_)) => Some(value.clone()),
            (Self::Float, PropertyValue::Int(_) | PropertyValue::Float(_)) => value
                .as_f64()
                .filter(|v| v.is_finite())
                .map(PropertyValue::Float),
            (Self::Enum(variants), PropertyValue::String(v)) => {
                variants.contains(&v.as_str()).then(|| value.clone())
            }
            _ => None,
        }
    }
}
