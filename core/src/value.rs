//! Flag value types and the string-token conversion contract.
//!
//! Every flag carries a [`ValueType`] that knows how to turn a raw argument
//! token into a [`Value`], and every [`Value`] can be rendered back into the
//! token it came from. The built-in types are booleans, integers and strings;
//! additional types are registered by building a [`CustomType`] with its own
//! parse function.
//!
//! Rust types participate through two traits: [`FlagValue`] declares
//! defaults and [`FromFlagValue`] reads bound values back out.
//!
//! # Examples
//!
//! ```
//! use cmdtree_core::{Value, ValueType};
//!
//! let port = ValueType::Int.parse("8080").unwrap();
//! assert_eq!(port, Value::Int(8080));
//! assert_eq!(port.render(), "8080");
//!
//! assert!(ValueType::Bool.parse("maybe").is_err());
//! ```

use std::fmt;

use serde::{Serialize, Serializer};

/// A user-registered value type.
///
/// The parse function validates a raw token and returns its canonical
/// rendering, or a reason the token was rejected. Two custom types are the
/// same type when their names are equal.
///
/// # Examples
///
/// ```
/// use cmdtree_core::{CustomType, Value, ValueType};
///
/// fn parse_level(token: &str) -> Result<String, String> {
///     match token {
///         "low" | "high" => Ok(token.to_string()),
///         other => Err(format!("unknown level {other}")),
///     }
/// }
///
/// let level = ValueType::Custom(CustomType::new("level", parse_level));
/// let value = level.parse("high").unwrap();
/// assert_eq!(value.render(), "high");
/// assert!(matches!(value, Value::Custom { .. }));
/// ```
#[derive(Clone, Copy)]
pub struct CustomType {
    name: &'static str,
    parse: fn(&str) -> Result<String, String>,
}

impl CustomType {
    /// Registers a custom type under `name`.
    pub const fn new(name: &'static str, parse: fn(&str) -> Result<String, String>) -> Self {
        Self { name, parse }
    }

    /// Returns the type name used in error messages.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for CustomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomType").field("name", &self.name).finish()
    }
}

impl PartialEq for CustomType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for CustomType {}

/// Type descriptor for a flag's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// `true` / `false`. Boolean flags take no following token.
    Bool,
    /// Signed 64-bit integer.
    Int,
    /// Any string, taken verbatim.
    String,
    /// A registered custom type.
    Custom(CustomType),
}

impl ValueType {
    /// Converts a raw token into a value of this type.
    ///
    /// # Errors
    ///
    /// Returns the parser's rejection reason when the token is not a valid
    /// rendering of this type.
    pub fn parse(&self, token: &str) -> Result<Value, String> {
        match self {
            Self::Bool => parse_bool(token).map(Value::Bool),
            Self::Int => token
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|err| err.to_string()),
            Self::String => Ok(Value::Str(token.to_string())),
            Self::Custom(custom) => (custom.parse)(token).map(|raw| Value::Custom {
                type_name: custom.name,
                raw,
            }),
        }
    }

    /// Returns the human-readable type name (`bool`, `int`, `string`, or the
    /// custom type's name).
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::String => "string",
            Self::Custom(custom) => custom.name,
        }
    }

    /// Returns `true` for [`ValueType::Bool`].
    pub fn is_bool(&self) -> bool {
        matches!(self, Self::Bool)
    }

    /// Returns `true` if `value` is an instance of this type.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Bool, Value::Bool(_))
            | (Self::Int, Value::Int(_))
            | (Self::String, Value::Str(_)) => true,
            (Self::Custom(custom), Value::Custom { type_name, .. }) => custom.name == *type_name,
            _ => false,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn parse_bool(token: &str) -> Result<bool, String> {
    match token.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(format!("`{token}` is not a boolean")),
    }
}

/// A typed flag value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Str(String),
    /// Canonical rendering of a custom-typed value.
    Custom {
        type_name: &'static str,
        raw: String,
    },
}

impl Value {
    /// Renders the value as the token that would parse back into it.
    pub fn render(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Str(s) => s.clone(),
            Self::Custom { raw, .. } => raw.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Str(s) => serializer.serialize_str(s),
            Self::Custom { raw, .. } => serializer.serialize_str(raw),
        }
    }
}

/// Rust types that can be declared as flag defaults.
///
/// Implemented for `bool`, `i64`, `String` and `&str`. User types implement
/// it by pairing a [`CustomType`] with a conversion into [`Value::Custom`].
pub trait FlagValue: Sized {
    /// The descriptor for flags holding this type.
    fn value_type() -> ValueType;

    /// Wraps `self` as a [`Value`].
    fn into_value(self) -> Value;
}

/// Flag value types that can be read back out of a bound [`Value`].
///
/// Implemented for the owned types only; borrowed strings are read with
/// [`BoundFlags::get_str`](crate::BoundFlags::get_str).
pub trait FromFlagValue: FlagValue {
    /// Extracts `Self` from a value of the matching type.
    fn from_value(value: &Value) -> Option<Self>;
}

impl FlagValue for bool {
    fn value_type() -> ValueType {
        ValueType::Bool
    }

    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl FromFlagValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FlagValue for i64 {
    fn value_type() -> ValueType {
        ValueType::Int
    }

    fn into_value(self) -> Value {
        Value::Int(self)
    }
}

impl FromFlagValue for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl FlagValue for String {
    fn value_type() -> ValueType {
        ValueType::String
    }

    fn into_value(self) -> Value {
        Value::Str(self)
    }
}

impl FromFlagValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Str(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FlagValue for &str {
    fn value_type() -> ValueType {
        ValueType::String
    }

    fn into_value(self) -> Value {
        Value::Str(self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_color(token: &str) -> Result<String, String> {
        match token {
            "red" | "green" | "blue" => Ok(token.to_string()),
            _ => Err(format!("`{token}` is not a color")),
        }
    }

    #[test]
    fn test_bool_parsing() {
        assert_eq!(ValueType::Bool.parse("true"), Ok(Value::Bool(true)));
        assert_eq!(ValueType::Bool.parse("FALSE"), Ok(Value::Bool(false)));
        assert_eq!(ValueType::Bool.parse("1"), Ok(Value::Bool(true)));
        assert!(ValueType::Bool.parse("on").is_err());
    }

    #[test]
    fn test_int_parsing() {
        assert_eq!(ValueType::Int.parse("-42"), Ok(Value::Int(-42)));
        assert!(ValueType::Int.parse("4x").is_err());
        assert!(ValueType::Int.parse("").is_err());
    }

    #[test]
    fn test_string_is_verbatim() {
        assert_eq!(
            ValueType::String.parse(" spaced "),
            Ok(Value::Str(" spaced ".to_string()))
        );
    }

    #[test]
    fn test_custom_type() {
        let color = ValueType::Custom(CustomType::new("color", parse_color));
        let value = color.parse("green").unwrap();

        assert!(color.accepts(&value));
        assert!(!ValueType::String.accepts(&value));
        assert_eq!(value.render(), "green");
        assert_eq!(color.to_string(), "color");
        assert_eq!(color.parse("pink"), Err("`pink` is not a color".to_string()));
    }

    #[test]
    fn test_render_parses_back() {
        for (ty, token) in [
            (ValueType::Bool, "false"),
            (ValueType::Int, "7"),
            (ValueType::String, "origin"),
        ] {
            let value = ty.parse(token).unwrap();
            assert_eq!(ty.parse(&value.render()), Ok(value));
        }
    }

    #[test]
    fn test_flag_value_conversions() {
        assert_eq!(i64::from_value(&Value::Int(3)), Some(3));
        assert_eq!(bool::from_value(&Value::Int(3)), None);
        assert_eq!("x".into_value(), Value::Str("x".to_string()));
        assert_eq!(<&str>::value_type(), ValueType::String);
    }

    #[test]
    fn test_value_serializes_untagged() {
        let json = serde_json::to_string(&vec![
            Value::Bool(true),
            Value::Int(2),
            Value::Str("a".to_string()),
        ])
        .unwrap();
        assert_eq!(json, r#"[true,2,"a"]"#);
    }
}
