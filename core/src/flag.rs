//! Flag declarations.
//!
//! A [`Flag`] is one declared option: its long and optional short name, value
//! type, default, requiredness, inheritability, deprecation state and
//! description. Flags are created through one of two builders:
//!
//! - [`Flag::with_default`]: the flag carries a concrete default value. It is
//!   required (trivially satisfied by the default) and inheritable unless
//!   overridden.
//! - [`Flag::typed`]: the flag only declares a type. It is optional and not
//!   inheritable unless overridden, and starts unbound.
//!
//! Both builders validate names in [`FlagBuilder::build`], so an invalid
//! [`Flag`] can never be observed.
//!
//! # Examples
//!
//! ```
//! use cmdtree_core::{Flag, ValueType};
//!
//! let debug = Flag::with_default("debug", true)
//!     .short("d")
//!     .description("Print debug output")
//!     .build()
//!     .unwrap();
//! assert!(debug.is_required());
//! assert!(debug.is_inheritable());
//!
//! let port = Flag::typed("port", ValueType::Int).required(true).build().unwrap();
//! assert!(port.default_value().is_none());
//!
//! assert!(Flag::typed("dry run", ValueType::Bool).build().is_err());
//! ```

use std::hash::{Hash, Hasher};

use crate::error::{DeclarationError, Result};
use crate::value::{FlagValue, Value, ValueType};

/// Whether a flag is deprecated, and the message shown when it is used.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Deprecation {
    #[default]
    NotDeprecated,
    Deprecated(String),
}

impl Deprecation {
    /// Returns the deprecation message, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::NotDeprecated => None,
            Self::Deprecated(message) => Some(message),
        }
    }
}

/// How a flag obtained its value during one resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Binding {
    /// No default and not supplied.
    #[default]
    Unbound,
    /// Holds its declared default.
    BoundFromDefault,
    /// Supplied explicitly in the arguments.
    BoundFromArgument,
}

/// One declared command-line option.
///
/// Equality and hashing use the long name only.
#[derive(Debug, Clone)]
pub struct Flag {
    long_name: String,
    short_name: Option<char>,
    value_type: ValueType,
    default_value: Option<Value>,
    required: bool,
    inheritable: bool,
    deprecation: Deprecation,
    description: String,
}

impl Flag {
    /// Starts a flag with a concrete default value.
    pub fn with_default(long_name: &str, default: impl FlagValue) -> FlagBuilder {
        Self::with_value(long_name, default_type(&default), default.into_value())
    }

    /// Starts a flag with a default already expressed as a [`Value`].
    ///
    /// The value must belong to `value_type`; this is checked in
    /// [`FlagBuilder::build`].
    pub fn with_value(long_name: &str, value_type: ValueType, default: Value) -> FlagBuilder {
        FlagBuilder {
            long_name: long_name.to_string(),
            short_name: None,
            value_type,
            default_value: Some(default),
            required: true,
            inheritable: true,
            deprecation: Deprecation::NotDeprecated,
            description: String::new(),
        }
    }

    /// Starts a flag that declares only its type.
    pub fn typed(long_name: &str, value_type: ValueType) -> FlagBuilder {
        FlagBuilder {
            long_name: long_name.to_string(),
            short_name: None,
            value_type,
            default_value: None,
            required: false,
            inheritable: false,
            deprecation: Deprecation::NotDeprecated,
            description: String::new(),
        }
    }

    pub fn long_name(&self) -> &str {
        &self.long_name
    }

    pub fn short_name(&self) -> Option<char> {
        self.short_name
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_inheritable(&self) -> bool {
        self.inheritable
    }

    pub fn is_bool(&self) -> bool {
        self.value_type.is_bool()
    }

    pub fn deprecation(&self) -> &Deprecation {
        &self.deprecation
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns `true` if `other` shares this flag's long name or short name.
    pub fn collides_with(&self, other: &Flag) -> bool {
        self.long_name == other.long_name
            || (self.short_name.is_some() && self.short_name == other.short_name)
    }
}

impl PartialEq for Flag {
    fn eq(&self, other: &Self) -> bool {
        self.long_name == other.long_name
    }
}

impl Eq for Flag {}

impl Hash for Flag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.long_name.hash(state);
    }
}

// `FlagValue::value_type` is an associated function; this reads it off a
// value so `with_default` can take `impl FlagValue`.
fn default_type<T: FlagValue>(_value: &T) -> ValueType {
    T::value_type()
}

/// Builder returned by [`Flag::with_default`], [`Flag::with_value`] and
/// [`Flag::typed`].
#[derive(Debug, Clone)]
#[must_use]
pub struct FlagBuilder {
    long_name: String,
    short_name: Option<String>,
    value_type: ValueType,
    default_value: Option<Value>,
    required: bool,
    inheritable: bool,
    deprecation: Deprecation,
    description: String,
}

impl FlagBuilder {
    /// Sets the one-character short name (e.g. `"v"` for `-v`).
    pub fn short(mut self, short_name: &str) -> Self {
        self.short_name = Some(short_name.to_string());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn inheritable(mut self, inheritable: bool) -> Self {
        self.inheritable = inheritable;
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Marks the flag deprecated; `message` is reported whenever it is set.
    pub fn deprecated(mut self, message: &str) -> Self {
        self.deprecation = Deprecation::Deprecated(message.to_string());
        self
    }

    /// Validates the names and produces the flag.
    ///
    /// # Errors
    ///
    /// - [`DeclarationError::InvalidFlagName`] if the long name is empty or
    ///   contains whitespace or control characters, or the short name is not
    ///   exactly one alphanumeric character.
    /// - [`DeclarationError::InvalidDefault`] if the default does not belong
    ///   to the declared value type.
    pub fn build(self) -> Result<Flag> {
        check_long_name(&self.long_name)?;
        let short_name = self.short_name.as_deref().map(check_short_name).transpose()?;

        let default_matches = self
            .default_value
            .as_ref()
            .is_none_or(|default| self.value_type.accepts(default));
        if !default_matches {
            return Err(DeclarationError::InvalidDefault {
                name: self.long_name,
                expected: self.value_type.name().to_string(),
            });
        }

        Ok(Flag {
            long_name: self.long_name,
            short_name,
            value_type: self.value_type,
            default_value: self.default_value,
            required: self.required,
            inheritable: self.inheritable,
            deprecation: self.deprecation,
            description: self.description,
        })
    }
}

fn check_long_name(name: &str) -> Result<()> {
    let malformed = name.is_empty()
        || name.starts_with('-')
        || name.contains('=')
        || name.chars().any(|ch| ch.is_whitespace() || ch.is_control());
    if malformed {
        return Err(DeclarationError::InvalidFlagName(name.to_string()));
    }
    Ok(())
}

fn check_short_name(name: &str) -> Result<char> {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) if ch.is_alphanumeric() => Ok(ch),
        _ => Err(DeclarationError::InvalidFlagName(name.to_string())),
    }
}
