//! Resolution output.

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::command::{Command, CommandRef};
use crate::flag::Binding;
use crate::value::{FromFlagValue, Value};

/// A flag value together with how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundFlag {
    pub value: Value,
    pub binding: Binding,
}

/// Flag values bound by one resolution, keyed by long name.
///
/// Only flags that ended up with a value appear here; a visible flag that
/// was neither supplied nor defaulted reports [`Binding::Unbound`].
///
/// # Examples
///
/// ```
/// use cmdtree_core::{Binding, Command, Flag, ValueType};
///
/// let mut root = Command::new("app");
/// root.add_flag(Flag::with_default("jobs", 4i64).build().unwrap()).unwrap();
/// root.add_flag(Flag::typed("name", ValueType::String).build().unwrap()).unwrap();
///
/// let result = root.resolve(&["--name", "demo"]).unwrap();
/// let flags = result.flags();
/// assert_eq!(flags.get::<i64>("jobs"), Some(4));
/// assert_eq!(flags.get::<String>("name").as_deref(), Some("demo"));
/// assert_eq!(flags.binding("jobs"), Binding::BoundFromDefault);
/// assert_eq!(flags.binding("name"), Binding::BoundFromArgument);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundFlags {
    values: BTreeMap<String, BoundFlag>,
}

impl BoundFlags {
    /// Reads a flag's value as `T`; `None` if unbound or of another type.
    ///
    /// Only owned types can be read this way:
    ///
    /// ```compile_fail
    /// # use cmdtree_core::BoundFlags;
    /// let flags = BoundFlags::default();
    /// let _ = flags.get::<&str>("name");
    /// ```
    pub fn get<T: FromFlagValue>(&self, name: &str) -> Option<T> {
        self.value(name).and_then(T::from_value)
    }

    /// Borrows a string flag's value; `None` if unbound or not a string.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.value(name)? {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name).map(|bound| &bound.value)
    }

    pub fn binding(&self, name: &str) -> Binding {
        self.values
            .get(name)
            .map_or(Binding::Unbound, |bound| bound.binding)
    }

    /// Returns `true` if the flag was supplied in the arguments.
    pub fn was_set(&self, name: &str) -> bool {
        self.binding(name) == Binding::BoundFromArgument
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Iterates bound flags in long-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BoundFlag)> {
        self.values.iter().map(|(name, bound)| (name.as_str(), bound))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn bind(&mut self, name: &str, value: Value, binding: Binding) {
        self.values
            .insert(name.to_string(), BoundFlag { value, binding });
    }
}

impl Serialize for BoundFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, bound) in &self.values {
            map.serialize_entry(name, &bound.value)?;
        }
        map.end()
    }
}

/// A non-fatal notice produced while resolving, such as use of a deprecated
/// flag or command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeprecationWarning {
    /// `--flag` for flags, the space-joined command path for commands.
    pub target: String,
    pub message: String,
}

/// The outcome of a successful resolution.
///
/// Two results are equal when they matched the same command node and bound
/// the same flags, positional arguments and warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult<'a> {
    pub(crate) command: CommandRef<'a>,
    pub(crate) flags: BoundFlags,
    pub(crate) positional: Vec<String>,
    pub(crate) warnings: Vec<DeprecationWarning>,
}

impl<'a> ParseResult<'a> {
    /// The deepest command matched by the arguments.
    pub fn command(&self) -> &'a Command {
        self.command.command()
    }

    /// The matched command with its ancestors.
    pub fn command_ref(&self) -> &CommandRef<'a> {
        &self.command
    }

    pub fn flags(&self) -> &BoundFlags {
        &self.flags
    }

    pub fn positional(&self) -> &[String] {
        &self.positional
    }

    pub fn warnings(&self) -> &[DeprecationWarning] {
        &self.warnings
    }

    /// Runs the matched command's action once.
    ///
    /// Returns `false` if the command has no action.
    pub fn dispatch(&self) -> bool {
        match self.command().action() {
            Some(action) => {
                action(&self.flags, &self.positional);
                true
            }
            None => false,
        }
    }

    /// An owned, serializable copy of this result.
    pub fn summary(&self) -> Resolution {
        Resolution {
            command: self.command.path().into_iter().map(String::from).collect(),
            flags: self.flags.clone(),
            explicit: self
                .flags
                .iter()
                .filter(|(_, bound)| bound.binding == Binding::BoundFromArgument)
                .map(|(name, _)| name.to_string())
                .collect(),
            positional: self.positional.clone(),
            warnings: self.warnings.clone(),
        }
    }
}

/// Serializable form of a [`ParseResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Command path from the root.
    pub command: Vec<String>,
    pub flags: BoundFlags,
    /// Long names of flags supplied in the arguments.
    pub explicit: Vec<String>,
    pub positional: Vec<String>,
    pub warnings: Vec<DeprecationWarning>,
}
