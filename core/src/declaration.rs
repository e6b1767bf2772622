//! Declarative command trees loaded from YAML or JSON.
//!
//! A tree file describes the root command, its flags and its subcommands.
//! Defaults are written as string tokens and converted with the declared
//! type's parser, exactly as if they had been typed on the command line.
//!
//! # Example YAML
//!
//! ```yaml
//! name: git
//! flags:
//!   - long: verbose
//!     short: v
//!     type: bool
//!     default: "false"
//! subcommands:
//!   - name: remote
//!     aliases: [rem]
//!     flags:
//!       - long: foo
//!         type: string
//!         default: "-"
//!       - long: bar
//!         type: string
//!         inheritable: false
//! ```

use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::command::Command;
use crate::error::DeclarationError;
use crate::flag::Flag;
use crate::value::ValueType;

/// Errors raised while loading or building a tree file.
#[derive(Debug, Error)]
pub enum TreeFileError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A declared default does not parse as the flag's type.
    #[error("invalid default `{token}` for flag `{flag}`: {reason}")]
    InvalidDefault {
        flag: String,
        token: String,
        reason: String,
    },

    /// The declared tree is malformed.
    #[error(transparent)]
    Declaration(#[from] DeclarationError),
}

/// Convenience alias for results with [`TreeFileError`].
pub type Result<T> = std::result::Result<T, TreeFileError>;

/// Flag value types that can be named in a tree file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclaredType {
    Bool,
    Int,
    String,
}

impl From<DeclaredType> for ValueType {
    fn from(declared: DeclaredType) -> Self {
        match declared {
            DeclaredType::Bool => Self::Bool,
            DeclaredType::Int => Self::Int,
            DeclaredType::String => Self::String,
        }
    }
}

/// One flag in a tree file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagDeclaration {
    pub long: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<String>,
    #[serde(rename = "type")]
    pub value_type: DeclaredType,
    /// Default as a command-line token (e.g. `"8080"`, `"true"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Falls back to `true` with a default, `false` without.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Falls back to `true` with a default, `false` without.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inheritable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Deprecation message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<String>,
}

impl FlagDeclaration {
    /// Builds the flag, parsing the default with the declared type.
    pub fn build(&self) -> Result<Flag> {
        let value_type = ValueType::from(self.value_type);
        let mut builder = match &self.default {
            Some(token) => {
                let value = value_type
                    .parse(token)
                    .map_err(|reason| TreeFileError::InvalidDefault {
                        flag: self.long.clone(),
                        token: token.clone(),
                        reason,
                    })?;
                Flag::with_value(&self.long, value_type, value)
            }
            None => Flag::typed(&self.long, value_type),
        };

        if let Some(short) = &self.short {
            builder = builder.short(short);
        }
        if let Some(required) = self.required {
            builder = builder.required(required);
        }
        if let Some(inheritable) = self.inheritable {
            builder = builder.inheritable(inheritable);
        }
        if let Some(description) = &self.description {
            builder = builder.description(description);
        }
        if let Some(message) = &self.deprecated {
            builder = builder.deprecated(message);
        }

        Ok(builder.build()?)
    }
}

/// One command in a tree file, with its subtree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDeclaration {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<FlagDeclaration>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subcommands: Vec<CommandDeclaration>,
}

impl CommandDeclaration {
    /// Builds this command and its subtree. `decorate` runs on every command
    /// before its children are attached, with the command's path from the
    /// root, and is where callers attach actions.
    ///
    /// Subcommand names are checked as they are attached; this command's own
    /// names are checked here since it has no parent.
    pub fn build_with<F>(&self, decorate: &mut F) -> Result<Command>
    where
        F: FnMut(&[String], Command) -> Command,
    {
        let mut path = Vec::new();
        let root = self.build_at(&mut path, decorate)?;
        root.check_names()?;
        Ok(root)
    }

    fn build_at<F>(&self, path: &mut Vec<String>, decorate: &mut F) -> Result<Command>
    where
        F: FnMut(&[String], Command) -> Command,
    {
        path.push(self.name.clone());

        let mut command = Command::new(&self.name);
        if let Some(description) = &self.description {
            command = command.with_description(description);
        }
        for alias in &self.aliases {
            command = command.with_alias(alias);
        }
        if let Some(message) = &self.deprecated {
            command = command.deprecated(message);
        }
        for flag in &self.flags {
            command.add_flag(flag.build()?)?;
        }
        command = decorate(path.as_slice(), command);

        for sub in &self.subcommands {
            let child = sub.build_at(path, decorate)?;
            command.add_subcommand(child)?;
        }

        path.pop();
        Ok(command)
    }
}

/// A command tree read from disk.
///
/// # Examples
///
/// ```
/// use cmdtree_core::TreeFile;
///
/// let tree = TreeFile::from_yaml_str(
///     "name: app\nsubcommands:\n  - name: serve\n    flags:\n      - {long: port, type: int, default: \"80\"}\n",
/// )
/// .unwrap();
/// let root = tree.build().unwrap();
///
/// let result = root.resolve(&["serve", "--port", "8080"]).unwrap();
/// assert_eq!(result.flags().get::<i64>("port"), Some(8080));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreeFile {
    pub root: CommandDeclaration,
}

impl TreeFile {
    /// Loads a tree file; `.json` files are read as JSON, anything else as
    /// YAML.
    ///
    /// # Errors
    ///
    /// Returns [`TreeFileError::Io`] if the file cannot be read, or the
    /// matching parse error.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(std::fs::File::open(path)?);
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let root = if is_json {
            serde_json::from_reader(reader)?
        } else {
            serde_yaml::from_reader(reader)?
        };
        Ok(Self { root })
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(Self {
            root: serde_yaml::from_str(text)?,
        })
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(Self {
            root: serde_json::from_str(text)?,
        })
    }

    /// Builds the command tree without actions.
    pub fn build(&self) -> Result<Command> {
        self.root
            .build_with(&mut |_: &[String], command: Command| command)
    }

    /// Builds the command tree, letting `decorate` attach actions.
    pub fn build_with<F>(&self, mut decorate: F) -> Result<Command>
    where
        F: FnMut(&[String], Command) -> Command,
    {
        self.root.build_with(&mut decorate)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::flag::Binding;

    const GIT: &str = r#"
name: git
flags:
  - long: verbose
    short: v
    type: bool
    default: "false"
subcommands:
  - name: remote
    aliases: [rem]
    flags:
      - long: foo
        type: string
        default: "-"
      - long: bar
        type: string
        inheritable: false
      - long: old
        type: bool
        deprecated: use --new
    subcommands:
      - name: add
"#;

    #[test]
    fn test_yaml_tree_builds_and_resolves() {
        let root = TreeFile::from_yaml_str(GIT).unwrap().build().unwrap();

        let result = root.resolve(&["rem", "add", "--foo", "x", "-v"]).unwrap();
        assert_eq!(result.command_ref().path(), vec!["git", "remote", "add"]);
        assert_eq!(result.flags().get::<String>("foo").as_deref(), Some("x"));
        assert_eq!(result.flags().binding("verbose"), Binding::BoundFromArgument);
        assert!(!result.flags().contains("bar"));
    }

    #[test]
    fn test_default_path_is_required_and_inheritable() {
        let tree = TreeFile::from_yaml_str(GIT).unwrap();
        let foo = tree.root.subcommands[0].flags[0].build().unwrap();
        assert!(foo.is_required());
        assert!(foo.is_inheritable());

        let bar = tree.root.subcommands[0].flags[1].build().unwrap();
        assert!(!bar.is_required());
        assert!(!bar.is_inheritable());
    }

    #[test]
    fn test_deprecated_flag_declared() {
        let root = TreeFile::from_yaml_str(GIT).unwrap().build().unwrap();
        let result = root.resolve(&["remote", "--old"]).unwrap();
        assert_eq!(result.warnings().len(), 1);
        assert_eq!(result.warnings()[0].message, "use --new");
    }

    #[test]
    fn test_invalid_default_reported() {
        let err = TreeFile::from_yaml_str(
            "name: app\nflags:\n  - {long: port, type: int, default: eighty}\n",
        )
        .unwrap()
        .build()
        .unwrap_err();
        assert!(matches!(err, TreeFileError::InvalidDefault { ref flag, .. } if flag == "port"));
    }

    #[test]
    fn test_duplicate_subcommand_reported() {
        let err = TreeFile::from_json_str(
            r#"{"name": "app", "subcommands": [{"name": "run"}, {"name": "run"}]}"#,
        )
        .unwrap()
        .build()
        .unwrap_err();
        assert!(matches!(
            err,
            TreeFileError::Declaration(DeclarationError::DuplicateCommandName(ref name)) if name == "run"
        ));
    }

    #[test]
    fn test_invalid_root_name_reported() {
        for name in ["\"\"", "\"my tool\"", "\"-app\""] {
            let err = TreeFile::from_yaml_str(&format!("name: {name}"))
                .unwrap()
                .build()
                .unwrap_err();
            assert!(
                matches!(err, TreeFileError::Declaration(DeclarationError::InvalidCommandName(_))),
                "{name}: {err}"
            );
        }
    }

    #[test]
    fn test_unknown_type_rejected() {
        let err = TreeFile::from_yaml_str("name: app\nflags:\n  - {long: x, type: float}\n")
            .unwrap_err();
        assert!(matches!(err, TreeFileError::Yaml(_)));
    }

    #[test]
    fn test_decorate_sees_paths() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        TreeFile::from_yaml_str(GIT)
            .unwrap()
            .build_with(move |path: &[String], command: Command| {
                sink.borrow_mut().push(path.join(" "));
                command
            })
            .unwrap();

        assert_eq!(*seen.borrow(), vec!["git", "git remote", "git remote add"]);
    }
}
