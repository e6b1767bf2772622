//! Error types for tree declaration and argument resolution.
//!
//! Declaration errors come from building flags and commands and indicate a
//! mistake in the program's own setup. Resolution errors come from user
//! input and are returned from [`resolve`](crate::resolve) for the host
//! program to report.

use thiserror::Error;

/// Errors raised while declaring flags and assembling the command tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclarationError {
    /// Long name is empty or contains whitespace/control characters, or the
    /// short name is not a single alphanumeric character.
    #[error("invalid flag name: `{0}`")]
    InvalidFlagName(String),

    /// Command name is empty or contains whitespace.
    #[error("invalid command name: `{0}`")]
    InvalidCommandName(String),

    /// Two flags in one flag set share a long or short name.
    #[error("duplicate flag: {0}")]
    DuplicateFlag(String),

    /// A declared default does not belong to the flag's value type.
    #[error("default for flag `{name}` is not a {expected}")]
    InvalidDefault { name: String, expected: String },

    /// Two sibling commands share a name or alias.
    #[error("duplicate command name: {0}")]
    DuplicateCommandName(String),
}

/// Errors raised while resolving arguments against a command tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The token names no flag visible to the matched command.
    #[error("unknown flag: {0}")]
    UnknownFlag(String),

    /// A value-taking flag was the last token or was followed by another flag.
    #[error("flag `{0}` requires a value")]
    MissingFlagValue(String),

    /// The value token could not be converted to the flag's type.
    #[error("invalid value `{token}` for flag `{name}`: expected {expected}")]
    InvalidFlagValue {
        name: String,
        token: String,
        expected: String,
    },

    /// A required flag ended resolution without a value.
    #[error("required flag `{0}` was not set")]
    MissingRequiredFlag(String),
}

/// Convenience alias for declaration results.
pub type Result<T> = std::result::Result<T, DeclarationError>;
