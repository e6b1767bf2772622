//! Command tree resolution and typed flag binding.
//!
//! This crate turns raw process arguments into a matched command, typed flag
//! values and leftover positional arguments, then runs the matched command's
//! action:
//!
//! - [`Flag`]: a declared option with long/short names, a [`ValueType`], an
//!   optional default, requiredness, inheritability and deprecation state.
//! - [`FlagSet`]: the name-unique, insertion-ordered flags of one command.
//! - [`Command`]: a tree node owning its children, flags and action;
//!   [`CommandRef`] navigates upward and computes inherited flags.
//! - [`resolve`]: matches the deepest command, binds flags visible to it
//!   and validates the result into a [`ParseResult`].
//! - [`TreeFile`]: declares a whole tree in YAML or JSON.
//!
//! Declaration mistakes surface as [`DeclarationError`] while the tree is
//! built; bad user input surfaces as [`ResolveError`] from resolution.
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use cmdtree_core::*;
//!
//! let ran = Rc::new(Cell::new(false));
//! let seen = Rc::clone(&ran);
//!
//! let mut remote = Command::new("remote").with_action(move |flags, args| {
//!     assert_eq!(flags.get::<String>("foo").as_deref(), Some("x"));
//!     assert_eq!(args, ["origin"]);
//!     seen.set(true);
//! });
//! remote.add_flag(Flag::with_default("foo", "-").build().unwrap()).unwrap();
//! remote.add_flag(Flag::typed("bar", ValueType::String).build().unwrap()).unwrap();
//!
//! let mut git = Command::new("git");
//! git.add_subcommand(remote).unwrap();
//!
//! let result = git.execute(&["remote", "--foo", "x", "origin"]).unwrap();
//! assert_eq!(result.command().name(), "remote");
//! assert!(ran.get());
//!
//! let err = git.resolve(&["remote", "--foo", "x", "-z"]).unwrap_err();
//! assert_eq!(err, ResolveError::UnknownFlag("z".into()));
//! ```

mod command;
mod declaration;
mod error;
mod flag;
mod flag_set;
mod resolve;
mod result;
mod value;

pub use command::{Action, Command, CommandRef, VisibleFlags};
pub use declaration::{
    CommandDeclaration, DeclaredType, FlagDeclaration, TreeFile, TreeFileError,
};
pub use error::{DeclarationError, ResolveError};
pub use flag::{Binding, Deprecation, Flag, FlagBuilder};
pub use flag_set::{FlagName, FlagSet};
pub use resolve::resolve;
pub use result::{BoundFlag, BoundFlags, DeprecationWarning, ParseResult, Resolution};
pub use value::{CustomType, FlagValue, FromFlagValue, Value, ValueType};
