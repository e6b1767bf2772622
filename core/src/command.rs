//! The command tree.
//!
//! Each [`Command`] owns its children and its own [`FlagSet`]. Upward
//! navigation goes through [`CommandRef`], a borrowed view that records the
//! chain of ancestors it was reached through; it is how parents, command
//! paths and inherited flags are computed. Because inheritance is computed
//! from the tree at lookup time, flags added to an ancestor after its
//! children were attached are still inherited.
//!
//! # Examples
//!
//! ```
//! use cmdtree_core::{Command, Flag, ValueType};
//!
//! let mut remote = Command::new("remote").with_description("Manage remotes");
//! remote.add_flag(Flag::typed("bar", ValueType::String).build().unwrap()).unwrap();
//!
//! let mut git = Command::new("git");
//! git.add_subcommand(remote).unwrap();
//! git.add_flag(Flag::with_default("verbose", false).short("v").build().unwrap()).unwrap();
//!
//! let remote = git.find(&["remote"]).unwrap();
//! assert_eq!(remote.path(), vec!["git", "remote"]);
//! assert_eq!(remote.parent().unwrap().name(), "git");
//!
//! let visible: Vec<&str> = remote.visible_flags().iter().map(|f| f.long_name()).collect();
//! assert_eq!(visible, vec!["bar", "verbose"]);
//! ```

use std::fmt;

use crate::error::{DeclarationError, Result, ResolveError};
use crate::flag::{Deprecation, Flag};
use crate::flag_set::{FlagName, FlagSet};
use crate::result::{BoundFlags, ParseResult};

/// Callback run when a command is the resolution target.
///
/// Receives the bound flags and the positional arguments.
pub type Action = Box<dyn Fn(&BoundFlags, &[String])>;

/// A node in the command tree.
pub struct Command {
    name: String,
    description: String,
    aliases: Vec<String>,
    deprecation: Deprecation,
    flags: FlagSet,
    children: Vec<Command>,
    action: Option<Action>,
}

impl Command {
    /// Creates a command with no flags, children or action.
    ///
    /// The name is validated when the command is attached to a parent, or
    /// explicitly with [`Command::check_names`] for a root.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            aliases: Vec::new(),
            deprecation: Deprecation::NotDeprecated,
            flags: FlagSet::new(),
            children: Vec::new(),
            action: None,
        }
    }

    /// Sets the action run when this command is matched.
    pub fn with_action(mut self, action: impl Fn(&BoundFlags, &[String]) + 'static) -> Self {
        self.action = Some(Box::new(action));
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Adds an alternative name matched like the primary name.
    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    /// Marks the command deprecated; matching it produces a warning.
    pub fn deprecated(mut self, message: &str) -> Self {
        self.deprecation = Deprecation::Deprecated(message.to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn deprecation(&self) -> &Deprecation {
        &self.deprecation
    }

    /// The flags declared directly on this command, in insertion order.
    pub fn flags(&self) -> &FlagSet {
        &self.flags
    }

    /// Child commands in insertion order.
    pub fn children(&self) -> &[Command] {
        &self.children
    }

    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    /// Returns `true` if `token` is this command's name or one of its aliases.
    pub fn answers_to(&self, token: &str) -> bool {
        self.name == token || self.aliases.iter().any(|alias| alias == token)
    }

    /// Finds a direct child by name or alias.
    pub fn find_child(&self, token: &str) -> Option<&Command> {
        self.children.iter().find(|child| child.answers_to(token))
    }

    /// Walks `path` (names or aliases) from this command downward.
    ///
    /// An empty path returns this command.
    pub fn find<'a>(&'a self, path: &[&str]) -> Option<CommandRef<'a>> {
        path.iter()
            .try_fold(CommandRef::new(self), |node, segment| node.child(segment))
    }

    /// Adds a flag to this command's own flag set.
    ///
    /// # Errors
    ///
    /// Returns [`DeclarationError::DuplicateFlag`] on a name collision within
    /// this command's flags.
    pub fn add_flag(&mut self, flag: Flag) -> Result<()> {
        self.flags.add(flag)
    }

    /// Adds several flags, stopping at the first collision.
    pub fn add_flags(&mut self, flags: impl IntoIterator<Item = Flag>) -> Result<()> {
        flags.into_iter().try_for_each(|flag| self.add_flag(flag))
    }

    /// Attaches a child command.
    ///
    /// # Errors
    ///
    /// - [`DeclarationError::InvalidCommandName`] if the child's name or an
    ///   alias is empty, contains whitespace, or starts with `-`.
    /// - [`DeclarationError::DuplicateCommandName`] if a sibling already
    ///   answers to the child's name or one of its aliases.
    pub fn add_subcommand(&mut self, child: Command) -> Result<()> {
        child.check_names()?;
        for name in std::iter::once(&child.name).chain(&child.aliases) {
            if self.find_child(name).is_some() {
                return Err(DeclarationError::DuplicateCommandName(name.clone()));
            }
        }
        self.children.push(child);
        Ok(())
    }

    /// Checks this command's name and aliases.
    ///
    /// # Errors
    ///
    /// Returns [`DeclarationError::InvalidCommandName`] for the first name
    /// that is empty, contains whitespace, or starts with `-`.
    pub fn check_names(&self) -> Result<()> {
        std::iter::once(&self.name)
            .chain(&self.aliases)
            .try_for_each(|name| check_command_name(name))
    }

    /// Attaches several children, stopping at the first error.
    pub fn add_subcommands(&mut self, children: impl IntoIterator<Item = Command>) -> Result<()> {
        children
            .into_iter()
            .try_for_each(|child| self.add_subcommand(child))
    }

    /// Resolves `args` against the tree rooted at this command.
    ///
    /// See [`resolve`](crate::resolve).
    pub fn resolve<S: AsRef<str>>(
        &self,
        args: &[S],
    ) -> std::result::Result<ParseResult<'_>, ResolveError> {
        crate::resolve::resolve(self, args)
    }

    /// Resolves `args` and runs the matched command's action.
    ///
    /// # Errors
    ///
    /// Returns the resolution error; no action runs in that case.
    pub fn execute<S: AsRef<str>>(
        &self,
        args: &[S],
    ) -> std::result::Result<ParseResult<'_>, ResolveError> {
        let result = self.resolve(args)?;
        result.dispatch();
        Ok(result)
    }

    pub(crate) fn action(&self) -> Option<&Action> {
        self.action.as_ref()
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("flags", &self.flags)
            .field("children", &self.children)
            .field("has_action", &self.action.is_some())
            .finish()
    }
}

fn check_command_name(name: &str) -> Result<()> {
    if name.is_empty() || name.starts_with('-') || name.chars().any(char::is_whitespace) {
        return Err(DeclarationError::InvalidCommandName(name.to_string()));
    }
    Ok(())
}

/// A command reached from the root, together with its ancestors.
#[derive(Clone)]
pub struct CommandRef<'a> {
    // Root first, this command last. Never empty.
    lineage: Vec<&'a Command>,
}

impl<'a> CommandRef<'a> {
    /// Views `root` as the top of a tree.
    pub fn new(root: &'a Command) -> Self {
        Self {
            lineage: vec![root],
        }
    }

    /// The command this view points at.
    pub fn command(&self) -> &'a Command {
        self.lineage[self.lineage.len() - 1]
    }

    pub fn name(&self) -> &'a str {
        self.command().name()
    }

    /// The parent view, or `None` at the root.
    pub fn parent(&self) -> Option<CommandRef<'a>> {
        if self.lineage.len() < 2 {
            return None;
        }
        Some(Self {
            lineage: self.lineage[..self.lineage.len() - 1].to_vec(),
        })
    }

    /// Ancestors from the parent up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = &'a Command> + '_ {
        self.lineage.iter().rev().skip(1).copied()
    }

    /// Command names from the root down to this command.
    pub fn path(&self) -> Vec<&'a str> {
        self.lineage.iter().map(|command| command.name()).collect()
    }

    pub fn is_root(&self) -> bool {
        self.lineage.len() == 1
    }

    /// Descends into the child answering to `token`.
    pub fn child(&self, token: &str) -> Option<CommandRef<'a>> {
        let child = self.command().find_child(token)?;
        let mut lineage = self.lineage.clone();
        lineage.push(child);
        Some(Self { lineage })
    }

    /// Flags usable at this command: its own flags, then the inheritable
    /// flags of each ancestor walking toward the root.
    ///
    /// A flag is skipped when a nearer one already claims its long or short
    /// name, so a command's own flag shadows an inherited one. Ancestors'
    /// non-inheritable flags are invisible and never collide.
    pub fn visible_flags(&self) -> VisibleFlags<'a> {
        let mut flags: Vec<&'a Flag> = self.command().flags().iter().collect();
        for ancestor in self.ancestors() {
            for flag in ancestor.flags().iter().filter(|f| f.is_inheritable()) {
                if !flags.iter().any(|seen| seen.collides_with(flag)) {
                    flags.push(flag);
                }
            }
        }
        VisibleFlags { flags }
    }
}

impl fmt::Debug for CommandRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CommandRef").field(&self.path().join(" ")).finish()
    }
}

impl PartialEq for CommandRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.lineage.len() == other.lineage.len()
            && self
                .lineage
                .iter()
                .zip(&other.lineage)
                .all(|(a, b)| std::ptr::eq(*a, *b))
    }
}

impl Eq for CommandRef<'_> {}

/// The flags visible at one command, nearest declaration first.
#[derive(Debug, Clone)]
pub struct VisibleFlags<'a> {
    flags: Vec<&'a Flag>,
}

impl<'a> VisibleFlags<'a> {
    pub fn lookup(&self, name: FlagName<'_>) -> Option<&'a Flag> {
        self.flags.iter().copied().find(|flag| match name {
            FlagName::Long(long) => flag.long_name() == long,
            FlagName::Short(short) => flag.short_name() == Some(short),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Flag> + '_ {
        self.flags.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueType;

    fn string_flag(long: &str, inheritable: bool) -> Flag {
        Flag::typed(long, ValueType::String)
            .inheritable(inheritable)
            .build()
            .unwrap()
    }

    fn sample_tree() -> Command {
        let mut add = Command::new("add");
        add.add_flag(string_flag("foo", false)).unwrap();

        let mut remote = Command::new("remote");
        remote.add_flag(string_flag("foo", true)).unwrap();
        remote.add_flag(string_flag("bar", false)).unwrap();
        remote.add_subcommand(add).unwrap();

        let mut root = Command::new("git");
        root.add_subcommand(remote).unwrap();
        root
    }

    #[test]
    fn test_duplicate_sibling_rejected() {
        let mut root = Command::new("git");
        root.add_subcommand(Command::new("remote")).unwrap();

        let err = root.add_subcommand(Command::new("remote")).unwrap_err();
        assert_eq!(err, DeclarationError::DuplicateCommandName("remote".to_string()));
        assert_eq!(root.children().len(), 1);
    }

    #[test]
    fn test_alias_collision_rejected() {
        let mut root = Command::new("git");
        root.add_subcommand(Command::new("remote").with_alias("r")).unwrap();

        let err = root
            .add_subcommand(Command::new("rebase").with_alias("r"))
            .unwrap_err();
        assert_eq!(err, DeclarationError::DuplicateCommandName("r".to_string()));
    }

    #[test]
    fn test_invalid_command_names() {
        let mut root = Command::new("git");
        for name in ["", "two words", "--flag"] {
            let err = root.add_subcommand(Command::new(name)).unwrap_err();
            assert_eq!(err, DeclarationError::InvalidCommandName(name.to_string()));
        }
    }

    #[test]
    fn test_check_names_covers_roots_and_aliases() {
        assert!(Command::new("git").with_alias("g").check_names().is_ok());
        for name in ["", "my tool"] {
            let err = Command::new(name).check_names().unwrap_err();
            assert_eq!(err, DeclarationError::InvalidCommandName(name.to_string()));
        }
        let err = Command::new("git").with_alias("-g").check_names().unwrap_err();
        assert_eq!(err, DeclarationError::InvalidCommandName("-g".to_string()));
    }

    #[test]
    fn test_same_name_under_different_parents() {
        let mut a = Command::new("a");
        a.add_subcommand(Command::new("list")).unwrap();
        let mut b = Command::new("b");
        b.add_subcommand(Command::new("list")).unwrap();

        let mut root = Command::new("tool");
        assert!(root.add_subcommands([a, b]).is_ok());
    }

    #[test]
    fn test_find_and_parent_links() {
        let root = sample_tree();

        let add = root.find(&["remote", "add"]).unwrap();
        assert_eq!(add.path(), vec!["git", "remote", "add"]);
        assert!(!add.is_root());

        let remote = add.parent().unwrap();
        assert_eq!(remote.name(), "remote");
        assert!(remote.parent().unwrap().parent().is_none());
        assert!(root.find(&[]).unwrap().is_root());
        assert!(root.find(&["remote", "missing"]).is_none());

        let names: Vec<&str> = add.ancestors().map(Command::name).collect();
        assert_eq!(names, vec!["remote", "git"]);
    }

    #[test]
    fn test_visible_flags_inherit_and_shadow() {
        let root = sample_tree();

        let remote = root.find(&["remote"]).unwrap();
        let names: Vec<&str> = remote.visible_flags().iter().map(Flag::long_name).collect();
        assert_eq!(names, vec!["foo", "bar"]);

        // `add` declares its own non-inheritable `foo`, which shadows the
        // inherited one; `bar` is not inheritable and stays invisible.
        let add = root.find(&["remote", "add"]).unwrap();
        let visible = add.visible_flags();
        assert_eq!(visible.len(), 1);
        let foo = visible.lookup(FlagName::Long("foo")).unwrap();
        let own = add.command().flags().iter().next().unwrap();
        assert!(std::ptr::eq(foo, own));
        assert!(!foo.is_inheritable());
        assert!(visible.lookup(FlagName::Long("bar")).is_none());
    }

    #[test]
    fn test_short_name_shadowing() {
        let mut child = Command::new("child");
        child
            .add_flag(Flag::typed("level", ValueType::Int).short("l").build().unwrap())
            .unwrap();

        let mut root = Command::new("root");
        root.add_flag(Flag::with_default("limit", 3i64).short("l").build().unwrap())
            .unwrap();
        root.add_subcommand(child).unwrap();

        let visible = root.find(&["child"]).unwrap().visible_flags();
        assert_eq!(visible.lookup(FlagName::Short('l')).unwrap().long_name(), "level");
        assert!(visible.lookup(FlagName::Long("limit")).is_none());
    }

    #[test]
    fn test_flags_added_after_children_are_inherited() {
        let mut root = Command::new("root");
        root.add_subcommand(Command::new("child")).unwrap();
        root.add_flag(Flag::with_default("color", true).build().unwrap())
            .unwrap();

        let visible = root.find(&["child"]).unwrap().visible_flags();
        assert!(visible.lookup(FlagName::Long("color")).is_some());
    }
}
