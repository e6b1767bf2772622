//! Name-unique, insertion-ordered flag collections.

use crate::error::{DeclarationError, Result};
use crate::flag::Flag;

/// A flag reference as written on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagName<'a> {
    /// `--name`
    Long(&'a str),
    /// `-n`
    Short(char),
}

/// The flags declared directly on one command.
///
/// Enumeration follows insertion order, which help renderers rely on.
///
/// # Examples
///
/// ```
/// use cmdtree_core::{Flag, FlagName, FlagSet, ValueType};
///
/// let mut flags = FlagSet::new();
/// flags.add(Flag::typed("verbose", ValueType::Bool).short("v").build().unwrap()).unwrap();
///
/// assert!(flags.lookup(FlagName::Short('v')).is_some());
/// assert!(flags.lookup(FlagName::Long("quiet")).is_none());
///
/// // Same long name in the same set is rejected.
/// let again = Flag::with_default("verbose", true).build().unwrap();
/// assert!(flags.add(again).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct FlagSet {
    flags: Vec<Flag>,
}

impl FlagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a flag.
    ///
    /// # Errors
    ///
    /// Returns [`DeclarationError::DuplicateFlag`] if a flag with the same
    /// long or short name is already present.
    pub fn add(&mut self, flag: Flag) -> Result<()> {
        if let Some(existing) = self.flags.iter().find(|f| f.collides_with(&flag)) {
            let name = if existing.long_name() == flag.long_name() {
                format!("--{}", flag.long_name())
            } else {
                format!("-{}", flag.short_name().unwrap_or_default())
            };
            return Err(DeclarationError::DuplicateFlag(name));
        }
        self.flags.push(flag);
        Ok(())
    }

    /// Finds a flag by long or short name.
    pub fn lookup(&self, name: FlagName<'_>) -> Option<&Flag> {
        match name {
            FlagName::Long(long) => self.flags.iter().find(|f| f.long_name() == long),
            FlagName::Short(short) => self.flags.iter().find(|f| f.short_name() == Some(short)),
        }
    }

    /// Iterates flags in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Flag> {
        self.flags.iter()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

impl<'a> IntoIterator for &'a FlagSet {
    type Item = &'a Flag;
    type IntoIter = std::slice::Iter<'a, Flag>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueType;

    fn flag(long: &str, short: Option<&str>) -> Flag {
        let builder = Flag::typed(long, ValueType::String);
        match short {
            Some(short) => builder.short(short),
            None => builder,
        }
        .build()
        .unwrap()
    }

    #[test]
    fn test_duplicate_long_name_rejected() {
        let mut set = FlagSet::new();
        set.add(flag("output", None)).unwrap();

        let err = set.add(flag("output", Some("o"))).unwrap_err();
        assert_eq!(err, DeclarationError::DuplicateFlag("--output".to_string()));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_duplicate_short_name_rejected() {
        let mut set = FlagSet::new();
        set.add(flag("output", Some("o"))).unwrap();

        let err = set.add(flag("origin", Some("o"))).unwrap_err();
        assert_eq!(err, DeclarationError::DuplicateFlag("-o".to_string()));
    }

    #[test]
    fn test_same_name_in_separate_sets() {
        let mut a = FlagSet::new();
        let mut b = FlagSet::new();
        assert!(a.add(flag("output", Some("o"))).is_ok());
        assert!(b.add(flag("output", Some("o"))).is_ok());
    }

    #[test]
    fn test_lookup_and_insertion_order() {
        let mut set = FlagSet::new();
        set.add(flag("zeta", Some("z"))).unwrap();
        set.add(flag("alpha", None)).unwrap();
        set.add(flag("mid", Some("m"))).unwrap();

        let names: Vec<&str> = set.iter().map(Flag::long_name).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);

        assert_eq!(set.lookup(FlagName::Short('m')).map(Flag::long_name), Some("mid"));
        assert_eq!(set.lookup(FlagName::Long("alpha")).map(Flag::long_name), Some("alpha"));
        assert!(set.lookup(FlagName::Short('a')).is_none());
        assert!(set.lookup(FlagName::Long("Alpha")).is_none());
    }
}
