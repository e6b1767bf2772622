//! Argument resolution against a command tree.
//!
//! [`resolve`] runs in four phases:
//!
//! 1. **Command matching**: leading tokens that name a child (or alias) of
//!    the current command descend into it. The first token that starts with
//!    `-` or names no child ends this phase.
//! 2. **Tokenization**: the rest is split into long flags (`--name`,
//!    `--name=value`), short flags (`-n`, `-n=value`, clusters like `-abc`)
//!    and positionals. A bare `-` is positional; a bare `--` ends flag
//!    parsing and everything after it is positional.
//! 3. **Binding**: each flag token is looked up among the flags visible to
//!    the matched command and its value is converted with the flag's type.
//!    Boolean flags bind `true` without consuming a token; other flags take
//!    a joined value or the next token. When a flag repeats, the last
//!    occurrence wins.
//! 4. **Validation**: defaults fill unbound flags, every required flag must
//!    end up with a value, and explicitly used deprecated flags produce
//!    warnings.
//!
//! Resolution never mutates the tree, so resolving the same arguments twice
//! yields equal results.

use tracing::{debug, warn};

use crate::command::{Command, CommandRef, VisibleFlags};
use crate::error::ResolveError;
use crate::flag::{Binding, Flag};
use crate::flag_set::FlagName;
use crate::result::{BoundFlags, DeprecationWarning, ParseResult};

const TERMINATOR: &str = "--";

/// A classified argument token.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'t> {
    /// `--name` or `--name=value`.
    Long {
        name: &'t str,
        value: Option<&'t str>,
    },
    /// `-n`, `-n=value`, or a cluster such as `-abc`.
    Short {
        names: &'t str,
        value: Option<&'t str>,
    },
    Positional(&'t str),
    Terminator,
}

fn classify(token: &str) -> Token<'_> {
    if token == TERMINATOR {
        return Token::Terminator;
    }
    if let Some(rest) = token.strip_prefix("--") {
        let (name, value) = split_joined(rest);
        return Token::Long { name, value };
    }
    match token.strip_prefix('-') {
        Some(rest) if !rest.is_empty() => {
            let (names, value) = split_joined(rest);
            Token::Short { names, value }
        }
        _ => Token::Positional(token),
    }
}

fn split_joined(body: &str) -> (&str, Option<&str>) {
    match body.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (body, None),
    }
}

/// Returns `true` for tokens that would be read as a flag rather than a value.
fn looks_like_flag(token: &str) -> bool {
    token.len() > 1 && token.starts_with('-')
}

/// Resolves `args` (the process arguments without the program name) against
/// the tree rooted at `root`.
///
/// # Errors
///
/// - [`ResolveError::UnknownFlag`]: a flag token names no visible flag.
/// - [`ResolveError::MissingFlagValue`]: a value-taking flag has no value.
/// - [`ResolveError::InvalidFlagValue`]: a value fails type conversion.
/// - [`ResolveError::MissingRequiredFlag`]: a required flag ended unset.
///
/// # Examples
///
/// ```
/// use cmdtree_core::{Command, Flag, ResolveError, ValueType, resolve};
///
/// let mut remote = Command::new("remote");
/// remote.add_flag(Flag::typed("name", ValueType::String).build().unwrap()).unwrap();
/// let mut root = Command::new("git");
/// root.add_subcommand(remote).unwrap();
///
/// let result = resolve(&root, &["remote", "--name=origin", "extra"]).unwrap();
/// assert_eq!(result.command().name(), "remote");
/// assert_eq!(result.positional(), ["extra"]);
///
/// let err = resolve(&root, &["remote", "-z"]).unwrap_err();
/// assert_eq!(err, ResolveError::UnknownFlag("z".into()));
/// ```
pub fn resolve<'a, S: AsRef<str>>(
    root: &'a Command,
    args: &[S],
) -> Result<ParseResult<'a>, ResolveError> {
    let tokens: Vec<&str> = args.iter().map(|arg| arg.as_ref()).collect();

    let (command, consumed) = match_command(root, &tokens);
    debug!(command = %command.path().join(" "), consumed, "matched command");

    let visible = command.visible_flags();
    let (mut flags, positional) = bind_tokens(&visible, &tokens[consumed..])?;

    for flag in visible.iter() {
        if flags.contains(flag.long_name()) {
            continue;
        }
        if let Some(default) = flag.default_value() {
            flags.bind(flag.long_name(), default.clone(), Binding::BoundFromDefault);
        }
    }

    if let Some(missing) = visible
        .iter()
        .find(|flag| flag.is_required() && !flags.contains(flag.long_name()))
    {
        return Err(ResolveError::MissingRequiredFlag(missing.long_name().to_string()));
    }

    let warnings = collect_warnings(&command, &visible, &flags);

    Ok(ParseResult {
        command,
        flags,
        positional,
        warnings,
    })
}

/// Phase 1: descend while tokens name children.
fn match_command<'a>(root: &'a Command, tokens: &[&str]) -> (CommandRef<'a>, usize) {
    let mut current = CommandRef::new(root);
    let mut consumed = 0;
    for token in tokens {
        if token.starts_with('-') {
            break;
        }
        match current.child(token) {
            Some(child) => {
                current = child;
                consumed += 1;
            }
            None => break,
        }
    }
    (current, consumed)
}

/// Phases 2 and 3: split flags from positionals and bind flag values.
fn bind_tokens(
    visible: &VisibleFlags<'_>,
    tokens: &[&str],
) -> Result<(BoundFlags, Vec<String>), ResolveError> {
    let mut flags = BoundFlags::default();
    let mut positional = Vec::new();
    let mut index = 0;

    while index < tokens.len() {
        let token = tokens[index];
        index += 1;

        match classify(token) {
            Token::Terminator => {
                positional.extend(tokens[index..].iter().map(|t| t.to_string()));
                break;
            }
            Token::Positional(text) => positional.push(text.to_string()),
            Token::Long { name, value } => {
                let flag = visible
                    .lookup(FlagName::Long(name))
                    .ok_or_else(|| ResolveError::UnknownFlag(name.to_string()))?;
                let next = tokens.get(index).copied();
                if bind_flag(&mut flags, flag, value, next)? {
                    index += 1;
                }
            }
            Token::Short { names, value } => {
                if names.is_empty() {
                    return Err(ResolveError::UnknownFlag(String::new()));
                }
                let mut chars = names.chars().peekable();
                while let Some(short) = chars.next() {
                    let flag = visible
                        .lookup(FlagName::Short(short))
                        .ok_or_else(|| ResolveError::UnknownFlag(short.to_string()))?;
                    if chars.peek().is_some() {
                        // Only the last flag of a cluster may take a value.
                        if !flag.is_bool() {
                            return Err(ResolveError::MissingFlagValue(
                                flag.long_name().to_string(),
                            ));
                        }
                        bind_flag(&mut flags, flag, None, None)?;
                        continue;
                    }
                    let next = tokens.get(index).copied();
                    if bind_flag(&mut flags, flag, value, next)? {
                        index += 1;
                    }
                }
            }
        }
    }

    Ok((flags, positional))
}

/// Binds one flag occurrence. Returns `true` if `next` was consumed as the
/// value.
fn bind_flag(
    flags: &mut BoundFlags,
    flag: &Flag,
    joined: Option<&str>,
    next: Option<&str>,
) -> Result<bool, ResolveError> {
    let name = flag.long_name();
    let (token, consumed) = match (joined, flag.is_bool()) {
        (Some(token), _) => (token, false),
        (None, true) => ("true", false),
        (None, false) => match next {
            Some(token) if !looks_like_flag(token) => (token, true),
            _ => return Err(ResolveError::MissingFlagValue(name.to_string())),
        },
    };

    let value = flag
        .value_type()
        .parse(token)
        .map_err(|_| ResolveError::InvalidFlagValue {
            name: name.to_string(),
            token: token.to_string(),
            expected: flag.value_type().name().to_string(),
        })?;

    debug!(flag = name, value = %value, "bound flag");
    flags.bind(name, value, Binding::BoundFromArgument);
    Ok(consumed)
}

/// Phase 4: deprecation notices for the matched command and explicitly set
/// flags.
fn collect_warnings(
    command: &CommandRef<'_>,
    visible: &VisibleFlags<'_>,
    flags: &BoundFlags,
) -> Vec<DeprecationWarning> {
    let mut warnings = Vec::new();

    if let Some(message) = command.command().deprecation().message() {
        let target = command.path().join(" ");
        warn!(command = %target, "{message}");
        warnings.push(DeprecationWarning {
            target,
            message: message.to_string(),
        });
    }

    for flag in visible.iter().filter(|flag| flags.was_set(flag.long_name())) {
        if let Some(message) = flag.deprecation().message() {
            let target = format!("--{}", flag.long_name());
            warn!(flag = %target, "{message}");
            warnings.push(DeprecationWarning {
                target,
                message: message.to_string(),
            });
        }
    }

    warnings
}
