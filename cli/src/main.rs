use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use cmdtree_core::{
    BoundFlags, CommandRef, Flag, FlagName, Resolution, TreeFile, TreeFileError, Value,
};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// CLI-specific output format enum with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "cmdtree")]
#[command(about = "Resolve arguments against declared command trees")]
struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. warn, debug).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve arguments and print the matched command, flags and positionals.
    Resolve(ResolveArgs),
    /// Resolve arguments and run the matched command's demo action.
    Run(RunArgs),
    /// Build a tree file and report declaration errors.
    Validate(ValidateArgs),
    /// Show the flags visible at a command.
    Inspect(InspectArgs),
}

#[derive(Debug, Args)]
struct ResolveArgs {
    /// Tree file (.json for JSON, anything else is read as YAML).
    #[arg(long)]
    tree: PathBuf,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
    /// Arguments to resolve, after `--`.
    #[arg(last = true)]
    args: Vec<String>,
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Tree file (.json for JSON, anything else is read as YAML).
    #[arg(long)]
    tree: PathBuf,
    /// Arguments to resolve, after `--`.
    #[arg(last = true)]
    args: Vec<String>,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Tree file (.json for JSON, anything else is read as YAML).
    #[arg(long)]
    tree: PathBuf,
}

#[derive(Debug, Args)]
struct InspectArgs {
    /// Tree file (.json for JSON, anything else is read as YAML).
    #[arg(long)]
    tree: PathBuf,
    /// Command path below the root (e.g. `remote add`).
    path: Vec<String>,
}

/// A failed invocation, split by who has to fix it.
#[derive(Debug)]
enum Failure {
    /// The tree file is unreadable or malformed.
    Tree(String),
    /// The arguments do not resolve against the tree.
    Arguments(String),
}

impl Failure {
    fn exit_code(&self) -> i32 {
        match self {
            Self::Tree(_) => 1,
            Self::Arguments(_) => 2,
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::Tree(message) | Self::Arguments(message) => message,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let result = match cli.command {
        Command::Resolve(args) => run_resolve(args),
        Command::Run(args) => run_run(args),
        Command::Validate(args) => run_validate(args),
        Command::Inspect(args) => run_inspect(args),
    };

    if let Err(failure) = result {
        eprintln!("error: {}", failure.message());
        std::process::exit(failure.exit_code());
    }
}

fn init_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .init();
}

fn load_tree(path: &Path) -> Result<TreeFile, Failure> {
    let tree = TreeFile::from_path(path)
        .map_err(|err| Failure::Tree(format!("failed to load '{}': {err}", path.display())))?;
    debug!(path = %path.display(), root = %tree.root.name, "loaded tree file");
    Ok(tree)
}

fn tree_failure(err: TreeFileError) -> Failure {
    Failure::Tree(err.to_string())
}

// ---------------------------------------------------------------------------
// resolve / run
// ---------------------------------------------------------------------------

fn run_resolve(args: ResolveArgs) -> Result<(), Failure> {
    let root = load_tree(&args.tree)?.build().map_err(tree_failure)?;
    let resolution = root
        .resolve(&args.args)
        .map_err(|err| Failure::Arguments(err.to_string()))?
        .summary();

    println!("{}", render(&resolution, args.format)?);
    Ok(())
}

fn run_run(args: RunArgs) -> Result<(), Failure> {
    let root = load_tree(&args.tree)?
        .build_with(|path: &[String], command: cmdtree_core::Command| {
            let label = path.join(" ");
            command.with_action(move |flags, positional| {
                println!("Running {label} with {} and {positional:?}", flags_json(flags));
            })
        })
        .map_err(tree_failure)?;

    let result = root
        .execute(&args.args)
        .map_err(|err| Failure::Arguments(err.to_string()))?;
    info!(command = %result.command_ref().path().join(" "), "dispatched");
    Ok(())
}

fn flags_json(flags: &BoundFlags) -> serde_json::Value {
    let map = flags
        .iter()
        .map(|(name, bound)| {
            let value = match &bound.value {
                Value::Bool(b) => serde_json::Value::Bool(*b),
                Value::Int(i) => serde_json::Value::from(*i),
                Value::Str(s) => serde_json::Value::String(s.clone()),
                Value::Custom { raw, .. } => serde_json::Value::String(raw.clone()),
            };
            (name.to_string(), value)
        })
        .collect();
    serde_json::Value::Object(map)
}

fn render(resolution: &Resolution, format: CliOutputFormat) -> Result<String, Failure> {
    let rendered = match format {
        CliOutputFormat::Json => serde_json::to_string_pretty(resolution)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        CliOutputFormat::Yaml => {
            serde_yaml::to_string(resolution).map_err(|e| format!("YAML serialization failed: {e}"))
        }
    };
    rendered.map_err(Failure::Tree)
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn run_validate(args: ValidateArgs) -> Result<(), Failure> {
    let root = load_tree(&args.tree)?.build().map_err(tree_failure)?;
    println!(
        "{}: ok ({} commands, {} flags)",
        args.tree.display(),
        count_commands(&root),
        count_flags(&root)
    );
    Ok(())
}

fn count_commands(command: &cmdtree_core::Command) -> usize {
    1 + command.children().iter().map(count_commands).sum::<usize>()
}

fn count_flags(command: &cmdtree_core::Command) -> usize {
    command.flags().len() + command.children().iter().map(count_flags).sum::<usize>()
}

// ---------------------------------------------------------------------------
// inspect
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct CommandView {
    command: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    aliases: Vec<String>,
    subcommands: Vec<String>,
    flags: Vec<FlagView>,
}

#[derive(Debug, Serialize)]
struct FlagView {
    long: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    short: Option<char>,
    #[serde(rename = "type")]
    value_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<String>,
    required: bool,
    inheritable: bool,
    /// `true` when declared on an ancestor.
    inherited: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    deprecated: Option<String>,
}

fn run_inspect(args: InspectArgs) -> Result<(), Failure> {
    let root = load_tree(&args.tree)?.build().map_err(tree_failure)?;
    let path: Vec<&str> = args.path.iter().map(String::as_str).collect();
    let node = root
        .find(&path)
        .ok_or_else(|| Failure::Arguments(format!("no command at path `{}`", path.join(" "))))?;

    let view = command_view(&node);
    let json = serde_json::to_string_pretty(&view)
        .map_err(|e| Failure::Tree(format!("JSON serialization failed: {e}")))?;
    println!("{json}");
    Ok(())
}

fn command_view(node: &CommandRef<'_>) -> CommandView {
    let command = node.command();
    CommandView {
        command: node.path().into_iter().map(String::from).collect(),
        description: command.description().to_string(),
        aliases: command.aliases().to_vec(),
        subcommands: command
            .children()
            .iter()
            .map(|child| child.name().to_string())
            .collect(),
        flags: node
            .visible_flags()
            .iter()
            .map(|flag| flag_view(flag, !is_own_flag(command, flag)))
            .collect(),
    }
}

fn is_own_flag(command: &cmdtree_core::Command, flag: &Flag) -> bool {
    command
        .flags()
        .lookup(FlagName::Long(flag.long_name()))
        .is_some_and(|own| std::ptr::eq(own, flag))
}

fn flag_view(flag: &Flag, inherited: bool) -> FlagView {
    FlagView {
        long: flag.long_name().to_string(),
        short: flag.short_name(),
        value_type: flag.value_type().name(),
        default: flag.default_value().map(|value| value.render()),
        required: flag.is_required(),
        inheritable: flag.is_inheritable(),
        inherited,
        description: flag.description().to_string(),
        deprecated: flag.deprecation().message().map(String::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TREE: &str = r#"
name: git
flags:
  - {long: verbose, short: v, type: bool, default: "false"}
subcommands:
  - name: remote
    flags:
      - {long: foo, type: string, default: "-"}
      - {long: bar, type: string, inheritable: false}
    subcommands:
      - name: add
"#;

    #[test]
    fn test_flags_json_keeps_value_types() {
        let root = TreeFile::from_yaml_str(TREE).unwrap().build().unwrap();
        let result = root.resolve(&["remote", "--bar", "x", "-v"]).unwrap();

        let json = flags_json(result.flags());
        assert_eq!(
            json,
            serde_json::json!({"bar": "x", "foo": "-", "verbose": true})
        );
        assert_eq!(json.to_string(), r#"{"bar":"x","foo":"-","verbose":true}"#);
    }

    #[test]
    fn test_counts() {
        let root = TreeFile::from_yaml_str(TREE).unwrap().build().unwrap();
        assert_eq!(count_commands(&root), 3);
        assert_eq!(count_flags(&root), 3);
    }

    #[test]
    fn test_command_view_marks_inherited_flags() {
        let root = TreeFile::from_yaml_str(TREE).unwrap().build().unwrap();
        let view = command_view(&root.find(&["remote", "add"]).unwrap());

        assert_eq!(view.command, vec!["git", "remote", "add"]);
        let flags: Vec<(&str, bool)> = view
            .flags
            .iter()
            .map(|flag| (flag.long.as_str(), flag.inherited))
            .collect();
        assert_eq!(flags, vec![("foo", true), ("verbose", true)]);
    }

    #[test]
    fn test_command_view_own_flags() {
        let root = TreeFile::from_yaml_str(TREE).unwrap().build().unwrap();
        let view = command_view(&root.find(&["remote"]).unwrap());

        assert_eq!(view.subcommands, vec!["add"]);
        assert!(!view.flags[0].inherited);
        assert_eq!(view.flags[0].default.as_deref(), Some("-"));
        assert_eq!(view.flags[1].long, "bar");
        assert!(view.flags[2].inherited);
    }
}
