//! The shared grammar walker.
//!
//! One pass over the raw tokens serves both parsing phases: the tolerant
//! pre-parse interprets the outcome into classification tables, and the
//! strict application step replays the very same captured values into the
//! live option store. A token is therefore never re-parsed with different
//! semantics.
//!
//! Tolerance applies only to absence. Unknown options, unknown commands,
//! unparsable values for *present* options, and a missing value for a flag
//! that requires one fail here, in both phases. Help and version requests
//! short-circuit the walk without being errors.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::command::Command;
use crate::error::{CommandError, Result};
use crate::value::{Value, ValueSource};

/// Per-option result of the shadow pass, in tagged-variant form.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum OptionOutcome {
    /// A value exists, with its provenance.
    Supplied { value: Value, source: ValueSource },
    /// A mandatory option the pass could not satisfy.
    MissingRequired,
    /// An optional option with neither value nor default.
    MissingOptional,
}

/// Outcomes for one command node on the invocation path, keyed by canonical
/// option key in declaration order.
#[derive(Debug, Clone)]
pub(crate) struct NodeScan {
    pub(crate) path: Vec<usize>,
    pub(crate) outcomes: Vec<(String, OptionOutcome)>,
}

/// Everything one walk over the tokens produced.
#[derive(Debug, Clone, Default)]
pub(crate) struct ScanOutcome {
    /// Root-to-leaf, one entry per node on the invocation path.
    pub(crate) nodes: Vec<NodeScan>,
    /// Child-index path of the command that would run.
    pub(crate) target: Vec<usize>,
    /// Positional leftovers, handed to the action untouched.
    pub(crate) operands: Vec<String>,
    /// Set when `-h`/`--help` terminated the walk, naming the node whose
    /// help was requested.
    pub(crate) help: Option<Vec<usize>>,
    /// Set when the root's version flag terminated the walk.
    pub(crate) version: bool,
}

/// Whether a token should be treated as a flag rather than a value.
fn looks_like_flag(token: &str) -> bool {
    token.len() > 1 && token.starts_with('-') && !token.as_bytes()[1].is_ascii_digit()
}

fn find_option<'a>(
    root: &'a Command,
    path: &[usize],
    name: &str,
) -> Option<(Vec<usize>, &'a crate::option::OptionSpec)> {
    // Nearest node wins; ancestors supply global options.
    for depth in (0..=path.len()).rev() {
        let node_path = &path[..depth];
        let node = root.node(node_path);
        if let Some(spec) = node.options().iter().find(|o| o.matches(name)) {
            return Some((node_path.to_vec(), spec));
        }
    }
    None
}

/// Walks `tokens` against the command tree and classifies every declared
/// option on the invocation path.
pub(crate) fn scan(root: &Command, tokens: &[String]) -> Result<ScanOutcome> {
    let mut path: Vec<usize> = Vec::new();
    let mut cli: Vec<(Vec<usize>, String, Value)> = Vec::new();
    let mut operands: Vec<String> = Vec::new();
    let mut help: Option<Vec<usize>> = None;
    let mut version = false;
    let mut after_terminator = false;

    let mut index = 0;
    'tokens: while index < tokens.len() {
        let token = tokens[index].clone();
        index += 1;

        if after_terminator {
            operands.push(token);
            continue;
        }
        if token == "--" {
            after_terminator = true;
            continue;
        }
        if token == "-h" || token == "--help" {
            help = Some(path.clone());
            break;
        }

        if looks_like_flag(&token) {
            let (name, inline) = match token.split_once('=') {
                Some((n, v)) => (n.to_string(), Some(v.to_string())),
                None => (token.clone(), None),
            };

            // Unresolvable flags fall into the default subcommand, so
            // `prog --name x` can route to `prog hello --name x`.
            let found = loop {
                if let Some(found) = find_option(root, &path, &name) {
                    break Some(found);
                }
                match root.node(&path).default_child_index() {
                    Some(child) => {
                        debug!(option = %name, "descending into default subcommand");
                        path.push(child);
                    }
                    None => break None,
                }
            };
            let Some((declaring_path, spec)) = found else {
                return Err(CommandError::UnknownOption(token));
            };

            let value = if spec.is_boolean() {
                if inline.is_some() {
                    return Err(CommandError::InvalidArgument {
                        option: spec.flags().to_string(),
                        message: "flag does not take a value".to_string(),
                    });
                }
                Value::Bool(!spec.is_negated())
            } else if let Some(raw) = inline {
                spec.parse_raw(&raw)?
            } else if tokens.get(index).is_some_and(|next| !looks_like_flag(next)) {
                let raw = tokens[index].clone();
                index += 1;
                spec.parse_raw(&raw)?
            } else if spec.value_optional() {
                Value::Bool(true)
            } else {
                return Err(CommandError::MissingOptionValue(spec.flags().to_string()));
            };

            let declaring = root.node(&declaring_path);
            if declaring.version_text().is_some() && spec.key() == "version" {
                version = true;
                break 'tokens;
            }

            cli.push((declaring_path, spec.key().to_string(), value));
            continue;
        }

        // Bare token: subcommand first, operand otherwise.
        let node = root.node(&path);
        if let Some(child) = node.child_index(&token) {
            path.push(child);
            continue;
        }
        if node.has_subcommands() {
            if let Some(child) = node.default_child_index() {
                debug!(token = %token, "retrying token against default subcommand");
                path.push(child);
                index -= 1;
                continue;
            }
            return Err(CommandError::UnknownCommand(token));
        }
        operands.push(token);
    }

    // A routing node without an action falls through to its default child.
    if help.is_none() && !version {
        loop {
            let node = root.node(&path);
            if node.has_action() {
                break;
            }
            match node.default_child_index() {
                Some(child) => path.push(child),
                None => break,
            }
        }
    }

    let mut cli_map: HashMap<Vec<usize>, BTreeMap<String, Value>> = HashMap::new();
    for (node_path, key, value) in cli {
        cli_map.entry(node_path).or_default().insert(key, value);
    }

    let mut nodes = Vec::new();
    for depth in 0..=path.len() {
        let node_path = path[..depth].to_vec();
        let node = root.node(&node_path);
        let node_cli = cli_map.get(&node_path);

        let mut outcomes = Vec::new();
        for key in node.unique_option_keys() {
            let outcome = if let Some(value) = node_cli.and_then(|values| values.get(&key)) {
                OptionOutcome::Supplied {
                    value: value.clone(),
                    source: ValueSource::Cli,
                }
            } else if let Some(value) = node.get_value(&key) {
                let source = node.get_source(&key).unwrap_or(ValueSource::Config);
                OptionOutcome::Supplied {
                    value: value.clone(),
                    source,
                }
            } else if let Some(default) = node.effective_default(&key) {
                OptionOutcome::Supplied {
                    value: default,
                    source: ValueSource::Default,
                }
            } else if node.key_is_required(&key) {
                OptionOutcome::MissingRequired
            } else {
                OptionOutcome::MissingOptional
            };
            outcomes.push((key, outcome));
        }
        nodes.push(NodeScan {
            path: node_path,
            outcomes,
        });
    }

    debug!(
        target = ?path,
        nodes = nodes.len(),
        operands = operands.len(),
        "scan complete"
    );

    Ok(ScanOutcome {
        nodes,
        target: path,
        operands,
        help,
        version,
    })
}
