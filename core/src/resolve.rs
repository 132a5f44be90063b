//! The resolution dispatcher.
//!
//! Fires after routing has committed to a target subcommand and before its
//! action runs. Walks the invocation path root-to-leaf, and on each node
//! resolves, strictly sequentially and in declaration order, every option
//! the user did not type on the command line. A resolver that yields no
//! value for a mandatory option aborts the queue immediately; values
//! resolved before the failure stay set.

use tracing::debug;

use crate::command::Command;
use crate::error::{CommandError, Result};
use crate::option::ResolverSlot;
use crate::preparse::Classification;
use crate::resolver::{self, ResolveContext};
use crate::scan::{OptionOutcome, ScanOutcome};
use crate::value::ValueSource;

/// Effective interactive-flag lookup with inheritance.
///
/// A node's own flag value wins if one was actually set (CLI, config, or an
/// earlier prompt); otherwise the nearest ancestor's. Default-applied values
/// only count when no node on the path has an explicitly set value, so a
/// `--no-interactive` typed at the root is not shadowed by a descendant's
/// implied default.
pub(crate) fn interactive_active(root: &Command, target: &[usize]) -> bool {
    let mut implied = None;
    for depth in (0..=target.len()).rev() {
        let node = root.node(&target[..depth]);
        let Some(key) = node.interactive_key() else {
            continue;
        };
        let Some(value) = node.get_value(key) else {
            continue;
        };
        if node.get_source(key) == Some(ValueSource::Default) {
            if implied.is_none() {
                implied = Some(value.is_truthy());
            }
        } else {
            return value.is_truthy();
        }
    }
    implied.unwrap_or(false)
}

/// Resolves every non-CLI option on the invocation path.
pub(crate) async fn dispatch(
    root: &mut Command,
    outcome: &ScanOutcome,
    tables: &Classification,
) -> Result<()> {
    let prompter = root.prompter();

    for depth in 0..=outcome.target.len() {
        let node_path = outcome.target[..depth].to_vec();
        let Some(scan_node) = outcome.nodes.iter().find(|node| node.path == node_path) else {
            continue;
        };

        // Everything not explicitly typed by the user, in declaration order.
        let candidates: Vec<String> = scan_node
            .outcomes
            .iter()
            .filter(|(_, option_outcome)| {
                !matches!(
                    option_outcome,
                    OptionOutcome::Supplied {
                        source: ValueSource::Cli,
                        ..
                    }
                )
            })
            .map(|(key, _)| key.clone())
            .collect();

        for key in candidates {
            let (spec, current, snapshot) = {
                let node = root.node(&node_path);
                let Some(spec) = node.first_spec(&key) else {
                    continue;
                };
                let spec = spec.clone();
                // A live value set by an earlier resolution (or injection)
                // takes precedence over the tolerant pass's captured value.
                let current = node
                    .get_value(&key)
                    .cloned()
                    .or_else(|| {
                        tables
                            .provided(&node_path)
                            .and_then(|values| values.get(&key).cloned())
                    });
                (spec, current, node.values_snapshot())
            };

            let resolved = match spec.resolver() {
                ResolverSlot::Disabled => {
                    debug!(option = %key, "resolver disabled, keeping computed value");
                    continue;
                }
                ResolverSlot::BuiltIn => {
                    resolver::default_resolve(ResolveContext {
                        current,
                        option: &spec,
                        values: &snapshot,
                        prompter: prompter.as_deref(),
                    })
                    .await?
                }
                ResolverSlot::Custom(custom) => {
                    custom
                        .resolve(ResolveContext {
                            current,
                            option: &spec,
                            values: &snapshot,
                            prompter: prompter.as_deref(),
                        })
                        .await?
                }
            };

            let node = root.node_mut(&node_path);
            match resolved {
                Some(value) => {
                    debug!(option = %key, "resolved interactively");
                    node.store_value(&key, value, ValueSource::Prompt);
                }
                None => {
                    if spec.is_required() {
                        return Err(CommandError::MissingMandatoryOption(
                            spec.flags().to_string(),
                        ));
                    }
                    node.clear_value(&key);
                }
            }
        }
    }

    Ok(())
}
