//! Tolerant pre-parse: classification tables for one invocation.
//!
//! [`partial_parse`] runs the shadow pass over the grammar without touching
//! any live option state, and reports, per command node on the invocation
//! path, which options were provided (and from where) and which mandatory
//! options are missing. The tables live for one invocation; the engine
//! rebuilds them from scratch every time.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::command::Command;
use crate::error::Result;
use crate::scan::{self, OptionOutcome, ScanOutcome};
use crate::value::{Value, ValueSource};

/// The three per-node tables produced by the tolerant pass.
///
/// Nodes are keyed by their child-index path from the root (the root itself
/// is the empty path). Only nodes on the invocation path are present.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    provided: HashMap<Vec<usize>, BTreeMap<String, Value>>,
    missing: HashMap<Vec<usize>, BTreeSet<String>>,
    sources: HashMap<Vec<usize>, BTreeMap<String, ValueSource>>,
}

impl Classification {
    /// Values the tolerant pass obtained for a node, by canonical key.
    pub fn provided(&self, path: &[usize]) -> Option<&BTreeMap<String, Value>> {
        self.provided.get(path)
    }

    /// Mandatory options the tolerant pass could not satisfy on a node.
    pub fn missing(&self, path: &[usize]) -> Option<&BTreeSet<String>> {
        self.missing.get(path)
    }

    /// Provenance of one provided value; `None` means no value was captured.
    pub fn source(&self, path: &[usize], key: &str) -> Option<ValueSource> {
        self.sources.get(path).and_then(|map| map.get(key)).copied()
    }
}

/// Runs the tolerant pass over `tokens` (without the program name) and
/// builds the classification tables.
///
/// Read-only with respect to the command tree. Missing mandatory options are
/// recorded instead of raised; everything else — unknown options, unknown
/// commands, unparsable present values — fails exactly as the strict pass
/// would.
pub fn partial_parse(root: &Command, tokens: &[String]) -> Result<Classification> {
    let outcome = scan::scan(root, tokens)?;
    Ok(classify(&outcome))
}

pub(crate) fn classify(outcome: &ScanOutcome) -> Classification {
    let mut tables = Classification::default();
    for node in &outcome.nodes {
        let provided = tables.provided.entry(node.path.clone()).or_default();
        let missing = tables.missing.entry(node.path.clone()).or_default();
        let sources = tables.sources.entry(node.path.clone()).or_default();
        for (key, option_outcome) in &node.outcomes {
            match option_outcome {
                OptionOutcome::Supplied { value, source } => {
                    provided.insert(key.clone(), value.clone());
                    sources.insert(key.clone(), *source);
                }
                OptionOutcome::MissingRequired => {
                    missing.insert(key.clone());
                }
                OptionOutcome::MissingOptional => {}
            }
        }
    }
    tables
}
