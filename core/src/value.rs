//! Option value representation and provenance tracking.
//!
//! Option values flow through the engine from three places: raw CLI tokens,
//! programmatic injection, and interactive prompts. [`Value`] is the common
//! representation; [`ValueSource`] records where a live value came from,
//! which the resolution dispatcher uses to decide what is promptable.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A typed option value.
///
/// Values are produced by a flag's value parser (or default to [`Value::Str`]
/// for unparsed text and [`Value::Bool`] for flag-only options). They
/// serialize untagged, so a resolved option set dumps as plain JSON.
///
/// # Examples
///
/// ```
/// use interactive_command_core::Value;
///
/// let count = Value::Int(2);
/// assert_eq!(count.to_text(), "2");
/// assert!(count.is_truthy());
///
/// let cheese = Value::Bool(false);
/// assert!(!cheese.is_truthy());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Boolean flag value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// Text value (the default for unparsed answers and tokens).
    Str(String),
    /// Multiple text values (e.g., a comma-split keyword list).
    List(Vec<String>),
}

impl Value {
    /// Returns the boolean payload, if this is a [`Value::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the text payload, if this is a [`Value::Str`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Loose truthiness, used for flag values regardless of how they were
    /// parsed.
    ///
    /// # Examples
    ///
    /// ```
    /// use interactive_command_core::Value;
    ///
    /// assert!(Value::Str("yes".into()).is_truthy());
    /// assert!(!Value::Str(String::new()).is_truthy());
    /// assert!(!Value::Int(0).is_truthy());
    /// ```
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
        }
    }

    /// Coerces the value to prompt-default text.
    pub fn to_text(&self) -> String {
        match self {
            Value::Bool(b) => b.to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Str(s) => s.clone(),
            Value::List(items) => items.join(" "),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

/// Provenance of a live option value.
///
/// `Cli` is reserved for values parsed out of the raw argument tokens; it is
/// the only source that suppresses interactive resolution. A key with no
/// recorded source has no provenance ("none").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    /// Parsed from the raw argument tokens.
    Cli,
    /// Injected programmatically before parsing (e.g., from a config file).
    Config,
    /// Applied from the option's declared (or implied) default.
    Default,
    /// Produced by an interactive resolver.
    Prompt,
}
