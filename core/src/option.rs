//! Option descriptors.
//!
//! An [`OptionSpec`] is the immutable declaration of a single flag: its
//! short/long forms (parsed from a commander-style flag string), whether it
//! takes a value, whether it is mandatory or negated, its choices, default,
//! and value parser. The one mutable aspect is the resolver slot, which may
//! be replaced or disabled at configuration time.

use std::fmt;
use std::sync::Arc;

use crate::error::CommandError;
use crate::resolver::Resolver;
use crate::value::Value;

/// Parses a raw CLI token or prompt answer into a typed [`Value`].
///
/// The `Err` string doubles as the inline validation message shown when a
/// prompted answer is rejected, so keep it user-readable.
pub type ParseValueFn = Arc<dyn Fn(&str) -> std::result::Result<Value, String> + Send + Sync>;

/// How an option obtains its value when it was not typed on the command line.
#[derive(Clone)]
pub enum ResolverSlot {
    /// Use the built-in strategy derived from the option's shape
    /// (confirmation, selection, or free-text input).
    BuiltIn,
    /// Use a caller-supplied [`Resolver`].
    Custom(Arc<dyn Resolver>),
    /// Never prompt; the option keeps whatever value parsing produced.
    Disabled,
}

impl fmt::Debug for ResolverSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolverSlot::BuiltIn => f.write_str("BuiltIn"),
            ResolverSlot::Custom(_) => f.write_str("Custom(..)"),
            ResolverSlot::Disabled => f.write_str("Disabled"),
        }
    }
}

/// Declaration of a single command-line option.
///
/// The flag string follows the conventional grammar: an optional short form,
/// a long form, and an optional value placeholder — `<value>` for a mandatory
/// value, `[value]` for an optional one. A long form starting with `--no-`
/// declares a negated boolean.
///
/// # Examples
///
/// ```
/// use interactive_command_core::OptionSpec;
///
/// let size = OptionSpec::new("-s, --size <size>", "size")
///     .with_choices(["small", "medium", "large"])
///     .with_default("medium");
/// assert_eq!(size.key(), "size");
/// assert!(size.takes_value());
///
/// let no_cheese = OptionSpec::new("-C, --no-cheese", "no cheese");
/// assert_eq!(no_cheese.key(), "cheese");
/// assert!(no_cheese.is_negated());
/// ```
#[derive(Clone)]
pub struct OptionSpec {
    flags: String,
    short: Option<String>,
    long: Option<String>,
    description: String,
    takes_value: bool,
    value_optional: bool,
    required: bool,
    negate: bool,
    choices: Option<Vec<String>>,
    default: Option<Value>,
    parser: Option<ParseValueFn>,
    resolver: ResolverSlot,
}

impl OptionSpec {
    /// Declares an option from a flag string and description.
    ///
    /// # Examples
    ///
    /// ```
    /// use interactive_command_core::OptionSpec;
    ///
    /// let count = OptionSpec::new("-n, --count <number>", "number of items");
    /// assert_eq!(count.short(), Some("-n"));
    /// assert_eq!(count.long(), Some("--count"));
    /// assert_eq!(count.key(), "count");
    /// ```
    pub fn new(flags: &str, description: &str) -> Self {
        let mut short = None;
        let mut long = None;
        let mut takes_value = false;
        let mut value_optional = false;

        for token in flags.split([' ', ',']).filter(|t| !t.is_empty()) {
            if token.starts_with("--") {
                long = Some(token.to_string());
            } else if token.starts_with('-') {
                short = Some(token.to_string());
            } else if token.starts_with('<') {
                takes_value = true;
            } else if token.starts_with('[') {
                takes_value = true;
                value_optional = true;
            }
        }

        let negate = long
            .as_deref()
            .map(|l| l.starts_with("--no-"))
            .unwrap_or(false);

        Self {
            flags: flags.to_string(),
            short,
            long,
            description: description.to_string(),
            takes_value,
            value_optional,
            required: false,
            negate,
            choices: None,
            default: None,
            parser: None,
            resolver: ResolverSlot::BuiltIn,
        }
    }

    /// Marks the option as mandatory.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the default value.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Restricts the value to an ordered set of choices.
    ///
    /// Declaration order is meaningful: selection prompts offer the choices
    /// in this order, with only the current/default value moved to the front.
    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the value parser, used for CLI tokens and prompted answers alike.
    pub fn with_parser<F>(mut self, parser: F) -> Self
    where
        F: Fn(&str) -> std::result::Result<Value, String> + Send + Sync + 'static,
    {
        self.parser = Some(Arc::new(parser));
        self
    }

    /// Replaces the built-in resolver with a custom one.
    pub fn with_resolver<R: Resolver + 'static>(mut self, resolver: R) -> Self {
        self.resolver = ResolverSlot::Custom(Arc::new(resolver));
        self
    }

    /// Disables interactive resolution for this option.
    pub fn non_interactive(mut self) -> Self {
        self.resolver = ResolverSlot::Disabled;
        self
    }

    /// Replaces the resolver slot in place (configuration time only).
    pub fn set_resolver(&mut self, slot: ResolverSlot) {
        self.resolver = slot;
    }

    /// The raw flag string as declared.
    pub fn flags(&self) -> &str {
        &self.flags
    }

    /// The canonical key: the long form without dashes and without the
    /// `no-` negation prefix, falling back to the short form.
    pub fn key(&self) -> &str {
        if let Some(long) = self.long.as_deref() {
            let name = &long[2..];
            if self.negate {
                return name.strip_prefix("no-").unwrap_or(name);
            }
            return name;
        }
        self.short.as_deref().map(|s| &s[1..]).unwrap_or("")
    }

    /// Short form including the leading dash, if declared.
    pub fn short(&self) -> Option<&str> {
        self.short.as_deref()
    }

    /// Long form including the leading dashes, if declared.
    pub fn long(&self) -> Option<&str> {
        self.long.as_deref()
    }

    /// The option's description, used as the prompt message.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether the flag consumes a value token.
    pub fn takes_value(&self) -> bool {
        self.takes_value
    }

    /// Whether the value token may be omitted (`[value]` placeholder).
    pub fn value_optional(&self) -> bool {
        self.value_optional
    }

    /// Whether the option is mandatory.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Whether this is a `--no-x` declaration.
    pub fn is_negated(&self) -> bool {
        self.negate
    }

    /// Whether this is a flag-only (boolean) option.
    pub fn is_boolean(&self) -> bool {
        !self.takes_value
    }

    /// Declared choices, in declaration order.
    pub fn choices(&self) -> Option<&[String]> {
        self.choices.as_deref()
    }

    /// Declared default value.
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub(crate) fn parser(&self) -> Option<ParseValueFn> {
        self.parser.clone()
    }

    pub(crate) fn resolver(&self) -> &ResolverSlot {
        &self.resolver
    }

    /// Runs a raw token or answer through the option's parser.
    ///
    /// Without a parser, choice membership is checked when choices are
    /// declared; otherwise the raw text passes through as [`Value::Str`].
    pub fn parse_raw(&self, raw: &str) -> std::result::Result<Value, CommandError> {
        if let Some(parser) = &self.parser {
            return parser(raw).map_err(|message| CommandError::InvalidArgument {
                option: self.flags.clone(),
                message,
            });
        }
        if let Some(choices) = &self.choices {
            if !choices.iter().any(|c| c == raw) {
                return Err(CommandError::InvalidArgument {
                    option: self.flags.clone(),
                    message: format!("allowed choices are {}", choices.join(", ")),
                });
            }
        }
        Ok(Value::Str(raw.to_string()))
    }

    /// Whether `token` matches the short or long form exactly.
    pub fn matches(&self, token: &str) -> bool {
        self.short.as_deref() == Some(token) || self.long.as_deref() == Some(token)
    }
}

impl fmt::Debug for OptionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionSpec")
            .field("flags", &self.flags)
            .field("required", &self.required)
            .field("negate", &self.negate)
            .field("takes_value", &self.takes_value)
            .field("choices", &self.choices)
            .field("default", &self.default)
            .field("resolver", &self.resolver)
            .finish()
    }
}
