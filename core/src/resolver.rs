//! Resolver contract and the built-in prompt strategies.
//!
//! A [`Resolver`] produces a value for one option when the command line did
//! not. The built-in strategy ([`default_resolve`]) picks a prompt from the
//! option's shape, in this precedence: boolean or negated → confirmation,
//! declared choices → selection, otherwise → free-text input. All strategies
//! are pure with respect to the classification tables: they see only the
//! current value, the descriptor, and the live values resolved so far.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{CommandError, Result};
use crate::option::{OptionSpec, ParseValueFn};
use crate::value::Value;

/// Inline validation hook for free-text prompts.
///
/// Returns `Err(message)` to reject the answer and let the user retry within
/// the same prompt rather than aborting the parse.
pub type ValidateFn = Arc<dyn Fn(&str) -> std::result::Result<(), String> + Send + Sync>;

/// The three prompting capabilities the engine consumes.
///
/// Terminal rendering lives outside the core; implement this trait to supply
/// it (see the `interactive-command-term` crate for a `dialoguer` backend, or
/// script answers in tests).
#[async_trait]
pub trait Prompt: Send + Sync {
    /// Asks a yes/no question and returns the answer.
    async fn confirm(&self, message: &str, default: bool) -> Result<bool>;

    /// Asks the user to pick one of `choices`, offered in the given order.
    async fn select(&self, message: &str, choices: &[String]) -> Result<String>;

    /// Asks for free text. An empty answer means "no value".
    async fn input(&self, message: &str, default: Option<String>, validate: ValidateFn)
    -> Result<String>;
}

/// Everything a resolver sees for one option.
pub struct ResolveContext<'a> {
    /// Best-known current value: the live value if set, else the value the
    /// tolerant pass captured (default or config).
    pub current: Option<Value>,
    /// The option being resolved.
    pub option: &'a OptionSpec,
    /// Live values of the command node, including options resolved earlier
    /// in the same pass. This is how dependent prompts are composed.
    pub values: &'a BTreeMap<String, Value>,
    /// The prompting backend, when one is attached to the root command.
    pub prompter: Option<&'a dyn Prompt>,
}

/// Produces a value for one option interactively.
///
/// Returning `Ok(None)` means "no value": the option is left unset, and the
/// dispatcher raises a missing-mandatory failure if it was required.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, ctx: ResolveContext<'_>) -> Result<Option<Value>>;
}

/// Adapts an option's value parser into an inline prompt validator.
///
/// An empty answer always passes: emptiness means absence, which is handled
/// by the mandatory-value check, not by validation.
pub fn parser_to_validator(parser: Option<ParseValueFn>) -> ValidateFn {
    Arc::new(move |raw| {
        if raw.is_empty() {
            return Ok(());
        }
        match &parser {
            Some(parse) => parse(raw).map(|_| ()),
            None => Ok(()),
        }
    })
}

/// The built-in resolution strategy.
///
/// Exposed so custom resolvers can adjust the context (typically `current`)
/// and then delegate back to the default behavior.
pub async fn default_resolve(ctx: ResolveContext<'_>) -> Result<Option<Value>> {
    let option = ctx.option;
    let prompter = ctx.prompter.ok_or_else(|| {
        CommandError::Prompt("no prompter configured, attach one with with_prompter".to_string())
    })?;
    let message = option.description();

    if option.is_boolean() || option.is_negated() {
        let current = ctx.current.as_ref().map(Value::is_truthy).unwrap_or(false);
        let shown = if option.is_negated() { !current } else { current };
        debug!(option = %option.key(), default = shown, "confirmation prompt");
        let answer = prompter.confirm(message, shown).await?;
        let stored = if option.is_negated() { !answer } else { answer };
        return Ok(Some(Value::Bool(stored)));
    }

    if let Some(choices) = option.choices() {
        let front = ctx
            .current
            .as_ref()
            .map(Value::to_text)
            .or_else(|| option.default_value().map(Value::to_text));
        let ordered = front_loaded(choices, front.as_deref());
        debug!(option = %option.key(), choices = ordered.len(), "selection prompt");
        let answer = prompter.select(message, &ordered).await?;
        return option.parse_raw(&answer).map(Some);
    }

    let default_text = ctx.current.as_ref().map(Value::to_text);
    let validate = parser_to_validator(option.parser());
    debug!(option = %option.key(), "input prompt");
    let answer = prompter.input(message, default_text, validate).await?;
    if answer.is_empty() {
        return Ok(None);
    }
    option.parse_raw(&answer).map(Some)
}

/// Moves the element equal to `front` to the head of the list; the remainder
/// keeps its declared order, with no deduplication.
fn front_loaded(choices: &[String], front: Option<&str>) -> Vec<String> {
    let mut ordered = choices.to_vec();
    if let Some(front) = front {
        if let Some(position) = ordered.iter().position(|choice| choice == front) {
            let chosen = ordered.remove(position);
            ordered.insert(0, chosen);
        }
    }
    ordered
}
