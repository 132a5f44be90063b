//! Structural validation of command declarations.
//!
//! Catches configuration mistakes — malformed flag forms, duplicate option
//! keys, duplicate sibling subcommands, a dangling default-subcommand
//! marker — before any parsing starts. [`Command::invoke`](crate::Command::invoke)
//! runs this automatically and fails fast on the first error.
//!
//! # Examples
//!
//! ```
//! use interactive_command_core::{Command, OptionSpec, validate_command};
//!
//! let command = Command::new("order")
//!     .with_option(OptionSpec::new("-d, --drink", "drink"));
//! assert!(validate_command(&command).is_empty());
//!
//! let clash = Command::new("order")
//!     .with_option(OptionSpec::new("-d, --drink", "drink"))
//!     .with_option(OptionSpec::new("-D, --drink <kind>", "drink kind"));
//! assert!(!validate_command(&clash).is_empty());
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::command::Command;

/// Declaration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Command name is empty or whitespace-only.
    #[error("command name cannot be empty")]
    EmptyCommandName,
    /// An option has neither a short nor a long form.
    #[error("option '{0}' must define a short or long form")]
    MissingFlagName(String),
    /// Short form is not a single dash plus one character.
    #[error("invalid short flag format: {0}")]
    InvalidShortFlag(String),
    /// Long form does not start with `--` or is too short.
    #[error("invalid long flag format: {0}")]
    InvalidLongFlag(String),
    /// Two options on the same node share a key (a negated counterpart of a
    /// boolean flag is the one permitted exception).
    #[error("duplicate option in scope: {0}")]
    DuplicateOption(String),
    /// Two sibling subcommands share a name.
    #[error("duplicate subcommand in scope: {0}")]
    DuplicateSubcommand(String),
    /// The default-subcommand marker names no existing child.
    #[error("default subcommand does not exist: {0}")]
    UnknownDefaultSubcommand(String),
}

/// Validates a command tree.
///
/// Returns the first structural error found, wrapped in a `Vec` for easy
/// emptiness checks; an empty result means the declaration is sound.
pub fn validate_command(command: &Command) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if command.name().trim().is_empty() {
        errors.push(ValidationError::EmptyCommandName);
        return errors;
    }

    errors.extend(validate_options(command));
    if !errors.is_empty() {
        return errors;
    }

    if let Some(default_name) = command.default_subcommand_name() {
        if command.find_subcommand(default_name).is_none() {
            errors.push(ValidationError::UnknownDefaultSubcommand(
                default_name.to_string(),
            ));
            return errors;
        }
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for sub in command.subcommands() {
        if !seen.insert(sub.name()) {
            errors.push(ValidationError::DuplicateSubcommand(sub.name().to_string()));
            return errors;
        }
        errors.extend(validate_command(sub));
        if !errors.is_empty() {
            return errors;
        }
    }

    errors
}

fn validate_options(command: &Command) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen_keys: HashSet<(String, bool)> = HashSet::new();

    for option in command.options() {
        if option.short().is_none() && option.long().is_none() {
            errors.push(ValidationError::MissingFlagName(option.flags().to_string()));
            return errors;
        }

        if let Some(short) = option.short() {
            if !short.starts_with('-') || short.starts_with("--") || short.len() != 2 {
                errors.push(ValidationError::InvalidShortFlag(short.to_string()));
                return errors;
            }
        }

        if let Some(long) = option.long() {
            if !long.starts_with("--") || long.len() < 3 {
                errors.push(ValidationError::InvalidLongFlag(long.to_string()));
                return errors;
            }
        }

        // A boolean flag and its --no- counterpart may share a key; any
        // other collision is a declaration error.
        if !seen_keys.insert((option.key().to_string(), option.is_negated())) {
            errors.push(ValidationError::DuplicateOption(option.key().to_string()));
            return errors;
        }
    }

    errors
}
