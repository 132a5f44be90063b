//! Error types for parsing and interactive resolution.
//!
//! The taxonomy separates *absence* (a mandatory option nobody supplied),
//! *invalidity* (a supplied or prompted value its parser rejects), resolver
//! and prompt failures, and configuration errors caught before any parsing
//! starts. Help and version requests are not errors; they surface as benign
//! [`Outcome`](crate::Outcome) variants instead.

use thiserror::Error;

use crate::validate::ValidationError;

/// Errors surfaced by [`Command::invoke`](crate::Command::invoke) and the
/// configuration surface.
#[derive(Debug, Error)]
pub enum CommandError {
    /// A mandatory option was neither supplied nor resolved interactively.
    #[error("required option '{0}' not specified")]
    MissingMandatoryOption(String),

    /// A supplied or prompted value was rejected by the option's parser.
    #[error("invalid value for option '{option}': {message}")]
    InvalidArgument { option: String, message: String },

    /// A flag that takes a value appeared without one.
    #[error("option '{0}' requires a value")]
    MissingOptionValue(String),

    /// An argument token matched no declared option on the invocation path.
    #[error("unknown option '{0}'")]
    UnknownOption(String),

    /// A positional token matched no subcommand.
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// The prompting backend or a custom resolver failed. Fatal; values
    /// resolved before the failure are left in place.
    #[error("prompt failed: {0}")]
    Prompt(String),

    /// A plugin registration callback failed before parsing began.
    #[error("plugin registration failed: {0}")]
    Plugin(String),

    /// The command tree violates a structural declaration invariant.
    #[error("invalid command declaration: {0}")]
    Configuration(#[from] ValidationError),

    /// `parse` was called; only the async entry point is supported.
    #[error("synchronous parse is not supported, use the async invoke entry point")]
    SyncParseUnsupported,
}

/// Convenience alias for results with [`CommandError`].
pub type Result<T> = std::result::Result<T, CommandError>;
