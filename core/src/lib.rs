//! Interactive option resolution for hierarchical command-line programs.
//!
//! The engine parses a commander-style command tree in two cooperating
//! passes. A tolerant pre-parse classifies every declared option on the
//! invocation path as supplied (with provenance), missing-mandatory, or
//! simply absent, without raising absence errors. When the inherited
//! interactive flag is on, a resolution pass then walks the path
//! root-to-leaf and fills the gaps one option at a time, strictly
//! sequentially and in declaration order, so a resolver can read the
//! answers given before it. Values captured by the pre-parse are replayed
//! verbatim into the live store; no token is ever parsed twice.
//!
//! Resolution strategies derive from the option's shape: boolean and
//! negated flags confirm, options with declared choices select (current
//! value offered first), everything else asks for free text validated by
//! the option's parser. Each strategy can be replaced per option with a
//! custom [`Resolver`] or disabled outright. Terminal rendering is not
//! part of this crate; attach a [`Prompt`] backend (the companion
//! `interactive-command-term` crate wires one up with `dialoguer`).
//!
//! # Examples
//!
//! ```
//! use interactive_command_core::{Command, OptionSpec, Outcome};
//!
//! let mut program = Command::new("order")
//!     .with_version("1.2.0")
//!     .with_subcommand(
//!         Command::new("sandwich")
//!             .with_option(OptionSpec::new("-c, --cheese", "Add cheese"))
//!             .with_option(
//!                 OptionSpec::new("-s, --size <size>", "Sandwich size")
//!                     .with_choices(["small", "medium", "large"])
//!                     .with_default("medium"),
//!             )
//!             .with_action(|ctx| async move {
//!                 assert_eq!(ctx.get("size").unwrap().to_text(), "large");
//!                 Ok(())
//!             }),
//!     )
//!     .interactive();
//!
//! let runtime = tokio::runtime::Builder::new_current_thread()
//!     .build()
//!     .unwrap();
//! let outcome = runtime
//!     .block_on(program.invoke(["order", "sandwich", "--cheese", "--size", "large"]))
//!     .unwrap();
//! assert_eq!(outcome, Outcome::Ran);
//! ```

mod command;
mod error;
mod option;
mod plugin;
mod preparse;
mod resolve;
mod resolver;
mod scan;
mod validate;
mod value;

pub use command::{ActionContext, ActionFn, Command, Outcome};
pub use error::{CommandError, Result};
pub use option::{OptionSpec, ParseValueFn, ResolverSlot};
pub use plugin::CommandPlugin;
pub use preparse::{Classification, partial_parse};
pub use resolver::{
    Prompt, ResolveContext, Resolver, ValidateFn, default_resolve, parser_to_validator,
};
pub use validate::{ValidationError, validate_command};
pub use value::{Value, ValueSource};
