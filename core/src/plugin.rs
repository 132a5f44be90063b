//! Plugin registration.
//!
//! Plugins defer command-tree mutation until just before parsing starts:
//! every queued registration is drained and awaited at the top of
//! [`Command::invoke`](crate::Command::invoke), so subcommands and options a
//! plugin adds are visible to both the tolerant and the strict pass of that
//! same invocation. A failing registration is fatal before any parsing or
//! resolution begins.

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::command::Command;
use crate::error::Result;

/// A reusable registration entry point, the "external module" form.
///
/// ```
/// use interactive_command_core::{Command, CommandPlugin, Result};
/// use async_trait::async_trait;
///
/// struct HelloPlugin;
///
/// #[async_trait]
/// impl CommandPlugin for HelloPlugin {
///     async fn register(&self, root: &mut Command) -> Result<()> {
///         root.add_subcommand(Command::new("hello").with_description("Say hello"));
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait CommandPlugin: Send + Sync {
    /// Called once with the root command before the next parse.
    async fn register(&self, root: &mut Command) -> Result<()>;
}

/// Boxed one-shot asynchronous registration callback.
pub(crate) type PluginFn =
    Box<dyn for<'a> FnOnce(&'a mut Command) -> BoxFuture<'a, Result<()>> + Send>;

/// Boxed one-shot synchronous registration callback.
pub(crate) type SyncPluginFn = Box<dyn FnOnce(&mut Command) -> Result<()> + Send>;

pub(crate) enum PluginRegistration {
    Sync(SyncPluginFn),
    Callback(PluginFn),
    Module(Box<dyn CommandPlugin>),
}

impl std::fmt::Debug for PluginRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PluginRegistration::Sync(_) => f.write_str("Sync(..)"),
            PluginRegistration::Callback(_) => f.write_str("Callback(..)"),
            PluginRegistration::Module(_) => f.write_str("Module(..)"),
        }
    }
}
