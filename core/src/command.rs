//! The command tree and the invocation lifecycle.
//!
//! A [`Command`] is one level of a command hierarchy: it owns its option
//! descriptors in declaration order, its children, a live option-value
//! store, and (on the root) the plugin queue and the prompting backend.
//! [`Command::invoke`] is the single entry point; it drains plugins,
//! validates the declaration, runs the tolerant shadow pass, applies the
//! captured values strictly, drives interactive resolution when the
//! inherited interactive flag is on, and finally runs the target action.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::debug;

use crate::error::{CommandError, Result};
use crate::option::{OptionSpec, ResolverSlot};
use crate::plugin::{CommandPlugin, PluginRegistration};
use crate::preparse;
use crate::resolve;
use crate::resolver::Prompt;
use crate::scan::{self, OptionOutcome, ScanOutcome};
use crate::validate;
use crate::value::{Value, ValueSource};

/// How an invocation ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The target subcommand's action ran to completion.
    Ran,
    /// Help was requested (or a routing node had nothing to run); parsing
    /// stopped cleanly with no resolution performed.
    HelpDisplayed,
    /// The version flag was supplied; parsing stopped cleanly.
    VersionDisplayed,
}

/// Everything an action sees: the resolved option values of its own node,
/// the merged values of the whole invocation path, and positional leftovers.
#[derive(Debug, Clone)]
pub struct ActionContext {
    command: String,
    values: BTreeMap<String, Value>,
    globals: BTreeMap<String, Value>,
    operands: Vec<String>,
}

impl ActionContext {
    /// Name of the command the action belongs to.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Looks a value up on the target node first, then along the path.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key).or_else(|| self.globals.get(key))
    }

    /// The target node's own resolved values.
    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    /// Values merged along the invocation path, leaf winning.
    pub fn globals(&self) -> &BTreeMap<String, Value> {
        &self.globals
    }

    /// Positional tokens that were not options or subcommands.
    pub fn operands(&self) -> &[String] {
        &self.operands
    }
}

/// Async action attached to a command node.
pub type ActionFn = Arc<dyn Fn(ActionContext) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// One level of a command hierarchy.
///
/// Nodes are created at configuration time and live for the process; the
/// classification tables built during a parse are per-invocation and are
/// never persisted.
///
/// # Examples
///
/// ```
/// use interactive_command_core::{Command, OptionSpec};
///
/// let program = Command::new("order")
///     .with_subcommand(
///         Command::new("sandwich")
///             .with_option(OptionSpec::new("-c, --cheese", "cheese"))
///             .with_option(
///                 OptionSpec::new("-s, --size <size>", "size")
///                     .with_choices(["small", "medium", "large"])
///                     .with_default("medium"),
///             ),
///     )
///     .interactive();
///
/// let sandwich = program.find_subcommand("sandwich").unwrap();
/// // cheese + size + the propagated --interactive flag
/// assert_eq!(sandwich.options().len(), 3);
/// ```
pub struct Command {
    name: String,
    description: Option<String>,
    version: Option<String>,
    options: Vec<OptionSpec>,
    subcommands: Vec<Command>,
    default_subcommand: Option<String>,
    values: BTreeMap<String, Value>,
    sources: BTreeMap<String, ValueSource>,
    interactive_key: Option<String>,
    hook_installed: bool,
    action: Option<ActionFn>,
    plugins: Vec<PluginRegistration>,
    prompter: Option<Arc<dyn Prompt>>,
}

impl Command {
    /// Creates a command node with the given name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            version: None,
            options: Vec::new(),
            subcommands: Vec::new(),
            default_subcommand: None,
            values: BTreeMap::new(),
            sources: BTreeMap::new(),
            interactive_key: None,
            hook_installed: false,
            action: None,
            plugins: Vec::new(),
            prompter: None,
        }
    }

    /// Sets the description shown in help output.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Declares a version string and a non-interactive `-V, --version` flag.
    ///
    /// The version option never prompts, even in interactive mode.
    pub fn with_version(mut self, version: &str) -> Self {
        if !self.options.iter().any(|o| o.key() == "version") {
            self.options.push(
                OptionSpec::new("-V, --version", "output the version number").non_interactive(),
            );
        }
        self.version = Some(version.to_string());
        self
    }

    /// Adds an option descriptor. Declaration order is meaningful: it is the
    /// order interactive resolution runs in.
    pub fn with_option(mut self, option: OptionSpec) -> Self {
        self.options.push(option);
        self
    }

    /// Adds an option descriptor in place (plugin form of [`with_option`]).
    ///
    /// [`with_option`]: Command::with_option
    pub fn add_option(&mut self, option: OptionSpec) {
        self.options.push(option);
    }

    /// Adds a child command.
    pub fn with_subcommand(mut self, subcommand: Command) -> Self {
        self.subcommands.push(subcommand);
        self
    }

    /// Adds a child command in place and returns it for further setup.
    pub fn add_subcommand(&mut self, subcommand: Command) -> &mut Command {
        let index = self.subcommands.len();
        self.subcommands.push(subcommand);
        &mut self.subcommands[index]
    }

    /// Adds a child command and makes it the default: it receives the
    /// invocation when no subcommand token matches.
    pub fn with_default_subcommand(mut self, subcommand: Command) -> Self {
        self.default_subcommand = Some(subcommand.name.clone());
        self.subcommands.push(subcommand);
        self
    }

    /// Marks an already-added child as the default by name.
    pub fn with_default_subcommand_name(mut self, name: &str) -> Self {
        self.default_subcommand = Some(name.to_string());
        self
    }

    /// Attaches the async action run when this command is the target.
    pub fn with_action<F, Fut>(mut self, action: F) -> Self
    where
        F: Fn(ActionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.action = Some(Arc::new(move |ctx| Box::pin(action(ctx))));
        self
    }

    /// Attaches the prompting backend used by built-in resolvers.
    ///
    /// Only meaningful on the root command.
    pub fn with_prompter(mut self, prompter: Arc<dyn Prompt>) -> Self {
        self.prompter = Some(prompter);
        self
    }

    /// Queues a synchronous plugin registration callback.
    pub fn with_plugin_fn<F>(mut self, plugin: F) -> Self
    where
        F: FnOnce(&mut Command) -> Result<()> + Send + 'static,
    {
        self.plugins.push(PluginRegistration::Sync(Box::new(plugin)));
        self
    }

    /// In-place form of [`with_plugin_fn`](Command::with_plugin_fn), usable
    /// from inside another plugin's registration.
    pub fn add_plugin_fn<F>(&mut self, plugin: F)
    where
        F: FnOnce(&mut Command) -> Result<()> + Send + 'static,
    {
        self.plugins.push(PluginRegistration::Sync(Box::new(plugin)));
    }

    /// Queues an asynchronous plugin registration callback.
    ///
    /// The callback borrows the root command for the duration of its future;
    /// plain `fn` items of the right shape coerce directly.
    pub fn with_plugin_async<F>(mut self, plugin: F) -> Self
    where
        F: for<'a> FnOnce(&'a mut Command) -> BoxFuture<'a, Result<()>> + Send + 'static,
    {
        self.plugins
            .push(PluginRegistration::Callback(Box::new(plugin)));
        self
    }

    /// Queues a [`CommandPlugin`] module.
    pub fn with_plugin<P: CommandPlugin + 'static>(mut self, plugin: P) -> Self {
        self.plugins
            .push(PluginRegistration::Module(Box::new(plugin)));
        self
    }

    /// Enables interactive mode with the default `-i, --interactive` flag.
    ///
    /// Recursive and idempotent; call it on the root after the subcommands
    /// are in place. Calling it again re-propagates the flag to descendants
    /// added since the previous call.
    pub fn interactive(self) -> Self {
        self.interactive_with("-i, --interactive", "interactive mode")
    }

    /// Enables interactive mode with custom flags, e.g.
    /// `"-I, --no-interactive"` for opt-out semantics (a negated flag with
    /// no default is implied `true`, so resolution is on unless disabled).
    pub fn interactive_with(mut self, flags: &str, description: &str) -> Self {
        self.enable_interactive(flags, description);
        self
    }

    /// In-place form of [`interactive_with`](Command::interactive_with).
    pub fn enable_interactive(&mut self, flags: &str, description: &str) {
        let option = OptionSpec::new(flags, description).non_interactive();
        let key = option.key().to_string();
        if !self.options.iter().any(|o| o.key() == key) {
            self.options.push(option);
        }
        self.interactive_key = Some(key);
        self.hook_installed = true;
        for subcommand in &mut self.subcommands {
            subcommand.enable_interactive(flags, description);
        }
    }

    /// Name of this command.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared options, in declaration order.
    pub fn options(&self) -> &[OptionSpec] {
        &self.options
    }

    /// Child commands, in declaration order.
    pub fn subcommands(&self) -> &[Command] {
        &self.subcommands
    }

    /// Finds a direct child by name.
    pub fn find_subcommand(&self, name: &str) -> Option<&Command> {
        self.subcommands.iter().find(|sub| sub.name == name)
    }

    /// Mutable form of [`find_subcommand`](Command::find_subcommand).
    pub fn find_subcommand_mut(&mut self, name: &str) -> Option<&mut Command> {
        self.subcommands.iter_mut().find(|sub| sub.name == name)
    }

    /// The attribute key of the interactive flag, once declared.
    pub fn interactive_key(&self) -> Option<&str> {
        self.interactive_key.as_deref()
    }

    /// Whether the resolution hook has been wired on this node.
    pub fn hook_installed(&self) -> bool {
        self.hook_installed
    }

    /// Live value for a canonical option key.
    pub fn get_value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Provenance of the live value, if any.
    pub fn get_source(&self, key: &str) -> Option<ValueSource> {
        self.sources.get(key).copied()
    }

    /// Injects a value programmatically before parsing.
    ///
    /// Values injected with any source other than [`ValueSource::Cli`] are
    /// still promptable: they become the prompt's current value instead of
    /// suppressing the prompt.
    pub fn set_value_with_source(&mut self, key: &str, value: Value, source: ValueSource) {
        self.values.insert(key.to_string(), value);
        self.sources.insert(key.to_string(), source);
    }

    /// Replaces the resolver of the first option with `key`.
    ///
    /// Returns `false` when no such option is declared. Configuration time
    /// only; resolvers are never swapped during resolution.
    pub fn set_resolver(&mut self, key: &str, slot: ResolverSlot) -> bool {
        match self.options.iter_mut().find(|o| o.key() == key) {
            Some(option) => {
                option.set_resolver(slot);
                true
            }
            None => false,
        }
    }

    /// The synchronous entry point is unsupported.
    ///
    /// Resolution awaits prompts, so parsing is inherently asynchronous;
    /// this always fails and directs callers to [`invoke`](Command::invoke).
    pub fn parse<I, S>(&mut self, _argv: I) -> Result<Outcome>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Err(CommandError::SyncParseUnsupported)
    }

    /// Parses `argv` (program name first, as in `std::env::args`), resolves
    /// missing options interactively when the interactive flag is on, and
    /// runs the target subcommand's action.
    pub async fn invoke<I, S>(&mut self, argv: I) -> Result<Outcome>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = argv.into_iter().map(Into::into).skip(1).collect();

        self.run_plugins().await?;
        if let Some(error) = validate::validate_command(self).into_iter().next() {
            return Err(error.into());
        }

        self.clear_parsed_values();

        let outcome = scan::scan(self, &tokens)?;
        let tables = preparse::classify(&outcome);
        self.apply_outcomes(&outcome);

        if outcome.version {
            if let Some(version) = &self.version {
                println!("{version}");
            }
            return Ok(Outcome::VersionDisplayed);
        }
        if let Some(help_path) = &outcome.help {
            print!("{}", self.node(help_path).render_help());
            return Ok(Outcome::HelpDisplayed);
        }

        if resolve::interactive_active(self, &outcome.target) {
            resolve::dispatch(self, &outcome, &tables).await?;
        } else {
            self.fail_on_missing(&outcome)?;
        }
        self.enforce_mandatory(&outcome)?;

        let action = self.node(&outcome.target).action.clone();
        match action {
            Some(action) => {
                let ctx = self.action_context(&outcome);
                action(ctx).await?;
                Ok(Outcome::Ran)
            }
            None => {
                print!("{}", self.node(&outcome.target).render_help());
                Ok(Outcome::HelpDisplayed)
            }
        }
    }

    /// Minimal usage dump for a node.
    pub fn render_help(&self) -> String {
        let mut out = format!("Usage: {}", self.name);
        if !self.options.is_empty() {
            out.push_str(" [options]");
        }
        if !self.subcommands.is_empty() {
            out.push_str(" [command]");
        }
        out.push('\n');
        if let Some(description) = &self.description {
            out.push('\n');
            out.push_str(description);
            out.push('\n');
        }
        if !self.options.is_empty() {
            out.push_str("\nOptions:\n");
            for option in &self.options {
                out.push_str(&format!("  {}  {}\n", option.flags(), option.description()));
            }
        }
        if !self.subcommands.is_empty() {
            out.push_str("\nCommands:\n");
            for sub in &self.subcommands {
                out.push_str(&format!(
                    "  {}  {}\n",
                    sub.name,
                    sub.description.as_deref().unwrap_or("")
                ));
            }
        }
        out
    }

    async fn run_plugins(&mut self) -> Result<()> {
        // Plugins may register further plugins; drain until quiescent.
        while !self.plugins.is_empty() {
            let batch: Vec<PluginRegistration> = self.plugins.drain(..).collect();
            debug!(count = batch.len(), "running plugin registrations");
            for registration in batch {
                match registration {
                    PluginRegistration::Sync(plugin) => plugin(self)?,
                    PluginRegistration::Callback(plugin) => plugin(self).await?,
                    PluginRegistration::Module(plugin) => plugin.register(self).await?,
                }
            }
        }
        Ok(())
    }

    /// Drops values left over from a previous invocation, keeping only
    /// config-injected ones.
    fn clear_parsed_values(&mut self) {
        let sources = std::mem::take(&mut self.sources);
        let mut values = std::mem::take(&mut self.values);
        for (key, source) in sources {
            if source == ValueSource::Config {
                self.sources.insert(key, source);
            } else {
                values.remove(&key);
            }
        }
        values.retain(|key, _| self.sources.contains_key(key));
        self.values = values;
        for subcommand in &mut self.subcommands {
            subcommand.clear_parsed_values();
        }
    }

    fn apply_outcomes(&mut self, outcome: &ScanOutcome) {
        for node_scan in &outcome.nodes {
            let node = self.node_mut(&node_scan.path);
            for (key, option_outcome) in &node_scan.outcomes {
                if let OptionOutcome::Supplied { value, source } = option_outcome {
                    if *source == ValueSource::Config {
                        // Already in the live store.
                        continue;
                    }
                    node.values.insert(key.clone(), value.clone());
                    node.sources.insert(key.clone(), *source);
                }
            }
        }
    }

    fn fail_on_missing(&self, outcome: &ScanOutcome) -> Result<()> {
        for node_scan in &outcome.nodes {
            let node = self.node(&node_scan.path);
            for (key, option_outcome) in &node_scan.outcomes {
                if *option_outcome == OptionOutcome::MissingRequired {
                    return Err(CommandError::MissingMandatoryOption(
                        node.required_flags(key),
                    ));
                }
            }
        }
        Ok(())
    }

    fn enforce_mandatory(&self, outcome: &ScanOutcome) -> Result<()> {
        for node_scan in &outcome.nodes {
            let node = self.node(&node_scan.path);
            for (key, _) in &node_scan.outcomes {
                if node.key_is_required(key) && !node.values.contains_key(key) {
                    return Err(CommandError::MissingMandatoryOption(
                        node.required_flags(key),
                    ));
                }
            }
        }
        Ok(())
    }

    fn action_context(&self, outcome: &ScanOutcome) -> ActionContext {
        let target = self.node(&outcome.target);
        let mut globals = BTreeMap::new();
        for depth in 0..=outcome.target.len() {
            let node = self.node(&outcome.target[..depth]);
            for (key, value) in &node.values {
                globals.insert(key.clone(), value.clone());
            }
        }
        ActionContext {
            command: target.name.clone(),
            values: target.values.clone(),
            globals,
            operands: outcome.operands.clone(),
        }
    }

    fn required_flags(&self, key: &str) -> String {
        self.options
            .iter()
            .find(|o| o.key() == key && o.is_required())
            .or_else(|| self.options.iter().find(|o| o.key() == key))
            .map(|o| o.flags().to_string())
            .unwrap_or_else(|| key.to_string())
    }

    pub(crate) fn node(&self, path: &[usize]) -> &Command {
        path.iter().fold(self, |node, &index| &node.subcommands[index])
    }

    pub(crate) fn node_mut(&mut self, path: &[usize]) -> &mut Command {
        path.iter()
            .fold(self, |node, &index| &mut node.subcommands[index])
    }

    pub(crate) fn child_index(&self, name: &str) -> Option<usize> {
        self.subcommands.iter().position(|sub| sub.name == name)
    }

    pub(crate) fn has_subcommands(&self) -> bool {
        !self.subcommands.is_empty()
    }

    pub(crate) fn has_action(&self) -> bool {
        self.action.is_some()
    }

    pub(crate) fn default_child_index(&self) -> Option<usize> {
        let name = self.default_subcommand.as_deref()?;
        self.child_index(name)
    }

    pub(crate) fn default_subcommand_name(&self) -> Option<&str> {
        self.default_subcommand.as_deref()
    }

    pub(crate) fn version_text(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub(crate) fn prompter(&self) -> Option<Arc<dyn Prompt>> {
        self.prompter.clone()
    }

    pub(crate) fn values_snapshot(&self) -> BTreeMap<String, Value> {
        self.values.clone()
    }

    pub(crate) fn store_value(&mut self, key: &str, value: Value, source: ValueSource) {
        self.values.insert(key.to_string(), value);
        self.sources.insert(key.to_string(), source);
    }

    pub(crate) fn clear_value(&mut self, key: &str) {
        self.values.remove(key);
        self.sources.remove(key);
    }

    /// Canonical option keys in declaration order, deduplicated (a negated
    /// counterpart shares its positive flag's key).
    pub(crate) fn unique_option_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for option in &self.options {
            let key = option.key();
            if !keys.iter().any(|k| k == key) {
                keys.push(key.to_string());
            }
        }
        keys
    }

    pub(crate) fn first_spec(&self, key: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|o| o.key() == key)
    }

    pub(crate) fn key_is_required(&self, key: &str) -> bool {
        self.options
            .iter()
            .any(|o| o.key() == key && o.is_required())
    }

    /// Effective default for a key: the first explicit default wins; a key
    /// declared only through negated flags is implied `true`.
    pub(crate) fn effective_default(&self, key: &str) -> Option<Value> {
        let mut any = false;
        let mut any_positive = false;
        for option in self.options.iter().filter(|o| o.key() == key) {
            if let Some(default) = option.default_value() {
                return Some(default.clone());
            }
            any = true;
            if !option.is_negated() {
                any_positive = true;
            }
        }
        if any && !any_positive {
            Some(Value::Bool(true))
        } else {
            None
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("options", &self.options)
            .field("subcommands", &self.subcommands)
            .field("values", &self.values)
            .field("interactive_key", &self.interactive_key)
            .field("hook_installed", &self.hook_installed)
            .finish()
    }
}
