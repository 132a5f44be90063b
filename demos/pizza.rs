//! The full option-shape tour.
//!
//! Shows a required flag that would normally fail fast but is prompted for
//! in interactive mode, an option with its resolver disabled, a mandatory
//! choice selection, and a custom resolver that answers without prompting.
//!
//! ```bash
//! cargo run -p interactive-command-demos --example pizza -- pizza
//! cargo run -p interactive-command-demos --example pizza -- pizza -i
//! cargo run -p interactive-command-demos --example pizza -- pizza -i --count 2 --no-cheese
//! cargo run -p interactive-command-demos --example pizza -- pizza -i --name "John Doe"
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use interactive_command_core::{
    Command, OptionSpec, ResolveContext, Resolver, Result, Value,
};
use interactive_command_term::TermPrompt;
use tracing_subscriber::EnvFilter;

/// Answers the name question without opening a prompt.
struct FixedName;

#[async_trait]
impl Resolver for FixedName {
    async fn resolve(&self, ctx: ResolveContext<'_>) -> Result<Option<Value>> {
        Ok(Some(ctx.current.unwrap_or(Value::Str("world".into()))))
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let pizza = Command::new("pizza")
        .with_option(OptionSpec::new("-d, --drink", "drink"))
        .with_option(OptionSpec::new("-o, --olive-oil", "olive oil").required())
        .with_option(OptionSpec::new("-c, --cheese", "cheese"))
        .with_option(OptionSpec::new("-C, --no-cheese", "no cheese"))
        .with_option(
            OptionSpec::new("-n, --count <number>", "number of pizzas")
                .with_parser(|raw| {
                    raw.parse::<i64>()
                        .map(Value::Int)
                        .map_err(|_| format!("'{raw}' is not a number"))
                })
                .with_default(1i64),
        )
        .with_option(
            OptionSpec::new("--non-interactive-option <value>", "non-interactive option")
                .non_interactive()
                .with_default("default value"),
        )
        .with_option(
            OptionSpec::new("-s, --size <size>", "size")
                .with_choices(["small", "medium", "large"])
                .with_default("medium")
                .required(),
        )
        .with_option(
            OptionSpec::new("-m, --name <string>", "your name")
                .with_resolver(FixedName)
                .required(),
        )
        .with_action(|ctx| async move {
            println!(
                "Options: {}",
                serde_json::to_string_pretty(ctx.values()).unwrap_or_default()
            );
            Ok(())
        });

    let mut program = Command::new("pizzeria")
        .with_subcommand(pizza)
        .with_prompter(Arc::new(TermPrompt::new()))
        .interactive_with("-i, --interactive", "interactive mode");

    if let Err(error) = program.invoke(std::env::args()).await {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
