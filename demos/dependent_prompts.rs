//! Dependent prompts.
//!
//! Resolution is strictly sequential, so a later option's resolver can read
//! answers already given in the same run. Here the billing-address prompt
//! defaults to whatever the shipping-address prompt just produced, by
//! adjusting the context and delegating back to the built-in strategy.
//!
//! ```bash
//! cargo run -p interactive-command-demos --example dependent_prompts -- order -i
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use interactive_command_core::{
    Command, OptionSpec, ResolveContext, Resolver, Result, Value, default_resolve,
};
use interactive_command_term::TermPrompt;
use tracing_subscriber::EnvFilter;

/// Prefills the prompt with the shipping address resolved just before it.
struct SameAsShipping;

#[async_trait]
impl Resolver for SameAsShipping {
    async fn resolve(&self, ctx: ResolveContext<'_>) -> Result<Option<Value>> {
        let ResolveContext {
            current,
            option,
            values,
            prompter,
        } = ctx;
        let current = current.or_else(|| values.get("shipping-address").cloned());
        default_resolve(ResolveContext {
            current,
            option,
            values,
            prompter,
        })
        .await
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let order = Command::new("order")
        .with_option(
            OptionSpec::new("-a, --shipping-address <address>", "shipping address").required(),
        )
        .with_option(
            OptionSpec::new("-b, --billing-address <address>", "billing address")
                .with_resolver(SameAsShipping)
                .required(),
        )
        .with_action(|ctx| async move {
            println!(
                "Options: {}",
                serde_json::to_string_pretty(ctx.values()).unwrap_or_default()
            );
            Ok(())
        });

    let mut program = Command::new("shop")
        .with_subcommand(order)
        .with_prompter(Arc::new(TermPrompt::new()))
        .interactive();

    if let Err(error) = program.invoke(std::env::args()).await {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
