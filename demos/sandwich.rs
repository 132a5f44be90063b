//! Basic interactive option resolution.
//!
//! A nested `order sandwich` command with a mix of flag shapes: a plain
//! boolean, a parsed number with a default, a negatable boolean pair, and a
//! choice-restricted value. With `-i`, every option not typed on the command
//! line is prompted for, one at a time, in declaration order.
//!
//! ```bash
//! cargo run -p interactive-command-demos --example sandwich -- order sandwich
//! cargo run -p interactive-command-demos --example sandwich -- order sandwich -i
//! cargo run -p interactive-command-demos --example sandwich -- order sandwich -i --count 2
//! cargo run -p interactive-command-demos --example sandwich -- order sandwich -i --no-cheese
//! ```

use std::sync::Arc;

use interactive_command_core::{Command, OptionSpec, Value};
use interactive_command_term::TermPrompt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let sandwich = Command::new("sandwich")
        .with_option(OptionSpec::new("-d, --drink", "drink"))
        .with_option(
            OptionSpec::new("-n, --count <number>", "number of sandwiches")
                .with_parser(|raw| {
                    raw.parse::<i64>()
                        .map(Value::Int)
                        .map_err(|_| format!("'{raw}' is not a number"))
                })
                .with_default(1i64),
        )
        .with_option(OptionSpec::new("-c, --cheese", "cheese"))
        .with_option(OptionSpec::new("-C, --no-cheese", "no cheese"))
        .with_option(
            OptionSpec::new("-s, --size <size>", "size")
                .with_choices(["small", "medium", "large"])
                .with_default("medium"),
        )
        .with_action(|ctx| async move {
            println!(
                "Options: {}",
                serde_json::to_string_pretty(ctx.values()).unwrap_or_default()
            );
            Ok(())
        });

    let mut program = Command::new("sandwich-shop")
        .with_subcommand(Command::new("order").with_subcommand(sandwich))
        .with_prompter(Arc::new(TermPrompt::new()))
        .interactive();

    if let Err(error) = program.invoke(std::env::args()).await {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
