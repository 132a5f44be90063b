//! Default subcommand routing.
//!
//! The `hello` subcommand is marked as the default, so flags and bare tokens
//! that the root cannot place fall through to it. `greeter -n John` behaves
//! exactly like `greeter hello -n John`.
//!
//! ```bash
//! cargo run -p interactive-command-demos --example default_subcommand
//! cargo run -p interactive-command-demos --example default_subcommand -- -n John
//! cargo run -p interactive-command-demos --example default_subcommand -- -i
//! ```

use std::sync::Arc;

use interactive_command_core::{Command, OptionSpec};
use interactive_command_term::TermPrompt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let hello = Command::new("hello")
        .with_option(OptionSpec::new("-n, --name <name>", "your name").required())
        .with_action(|ctx| async move {
            if let Some(name) = ctx.get("name") {
                println!("Hello {name}!");
            }
            Ok(())
        });

    let mut program = Command::new("greeter")
        .with_default_subcommand(hello)
        .with_prompter(Arc::new(TermPrompt::new()))
        .interactive();

    if let Err(error) = program.invoke(std::env::args()).await {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
