//! Opt-out interactive mode.
//!
//! Declaring the interactive flag through a negated form makes resolution on
//! by default; passing `-I` (or `--no-interactive`) turns it off and missing
//! options keep their defaults or fail as usual.
//!
//! ```bash
//! cargo run -p interactive-command-demos --example no_interactive -- hello
//! cargo run -p interactive-command-demos --example no_interactive -- hello -I
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
        .with_option(OptionSpec::new("-n, --name <name>", "your name"))
        .with_action(|ctx| async move {
            match ctx.get("name") {
                Some(name) => println!("Hello {name}!"),
                None => println!("Hello!"),
            }
            Ok(())
        });

    let mut program = Command::new("greeter")
        .with_subcommand(hello)
        .with_prompter(Arc::new(TermPrompt::new()))
        .interactive_with("-I, --no-interactive", "disable interactive mode");

    if let Err(error) = program.invoke(std::env::args()).await {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
