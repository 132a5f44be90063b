//! Extending the command tree with plugins.
//!
//! Registrations queue up at configuration time and are drained right before
//! parsing starts, so a plugin-added subcommand is routable in the same
//! invocation. Both plain callbacks and reusable plugin modules work.
//!
//! ```bash
//! cargo run -p interactive-command-demos --example plugin -- hello
//! cargo run -p interactive-command-demos --example plugin -- goodbye
//! ```

use async_trait::async_trait;
use interactive_command_core::{Command, CommandPlugin, Result};
use tracing_subscriber::EnvFilter;

/// A reusable plugin module with an async registration step.
struct GoodbyePlugin;

#[async_trait]
impl CommandPlugin for GoodbyePlugin {
    async fn register(&self, root: &mut Command) -> Result<()> {
        tokio::task::yield_now().await;
        root.add_subcommand(
            Command::new("goodbye")
                .with_description("Say goodbye")
                .with_action(|_ctx| async {
                    println!("Goodbye!");
                    Ok(())
                }),
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut program = Command::new("greeter")
        .with_plugin_fn(|root| {
            root.add_subcommand(
                Command::new("hello")
                    .with_description("Say hello")
                    .with_action(|_ctx| async {
                        println!("Hello World!");
                        Ok(())
                    }),
            );
            Ok(())
        })
        .with_plugin(GoodbyePlugin);

    if let Err(error) = program.invoke(std::env::args()).await {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
