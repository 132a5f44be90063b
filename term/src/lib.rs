//! Terminal prompt backend built on `dialoguer`.
//!
//! `dialoguer` prompts block on terminal input, so every prompt runs on a
//! blocking thread via `tokio::task::spawn_blocking`; the engine's resolution
//! queue awaits each answer before moving to the next option, which keeps the
//! one-prompt-at-a-time contract intact.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use interactive_command_core::Command;
//! use interactive_command_term::TermPrompt;
//!
//! let program = Command::new("order")
//!     .with_prompter(Arc::new(TermPrompt::new()))
//!     .interactive();
//! ```

use async_trait::async_trait;
use dialoguer::{Confirm, Input, Select};
use tracing::debug;

use interactive_command_core::{CommandError, Prompt, Result, ValidateFn};

/// A [`Prompt`] implementation that renders on the controlling terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TermPrompt;

impl TermPrompt {
    pub fn new() -> Self {
        Self
    }
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CommandError::Prompt(e.to_string()))?
}

#[async_trait]
impl Prompt for TermPrompt {
    async fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        let message = message.to_string();
        debug!(prompt = %message, "confirmation");
        blocking(move || {
            Confirm::new()
                .with_prompt(message)
                .default(default)
                .interact()
                .map_err(|e| CommandError::Prompt(e.to_string()))
        })
        .await
    }

    async fn select(&self, message: &str, choices: &[String]) -> Result<String> {
        let message = message.to_string();
        let choices = choices.to_vec();
        debug!(prompt = %message, choices = choices.len(), "selection");
        blocking(move || {
            let index = Select::new()
                .with_prompt(message)
                .items(&choices)
                .default(0)
                .interact()
                .map_err(|e| CommandError::Prompt(e.to_string()))?;
            Ok(choices[index].clone())
        })
        .await
    }

    async fn input(
        &self,
        message: &str,
        default: Option<String>,
        validate: ValidateFn,
    ) -> Result<String> {
        let message = message.to_string();
        debug!(prompt = %message, "free-text input");
        blocking(move || {
            let mut prompt = Input::<String>::new()
                .with_prompt(message)
                .allow_empty(true)
                .validate_with(move |line: &String| validate(line.as_str()));
            if let Some(default) = default {
                prompt = prompt.default(default);
            }
            prompt
                .interact_text()
                .map_err(|e| CommandError::Prompt(e.to_string()))
        })
        .await
    }
}
