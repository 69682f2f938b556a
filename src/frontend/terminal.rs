//! Interactive terminal frontend.

use super::{AssetPrompt, CommandOutput, Frontend, Selection};
use crate::config::Elevation;
use anyhow::{Context, Result};
use async_trait::async_trait;
use colored::Colorize;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input};
use tokio::process::Command;
use tracing::debug;

/// Frontend for a terminal session.
///
/// Messages are colored, prompts use `dialoguer`, and privileged commands go
/// through the configured elevation helper.
#[derive(Debug, Clone)]
pub struct TerminalFrontend {
    elevation: Elevation,
}

impl TerminalFrontend {
    #[must_use]
    pub const fn new(elevation: Elevation) -> Self {
        Self { elevation }
    }
}

impl Default for TerminalFrontend {
    fn default() -> Self {
        Self::new(Elevation::Sudo)
    }
}

/// Parse an answer to the asset prompt.
///
/// `1..=len` picks an entry, `a` asks for all assets (only when `can_show_all`),
/// `q` cancels.
fn parse_selection(input: &str, len: usize, can_show_all: bool) -> Result<Selection, String> {
    let answer = input.trim().to_ascii_lowercase();
    match answer.as_str() {
        "q" | "quit" => Ok(Selection::Cancelled),
        "a" | "all" if can_show_all => Ok(Selection::ShowAll),
        _ => match answer.parse::<usize>() {
            Ok(n) if (1..=len).contains(&n) => Ok(Selection::Chosen(n - 1)),
            _ if can_show_all => Err(format!("Enter a number from 1 to {len}, 'a' for all assets, or 'q' to cancel")),
            _ => Err(format!("Enter a number from 1 to {len}, or 'q' to cancel")),
        },
    }
}

async fn run(mut command: Command) -> Result<CommandOutput> {
    debug!("Running {:?}", command.as_std());
    let output = command
        .output()
        .await
        .with_context(|| format!("Failed to start {:?}", command.as_std().get_program()))?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    Ok(CommandOutput {
        success: output.status.success(),
        output: combined,
    })
}

#[async_trait]
impl Frontend for TerminalFrontend {
    fn status(&self, message: &str) {
        println!("{} {}", "::".blue().bold(), message);
    }

    fn success(&self, message: &str) {
        println!("{} {}", "✓".green().bold(), message.green());
    }

    fn error(&self, message: &str) {
        eprintln!("{} {}", "error:".red().bold(), message);
    }

    fn info(&self, message: &str) {
        println!("{message}");
    }

    fn warn(&self, message: &str) {
        eprintln!("{} {}", "warning:".yellow().bold(), message);
    }

    async fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(default)
            .interact()
            .context("Failed to read confirmation")
    }

    async fn select_asset(&self, prompt: AssetPrompt<'_>) -> Result<Selection> {
        let can_show_all = prompt.others.is_none();
        println!("{} {}", "Assets of".bold(), prompt.package.cyan());
        print!("{prompt}");

        let hint = if can_show_all {
            format!("Select an asset [1-{}], 'a' for all assets, 'q' to cancel", prompt.len())
        } else {
            format!("Select an asset [1-{}], 'q' to cancel", prompt.len())
        };
        let len = prompt.len();

        let answer: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt(hint)
            .validate_with(|input: &String| parse_selection(input, len, can_show_all).map(|_| ()))
            .interact_text()
            .context("Failed to read asset selection")?;

        parse_selection(&answer, len, can_show_all).map_err(|e| anyhow::anyhow!(e))
    }

    async fn run_command(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        let mut command = Command::new(program);
        command.args(args);
        run(command).await
    }

    async fn run_privileged(
        &self,
        prompt: &str,
        program: &str,
        args: &[String],
    ) -> Result<CommandOutput> {
        if self.elevation == Elevation::Pkexec {
            self.info(prompt);
        }
        let mut command = Command::new(self.elevation.program());
        command.args(self.elevation.prefix_args(&format!("[get] {prompt}")));
        command.arg(program);
        command.args(args);
        run(command).await
    }
}
