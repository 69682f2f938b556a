//! The user-facing capability interface of the engine.
//!
//! Everything the engine needs from its surroundings besides releases goes
//! through [`Frontend`]: notifications, confirmation, the asset prompt, and
//! running (elevated) commands. The engine never branches on which frontend is
//! active; the terminal frontend elevates with `sudo`, a graphical one with
//! `pkexec`, and tests use a scripted fake.

pub mod terminal;

pub use terminal::TerminalFrontend;

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;

/// Outcome of a finished command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    /// Whether the command exited with status 0.
    pub success: bool,
    /// Combined stdout and stderr.
    pub output: String,
}

impl CommandOutput {
    #[must_use]
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    #[must_use]
    pub fn failed(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
        }
    }
}

/// Answer to the asset prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// 0-based index into the concatenated lists that were shown.
    Chosen(usize),
    /// Show the assets that are neither packages nor executables as well.
    ShowAll,
    /// The user backed out.
    Cancelled,
}

/// The asset lists offered by one prompt, in display order.
#[derive(Debug, Clone, Copy)]
pub struct AssetPrompt<'a> {
    pub package: &'a str,
    pub debs: &'a [String],
    pub binaries: &'a [String],
    /// `None` until the user asks for all assets.
    pub others: Option<&'a [String]>,
}

impl AssetPrompt<'_> {
    /// Labelled entries, numbered from 1 by the frontends.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        let tagged = |tag: &'static str, names: &[String]| {
            names.iter().map(move |name| format!("[{tag}] {name}")).collect::<Vec<_>>()
        };
        let mut entries = tagged("deb", self.debs);
        entries.extend(tagged("bin", self.binaries));
        if let Some(others) = self.others {
            entries.extend(tagged("other", others));
        }
        entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.debs.len() + self.binaries.len() + self.others.map_or(0, <[String]>::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for AssetPrompt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries().iter().enumerate() {
            writeln!(f, "  {:>2}) {entry}", i + 1)?;
        }
        Ok(())
    }
}

/// Presentation and side-effect capabilities used by the engine.
#[async_trait]
pub trait Frontend: Send + Sync {
    /// Progress of a step ("Downloading gh_2.40.0_amd64.deb").
    fn status(&self, message: &str);

    fn success(&self, message: &str);

    fn error(&self, message: &str);

    fn info(&self, message: &str);

    /// Non-fatal problem.
    fn warn(&self, message: &str);

    /// Ask a yes/no question.
    async fn confirm(&self, prompt: &str, default: bool) -> Result<bool>;

    /// Ask the user to pick an asset.
    async fn select_asset(&self, prompt: AssetPrompt<'_>) -> Result<Selection>;

    /// Run an unprivileged command to completion.
    ///
    /// An `Err` means the command could not be started; a non-zero exit is
    /// reported through [`CommandOutput::success`].
    async fn run_command(&self, program: &str, args: &[String]) -> Result<CommandOutput>;

    /// Run a command with elevated privileges, showing `prompt` as the reason.
    async fn run_privileged(
        &self,
        prompt: &str,
        program: &str,
        args: &[String],
    ) -> Result<CommandOutput>;
}
