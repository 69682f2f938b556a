//! Scripted frontend with an emulated package tool.
//!
//! Prompt answers come from queues set up by the test. Commands are not run:
//! `dpkg`, `dpkg-deb` and `apt-get` are emulated against an in-memory package
//! database, and `install`, `mv` and `rm` act on the real filesystem so tests
//! can point the binary directory at a temporary directory.

use crate::frontend::{AssetPrompt, CommandOutput, Frontend, Selection};
use anyhow::{Result, bail};
use async_trait::async_trait;
use std::collections::{BTreeSet, VecDeque};
use std::path::Path;
use std::sync::Mutex;

#[derive(Default)]
struct State {
    confirmations: VecDeque<bool>,
    selections: VecDeque<Selection>,
    prompts: Vec<Vec<String>>,
    questions: Vec<String>,
    messages: Vec<String>,
    warnings: Vec<String>,
    commands: Vec<String>,
    failing: Vec<String>,
    installed: BTreeSet<String>,
    /// Unpacked by a failed `dpkg -i`, configured by `apt-get install -f`.
    unconfigured: BTreeSet<String>,
    /// Removed with their configuration files left behind.
    config_files: BTreeSet<String>,
    /// Output of a `dpkg -i` that fails for a reason other than dependencies.
    dpkg_install_error: Option<String>,
    /// `apt-get install -f` removes unconfigured packages instead of
    /// configuring them.
    fix_removes: bool,
}

/// Frontend for tests.
#[derive(Default)]
pub struct ScriptedFrontend {
    state: Mutex<State>,
}

impl ScriptedFrontend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers to yes/no questions, in order. When they run out, the
    /// question's default is used.
    #[must_use]
    pub fn with_confirmations(self, answers: impl IntoIterator<Item = bool>) -> Self {
        self.state.lock().unwrap().confirmations.extend(answers);
        self
    }

    /// Answers to asset prompts, in order. Running out is an error.
    #[must_use]
    pub fn with_selections(self, answers: impl IntoIterator<Item = Selection>) -> Self {
        self.state.lock().unwrap().selections.extend(answers);
        self
    }

    /// Make every command whose line starts with `prefix` fail.
    #[must_use]
    pub fn with_failing_command(self, prefix: &str) -> Self {
        self.state.lock().unwrap().failing.push(prefix.to_string());
        self
    }

    /// Pretend `apt_name` is already installed.
    #[must_use]
    pub fn with_installed_deb(self, apt_name: &str) -> Self {
        self.state.lock().unwrap().installed.insert(apt_name.to_string());
        self
    }

    /// Make `dpkg -i` fail with `output` without touching the package database.
    #[must_use]
    pub fn with_dpkg_install_error(self, output: &str) -> Self {
        self.state.lock().unwrap().dpkg_install_error = Some(output.to_string());
        self
    }

    /// Make `apt-get install -f` resolve broken packages by removing them,
    /// leaving only their configuration files.
    #[must_use]
    pub fn with_fix_pass_removing_packages(self) -> Self {
        self.state.lock().unwrap().fix_removes = true;
        self
    }

    /// Entries of every asset prompt shown.
    pub fn prompts(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().prompts.clone()
    }

    /// Every yes/no question asked.
    pub fn questions(&self) -> Vec<String> {
        self.state.lock().unwrap().questions.clone()
    }

    /// Status, success, error and info messages.
    pub fn messages(&self) -> Vec<String> {
        self.state.lock().unwrap().messages.clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.state.lock().unwrap().warnings.clone()
    }

    /// Every command line run, privileged or not.
    pub fn commands(&self) -> Vec<String> {
        self.state.lock().unwrap().commands.clone()
    }

    /// Packages the emulated dpkg has installed.
    pub fn installed_debs(&self) -> Vec<String> {
        self.state.lock().unwrap().installed.iter().cloned().collect()
    }

    fn record(&self, message: &str) {
        self.state.lock().unwrap().messages.push(message.to_string());
    }

    fn execute(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        let line = std::iter::once(program.to_string())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        let mut state = self.state.lock().unwrap();
        state.commands.push(line.clone());

        let failing = state.failing.iter().any(|prefix| line.starts_with(prefix.as_str()));
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        match (program, args.as_slice()) {
            ("dpkg-deb", ["--info", file]) => {
                let valid = std::fs::read(file).is_ok_and(|bytes| bytes.starts_with(b"!<arch>\n"));
                Ok(if valid && !failing {
                    CommandOutput::ok(" new Debian package, version 2.0.\n")
                } else {
                    CommandOutput::failed(format!("dpkg-deb: error: '{file}' is not a Debian format archive\n"))
                })
            }
            ("dpkg-deb", ["--field", file, "Package"]) => Ok(match package_field(file) {
                Some(name) if !failing => CommandOutput::ok(format!("{name}\n")),
                _ => CommandOutput::failed("dpkg-deb: error: field not found\n"),
            }),
            ("dpkg", ["-i", file]) => {
                if let Some(output) = &state.dpkg_install_error {
                    return Ok(CommandOutput::failed(output.clone()));
                }
                let Some(name) = package_field(file) else {
                    return Ok(CommandOutput::failed("dpkg: error processing archive\n"));
                };
                if failing {
                    state.unconfigured.insert(name.clone());
                    return Ok(CommandOutput::failed(format!(
                        "dpkg: dependency problems prevent configuration of {name}\n"
                    )));
                }
                state.installed.insert(name.clone());
                Ok(CommandOutput::ok(format!("Setting up {name} ...\n")))
            }
            ("dpkg", ["-s", name]) => Ok(if state.installed.contains(*name) {
                CommandOutput::ok(format!("Package: {name}\nStatus: install ok installed\n"))
            } else if state.config_files.contains(*name) {
                CommandOutput::ok(format!("Package: {name}\nStatus: deinstall ok config-files\n"))
            } else {
                CommandOutput::failed(format!("dpkg-query: package '{name}' is not installed\n"))
            }),
            ("dpkg", ["--remove", name]) | ("apt-get", ["remove", "-y", name]) => {
                if failing || !state.installed.remove(*name) {
                    return Ok(CommandOutput::failed(format!("E: Unable to remove {name}\n")));
                }
                Ok(CommandOutput::ok(format!("Removing {name} ...\n")))
            }
            ("apt-get", ["install", "-f", "-y"]) => {
                if failing {
                    return Ok(CommandOutput::failed("E: Unmet dependencies.\n"));
                }
                let broken = std::mem::take(&mut state.unconfigured);
                if state.fix_removes {
                    state.config_files.extend(broken);
                    return Ok(CommandOutput::ok("0 upgraded, 0 newly installed, 1 to remove\n"));
                }
                state.installed.extend(broken);
                Ok(CommandOutput::ok("0 upgraded, 1 newly installed\n"))
            }
            ("install", ["-m", mode, src, dst]) => {
                if failing {
                    return Ok(CommandOutput::failed(format!("install: cannot create '{dst}': Text file busy\n")));
                }
                std::fs::copy(src, dst)?;
                crate::utils::fs::set_mode(Path::new(dst), u32::from_str_radix(mode, 8)?)?;
                Ok(CommandOutput::ok(""))
            }
            ("mv", [from, to]) => {
                if failing {
                    return Ok(CommandOutput::failed("mv: cannot move: Permission denied\n"));
                }
                Ok(match std::fs::rename(from, to) {
                    Ok(()) => CommandOutput::ok(""),
                    Err(e) => CommandOutput::failed(format!("mv: {e}\n")),
                })
            }
            ("rm", ["-f", path]) => {
                if failing {
                    return Ok(CommandOutput::failed(format!("rm: cannot remove '{path}'\n")));
                }
                Ok(match std::fs::remove_file(path) {
                    Ok(()) => CommandOutput::ok(""),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => CommandOutput::ok(""),
                    Err(e) => CommandOutput::failed(format!("rm: {e}\n")),
                })
            }
            _ => bail!("Scripted frontend cannot run `{line}`"),
        }
    }
}

/// The `Package:` field written by [`deb_bytes`](super::deb_bytes).
fn package_field(file: &str) -> Option<String> {
    let bytes = std::fs::read(file).ok()?;
    let text = String::from_utf8_lossy(&bytes);
    text.lines()
        .find_map(|line| line.strip_prefix("Package: "))
        .map(|name| name.trim().to_string())
}

#[async_trait]
impl Frontend for ScriptedFrontend {
    fn status(&self, message: &str) {
        self.record(message);
    }

    fn success(&self, message: &str) {
        self.record(message);
    }

    fn error(&self, message: &str) {
        self.record(message);
    }

    fn info(&self, message: &str) {
        self.record(message);
    }

    fn warn(&self, message: &str) {
        self.state.lock().unwrap().warnings.push(message.to_string());
    }

    async fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        state.questions.push(prompt.to_string());
        Ok(state.confirmations.pop_front().unwrap_or(default))
    }

    async fn select_asset(&self, prompt: AssetPrompt<'_>) -> Result<Selection> {
        let mut state = self.state.lock().unwrap();
        state.prompts.push(prompt.entries());
        match state.selections.pop_front() {
            Some(selection) => Ok(selection),
            None => bail!("No scripted answer for asset prompt of {}", prompt.package),
        }
    }

    async fn run_command(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        self.execute(program, args)
    }

    async fn run_privileged(
        &self,
        _prompt: &str,
        program: &str,
        args: &[String],
    ) -> Result<CommandOutput> {
        self.execute(program, args)
    }
}
