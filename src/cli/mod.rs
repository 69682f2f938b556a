//! Command-line interface for get.
//!
//! Each subcommand lives in its own module with a `clap` argument struct and an
//! `execute` method that drives the [`PackageManager`].
//!
//! # Available Commands
//!
//! - `install` - Install a package from a GitHub release
//! - `list` - List installed packages
//! - `remove` - Uninstall a package
//! - `update` - Check installed packages for newer releases
//! - `upgrade` - Apply pending updates
//! - `update-upgrade` (`up`) - `update` followed by `upgrade`
//!
//! # Examples
//!
//! ```bash
//! get install https://github.com/cli/cli
//! get install owner/monorepo --tag-prefix auth-
//! get update
//! get upgrade --yes
//! get -v up
//! ```
//!
//! # Configuration
//!
//! The configuration file is read from `$GET_CONFIG_PATH` or
//! `~/.config/get/config.toml`; see [`GlobalConfig`].

mod install;
mod list;
mod remove;
mod update;
mod update_upgrade;
mod upgrade;

use crate::config::{EngineConfig, GlobalConfig};
use crate::frontend::TerminalFrontend;
use crate::github::GithubClient;
use crate::manager::PackageManager;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Main CLI structure for get.
#[derive(Parser, Debug)]
#[command(
    name = "get",
    about = "Install and upgrade packages from GitHub releases",
    version,
    long_about = "get installs .deb packages, standalone binaries and archives published as GitHub release assets, and keeps them up to date."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show each step and debug logging.
    ///
    /// `RUST_LOG`, when set, takes precedence for log filtering.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Install a package from its latest release.
    Install(install::InstallCommand),

    /// List installed packages.
    List(list::ListCommand),

    /// Uninstall a package.
    Remove(remove::RemoveCommand),

    /// Check installed packages for newer releases.
    ///
    /// Newer releases are recorded as pending updates; nothing is installed.
    Update(update::UpdateCommand),

    /// Install pending updates.
    Upgrade(upgrade::UpgradeCommand),

    /// Check for updates, then install them.
    #[command(alias = "up")]
    UpdateUpgrade(update_upgrade::UpdateUpgradeCommand),
}

impl Commands {
    /// Whether automatically matched assets are accepted without asking.
    fn assume_yes(&self) -> bool {
        match self {
            Self::Upgrade(cmd) => cmd.yes,
            Self::UpdateUpgrade(cmd) => cmd.yes,
            _ => false,
        }
    }
}

impl Cli {
    /// Execute the selected command with the user's configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or the command fails.
    pub async fn execute(self) -> Result<()> {
        init_logging(self.verbose);
        let global = GlobalConfig::load().await?;
        self.execute_with_config(global).await
    }

    /// Execute the selected command with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the GitHub client cannot be built or the command fails.
    pub async fn execute_with_config(self, global: GlobalConfig) -> Result<()> {
        let config = EngineConfig::from_global(&global)
            .with_verbose(self.verbose)
            .with_assume_yes(self.command.assume_yes());
        let source = Arc::new(GithubClient::from_config(&global)?);
        let frontend = Arc::new(TerminalFrontend::new(global.elevation));
        let manager = PackageManager::new(source, frontend, config);

        match self.command {
            Commands::Install(cmd) => cmd.execute(&manager).await,
            Commands::List(cmd) => cmd.execute(&manager),
            Commands::Remove(cmd) => cmd.execute(&manager).await,
            Commands::Update(cmd) => cmd.execute(&manager).await,
            Commands::Upgrade(cmd) => cmd.execute(&manager).await,
            Commands::UpdateUpgrade(cmd) => cmd.execute(&manager).await,
        }
    }
}

/// Log filter directive for the given verbosity, unless `RUST_LOG` overrides it.
fn default_directive(verbose: bool) -> &'static str {
    if verbose { "get_cli=debug" } else { "warn" }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins; otherwise `--verbose` selects debug logging and the
/// default is warnings only. Logs go to stderr so they never mix with listings.
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
