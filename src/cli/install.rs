//! Install a package from a GitHub release.

use crate::manager::{InstallOutcome, PackageManager};
use anyhow::Result;
use clap::Args;
use colored::Colorize;

/// Arguments of `get install`.
///
/// # Examples
///
/// ```bash
/// get install https://github.com/sharkdp/bat
/// get install sharkdp/bat --release v0.24.0
/// get install owner/monorepo --tag-prefix auth-
/// ```
#[derive(Args, Debug)]
pub struct InstallCommand {
    /// GitHub repository URL or `owner/repo`.
    #[arg(value_name = "REPO")]
    pub package: String,

    /// Install this release tag instead of the latest release.
    #[arg(short, long, value_name = "TAG")]
    pub release: Option<String>,

    /// Only consider releases whose tag starts with this prefix.
    ///
    /// The prefix is remembered and used by every later update check, for
    /// repositories that publish several products from one release list.
    #[arg(short, long, value_name = "PREFIX")]
    pub tag_prefix: Option<String>,
}

impl InstallCommand {
    pub async fn execute(self, manager: &PackageManager) -> Result<()> {
        let outcome = manager
            .install(&self.package, self.release.as_deref(), self.tag_prefix.as_deref())
            .await?;

        match outcome {
            InstallOutcome::Installed(report) => println!(
                "{} {} {} ({})",
                "Installed".green().bold(),
                report.package,
                report.version,
                report.artifact
            ),
            InstallOutcome::Cancelled => println!("{}", "Installation cancelled".yellow()),
        }
        Ok(())
    }
}
