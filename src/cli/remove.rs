//! Uninstall a package.

use crate::manager::PackageManager;
use anyhow::Result;
use clap::Args;
use colored::Colorize;

/// Arguments of `get remove`.
#[derive(Args, Debug)]
pub struct RemoveCommand {
    /// Installed package, as `owner/repo` or its GitHub URL.
    #[arg(value_name = "PACKAGE")]
    pub package: String,
}

impl RemoveCommand {
    pub async fn execute(self, manager: &PackageManager) -> Result<()> {
        let record = manager.remove(&self.package).await?;
        println!("{} {} {}", "Removed".green().bold(), self.package, record.version);
        Ok(())
    }
}
