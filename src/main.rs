//! get CLI entry point
//!
//! Parses the command line, runs the command, and renders errors with
//! context and suggestions.

use anyhow::Result;
use clap::Parser;
use get_cli::cli;
use get_cli::core::error::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
