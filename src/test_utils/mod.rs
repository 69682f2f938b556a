//! Test utilities for get
//!
//! Fakes for the two collaborator seams of the engine and builders for the data
//! that flows through them:
//!
//! - [`FakeReleaseSource`] - releases and asset bodies published by the test
//! - [`ScriptedFrontend`] - queued prompt answers and an emulated package tool
//! - [`fixtures`] - assets, releases, and bytes that sniff as packages,
//!   executables and archives
//!
//! # Example
//!
//! ```rust,no_run
//! use get_cli::test_utils::{FakeReleaseSource, ScriptedFrontend, deb_bytes};
//!
//! let source = FakeReleaseSource::new();
//! source.publish("owner/tool", "v1.0.0", vec![("tool_1.0.0_amd64.deb", deb_bytes("tool"))]);
//! let frontend = ScriptedFrontend::new().with_confirmations([true]);
//! ```

pub mod fixtures;
pub mod frontend;
pub mod source;

pub use fixtures::{asset, deb_bytes, elf_bytes, release, tar_gz_bytes, zip_bytes};
pub use frontend::ScriptedFrontend;
pub use source::FakeReleaseSource;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` if given, otherwise
/// `RUST_LOG`; with neither, logging stays off.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
