//! Integration test suite for get
//!
//! End-to-end tests of the package lifecycle engine and the `get` binary.
//! Engine tests drive [`PackageManager`](get_cli::manager::PackageManager) with
//! the fake release source and scripted frontend from `get_cli::test_utils`;
//! CLI tests run the binary with an isolated configuration file.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **cli**: Command-line surface, configuration and error rendering
//! - **lifecycle**: install, update scan, upgrade and remove in sequence
//! - **rollback**: Metadata failures after the system was changed
//! - **self_upgrade**: Replacing the running executable

mod cli;
mod lifecycle;
mod rollback;
mod self_upgrade;

use get_cli::config::EngineConfig;
use get_cli::manager::PackageManager;
use get_cli::test_utils::{FakeReleaseSource, ScriptedFrontend};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// A package manager over fakes, with its metadata and binaries in a temp dir.
pub struct TestEnv {
    pub temp: TempDir,
    pub source: Arc<FakeReleaseSource>,
    pub frontend: Arc<ScriptedFrontend>,
    pub manager: PackageManager,
}

impl TestEnv {
    pub fn new(frontend: ScriptedFrontend) -> Self {
        Self::with_config(frontend, |config| config)
    }

    pub fn with_config(frontend: ScriptedFrontend, adjust: impl FnOnce(EngineConfig) -> EngineConfig) -> Self {
        get_cli::test_utils::init_test_logging(None);
        let temp = TempDir::new().unwrap();
        let bin_dir = temp.path().join("bin");
        std::fs::create_dir_all(&bin_dir).unwrap();
        let config = adjust(EngineConfig::new(temp.path().join("share/get/get.json"), &bin_dir));
        let source = Arc::new(FakeReleaseSource::new());
        let frontend = Arc::new(frontend);
        let manager = PackageManager::new(source.clone(), frontend.clone(), config);
        Self {
            temp,
            source,
            frontend,
            manager,
        }
    }

    pub fn bin_dir(&self) -> &Path {
        &self.manager.config().bin_dir
    }
}
