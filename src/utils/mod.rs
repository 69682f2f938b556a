//! Utilities shared by the engine
//!
//! # Modules
//!
//! - [`fs`] - Atomic writes, directory creation, and local file sniffing
//! - [`archive`] - Extraction of zip, tar, tar.gz and gz assets
//! - [`progress`] - Progress bars and spinners for downloads and long steps

pub mod archive;
pub mod fs;
pub mod progress;

pub use fs::{atomic_write, ensure_dir};
pub use progress::{ProgressBar, ProgressStyle};
