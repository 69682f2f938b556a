//! Configuration management for get
//!
//! get has two layers of configuration:
//!
//! 1. **Global Configuration** (`~/.config/get/config.toml`) - user settings such as
//!    the metadata location, binary directory, and elevation helper
//! 2. **Engine Configuration** - the explicit value handed to the engine for one
//!    invocation, combining the global file with command-line flags
//!
//! # Modules
//!
//! - `global` - Loading and saving the TOML configuration file
//! - `engine` - Per-invocation engine settings

mod engine;
mod global;

pub use engine::EngineConfig;
pub use global::{Elevation, GlobalConfig};
