//! Core types for get
//!
//! This module holds the error taxonomy shared by every part of the package
//! lifecycle engine.
//!
//! - [`GetError`] - strongly-typed failures, each install-path error tagged with
//!   the [`InstallStage`] it happened in
//! - [`RollbackOutcome`] - how far the system was restored after a metadata write failed
//! - [`ErrorContext`] / [`user_friendly_error`] - colored, actionable CLI rendering

pub mod error;

pub use error::{ErrorContext, GetError, InstallStage, RollbackOutcome, user_friendly_error};
