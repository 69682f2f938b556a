//! Version handling for release tags.
//!
//! get never parses full semantic versions. A release tag is reduced to an integer
//! ordering key (see [`comparison`]) and the recorded version of an installed
//! package is the tag with its tag prefix and leading `v` removed.
//!
//! # Module Organization
//!
//! - [`comparison`] - Ordering keys and tag normalization

pub mod comparison;

pub use comparison::VersionComparator;
