//! Version comparison for release tags.
//!
//! Release tags on GitHub are loosely formatted (`v1.2.3`, `1.2`, `v2.0.0-rc1`,
//! `auth-v1.0.0`). This module maps them to a single integer key so two releases
//! can be ordered without a full semantic-version parser.
//!
//! # Algorithm
//!
//! 1. Trim every leading and trailing character that is neither an ASCII digit nor `.`
//! 2. Cut the string at the first `-` or `+` (pre-release and build metadata)
//! 3. Split on `.` and keep at most the first three components
//! 4. Combine as `major * 10000 + minor * 100 + patch`, missing components being 0
//!
//! # Known limitations
//!
//! - Pre-release tags order equal to their final release: `1.0.0-beta` and `1.0.0`
//!   share a key, so a published pre-release is never reported as newer than or
//!   older than the matching final release.
//! - Minor and patch components are assumed to be below 100. `1.100.0` produces
//!   the same key as `2.0.0`; such versions order incorrectly.
//!
//! # Examples
//!
//! ```rust
//! use get_cli::version::comparison::VersionComparator;
//!
//! # fn example() -> anyhow::Result<()> {
//! assert_eq!(VersionComparator::to_ordered_key("v1.2.3")?, 10203);
//! assert!(VersionComparator::is_newer("v1.3.0", "1.2.9")?);
//! assert!(!VersionComparator::is_newer("v1.0.0-beta.1", "1.0.0")?);
//! # Ok(())
//! # }
//! ```

use crate::core::GetError;

/// Number of version components that take part in ordering.
const ORDERED_COMPONENTS: usize = 3;

/// Weights of major, minor and patch in the ordering key.
const COMPONENT_WEIGHTS: [u64; ORDERED_COMPONENTS] = [10_000, 100, 1];

/// Version comparison utilities for release tags.
pub struct VersionComparator;

impl VersionComparator {
    /// Map a version string to its ordering key.
    ///
    /// # Errors
    ///
    /// Returns [`GetError::InvalidVersionFormat`] when nothing numeric remains after
    /// trimming, or when one of the first three components is not a number.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use get_cli::version::comparison::VersionComparator;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// assert_eq!(VersionComparator::to_ordered_key("2")?, 20000);
    /// assert_eq!(VersionComparator::to_ordered_key("v0.4")?, 400);
    /// # Ok(())
    /// # }
    /// ```
    pub fn to_ordered_key(version: &str) -> Result<u64, GetError> {
        let invalid = |reason: String| GetError::InvalidVersionFormat {
            version: version.to_string(),
            reason,
        };

        let trimmed = version.trim_matches(|c: char| c != '.' && !c.is_ascii_digit());
        let core = trimmed.split(['-', '+']).next().unwrap_or_default();

        if core.trim_matches('.').is_empty() {
            return Err(invalid("no numeric component".to_string()));
        }

        let mut key = 0u64;
        for (part, weight) in core.split('.').zip(COMPONENT_WEIGHTS) {
            // "1..2" keeps the empty component as 0
            if part.is_empty() {
                continue;
            }
            let number: u64 = part
                .parse()
                .map_err(|_| invalid(format!("component '{part}' is not a number")))?;
            key = number
                .checked_mul(weight)
                .and_then(|weighted| key.checked_add(weighted))
                .ok_or_else(|| invalid(format!("component '{part}' is too large")))?;
        }

        Ok(key)
    }

    /// Whether `candidate` orders strictly after `current`.
    ///
    /// # Errors
    ///
    /// Returns [`GetError::InvalidVersionFormat`] if either string cannot be ordered.
    pub fn is_newer(candidate: &str, current: &str) -> Result<bool, GetError> {
        Ok(Self::to_ordered_key(candidate)? > Self::to_ordered_key(current)?)
    }

    /// The version recorded for a release tag.
    ///
    /// Strips the package's tag prefix (if the tag carries it) and then a single
    /// leading `v`: `v1.2.0` becomes `1.2.0`, `auth-v1.0.0` with prefix `auth-`
    /// becomes `1.0.0`.
    #[must_use]
    pub fn normalize_tag(tag: &str, tag_prefix: Option<&str>) -> String {
        let without_prefix = match tag_prefix {
            Some(prefix) if !prefix.is_empty() => tag.strip_prefix(prefix).unwrap_or(tag),
            _ => tag,
        };
        without_prefix.strip_prefix('v').unwrap_or(without_prefix).to_string()
    }
}
