//! GitHub releases: data types, the release-source seam, and the HTTP client.
//!
//! The engine never talks to GitHub directly. It is handed an
//! `Arc<dyn ReleaseSource>`, which is [`GithubClient`] in the binary and a fake
//! in tests.

pub mod client;

pub use client::GithubClient;

use crate::core::GetError;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A single downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub name: String,
    pub browser_download_url: String,
    /// Size in bytes as reported by GitHub.
    #[serde(default)]
    pub size: u64,
    /// Uploader-provided content type; often just `application/octet-stream`.
    #[serde(default)]
    pub content_type: Option<String>,
}

/// A published release of a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    /// RFC 3339 publish timestamp; drafts have none.
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// Where releases come from.
///
/// Implementations are consulted strictly one call at a time; the engine never
/// issues concurrent requests.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// The newest release of `package`.
    ///
    /// With a tag prefix, the newest release whose tag starts with the prefix.
    async fn latest_release(&self, package: &str, tag_prefix: Option<&str>) -> Result<Release>;

    /// The release of `package` tagged exactly `tag`.
    async fn release_by_tag(&self, package: &str, tag: &str) -> Result<Release>;

    /// Download the full asset body to `dest`.
    async fn download(&self, asset: &Asset, dest: &Path) -> Result<()>;

    /// The leading bytes of the asset body, or `None` if they cannot be fetched.
    async fn sniff(&self, asset: &Asset) -> Option<Vec<u8>>;
}

/// Normalize a GitHub URL or `owner/repo` string into a package identifier.
///
/// Accepts `https://github.com/owner/repo`, `http://...`, `github.com/owner/repo`,
/// with an optional trailing `/` or `.git`, and plain `owner/repo`.
///
/// # Examples
///
/// ```rust
/// use get_cli::github::parse_package_id;
///
/// assert_eq!(parse_package_id("https://github.com/cli/cli.git").unwrap(), "cli/cli");
/// assert_eq!(parse_package_id("sharkdp/bat").unwrap(), "sharkdp/bat");
/// assert!(parse_package_id("just-a-name").is_err());
/// ```
///
/// # Errors
///
/// Returns [`GetError::InvalidPackageId`] unless exactly two non-empty path
/// segments remain.
pub fn parse_package_id(input: &str) -> Result<String, GetError> {
    let trimmed = input.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    let without_host = without_scheme
        .strip_prefix("www.github.com/")
        .or_else(|| without_scheme.strip_prefix("github.com/"))
        .unwrap_or(without_scheme);
    let path = without_host.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);

    let valid_segment =
        |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || "-_.".contains(c));

    match path.split_once('/') {
        Some((owner, repo)) if valid_segment(owner) && valid_segment(repo) => {
            Ok(format!("{owner}/{repo}"))
        }
        _ => Err(GetError::InvalidPackageId {
            input: input.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_package_id_forms() {
        for input in [
            "owner/repo",
            "github.com/owner/repo",
            "https://github.com/owner/repo",
            "http://github.com/owner/repo",
            "https://github.com/owner/repo/",
            "https://github.com/owner/repo.git",
            "  owner/repo  ",
        ] {
            assert_eq!(parse_package_id(input).unwrap(), "owner/repo", "input: {input}");
        }
    }

    #[test]
    fn test_parse_package_id_rejects() {
        for input in ["", "repo", "owner/", "/repo", "owner/repo/releases", "https://gitlab.com/a/b"] {
            assert!(
                matches!(parse_package_id(input), Err(GetError::InvalidPackageId { .. })),
                "input: {input}"
            );
        }
    }

    #[test]
    fn test_release_deserializes_github_payload() {
        let json = r#"{
            "tag_name": "v2.40.0",
            "name": "GitHub CLI 2.40.0",
            "published_at": "2023-12-07T17:47:19Z",
            "draft": false,
            "assets": [
                {
                    "name": "gh_2.40.0_linux_amd64.deb",
                    "browser_download_url": "https://github.com/cli/cli/releases/download/v2.40.0/gh_2.40.0_linux_amd64.deb",
                    "size": 12345,
                    "content_type": "application/x-debian-package",
                    "download_count": 7
                }
            ]
        }"#;

        let release: Release = serde_json::from_str(json).unwrap();
        assert_eq!(release.tag_name, "v2.40.0");
        assert_eq!(release.published_at.as_deref(), Some("2023-12-07T17:47:19Z"));
        assert_eq!(release.assets.len(), 1);
        assert_eq!(release.assets[0].size, 12345);
    }
}
