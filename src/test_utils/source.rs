//! In-memory release source.

use super::fixtures::FAKE_PUBLISHED_AT;
use crate::constants::SNIFF_LEN;
use crate::core::GetError;
use crate::github::{Asset, Release, ReleaseSource};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Mutex;

#[derive(Default)]
struct State {
    /// Releases per package, oldest first.
    releases: HashMap<String, Vec<Release>>,
    /// Asset bodies by download URL.
    bodies: HashMap<String, Vec<u8>>,
    unreachable: BTreeSet<String>,
    fail_downloads: bool,
    downloads: Vec<String>,
}

/// Release source serving releases published in the test.
///
/// The newest published release is the latest one.
#[derive(Default)]
pub struct FakeReleaseSource {
    state: Mutex<State>,
}

impl FakeReleaseSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a release of `package` with the given asset bodies.
    pub fn publish(&self, package: &str, tag: &str, assets: Vec<(&str, Vec<u8>)>) -> Release {
        let mut state = self.state.lock().unwrap();
        let mut release = Release {
            tag_name: tag.to_string(),
            name: Some(tag.to_string()),
            published_at: Some(FAKE_PUBLISHED_AT.to_string()),
            assets: Vec::new(),
        };
        for (name, body) in assets {
            let url = format!("https://example.invalid/{package}/releases/download/{tag}/{name}");
            release.assets.push(Asset {
                name: name.to_string(),
                browser_download_url: url.clone(),
                size: body.len() as u64,
                content_type: None,
            });
            state.bodies.insert(url, body);
        }
        state.releases.entry(package.to_string()).or_default().push(release.clone());
        release
    }

    /// Make every lookup for `package` fail as if GitHub were unreachable.
    pub fn make_unreachable(&self, package: &str) {
        self.state.lock().unwrap().unreachable.insert(package.to_string());
    }

    pub fn fail_downloads(&self) {
        self.state.lock().unwrap().fail_downloads = true;
    }

    /// Names of the assets downloaded so far.
    pub fn downloads(&self) -> Vec<String> {
        self.state.lock().unwrap().downloads.clone()
    }

    fn releases(&self, package: &str) -> Result<Vec<Release>> {
        let state = self.state.lock().unwrap();
        if state.unreachable.contains(package) {
            return Err(GetError::NetworkFailure {
                operation: format!("fetch releases of {package}"),
                reason: "connection refused".to_string(),
            }
            .into());
        }
        Ok(state.releases.get(package).cloned().unwrap_or_default())
    }

    fn not_found(package: &str, what: &str) -> anyhow::Error {
        GetError::NetworkFailure {
            operation: format!("fetch {what} of {package}"),
            reason: "not found (HTTP 404)".to_string(),
        }
        .into()
    }
}

#[async_trait]
impl ReleaseSource for FakeReleaseSource {
    async fn latest_release(&self, package: &str, tag_prefix: Option<&str>) -> Result<Release> {
        self.releases(package)?
            .into_iter()
            .rev()
            .find(|release| tag_prefix.is_none_or(|prefix| release.tag_name.starts_with(prefix)))
            .ok_or_else(|| Self::not_found(package, "latest release"))
    }

    async fn release_by_tag(&self, package: &str, tag: &str) -> Result<Release> {
        self.releases(package)?
            .into_iter()
            .find(|release| release.tag_name == tag)
            .ok_or_else(|| Self::not_found(package, &format!("release {tag}")))
    }

    async fn download(&self, asset: &Asset, dest: &Path) -> Result<()> {
        let body = {
            let mut state = self.state.lock().unwrap();
            state.downloads.push(asset.name.clone());
            if state.fail_downloads {
                None
            } else {
                state.bodies.get(&asset.browser_download_url).cloned()
            }
        };
        let Some(body) = body else {
            return Err(GetError::DownloadFailed {
                asset: asset.name.clone(),
                reason: "HTTP 404".to_string(),
            }
            .into());
        };
        std::fs::write(dest, body)?;
        Ok(())
    }

    async fn sniff(&self, asset: &Asset) -> Option<Vec<u8>> {
        let state = self.state.lock().unwrap();
        state
            .bodies
            .get(&asset.browser_download_url)
            .map(|body| body[..body.len().min(SNIFF_LEN)].to_vec())
    }
}
