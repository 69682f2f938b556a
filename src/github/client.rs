//! HTTP release source backed by the GitHub REST API.

use super::{Asset, Release, ReleaseSource};
use crate::config::GlobalConfig;
use crate::constants::{GITHUB_TOKEN_ENV, RELEASES_PAGE_SIZE, SNIFF_LEN};
use crate::core::GetError;
use crate::utils::progress::ProgressBar;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, RANGE};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::debug;

const API_ACCEPT: &str = "application/vnd.github+json";

/// GitHub API client.
///
/// Authenticates with `GITHUB_TOKEN` when it is set, which raises the API rate
/// limit and gives access to private repositories.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    api_url: String,
    token: Option<String>,
    sniff_timeout: Duration,
}

impl GithubClient {
    /// Create a client for the given API base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(api_url: impl Into<String>, token: Option<String>, sniff_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("get/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
            sniff_timeout,
        })
    }

    /// Client configured from the user's configuration and `GITHUB_TOKEN`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn from_config(config: &GlobalConfig) -> Result<Self> {
        Self::new(
            config.github_api_url.clone(),
            std::env::var(GITHUB_TOKEN_ENV).ok(),
            Duration::from_secs(config.sniff_timeout_secs),
        )
    }

    fn releases_url(&self, package: &str) -> String {
        format!("{}/repos/{package}/releases", self.api_url)
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self.http.get(url);
        match &self.token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {token}")),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, operation: &str) -> Result<T> {
        debug!("GET {}", url);
        let network_failure = |reason: String| GetError::NetworkFailure {
            operation: operation.to_string(),
            reason,
        };

        let response = self
            .request(url)
            .header(ACCEPT, API_ACCEPT)
            .send()
            .await
            .map_err(|e| network_failure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let reason = if status == reqwest::StatusCode::NOT_FOUND {
                "not found (HTTP 404)".to_string()
            } else {
                format!("GitHub API returned HTTP {status}")
            };
            return Err(network_failure(reason).into());
        }

        response
            .json::<T>()
            .await
            .map_err(|e| network_failure(format!("invalid response: {e}")).into())
    }
}

#[async_trait]
impl ReleaseSource for GithubClient {
    async fn latest_release(&self, package: &str, tag_prefix: Option<&str>) -> Result<Release> {
        let operation = format!("fetching the latest release of {package}");

        match tag_prefix.filter(|p| !p.is_empty()) {
            None => {
                let url = format!("{}/latest", self.releases_url(package));
                self.get_json(&url, &operation).await
            }
            Some(prefix) => {
                let url = format!("{}?per_page={RELEASES_PAGE_SIZE}", self.releases_url(package));
                let releases: Vec<Release> = self.get_json(&url, &operation).await?;
                // GitHub lists releases newest first
                releases
                    .into_iter()
                    .find(|release| release.tag_name.starts_with(prefix))
                    .ok_or_else(|| {
                        anyhow::anyhow!("No release of {package} has a tag starting with '{prefix}'")
                    })
            }
        }
    }

    async fn release_by_tag(&self, package: &str, tag: &str) -> Result<Release> {
        let url = format!("{}/tags/{tag}", self.releases_url(package));
        self.get_json(&url, &format!("fetching release {tag} of {package}")).await
    }

    async fn download(&self, asset: &Asset, dest: &Path) -> Result<()> {
        let download_failed = |reason: String| GetError::DownloadFailed {
            asset: asset.name.clone(),
            reason,
        };

        debug!("Downloading {} to {}", asset.browser_download_url, dest.display());
        let mut response = self
            .request(&asset.browser_download_url)
            .header(ACCEPT, "application/octet-stream")
            .send()
            .await
            .map_err(|e| download_failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(download_failed(format!("HTTP {}", response.status())).into());
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .with_context(|| format!("Failed to create file: {}", dest.display()))?;
        let progress = ProgressBar::new_download(response.content_length(), &asset.name);

        while let Some(chunk) = response.chunk().await.map_err(|e| download_failed(e.to_string()))? {
            file.write_all(&chunk)
                .await
                .with_context(|| format!("Error writing to {}", dest.display()))?;
            progress.inc(chunk.len() as u64);
        }

        file.flush()
            .await
            .with_context(|| format!("Failed to flush download to: {}", dest.display()))?;
        progress.finish_and_clear();
        Ok(())
    }

    async fn sniff(&self, asset: &Asset) -> Option<Vec<u8>> {
        let result = async {
            let response = self
                .request(&asset.browser_download_url)
                .header(RANGE, format!("bytes=0-{}", SNIFF_LEN - 1))
                .timeout(self.sniff_timeout)
                .send()
                .await?
                .error_for_status()?;
            response.bytes().await
        }
        .await;

        match result {
            Ok(bytes) if !bytes.is_empty() => {
                Some(bytes[..bytes.len().min(SNIFF_LEN)].to_vec())
            }
            Ok(_) => None,
            Err(e) => {
                debug!("Could not sniff {}: {}", asset.name, e);
                None
            }
        }
    }
}
