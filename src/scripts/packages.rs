//! Package references declared with `#nuget`

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Default package feed (flat container layout)
pub const DEFAULT_FEED_URL: &str = "https://api.nuget.org/v3-flatcontainer";

/// Errors raised while resolving packages
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("NuGet package '{name}' version '{version}' was not found")]
    NotFound { name: String, version: String },

    #[error("Failed to download package '{name}': {message}")]
    Download { name: String, message: String },

    #[error("Failed to store package '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Installs packages into a local cache
#[async_trait]
pub trait PackageHandler: Send + Sync {
    /// Make `name`@`version` available; returns where it was installed
    async fn fetch(&self, name: &str, version: &str) -> Result<PathBuf, PackageError>;
}

/// Downloads `.nupkg` files from a flat-container feed, skipping cached ones
#[derive(Debug, Clone)]
pub struct NuGetPackageHandler {
    cache_dir: PathBuf,
    feed_url: String,
    client: reqwest::Client,
}

impl NuGetPackageHandler {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            feed_url: DEFAULT_FEED_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Cache under the user's cache directory
    pub fn with_default_cache() -> Self {
        Self::new(default_cache_dir())
    }

    pub fn with_feed_url(mut self, feed_url: impl Into<String>) -> Self {
        self.feed_url = feed_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Where a package file lives in the cache.
    ///
    /// Names and versions that are not plain package identifiers are
    /// rejected so they cannot point outside the cache.
    pub fn package_path(&self, name: &str, version: &str) -> Result<PathBuf, PackageError> {
        if !is_package_token(name) || !is_package_token(version) {
            return Err(PackageError::NotFound {
                name: name.to_string(),
                version: version.to_string(),
            });
        }
        let id = name.to_lowercase();
        let version = version.to_lowercase();
        Ok(self
            .cache_dir
            .join(&id)
            .join(&version)
            .join(format!("{}.{}.nupkg", id, version)))
    }
}

fn is_package_token(token: &str) -> bool {
    !token.is_empty()
        && !token.starts_with('.')
        && !token.contains("..")
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '+'))
}

/// `<user cache>/tpie/packages`, falling back to the temp folder
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("tpie")
        .join("packages")
}

#[async_trait]
impl PackageHandler for NuGetPackageHandler {
    async fn fetch(&self, name: &str, version: &str) -> Result<PathBuf, PackageError> {
        let target = self.package_path(name, version)?;
        if target.is_file() {
            debug!("Package {} {} is already cached", name, version);
            return Ok(target);
        }

        let id = name.to_lowercase();
        let lower_version = version.to_lowercase();
        let url = format!(
            "{}/{}/{}/{}.{}.nupkg",
            self.feed_url, id, lower_version, id, lower_version
        );
        info!("Downloading package {} {}", name, version);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PackageError::Download {
                name: name.to_string(),
                message: e.to_string(),
            })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(PackageError::NotFound {
                name: name.to_string(),
                version: version.to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(PackageError::Download {
                name: name.to_string(),
                message: format!("feed returned status {}", response.status()),
            });
        }

        let bytes = response.bytes().await.map_err(|e| PackageError::Download {
            name: name.to_string(),
            message: e.to_string(),
        })?;

        let io_error = |source| PackageError::Io {
            name: name.to_string(),
            source,
        };
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }
        tokio::fs::write(&target, &bytes).await.map_err(io_error)?;

        Ok(target)
    }
}
