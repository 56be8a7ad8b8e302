//! Resume artifact provisioning.
//!
//! The flow driver only asks for a local path; where the file comes from
//! (already on disk, or fetched once from a configured URL) is this
//! module's concern.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("resume not found at {0} and no remote source configured")]
    Missing(PathBuf),
    #[error("resume download failed: {0}")]
    Download(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Supplies the resume file the application flow uploads.
#[async_trait]
pub trait ResumeProvider: Send + Sync {
    async fn ensure_available(&self) -> Result<PathBuf, ArtifactError>;
}

/// Local file provider with a lazy one-time remote fetch when the file is
/// absent.
pub struct LocalResumeProvider {
    path: PathBuf,
    remote_url: Option<String>,
    http: reqwest::Client,
}

impl LocalResumeProvider {
    pub fn new(path: impl Into<PathBuf>, remote_url: Option<String>) -> Self {
        Self {
            path: path.into(),
            remote_url,
            http: reqwest::Client::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ResumeProvider for LocalResumeProvider {
    async fn ensure_available(&self) -> Result<PathBuf, ArtifactError> {
        if tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(self.path.clone());
        }

        let Some(url) = self.remote_url.as_deref() else {
            return Err(ArtifactError::Missing(self.path.clone()));
        };

        info!(%url, path = %self.path.display(), "fetching resume");
        let bytes = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.path, &bytes).await?;

        Ok(self.path.clone())
    }
}
