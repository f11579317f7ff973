//! Local cache for the model artifact, filled from a remote URL on first use.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::{ForestModel, ModelError};

/// Connect and per-read deadline for the artifact download.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Model artifact cached at a fixed local path.
///
/// The presence of the file is the only cache-hit signal: once it exists it
/// is used as-is, with no checksum and no refresh.
pub struct ModelCache {
    client: reqwest::Client,
    url: String,
    path: PathBuf,
}

impl ModelCache {
    pub fn new(url: impl Into<String>, path: impl Into<PathBuf>) -> Result<Self, ModelError> {
        let client = reqwest::Client::builder()
            .connect_timeout(DOWNLOAD_TIMEOUT)
            .read_timeout(DOWNLOAD_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            path: path.into(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether the artifact file exists on disk right now.
    pub fn is_cached(&self) -> bool {
        self.path.exists()
    }

    /// Make sure the artifact is on disk, downloading it if absent.
    pub async fn ensure_available(&self) -> Result<PathBuf, ModelError> {
        if self.is_cached() {
            info!(path = %self.path.display(), "using cached model");
            return Ok(self.path.clone());
        }

        info!(url = %self.url, path = %self.path.display(), "downloading model");
        let bytes = self.download().await?;
        info!(bytes, path = %self.path.display(), "model download complete");
        Ok(self.path.clone())
    }

    /// Ensure the artifact is available and deserialize it.
    pub async fn load_predictor(&self) -> Result<ForestModel, ModelError> {
        let path = self.ensure_available().await?;
        let bytes = tokio::fs::read(&path).await?;
        let model = ForestModel::from_slice(&bytes)?;
        info!(
            trees = model.tree_count(),
            width = model.width(),
            target = ?model.target(),
            "loaded price model"
        );
        Ok(model)
    }

    /// Stream the artifact into a `.part` sibling, then rename it into place.
    async fn download(&self) -> Result<u64, ModelError> {
        let resp = self.client.get(&self.url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ModelError::Download {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let part = partial_path(&self.path);
        let written = match write_body(resp, &part).await {
            Ok(n) => n,
            Err(e) => {
                let _ = tokio::fs::remove_file(&part).await;
                return Err(e);
            }
        };
        tokio::fs::rename(&part, &self.path).await?;
        Ok(written)
    }
}

async fn write_body(resp: reqwest::Response, dest: &Path) -> Result<u64, ModelError> {
    let mut file = tokio::fs::File::create(dest).await?;
    let mut stream = resp.bytes_stream();
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    file.sync_all().await?;
    Ok(written)
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}
