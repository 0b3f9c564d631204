use async_trait::async_trait;
use reqwest::Client;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Hex characters of the URL digest used as the local file stem
const FILE_STEM_LEN: usize = 32;

/// Longest extension (dot included) taken from an image URL
const MAX_EXTENSION_LEN: usize = 5;

const DEFAULT_EXTENSION: &str = ".png";

/// Per-image download timeout
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Turns an embedded asset URL into something the exported document can use
#[async_trait]
pub trait AssetSink: Send + Sync {
    /// Returns a local relative path for `url`, or `url` itself on any failure
    async fn materialize(&self, url: &str) -> String;
}

#[derive(Debug, Error)]
enum DownloadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Downloads course images into `<course-dir>/images/`
///
/// Files are named after a digest of their URL, so the same image embedded in
/// several pages is stored once and a rerun does not download it again.
#[derive(Debug, Clone)]
pub struct ImageDownloader {
    client: Client,
    images_dir: PathBuf,
    token: String,
}

impl ImageDownloader {
    /// Creates a downloader writing into `images_dir`, created on first use
    pub fn new(client: Client, images_dir: impl Into<PathBuf>, token: impl Into<String>) -> Self {
        Self {
            client,
            images_dir: images_dir.into(),
            token: token.into(),
        }
    }

    async fn download(&self, url: &Url, path: &Path) -> Result<(), DownloadError> {
        let response = self
            .client
            .get(url.clone())
            .bearer_auth(&self.token)
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        tokio::fs::create_dir_all(&self.images_dir).await?;
        tokio::fs::write(path, &bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl AssetSink for ImageDownloader {
    async fn materialize(&self, url: &str) -> String {
        let parsed = match Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => parsed,
            // Relative and data URLs stay as they are
            _ => return url.to_string(),
        };

        let file_name = local_file_name(&parsed);
        let path = self.images_dir.join(&file_name);
        let relative = format!("images/{}", file_name);

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::trace!("Image already downloaded: {}", relative);
            return relative;
        }

        match self.download(&parsed, &path).await {
            Ok(()) => {
                tracing::debug!("Downloaded image {} -> {}", url, relative);
                relative
            }
            Err(e) => {
                tracing::warn!("Failed to download image {}: {}", url, e);
                url.to_string()
            }
        }
    }
}

/// Local file name for an image URL: digest prefix plus the URL's extension
///
/// The extension falls back to `.png` when the path has none or it looks
/// like something other than a file extension.
pub fn local_file_name(url: &Url) -> String {
    let digest = hex::encode(Sha256::digest(url.as_str().as_bytes()));
    let stem = &digest[..FILE_STEM_LEN];

    let extension = Path::new(url.path())
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .filter(|e| e.len() <= MAX_EXTENSION_LEN)
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());

    format!("{}{}", stem, extension)
}
