//! Streaming HTTP downloads of remote assets.

use futures_util::StreamExt;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use url::Url;

use rmix_models::Asset;

use crate::error::{MediaError, MediaResult};

/// Budget for connecting and for each read; a body that keeps arriving
/// is never cut off.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Downloads remote assets into local files.
#[derive(Debug, Clone)]
pub struct AssetFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl AssetFetcher {
    pub fn new(timeout: Duration) -> MediaResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .user_agent(concat!("rmix/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MediaError::download_failed("<client>", e.to_string()))?;
        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Download an [`Asset`] to its local path.
    pub async fn fetch_asset(&self, asset: &Asset) -> MediaResult<u64> {
        self.fetch(&asset.source_url, &asset.local_path).await
    }

    /// Stream `url` into `dest`, returning the number of bytes written.
    ///
    /// Only http and https URLs are accepted. On any failure the partial
    /// file is removed.
    pub async fn fetch(&self, url: &str, dest: impl AsRef<Path>) -> MediaResult<u64> {
        let dest = dest.as_ref();
        let parsed = validate_url(url)?;

        let result = self.stream_to_file(parsed, url, dest).await;
        match &result {
            Ok(bytes) => {
                metrics::counter!("rmix_fetch_bytes_total").increment(*bytes);
                debug!(url, bytes, "Downloaded {}", dest.display());
            }
            Err(e) => {
                metrics::counter!("rmix_fetch_failures_total").increment(1);
                warn!(url, "Download failed: {}", e);
                if dest.exists() {
                    let _ = fs::remove_file(dest).await;
                }
            }
        }
        result
    }

    async fn stream_to_file(&self, parsed: Url, url: &str, dest: &Path) -> MediaResult<u64> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| self.map_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::DownloadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut file = fs::File::create(dest).await?;
        let mut written = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let data = chunk.map_err(|e| self.map_reqwest(url, e))?;
            file.write_all(&data).await?;
            written += data.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }

    fn map_reqwest(&self, url: &str, e: reqwest::Error) -> MediaError {
        if e.is_timeout() || timed_out(&e) {
            MediaError::DownloadTimeout {
                url: url.to_string(),
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            MediaError::download_failed(url, e.to_string())
        }
    }
}

/// Read timeouts surface as an io error somewhere down the source chain.
fn timed_out(e: &(dyn std::error::Error + 'static)) -> bool {
    let mut source = Some(e);
    while let Some(err) = source {
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::TimedOut {
                return true;
            }
        }
        source = err.source();
    }
    false
}

/// Parse `url` and require an http or https scheme.
pub fn validate_url(url: &str) -> MediaResult<Url> {
    let parsed = Url::parse(url).map_err(|e| MediaError::InvalidUrl {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(MediaError::InvalidUrl {
            url: url.to_string(),
            message: format!("unsupported scheme '{}'", other),
        }),
    }
}
