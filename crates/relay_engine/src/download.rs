use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{REFERER, USER_AGENT};
use thiserror::Error;

/// User-Agent presented to both page and media hosts. Some CDNs refuse
/// requests without a browser-looking agent.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("invalid media url: {0}")]
    InvalidUrl(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("media host returned http status {0}")]
    HttpStatus(u16),
    #[error("media too large (max {max_bytes}, got at least {seen})")]
    TooLarge { max_bytes: u64, seen: u64 },
    #[error("failed to write media file: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone)]
pub struct DownloadSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_bytes: u64,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            max_bytes: 200 * 1024 * 1024,
        }
    }
}

/// Streams direct media URLs into staging files, one request at a time.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: reqwest::Client,
    settings: DownloadSettings,
}

impl Downloader {
    pub fn new(settings: DownloadSettings) -> Result<Self, DownloadError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| DownloadError::Network(err.to_string()))?;
        Ok(Self { client, settings })
    }

    /// Download `url` into `dest`. The body is accumulated under the byte
    /// cap, then written in one pass so a failed transfer never leaves a
    /// partial file behind.
    pub async fn fetch_to_file(
        &self,
        url: &str,
        dest: &Path,
        referer: Option<&str>,
    ) -> Result<u64, DownloadError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| DownloadError::InvalidUrl(err.to_string()))?;

        let mut request = self.client.get(parsed).header(USER_AGENT, BROWSER_USER_AGENT);
        if let Some(referer) = referer {
            request = request.header(REFERER, referer);
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::HttpStatus(status.as_u16()));
        }

        if let Some(len) = response.content_length() {
            if len > self.settings.max_bytes {
                return Err(DownloadError::TooLarge {
                    max_bytes: self.settings.max_bytes,
                    seen: len,
                });
            }
        }

        let mut bytes: Vec<u8> = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(DownloadError::TooLarge {
                    max_bytes: self.settings.max_bytes,
                    seen: next_len,
                });
            }
            bytes.extend_from_slice(&chunk);
        }

        fs::write(dest, &bytes)?;
        Ok(bytes.len() as u64)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> DownloadError {
    if err.is_timeout() {
        return DownloadError::Timeout(err.to_string());
    }
    DownloadError::Network(err.to_string())
}
