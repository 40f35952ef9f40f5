use std::fs;
use std::io;
use std::time::Duration;

use relay_logging::relay_debug;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use thiserror::Error;

use crate::config::RelayConfig;
use crate::types::{AlbumHandle, MediaKind, StagedFile, UploadResult};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("network error: {0}")]
    Network(String),
    #[error("upload rejected with http status {0}")]
    HttpStatus(u16),
    #[error("response missing expected fields: {0}")]
    MalformedResponse(String),
    #[error("failed to read {path}: {source}")]
    Io { path: String, source: io::Error },
}

#[derive(Debug, Error)]
pub enum AssociationError {
    #[error("network error: {0}")]
    Network(String),
    #[error("album association rejected with http status {0}")]
    HttpStatus(u16),
}

/// Republishes staged files to the hosting service.
#[async_trait::async_trait]
pub trait Publisher: Send + Sync {
    async fn upload(&self, file: &StagedFile) -> Result<UploadResult, UploadError>;

    /// Create a public, ownerless album.
    async fn create_album(&self, title: &str, description: &str)
        -> Result<AlbumHandle, UploadError>;

    /// Associate an uploaded item with an album via their deletehashes.
    /// An empty handle on either side is a logged no-op, not an error:
    /// album grouping is an optional enhancement to publishing.
    async fn add_to_album(
        &self,
        item_deletehash: &str,
        album_deletehash: &str,
    ) -> Result<(), AssociationError>;
}

#[derive(Debug, Clone)]
pub struct ImgurSettings {
    pub base_url: String,
    pub request_timeout: Duration,
}

impl Default for ImgurSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.imgur.com".to_string(),
            request_timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    id: Option<String>,
    link: Option<String>,
    deletehash: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AlbumData {
    id: Option<String>,
    deletehash: Option<String>,
}

pub struct ImgurPublisher {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
}

impl ImgurPublisher {
    pub fn new(config: &RelayConfig, settings: ImgurSettings) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| UploadError::Network(err.to_string()))?;
        Ok(Self {
            client,
            base_url: settings.base_url,
            client_id: config.client_id.clone(),
        })
    }

    fn authorization(&self) -> String {
        format!("Client-ID {}", self.client_id)
    }

    async fn parse_upload_response(
        response: reqwest::Response,
    ) -> Result<UploadResult, UploadError> {
        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::HttpStatus(status.as_u16()));
        }
        let body = response
            .bytes()
            .await
            .map_err(|err| UploadError::Network(err.to_string()))?;
        let envelope: ApiEnvelope<UploadData> = serde_json::from_slice(&body)
            .map_err(|err| UploadError::MalformedResponse(err.to_string()))?;
        let data = envelope
            .data
            .ok_or_else(|| UploadError::MalformedResponse("data".into()))?;
        Ok(UploadResult {
            link: data
                .link
                .ok_or_else(|| UploadError::MalformedResponse("data.link".into()))?,
            deletehash: data
                .deletehash
                .ok_or_else(|| UploadError::MalformedResponse("data.deletehash".into()))?,
            remote_id: data
                .id
                .ok_or_else(|| UploadError::MalformedResponse("data.id".into()))?,
        })
    }
}

#[async_trait::async_trait]
impl Publisher for ImgurPublisher {
    async fn upload(&self, file: &StagedFile) -> Result<UploadResult, UploadError> {
        let bytes = fs::read(&file.path).map_err(|source| UploadError::Io {
            path: file.path.display().to_string(),
            source,
        })?;

        // Videos go through the generic upload endpoint under a different
        // multipart field name; everything else is an image.
        let (endpoint, field) = match file.kind {
            MediaKind::Video => (format!("{}/3/upload", self.base_url), "video"),
            MediaKind::Image => (format!("{}/3/image", self.base_url), "image"),
        };

        let part = Part::bytes(bytes).file_name(file.file_name());
        let form = Form::new().part(field, part);
        let response = self
            .client
            .post(&endpoint)
            .header(AUTHORIZATION, self.authorization())
            .multipart(form)
            .send()
            .await
            .map_err(|err| UploadError::Network(err.to_string()))?;

        Self::parse_upload_response(response).await
    }

    async fn create_album(
        &self,
        title: &str,
        description: &str,
    ) -> Result<AlbumHandle, UploadError> {
        let response = self
            .client
            .post(format!("{}/3/album", self.base_url))
            .header(AUTHORIZATION, self.authorization())
            .form(&[
                ("title", title),
                ("description", description),
                ("privacy", "public"),
            ])
            .send()
            .await
            .map_err(|err| UploadError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::HttpStatus(status.as_u16()));
        }
        let body = response
            .bytes()
            .await
            .map_err(|err| UploadError::Network(err.to_string()))?;
        let envelope: ApiEnvelope<AlbumData> = serde_json::from_slice(&body)
            .map_err(|err| UploadError::MalformedResponse(err.to_string()))?;
        let data = envelope
            .data
            .ok_or_else(|| UploadError::MalformedResponse("data".into()))?;
        let remote_id = data
            .id
            .ok_or_else(|| UploadError::MalformedResponse("data.id".into()))?;
        let deletehash = data
            .deletehash
            .ok_or_else(|| UploadError::MalformedResponse("data.deletehash".into()))?;
        let link = format!("https://imgur.com/a/{remote_id}");
        Ok(AlbumHandle {
            remote_id,
            deletehash,
            link,
        })
    }

    async fn add_to_album(
        &self,
        item_deletehash: &str,
        album_deletehash: &str,
    ) -> Result<(), AssociationError> {
        if item_deletehash.is_empty() || album_deletehash.is_empty() {
            relay_debug!("album association skipped: missing deletehash");
            return Ok(());
        }

        let response = self
            .client
            .post(format!(
                "{}/3/album/{album_deletehash}/add",
                self.base_url
            ))
            .header(AUTHORIZATION, self.authorization())
            .form(&[("deletehashes[]", item_deletehash)])
            .send()
            .await
            .map_err(|err| AssociationError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssociationError::HttpStatus(status.as_u16()));
        }
        Ok(())
    }
}
