//! Relay engine: scraping, staging and publishing I/O.
mod config;
mod decode;
mod download;
mod fetch;
mod imgur;
mod manifest;
mod normalize;
mod persist;
mod pipeline;
mod session;
mod session_store;
mod staging;
mod twitter;
mod types;
mod weverse;

pub use config::{
    AlbumOption, ConfigError, LoginCredentials, RelayConfig, DEFAULT_MANIFEST_PATH,
    DEFAULT_STAGING_DIR,
};
pub use decode::{decode_page, DecodeError, DecodedPage};
pub use download::{DownloadError, DownloadSettings, Downloader, BROWSER_USER_AGENT};
pub use fetch::{staged_name, MediaFetcher, ScrapeError, SourceRegistry};
pub use imgur::{AssociationError, ImgurPublisher, ImgurSettings, Publisher, UploadError};
pub use manifest::write_manifest;
pub use normalize::{normalize, NormalizeError};
pub use persist::{atomic_write, ensure_dir, PersistError};
pub use pipeline::{BatchPipeline, ItemFailure, PipelineError, RunReport};
pub use session::{HttpPageSession, PageSession, PageSnapshot, SessionSettings};
pub use session_store::{SessionStore, SESSION_BLOB_VERSION};
pub use staging::{LocalStager, StagingError};
pub use twitter::{TwitterFetcher, TwitterSettings};
pub use types::{
    classify_extension, AlbumHandle, MediaKind, StagedFile, UploadResult, IMAGE_EXTENSIONS,
    VIDEO_EXTENSION,
};
pub use weverse::{WeverseFetcher, WeverseSettings};
