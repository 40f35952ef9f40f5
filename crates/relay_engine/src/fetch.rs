use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::decode::DecodeError;
use crate::types::StagedFile;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("invalid source url: {0}")]
    InvalidUrl(String),
    #[error("no fetcher registered for {0}")]
    UnsupportedSource(String),
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("page returned http status {0}")]
    HttpStatus(u16),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("login required but no credentials configured")]
    MissingCredentials,
    #[error("login not completed within {0:?}")]
    LoginTimeout(Duration),
    #[error("login cancelled")]
    LoginCancelled,
}

/// A source-specific scraper: resolves a page, extracts direct media URLs
/// and downloads each into the staging directory.
///
/// Implementations keep per-item independence: one failed download is
/// logged and skipped, the rest of the batch still lands. A page with no
/// media yields an empty list, not an error.
#[async_trait::async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Short name used in log lines and staged file names.
    fn name(&self) -> &'static str;

    /// URL-pattern predicate consulted by the registry.
    fn handles(&self, url: &Url) -> bool;

    async fn fetch_all(
        &self,
        source_url: &Url,
        staging_dir: &Path,
    ) -> Result<Vec<StagedFile>, ScrapeError>;
}

/// Deterministic staging name for the `index`-th media item of a source.
pub fn staged_name(source: &str, index: usize, ext: &str) -> String {
    format!("{source}_{index}{ext}")
}

/// Maps URL patterns to fetchers. Adding a source is registering one more
/// fetcher here; the pipeline never learns about concrete sources.
#[derive(Default)]
pub struct SourceRegistry {
    fetchers: Vec<Arc<dyn MediaFetcher>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, fetcher: Arc<dyn MediaFetcher>) -> Self {
        self.fetchers.push(fetcher);
        self
    }

    /// First fetcher whose predicate matches, in registration order.
    pub fn resolve(&self, url: &Url) -> Option<&dyn MediaFetcher> {
        self.fetchers
            .iter()
            .find(|fetcher| fetcher.handles(url))
            .map(|fetcher| fetcher.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.fetchers.is_empty()
    }
}
