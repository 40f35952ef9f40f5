use std::sync::Arc;

use relay_core::{BatchOutcome, RunStage, StageContext};
use relay_logging::{relay_error, relay_info, relay_warn};
use thiserror::Error;
use url::Url;

use crate::config::{AlbumOption, RelayConfig};
use crate::fetch::SourceRegistry;
use crate::imgur::Publisher;
use crate::manifest::write_manifest;
use crate::normalize::normalize;
use crate::persist::PersistError;
use crate::staging::{LocalStager, StagingError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Staging(#[from] StagingError),
    #[error("failed to write manifest: {0}")]
    Manifest(#[from] PersistError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub file: String,
    pub error: String,
}

/// What one run did, for logging and exit-code mapping.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunReport {
    pub outcome: BatchOutcome,
    pub links: Vec<String>,
    pub failures: Vec<ItemFailure>,
    pub fetch_error: Option<String>,
    pub manifest_written: bool,
}

impl RunReport {
    pub fn is_clean(&self) -> bool {
        self.fetch_error.is_none() && self.failures.is_empty()
    }
}

/// Orchestrates one batch: decide whether to fetch, publish every staged
/// file, and finalize the manifest under the configured gate.
///
/// Per-item errors never abort the batch; they are logged, recorded in the
/// report and the loop moves on. Only an unusable staging directory or a
/// failed manifest write aborts the run.
pub struct BatchPipeline<'a> {
    config: &'a RelayConfig,
    registry: SourceRegistry,
    stager: LocalStager,
    publisher: Arc<dyn Publisher>,
}

impl<'a> BatchPipeline<'a> {
    pub fn new(
        config: &'a RelayConfig,
        registry: SourceRegistry,
        stager: LocalStager,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            config,
            registry,
            stager,
            publisher,
        }
    }

    pub async fn run(&self) -> Result<RunReport, PipelineError> {
        self.stager.ensure()?;
        let ctx = StageContext {
            staging_empty: self.stager.is_empty()?,
            source_configured: self.config.source_url.is_some(),
        };

        let mut report = RunReport::default();
        let mut stage = RunStage::Idle;
        while !stage.is_terminal() {
            stage = stage.advance(&ctx);
            match stage {
                RunStage::Fetching => self.fetch(&mut report).await,
                RunStage::Publishing => self.publish(&mut report).await?,
                RunStage::Finalizing => self.finalize(&mut report)?,
                RunStage::Idle | RunStage::Done => {}
            }
        }
        Ok(report)
    }

    /// Fetch errors are recorded, not propagated: staging may already hold
    /// a partial batch worth publishing.
    async fn fetch(&self, report: &mut RunReport) {
        let Some(raw) = self.config.source_url.as_deref() else {
            return;
        };
        let url = match Url::parse(raw) {
            Ok(url) => url,
            Err(err) => {
                let message = format!("invalid source url {raw}: {err}");
                relay_error!("{message}");
                report.fetch_error = Some(message);
                return;
            }
        };
        let Some(fetcher) = self.registry.resolve(&url) else {
            let message = format!("no fetcher registered for {url}");
            relay_error!("{message}");
            report.fetch_error = Some(message);
            return;
        };

        relay_info!("fetching media from {url} via {}", fetcher.name());
        match fetcher.fetch_all(&url, self.stager.dir()).await {
            Ok(staged) => relay_info!("staged {} media files", staged.len()),
            Err(err) => {
                relay_error!("fetch from {url} failed: {err}");
                report.fetch_error = Some(err.to_string());
            }
        }
    }

    async fn publish(&self, report: &mut RunReport) -> Result<(), StagingError> {
        // Convert unsupported formats before the snapshot so the converted
        // files make it into the batch.
        for path in self.stager.pending_normalization()? {
            match normalize(&path) {
                Ok(target) => relay_info!("converted {:?} to {:?}", path, target),
                Err(err) => relay_warn!("conversion failed, skipping item: {err}"),
            }
        }

        let files = self.stager.snapshot()?;
        report.outcome = BatchOutcome::new(files.len());
        if files.is_empty() {
            relay_info!("nothing staged to publish");
            return Ok(());
        }

        relay_info!("publishing {} staged files", files.len());
        let album_deletehash = self.resolve_album().await;

        for file in &files {
            let name = file.file_name();
            match self.publisher.upload(file).await {
                Ok(result) => {
                    if let Some(album) = album_deletehash.as_deref() {
                        if let Err(err) =
                            self.publisher.add_to_album(&result.deletehash, album).await
                        {
                            relay_warn!("album association failed for {name}: {err}");
                        }
                    }
                    match self.stager.remove(&file.path) {
                        Ok(()) => {
                            relay_info!("published {name} as {}", result.link);
                            report.links.push(result.link);
                            report.outcome.record_attempt(true);
                        }
                        Err(err) => {
                            // Uploaded, but the local copy is still on disk.
                            // The manifest only lists removed files, so the
                            // item counts as failed.
                            relay_error!("failed to delete {name} after publish: {err}");
                            report.failures.push(ItemFailure {
                                file: name,
                                error: err.to_string(),
                            });
                            report.outcome.record_attempt(false);
                        }
                    }
                }
                Err(err) => {
                    relay_warn!("upload failed for {name}: {err}");
                    report.failures.push(ItemFailure {
                        file: name,
                        error: err.to_string(),
                    });
                    report.outcome.record_attempt(false);
                }
            }
        }
        Ok(())
    }

    /// The album deletehash for this batch, if any. Creation failure
    /// degrades to album-less publishing.
    async fn resolve_album(&self) -> Option<String> {
        match &self.config.album {
            AlbumOption::None => None,
            AlbumOption::Existing { deletehash } => Some(deletehash.clone()),
            AlbumOption::CreateNew { title } => {
                match self.publisher.create_album(title, "").await {
                    Ok(album) => {
                        relay_info!("created album {}", album.link);
                        Some(album.deletehash)
                    }
                    Err(err) => {
                        relay_warn!("album creation failed, publishing without album: {err}");
                        None
                    }
                }
            }
        }
    }

    fn finalize(&self, report: &mut RunReport) -> Result<(), PersistError> {
        if report.outcome.seen == 0 {
            relay_info!("no items this run, manifest left untouched");
            return Ok(());
        }

        let gate = self.config.manifest_gate;
        if gate.should_write(&report.outcome) {
            write_manifest(&self.config.manifest_path, &report.links)?;
            report.manifest_written = true;
            relay_info!(
                "manifest written to {:?} ({} links, gate {})",
                self.config.manifest_path,
                report.links.len(),
                gate.as_str()
            );
        } else {
            relay_warn!(
                "manifest withheld by gate {}: {} of {} succeeded, {} processed",
                gate.as_str(),
                report.outcome.succeeded,
                report.outcome.seen,
                report.outcome.processed
            );
        }
        Ok(())
    }
}
