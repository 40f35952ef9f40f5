mod exit;
mod logging;

use std::process::ExitCode;
use std::sync::Arc;

use relay_engine::{
    BatchPipeline, DownloadSettings, Downloader, HttpPageSession, ImgurPublisher, ImgurSettings,
    LocalStager, PipelineError, RelayConfig, RunReport, SessionSettings, SessionStore,
    SourceRegistry, TwitterFetcher, TwitterSettings, WeverseFetcher, WeverseSettings,
};
use relay_logging::{relay_error, relay_info};

enum AppError {
    Setup(String),
    Pipeline(PipelineError),
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    logging::initialize(true);

    let mut config = match RelayConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            relay_error!("configuration error: {err}");
            return ExitCode::from(exit::CONFIG_FAILURE);
        }
    };
    // A positional URL wins over the environment.
    if let Some(url) = std::env::args().nth(1) {
        config.source_url = Some(url);
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            relay_error!("failed to start async runtime: {err}");
            return ExitCode::from(exit::RUN_ABORTED);
        }
    };

    match runtime.block_on(run(&config)) {
        Ok(report) => {
            relay_info!(
                "run finished: {}/{} published, {} failed{}",
                report.outcome.succeeded,
                report.outcome.seen,
                report.outcome.failed(),
                if report.manifest_written {
                    ", manifest written"
                } else {
                    ""
                }
            );
            ExitCode::from(exit::code_for(&report))
        }
        Err(AppError::Setup(message)) => {
            relay_error!("startup failed: {message}");
            ExitCode::from(exit::RUN_ABORTED)
        }
        Err(AppError::Pipeline(err)) => {
            relay_error!("run aborted: {err}");
            ExitCode::from(exit::RUN_ABORTED)
        }
    }
}

async fn run(config: &RelayConfig) -> Result<RunReport, AppError> {
    let session = Arc::new(
        HttpPageSession::new(SessionSettings::default())
            .map_err(|err| AppError::Setup(err.to_string()))?,
    );
    let downloader = Arc::new(
        Downloader::new(DownloadSettings::default())
            .map_err(|err| AppError::Setup(err.to_string()))?,
    );
    let store = SessionStore::new(".");

    let registry = SourceRegistry::new()
        .register(Arc::new(TwitterFetcher::new(
            session.clone(),
            downloader.clone(),
            TwitterSettings::default(),
        )))
        .register(Arc::new(WeverseFetcher::new(
            session,
            downloader,
            store,
            config.weverse_login.clone(),
            WeverseSettings::default(),
        )));

    let publisher = Arc::new(
        ImgurPublisher::new(config, ImgurSettings::default())
            .map_err(|err| AppError::Setup(err.to_string()))?,
    );
    let stager = LocalStager::new(&config.staging_dir);

    BatchPipeline::new(config, registry, stager, publisher)
        .run()
        .await
        .map_err(AppError::Pipeline)
}
