//! Daemon assembly.
//!
//! Turns a validated [`Config`] into a running sync loop: opens the
//! store, builds the REST fetcher and dependent actions, restores state,
//! optionally starts the HTTP endpoints, and drives the runner until
//! shutdown.

use crate::api::HttpFetcher;
use crate::config::Config;
use crate::error::Result;
use crate::http::{self, AppState};
use crate::recordings::RecordingDownloader;
use crate::runner::{Runner, RunnerConfig, SyncMetrics};
use crate::state::load_state;
use crate::storage::SqliteStore;
use std::sync::Arc;
use std::time::Duration;
use sync_client::{ActionDispatcher, SyncEngine};
use sync_types::ResourceType;
use tokio::sync::watch;

/// Build the dependent actions enabled by `config`.
pub fn build_dispatcher(config: &Config, api: &HttpFetcher) -> ActionDispatcher {
    let mut dispatcher = ActionDispatcher::new();
    if config.recordings.enabled {
        tracing::info!(
            dir = %config.recordings.output_dir.display(),
            format = config.recordings.format.extension(),
            "Recording downloads enabled"
        );
        dispatcher.register(
            ResourceType::Recording,
            Arc::new(RecordingDownloader::new(
                api.clone(),
                config.recordings.output_dir.clone(),
                config.recordings.format,
            )),
        );
    }
    dispatcher
}

/// Run the daemon until `shutdown` flips to true (or after one cycle when
/// `sync.one_shot` is set). Returns the number of cycles run.
pub async fn run(config: Config, shutdown: watch::Receiver<bool>) -> Result<u64> {
    config.validate()?;

    let store = SqliteStore::new(&config.storage.database).await?;
    tracing::info!(database = %config.storage.database.display(), "Store opened");

    let fetcher = HttpFetcher::new(&config.account, config.sync.page_size)?;
    let dispatcher = build_dispatcher(&config, &fetcher);

    let mut engine = SyncEngine::new(fetcher, store.clone(), &config.sync.resources)?
        .with_dispatcher(dispatcher)
        .with_shutdown(shutdown.clone());
    if let Some(path) = &config.storage.state_file {
        engine = engine.with_state(load_state(path).await?);
    }

    let metrics = Arc::new(SyncMetrics::default());
    let http_task = if config.http.enabled {
        http::health::init_start_time();
        let state = Arc::new(AppState {
            metrics: metrics.clone(),
            store,
            resources: engine.order().to_vec(),
        });
        let bind_address = config.http.bind_address.clone();
        let http_shutdown = shutdown.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = http::serve(&bind_address, state, http_shutdown).await {
                tracing::error!("HTTP server error: {}", e);
            }
        }))
    } else {
        None
    };

    let mut runner = Runner::new(
        engine,
        metrics,
        RunnerConfig {
            poll_interval: Duration::from_secs(config.sync.poll_interval_secs),
            one_shot: config.sync.one_shot,
            state_file: config.storage.state_file.clone(),
        },
    );
    let result = runner.run(shutdown).await;

    if let Some(task) = http_task {
        task.abort();
    }
    result
}
