// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `kidstunes serve` command implementation.
//!
//! Opens the request store, probes every adapter, reconciles records left over
//! from the previous run, then connects the Discord gateway to the engine
//! dispatcher. SIGINT/SIGTERM stop the gateway, abandon in-flight fetches and
//! drain the job tracker before the store is closed.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use kidstunes_config::model::KidsTunesConfig;
use kidstunes_core::{HealthStatus, KidsTunesError, Notifier, PluginAdapter};
use kidstunes_discord::{DiscordNotifier, Handler, Scope, run_gateway};
use kidstunes_downloader::{
    BeetsSettings, BeetsTagTool, DownloadJobRunner, RunnerSettings, YtDlp, YtDlpSettings,
};
use kidstunes_engine::{
    ApprovalGate, DEFAULT_DRAIN_TIMEOUT, DEFAULT_QUEUE_CAPACITY, Dispatcher, Intake,
    TrackedLauncher, drain_jobs, install_signal_handler, recover,
};
use kidstunes_resolver::{MetadataResolver, XaiBackend};
use kidstunes_storage::SqliteRequestStore;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

/// Runs the `kidstunes serve` command.
pub async fn run_serve(config: KidsTunesConfig) -> Result<(), KidsTunesError> {
    init_tracing(&config.logging.level);

    info!("starting kidstunes serve");

    let token = config
        .discord
        .token
        .clone()
        .ok_or_else(|| KidsTunesError::Config("discord.token is not set".into()))?;

    // Storage is the one collaborator the bot cannot run without.
    let store = Arc::new(SqliteRequestStore::open(config.paths.database.clone()).await?);
    if let HealthStatus::Unhealthy(reason) = probe(store.as_ref()).await {
        return Err(KidsTunesError::Internal(format!(
            "request store is unhealthy: {reason}"
        )));
    }

    let ytdlp = Arc::new(YtDlp::new(YtDlpSettings {
        binary: config.ytdlp.binary.clone(),
        audio_quality: config.ytdlp.audio_quality.clone(),
        search_prefix: config.ytdlp.search_prefix.clone(),
    }));
    probe(ytdlp.as_ref()).await;

    let resolver = build_resolver(&config).await?;

    let cancel = install_signal_handler();
    let tracker = TaskTracker::new();

    let notifier = Arc::new(DiscordNotifier::new(
        kidstunes_discord::http_client(&token),
        config.discord.approval_channel_id,
    )?);
    probe(notifier.as_ref()).await;
    let dyn_notifier: Arc<dyn Notifier> = notifier.clone();

    let settings = RunnerSettings {
        output_root: PathBuf::from(&config.paths.output_dir),
        audio_format: config.ytdlp.audio_format.trim().to_ascii_lowercase(),
    };
    let mut runner = DownloadJobRunner::new(
        store.clone(),
        ytdlp.clone(),
        ytdlp.clone(),
        settings.clone(),
        cancel.clone(),
    );
    if config.beets.enabled {
        let beets = Arc::new(BeetsTagTool::new(BeetsSettings {
            binary: config.beets.binary.clone(),
            library_path: PathBuf::from(&config.beets.library_path),
            music_directory: config.beets_music_directory(),
        }));
        probe(beets.as_ref()).await;
        runner = runner.with_tagger(beets);
    }

    let launcher = Arc::new(
        TrackedLauncher::new(runner, store.clone(), tracker.clone())
            .with_notifier(dyn_notifier.clone()),
    );

    // Nothing is running yet, so anything in `downloading` was interrupted.
    let report = recover(
        store.as_ref(),
        launcher.as_ref(),
        Some(&dyn_notifier),
        &settings,
    )
    .await?;
    if report.interrupted > 0 || report.relaunched > 0 {
        info!(
            interrupted = report.interrupted,
            relaunched = report.relaunched,
            "recovered requests from previous run"
        );
    }

    let gate = Arc::new(
        ApprovalGate::new(
            store.clone(),
            launcher.clone(),
            config.discord.moderator_role_id.to_string(),
        )
        .with_notifier(dyn_notifier)
        .with_tracker(tracker.clone()),
    );
    let intake = Arc::new(Intake::new(store.clone(), resolver));
    let (dispatcher, handle) =
        Dispatcher::new(gate, intake, tracker.clone(), DEFAULT_QUEUE_CAPACITY);
    let dispatcher = tokio::spawn(dispatcher.run(cancel.clone()));

    let handler = Handler::new(handle, notifier, Scope::from(&config.discord));
    let gateway = run_gateway(&token, handler, cancel.clone()).await;
    if let Err(e) = &gateway {
        error!(error = %e, "Discord gateway failed");
    }

    // Stop the dispatcher and every running fetch, whatever ended the gateway.
    cancel.cancel();
    if let Err(e) = dispatcher.await {
        warn!(error = %e, "dispatcher task did not exit cleanly");
    }

    if !drain_jobs(&tracker, DEFAULT_DRAIN_TIMEOUT).await {
        warn!(
            timeout_secs = DEFAULT_DRAIN_TIMEOUT.as_secs(),
            "download jobs still running at shutdown"
        );
    }

    store.close().await?;

    info!("kidstunes serve shutdown complete");
    gateway
}

/// Builds the metadata resolver, or the pass-through one when no API key is set.
async fn build_resolver(config: &KidsTunesConfig) -> Result<MetadataResolver, KidsTunesError> {
    let Some(api_key) = config.resolver.api_key.clone().filter(|_| config.resolver.is_enabled())
    else {
        info!("no resolver api_key configured, requests are searched verbatim");
        return Ok(MetadataResolver::disabled());
    };

    let timeout = Duration::from_secs(config.resolver.timeout_secs);
    let backend = Arc::new(XaiBackend::new(
        api_key,
        config.resolver.model.clone(),
        config.resolver.endpoint.clone(),
        timeout,
    )?);
    probe(backend.as_ref()).await;
    Ok(MetadataResolver::new(backend, timeout))
}

/// Runs an adapter health check and logs the result.
async fn probe(adapter: &dyn PluginAdapter) -> HealthStatus {
    let status = match adapter.health_check().await {
        Ok(status) => status,
        Err(e) => HealthStatus::Unhealthy(e.to_string()),
    };
    match &status {
        HealthStatus::Healthy => info!(
            adapter = adapter.name(),
            kind = %adapter.adapter_type(),
            version = %adapter.version(),
            "adapter healthy"
        ),
        HealthStatus::Degraded(reason) => {
            warn!(adapter = adapter.name(), reason = %reason, "adapter degraded")
        }
        HealthStatus::Unhealthy(reason) => {
            warn!(adapter = adapter.name(), reason = %reason, "adapter unhealthy")
        }
    }
    status
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let level = log_level.trim().to_ascii_lowercase();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("kidstunes={level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
