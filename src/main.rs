use anyhow::{Context, Result};
use dashsync::{
    arguments::{config_path_override, enabled_debug_flags, is_help_requested, once_resource, print_help},
    config::{self, Config},
    endpoint::HttpEndpoint,
    logger::{self, LogTag},
    scheduler::RefreshScheduler,
    shutdown,
    stream::{StreamManager, WsTransport},
    sync::{DataSync, Invalidation},
};
use std::sync::Arc;
use std::time::Duration;

/// Main entry point for dashsync
///
/// Modes:
/// - `--once <resource>`: one cache-checked fetch, printed as JSON
/// - default: watch mode; stream updates invalidate the cache while the
///   configured resources are refreshed on a fixed cadence, until Ctrl+C
#[tokio::main]
async fn main() -> Result<()> {
    logger::init();

    if is_help_requested() {
        print_help();
        return Ok(());
    }

    logger::info(LogTag::System, "dashsync starting up");

    let debug_flags = enabled_debug_flags();
    if !debug_flags.is_empty() {
        logger::info(
            LogTag::System,
            &format!("Debug output enabled: {}", debug_flags.join(" ")),
        );
    }

    let config_path = config_path_override().unwrap_or_else(|| config::CONFIG_FILE_PATH.to_string());
    config::load_config_from_path(&config_path)
        .with_context(|| format!("Failed to load configuration from '{}'", config_path))?;
    let cfg = config::get_config_clone();

    let endpoint = HttpEndpoint::from_settings(&cfg.endpoint).context("Failed to build HTTP endpoint")?;
    let sync = DataSync::new(cfg.cache.to_cache_config(), Arc::new(endpoint));

    if let Some(resource) = once_resource() {
        let value = sync
            .fetch(&resource)
            .await
            .with_context(|| format!("Failed to fetch '{}'", resource))?;
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    run_watch(cfg, sync).await
}

async fn run_watch(cfg: Config, sync: DataSync) -> Result<()> {
    shutdown::install_shutdown_handler()?;

    // Scheduled refreshes start one interval out; load everything once now
    for resource in &cfg.refresh.resources {
        match sync.fetch(resource).await {
            Ok(_) => logger::info(LogTag::System, &format!("Loaded '{}'", resource)),
            Err(e) => logger::warning(LogTag::System, &format!("Initial load failed: {}", e)),
        }
    }

    let scheduler = RefreshScheduler::new();
    if cfg.refresh.enabled {
        let interval = Duration::from_secs(cfg.refresh.interval_secs);
        for resource in &cfg.refresh.resources {
            sync.schedule_refresh(&scheduler, resource, interval, true);
        }
        logger::info(
            LogTag::Scheduler,
            &format!(
                "Refreshing {} resource(s) every {}s",
                cfg.refresh.resources.len(),
                cfg.refresh.interval_secs
            ),
        );
    }

    let stream = if cfg.stream.enabled {
        let updates = sync.clone();
        let manager = StreamManager::new(
            cfg.stream.to_stream_config(),
            Arc::new(WsTransport::new()),
            move |payload| match updates.apply_update(&payload) {
                Invalidation::All => {
                    logger::info(LogTag::Stream, "Update received, cache cleared")
                }
                Invalidation::Resources(keys) => logger::info(
                    LogTag::Stream,
                    &format!("Update received, invalidated {}", keys.join(", ")),
                ),
            },
        );
        manager.subscribe();
        Some(manager)
    } else {
        logger::info(LogTag::Stream, "Update stream disabled in config");
        None
    };

    let status_task = stream.as_ref().map(|manager| {
        let mut status_rx = manager.watch_status();
        tokio::spawn(async move {
            let mut last_state = None;
            while status_rx.changed().await.is_ok() {
                let status = status_rx.borrow_and_update().clone();
                if last_state != Some(status.state) {
                    last_state = Some(status.state);
                    logger::info(LogTag::Stream, &format!("Stream status: {}", status));
                }
            }
        })
    });

    shutdown::wait_for_shutdown().await;

    let stopped = scheduler.stop_all();
    if let Some(manager) = &stream {
        manager.unsubscribe();
    }
    if let Some(task) = status_task {
        task.abort();
    }

    let metrics = sync.cache().metrics();
    logger::info(
        LogTag::System,
        &format!(
            "Stopped {} schedule(s); cache hits={} misses={} hit rate={:.1}%",
            stopped,
            metrics.hits,
            metrics.misses,
            metrics.hit_rate() * 100.0
        ),
    );

    Ok(())
}
