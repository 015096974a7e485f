use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use iptv_catalog::{
    cache::CatalogCache,
    config::Config,
    ingestor::{AggregationEngine, RefreshScheduler, SchedulerHandle},
    services::{CatalogService, ChannelFilter, HttpStreamProbe, LivenessVerifier},
    sources::IptvOrgSource,
    utils::UrlUtils,
    web::{AppState, Manifest, WebServer},
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "iptv-catalog")]
#[command(version)]
#[command(about = "Live TV catalog aggregator serving verified streams as a Stremio addon")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --log-level
    let log_filter = if cli.log_level == "trace" {
        format!("iptv_catalog={},tower_http=trace", cli.log_level)
    } else {
        format!("iptv_catalog={},tower_http=info", cli.log_level)
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| log_filter.into());
    match cli.log_format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init(),
    }

    info!("Starting IPTV Catalog v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load(Some(Path::new(&cli.config)))?;
    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }

    info!(
        "Channel feed: {}, stream feed: {}",
        UrlUtils::obfuscate_credentials(&config.upstream.channels_url),
        UrlUtils::obfuscate_credentials(&config.upstream.streams_url)
    );
    info!(
        "Filters: include countries {:?}, exclude countries {:?}, include languages {:?}, exclude languages {:?}, exclude categories {:?}",
        config.filter.include_countries,
        config.filter.exclude_countries,
        config.filter.include_languages,
        config.filter.exclude_languages,
        config.filter.exclude_categories
    );

    let cache = Arc::new(CatalogCache::new(config.verifier.verdict_ttl));
    let source = Arc::new(IptvOrgSource::from_config(&config.upstream)?);
    let probe = Arc::new(HttpStreamProbe::from_config(
        &config.verifier,
        config.upstream.request_timeout,
    )?);
    let verifier = Arc::new(LivenessVerifier::new(
        probe,
        cache.clone(),
        config.verifier.user_agent.clone(),
    ));
    let engine = Arc::new(AggregationEngine::new(
        source,
        verifier,
        cache.clone(),
        ChannelFilter::new(config.filter.clone()),
        config.verifier.max_concurrent_probes,
    ));
    let (scheduler, scheduler_handle) = RefreshScheduler::new(engine, config.refresh.interval);

    let state = AppState {
        catalog: CatalogService::new(cache.clone(), config.web.cold_start_wait),
        cache,
        manifest: Arc::new(Manifest::for_countries(&config.filter.include_countries)),
    };
    let web_server = WebServer::new(&config.web, state)?;
    info!(
        "Starting web server on {}:{}",
        web_server.host(),
        web_server.port()
    );

    let cancellation_token = CancellationToken::new();

    tokio::spawn({
        let token = cancellation_token.clone();
        async move {
            if let Err(e) = handle_signals(token.clone(), scheduler_handle).await {
                error!("Failed to install signal handlers: {}", e);
                token.cancel();
            }
        }
    });

    let scheduler_task = tokio::spawn(scheduler.run(cancellation_token.clone()));

    let result = web_server
        .serve_with_cancellation(cancellation_token.clone())
        .await;
    if let Err(e) = &result {
        error!("Web server failed: {}", e);
    }

    cancellation_token.cancel();
    if let Err(e) = scheduler_task.await {
        error!("Refresh scheduler task failed: {}", e);
    }

    info!("Shutdown complete");
    result
}

/// Cancel on SIGINT/SIGTERM; SIGHUP triggers an immediate catalog refresh
async fn handle_signals(token: CancellationToken, scheduler: SchedulerHandle) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sighup = signal(SignalKind::hangup())?;

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT (Ctrl+C), shutting down gracefully");
                    break;
                }
                _ = sighup.recv() => {
                    info!("Received SIGHUP, refreshing catalog");
                    scheduler.trigger_refresh();
                }
                _ = token.cancelled() => return Ok(()),
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = scheduler;
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("Received Ctrl+C, shutting down gracefully");
            }
            _ = token.cancelled() => return Ok(()),
        }
    }

    token.cancel();
    Ok(())
}
