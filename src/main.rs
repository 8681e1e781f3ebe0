//! Department news service: binary entrypoint.
//! Boots the Axum HTTP server with the aggregator, source registry and
//! Prometheus metrics wired in.

use csdept_news::ingest::sources::{default_sources, load_sources_default};
use csdept_news::metrics::Metrics;
use csdept_news::NewsConfig;
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact tracing logs; `RUST_LOG` wins over the default filter.
/// Uses `try_init` so a subscriber installed by the runtime is kept.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("csdept_news=info,tower_http=info,warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = NewsConfig::from_env();
    let sources = load_sources_default().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "news sources config unusable; using built-in registry");
        default_sources()
    });
    tracing::info!(
        sources = sources.len(),
        ttl_secs = cfg.cache_ttl.as_secs(),
        timeout_ms = cfg.fetch_timeout.as_millis() as u64,
        "starting news service"
    );

    // Recorder first so metric descriptions registered by the aggregator land.
    let metrics = Metrics::init()
        .map_err(|e| tracing::warn!(error = %e, "prometheus recorder not installed; /metrics disabled"))
        .ok();

    let mut router = csdept_news::app(&cfg, sources)?;
    if let Some(m) = metrics {
        router = router.merge(m.router());
    }

    Ok(router.into())
}
