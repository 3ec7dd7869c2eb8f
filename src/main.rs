//! Insight Service — Binary Entrypoint
//! Boots the Axum HTTP server: provider chain, in-memory store, metrics and CORS.

use news_insights::{app, metrics::Metrics};
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs in dev (debug build or INSIGHT_ENV in {local, development, dev}),
/// JSON lines otherwise.
fn init_tracing() {
    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("INSIGHT_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("insights=info,warn"));

    let registry = tracing_subscriber::registry().with(filter);
    let res = if is_dev_env {
        registry.with(fmt::layer().compact()).try_init()
    } else {
        registry.with(fmt::layer().json()).try_init()
    };
    if res.is_err() {
        // Runtime already installed a subscriber.
        tracing::debug!("tracing subscriber already set");
    }
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let metrics = Metrics::init()?;
    let router = app().await?.merge(metrics.router());

    if std::env::var("INSIGHT_QUICK_PROBE").is_ok_and(|v| v == "1") {
        if let Err(e) = news_insights::run_insight_quick_probe().await {
            tracing::warn!(error = ?e, "insight quick probe didn't run");
        }
    }

    Ok(router.into())
}
