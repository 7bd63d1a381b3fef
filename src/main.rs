//! Community Insights: Binary Entrypoint
//! Boots the Axum HTTP server, wiring the insight pipeline, the collector
//! poll loop, and the metrics endpoint.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use community_insights::api::{self, AppState};
use community_insights::collect::github::GitHubCollector;
use community_insights::collect::scheduler::{spawn_poll_task, PollSchedulerCfg};
use community_insights::collect::stackoverflow::StackOverflowCollector;
use community_insights::collect::Collector;
use community_insights::config::AppConfig;
use community_insights::extract::build_extractor;
use community_insights::identity::IdentityCache;
use community_insights::metrics::Metrics;
use community_insights::pipeline::InsightPipeline;

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - INSIGHTS_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("INSIGHTS_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("insights=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

fn build_collectors(cfg: &AppConfig) -> Vec<Box<dyn Collector>> {
    let mut collectors: Vec<Box<dyn Collector>> = Vec::new();
    if let Some(gh) = &cfg.collectors.github {
        collectors.push(Box::new(GitHubCollector::new(
            gh.owner.clone(),
            gh.repo.clone(),
            gh.per_page,
        )));
    }
    if let Some(so) = &cfg.collectors.stackoverflow {
        collectors.push(Box::new(StackOverflowCollector::new(
            so.tag.clone(),
            so.window_hours,
            so.page_size,
        )));
    }
    collectors
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments. This enables
    // OPENAI_API_KEY / GITHUB_TOKEN / INSIGHTS_CONFIG_PATH from .env.
    let _ = dotenvy::dotenv();

    // Initialize dev tracing early (no-op in production).
    enable_dev_tracing();

    let cfg = AppConfig::load_default();
    let metrics = Metrics::init();

    let extractor = build_extractor(&cfg.extractor);
    tracing::info!(extractor = extractor.name(), "extractor ready");

    let identity = IdentityCache::new(cfg.identity_cache_path.clone());
    let pipeline = InsightPipeline::new(extractor, identity);

    let collectors = build_collectors(&cfg);
    if !collectors.is_empty() {
        spawn_poll_task(
            pipeline.clone(),
            collectors,
            PollSchedulerCfg {
                interval_secs: cfg.poll_interval_secs,
            },
        );
    }

    let router = api::create_router(AppState { pipeline }).merge(metrics.router());

    Ok(router.into())
}
