//! Event feed watcher — binary entrypoint.
//! One run: fetch the listing page, record new event links, rewrite the feed.

use anyhow::Context;
use chrono::Utc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use event_feed_watcher::{pipeline, HttpPageSource, WatcherConfig};

/// Logs go to stderr so stdout carries only the summary line.
/// `WATCHER_LOG_JSON=1` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("WATCHER_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = WatcherConfig::load_default().context("loading watcher config")?;
    let source = HttpPageSource::new(&cfg).context("building page fetcher")?;

    let summary = pipeline::run_once(&source, &cfg, Utc::now())
        .await
        .with_context(|| format!("watching {}", cfg.page_url))?;

    println!("{}", summary.summary_line());
    Ok(())
}
