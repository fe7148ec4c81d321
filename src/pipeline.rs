// src/pipeline.rs
use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::config::WatcherConfig;
use crate::error::WatchError;
use crate::extract::{extract_event_links, EventLink};
use crate::feed::{write_feed, ChannelMeta, FeedItem};
use crate::fetch::PageSource;
use crate::seen::{self, SeenState};
use crate::timestamp::truncate_to_secs;

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("watch_runs_total", "Completed watcher runs.");
        describe_counter!(
            "watch_links_on_page_total",
            "Event links found on the listing page, summed over runs."
        );
        describe_counter!("watch_new_links_total", "Event links seen for the first time.");
        describe_counter!("watch_fetch_errors_total", "Listing page fetch failures.");
        describe_histogram!("watch_extract_ms", "Link extraction time in milliseconds.");
        describe_gauge!("watch_last_run_ts", "Unix ts of the last successful run.");
    });
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Unique event links on the page this run.
    pub links_on_page: usize,
    /// Links not present in the seen-state before this run, in page order.
    pub new_links: Vec<EventLink>,
    /// Size of the seen-state after this run (= number of feed items).
    pub total_known: usize,
    pub feed_path: PathBuf,
}

impl RunSummary {
    pub fn new_count(&self) -> usize {
        self.new_links.len()
    }

    pub fn summary_line(&self) -> String {
        if self.new_links.is_empty() {
            format!(
                "No new links ({} on page, {} known), but RSS regenerated: {}",
                self.links_on_page,
                self.total_known,
                self.feed_path.display()
            )
        } else {
            format!(
                "Found {} new link(s) out of {} on page ({} known). RSS updated: {}",
                self.new_count(),
                self.links_on_page,
                self.total_known,
                self.feed_path.display()
            )
        }
    }
}

/// Feed items, newest first. Titles come from this run's page when the
/// link is still there, otherwise the URL stands in.
pub fn build_items(state: &SeenState, page_links: &[EventLink]) -> Vec<FeedItem> {
    let titles: HashMap<&str, &str> = page_links
        .iter()
        .map(|l| (l.url.as_str(), l.title.as_str()))
        .collect();

    state
        .iter_newest_first()
        .map(|e| FeedItem {
            title: titles
                .get(e.url.as_str())
                .map(|t| t.to_string())
                .unwrap_or_else(|| e.url.clone()),
            link: e.url.clone(),
            pub_date: e.first_seen,
            description: None,
        })
        .collect()
}

/// fetch → extract → diff against seen-state → render feed → persist state.
///
/// A fetch failure returns before any file is read or written.
pub async fn run_once(
    source: &dyn PageSource,
    cfg: &WatcherConfig,
    now: DateTime<Utc>,
) -> Result<RunSummary, WatchError> {
    ensure_metrics_described();
    let now = truncate_to_secs(now);
    let base = cfg.base_url()?;

    let html = source.fetch_page().await?;
    let links = extract_event_links(&html, &base, &cfg.event_path_marker);

    let mut state = seen::load(&cfg.seen_path, now).await?;
    let mut new_links = Vec::new();
    for link in &links {
        if state.insert(link.url.clone(), now) {
            tracing::info!(url = %link.url, title = %link.title, "new event link");
            new_links.push(link.clone());
        }
    }

    let items = build_items(&state, &links);
    let channel = ChannelMeta {
        title: cfg.feed_title.clone(),
        link: cfg.page_url.clone(),
        description: cfg.feed_description.clone(),
    };
    write_feed(&cfg.feed_path, &channel, &items, now).await?;
    seen::save(&cfg.seen_path, &state).await?;

    counter!("watch_runs_total").increment(1);
    counter!("watch_links_on_page_total").increment(links.len() as u64);
    counter!("watch_new_links_total").increment(new_links.len() as u64);
    gauge!("watch_last_run_ts").set(now.timestamp() as f64);

    tracing::info!(
        target: "watch",
        url = source.url(),
        on_page = links.len(),
        new = new_links.len(),
        known = state.len(),
        "run complete"
    );

    Ok(RunSummary {
        links_on_page: links.len(),
        new_links,
        total_known: state.len(),
        feed_path: cfg.feed_path.clone(),
    })
}
