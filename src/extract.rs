// src/extract.rs
use metrics::histogram;
use once_cell::sync::OnceCell;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashMap;
use url::Url;

/// An event anchor found on the listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLink {
    /// Normalized absolute URL (scheme + host + path).
    pub url: String,
    pub title: String,
}

fn strip_to_identity(mut u: Url) -> Option<String> {
    if !matches!(u.scheme(), "http" | "https") {
        return None;
    }
    u.set_query(None);
    u.set_fragment(None);
    Some(u.to_string())
}

/// Resolve `href` against `base` and strip query + fragment.
/// Returns `None` for hrefs that don't resolve to an http(s) URL.
pub fn normalize_link(base: &Url, href: &str) -> Option<String> {
    strip_to_identity(base.join(href.trim()).ok()?)
}

/// Normalize an already-absolute URL the same way `normalize_link` does
/// (percent-encoding, lowercase host, default port dropped). Strings that
/// aren't absolute http(s) URLs come back unchanged.
pub fn canonical_url(raw: &str) -> String {
    Url::parse(raw.trim())
        .ok()
        .and_then(strip_to_identity)
        .unwrap_or_else(|| raw.to_string())
}

/// Collapse whitespace runs and trim.
pub fn clean_title(s: &str) -> String {
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("static regex"));
    re_ws.replace_all(s, " ").trim().to_string()
}

/// Extract event links from listing markup.
///
/// Only anchors whose raw href contains `marker` are kept. Links are unique
/// by normalized URL and ordered by first occurrence; on duplicates the
/// last title in document order wins.
pub fn extract_event_links(html: &str, base: &Url, marker: &str) -> Vec<EventLink> {
    let t0 = std::time::Instant::now();
    let document = Html::parse_document(html);
    let sel = Selector::parse("a[href]").expect("static selector");

    let mut out: Vec<EventLink> = Vec::new();
    let mut pos: HashMap<String, usize> = HashMap::new();
    let mut scanned = 0usize;

    for element in document.select(&sel) {
        scanned += 1;
        let href = element.value().attr("href").unwrap_or("");
        if !href.contains(marker) {
            continue;
        }
        let Some(url) = normalize_link(base, href) else {
            tracing::debug!(href, "skipping unresolvable event href");
            continue;
        };

        let mut title = clean_title(&element.text().collect::<String>());
        if title.is_empty() {
            title = url.clone();
        }

        match pos.get(&url) {
            Some(&i) => out[i].title = title,
            None => {
                pos.insert(url.clone(), out.len());
                out.push(EventLink { url, title });
            }
        }
    }

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("watch_extract_ms").record(ms);
    tracing::debug!(scanned, kept = out.len(), "event links extracted");

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://host.test/o/organizer-1").unwrap()
    }

    #[test]
    fn query_and_fragment_are_stripped() {
        let b = base();
        assert_eq!(
            normalize_link(&b, "/e/my-event-123?aff=x#tickets").as_deref(),
            Some("https://host.test/e/my-event-123")
        );
        assert_eq!(
            normalize_link(&b, "https://host.test/e/my-event-123").as_deref(),
            Some("https://host.test/e/my-event-123")
        );
        assert_eq!(normalize_link(&b, "mailto:x@host.test/e/1"), None);
    }

    #[test]
    fn canonical_url_matches_resolved_form() {
        let b = base();
        let from_page = normalize_link(&b, "/e/caff\u{e8}-1").unwrap();
        assert_eq!(canonical_url("https://HOST.test:443/e/caff\u{e8}-1?x=1"), from_page);
        assert_eq!(canonical_url("not a url"), "not a url");
    }

    #[test]
    fn clean_title_folds_whitespace() {
        assert_eq!(clean_title("\n   Jazz\n\t Night  "), "Jazz Night");
        assert_eq!(clean_title(" \n "), "");
    }

    #[test]
    fn duplicates_keep_first_position_and_last_title() {
        let html = r#"
            <a href="/e/one">First</a>
            <a href="/e/two">Two</a>
            <a href="/e/one?ref=footer">First (again)</a>
            <a href="/about">About</a>
        "#;
        let links = extract_event_links(html, &base(), "/e/");
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].url, "https://host.test/e/one");
        assert_eq!(links[0].title, "First (again)");
        assert_eq!(links[1].url, "https://host.test/e/two");
    }
}
