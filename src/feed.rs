// src/feed.rs
use chrono::{DateTime, Utc};
use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::path::Path;

use crate::error::WatchError;
use crate::persist::write_atomic;
use crate::timestamp::format_rfc1123;

/// Static channel metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMeta {
    pub title: String,
    pub link: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub pub_date: DateTime<Utc>,
    pub description: Option<String>,
}

fn render_err<E: std::fmt::Display>(e: E) -> WatchError {
    WatchError::Render(e.to_string())
}

fn write_text_element(
    w: &mut Writer<Vec<u8>>,
    name: &str,
    attrs: &[(&str, &str)],
    text: &str,
) -> Result<(), WatchError> {
    let mut start = BytesStart::new(name);
    for &attr in attrs {
        start.push_attribute(attr);
    }
    w.write_event(Event::Start(start)).map_err(render_err)?;
    w.write_event(Event::Text(BytesText::from_escaped(escape(text))))
        .map_err(render_err)?;
    w.write_event(Event::End(BytesEnd::new(name))).map_err(render_err)?;
    Ok(())
}

/// Render a complete RSS 2.0 document. Items are written in the given order.
/// All text and attribute values are entity-escaped.
pub fn render_feed(
    channel: &ChannelMeta,
    items: &[FeedItem],
    built_at: DateTime<Utc>,
) -> Result<String, WatchError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(render_err)?;

    let mut rss_start = BytesStart::new("rss");
    rss_start.push_attribute(("version", "2.0"));
    writer.write_event(Event::Start(rss_start)).map_err(render_err)?;
    writer
        .write_event(Event::Start(BytesStart::new("channel")))
        .map_err(render_err)?;

    write_text_element(&mut writer, "title", &[], &channel.title)?;
    write_text_element(&mut writer, "link", &[], &channel.link)?;
    write_text_element(&mut writer, "description", &[], &channel.description)?;
    write_text_element(&mut writer, "lastBuildDate", &[], &format_rfc1123(built_at))?;

    for it in items {
        writer
            .write_event(Event::Start(BytesStart::new("item")))
            .map_err(render_err)?;
        write_text_element(&mut writer, "title", &[], &it.title)?;
        write_text_element(&mut writer, "link", &[], &it.link)?;
        write_text_element(&mut writer, "guid", &[("isPermaLink", "true")], &it.link)?;
        write_text_element(&mut writer, "pubDate", &[], &format_rfc1123(it.pub_date))?;
        write_text_element(
            &mut writer,
            "description",
            &[],
            it.description.as_deref().unwrap_or_default(),
        )?;
        writer
            .write_event(Event::End(BytesEnd::new("item")))
            .map_err(render_err)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("channel")))
        .map_err(render_err)?;
    writer
        .write_event(Event::End(BytesEnd::new("rss")))
        .map_err(render_err)?;

    let mut out = String::from_utf8(writer.into_inner()).map_err(render_err)?;
    out.push('\n');
    Ok(out)
}

/// Render and atomically replace the feed file. Always a full rewrite.
pub async fn write_feed(
    path: &Path,
    channel: &ChannelMeta,
    items: &[FeedItem],
    built_at: DateTime<Utc>,
) -> Result<(), WatchError> {
    let doc = render_feed(channel, items, built_at)?;
    write_atomic(path, doc.as_bytes()).await?;
    tracing::debug!(path = %path.display(), items = items.len(), "feed written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn meta() -> ChannelMeta {
        ChannelMeta {
            title: "Expo & Friends".into(),
            link: "https://host.test/o/1".into(),
            description: "New events".into(),
        }
    }

    #[test]
    fn empty_feed_still_has_channel_metadata() {
        let built = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();
        let doc = render_feed(&meta(), &[], built).unwrap();
        assert!(doc.starts_with(r#"<?xml version="1.0" encoding="utf-8"?>"#));
        assert!(doc.contains(r#"<rss version="2.0">"#));
        assert!(doc.contains("<title>Expo &amp; Friends</title>"));
        assert!(doc.contains("<lastBuildDate>Thu, 01 May 2025 12:00:00 GMT</lastBuildDate>"));
        assert!(!doc.contains("<item>"));
    }

    #[test]
    fn reserved_characters_are_escaped() {
        let built = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();
        let items = vec![FeedItem {
            title: r#"Rock & <Roll> "Live" 'Now'"#.into(),
            link: "https://host.test/e/1".into(),
            pub_date: built,
            description: None,
        }];
        let doc = render_feed(&meta(), &items, built).unwrap();
        assert!(doc.contains(
            "<title>Rock &amp; &lt;Roll&gt; &quot;Live&quot; &apos;Now&apos;</title>"
        ));
        assert!(doc.contains(r#"<guid isPermaLink="true">https://host.test/e/1</guid>"#));
    }
}
